use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row id of a recipient in the host store.
pub type RecipientRowId = i64;
/// Row id of a thread in the host store.
pub type ThreadRowId = i64;
/// Row id of a message in the host store.
pub type MessageRowId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientRowId,
    pub kind: RecipientKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipientKind {
    LocalAccount,
    Contact {
        aci: Option<Uuid>,
        pni: Option<Uuid>,
        e164: Option<String>,
        profile_given_name: Option<String>,
        profile_family_name: Option<String>,
    },
    Group {
        master_key: Vec<u8>,
        title: Option<String>,
    },
    DistributionList {
        distribution_id: Uuid,
        name: String,
    },
    ReleaseNotes,
}

impl RecipientKind {
    pub fn label(&self) -> &'static str {
        match self {
            RecipientKind::LocalAccount => "local_account",
            RecipientKind::Contact { .. } => "contact",
            RecipientKind::Group { .. } => "group",
            RecipientKind::DistributionList { .. } => "distribution_list",
            RecipientKind::ReleaseNotes => "release_notes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadRowId,
    pub recipient_id: RecipientRowId,
    pub archived: bool,
    pub pinned_order: Option<u32>,
    pub mute_until_ms: Option<u64>,
    pub expiration_timer_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum MessageDirection {
    Incoming {
        author_id: RecipientRowId,
        received_at: u64,
        server_sent_at: Option<u64>,
        read: bool,
        sealed_sender: bool,
    },
    Outgoing {
        recipient_states: Vec<OutgoingRecipientState>,
    },
}

impl MessageDirection {
    pub fn is_outgoing(&self) -> bool {
        matches!(self, MessageDirection::Outgoing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingRecipientState {
    pub recipient_id: RecipientRowId,
    pub status: DeliveryStatus,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Viewed,
    Skipped,
    Failed,
}

/// A message as the host store persists it. Content facets are not mutually
/// exclusive here; the backup archiver decides which one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageRowId,
    pub unique_id: Uuid,
    pub thread_id: ThreadRowId,
    pub direction: MessageDirection,
    pub sent_at: u64,
    pub body: Option<String>,
    pub body_ranges: Vec<BodyRange>,
    pub quote: Option<QuotedMessage>,
    pub link_preview: Option<LinkPreview>,
    pub contact_share: Option<ContactShare>,
    pub sticker: Option<StickerInfo>,
    pub gift_badge: Option<GiftBadge>,
    pub payment_notification: Option<PaymentNotificationInfo>,
    pub is_archived_payment: bool,
    pub was_remotely_deleted: bool,
    pub is_view_once: bool,
    pub expire_started_at: Option<u64>,
    pub expires_in_ms: Option<u64>,
}

/// Fields needed to insert a message; the store assigns `id` and `unique_id`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewMessage {
    pub thread_id: ThreadRowId,
    pub direction: Option<MessageDirection>,
    pub sent_at: u64,
    pub body: Option<String>,
    pub body_ranges: Vec<BodyRange>,
    pub quote: Option<QuotedMessage>,
    pub contact_share: Option<ContactShare>,
    pub sticker: Option<StickerInfo>,
    pub gift_badge: Option<GiftBadge>,
    pub payment_notification: Option<PaymentNotificationInfo>,
    pub is_archived_payment: bool,
    pub was_remotely_deleted: bool,
    pub is_view_once: bool,
    pub expire_started_at: Option<u64>,
    pub expires_in_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyRange {
    pub start: u32,
    pub length: u32,
    pub kind: BodyRangeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRangeKind {
    Style(TextStyle),
    Mention(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Bold,
    Italic,
    Spoiler,
    Strikethrough,
    Monospace,
    /// Written by a client version this build does not know about.
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedMessage {
    pub target_timestamp: Option<u64>,
    pub author_id: RecipientRowId,
    pub body: Option<String>,
    pub body_ranges: Vec<BodyRange>,
    pub body_source: QuoteBodySource,
    pub is_gift_badge: bool,
    pub attachment: Option<QuotedAttachmentInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteBodySource {
    /// Body was copied from the quoted message found in this store.
    Local,
    /// Body is the snapshot carried by the quote itself.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuotedAttachmentInfo {
    /// Backed by a `quote_thumbnail` attachment row.
    Thumbnail {
        content_type: Option<String>,
        file_name: Option<String>,
    },
    /// Only the description survives; there is nothing to render.
    Stub {
        content_type: Option<String>,
        file_name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPreview {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContactShare {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub name_prefix: Option<String>,
    pub name_suffix: Option<String>,
    pub middle_name: Option<String>,
    pub nickname: Option<String>,
    pub organization: Option<String>,
    pub phone_numbers: Vec<ContactDetail>,
    pub emails: Vec<ContactDetail>,
    pub addresses: Vec<ContactAddress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactDetailType {
    Unknown,
    Home,
    Mobile,
    Work,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDetail {
    pub value: Option<String>,
    pub detail_type: ContactDetailType,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactAddress {
    pub detail_type: ContactDetailType,
    pub label: Option<String>,
    pub street: Option<String>,
    pub pobox: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerInfo {
    pub pack_id: Vec<u8>,
    pub pack_key: Vec<u8>,
    pub sticker_id: u32,
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftBadge {
    pub redemption_credential: Option<Vec<u8>>,
    pub state: GiftBadgeState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftBadgeState {
    Pending,
    Opened,
    Redeemed,
}

/// Marks a live payment message; details live in `payment_models`, keyed by
/// the receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotificationInfo {
    pub mc_receipt_data: Vec<u8>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Initial,
    Submitted,
    Successful,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFailure {
    Generic,
    Network,
    InsufficientFunds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentModel {
    pub mc_receipt_data: Vec<u8>,
    pub amount_pico_mob: u64,
    pub fee_pico_mob: Option<u64>,
    pub memo: Option<String>,
    pub status: PaymentStatus,
    pub failure: Option<PaymentFailure>,
    pub created_at: u64,
    pub block_index: Option<u64>,
    pub block_timestamp: Option<u64>,
    pub transaction: Option<Vec<u8>>,
    pub public_keys: Vec<Vec<u8>>,
    pub key_images: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    Incoming,
    Outgoing,
}

/// Payment restored from a backup; kept verbatim next to its message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedPayment {
    pub message_id: MessageRowId,
    pub amount: Option<String>,
    pub fee: Option<String>,
    pub note: Option<String>,
    pub direction: PaymentDirection,
    pub counterparty_aci: Option<Uuid>,
    pub status: PaymentStatus,
    pub failure: Option<PaymentFailure>,
    pub timestamp: Option<u64>,
    pub block_index: Option<u64>,
    pub block_timestamp: Option<u64>,
    pub transaction: Option<Vec<u8>>,
    pub receipt: Option<Vec<u8>>,
    pub public_keys: Vec<Vec<u8>>,
    pub key_images: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: MessageRowId,
    pub author_id: RecipientRowId,
    pub emoji: String,
    pub sent_at: u64,
    pub sort_order: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentRole {
    Body,
    QuoteThumbnail,
    LinkPreview,
    Sticker,
    ContactAvatar,
    OversizeText,
}

impl AttachmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentRole::Body => "body",
            AttachmentRole::QuoteThumbnail => "quote_thumbnail",
            AttachmentRole::LinkPreview => "link_preview",
            AttachmentRole::Sticker => "sticker",
            AttachmentRole::ContactAvatar => "contact_avatar",
            AttachmentRole::OversizeText => "oversize_text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentFlag {
    None,
    VoiceMessage,
    Borderless,
    Gif,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub message_id: MessageRowId,
    pub role: AttachmentRole,
    pub position: i64,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub caption: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size_bytes: Option<u32>,
    pub blur_hash: Option<String>,
    pub plaintext_hash: Option<Vec<u8>>,
    pub encryption_key: Option<Vec<u8>>,
    pub flag: AttachmentFlag,
    pub client_uuid: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub recipients: i64,
    pub threads: i64,
    pub messages: i64,
    pub reactions: i64,
    pub attachments: i64,
    pub archived_payments: i64,
}

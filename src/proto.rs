//! Wire types of the backup frame stream.
//!
//! The stream is a `BackupInfo` header followed by `Frame`s, each encoded as
//! a varint length-delimited protobuf message. Field numbers are part of the
//! format and must never be reused.

/// Stream header. Always the first message in the stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BackupInfo {
    #[prost(uint64, tag = "1")]
    pub version: u64,
    /// Anchor for every relative expiry/deletion timestamp in the stream.
    #[prost(uint64, tag = "2")]
    pub backup_time_ms: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Frame {
    #[prost(oneof = "frame::Item", tags = "1, 2, 3")]
    pub item: Option<frame::Item>,
}

pub mod frame {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Item {
        #[prost(message, tag = "1")]
        Recipient(super::Recipient),
        #[prost(message, tag = "2")]
        Chat(super::Chat),
        #[prost(message, tag = "3")]
        ChatItem(super::ChatItem),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Recipient {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(oneof = "recipient::Destination", tags = "2, 3, 4, 5, 6")]
    pub destination: Option<recipient::Destination>,
}

pub mod recipient {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Destination {
        #[prost(message, tag = "2")]
        Contact(super::Contact),
        #[prost(message, tag = "3")]
        Group(super::Group),
        #[prost(message, tag = "4")]
        DistributionList(super::DistributionList),
        #[prost(message, tag = "5")]
        Self_(super::SelfRecipient),
        #[prost(message, tag = "6")]
        ReleaseNotes(super::ReleaseNotes),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Contact {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub aci: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub pni: Option<Vec<u8>>,
    #[prost(uint64, optional, tag = "3")]
    pub e164: Option<u64>,
    #[prost(string, optional, tag = "4")]
    pub profile_given_name: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub profile_family_name: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Group {
    #[prost(bytes = "vec", tag = "1")]
    pub master_key: Vec<u8>,
    #[prost(string, optional, tag = "2")]
    pub title: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DistributionList {
    #[prost(bytes = "vec", tag = "1")]
    pub distribution_id: Vec<u8>,
    #[prost(string, tag = "2")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SelfRecipient {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReleaseNotes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Chat {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub recipient_id: u64,
    #[prost(bool, tag = "3")]
    pub archived: bool,
    #[prost(uint32, optional, tag = "4")]
    pub pinned_order: Option<u32>,
    #[prost(uint64, optional, tag = "5")]
    pub expiration_timer_ms: Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    pub mute_until_ms: Option<u64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChatItem {
    #[prost(uint64, tag = "1")]
    pub chat_id: u64,
    #[prost(uint64, tag = "2")]
    pub author_id: u64,
    #[prost(uint64, tag = "3")]
    pub date_sent: u64,
    #[prost(uint64, optional, tag = "4")]
    pub expire_start_date: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub expires_in_ms: Option<u64>,
    #[prost(oneof = "chat_item::DirectionalDetails", tags = "6, 7, 8")]
    pub directional_details: Option<chat_item::DirectionalDetails>,
    #[prost(
        oneof = "chat_item::Item",
        tags = "10, 11, 12, 13, 14, 15, 16, 17"
    )]
    pub item: Option<chat_item::Item>,
}

pub mod chat_item {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct IncomingMessageDetails {
        #[prost(uint64, tag = "1")]
        pub date_received: u64,
        #[prost(uint64, optional, tag = "2")]
        pub date_server_sent: Option<u64>,
        #[prost(bool, tag = "3")]
        pub read: bool,
        #[prost(bool, tag = "4")]
        pub sealed_sender: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct OutgoingMessageDetails {
        #[prost(message, repeated, tag = "1")]
        pub send_status: Vec<super::SendStatus>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DirectionlessMessageDetails {}

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum DirectionalDetails {
        #[prost(message, tag = "6")]
        Incoming(IncomingMessageDetails),
        #[prost(message, tag = "7")]
        Outgoing(OutgoingMessageDetails),
        #[prost(message, tag = "8")]
        Directionless(DirectionlessMessageDetails),
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Item {
        #[prost(message, tag = "10")]
        StandardMessage(super::StandardMessage),
        #[prost(message, tag = "11")]
        ContactMessage(super::ContactMessage),
        #[prost(message, tag = "12")]
        StickerMessage(super::StickerMessage),
        #[prost(message, tag = "13")]
        RemoteDeletedMessage(super::RemoteDeletedMessage),
        #[prost(message, tag = "14")]
        UpdateMessage(super::UpdateMessage),
        #[prost(message, tag = "15")]
        PaymentNotification(super::PaymentNotification),
        #[prost(message, tag = "16")]
        GiftBadge(super::GiftBadge),
        #[prost(message, tag = "17")]
        ViewOnceMessage(super::ViewOnceMessage),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SendStatus {
    #[prost(uint64, tag = "1")]
    pub recipient_id: u64,
    #[prost(uint64, tag = "2")]
    pub timestamp: u64,
    #[prost(enumeration = "send_status::Status", tag = "3")]
    pub status: i32,
}

pub mod send_status {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Status {
        Unknown = 0,
        Pending = 1,
        Sent = 2,
        Delivered = 3,
        Read = 4,
        Viewed = 5,
        Skipped = 6,
        Failed = 7,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StandardMessage {
    #[prost(message, optional, tag = "1")]
    pub quote: Option<Quote>,
    #[prost(message, optional, tag = "2")]
    pub text: Option<Text>,
    #[prost(message, repeated, tag = "3")]
    pub attachments: Vec<MessageAttachment>,
    #[prost(message, repeated, tag = "4")]
    pub link_preview: Vec<LinkPreview>,
    #[prost(message, optional, tag = "5")]
    pub long_text: Option<FilePointer>,
    #[prost(message, repeated, tag = "6")]
    pub reactions: Vec<Reaction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Text {
    #[prost(string, tag = "1")]
    pub body: String,
    #[prost(message, repeated, tag = "2")]
    pub body_ranges: Vec<BodyRange>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BodyRange {
    #[prost(uint32, tag = "1")]
    pub start: u32,
    #[prost(uint32, tag = "2")]
    pub length: u32,
    #[prost(oneof = "body_range::AssociatedValue", tags = "3, 4")]
    pub associated_value: Option<body_range::AssociatedValue>,
}

pub mod body_range {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Style {
        None = 0,
        Bold = 1,
        Italic = 2,
        Spoiler = 3,
        Strikethrough = 4,
        Monospace = 5,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum AssociatedValue {
        #[prost(bytes = "vec", tag = "3")]
        MentionAci(Vec<u8>),
        #[prost(enumeration = "Style", tag = "4")]
        Style(i32),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Quote {
    #[prost(uint64, optional, tag = "1")]
    pub target_sent_timestamp: Option<u64>,
    #[prost(uint64, tag = "2")]
    pub author_id: u64,
    #[prost(message, optional, tag = "3")]
    pub text: Option<Text>,
    #[prost(message, repeated, tag = "4")]
    pub attachments: Vec<quote::QuotedAttachment>,
    #[prost(enumeration = "quote::Type", tag = "5")]
    pub r#type: i32,
}

pub mod quote {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Unknown = 0,
        Normal = 1,
        GiftBadge = 2,
        ViewOnce = 3,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct QuotedAttachment {
        #[prost(string, optional, tag = "1")]
        pub content_type: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub file_name: Option<String>,
        #[prost(message, optional, tag = "3")]
        pub thumbnail: Option<super::MessageAttachment>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MessageAttachment {
    #[prost(message, optional, tag = "1")]
    pub pointer: Option<FilePointer>,
    #[prost(enumeration = "message_attachment::Flag", tag = "2")]
    pub flag: i32,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub client_uuid: Option<Vec<u8>>,
}

pub mod message_attachment {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Flag {
        None = 0,
        VoiceMessage = 1,
        Borderless = 2,
        Gif = 3,
    }
}

/// Reference to attachment bytes held outside the frame stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FilePointer {
    #[prost(string, optional, tag = "1")]
    pub content_type: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub file_name: Option<String>,
    #[prost(uint32, optional, tag = "3")]
    pub width: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    pub height: Option<u32>,
    #[prost(string, optional, tag = "5")]
    pub caption: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub blur_hash: Option<String>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub plaintext_hash: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "8")]
    pub key: Option<Vec<u8>>,
    #[prost(uint32, optional, tag = "9")]
    pub size: Option<u32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LinkPreview {
    #[prost(string, tag = "1")]
    pub url: String,
    #[prost(string, optional, tag = "2")]
    pub title: Option<String>,
    #[prost(message, optional, tag = "3")]
    pub image: Option<FilePointer>,
    #[prost(string, optional, tag = "4")]
    pub description: Option<String>,
    #[prost(uint64, optional, tag = "5")]
    pub date: Option<u64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Reaction {
    #[prost(string, tag = "1")]
    pub emoji: String,
    #[prost(uint64, tag = "2")]
    pub author_id: u64,
    #[prost(uint64, tag = "3")]
    pub sent_timestamp: u64,
    #[prost(uint64, tag = "4")]
    pub sort_order: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContactMessage {
    #[prost(message, optional, tag = "1")]
    pub contact: Option<ContactAttachment>,
    #[prost(message, repeated, tag = "2")]
    pub reactions: Vec<Reaction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContactAttachment {
    #[prost(message, optional, tag = "1")]
    pub name: Option<contact_attachment::Name>,
    #[prost(message, repeated, tag = "2")]
    pub number: Vec<contact_attachment::Phone>,
    #[prost(message, repeated, tag = "3")]
    pub email: Vec<contact_attachment::Email>,
    #[prost(message, repeated, tag = "4")]
    pub address: Vec<contact_attachment::PostalAddress>,
    #[prost(message, optional, tag = "5")]
    pub avatar: Option<FilePointer>,
    #[prost(string, optional, tag = "6")]
    pub organization: Option<String>,
}

pub mod contact_attachment {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Name {
        #[prost(string, optional, tag = "1")]
        pub given_name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub family_name: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub prefix: Option<String>,
        #[prost(string, optional, tag = "4")]
        pub suffix: Option<String>,
        #[prost(string, optional, tag = "5")]
        pub middle_name: Option<String>,
        #[prost(string, optional, tag = "6")]
        pub nickname: Option<String>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum DetailType {
        Unknown = 0,
        Home = 1,
        Mobile = 2,
        Work = 3,
        Custom = 4,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Phone {
        #[prost(string, optional, tag = "1")]
        pub value: Option<String>,
        #[prost(enumeration = "DetailType", tag = "2")]
        pub r#type: i32,
        #[prost(string, optional, tag = "3")]
        pub label: Option<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Email {
        #[prost(string, optional, tag = "1")]
        pub value: Option<String>,
        #[prost(enumeration = "DetailType", tag = "2")]
        pub r#type: i32,
        #[prost(string, optional, tag = "3")]
        pub label: Option<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PostalAddress {
        #[prost(enumeration = "DetailType", tag = "1")]
        pub r#type: i32,
        #[prost(string, optional, tag = "2")]
        pub label: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub street: Option<String>,
        #[prost(string, optional, tag = "4")]
        pub pobox: Option<String>,
        #[prost(string, optional, tag = "5")]
        pub neighborhood: Option<String>,
        #[prost(string, optional, tag = "6")]
        pub city: Option<String>,
        #[prost(string, optional, tag = "7")]
        pub region: Option<String>,
        #[prost(string, optional, tag = "8")]
        pub postcode: Option<String>,
        #[prost(string, optional, tag = "9")]
        pub country: Option<String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StickerMessage {
    #[prost(message, optional, tag = "1")]
    pub sticker: Option<Sticker>,
    #[prost(message, repeated, tag = "2")]
    pub reactions: Vec<Reaction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Sticker {
    #[prost(bytes = "vec", tag = "1")]
    pub pack_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub pack_key: Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub sticker_id: u32,
    #[prost(string, optional, tag = "4")]
    pub emoji: Option<String>,
    #[prost(message, optional, tag = "5")]
    pub data: Option<FilePointer>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RemoteDeletedMessage {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ViewOnceMessage {
    #[prost(message, optional, tag = "1")]
    pub attachment: Option<MessageAttachment>,
    #[prost(message, repeated, tag = "2")]
    pub reactions: Vec<Reaction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateMessage {
    #[prost(oneof = "update_message::Update", tags = "1, 2")]
    pub update: Option<update_message::Update>,
}

pub mod update_message {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ExpirationTimerChatUpdate {
        #[prost(uint64, tag = "1")]
        pub expires_in_ms: u64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ProfileChangeChatUpdate {
        #[prost(string, tag = "1")]
        pub previous_name: String,
        #[prost(string, tag = "2")]
        pub new_name: String,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Update {
        #[prost(message, tag = "1")]
        ExpirationTimerChange(ExpirationTimerChatUpdate),
        #[prost(message, tag = "2")]
        ProfileChange(ProfileChangeChatUpdate),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PaymentNotification {
    #[prost(string, optional, tag = "1")]
    pub amount_mob: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub fee_mob: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub note: Option<String>,
    #[prost(message, optional, tag = "4")]
    pub transaction_details: Option<payment_notification::TransactionDetails>,
}

pub mod payment_notification {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TransactionDetails {
        #[prost(oneof = "transaction_details::Payment", tags = "1, 2")]
        pub payment: Option<transaction_details::Payment>,
    }

    pub mod transaction_details {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct MobileCoinTxoIdentification {
            #[prost(bytes = "vec", repeated, tag = "1")]
            pub public_key: Vec<Vec<u8>>,
            #[prost(bytes = "vec", repeated, tag = "2")]
            pub key_images: Vec<Vec<u8>>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Transaction {
            #[prost(enumeration = "transaction::Status", tag = "1")]
            pub status: i32,
            #[prost(message, optional, tag = "2")]
            pub mob_identification: Option<MobileCoinTxoIdentification>,
            #[prost(uint64, optional, tag = "3")]
            pub timestamp: Option<u64>,
            #[prost(uint64, optional, tag = "4")]
            pub block_index: Option<u64>,
            #[prost(uint64, optional, tag = "5")]
            pub block_timestamp: Option<u64>,
            #[prost(bytes = "vec", optional, tag = "6")]
            pub transaction: Option<Vec<u8>>,
            #[prost(bytes = "vec", optional, tag = "7")]
            pub receipt: Option<Vec<u8>>,
        }

        pub mod transaction {
            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
            )]
            #[repr(i32)]
            pub enum Status {
                Initial = 0,
                Submitted = 1,
                Successful = 2,
            }
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct FailedTransaction {
            #[prost(enumeration = "failed_transaction::FailureReason", tag = "1")]
            pub reason: i32,
        }

        pub mod failed_transaction {
            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
            )]
            #[repr(i32)]
            pub enum FailureReason {
                Generic = 0,
                Network = 1,
                InsufficientFunds = 2,
            }
        }

        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Payment {
            #[prost(message, tag = "1")]
            Transaction(Transaction),
            #[prost(message, tag = "2")]
            FailedTransaction(FailedTransaction),
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GiftBadge {
    #[prost(bytes = "vec", tag = "1")]
    pub receipt_credential_presentation: Vec<u8>,
    #[prost(enumeration = "gift_badge::State", tag = "2")]
    pub state: i32,
}

pub mod gift_badge {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum State {
        Unopened = 0,
        Opened = 1,
        Redeemed = 2,
        Failed = 3,
    }
}

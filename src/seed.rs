//! Fixture store with one message of every content shape.

use rusqlite::Connection;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    ArchivedPayment, Attachment, AttachmentFlag, AttachmentRole, BodyRange, BodyRangeKind, ContactAddress,
    ContactDetail, ContactDetailType, ContactShare, DeliveryStatus, GiftBadge, GiftBadgeState, LinkPreview,
    MessageDirection, MessageRowId, NewMessage, OutgoingRecipientState, PaymentDirection, PaymentFailure,
    PaymentModel, PaymentNotificationInfo, PaymentStatus, QuoteBodySource, QuotedAttachmentInfo, QuotedMessage,
    Reaction, RecipientKind, RecipientRowId, StickerInfo, TextStyle, Thread, ThreadRowId,
};
use crate::query::{
    insert_archived_payment, insert_attachment, insert_message, insert_payment_model, insert_reactions,
    insert_recipient, insert_thread, set_link_preview,
};

pub const SEED_BASE_TS: u64 = 1_700_000_000_000;

/// Body of the standard message that carries every optional facet.
pub const SEED_RICH_BODY: &str = "Hey @Bob see https://example.org/post";

#[derive(Debug, Clone, Default)]
pub struct SeedSummary {
    pub recipients: usize,
    pub threads: usize,
    pub messages: usize,
    /// Messages with no frame representation (view-once).
    pub unsupported: usize,
    pub self_id: RecipientRowId,
    pub alice_id: RecipientRowId,
    pub bob_id: RecipientRowId,
    pub direct_thread: ThreadRowId,
    pub group_thread: ThreadRowId,
    pub rich_message: MessageRowId,
}

fn contact(given: &str, e164: &str) -> RecipientKind {
    RecipientKind::Contact {
        aci: Some(Uuid::new_v4()),
        pni: None,
        e164: Some(e164.to_string()),
        profile_given_name: Some(given.to_string()),
        profile_family_name: None,
    }
}

fn incoming(author_id: RecipientRowId, sent_at: u64) -> Option<MessageDirection> {
    Some(MessageDirection::Incoming {
        author_id,
        received_at: sent_at + 400,
        server_sent_at: Some(sent_at + 200),
        read: true,
        sealed_sender: true,
    })
}

fn outgoing(recipients: &[RecipientRowId], sent_at: u64) -> Option<MessageDirection> {
    Some(MessageDirection::Outgoing {
        recipient_states: recipients
            .iter()
            .map(|recipient_id| OutgoingRecipientState {
                recipient_id: *recipient_id,
                status: DeliveryStatus::Read,
                updated_at: sent_at + 1_000,
            })
            .collect(),
    })
}

fn attachment(message_id: MessageRowId, role: AttachmentRole, position: i64, content_type: &str) -> Attachment {
    Attachment {
        id: Uuid::new_v4().to_string(),
        message_id,
        role,
        position,
        content_type: Some(content_type.to_string()),
        file_name: Some(format!("{}-{position}", role.as_str())),
        caption: None,
        width: Some(640),
        height: Some(480),
        size_bytes: Some(2_048),
        blur_hash: None,
        plaintext_hash: Some(vec![0x5a; 32]),
        encryption_key: Some(vec![0x17; 64]),
        flag: AttachmentFlag::None,
        client_uuid: None,
    }
}

/// Seeds recipients, threads and messages covering every archive shape.
/// Run it inside a write transaction on an empty store.
pub fn seed_backup_fixture(conn: &Connection) -> Result<SeedSummary, CoreError> {
    let mut summary = SeedSummary::default();
    let ts = |offset: u64| SEED_BASE_TS + offset * 60_000;

    summary.self_id = insert_recipient(conn, &RecipientKind::LocalAccount)?;
    summary.alice_id = insert_recipient(conn, &contact("Alice", "+15550000001"))?;
    let bob_aci = Uuid::new_v4();
    summary.bob_id = insert_recipient(
        conn,
        &RecipientKind::Contact {
            aci: Some(bob_aci),
            pni: Some(Uuid::new_v4()),
            e164: Some("+15550000002".to_string()),
            profile_given_name: Some("Bob".to_string()),
            profile_family_name: Some("Builder".to_string()),
        },
    )?;
    let group_id = insert_recipient(
        conn,
        &RecipientKind::Group {
            master_key: vec![0x42; 32],
            title: Some("Climbing".to_string()),
        },
    )?;
    insert_recipient(
        conn,
        &RecipientKind::DistributionList {
            distribution_id: Uuid::new_v4(),
            name: "Close friends".to_string(),
        },
    )?;
    let release_notes = insert_recipient(conn, &RecipientKind::ReleaseNotes)?;
    summary.recipients = 6;

    let thread = |recipient_id: RecipientRowId, pinned_order: Option<u32>, expiration_timer_ms: Option<u64>| Thread {
        id: 0,
        recipient_id,
        archived: false,
        pinned_order,
        mute_until_ms: None,
        expiration_timer_ms,
    };
    summary.direct_thread = insert_thread(conn, &thread(summary.bob_id, Some(1), None))?;
    summary.group_thread = insert_thread(conn, &thread(group_id, None, Some(86_400_000)))?;
    insert_thread(
        conn,
        &Thread {
            archived: true,
            mute_until_ms: Some(ts(100)),
            ..thread(release_notes, None, None)
        },
    )?;
    summary.threads = 3;

    let direct = summary.direct_thread;
    let (self_id, alice, bob) = (summary.self_id, summary.alice_id, summary.bob_id);
    let mut messages = 0usize;

    // quote target, unique timestamp in the thread
    insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: incoming(bob, ts(1)),
            sent_at: ts(1),
            body: Some("Lunch tomorrow?".to_string()),
            ..Default::default()
        },
    )?;
    messages += 1;

    let rich = insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: outgoing(&[bob], ts(2)),
            sent_at: ts(2),
            body: Some(SEED_RICH_BODY.to_string()),
            body_ranges: vec![
                BodyRange {
                    start: 0,
                    length: 3,
                    kind: BodyRangeKind::Style(TextStyle::Bold),
                },
                BodyRange {
                    start: 4,
                    length: 4,
                    kind: BodyRangeKind::Mention(bob_aci),
                },
            ],
            quote: Some(QuotedMessage {
                target_timestamp: Some(ts(1)),
                author_id: bob,
                body: Some("Lunch tomorrow?".to_string()),
                body_ranges: Vec::new(),
                body_source: QuoteBodySource::Local,
                is_gift_badge: false,
                attachment: Some(QuotedAttachmentInfo::Thumbnail {
                    content_type: Some("image/jpeg".to_string()),
                    file_name: Some("menu.jpg".to_string()),
                }),
            }),
            ..Default::default()
        },
    )?;
    messages += 1;
    summary.rich_message = rich.id;
    set_link_preview(
        conn,
        rich.id,
        &LinkPreview {
            url: "https://example.org/post".to_string(),
            title: Some("A post".to_string()),
            description: None,
            date: Some(ts(0)),
        },
    )?;
    let mut body_image = attachment(rich.id, AttachmentRole::Body, 0, "image/png");
    body_image.caption = Some("view".to_string());
    body_image.client_uuid = Some(Uuid::new_v4());
    insert_attachment(conn, &body_image)?;
    insert_attachment(conn, &attachment(rich.id, AttachmentRole::QuoteThumbnail, 0, "image/jpeg"))?;
    insert_attachment(conn, &attachment(rich.id, AttachmentRole::LinkPreview, 0, "image/jpeg"))?;
    insert_attachment(conn, &attachment(rich.id, AttachmentRole::OversizeText, 0, "text/x-signal-plain"))?;
    insert_reactions(
        conn,
        &[
            Reaction {
                message_id: rich.id,
                author_id: bob,
                emoji: "👍".to_string(),
                sent_at: ts(3),
                sort_order: 1,
            },
            Reaction {
                message_id: rich.id,
                author_id: self_id,
                emoji: "🎉".to_string(),
                sent_at: ts(4),
                sort_order: 2,
            },
        ],
    )?;

    insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: incoming(bob, ts(5)),
            sent_at: ts(5),
            was_remotely_deleted: true,
            ..Default::default()
        },
    )?;
    insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: incoming(bob, ts(6)),
            sent_at: ts(6),
            gift_badge: Some(GiftBadge {
                redemption_credential: Some(vec![0x0c; 48]),
                state: GiftBadgeState::Opened,
            }),
            ..Default::default()
        },
    )?;
    // archives as failed
    insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: outgoing(&[bob], ts(7)),
            sent_at: ts(7),
            gift_badge: Some(GiftBadge {
                redemption_credential: None,
                state: GiftBadgeState::Pending,
            }),
            ..Default::default()
        },
    )?;
    messages += 3;

    let shared = insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: incoming(bob, ts(8)),
            sent_at: ts(8),
            contact_share: Some(ContactShare {
                given_name: Some("Carol".to_string()),
                family_name: Some("Diaz".to_string()),
                organization: Some("Crag Co".to_string()),
                phone_numbers: vec![ContactDetail {
                    value: Some("+15550000003".to_string()),
                    detail_type: ContactDetailType::Mobile,
                    label: None,
                }],
                emails: vec![ContactDetail {
                    value: Some("carol@example.org".to_string()),
                    detail_type: ContactDetailType::Work,
                    label: None,
                }],
                addresses: vec![ContactAddress {
                    detail_type: ContactDetailType::Home,
                    label: None,
                    street: Some("1 Main St".to_string()),
                    pobox: None,
                    neighborhood: None,
                    city: Some("Springfield".to_string()),
                    region: None,
                    postcode: Some("12345".to_string()),
                    country: Some("US".to_string()),
                }],
                ..Default::default()
            }),
            ..Default::default()
        },
    )?;
    insert_attachment(conn, &attachment(shared.id, AttachmentRole::ContactAvatar, 0, "image/jpeg"))?;

    let sticker = insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: outgoing(&[bob], ts(9)),
            sent_at: ts(9),
            sticker: Some(StickerInfo {
                pack_id: vec![0x01; 16],
                pack_key: vec![0x02; 32],
                sticker_id: 7,
                emoji: Some("🦀".to_string()),
            }),
            ..Default::default()
        },
    )?;
    insert_attachment(conn, &attachment(sticker.id, AttachmentRole::Sticker, 0, "image/webp"))?;
    messages += 2;

    let receipt = vec![0xaa; 24];
    insert_payment_model(
        conn,
        &PaymentModel {
            mc_receipt_data: receipt.clone(),
            amount_pico_mob: 1_500_000_000_000,
            fee_pico_mob: Some(400_000_000),
            memo: Some("rent".to_string()),
            status: PaymentStatus::Successful,
            failure: None,
            created_at: ts(10),
            block_index: Some(12_345),
            block_timestamp: Some(ts(10) + 5_000),
            transaction: Some(vec![0x33; 16]),
            public_keys: vec![vec![0x44; 32]],
            key_images: vec![vec![0x55; 32]],
        },
    )?;
    insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: outgoing(&[bob], ts(10)),
            sent_at: ts(10),
            payment_notification: Some(PaymentNotificationInfo {
                mc_receipt_data: receipt,
                note: Some("rent".to_string()),
            }),
            ..Default::default()
        },
    )?;
    let archived = insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: incoming(bob, ts(11)),
            sent_at: ts(11),
            is_archived_payment: true,
            ..Default::default()
        },
    )?;
    insert_archived_payment(
        conn,
        &ArchivedPayment {
            message_id: archived.id,
            amount: Some("0.25".to_string()),
            fee: None,
            note: Some("coffee".to_string()),
            direction: PaymentDirection::Incoming,
            counterparty_aci: Some(bob_aci),
            status: PaymentStatus::Failed,
            failure: Some(PaymentFailure::InsufficientFunds),
            timestamp: None,
            block_index: None,
            block_timestamp: None,
            transaction: None,
            receipt: None,
            public_keys: Vec::new(),
            key_images: Vec::new(),
        },
    )?;
    messages += 2;

    let view_once = insert_message(
        conn,
        &NewMessage {
            thread_id: direct,
            direction: incoming(bob, ts(12)),
            sent_at: ts(12),
            is_view_once: true,
            ..Default::default()
        },
    )?;
    insert_attachment(conn, &attachment(view_once.id, AttachmentRole::Body, 0, "image/jpeg"))?;
    messages += 1;
    summary.unsupported = 1;

    let group = summary.group_thread;
    insert_message(
        conn,
        &NewMessage {
            thread_id: group,
            direction: incoming(alice, ts(20)),
            sent_at: ts(20),
            body: Some("Who is in for Saturday?".to_string()),
            expire_started_at: Some(ts(20)),
            expires_in_ms: Some(1_000_000_000_000),
            ..Default::default()
        },
    )?;
    let voice = insert_message(
        conn,
        &NewMessage {
            thread_id: group,
            direction: outgoing(&[alice, bob], ts(21)),
            sent_at: ts(21),
            ..Default::default()
        },
    )?;
    let mut note = attachment(voice.id, AttachmentRole::Body, 0, "audio/aac");
    note.flag = AttachmentFlag::VoiceMessage;
    note.client_uuid = Some(Uuid::new_v4());
    insert_attachment(conn, &note)?;
    insert_attachment(conn, &attachment(voice.id, AttachmentRole::Body, 1, "image/gif"))?;
    messages += 2;

    summary.messages = messages;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::query::store_stats;

    #[test]
    fn fixture_counts_match_store() {
        let mut store = open_in_memory().expect("store");
        let summary = store.write(|tx| seed_backup_fixture(tx)).expect("seed");
        let stats = store_stats(&store.conn).expect("stats");
        assert_eq!(stats.recipients as usize, summary.recipients);
        assert_eq!(stats.threads as usize, summary.threads);
        assert_eq!(stats.messages as usize, summary.messages);
        assert_eq!(stats.reactions, 2);
        assert_eq!(stats.archived_payments, 1);
    }
}

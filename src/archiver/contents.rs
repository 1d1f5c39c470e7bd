//! Message contents in both directions.
//!
//! Archiving picks exactly one content shape per message. Restoring is split
//! in two: [`restore_contents`] builds the native fields and keeps every
//! fragment that needs the message row id, then after the caller inserts the
//! message [`restore_downstream_objects`] attaches those fragments.

use rusqlite::Connection;

use super::attachments;
use super::contact_share::{archive_contact_share, restore_contact_share};
use super::gift_badge::{archive_gift_badge, restore_gift_badge};
use super::payments::{
    archive_archived_payment, archive_payment_notification, restore_archived_payment, restore_payment, PendingPayment,
};
use super::quote::{archive_quote, restore_quote, RestoredQuote};
use super::reactions::{archive_reactions, restore_reactions};
use super::sticker::{archive_sticker, restore_sticker};
use super::text::{archive_text, restore_body_ranges};
use crate::context::RecipientContext;
use crate::error::CoreError;
use crate::interaction::{
    ArchiveErrorKind, ArchiveFrameError, ArchiveInteractionResult, ArchiveObjectId, Bubble, InteractionResult, InvalidProtoData,
    RestoreFrameError, RestoreInteractionResult, RestoreObjectId,
};
use crate::models::{
    BodyRange, ContactShare, GiftBadge, LinkPreview, Message, NewMessage, QuotedMessage, StickerInfo, ThreadRowId,
};
use crate::proto::{self, chat_item};
use crate::query::set_link_preview;

/// Which frame content a stored message archives as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveShape {
    PaymentNotification,
    ArchivedPayment,
    RemoteDeleted,
    Standard,
    GiftBadge,
    ContactShare,
    Sticker,
    /// View-once and anything else without a frame representation yet.
    Unsupported,
}

/// First match wins; the facets of a stored message are not exclusive.
pub fn classify_message(message: &Message, body_attachment_count: usize) -> ArchiveShape {
    let has_text = message.body.as_deref().is_some_and(|body| !body.is_empty());
    if message.payment_notification.is_some() {
        ArchiveShape::PaymentNotification
    } else if message.is_archived_payment {
        ArchiveShape::ArchivedPayment
    } else if message.was_remotely_deleted {
        ArchiveShape::RemoteDeleted
    } else if has_text || (body_attachment_count > 0 && !message.is_view_once) {
        ArchiveShape::Standard
    } else if message.gift_badge.is_some() {
        ArchiveShape::GiftBadge
    } else if message.contact_share.is_some() {
        ArchiveShape::ContactShare
    } else if message.sticker.is_some() {
        ArchiveShape::Sticker
    } else {
        ArchiveShape::Unsupported
    }
}

pub fn archive_object_id(message: &Message) -> ArchiveObjectId {
    ArchiveObjectId::Message {
        thread_id: message.thread_id,
        message_id: message.id,
        sent_at: message.sent_at,
    }
}

pub fn archive_message_contents(
    conn: &Connection,
    message: &Message,
    recipients: &RecipientContext,
) -> ArchiveInteractionResult<chat_item::Item> {
    let id = archive_object_id(message);
    let body_attachments = match attachments::archive_body_attachments(conn, message.id) {
        Ok(found) => found,
        Err(err) => return InteractionResult::fail(ArchiveFrameError::database(id, err)),
    };
    match classify_message(message, body_attachments.len()) {
        ArchiveShape::PaymentNotification => match &message.payment_notification {
            Some(info) => archive_payment_notification(conn, id, info).map(chat_item::Item::PaymentNotification),
            None => misclassified(id, "payment notification"),
        },
        ArchiveShape::ArchivedPayment => {
            archive_archived_payment(conn, id, message.id).map(chat_item::Item::PaymentNotification)
        }
        ArchiveShape::RemoteDeleted => {
            InteractionResult::Success(chat_item::Item::RemoteDeletedMessage(proto::RemoteDeletedMessage {}))
        }
        ArchiveShape::Standard => archive_standard_message(conn, id, message, body_attachments, recipients)
            .map(chat_item::Item::StandardMessage),
        ArchiveShape::GiftBadge => match &message.gift_badge {
            Some(badge) => archive_gift_badge(badge).map(chat_item::Item::GiftBadge),
            None => misclassified(id, "gift badge"),
        },
        ArchiveShape::ContactShare => archive_contact_message(conn, id, message, recipients),
        ArchiveShape::Sticker => archive_sticker_message(conn, id, message, recipients),
        ArchiveShape::Unsupported => InteractionResult::NotYetImplemented,
    }
}

fn misclassified_error(id: ArchiveObjectId, facet: &str) -> ArchiveFrameError {
    ArchiveFrameError::new(
        id,
        ArchiveErrorKind::DeveloperError(format!("classified as {facet} without one")),
    )
}

fn misclassified<T>(id: ArchiveObjectId, facet: &str) -> ArchiveInteractionResult<T> {
    InteractionResult::fail(misclassified_error(id, facet))
}

fn archive_standard_message(
    conn: &Connection,
    id: ArchiveObjectId,
    message: &Message,
    body_attachments: Vec<proto::MessageAttachment>,
    recipients: &RecipientContext,
) -> ArchiveInteractionResult<proto::StandardMessage> {
    InteractionResult::collect(|partial| {
        let db = |err: CoreError| Bubble::fail(ArchiveFrameError::database(id, err));
        let text = match message.body.as_deref() {
            Some(body) if !body.is_empty() => Some(partial.absorb(archive_text(id, body, &message.body_ranges))?),
            _ => None,
        };
        let quote = match &message.quote {
            Some(quoted) => Some(partial.absorb(archive_quote(conn, id, message.id, quoted, recipients))?),
            None => None,
        };
        let long_text = attachments::archive_oversize_text(conn, message.id).map_err(db)?;
        let link_preview = match &message.link_preview {
            Some(preview) => vec![proto::LinkPreview {
                url: preview.url.clone(),
                title: preview.title.clone(),
                image: attachments::archive_link_preview_image(conn, message.id).map_err(db)?,
                description: preview.description.clone(),
                date: preview.date,
            }],
            None => Vec::new(),
        };
        let reactions = partial.absorb(archive_reactions(conn, id, message.id, recipients))?;
        Ok(proto::StandardMessage {
            quote,
            text,
            attachments: body_attachments,
            link_preview,
            long_text,
            reactions,
        })
    })
}

fn archive_contact_message(
    conn: &Connection,
    id: ArchiveObjectId,
    message: &Message,
    recipients: &RecipientContext,
) -> ArchiveInteractionResult<chat_item::Item> {
    InteractionResult::collect(|partial| {
        let Some(contact) = &message.contact_share else {
            return Err(Bubble::fail(misclassified_error(id, "contact share")));
        };
        let avatar = attachments::archive_contact_avatar(conn, message.id)
            .map_err(|err| Bubble::fail(ArchiveFrameError::database(id, err)))?;
        let contact = partial.absorb(archive_contact_share(contact, avatar))?;
        let reactions = partial.absorb(archive_reactions(conn, id, message.id, recipients))?;
        Ok(chat_item::Item::ContactMessage(proto::ContactMessage {
            contact: Some(contact),
            reactions,
        }))
    })
}

fn archive_sticker_message(
    conn: &Connection,
    id: ArchiveObjectId,
    message: &Message,
    recipients: &RecipientContext,
) -> ArchiveInteractionResult<chat_item::Item> {
    InteractionResult::collect(|partial| {
        let Some(sticker) = &message.sticker else {
            return Err(Bubble::fail(misclassified_error(id, "sticker")));
        };
        let data = attachments::archive_sticker_data(conn, message.id)
            .map_err(|err| Bubble::fail(ArchiveFrameError::database(id, err)))?;
        let sticker = partial.absorb(archive_sticker(id, sticker, data))?;
        let reactions = partial.absorb(archive_reactions(conn, id, message.id, recipients))?;
        Ok(chat_item::Item::StickerMessage(proto::StickerMessage {
            sticker: Some(sticker),
            reactions,
        }))
    })
}

/// Restore fragments that need the inserted message's row id.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingText {
    reactions: Vec<proto::Reaction>,
    attachments: Vec<proto::MessageAttachment>,
    long_text: Option<proto::FilePointer>,
    quote_thumbnail: Option<proto::MessageAttachment>,
    link_preview: Option<proto::LinkPreview>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingContact {
    reactions: Vec<proto::Reaction>,
    avatar: Option<proto::FilePointer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSticker {
    reactions: Vec<proto::Reaction>,
    data: proto::FilePointer,
}

/// Output of the first restore phase.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoredContents {
    ArchivedPayment(PendingPayment),
    RemoteDeleteTombstone,
    Text {
        body: Option<String>,
        body_ranges: Vec<BodyRange>,
        quote: Option<QuotedMessage>,
        pending: PendingText,
    },
    ContactShare {
        contact: ContactShare,
        pending: PendingContact,
    },
    StickerMessage {
        sticker: StickerInfo,
        pending: PendingSticker,
    },
    GiftBadge(GiftBadge),
}

impl RestoredContents {
    /// Copies the native fields into the message about to be inserted.
    pub fn apply_to(&self, message: &mut NewMessage) {
        match self {
            RestoredContents::ArchivedPayment(_) => message.is_archived_payment = true,
            RestoredContents::RemoteDeleteTombstone => message.was_remotely_deleted = true,
            RestoredContents::Text {
                body,
                body_ranges,
                quote,
                ..
            } => {
                message.body = body.clone();
                message.body_ranges = body_ranges.clone();
                message.quote = quote.clone();
            }
            RestoredContents::ContactShare { contact, .. } => message.contact_share = Some(contact.clone()),
            RestoredContents::StickerMessage { sticker, .. } => message.sticker = Some(sticker.clone()),
            RestoredContents::GiftBadge(badge) => message.gift_badge = Some(badge.clone()),
        }
    }
}

/// First restore phase. `thread_id` scopes the quote target lookup.
pub fn restore_contents(
    conn: &Connection,
    id: RestoreObjectId,
    thread_id: ThreadRowId,
    item: &chat_item::Item,
    recipients: &RecipientContext,
) -> RestoreInteractionResult<RestoredContents> {
    match item {
        chat_item::Item::StandardMessage(standard) => {
            restore_standard_message(conn, id, thread_id, standard, recipients)
        }
        chat_item::Item::ContactMessage(contact) => restore_contact_share(id, contact.contact.as_ref()).map(
            |(contact_share, avatar)| RestoredContents::ContactShare {
                contact: contact_share,
                pending: PendingContact {
                    reactions: contact.reactions.clone(),
                    avatar,
                },
            },
        ),
        chat_item::Item::StickerMessage(message) => {
            restore_sticker(id, message.sticker.as_ref()).map(|(sticker, data)| RestoredContents::StickerMessage {
                sticker,
                pending: PendingSticker {
                    reactions: message.reactions.clone(),
                    data,
                },
            })
        }
        chat_item::Item::RemoteDeletedMessage(_) => InteractionResult::Success(RestoredContents::RemoteDeleteTombstone),
        chat_item::Item::PaymentNotification(payment) => {
            restore_payment(id, payment).map(RestoredContents::ArchivedPayment)
        }
        chat_item::Item::GiftBadge(badge) => restore_gift_badge(id, badge).map(RestoredContents::GiftBadge),
        chat_item::Item::UpdateMessage(_) | chat_item::Item::ViewOnceMessage(_) => InteractionResult::NotYetImplemented,
    }
}

fn restore_standard_message(
    conn: &Connection,
    id: RestoreObjectId,
    thread_id: ThreadRowId,
    standard: &proto::StandardMessage,
    recipients: &RecipientContext,
) -> RestoreInteractionResult<RestoredContents> {
    InteractionResult::collect(|partial| {
        let text = standard.text.as_ref().filter(|text| !text.body.is_empty());
        if text.is_none() {
            if standard.long_text.is_some() {
                return Err(Bubble::fail(RestoreFrameError::new(
                    id,
                    InvalidProtoData::LongTextStandardMessageMissingBody,
                )));
            }
            if standard.attachments.is_empty() {
                return Err(Bubble::fail(RestoreFrameError::new(id, InvalidProtoData::EmptyStandardMessage)));
            }
        }
        let (body, body_ranges) = match text {
            Some(text) => (
                Some(text.body.clone()),
                partial.absorb(restore_body_ranges(id, &text.body, &text.body_ranges))?,
            ),
            None => (None, Vec::new()),
        };
        let (quote, quote_thumbnail) = match &standard.quote {
            Some(proto_quote) => {
                let RestoredQuote { quote, thumbnail } =
                    partial.absorb(restore_quote(conn, id, thread_id, proto_quote, recipients))?;
                (Some(quote), thumbnail)
            }
            None => (None, None),
        };
        Ok(RestoredContents::Text {
            body,
            body_ranges,
            quote,
            pending: PendingText {
                reactions: standard.reactions.clone(),
                attachments: standard.attachments.clone(),
                long_text: standard.long_text.clone(),
                quote_thumbnail,
                link_preview: standard.link_preview.first().cloned(),
            },
        })
    })
}

/// Second restore phase. Every sibling step runs even when an earlier one
/// failed; the combined result fails if any of them did.
pub fn restore_downstream_objects(
    conn: &Connection,
    id: RestoreObjectId,
    message: &Message,
    contents: RestoredContents,
    recipients: &RecipientContext,
) -> RestoreInteractionResult<()> {
    match contents {
        RestoredContents::Text { pending, .. } => {
            let mut steps = vec![restore_reactions(conn, id, message.id, &pending.reactions, recipients)];
            if let Some(long_text) = &pending.long_text {
                steps.push(attachments::restore_oversize_text(conn, id, message.id, long_text));
            }
            if !pending.attachments.is_empty() {
                steps.push(attachments::restore_body_attachments(conn, id, message.id, &pending.attachments));
            }
            if let Some(thumbnail) = &pending.quote_thumbnail {
                steps.push(attachments::restore_quote_thumbnail(conn, id, message.id, thumbnail));
            }
            if let Some(preview) = &pending.link_preview {
                steps.push(restore_link_preview(conn, id, message, preview));
            }
            InteractionResult::combine_all(steps)
        }
        RestoredContents::ContactShare { pending, .. } => {
            let mut steps = vec![restore_reactions(conn, id, message.id, &pending.reactions, recipients)];
            if let Some(avatar) = &pending.avatar {
                steps.push(attachments::restore_contact_avatar(conn, id, message.id, avatar));
            }
            InteractionResult::combine_all(steps)
        }
        RestoredContents::StickerMessage { pending, .. } => InteractionResult::combine_all([
            restore_reactions(conn, id, message.id, &pending.reactions, recipients),
            attachments::restore_sticker_data(conn, id, message.id, &pending.data),
        ]),
        RestoredContents::ArchivedPayment(payment) => restore_archived_payment(conn, id, message, payment),
        RestoredContents::RemoteDeleteTombstone | RestoredContents::GiftBadge(_) => InteractionResult::Success(()),
    }
}

/// The preview URL has to appear in the message body.
fn restore_link_preview(
    conn: &Connection,
    id: RestoreObjectId,
    message: &Message,
    preview: &proto::LinkPreview,
) -> RestoreInteractionResult<()> {
    if preview.url.is_empty() {
        return InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::LinkPreviewEmptyUrl));
    }
    let in_body = message
        .body
        .as_deref()
        .is_some_and(|body| body.contains(preview.url.as_str()));
    if !in_body {
        return InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::LinkPreviewUrlNotInBody));
    }
    let native = LinkPreview {
        url: preview.url.clone(),
        title: preview.title.clone(),
        description: preview.description.clone(),
        date: preview.date,
    };
    if let Err(err) = set_link_preview(conn, message.id, &native) {
        return InteractionResult::fail(RestoreFrameError::insertion(id, err));
    }
    match &preview.image {
        Some(image) => attachments::restore_link_preview_image(conn, id, message.id, image),
        None => InteractionResult::Success(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GiftBadgeState, MessageDirection, PaymentNotificationInfo};
    use uuid::Uuid;

    fn message() -> Message {
        Message {
            id: 1,
            unique_id: Uuid::new_v4(),
            thread_id: 1,
            direction: MessageDirection::Outgoing {
                recipient_states: Vec::new(),
            },
            sent_at: 1,
            body: None,
            body_ranges: Vec::new(),
            quote: None,
            link_preview: None,
            contact_share: None,
            sticker: None,
            gift_badge: None,
            payment_notification: None,
            is_archived_payment: false,
            was_remotely_deleted: false,
            is_view_once: false,
            expire_started_at: None,
            expires_in_ms: None,
        }
    }

    #[test]
    fn classification_follows_priority_order() {
        let mut m = message();
        assert_eq!(classify_message(&m, 0), ArchiveShape::Unsupported);
        m.sticker = Some(StickerInfo {
            pack_id: vec![1],
            pack_key: vec![2],
            sticker_id: 3,
            emoji: None,
        });
        assert_eq!(classify_message(&m, 0), ArchiveShape::Sticker);
        m.contact_share = Some(ContactShare::default());
        assert_eq!(classify_message(&m, 0), ArchiveShape::ContactShare);
        m.gift_badge = Some(GiftBadge {
            redemption_credential: None,
            state: GiftBadgeState::Pending,
        });
        assert_eq!(classify_message(&m, 0), ArchiveShape::GiftBadge);
        m.body = Some(String::new());
        assert_eq!(classify_message(&m, 0), ArchiveShape::GiftBadge);
        m.body = Some("hi".to_string());
        assert_eq!(classify_message(&m, 0), ArchiveShape::Standard);
        m.was_remotely_deleted = true;
        assert_eq!(classify_message(&m, 0), ArchiveShape::RemoteDeleted);
        m.is_archived_payment = true;
        assert_eq!(classify_message(&m, 0), ArchiveShape::ArchivedPayment);
        m.payment_notification = Some(PaymentNotificationInfo {
            mc_receipt_data: vec![7],
            note: None,
        });
        assert_eq!(classify_message(&m, 0), ArchiveShape::PaymentNotification);
    }

    #[test]
    fn attachment_only_messages_are_standard_unless_view_once() {
        let mut m = message();
        assert_eq!(classify_message(&m, 2), ArchiveShape::Standard);
        m.is_view_once = true;
        assert_eq!(classify_message(&m, 2), ArchiveShape::Unsupported);
    }

    #[test]
    fn shape_without_its_facet_is_a_developer_error() {
        use crate::db::open_in_memory;
        use crate::interaction::ReportedError;

        let store = open_in_memory().expect("store");
        let m = message();
        let id = archive_object_id(&m);
        let result = archive_contact_message(&store.conn, id, &m, &RecipientContext::new());
        let errors = result.errors();
        assert!(result.is_message_failure());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_developer_error());
        assert!(misclassified::<()>(id, "gift badge").is_message_failure());
    }
}

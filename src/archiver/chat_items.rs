//! Chat items: direction, expiry and the restore sequence
//! contents → insert → downstream objects.

use rusqlite::Connection;

use super::contents::{archive_message_contents, archive_object_id, restore_contents, restore_downstream_objects};
use crate::context::{BackupChatId, BackupRecipientId, ChatContext, RecipientContext};
use crate::interaction::{
    ArchiveErrorKind, ArchiveFrameError, ArchiveInteractionResult, Bubble, InteractionResult, InvalidProtoData,
    RestoreErrorKind, RestoreFrameError, RestoreInteractionResult, RestoreObjectId,
};
use crate::models::{
    DeliveryStatus, Message, MessageDirection, MessageRowId, NewMessage, OutgoingRecipientState, RecipientRowId,
};
use crate::proto::{self, chat_item, send_status};
use crate::query::insert_message;

/// Archives one stored message. `self_id` is the local account's backup id,
/// the author of every outgoing message.
pub fn archive_chat_item(
    conn: &Connection,
    message: &Message,
    chat_id: BackupChatId,
    self_id: Option<BackupRecipientId>,
    recipients: &RecipientContext,
) -> ArchiveInteractionResult<proto::ChatItem> {
    let id = archive_object_id(message);
    InteractionResult::collect(|partial| {
        let missing = |row: RecipientRowId| ArchiveFrameError::new(id, ArchiveErrorKind::ReferencedRecipientIdMissing(row));
        let (author, details) = match &message.direction {
            MessageDirection::Incoming {
                author_id,
                received_at,
                server_sent_at,
                read,
                sealed_sender,
            } => {
                let author = recipients
                    .backup_id(*author_id)
                    .ok_or_else(|| Bubble::fail(missing(*author_id)))?;
                let details = chat_item::DirectionalDetails::Incoming(chat_item::IncomingMessageDetails {
                    date_received: *received_at,
                    date_server_sent: *server_sent_at,
                    read: *read,
                    sealed_sender: *sealed_sender,
                });
                (author, details)
            }
            MessageDirection::Outgoing { recipient_states } => {
                let author = self_id.ok_or_else(|| {
                    Bubble::fail(ArchiveFrameError::new(
                        id,
                        ArchiveErrorKind::DeveloperError("outgoing message without a local account".to_string()),
                    ))
                })?;
                let mut send_status = Vec::with_capacity(recipient_states.len());
                for state in recipient_states {
                    let Some(recipient_id) = recipients.backup_id(state.recipient_id) else {
                        partial.push(missing(state.recipient_id));
                        continue;
                    };
                    send_status.push(proto::SendStatus {
                        recipient_id: recipient_id.0,
                        timestamp: state.updated_at,
                        status: archive_delivery_status(state.status) as i32,
                    });
                }
                (author, chat_item::DirectionalDetails::Outgoing(chat_item::OutgoingMessageDetails { send_status }))
            }
        };
        let item = partial.absorb(archive_message_contents(conn, message, recipients))?;
        Ok(proto::ChatItem {
            chat_id: chat_id.0,
            author_id: author.0,
            date_sent: message.sent_at,
            expire_start_date: message.expire_started_at,
            expires_in_ms: message.expires_in_ms,
            directional_details: Some(details),
            item: Some(item),
        })
    })
}

fn archive_delivery_status(status: DeliveryStatus) -> send_status::Status {
    match status {
        DeliveryStatus::Pending => send_status::Status::Pending,
        DeliveryStatus::Sent => send_status::Status::Sent,
        DeliveryStatus::Delivered => send_status::Status::Delivered,
        DeliveryStatus::Read => send_status::Status::Read,
        DeliveryStatus::Viewed => send_status::Status::Viewed,
        DeliveryStatus::Skipped => send_status::Status::Skipped,
        DeliveryStatus::Failed => send_status::Status::Failed,
    }
}

fn restore_delivery_status(raw: i32) -> Option<DeliveryStatus> {
    match send_status::Status::try_from(raw).ok()? {
        send_status::Status::Unknown => None,
        send_status::Status::Pending => Some(DeliveryStatus::Pending),
        send_status::Status::Sent => Some(DeliveryStatus::Sent),
        send_status::Status::Delivered => Some(DeliveryStatus::Delivered),
        send_status::Status::Read => Some(DeliveryStatus::Read),
        send_status::Status::Viewed => Some(DeliveryStatus::Viewed),
        send_status::Status::Skipped => Some(DeliveryStatus::Skipped),
        send_status::Status::Failed => Some(DeliveryStatus::Failed),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatItemOutcome {
    Restored(MessageRowId),
    /// Already expired at backup time; nothing was written.
    Expired,
}

/// True when the item's disappearing-message timer ran out at or before
/// `backup_time_ms`.
pub fn is_expired(item: &proto::ChatItem, backup_time_ms: u64) -> bool {
    match (item.expire_start_date, item.expires_in_ms) {
        (Some(start), Some(expires_in)) if expires_in > 0 => start.saturating_add(expires_in) <= backup_time_ms,
        _ => false,
    }
}

pub fn restore_chat_item(
    conn: &Connection,
    item: &proto::ChatItem,
    recipients: &RecipientContext,
    chats: &ChatContext,
    backup_time_ms: u64,
) -> RestoreInteractionResult<ChatItemOutcome> {
    let chat_id = BackupChatId(item.chat_id);
    let id = RestoreObjectId::ChatItem {
        chat_id,
        date_sent: item.date_sent,
    };
    InteractionResult::collect(|partial| {
        let thread_id = chats
            .thread_id(chat_id)
            .ok_or_else(|| Bubble::fail(RestoreFrameError::new(id, RestoreErrorKind::ChatIdNotFound(chat_id))))?;
        if is_expired(item, backup_time_ms) {
            return Ok(ChatItemOutcome::Expired);
        }
        let content = item
            .item
            .as_ref()
            .ok_or_else(|| Bubble::fail(RestoreFrameError::new(id, InvalidProtoData::ChatItemMissingItem)))?;
        let contents = partial.absorb(restore_contents(conn, id, thread_id, content, recipients))?;

        let author = BackupRecipientId(item.author_id);
        let author_party = recipients
            .party(author)
            .ok_or_else(|| Bubble::fail(RestoreFrameError::new(id, RestoreErrorKind::RecipientIdNotFound(author))))?;
        let direction = match &item.directional_details {
            None => {
                return Err(Bubble::fail(RestoreFrameError::new(
                    id,
                    InvalidProtoData::ChatItemMissingDirectionalDetails,
                )))
            }
            Some(chat_item::DirectionalDetails::Directionless(_)) => {
                return Err(Bubble::fail(RestoreFrameError::new(
                    id,
                    InvalidProtoData::DirectionlessChatItemNotSupported,
                )))
            }
            Some(chat_item::DirectionalDetails::Incoming(incoming)) => {
                let author_id = author_party.individual_row_id().ok_or_else(|| {
                    Bubble::fail(RestoreFrameError::new(id, InvalidProtoData::IncomingAuthorNotIndividual))
                })?;
                MessageDirection::Incoming {
                    author_id,
                    received_at: incoming.date_received,
                    server_sent_at: incoming.date_server_sent,
                    read: incoming.read,
                    sealed_sender: incoming.sealed_sender,
                }
            }
            Some(chat_item::DirectionalDetails::Outgoing(outgoing)) => {
                let mut recipient_states = Vec::with_capacity(outgoing.send_status.len());
                for status in &outgoing.send_status {
                    let recipient_id = BackupRecipientId(status.recipient_id);
                    let Some(party) = recipients.party(recipient_id) else {
                        partial.push(RestoreFrameError::new(id, RestoreErrorKind::RecipientIdNotFound(recipient_id)));
                        continue;
                    };
                    let Some(delivery) = restore_delivery_status(status.status) else {
                        partial.push(RestoreFrameError::new(id, InvalidProtoData::UnrecognizedSendStatus));
                        continue;
                    };
                    recipient_states.push(OutgoingRecipientState {
                        recipient_id: party.row_id(),
                        status: delivery,
                        updated_at: status.timestamp,
                    });
                }
                MessageDirection::Outgoing { recipient_states }
            }
        };

        let mut new_message = NewMessage {
            thread_id,
            direction: Some(direction),
            sent_at: item.date_sent,
            expire_started_at: item.expire_start_date,
            expires_in_ms: item.expires_in_ms,
            ..Default::default()
        };
        contents.apply_to(&mut new_message);
        let message = insert_message(conn, &new_message)
            .map_err(|err| Bubble::fail(RestoreFrameError::insertion(id, err)))?;
        if message.id <= 0 {
            return Err(Bubble::fail(RestoreFrameError::new(id, RestoreErrorKind::DatabaseModelMissingRowId)));
        }
        // the row is written; downstream failures only degrade it
        let (_, downstream_errors) = restore_downstream_objects(conn, id, &message, contents, recipients).into_parts();
        partial.extend(downstream_errors);
        Ok(ChatItemOutcome::Restored(message.id))
    })
}

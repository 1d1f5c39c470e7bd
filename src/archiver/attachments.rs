//! Attachment references, one archive and one restore operation per role.
//!
//! Only pointers travel in the frame stream. Restoring a pointer creates an
//! `attachments` row owned by the already-inserted parent message.

use rusqlite::Connection;
use uuid::Uuid;

use crate::error::CoreError;
use crate::interaction::{
    Bubble, InteractionResult, InvalidProtoData, PartialErrors, RestoreFrameError, RestoreInteractionResult,
    RestoreObjectId,
};
use crate::models::{Attachment, AttachmentFlag, AttachmentRole, MessageRowId};
use crate::proto::{self, message_attachment};
use crate::query::{insert_attachment, list_attachments};

fn pointer_from_row(row: &Attachment) -> proto::FilePointer {
    proto::FilePointer {
        content_type: row.content_type.clone(),
        file_name: row.file_name.clone(),
        width: row.width,
        height: row.height,
        caption: row.caption.clone(),
        blur_hash: row.blur_hash.clone(),
        plaintext_hash: row.plaintext_hash.clone(),
        key: row.encryption_key.clone(),
        size: row.size_bytes,
    }
}

fn message_attachment_from_row(row: &Attachment) -> proto::MessageAttachment {
    let flag = match row.flag {
        AttachmentFlag::None => message_attachment::Flag::None,
        AttachmentFlag::VoiceMessage => message_attachment::Flag::VoiceMessage,
        AttachmentFlag::Borderless => message_attachment::Flag::Borderless,
        AttachmentFlag::Gif => message_attachment::Flag::Gif,
    };
    proto::MessageAttachment {
        pointer: Some(pointer_from_row(row)),
        flag: flag as i32,
        client_uuid: row.client_uuid.map(|uuid| uuid.as_bytes().to_vec()),
    }
}

fn first_pointer(
    conn: &Connection,
    message_id: MessageRowId,
    role: AttachmentRole,
) -> Result<Option<proto::FilePointer>, CoreError> {
    Ok(list_attachments(conn, message_id, role)?
        .first()
        .map(pointer_from_row))
}

pub fn archive_body_attachments(
    conn: &Connection,
    message_id: MessageRowId,
) -> Result<Vec<proto::MessageAttachment>, CoreError> {
    Ok(list_attachments(conn, message_id, AttachmentRole::Body)?
        .iter()
        .map(message_attachment_from_row)
        .collect())
}

pub fn archive_quote_thumbnail(
    conn: &Connection,
    message_id: MessageRowId,
) -> Result<Option<proto::MessageAttachment>, CoreError> {
    Ok(list_attachments(conn, message_id, AttachmentRole::QuoteThumbnail)?
        .first()
        .map(message_attachment_from_row))
}

pub fn archive_link_preview_image(
    conn: &Connection,
    message_id: MessageRowId,
) -> Result<Option<proto::FilePointer>, CoreError> {
    first_pointer(conn, message_id, AttachmentRole::LinkPreview)
}

pub fn archive_sticker_data(conn: &Connection, message_id: MessageRowId) -> Result<Option<proto::FilePointer>, CoreError> {
    first_pointer(conn, message_id, AttachmentRole::Sticker)
}

pub fn archive_contact_avatar(
    conn: &Connection,
    message_id: MessageRowId,
) -> Result<Option<proto::FilePointer>, CoreError> {
    first_pointer(conn, message_id, AttachmentRole::ContactAvatar)
}

pub fn archive_oversize_text(
    conn: &Connection,
    message_id: MessageRowId,
) -> Result<Option<proto::FilePointer>, CoreError> {
    first_pointer(conn, message_id, AttachmentRole::OversizeText)
}

fn row_from_pointer(
    message_id: MessageRowId,
    role: AttachmentRole,
    position: i64,
    pointer: &proto::FilePointer,
) -> Attachment {
    Attachment {
        id: Uuid::new_v4().to_string(),
        message_id,
        role,
        position,
        content_type: pointer.content_type.clone(),
        file_name: pointer.file_name.clone(),
        caption: pointer.caption.clone(),
        width: pointer.width,
        height: pointer.height,
        size_bytes: pointer.size,
        blur_hash: pointer.blur_hash.clone(),
        plaintext_hash: pointer.plaintext_hash.clone(),
        encryption_key: pointer.key.clone(),
        flag: AttachmentFlag::None,
        client_uuid: None,
    }
}

fn restore_pointer(
    conn: &Connection,
    id: RestoreObjectId,
    message_id: MessageRowId,
    role: AttachmentRole,
    pointer: &proto::FilePointer,
) -> RestoreInteractionResult<()> {
    match insert_attachment(conn, &row_from_pointer(message_id, role, 0, pointer)) {
        Ok(()) => InteractionResult::Success(()),
        Err(err) => InteractionResult::fail(RestoreFrameError::insertion(id, err)),
    }
}

/// Row for a `MessageAttachment`, keeping its flag and client uuid. A bad
/// client uuid only loses the uuid.
fn row_from_message_attachment(
    id: RestoreObjectId,
    message_id: MessageRowId,
    role: AttachmentRole,
    position: i64,
    pointer: &proto::FilePointer,
    attachment: &proto::MessageAttachment,
    partial: &mut PartialErrors<RestoreFrameError>,
) -> Attachment {
    let mut row = row_from_pointer(message_id, role, position, pointer);
    row.flag = match message_attachment::Flag::try_from(attachment.flag) {
        Ok(message_attachment::Flag::VoiceMessage) => AttachmentFlag::VoiceMessage,
        Ok(message_attachment::Flag::Borderless) => AttachmentFlag::Borderless,
        Ok(message_attachment::Flag::Gif) => AttachmentFlag::Gif,
        Ok(message_attachment::Flag::None) | Err(_) => AttachmentFlag::None,
    };
    if let Some(raw) = &attachment.client_uuid {
        match Uuid::from_slice(raw) {
            Ok(uuid) => row.client_uuid = Some(uuid),
            Err(_) => partial.push(RestoreFrameError::new(id, InvalidProtoData::InvalidAttachmentClientUuid)),
        }
    }
    row
}

/// Restores one row per attachment in stream order. Attachments without a
/// pointer are dropped individually.
pub fn restore_body_attachments(
    conn: &Connection,
    id: RestoreObjectId,
    message_id: MessageRowId,
    attachments: &[proto::MessageAttachment],
) -> RestoreInteractionResult<()> {
    InteractionResult::collect(|partial| {
        for (position, attachment) in attachments.iter().enumerate() {
            let Some(pointer) = &attachment.pointer else {
                partial.push(RestoreFrameError::new(id, InvalidProtoData::AttachmentMissingPointer));
                continue;
            };
            let row = row_from_message_attachment(
                id,
                message_id,
                AttachmentRole::Body,
                position as i64,
                pointer,
                attachment,
                partial,
            );
            insert_attachment(conn, &row).map_err(|err| Bubble::fail(RestoreFrameError::insertion(id, err)))?;
        }
        Ok(())
    })
}

pub fn restore_quote_thumbnail(
    conn: &Connection,
    id: RestoreObjectId,
    message_id: MessageRowId,
    thumbnail: &proto::MessageAttachment,
) -> RestoreInteractionResult<()> {
    InteractionResult::collect(|partial| {
        let pointer = thumbnail
            .pointer
            .as_ref()
            .ok_or_else(|| Bubble::fail(RestoreFrameError::new(id, InvalidProtoData::AttachmentMissingPointer)))?;
        let row = row_from_message_attachment(
            id,
            message_id,
            AttachmentRole::QuoteThumbnail,
            0,
            pointer,
            thumbnail,
            partial,
        );
        insert_attachment(conn, &row).map_err(|err| Bubble::fail(RestoreFrameError::insertion(id, err)))?;
        Ok(())
    })
}

pub fn restore_link_preview_image(
    conn: &Connection,
    id: RestoreObjectId,
    message_id: MessageRowId,
    image: &proto::FilePointer,
) -> RestoreInteractionResult<()> {
    restore_pointer(conn, id, message_id, AttachmentRole::LinkPreview, image)
}

pub fn restore_sticker_data(
    conn: &Connection,
    id: RestoreObjectId,
    message_id: MessageRowId,
    data: &proto::FilePointer,
) -> RestoreInteractionResult<()> {
    restore_pointer(conn, id, message_id, AttachmentRole::Sticker, data)
}

pub fn restore_contact_avatar(
    conn: &Connection,
    id: RestoreObjectId,
    message_id: MessageRowId,
    avatar: &proto::FilePointer,
) -> RestoreInteractionResult<()> {
    restore_pointer(conn, id, message_id, AttachmentRole::ContactAvatar, avatar)
}

pub fn restore_oversize_text(
    conn: &Connection,
    id: RestoreObjectId,
    message_id: MessageRowId,
    long_text: &proto::FilePointer,
) -> RestoreInteractionResult<()> {
    restore_pointer(conn, id, message_id, AttachmentRole::OversizeText, long_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BackupChatId;
    use crate::db::open_in_memory;
    use crate::models::{MessageDirection, NewMessage, RecipientKind, Thread};
    use crate::query::{insert_message, insert_recipient, insert_thread};

    fn parent_message(conn: &Connection) -> MessageRowId {
        let recipient = insert_recipient(conn, &RecipientKind::ReleaseNotes).expect("recipient");
        let thread = insert_thread(
            conn,
            &Thread {
                id: 0,
                recipient_id: recipient,
                archived: false,
                pinned_order: None,
                mute_until_ms: None,
                expiration_timer_ms: None,
            },
        )
        .expect("thread");
        insert_message(
            conn,
            &NewMessage {
                thread_id: thread,
                direction: Some(MessageDirection::Outgoing {
                    recipient_states: Vec::new(),
                }),
                sent_at: 5,
                ..Default::default()
            },
        )
        .expect("message")
        .id
    }

    #[test]
    fn body_attachments_keep_order_and_skip_missing_pointers() {
        let store = open_in_memory().expect("store");
        let message_id = parent_message(&store.conn);
        let id = RestoreObjectId::ChatItem {
            chat_id: BackupChatId(1),
            date_sent: 5,
        };
        let pointer = |name: &str| proto::FilePointer {
            content_type: Some("image/png".to_string()),
            file_name: Some(name.to_string()),
            ..Default::default()
        };
        let client_uuid = Uuid::new_v4();
        let attachments = vec![
            proto::MessageAttachment {
                pointer: Some(pointer("a.png")),
                flag: message_attachment::Flag::Gif as i32,
                client_uuid: Some(client_uuid.as_bytes().to_vec()),
            },
            proto::MessageAttachment {
                pointer: None,
                flag: 0,
                client_uuid: None,
            },
            proto::MessageAttachment {
                pointer: Some(pointer("c.png")),
                flag: 0,
                client_uuid: Some(vec![9; 3]),
            },
        ];
        let result = restore_body_attachments(&store.conn, id, message_id, &attachments);
        assert_eq!(result.errors().len(), 2);
        assert!(matches!(result, InteractionResult::PartialFailure((), _)));

        let archived = archive_body_attachments(&store.conn, message_id).expect("archive");
        assert_eq!(archived.len(), 2);
        assert_eq!(archived[0].flag, message_attachment::Flag::Gif as i32);
        assert_eq!(archived[0].client_uuid, Some(client_uuid.as_bytes().to_vec()));
        assert_eq!(
            archived[1].pointer.as_ref().and_then(|p| p.file_name.clone()),
            Some("c.png".to_string())
        );
        assert_eq!(archived[1].client_uuid, None);
    }

    #[test]
    fn each_role_round_trips_through_its_own_operation() {
        let store = open_in_memory().expect("store");
        let message_id = parent_message(&store.conn);
        let id = RestoreObjectId::ChatItem {
            chat_id: BackupChatId(1),
            date_sent: 5,
        };
        let pointer = proto::FilePointer {
            content_type: Some("text/x-signal-plain".to_string()),
            size: Some(4096),
            ..Default::default()
        };
        assert!(restore_oversize_text(&store.conn, id, message_id, &pointer).is_success());
        assert!(restore_sticker_data(&store.conn, id, message_id, &pointer).is_success());
        assert_eq!(archive_oversize_text(&store.conn, message_id).expect("read"), Some(pointer.clone()));
        assert_eq!(archive_sticker_data(&store.conn, message_id).expect("read"), Some(pointer));
        assert_eq!(archive_contact_avatar(&store.conn, message_id).expect("read"), None);
        assert_eq!(archive_link_preview_image(&store.conn, message_id).expect("read"), None);
    }

    #[test]
    fn quote_thumbnail_keeps_flag_and_client_uuid() {
        let store = open_in_memory().expect("store");
        let message_id = parent_message(&store.conn);
        let id = RestoreObjectId::ChatItem {
            chat_id: BackupChatId(1),
            date_sent: 5,
        };
        let thumbnail = proto::MessageAttachment {
            pointer: Some(proto::FilePointer {
                content_type: Some("image/gif".to_string()),
                width: Some(64),
                ..Default::default()
            }),
            flag: message_attachment::Flag::Gif as i32,
            client_uuid: Some(Uuid::new_v4().as_bytes().to_vec()),
        };
        assert!(restore_quote_thumbnail(&store.conn, id, message_id, &thumbnail).is_success());
        assert_eq!(archive_quote_thumbnail(&store.conn, message_id).expect("read"), Some(thumbnail));

        let bare = proto::MessageAttachment {
            pointer: None,
            flag: 0,
            client_uuid: None,
        };
        assert!(restore_quote_thumbnail(&store.conn, id, message_id, &bare).is_message_failure());
    }
}

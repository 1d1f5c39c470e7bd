//! Recipient and chat frames.
//!
//! Export assigns backup ids as it writes; import registers what every id
//! resolved to so that later chat items can refer back to it.

use rusqlite::Connection;
use uuid::Uuid;

use crate::context::{BackupChatId, BackupRecipientId, ChatContext, LocalParty, RecipientContext};
use crate::error::CoreError;
use crate::interaction::{
    ArchiveErrorKind, ArchiveFrameError, ArchiveInteractionResult, ArchiveObjectId, Bubble, InteractionResult,
    InvalidProtoData, RestoreErrorKind, RestoreFrameError, RestoreInteractionResult, RestoreObjectId,
};
use crate::models::{Recipient, RecipientKind, Thread};
use crate::proto::{self, recipient};
use crate::query::{find_contact_by_aci, find_singleton_recipient, insert_recipient, insert_thread};

fn parse_e164(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Assigns the recipient its backup id and builds its frame.
pub fn archive_recipient(recipient: &Recipient, ctx: &mut RecipientContext) -> ArchiveInteractionResult<proto::Recipient> {
    let object_id = ArchiveObjectId::Recipient(recipient.id);
    InteractionResult::collect(|partial| {
        let destination = match &recipient.kind {
            RecipientKind::LocalAccount => recipient::Destination::Self_(proto::SelfRecipient {}),
            RecipientKind::ReleaseNotes => recipient::Destination::ReleaseNotes(proto::ReleaseNotes {}),
            RecipientKind::Contact {
                aci,
                pni,
                e164,
                profile_given_name,
                profile_family_name,
            } => {
                let e164 = match e164.as_deref() {
                    Some(raw) => {
                        let parsed = parse_e164(raw);
                        if parsed.is_none() {
                            partial.push(ArchiveFrameError::new(object_id, ArchiveErrorKind::InvalidE164));
                        }
                        parsed
                    }
                    None => None,
                };
                recipient::Destination::Contact(proto::Contact {
                    aci: aci.map(|v| v.as_bytes().to_vec()),
                    pni: pni.map(|v| v.as_bytes().to_vec()),
                    e164,
                    profile_given_name: profile_given_name.clone(),
                    profile_family_name: profile_family_name.clone(),
                })
            }
            RecipientKind::Group { master_key, title } => recipient::Destination::Group(proto::Group {
                master_key: master_key.clone(),
                title: title.clone(),
            }),
            RecipientKind::DistributionList { distribution_id, name } => {
                recipient::Destination::DistributionList(proto::DistributionList {
                    distribution_id: distribution_id.as_bytes().to_vec(),
                    name: name.clone(),
                })
            }
        };
        let id = ctx.assign(recipient.id);
        Ok(proto::Recipient {
            id: id.0,
            destination: Some(destination),
        })
    })
}

/// Chats can only be written once their recipient has a backup id.
pub fn archive_chat(
    thread: &Thread,
    recipient_kind: Option<&RecipientKind>,
    recipients: &RecipientContext,
    chats: &mut ChatContext,
) -> ArchiveInteractionResult<proto::Chat> {
    let object_id = ArchiveObjectId::Thread(thread.id);
    let Some(recipient_id) = recipients.backup_id(thread.recipient_id) else {
        return InteractionResult::fail(ArchiveFrameError::new(
            object_id,
            ArchiveErrorKind::ReferencedRecipientIdMissing(thread.recipient_id),
        ));
    };
    if matches!(recipient_kind, Some(RecipientKind::DistributionList { .. })) {
        return InteractionResult::fail(ArchiveFrameError::new(
            object_id,
            ArchiveErrorKind::ChatRecipientNotConversation,
        ));
    }
    let id = chats.assign(thread.id);
    InteractionResult::Success(proto::Chat {
        id: id.0,
        recipient_id: recipient_id.0,
        archived: thread.archived,
        pinned_order: thread.pinned_order,
        expiration_timer_ms: thread.expiration_timer_ms,
        mute_until_ms: thread.mute_until_ms,
    })
}

fn uuid_from_bytes(id: RestoreObjectId, raw: &[u8], error: InvalidProtoData) -> Result<Uuid, Bubble<RestoreFrameError>> {
    Uuid::from_slice(raw).map_err(|_| Bubble::fail(RestoreFrameError::new(id, error)))
}

fn singleton(conn: &Connection, kind: &RecipientKind) -> Result<i64, CoreError> {
    match find_singleton_recipient(conn, kind)? {
        Some(existing) => Ok(existing),
        None => insert_recipient(conn, kind),
    }
}

/// Creates (or, for the local account and release notes, reuses) the host
/// recipient for a frame and registers its backup id.
pub fn restore_recipient(
    conn: &Connection,
    frame: &proto::Recipient,
    ctx: &mut RecipientContext,
) -> RestoreInteractionResult<()> {
    let backup_id = BackupRecipientId(frame.id);
    let id = RestoreObjectId::Recipient(backup_id);
    InteractionResult::collect(|_partial| {
        if ctx.party(backup_id).is_some() {
            return Err(Bubble::fail(RestoreFrameError::new(
                id,
                InvalidProtoData::DuplicateRecipientId(frame.id),
            )));
        }
        let destination = frame
            .destination
            .as_ref()
            .ok_or_else(|| Bubble::fail(RestoreFrameError::new(id, InvalidProtoData::RecipientMissingDestination)))?;
        let insert_failed = |err: CoreError| Bubble::fail(RestoreFrameError::insertion(id, err));
        let kind = match destination {
            recipient::Destination::Self_(_) => RecipientKind::LocalAccount,
            recipient::Destination::ReleaseNotes(_) => RecipientKind::ReleaseNotes,
            recipient::Destination::Contact(contact) => RecipientKind::Contact {
                aci: contact
                    .aci
                    .as_deref()
                    .map(|raw| uuid_from_bytes(id, raw, InvalidProtoData::InvalidAci))
                    .transpose()?,
                pni: contact
                    .pni
                    .as_deref()
                    .map(|raw| uuid_from_bytes(id, raw, InvalidProtoData::InvalidAci))
                    .transpose()?,
                e164: contact.e164.map(|n| format!("+{n}")),
                profile_given_name: contact.profile_given_name.clone(),
                profile_family_name: contact.profile_family_name.clone(),
            },
            recipient::Destination::Group(group) => RecipientKind::Group {
                master_key: group.master_key.clone(),
                title: group.title.clone(),
            },
            recipient::Destination::DistributionList(list) => RecipientKind::DistributionList {
                distribution_id: uuid_from_bytes(id, &list.distribution_id, InvalidProtoData::InvalidDistributionId)?,
                name: list.name.clone(),
            },
        };
        let row_id = match &kind {
            RecipientKind::LocalAccount | RecipientKind::ReleaseNotes => singleton(conn, &kind).map_err(insert_failed)?,
            RecipientKind::Contact { aci: Some(aci), .. } => match find_contact_by_aci(conn, aci).map_err(insert_failed)? {
                Some(existing) => existing,
                None => insert_recipient(conn, &kind).map_err(insert_failed)?,
            },
            _ => insert_recipient(conn, &kind).map_err(insert_failed)?,
        };
        if row_id <= 0 {
            return Err(Bubble::fail(RestoreFrameError::new(id, RestoreErrorKind::DatabaseModelMissingRowId)));
        }
        ctx.register(backup_id, LocalParty::from_kind(row_id, &kind));
        Ok(())
    })
}

pub fn restore_chat(
    conn: &Connection,
    frame: &proto::Chat,
    recipients: &RecipientContext,
    chats: &mut ChatContext,
) -> RestoreInteractionResult<()> {
    let chat_id = BackupChatId(frame.id);
    let id = RestoreObjectId::Chat(chat_id);
    if chats.thread_id(chat_id).is_some() {
        return InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::DuplicateChatId(frame.id)));
    }
    let recipient_id = BackupRecipientId(frame.recipient_id);
    let party = match recipients.party(recipient_id) {
        Some(party) => party,
        None => {
            return InteractionResult::fail(RestoreFrameError::new(
                id,
                RestoreErrorKind::RecipientIdNotFound(recipient_id),
            ))
        }
    };
    if matches!(party, LocalParty::DistributionList(_)) {
        return InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::ChatRecipientNotConversation));
    }
    let thread = Thread {
        id: 0,
        recipient_id: party.row_id(),
        archived: frame.archived,
        pinned_order: frame.pinned_order,
        mute_until_ms: frame.mute_until_ms,
        expiration_timer_ms: frame.expiration_timer_ms,
    };
    match insert_thread(conn, &thread) {
        Ok(thread_id) => {
            chats.register(chat_id, thread_id);
            InteractionResult::Success(())
        }
        Err(err) => InteractionResult::fail(RestoreFrameError::insertion(id, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn e164_parsing() {
        assert_eq!(parse_e164("+15551234567"), Some(15_551_234_567));
        assert_eq!(parse_e164("5551234"), Some(5_551_234));
        assert_eq!(parse_e164("+1 555"), None);
        assert_eq!(parse_e164("+"), None);
    }

    #[test]
    fn restore_reuses_local_account_and_rejects_duplicates() {
        let store = open_in_memory().expect("store");
        let existing = insert_recipient(&store.conn, &RecipientKind::LocalAccount).expect("self");
        let mut ctx = RecipientContext::new();
        let frame = proto::Recipient {
            id: 1,
            destination: Some(recipient::Destination::Self_(proto::SelfRecipient {})),
        };
        assert!(restore_recipient(&store.conn, &frame, &mut ctx).is_success());
        assert_eq!(ctx.party(BackupRecipientId(1)), Some(&LocalParty::LocalAddress(existing)));
        assert_eq!(
            restore_recipient(&store.conn, &frame, &mut ctx),
            InteractionResult::fail(RestoreFrameError::new(
                RestoreObjectId::Recipient(BackupRecipientId(1)),
                InvalidProtoData::DuplicateRecipientId(1)
            ))
        );
    }

    #[test]
    fn chat_needs_a_registered_conversation_recipient() {
        let store = open_in_memory().expect("store");
        let mut recipients = RecipientContext::new();
        let mut chats = ChatContext::new();
        let list = proto::Recipient {
            id: 4,
            destination: Some(recipient::Destination::DistributionList(proto::DistributionList {
                distribution_id: Uuid::new_v4().as_bytes().to_vec(),
                name: "Close friends".to_string(),
            })),
        };
        assert!(restore_recipient(&store.conn, &list, &mut recipients).is_success());

        let dangling = proto::Chat {
            id: 1,
            recipient_id: 9,
            ..Default::default()
        };
        assert_eq!(
            restore_chat(&store.conn, &dangling, &recipients, &mut chats),
            InteractionResult::fail(RestoreFrameError::new(
                RestoreObjectId::Chat(BackupChatId(1)),
                RestoreErrorKind::RecipientIdNotFound(BackupRecipientId(9))
            ))
        );
        let to_list = proto::Chat {
            id: 2,
            recipient_id: 4,
            ..Default::default()
        };
        assert!(restore_chat(&store.conn, &to_list, &recipients, &mut chats).is_message_failure());
        assert_eq!(chats.thread_id(BackupChatId(2)), None);
    }

    #[test]
    fn bad_aci_fails_the_recipient() {
        let store = open_in_memory().expect("store");
        let mut ctx = RecipientContext::new();
        let frame = proto::Recipient {
            id: 2,
            destination: Some(recipient::Destination::Contact(proto::Contact {
                aci: Some(vec![1, 2, 3]),
                ..Default::default()
            })),
        };
        let result = restore_recipient(&store.conn, &frame, &mut ctx);
        assert!(result.is_message_failure());
        assert!(ctx.party(BackupRecipientId(2)).is_none());
    }
}

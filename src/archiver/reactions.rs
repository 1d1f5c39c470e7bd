use rusqlite::Connection;
use tracing::debug;

use crate::context::{BackupRecipientId, RecipientContext};
use crate::interaction::{
    ArchiveErrorKind, ArchiveFrameError, ArchiveInteractionResult, ArchiveObjectId, Bubble, InteractionResult,
    InvalidProtoData, RestoreErrorKind, RestoreFrameError, RestoreInteractionResult, RestoreObjectId,
};
use crate::models::{MessageRowId, Reaction};
use crate::proto;
use crate::query::{insert_reactions, list_reactions};

/// Reactions whose author never got a backup id are dropped one by one.
pub fn archive_reactions(
    conn: &Connection,
    id: ArchiveObjectId,
    message_id: MessageRowId,
    recipients: &RecipientContext,
) -> ArchiveInteractionResult<Vec<proto::Reaction>> {
    InteractionResult::collect(|partial| {
        let rows = list_reactions(conn, message_id).map_err(|err| Bubble::fail(ArchiveFrameError::database(id, err)))?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(author) = recipients.backup_id(row.author_id) else {
                partial.push(ArchiveFrameError::new(
                    id,
                    ArchiveErrorKind::ReferencedRecipientIdMissing(row.author_id),
                ));
                continue;
            };
            out.push(proto::Reaction {
                emoji: row.emoji,
                author_id: author.0,
                sent_timestamp: row.sent_at,
                sort_order: row.sort_order,
            });
        }
        Ok(out)
    })
}

pub fn restore_reactions(
    conn: &Connection,
    id: RestoreObjectId,
    message_id: MessageRowId,
    reactions: &[proto::Reaction],
    recipients: &RecipientContext,
) -> RestoreInteractionResult<()> {
    if reactions.is_empty() {
        return InteractionResult::Success(());
    }
    InteractionResult::collect(|partial| {
        let mut rows = Vec::with_capacity(reactions.len());
        for reaction in reactions {
            let author = BackupRecipientId(reaction.author_id);
            let Some(party) = recipients.party(author) else {
                partial.push(RestoreFrameError::new(id, RestoreErrorKind::RecipientIdNotFound(author)));
                continue;
            };
            let Some(author_id) = party.individual_row_id() else {
                partial.push(RestoreFrameError::new(id, InvalidProtoData::ReactionAuthorNotIndividual));
                continue;
            };
            rows.push(Reaction {
                message_id,
                author_id,
                emoji: reaction.emoji.clone(),
                sent_at: reaction.sent_timestamp,
                sort_order: reaction.sort_order,
            });
        }
        let batches = insert_reactions(conn, &rows).map_err(|err| Bubble::fail(RestoreFrameError::insertion(id, err)))?;
        debug!(message_id, reactions = rows.len(), batches = batches.len(), "reactions restored");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BackupChatId, LocalParty};

    #[test]
    fn reaction_from_unknown_or_group_author_is_dropped() {
        let mut recipients = RecipientContext::new();
        recipients.register(BackupRecipientId(1), LocalParty::Group(4));
        let id = RestoreObjectId::ChatItem {
            chat_id: BackupChatId(1),
            date_sent: 1,
        };
        let conn = Connection::open_in_memory().expect("db");
        let reactions = vec![
            proto::Reaction {
                emoji: "👍".to_string(),
                author_id: 1,
                sent_timestamp: 2,
                sort_order: 0,
            },
            proto::Reaction {
                emoji: "🔥".to_string(),
                author_id: 9,
                sent_timestamp: 3,
                sort_order: 1,
            },
        ];
        // no rows survive, so nothing touches the (unmigrated) connection
        let result = restore_reactions(&conn, id, 1, &reactions, &recipients);
        assert_eq!(
            result,
            InteractionResult::PartialFailure(
                (),
                vec![
                    RestoreFrameError::new(id, InvalidProtoData::ReactionAuthorNotIndividual),
                    RestoreFrameError::new(id, RestoreErrorKind::RecipientIdNotFound(BackupRecipientId(9))),
                ]
            )
        );
    }
}

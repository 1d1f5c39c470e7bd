//! Quotes of earlier messages.
//!
//! A quote carries a snapshot of the quoted text. On restore the snapshot is
//! only replaced by the live message when exactly one message in the thread
//! has the target timestamp and that message still has a body.

use rusqlite::Connection;

use super::attachments;
use super::text::{archive_text, restore_body_ranges};
use crate::context::{BackupRecipientId, RecipientContext};
use crate::interaction::{
    ArchiveErrorKind, ArchiveFrameError, ArchiveInteractionResult, ArchiveObjectId, Bubble, InteractionResult,
    InvalidProtoData, RestoreErrorKind, RestoreFrameError, RestoreInteractionResult, RestoreObjectId,
};
use crate::models::{MessageRowId, QuoteBodySource, QuotedAttachmentInfo, QuotedMessage, ThreadRowId};
use crate::proto::{self, quote};
use crate::query::find_messages_by_timestamp;

/// A quote whose author has no backup id fails the whole message.
pub fn archive_quote(
    conn: &Connection,
    id: ArchiveObjectId,
    message_id: MessageRowId,
    quoted: &QuotedMessage,
    recipients: &RecipientContext,
) -> ArchiveInteractionResult<proto::Quote> {
    InteractionResult::collect(|partial| {
        let author = recipients.backup_id(quoted.author_id).ok_or_else(|| {
            Bubble::fail(ArchiveFrameError::new(
                id,
                ArchiveErrorKind::ReferencedRecipientIdMissing(quoted.author_id),
            ))
        })?;
        let text = match quoted.body.as_deref() {
            Some(body) if !body.is_empty() => Some(partial.absorb(archive_text(id, body, &quoted.body_ranges))?),
            _ => None,
        };
        let attachments = match &quoted.attachment {
            Some(QuotedAttachmentInfo::Thumbnail {
                content_type,
                file_name,
            }) => {
                let thumbnail = attachments::archive_quote_thumbnail(conn, message_id)
                    .map_err(|err| Bubble::fail(ArchiveFrameError::database(id, err)))?;
                vec![quote::QuotedAttachment {
                    content_type: content_type.clone(),
                    file_name: file_name.clone(),
                    thumbnail,
                }]
            }
            Some(QuotedAttachmentInfo::Stub {
                content_type,
                file_name,
            }) => vec![quote::QuotedAttachment {
                content_type: content_type.clone(),
                file_name: file_name.clone(),
                thumbnail: None,
            }],
            None => Vec::new(),
        };
        let kind = if quoted.is_gift_badge {
            quote::Type::GiftBadge
        } else {
            quote::Type::Normal
        };
        Ok(proto::Quote {
            target_sent_timestamp: quoted.target_timestamp,
            author_id: author.0,
            text,
            attachments,
            r#type: kind as i32,
        })
    })
}

/// Restored quote plus the thumbnail that can only be attached once the
/// quoting message exists.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredQuote {
    pub quote: QuotedMessage,
    pub thumbnail: Option<proto::MessageAttachment>,
}

pub fn restore_quote(
    conn: &Connection,
    id: RestoreObjectId,
    thread_id: ThreadRowId,
    proto_quote: &proto::Quote,
    recipients: &RecipientContext,
) -> RestoreInteractionResult<RestoredQuote> {
    InteractionResult::collect(|partial| {
        let author = BackupRecipientId(proto_quote.author_id);
        let party = recipients
            .party(author)
            .ok_or_else(|| Bubble::fail(RestoreFrameError::new(id, RestoreErrorKind::RecipientIdNotFound(author))))?;
        let author_id = party
            .individual_row_id()
            .ok_or_else(|| Bubble::fail(RestoreFrameError::new(id, InvalidProtoData::InvalidQuoteAuthor)))?;

        let is_gift_badge = proto_quote.r#type == quote::Type::GiftBadge as i32;
        let snapshot_body = proto_quote.text.as_ref().filter(|text| !text.body.is_empty());
        if snapshot_body.is_none() && proto_quote.attachments.is_empty() && !is_gift_badge {
            return Err(Bubble::fail(RestoreFrameError::new(id, InvalidProtoData::QuotedMessageEmptyContent)));
        }

        let live_target = match proto_quote.target_sent_timestamp {
            Some(ts) => {
                let mut candidates = find_messages_by_timestamp(conn, thread_id, ts)
                    .map_err(|err| Bubble::fail(RestoreFrameError::insertion(id, err)))?;
                // several candidates are ambiguous; keep the snapshot
                let unique = if candidates.len() == 1 { candidates.pop() } else { None };
                // a target without text (deleted, attachment only) cannot rebuild the quote
                unique.filter(|target| target.body.as_deref().is_some_and(|body| !body.is_empty()))
            }
            None => None,
        };

        let (body, body_ranges, body_source) = match live_target {
            Some(target) => (target.body, target.body_ranges, QuoteBodySource::Local),
            None => match snapshot_body {
                Some(text) => {
                    let ranges = partial.absorb(restore_body_ranges(id, &text.body, &text.body_ranges))?;
                    (Some(text.body.clone()), ranges, QuoteBodySource::Remote)
                }
                None => (None, Vec::new(), QuoteBodySource::Remote),
            },
        };

        let (attachment, thumbnail) = match proto_quote.attachments.first() {
            Some(quoted) => match &quoted.thumbnail {
                Some(thumbnail) => (
                    Some(QuotedAttachmentInfo::Thumbnail {
                        content_type: quoted.content_type.clone(),
                        file_name: quoted.file_name.clone(),
                    }),
                    Some(thumbnail.clone()),
                ),
                None => (
                    Some(QuotedAttachmentInfo::Stub {
                        content_type: quoted.content_type.clone(),
                        file_name: quoted.file_name.clone(),
                    }),
                    None,
                ),
            },
            None => (None, None),
        };

        Ok(RestoredQuote {
            quote: QuotedMessage {
                target_timestamp: proto_quote.target_sent_timestamp,
                author_id,
                body,
                body_ranges,
                body_source,
                is_gift_badge,
                attachment,
            },
            thumbnail,
        })
    })
}

//! Per-entity outcomes of archiving and restoring.
//!
//! Nothing below the pass level returns `Err` for bad data. Every step
//! returns an [`InteractionResult`]; a [`PartialErrors`] builder owned by the
//! calling function collects facet-level errors and `?` on a [`Bubble`]
//! ends that one entity early.

use thiserror::Error;

use crate::context::{BackupChatId, BackupRecipientId};
use crate::models::{MessageRowId, RecipientRowId, ThreadRowId};

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionResult<T, E> {
    Success(T),
    /// Value is usable but some facets were dropped; the errors must be
    /// reported and the value still persisted.
    PartialFailure(T, Vec<E>),
    /// The entity could not be produced; siblings carry on.
    MessageFailure(Vec<E>),
    /// Recognized shape this engine skips on purpose.
    NotYetImplemented,
}

pub type ArchiveInteractionResult<T> = InteractionResult<T, ArchiveFrameError>;
pub type RestoreInteractionResult<T> = InteractionResult<T, RestoreFrameError>;

/// Early exit from an entity's processing.
#[derive(Debug, Clone, PartialEq)]
pub enum Bubble<E> {
    Failure(Vec<E>),
    NotYetImplemented,
}

impl<E> Bubble<E> {
    pub fn fail(error: E) -> Self {
        Bubble::Failure(vec![error])
    }
}

impl<T, E> InteractionResult<T, E> {
    pub fn fail(error: E) -> Self {
        InteractionResult::MessageFailure(vec![error])
    }

    /// Runs `f` with a fresh error builder and folds its outcome into a
    /// result.
    pub fn collect(f: impl FnOnce(&mut PartialErrors<E>) -> Result<T, Bubble<E>>) -> Self {
        let mut partial = PartialErrors::new();
        let outcome = f(&mut partial);
        partial.finish(outcome)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> InteractionResult<U, E> {
        match self {
            InteractionResult::Success(v) => InteractionResult::Success(f(v)),
            InteractionResult::PartialFailure(v, errors) => InteractionResult::PartialFailure(f(v), errors),
            InteractionResult::MessageFailure(errors) => InteractionResult::MessageFailure(errors),
            InteractionResult::NotYetImplemented => InteractionResult::NotYetImplemented,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InteractionResult::Success(_))
    }

    pub fn is_message_failure(&self) -> bool {
        matches!(self, InteractionResult::MessageFailure(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            InteractionResult::Success(v) | InteractionResult::PartialFailure(v, _) => Some(v),
            _ => None,
        }
    }

    pub fn errors(&self) -> &[E] {
        match self {
            InteractionResult::PartialFailure(_, errors) | InteractionResult::MessageFailure(errors) => errors,
            _ => &[],
        }
    }

    /// Splits into the produced value (if any) and every reported error.
    pub fn into_parts(self) -> (Option<T>, Vec<E>) {
        match self {
            InteractionResult::Success(v) => (Some(v), Vec::new()),
            InteractionResult::PartialFailure(v, errors) => (Some(v), errors),
            InteractionResult::MessageFailure(errors) => (None, errors),
            InteractionResult::NotYetImplemented => (None, Vec::new()),
        }
    }
}

impl<E> InteractionResult<(), E> {
    /// Combines independent sibling steps. Any failure fails the whole;
    /// errors from both sides are kept.
    pub fn combine(self, other: Self) -> Self {
        use InteractionResult::*;
        match (self, other) {
            (MessageFailure(mut a), rhs) => {
                a.extend(rhs.into_parts().1);
                MessageFailure(a)
            }
            (lhs, MessageFailure(b)) => {
                let mut a = lhs.into_parts().1;
                a.extend(b);
                MessageFailure(a)
            }
            (PartialFailure((), mut a), rhs) => {
                a.extend(rhs.into_parts().1);
                PartialFailure((), a)
            }
            (lhs, PartialFailure((), b)) => {
                let mut a = lhs.into_parts().1;
                a.extend(b);
                PartialFailure((), a)
            }
            (Success(()), _) | (_, Success(())) => Success(()),
            (NotYetImplemented, NotYetImplemented) => NotYetImplemented,
        }
    }

    pub fn combine_all(results: impl IntoIterator<Item = Self>) -> Self {
        results
            .into_iter()
            .fold(InteractionResult::Success(()), InteractionResult::combine)
    }
}

/// Facet-level errors collected while one entity is processed.
#[derive(Debug)]
pub struct PartialErrors<E> {
    errors: Vec<E>,
}

impl<E> Default for PartialErrors<E> {
    fn default() -> Self {
        Self { errors: Vec::new() }
    }
}

impl<E> PartialErrors<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: E) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = E>) {
        self.errors.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Unwraps a sub-step's value, keeping its partial errors; failures and
    /// skips end the caller.
    pub fn absorb<T>(&mut self, result: InteractionResult<T, E>) -> Result<T, Bubble<E>> {
        match result {
            InteractionResult::Success(v) => Ok(v),
            InteractionResult::PartialFailure(v, errors) => {
                self.errors.extend(errors);
                Ok(v)
            }
            InteractionResult::MessageFailure(errors) => Err(Bubble::Failure(errors)),
            InteractionResult::NotYetImplemented => Err(Bubble::NotYetImplemented),
        }
    }

    pub fn finish<T>(self, outcome: Result<T, Bubble<E>>) -> InteractionResult<T, E> {
        let mut errors = self.errors;
        match outcome {
            Ok(v) if errors.is_empty() => InteractionResult::Success(v),
            Ok(v) => InteractionResult::PartialFailure(v, errors),
            Err(Bubble::Failure(failure)) => {
                errors.extend(failure);
                InteractionResult::MessageFailure(errors)
            }
            Err(Bubble::NotYetImplemented) => InteractionResult::NotYetImplemented,
        }
    }
}

/// Entity errors that end up in a pass report.
pub trait ReportedError: std::fmt::Display {
    /// Engine bugs rather than bad input; logged loudly.
    fn is_developer_error(&self) -> bool;
}

// archive errors

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveObjectId {
    Recipient(RecipientRowId),
    Thread(ThreadRowId),
    Message {
        thread_id: ThreadRowId,
        message_id: MessageRowId,
        sent_at: u64,
    },
}

impl std::fmt::Display for ArchiveObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveObjectId::Recipient(id) => write!(f, "recipient row {id}"),
            ArchiveObjectId::Thread(id) => write!(f, "thread row {id}"),
            ArchiveObjectId::Message {
                thread_id,
                message_id,
                sent_at,
            } => write!(f, "message row {message_id} (thread {thread_id}, sent {sent_at})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArchiveErrorKind {
    #[error("payment record missing for payment message")]
    MissingPaymentInformation,
    #[error("referenced recipient row {0} has no backup id")]
    ReferencedRecipientIdMissing(RecipientRowId),
    #[error("referenced thread row {0} has no backup id")]
    ReferencedThreadIdMissing(ThreadRowId),
    #[error("unrecognized body range style")]
    UnrecognizedBodyRangeStyle,
    #[error("distribution list cannot be a chat recipient")]
    ChatRecipientNotConversation,
    #[error("sticker message has no sticker attachment")]
    MissingStickerAttachment,
    #[error("phone number is not a valid e164")]
    InvalidE164,
    #[error("database read failed: {0}")]
    Database(String),
    #[error("developer error: {0}")]
    DeveloperError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{id}: {kind}")]
pub struct ArchiveFrameError {
    pub id: ArchiveObjectId,
    pub kind: ArchiveErrorKind,
}

impl ArchiveFrameError {
    pub fn new(id: ArchiveObjectId, kind: ArchiveErrorKind) -> Self {
        Self { id, kind }
    }

    pub fn database(id: ArchiveObjectId, err: impl std::fmt::Display) -> Self {
        Self::new(id, ArchiveErrorKind::Database(err.to_string()))
    }
}

impl ReportedError for ArchiveFrameError {
    fn is_developer_error(&self) -> bool {
        matches!(self.kind, ArchiveErrorKind::DeveloperError(_))
    }
}

// restore errors

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreObjectId {
    Recipient(BackupRecipientId),
    Chat(BackupChatId),
    ChatItem { chat_id: BackupChatId, date_sent: u64 },
}

impl std::fmt::Display for RestoreObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreObjectId::Recipient(id) => write!(f, "{id}"),
            RestoreObjectId::Chat(id) => write!(f, "{id}"),
            RestoreObjectId::ChatItem { chat_id, date_sent } => write!(f, "chat item in {chat_id} sent {date_sent}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidProtoData {
    #[error("standard message has neither text nor attachments")]
    EmptyStandardMessage,
    #[error("standard message has long text but an empty body")]
    LongTextStandardMessageMissingBody,
    #[error("quote author is not an individual")]
    InvalidQuoteAuthor,
    #[error("quote has no text, attachments or gift badge")]
    QuotedMessageEmptyContent,
    #[error("link preview has an empty url")]
    LinkPreviewEmptyUrl,
    #[error("link preview url is not in the message body")]
    LinkPreviewUrlNotInBody,
    #[error("unrecognized body range style")]
    UnrecognizedBodyRangeStyle,
    #[error("body range mention is not a valid aci")]
    InvalidMentionAci,
    #[error("body range is out of bounds")]
    BodyRangeOutOfBounds,
    #[error("unrecognized gift badge state")]
    UnrecognizedGiftBadgeState,
    #[error("unrecognized payment transaction")]
    UnrecognizedPaymentTransaction,
    #[error("chat item has no recognized content")]
    ChatItemMissingItem,
    #[error("chat item has no directional details")]
    ChatItemMissingDirectionalDetails,
    #[error("directionless chat items are not supported for this content")]
    DirectionlessChatItemNotSupported,
    #[error("incoming chat item author is not an individual")]
    IncomingAuthorNotIndividual,
    #[error("reaction author is not an individual")]
    ReactionAuthorNotIndividual,
    #[error("recipient has no destination")]
    RecipientMissingDestination,
    #[error("invalid aci bytes")]
    InvalidAci,
    #[error("invalid distribution id")]
    InvalidDistributionId,
    #[error("duplicate recipient id {0}")]
    DuplicateRecipientId(u64),
    #[error("duplicate chat id {0}")]
    DuplicateChatId(u64),
    #[error("chat recipient cannot host a conversation")]
    ChatRecipientNotConversation,
    #[error("contact message has no contact")]
    ContactMessageMissingContact,
    #[error("sticker message has no sticker")]
    StickerMessageMissingSticker,
    #[error("sticker has no data pointer")]
    StickerMissingData,
    #[error("attachment has no file pointer")]
    AttachmentMissingPointer,
    #[error("invalid client uuid on attachment")]
    InvalidAttachmentClientUuid,
    #[error("unrecognized send status")]
    UnrecognizedSendStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreErrorKind {
    #[error("invalid proto data: {0}")]
    InvalidProtoData(InvalidProtoData),
    #[error("recipient id not found: {0}")]
    RecipientIdNotFound(BackupRecipientId),
    #[error("chat id not found: {0}")]
    ChatIdNotFound(BackupChatId),
    #[error("payment thread is not a one-to-one conversation with a known account")]
    PaymentThreadNotContact,
    #[error("inserted model has no row id")]
    DatabaseModelMissingRowId,
    #[error("database write failed: {0}")]
    DatabaseInsertionFailed(String),
    #[error("developer error: {0}")]
    DeveloperError(String),
}

impl From<InvalidProtoData> for RestoreErrorKind {
    fn from(value: InvalidProtoData) -> Self {
        RestoreErrorKind::InvalidProtoData(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{id}: {kind}")]
pub struct RestoreFrameError {
    pub id: RestoreObjectId,
    pub kind: RestoreErrorKind,
}

impl RestoreFrameError {
    pub fn new(id: RestoreObjectId, kind: impl Into<RestoreErrorKind>) -> Self {
        Self { id, kind: kind.into() }
    }

    pub fn insertion(id: RestoreObjectId, err: impl std::fmt::Display) -> Self {
        Self::new(id, RestoreErrorKind::DatabaseInsertionFailed(err.to_string()))
    }
}

impl ReportedError for RestoreFrameError {
    fn is_developer_error(&self) -> bool {
        matches!(
            self.kind,
            RestoreErrorKind::DeveloperError(_) | RestoreErrorKind::DatabaseModelMissingRowId
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type R = InteractionResult<(), &'static str>;

    #[test]
    fn combine_keeps_every_error() {
        let combined = R::MessageFailure(vec!["a"]).combine(R::PartialFailure((), vec!["b"]));
        assert_eq!(combined, R::MessageFailure(vec!["a", "b"]));
        let combined = R::Success(()).combine(R::MessageFailure(vec!["c"]));
        assert_eq!(combined, R::MessageFailure(vec!["c"]));
        assert_eq!(R::Success(()).combine(R::Success(())), R::Success(()));
        assert_eq!(
            R::combine_all([R::Success(()), R::PartialFailure((), vec!["d"]), R::NotYetImplemented]),
            R::PartialFailure((), vec!["d"])
        );
    }

    #[test]
    fn collect_bubbles_failure_with_prior_partial_errors() {
        let result: InteractionResult<u32, &str> = InteractionResult::collect(|partial| {
            let a = partial.absorb(InteractionResult::PartialFailure(1, vec!["dropped"]))?;
            let b: u32 = partial.absorb(InteractionResult::MessageFailure(vec!["fatal"]))?;
            Ok(a + b)
        });
        assert_eq!(result, InteractionResult::MessageFailure(vec!["dropped", "fatal"]));
    }

    #[test]
    fn collect_reports_partial_failure() {
        let result: InteractionResult<u32, &str> = InteractionResult::collect(|partial| {
            partial.push("range");
            Ok(7)
        });
        assert_eq!(result, InteractionResult::PartialFailure(7, vec!["range"]));
    }

    #[test]
    fn not_yet_implemented_short_circuits_without_errors() {
        let result: InteractionResult<u32, &str> = InteractionResult::collect(|partial| {
            partial.push("ignored");
            partial.absorb(InteractionResult::NotYetImplemented)
        });
        assert_eq!(result, InteractionResult::NotYetImplemented);
    }
}

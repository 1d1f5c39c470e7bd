//! Payment notifications.
//!
//! Live payments are read from `payment_models` by receipt; payments that
//! came from an earlier backup are read from `archived_payments`. Both
//! produce the same frame and both restore into `archived_payments`.

use rusqlite::Connection;
use tracing::debug;

use crate::interaction::{
    ArchiveErrorKind, ArchiveFrameError, ArchiveInteractionResult, ArchiveObjectId, Bubble, InteractionResult,
    InvalidProtoData, RestoreErrorKind, RestoreFrameError, RestoreInteractionResult, RestoreObjectId,
};
use crate::models::{
    ArchivedPayment, Message, MessageDirection, PaymentDirection, PaymentFailure, PaymentNotificationInfo,
    PaymentStatus, RecipientKind,
};
use crate::proto::payment_notification::transaction_details::{
    self, failed_transaction, transaction, FailedTransaction, MobileCoinTxoIdentification, Transaction,
};
use crate::proto::{self, payment_notification};
use crate::query::{find_archived_payment, find_payment_model, get_recipient, get_thread, insert_archived_payment};

const PICO_PER_MOB: u64 = 1_000_000_000_000;
const PICO_DIGITS: usize = 12;

/// Formats picoMOB as a decimal MOB string without trailing zeros.
pub fn format_mob(pico: u64) -> String {
    let whole = pico / PICO_PER_MOB;
    let frac = pico % PICO_PER_MOB;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = PICO_DIGITS);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Parses a decimal MOB string into picoMOB.
pub fn parse_mob(raw: &str) -> Option<u64> {
    let (whole, frac) = match raw.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (raw, ""),
    };
    if whole.is_empty() || frac.len() > PICO_DIGITS {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: u64 = whole.parse().ok()?;
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<width$}", width = PICO_DIGITS).parse().ok()?
    };
    whole.checked_mul(PICO_PER_MOB)?.checked_add(frac)
}

fn status_details(
    status: PaymentStatus,
    failure: Option<PaymentFailure>,
    transaction: Transaction,
) -> payment_notification::TransactionDetails {
    let payment = match status {
        PaymentStatus::Failed => {
            let reason = match failure.unwrap_or(PaymentFailure::Generic) {
                PaymentFailure::Generic => failed_transaction::FailureReason::Generic,
                PaymentFailure::Network => failed_transaction::FailureReason::Network,
                PaymentFailure::InsufficientFunds => failed_transaction::FailureReason::InsufficientFunds,
            };
            transaction_details::Payment::FailedTransaction(FailedTransaction { reason: reason as i32 })
        }
        PaymentStatus::Initial | PaymentStatus::Submitted | PaymentStatus::Successful => {
            let status = match status {
                PaymentStatus::Initial => transaction::Status::Initial,
                PaymentStatus::Submitted => transaction::Status::Submitted,
                _ => transaction::Status::Successful,
            };
            transaction_details::Payment::Transaction(Transaction {
                status: status as i32,
                ..transaction
            })
        }
    };
    payment_notification::TransactionDetails { payment: Some(payment) }
}

fn identification(public_keys: &[Vec<u8>], key_images: &[Vec<u8>]) -> Option<MobileCoinTxoIdentification> {
    if public_keys.is_empty() && key_images.is_empty() {
        return None;
    }
    Some(MobileCoinTxoIdentification {
        public_key: public_keys.to_vec(),
        key_images: key_images.to_vec(),
    })
}

/// Live payment; the model must exist or the message cannot be archived.
pub fn archive_payment_notification(
    conn: &Connection,
    id: ArchiveObjectId,
    info: &PaymentNotificationInfo,
) -> ArchiveInteractionResult<proto::PaymentNotification> {
    let model = match find_payment_model(conn, &info.mc_receipt_data) {
        Ok(Some(model)) => model,
        Ok(None) => {
            return InteractionResult::fail(ArchiveFrameError::new(id, ArchiveErrorKind::MissingPaymentInformation));
        }
        Err(err) => return InteractionResult::fail(ArchiveFrameError::database(id, err)),
    };
    let transaction = Transaction {
        status: 0,
        mob_identification: identification(&model.public_keys, &model.key_images),
        timestamp: Some(model.created_at),
        block_index: model.block_index,
        block_timestamp: model.block_timestamp,
        transaction: model.transaction.clone(),
        receipt: Some(model.mc_receipt_data.clone()),
    };
    InteractionResult::Success(proto::PaymentNotification {
        amount_mob: Some(format_mob(model.amount_pico_mob)),
        fee_mob: model.fee_pico_mob.map(format_mob),
        note: info.note.clone().or(model.memo),
        transaction_details: Some(status_details(model.status, model.failure, transaction)),
    })
}

/// Payment restored from an earlier backup.
pub fn archive_archived_payment(
    conn: &Connection,
    id: ArchiveObjectId,
    message_id: i64,
) -> ArchiveInteractionResult<proto::PaymentNotification> {
    let payment = match find_archived_payment(conn, message_id) {
        Ok(Some(payment)) => payment,
        Ok(None) => {
            return InteractionResult::fail(ArchiveFrameError::new(id, ArchiveErrorKind::MissingPaymentInformation));
        }
        Err(err) => return InteractionResult::fail(ArchiveFrameError::database(id, err)),
    };
    let transaction = Transaction {
        status: 0,
        mob_identification: identification(&payment.public_keys, &payment.key_images),
        timestamp: payment.timestamp,
        block_index: payment.block_index,
        block_timestamp: payment.block_timestamp,
        transaction: payment.transaction.clone(),
        receipt: payment.receipt.clone(),
    };
    InteractionResult::Success(proto::PaymentNotification {
        amount_mob: payment.amount.clone(),
        fee_mob: payment.fee.clone(),
        note: payment.note.clone(),
        transaction_details: Some(status_details(payment.status, payment.failure, transaction)),
    })
}

/// Payment fields waiting for the inserted message, which decides direction
/// and counterparty.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPayment {
    amount: Option<String>,
    fee: Option<String>,
    note: Option<String>,
    status: PaymentStatus,
    failure: Option<PaymentFailure>,
    timestamp: Option<u64>,
    block_index: Option<u64>,
    block_timestamp: Option<u64>,
    transaction: Option<Vec<u8>>,
    receipt: Option<Vec<u8>>,
    public_keys: Vec<Vec<u8>>,
    key_images: Vec<Vec<u8>>,
}

impl PendingPayment {
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

pub fn restore_payment(
    id: RestoreObjectId,
    notification: &proto::PaymentNotification,
) -> RestoreInteractionResult<PendingPayment> {
    InteractionResult::collect(|partial| {
        let unrecognized = || Bubble::fail(RestoreFrameError::new(id, InvalidProtoData::UnrecognizedPaymentTransaction));
        let payment = notification
            .transaction_details
            .as_ref()
            .and_then(|details| details.payment.as_ref())
            .ok_or_else(unrecognized)?;
        let mut pending = PendingPayment {
            amount: notification.amount_mob.clone(),
            fee: notification.fee_mob.clone(),
            note: notification.note.clone(),
            status: PaymentStatus::Initial,
            failure: None,
            timestamp: None,
            block_index: None,
            block_timestamp: None,
            transaction: None,
            receipt: None,
            public_keys: Vec::new(),
            key_images: Vec::new(),
        };
        match payment {
            transaction_details::Payment::Transaction(tx) => {
                pending.status = match transaction::Status::try_from(tx.status).map_err(|_| unrecognized())? {
                    transaction::Status::Initial => PaymentStatus::Initial,
                    transaction::Status::Submitted => PaymentStatus::Submitted,
                    transaction::Status::Successful => PaymentStatus::Successful,
                };
                pending.timestamp = tx.timestamp;
                pending.block_index = tx.block_index;
                pending.block_timestamp = tx.block_timestamp;
                pending.transaction = tx.transaction.clone();
                pending.receipt = tx.receipt.clone();
                if let Some(ident) = &tx.mob_identification {
                    pending.public_keys = ident.public_key.clone();
                    pending.key_images = ident.key_images.clone();
                }
            }
            transaction_details::Payment::FailedTransaction(failed) => {
                pending.status = PaymentStatus::Failed;
                pending.failure = Some(
                    match failed_transaction::FailureReason::try_from(failed.reason).map_err(|_| unrecognized())? {
                        failed_transaction::FailureReason::Generic => PaymentFailure::Generic,
                        failed_transaction::FailureReason::Network => PaymentFailure::Network,
                        failed_transaction::FailureReason::InsufficientFunds => PaymentFailure::InsufficientFunds,
                    },
                );
            }
        }
        for (field, value) in [("amount", &mut pending.amount), ("fee", &mut pending.fee)] {
            if value.as_deref().is_some_and(|raw| parse_mob(raw).is_none()) {
                debug!(field, "dropping unparseable MOB value");
                *value = None;
                partial.push(RestoreFrameError::new(id, InvalidProtoData::UnrecognizedPaymentTransaction));
            }
        }
        Ok(pending)
    })
}

/// Writes the side record. Only one-to-one threads with a known account can
/// carry a payment.
pub fn restore_archived_payment(
    conn: &Connection,
    id: RestoreObjectId,
    message: &Message,
    pending: PendingPayment,
) -> RestoreInteractionResult<()> {
    let not_contact = || InteractionResult::fail(RestoreFrameError::new(id, RestoreErrorKind::PaymentThreadNotContact));
    let recipient = match get_thread(conn, message.thread_id) {
        Ok(Some(thread)) => get_recipient(conn, thread.recipient_id),
        Ok(None) => return not_contact(),
        Err(err) => return InteractionResult::fail(RestoreFrameError::insertion(id, err)),
    };
    let counterparty = match recipient {
        Ok(Some(recipient)) => match recipient.kind {
            RecipientKind::Contact { aci: Some(aci), .. } => aci,
            _ => return not_contact(),
        },
        Ok(None) => return not_contact(),
        Err(err) => return InteractionResult::fail(RestoreFrameError::insertion(id, err)),
    };
    let direction = match message.direction {
        MessageDirection::Incoming { .. } => PaymentDirection::Incoming,
        MessageDirection::Outgoing { .. } => PaymentDirection::Outgoing,
    };
    let record = ArchivedPayment {
        message_id: message.id,
        amount: pending.amount,
        fee: pending.fee,
        note: pending.note,
        direction,
        counterparty_aci: Some(counterparty),
        status: pending.status,
        failure: pending.failure,
        timestamp: pending.timestamp,
        block_index: pending.block_index,
        block_timestamp: pending.block_timestamp,
        transaction: pending.transaction,
        receipt: pending.receipt,
        public_keys: pending.public_keys,
        key_images: pending.key_images,
    };
    match insert_archived_payment(conn, &record) {
        Ok(()) => InteractionResult::Success(()),
        Err(err) => InteractionResult::fail(RestoreFrameError::insertion(id, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BackupChatId;

    #[test]
    fn mob_formatting() {
        assert_eq!(format_mob(0), "0");
        assert_eq!(format_mob(PICO_PER_MOB), "1");
        assert_eq!(format_mob(1_500_000_000_000), "1.5");
        assert_eq!(format_mob(1), "0.000000000001");
        assert_eq!(parse_mob("1.5"), Some(1_500_000_000_000));
        assert_eq!(parse_mob("0.000000000001"), Some(1));
        assert_eq!(parse_mob("12"), Some(12 * PICO_PER_MOB));
        assert_eq!(parse_mob("1.0000000000001"), None);
        assert_eq!(parse_mob("-1"), None);
        assert_eq!(parse_mob(".5"), None);
    }

    #[test]
    fn missing_details_are_unrecognized() {
        let id = RestoreObjectId::ChatItem {
            chat_id: BackupChatId(1),
            date_sent: 1,
        };
        let notification = proto::PaymentNotification {
            amount_mob: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            restore_payment(id, &notification),
            InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::UnrecognizedPaymentTransaction))
        );
    }

    #[test]
    fn failed_transaction_keeps_reason() {
        let id = RestoreObjectId::ChatItem {
            chat_id: BackupChatId(1),
            date_sent: 1,
        };
        let notification = proto::PaymentNotification {
            amount_mob: Some("2.25".to_string()),
            fee_mob: Some("lots".to_string()),
            note: Some("rent".to_string()),
            transaction_details: Some(payment_notification::TransactionDetails {
                payment: Some(transaction_details::Payment::FailedTransaction(FailedTransaction {
                    reason: failed_transaction::FailureReason::Network as i32,
                })),
            }),
        };
        let (pending, errors) = restore_payment(id, &notification).into_parts();
        let pending = pending.expect("pending");
        assert_eq!(pending.status, PaymentStatus::Failed);
        assert_eq!(pending.failure, Some(PaymentFailure::Network));
        assert_eq!(pending.amount.as_deref(), Some("2.25"));
        assert_eq!(pending.fee, None);
        assert_eq!(pending.note(), Some("rent"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn missing_payment_rows_fail_the_message() {
        use crate::db::open_in_memory;

        let store = open_in_memory().expect("store");
        let id = ArchiveObjectId::Message {
            thread_id: 1,
            message_id: 9,
            sent_at: 1,
        };
        let missing = InteractionResult::fail(ArchiveFrameError::new(id, ArchiveErrorKind::MissingPaymentInformation));
        let info = PaymentNotificationInfo {
            mc_receipt_data: vec![4, 2],
            note: None,
        };
        assert_eq!(archive_payment_notification(&store.conn, id, &info), missing);
        assert_eq!(archive_archived_payment(&store.conn, id, 9), missing);
    }
}

use rusqlite::types::{Type, Value};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    ArchivedPayment, Attachment, AttachmentRole, LinkPreview, Message, MessageDirection,
    MessageRowId, NewMessage, PaymentModel, Reaction, Recipient, RecipientKind, RecipientRowId,
    StoreStats, Thread, ThreadRowId,
};

const REACTION_BATCH_SIZE: usize = 500;

const MESSAGE_COLUMNS: &str = "id, unique_id, thread_id, direction_json, sent_at, body, body_ranges_json, \
     quote_json, link_preview_json, contact_share_json, sticker_json, gift_badge_json, payment_json, \
     is_archived_payment, was_remotely_deleted, is_view_once, expire_started_at, expires_in_ms";

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn uuid_column(row: &Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn enum_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        serde_json::from_value(serde_json::Value::String(s)).map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn required<T>(value: Option<T>, idx: usize) -> rusqlite::Result<T> {
    value.ok_or(rusqlite::Error::InvalidColumnType(idx, "NULL".to_string(), Type::Null))
}

fn to_json<T: Serialize>(value: &Option<T>) -> Result<Option<String>, CoreError> {
    Ok(value.as_ref().map(serde_json::to_string).transpose()?)
}

fn enum_to_sql<T: Serialize>(value: &T) -> Result<String, CoreError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(CoreError::InvalidArgument(format!("enum did not serialize to a string: {other}"))),
    }
}

// recipients

pub fn insert_recipient(conn: &Connection, kind: &RecipientKind) -> Result<RecipientRowId, CoreError> {
    let (aci, pni, e164, given, family) = match kind {
        RecipientKind::Contact {
            aci,
            pni,
            e164,
            profile_given_name,
            profile_family_name,
        } => (
            aci.map(|v| v.to_string()),
            pni.map(|v| v.to_string()),
            e164.clone(),
            profile_given_name.clone(),
            profile_family_name.clone(),
        ),
        _ => (None, None, None, None, None),
    };
    let (master_key, title) = match kind {
        RecipientKind::Group { master_key, title } => (Some(master_key.clone()), title.clone()),
        _ => (None, None),
    };
    let (distribution_id, distribution_name) = match kind {
        RecipientKind::DistributionList {
            distribution_id,
            name,
        } => (Some(distribution_id.to_string()), Some(name.clone())),
        _ => (None, None),
    };
    conn.execute(
        "INSERT INTO recipients (kind, aci, pni, phone_e164, profile_given_name, profile_family_name, \
                                 group_master_key, group_title, distribution_id, distribution_name) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
        params![
            kind.label(),
            aci,
            pni,
            e164,
            given,
            family,
            master_key,
            title,
            distribution_id,
            distribution_name
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn recipient_from_row(row: &Row) -> rusqlite::Result<Recipient> {
    let id: i64 = row.get(0)?;
    let kind: String = row.get(1)?;
    let kind = match kind.as_str() {
        "local_account" => RecipientKind::LocalAccount,
        "contact" => RecipientKind::Contact {
            aci: uuid_column(row, 2)?,
            pni: uuid_column(row, 3)?,
            e164: row.get(4)?,
            profile_given_name: row.get(5)?,
            profile_family_name: row.get(6)?,
        },
        "group" => RecipientKind::Group {
            master_key: row.get::<_, Option<Vec<u8>>>(7)?.unwrap_or_default(),
            title: row.get(8)?,
        },
        "distribution_list" => RecipientKind::DistributionList {
            distribution_id: required(uuid_column(row, 9)?, 9)?,
            name: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
        },
        "release_notes" => RecipientKind::ReleaseNotes,
        other => {
            return Err(rusqlite::Error::InvalidColumnType(1, other.to_string(), Type::Text));
        }
    };
    Ok(Recipient { id, kind })
}

const RECIPIENT_COLUMNS: &str = "id, kind, aci, pni, phone_e164, profile_given_name, profile_family_name, \
     group_master_key, group_title, distribution_id, distribution_name";

pub fn list_recipients(conn: &Connection) -> Result<Vec<Recipient>, CoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {RECIPIENT_COLUMNS} FROM recipients ORDER BY id ASC;"))?;
    let rows = stmt.query_map([], recipient_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_recipient(conn: &Connection, id: RecipientRowId) -> Result<Option<Recipient>, CoreError> {
    Ok(conn
        .query_row(
            &format!("SELECT {RECIPIENT_COLUMNS} FROM recipients WHERE id = ?1;"),
            params![id],
            recipient_from_row,
        )
        .optional()?)
}

/// Returns the single recipient of a singleton kind (local account, release
/// notes), if one exists.
pub fn find_singleton_recipient(conn: &Connection, kind: &RecipientKind) -> Result<Option<RecipientRowId>, CoreError> {
    Ok(conn
        .query_row(
            "SELECT id FROM recipients WHERE kind = ?1 ORDER BY id ASC LIMIT 1;",
            params![kind.label()],
            |row| row.get(0),
        )
        .optional()?)
}

pub fn find_contact_by_aci(conn: &Connection, aci: &Uuid) -> Result<Option<RecipientRowId>, CoreError> {
    Ok(conn
        .query_row(
            "SELECT id FROM recipients WHERE kind = 'contact' AND aci = ?1;",
            params![aci.to_string()],
            |row| row.get(0),
        )
        .optional()?)
}

// threads

pub fn insert_thread(conn: &Connection, thread: &Thread) -> Result<ThreadRowId, CoreError> {
    conn.execute(
        "INSERT INTO threads (recipient_id, archived, pinned_order, mute_until_ms, expiration_timer_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            thread.recipient_id,
            thread.archived,
            thread.pinned_order,
            thread.mute_until_ms.map(|v| v as i64),
            thread.expiration_timer_ms.map(|v| v as i64),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn thread_from_row(row: &Row) -> rusqlite::Result<Thread> {
    Ok(Thread {
        id: row.get(0)?,
        recipient_id: row.get(1)?,
        archived: row.get::<_, i64>(2)? != 0,
        pinned_order: row.get(3)?,
        mute_until_ms: row.get::<_, Option<i64>>(4)?.map(|v| v as u64),
        expiration_timer_ms: row.get::<_, Option<i64>>(5)?.map(|v| v as u64),
    })
}

pub fn list_threads(conn: &Connection) -> Result<Vec<Thread>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, recipient_id, archived, pinned_order, mute_until_ms, expiration_timer_ms \
         FROM threads ORDER BY id ASC;",
    )?;
    let rows = stmt.query_map([], thread_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_thread(conn: &Connection, id: ThreadRowId) -> Result<Option<Thread>, CoreError> {
    Ok(conn
        .query_row(
            "SELECT id, recipient_id, archived, pinned_order, mute_until_ms, expiration_timer_ms \
             FROM threads WHERE id = ?1;",
            params![id],
            thread_from_row,
        )
        .optional()?)
}

// messages

fn message_from_row(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        unique_id: required(uuid_column(row, 1)?, 1)?,
        thread_id: row.get(2)?,
        direction: required(json_column::<MessageDirection>(row, 3)?, 3)?,
        sent_at: row.get::<_, i64>(4)? as u64,
        body: row.get(5)?,
        body_ranges: json_column(row, 6)?.unwrap_or_default(),
        quote: json_column(row, 7)?,
        link_preview: json_column(row, 8)?,
        contact_share: json_column(row, 9)?,
        sticker: json_column(row, 10)?,
        gift_badge: json_column(row, 11)?,
        payment_notification: json_column(row, 12)?,
        is_archived_payment: row.get::<_, i64>(13)? != 0,
        was_remotely_deleted: row.get::<_, i64>(14)? != 0,
        is_view_once: row.get::<_, i64>(15)? != 0,
        expire_started_at: row.get::<_, Option<i64>>(16)?.map(|v| v as u64),
        expires_in_ms: row.get::<_, Option<i64>>(17)?.map(|v| v as u64),
    })
}

/// Inserts a message and returns it with its assigned row id.
pub fn insert_message(conn: &Connection, message: &NewMessage) -> Result<Message, CoreError> {
    let direction = message
        .direction
        .clone()
        .ok_or_else(|| CoreError::InvalidArgument("message direction missing".to_string()))?;
    let sender_id = match &direction {
        MessageDirection::Incoming { author_id, .. } => Some(*author_id),
        MessageDirection::Outgoing { .. } => None,
    };
    let unique_id = Uuid::new_v4();
    let body_ranges = if message.body_ranges.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&message.body_ranges)?)
    };
    conn.execute(
        "INSERT INTO messages (unique_id, thread_id, direction_json, is_outgoing, sender_id, sent_at, body, \
                               body_ranges_json, quote_json, contact_share_json, sticker_json, gift_badge_json, \
                               payment_json, is_archived_payment, was_remotely_deleted, is_view_once, \
                               expire_started_at, expires_in_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18);",
        params![
            unique_id.to_string(),
            message.thread_id,
            serde_json::to_string(&direction)?,
            direction.is_outgoing(),
            sender_id,
            message.sent_at as i64,
            message.body,
            body_ranges,
            to_json(&message.quote)?,
            to_json(&message.contact_share)?,
            to_json(&message.sticker)?,
            to_json(&message.gift_badge)?,
            to_json(&message.payment_notification)?,
            message.is_archived_payment,
            message.was_remotely_deleted,
            message.is_view_once,
            message.expire_started_at.map(|v| v as i64),
            message.expires_in_ms.map(|v| v as i64),
        ],
    )?;
    let id = conn.last_insert_rowid();
    Ok(Message {
        id,
        unique_id,
        thread_id: message.thread_id,
        direction,
        sent_at: message.sent_at,
        body: message.body.clone(),
        body_ranges: message.body_ranges.clone(),
        quote: message.quote.clone(),
        link_preview: None,
        contact_share: message.contact_share.clone(),
        sticker: message.sticker.clone(),
        gift_badge: message.gift_badge.clone(),
        payment_notification: message.payment_notification.clone(),
        is_archived_payment: message.is_archived_payment,
        was_remotely_deleted: message.was_remotely_deleted,
        is_view_once: message.is_view_once,
        expire_started_at: message.expire_started_at,
        expires_in_ms: message.expires_in_ms,
    })
}

pub fn get_message(conn: &Connection, id: MessageRowId) -> Result<Option<Message>, CoreError> {
    Ok(conn
        .query_row(
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1;"),
            params![id],
            message_from_row,
        )
        .optional()?)
}

/// Keyset page of a thread's messages in `(sent_at, id)` order, starting
/// after `after` when given.
pub fn list_messages_page(
    conn: &Connection,
    thread_id: ThreadRowId,
    after: Option<(u64, MessageRowId)>,
    limit: usize,
) -> Result<Vec<Message>, CoreError> {
    let (sql, params_vec): (String, Vec<Value>) = match after {
        Some((ts, id)) => (
            format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages \
                 WHERE thread_id = ?1 AND (sent_at > ?2 OR (sent_at = ?2 AND id > ?3)) \
                 ORDER BY sent_at ASC, id ASC LIMIT ?4;"
            ),
            vec![thread_id.into(), (ts as i64).into(), id.into(), (limit as i64).into()],
        ),
        None => (
            format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages \
                 WHERE thread_id = ?1 \
                 ORDER BY sent_at ASC, id ASC LIMIT ?2;"
            ),
            vec![thread_id.into(), (limit as i64).into()],
        ),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params_vec), message_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn find_messages_by_timestamp(
    conn: &Connection,
    thread_id: ThreadRowId,
    sent_at: u64,
) -> Result<Vec<Message>, CoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE thread_id = ?1 AND sent_at = ?2 ORDER BY id ASC;"
    ))?;
    let rows = stmt.query_map(params![thread_id, sent_at as i64], message_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn set_link_preview(conn: &Connection, message_id: MessageRowId, preview: &LinkPreview) -> Result<(), CoreError> {
    conn.execute(
        "UPDATE messages SET link_preview_json = ?2 WHERE id = ?1;",
        params![message_id, serde_json::to_string(preview)?],
    )?;
    Ok(())
}

// reactions

/// Inserts reactions in multi-row statements of at most 500 rows; returns the
/// sizes of the batches issued.
pub fn insert_reactions(conn: &Connection, reactions: &[Reaction]) -> Result<Vec<usize>, CoreError> {
    let mut batches = Vec::new();
    for batch in reactions.chunks(REACTION_BATCH_SIZE) {
        insert_reaction_batch(conn, batch)?;
        batches.push(batch.len());
    }
    Ok(batches)
}

fn insert_reaction_batch(conn: &Connection, batch: &[Reaction]) -> Result<(), CoreError> {
    if batch.is_empty() {
        return Ok(());
    }
    let mut sql = String::from(
        "INSERT OR REPLACE INTO reactions (message_id, reactor_id, emoji, reacted_at, sort_order) VALUES ",
    );
    let mut params_vec: Vec<Value> = Vec::with_capacity(batch.len() * 5);
    for (idx, row) in batch.iter().enumerate() {
        if idx > 0 {
            sql.push(',');
        }
        sql.push_str("(?, ?, ?, ?, ?)");
        params_vec.push(Value::from(row.message_id));
        params_vec.push(Value::from(row.author_id));
        params_vec.push(Value::from(row.emoji.clone()));
        params_vec.push(Value::from(row.sent_at as i64));
        params_vec.push(Value::from(row.sort_order as i64));
    }
    conn.execute(&sql, rusqlite::params_from_iter(params_vec))?;
    Ok(())
}

pub fn list_reactions(conn: &Connection, message_id: MessageRowId) -> Result<Vec<Reaction>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT message_id, reactor_id, emoji, reacted_at, sort_order FROM reactions \
         WHERE message_id = ?1 ORDER BY sort_order ASC, reactor_id ASC;",
    )?;
    let rows = stmt.query_map(params![message_id], |row| {
        Ok(Reaction {
            message_id: row.get(0)?,
            author_id: row.get(1)?,
            emoji: row.get(2)?,
            sent_at: row.get::<_, i64>(3)? as u64,
            sort_order: row.get::<_, i64>(4)? as u64,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

// attachments

pub fn insert_attachment(conn: &Connection, attachment: &Attachment) -> Result<(), CoreError> {
    conn.execute(
        "INSERT INTO attachments (id, message_id, role, position, mime, original_filename, caption, width, height, \
                                  size_bytes, blur_hash, plaintext_hash, encryption_key, flag, client_uuid) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
        params![
            attachment.id,
            attachment.message_id,
            attachment.role.as_str(),
            attachment.position,
            attachment.content_type,
            attachment.file_name,
            attachment.caption,
            attachment.width,
            attachment.height,
            attachment.size_bytes,
            attachment.blur_hash,
            attachment.plaintext_hash,
            attachment.encryption_key,
            enum_to_sql(&attachment.flag)?,
            attachment.client_uuid.map(|v| v.to_string()),
        ],
    )?;
    Ok(())
}

pub fn list_attachments(
    conn: &Connection,
    message_id: MessageRowId,
    role: AttachmentRole,
) -> Result<Vec<Attachment>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, message_id, role, position, mime, original_filename, caption, width, height, size_bytes, \
                blur_hash, plaintext_hash, encryption_key, flag, client_uuid \
         FROM attachments WHERE message_id = ?1 AND role = ?2 ORDER BY position ASC, id ASC;",
    )?;
    let rows = stmt.query_map(params![message_id, role.as_str()], |row| {
        Ok(Attachment {
            id: row.get(0)?,
            message_id: row.get(1)?,
            role: required(enum_column(row, 2)?, 2)?,
            position: row.get(3)?,
            content_type: row.get(4)?,
            file_name: row.get(5)?,
            caption: row.get(6)?,
            width: row.get(7)?,
            height: row.get(8)?,
            size_bytes: row.get(9)?,
            blur_hash: row.get(10)?,
            plaintext_hash: row.get(11)?,
            encryption_key: row.get(12)?,
            flag: required(enum_column(row, 13)?, 13)?,
            client_uuid: uuid_column(row, 14)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

// payments

pub fn insert_payment_model(conn: &Connection, model: &PaymentModel) -> Result<(), CoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO payment_models (mc_receipt_data, amount_pico_mob, fee_pico_mob, memo, status, failure, \
                                                created_at, block_index, block_timestamp, transaction_blob, \
                                                public_keys_json, key_images_json) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
        params![
            model.mc_receipt_data,
            model.amount_pico_mob as i64,
            model.fee_pico_mob.map(|v| v as i64),
            model.memo,
            enum_to_sql(&model.status)?,
            model.failure.as_ref().map(enum_to_sql).transpose()?,
            model.created_at as i64,
            model.block_index.map(|v| v as i64),
            model.block_timestamp.map(|v| v as i64),
            model.transaction,
            serde_json::to_string(&model.public_keys)?,
            serde_json::to_string(&model.key_images)?,
        ],
    )?;
    Ok(())
}

pub fn find_payment_model(conn: &Connection, mc_receipt_data: &[u8]) -> Result<Option<PaymentModel>, CoreError> {
    Ok(conn
        .query_row(
            "SELECT mc_receipt_data, amount_pico_mob, fee_pico_mob, memo, status, failure, created_at, block_index, \
                    block_timestamp, transaction_blob, public_keys_json, key_images_json \
             FROM payment_models WHERE mc_receipt_data = ?1;",
            params![mc_receipt_data],
            |row| {
                Ok(PaymentModel {
                    mc_receipt_data: row.get(0)?,
                    amount_pico_mob: row.get::<_, i64>(1)? as u64,
                    fee_pico_mob: row.get::<_, Option<i64>>(2)?.map(|v| v as u64),
                    memo: row.get(3)?,
                    status: required(enum_column(row, 4)?, 4)?,
                    failure: enum_column(row, 5)?,
                    created_at: row.get::<_, i64>(6)? as u64,
                    block_index: row.get::<_, Option<i64>>(7)?.map(|v| v as u64),
                    block_timestamp: row.get::<_, Option<i64>>(8)?.map(|v| v as u64),
                    transaction: row.get(9)?,
                    public_keys: json_column(row, 10)?.unwrap_or_default(),
                    key_images: json_column(row, 11)?.unwrap_or_default(),
                })
            },
        )
        .optional()?)
}

pub fn insert_archived_payment(conn: &Connection, payment: &ArchivedPayment) -> Result<(), CoreError> {
    conn.execute(
        "INSERT INTO archived_payments (message_id, amount, fee, note, direction, counterparty_aci, status, failure, \
                                        timestamp, block_index, block_timestamp, transaction_blob, receipt, \
                                        public_keys_json, key_images_json) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
        params![
            payment.message_id,
            payment.amount,
            payment.fee,
            payment.note,
            enum_to_sql(&payment.direction)?,
            payment.counterparty_aci.map(|v| v.to_string()),
            enum_to_sql(&payment.status)?,
            payment.failure.as_ref().map(enum_to_sql).transpose()?,
            payment.timestamp.map(|v| v as i64),
            payment.block_index.map(|v| v as i64),
            payment.block_timestamp.map(|v| v as i64),
            payment.transaction,
            payment.receipt,
            serde_json::to_string(&payment.public_keys)?,
            serde_json::to_string(&payment.key_images)?,
        ],
    )?;
    Ok(())
}

pub fn find_archived_payment(conn: &Connection, message_id: MessageRowId) -> Result<Option<ArchivedPayment>, CoreError> {
    Ok(conn
        .query_row(
            "SELECT message_id, amount, fee, note, direction, counterparty_aci, status, failure, timestamp, \
                    block_index, block_timestamp, transaction_blob, receipt, public_keys_json, key_images_json \
             FROM archived_payments WHERE message_id = ?1;",
            params![message_id],
            |row| {
                Ok(ArchivedPayment {
                    message_id: row.get(0)?,
                    amount: row.get(1)?,
                    fee: row.get(2)?,
                    note: row.get(3)?,
                    direction: required(enum_column(row, 4)?, 4)?,
                    counterparty_aci: uuid_column(row, 5)?,
                    status: required(enum_column(row, 6)?, 6)?,
                    failure: enum_column(row, 7)?,
                    timestamp: row.get::<_, Option<i64>>(8)?.map(|v| v as u64),
                    block_index: row.get::<_, Option<i64>>(9)?.map(|v| v as u64),
                    block_timestamp: row.get::<_, Option<i64>>(10)?.map(|v| v as u64),
                    transaction: row.get(11)?,
                    receipt: row.get(12)?,
                    public_keys: json_column(row, 13)?.unwrap_or_default(),
                    key_images: json_column(row, 14)?.unwrap_or_default(),
                })
            },
        )
        .optional()?)
}

pub fn store_stats(conn: &Connection) -> Result<StoreStats, CoreError> {
    let count = |table: &str| -> Result<i64, CoreError> {
        Ok(conn.query_row(&format!("SELECT COUNT(1) FROM {table};"), [], |row| row.get(0))?)
    };
    Ok(StoreStats {
        recipients: count("recipients")?,
        threads: count("threads")?,
        messages: count("messages")?,
        reactions: count("reactions")?,
        attachments: count("attachments")?,
        archived_payments: count("archived_payments")?,
    })
}

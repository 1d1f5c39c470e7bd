//! Export pass and the shared pass configuration and report.

use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use crate::context::{ChatContext, RecipientContext};
use crate::crypto::{BackupKey, MacWriter};
use crate::db::MessageStore;
use crate::error::CoreError;
use crate::frame::FrameWriter;
use crate::interaction::{ArchiveErrorKind, ArchiveFrameError, InteractionResult, ReportedError, RestoreFrameError};
use crate::models::RecipientKind;
use crate::proto::{self, frame};
use crate::query::{find_singleton_recipient, list_messages_page, list_recipients, list_threads};

pub mod attachments;
pub mod chat_items;
pub mod contact_share;
pub mod contents;
pub mod gift_badge;
pub mod payments;
pub mod quote;
pub mod reactions;
pub mod recipients;
pub mod sticker;
pub mod text;

/// Version written to `BackupInfo`.
pub const BACKUP_VERSION: u64 = 1;

/// Messages read from storage per page during export.
pub const EXPORT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupOptions {
    /// Overrides the `BackupInfo` anchor time; defaults to now.
    pub backup_time_ms: Option<u64>,
    /// Hex-encoded 32-byte key for the file MAC. Falls back to
    /// `MB_BACKUP_KEY_HEX`.
    pub backup_key: Option<String>,
    /// Where pass reports are appended, if anywhere.
    pub diagnostics_dir: Option<PathBuf>,
}

impl BackupOptions {
    pub fn resolve_key(&self) -> Result<Option<BackupKey>, CoreError> {
        match self.backup_key.as_deref() {
            Some(raw) => BackupKey::from_hex(raw).map(Some),
            None => BackupKey::from_env(),
        }
    }
}

/// What a pass did. Entity errors never stop a pass; they are collected here.
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport<E> {
    pub backup_time_ms: u64,
    /// Frames written on export, read on import; the header is not counted.
    pub frames: u64,
    #[serde(skip)]
    pub errors: Vec<E>,
    /// Entities skipped as not yet implemented.
    pub skipped: u64,
    /// Chat items not restored because they had already expired.
    pub expired: u64,
}

pub type ExportReport = BackupReport<ArchiveFrameError>;
pub type ImportReport = BackupReport<RestoreFrameError>;

impl<E> BackupReport<E> {
    pub fn new(backup_time_ms: u64) -> Self {
        Self {
            backup_time_ms,
            frames: 0,
            errors: Vec::new(),
            skipped: 0,
            expired: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<E: ReportedError + fmt::Debug> BackupReport<E> {
    /// Folds one entity's result into the report and hands back the value to
    /// persist or emit, if there is one.
    pub fn record<T>(&mut self, kind: &'static str, result: InteractionResult<T, E>) -> Option<T> {
        match result {
            InteractionResult::Success(value) => Some(value),
            InteractionResult::PartialFailure(value, errors) => {
                for err in &errors {
                    warn!(kind, error = %err, "entity partially failed");
                }
                self.errors.extend(errors);
                Some(value)
            }
            InteractionResult::MessageFailure(errors) => {
                for err in &errors {
                    if err.is_developer_error() {
                        error!(kind, error = %err, "developer error");
                    } else {
                        warn!(kind, error = %err, "entity failed");
                    }
                }
                self.errors.extend(errors);
                None
            }
            InteractionResult::NotYetImplemented => {
                self.skipped += 1;
                None
            }
        }
    }
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Writes the whole store as a frame stream into `sink`, inside one read
/// transaction. The report is appended to `options.diagnostics_dir` when one
/// is set.
pub fn export_backup<W: Write>(
    store: &mut MessageStore,
    sink: W,
    options: &BackupOptions,
) -> Result<ExportReport, CoreError> {
    let backup_time_ms = options.backup_time_ms.unwrap_or_else(now_ms);
    info!(backup_time_ms, "export started");
    let report = store.read(|tx| {
        let mut writer = FrameWriter::new(sink);
        let report = export_frames(tx, &mut writer, backup_time_ms)?;
        writer.flush()?;
        Ok::<_, CoreError>(report)
    })?;
    info!(
        frames = report.frames,
        errors = report.errors.len(),
        skipped = report.skipped,
        "export finished"
    );
    if let Some(dir) = &options.diagnostics_dir {
        if let Err(err) = crate::diagnostics::log_report(dir, "export", &report) {
            warn!(error = %err, "failed to write export diagnostics");
        }
    }
    Ok(report)
}

fn export_frames<W: Write>(
    conn: &Connection,
    writer: &mut FrameWriter<W>,
    backup_time_ms: u64,
) -> Result<ExportReport, CoreError> {
    let mut report = ExportReport::new(backup_time_ms);
    writer.write_header(&proto::BackupInfo {
        version: BACKUP_VERSION,
        backup_time_ms,
    })?;

    let mut recipient_ctx = RecipientContext::new();
    let stored_recipients = list_recipients(conn)?;
    for recipient in &stored_recipients {
        let result = recipients::archive_recipient(recipient, &mut recipient_ctx);
        if let Some(frame) = report.record("recipient", result) {
            writer.write_frame(&proto::Frame {
                item: Some(frame::Item::Recipient(frame)),
            })?;
        }
    }

    let mut chat_ctx = ChatContext::new();
    let threads = list_threads(conn)?;
    for thread in &threads {
        let kind = stored_recipients
            .iter()
            .find(|r| r.id == thread.recipient_id)
            .map(|r| &r.kind);
        let result = recipients::archive_chat(thread, kind, &recipient_ctx, &mut chat_ctx);
        if let Some(chat) = report.record("chat", result) {
            writer.write_frame(&proto::Frame {
                item: Some(frame::Item::Chat(chat)),
            })?;
        }
    }

    let self_id = find_singleton_recipient(conn, &RecipientKind::LocalAccount)?
        .and_then(|row| recipient_ctx.backup_id(row));
    for thread in &threads {
        let chat_id = chat_ctx.backup_id(thread.id);
        let mut cursor = None;
        loop {
            let page = list_messages_page(conn, thread.id, cursor, EXPORT_BATCH_SIZE)?;
            for message in &page {
                let result = match chat_id {
                    Some(chat_id) => chat_items::archive_chat_item(conn, message, chat_id, self_id, &recipient_ctx),
                    None => InteractionResult::fail(ArchiveFrameError::new(
                        contents::archive_object_id(message),
                        ArchiveErrorKind::ReferencedThreadIdMissing(thread.id),
                    )),
                };
                if let Some(item) = report.record("chat_item", result) {
                    writer.write_frame(&proto::Frame {
                        item: Some(frame::Item::ChatItem(item)),
                    })?;
                }
            }
            match page.last() {
                Some(last) if page.len() == EXPORT_BATCH_SIZE => cursor = Some((last.sent_at, last.id)),
                _ => break,
            }
        }
    }

    report.frames = writer.frames_written();
    Ok(report)
}

/// Exports into `path` through a temporary file in the same directory, so
/// the destination only ever holds a complete backup. With a backup key the
/// file ends in a MAC trailer.
pub fn export_backup_to_file(
    store: &mut MessageStore,
    path: &Path,
    options: &BackupOptions,
) -> Result<ExportReport, CoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let key = options.resolve_key()?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    let report = {
        let file = BufWriter::new(tmp.as_file_mut());
        match &key {
            Some(key) => {
                let mut mac_writer = MacWriter::new(key, file)?;
                let report = export_backup(store, &mut mac_writer, options)?;
                let mut file = mac_writer.finish()?;
                file.flush()?;
                report
            }
            None => {
                let mut file = file;
                let report = export_backup(store, &mut file, options)?;
                file.flush()?;
                report
            }
        }
    };
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| CoreError::Io(err.error))?;
    Ok(report)
}

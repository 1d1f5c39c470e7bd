//! Import pass: frame stream back into the host store.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::archiver::chat_items::{restore_chat_item, ChatItemOutcome};
use crate::archiver::recipients::{restore_chat, restore_recipient};
use crate::archiver::{BackupOptions, ImportReport};
use crate::context::{ChatContext, RecipientContext};
use crate::crypto::{verify_file_mac_stream, MAC_LEN};
use crate::db::MessageStore;
use crate::error::{CoreError, StreamError};
use crate::frame::{frame_kind, FrameReader};
use crate::proto::frame;

/// Frames between progress callbacks.
const PROGRESS_EVERY: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub source_path: PathBuf,
    pub source_filename: String,
    pub source_hash: String,
    pub size_bytes: u64,
}

pub fn plan_import(source_path: &Path) -> Result<ImportPlan, CoreError> {
    plan_import_with_progress(source_path, |_| {})
}

pub fn plan_import_with_progress<F>(source_path: &Path, progress: F) -> Result<ImportPlan, CoreError>
where
    F: Fn(&str),
{
    if !source_path.exists() {
        return Err(StreamError::FileNotFound(source_path.display().to_string()).into());
    }
    let metadata =
        fs::metadata(source_path).map_err(|e| StreamError::UnableToOpenFileStream(e.to_string()))?;
    if !metadata.is_file() {
        return Err(StreamError::UnableToOpenFileStream(format!("{} is not a file", source_path.display())).into());
    }
    progress("Preparing import...");
    let source_hash = hash_file_sha256_with_progress(source_path, metadata.len(), &progress)?;
    let source_filename = source_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("backup.bin")
        .to_string();
    Ok(ImportPlan {
        source_path: source_path.to_path_buf(),
        source_filename,
        source_hash,
        size_bytes: metadata.len(),
    })
}

fn open_source(path: &Path) -> Result<File, CoreError> {
    File::open(path).map_err(|e| StreamError::UnableToOpenFileStream(e.to_string()).into())
}

fn hash_file_sha256_with_progress<F>(path: &Path, len: u64, progress: F) -> Result<String, CoreError>
where
    F: Fn(&str),
{
    let mut file = open_source(path)?;
    let total = len.max(1);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    let mut processed: u64 = 0;
    let mut last_percent: u64 = 0;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        processed = processed.saturating_add(n as u64);
        let percent = (processed * 100) / total;
        if percent > last_percent {
            last_percent = percent;
            if percent <= 100 {
                progress(&format!("Preparing import... {}%", percent));
            }
        }
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Restores every frame of `source` inside one write transaction. Entity
/// errors land in the report; stream errors roll everything back. The report
/// is appended to `options.diagnostics_dir` when one is set.
pub fn import_backup<R: Read>(
    store: &mut MessageStore,
    source: R,
    options: &BackupOptions,
) -> Result<ImportReport, CoreError> {
    import_backup_with_progress(store, source, options, |_| {})
}

pub fn import_backup_with_progress<R, F>(
    store: &mut MessageStore,
    source: R,
    options: &BackupOptions,
    progress: F,
) -> Result<ImportReport, CoreError>
where
    R: Read,
    F: Fn(&str),
{
    let mut reader = FrameReader::new(source);
    let header = reader.read_header()?;
    info!(version = header.version, backup_time_ms = header.backup_time_ms, "import started");
    let report = store.write(|tx| import_frames(tx, &mut reader, header.backup_time_ms, &progress))?;
    info!(
        frames = report.frames,
        errors = report.errors.len(),
        skipped = report.skipped,
        expired = report.expired,
        "import finished"
    );
    if let Some(dir) = &options.diagnostics_dir {
        if let Err(err) = crate::diagnostics::log_report(dir, "import", &report) {
            warn!(error = %err, "failed to write import diagnostics");
        }
    }
    Ok(report)
}

fn import_frames<R, F>(
    conn: &Connection,
    reader: &mut FrameReader<R>,
    backup_time_ms: u64,
    progress: &F,
) -> Result<ImportReport, CoreError>
where
    R: Read,
    F: Fn(&str),
{
    let mut report = ImportReport::new(backup_time_ms);
    let mut recipients = RecipientContext::new();
    let mut chats = ChatContext::new();
    while let Some(frame) = reader.next_frame()? {
        report.frames += 1;
        debug!(kind = frame_kind(&frame), "frame read");
        match frame.item {
            Some(frame::Item::Recipient(recipient)) => {
                report.record("recipient", restore_recipient(conn, &recipient, &mut recipients));
            }
            Some(frame::Item::Chat(chat)) => {
                report.record("chat", restore_chat(conn, &chat, &recipients, &mut chats));
            }
            Some(frame::Item::ChatItem(item)) => {
                let result = restore_chat_item(conn, &item, &recipients, &chats, backup_time_ms);
                if let Some(ChatItemOutcome::Expired) = report.record("chat_item", result) {
                    report.expired += 1;
                }
            }
            // written by a newer version
            None => report.skipped += 1,
        }
        if report.frames % PROGRESS_EVERY == 0 {
            progress(&format!("Restored {} frames", report.frames));
        }
    }
    Ok(report)
}

pub fn import_backup_file(
    store: &mut MessageStore,
    path: &Path,
    options: &BackupOptions,
) -> Result<ImportReport, CoreError> {
    import_backup_file_with_progress(store, path, options, |_| {})
}

/// Imports a backup file, first checking its MAC trailer when a backup key
/// is configured.
pub fn import_backup_file_with_progress<F>(
    store: &mut MessageStore,
    path: &Path,
    options: &BackupOptions,
    progress: F,
) -> Result<ImportReport, CoreError>
where
    F: Fn(&str),
{
    let plan = plan_import_with_progress(path, &progress)?;
    info!(source = %plan.source_filename, hash = %plan.source_hash, "import planned");
    let key = options.resolve_key()?;
    let report = match key {
        Some(key) => {
            progress("Verifying backup...");
            let file = BufReader::new(open_source(&plan.source_path)?);
            if !verify_file_mac_stream(&key, file, plan.size_bytes)? {
                return Err(StreamError::HmacValidationFailedOnEncryptedFile.into());
            }
            let frames_len = plan.size_bytes - MAC_LEN as u64;
            let file = BufReader::new(open_source(&plan.source_path)?).take(frames_len);
            import_backup_with_progress(store, file, options, &progress)?
        }
        None => {
            let file = BufReader::new(open_source(&plan.source_path)?);
            import_backup_with_progress(store, file, options, &progress)?
        }
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn plan_reports_missing_file() {
        let dir = tempdir().expect("temp");
        let err = plan_import(&dir.path().join("nope.bin")).expect_err("missing");
        assert!(matches!(err, CoreError::Stream(StreamError::FileNotFound(_))));
    }

    #[test]
    fn plan_rejects_directories() {
        let dir = tempdir().expect("temp");
        let err = plan_import(dir.path()).expect_err("directory");
        assert!(matches!(err, CoreError::Stream(StreamError::UnableToOpenFileStream(_))));
    }

    #[test]
    fn plan_hashes_source() {
        let dir = tempdir().expect("temp");
        let path = dir.path().join("backup.bin");
        fs::write(&path, b"abc").expect("write");
        let plan = plan_import(&path).expect("plan");
        assert_eq!(
            plan.source_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(plan.size_bytes, 3);
        assert_eq!(plan.source_filename, "backup.bin");
    }
}

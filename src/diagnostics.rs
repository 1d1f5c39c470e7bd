use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::archiver::BackupReport;

const MAX_LOG_BYTES: u64 = 1_500_000;
/// Per-pass cap on error lines; the summary still carries the full count.
const MAX_REPORTED_ERRORS: usize = 200;

#[derive(Debug, Serialize)]
pub struct LogEvent {
    pub ts: String,
    pub kind: String,
    pub message: String,
}

fn sanitize(input: &str) -> String {
    let mut out = input.to_string();
    for prefix in ["/home/", "/Users/", "/var/", "/private/", "C:\\", "D:\\"] {
        if let Some(idx) = out.find(prefix) {
            out.replace_range(idx.., "[redacted]");
            break;
        }
    }
    // phone numbers and key material
    out.split_whitespace()
        .map(|token| {
            let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
            if digits >= 10 {
                "[redacted]".to_string()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn log_event(log_dir: &Path, kind: &str, message: &str) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join("diagnostics.log");
    trim_log(&path)?;
    let event = LogEvent {
        ts: Utc::now().to_rfc3339(),
        kind: kind.to_string(),
        message: sanitize(message),
    };
    let line = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Appends a pass summary and its first errors to the diagnostics log.
pub fn log_report<E: Display>(log_dir: &Path, pass: &str, report: &BackupReport<E>) -> io::Result<()> {
    let message = format!(
        "frames={} errors={} skipped={} expired={}",
        report.frames,
        report.errors.len(),
        report.skipped,
        report.expired
    );
    log_event(log_dir, &format!("{pass}_summary"), &message)?;
    let kind = format!("{pass}_error");
    for err in report.errors.iter().take(MAX_REPORTED_ERRORS) {
        log_event(log_dir, &kind, &err.to_string())?;
    }
    if report.errors.len() > MAX_REPORTED_ERRORS {
        log_event(
            log_dir,
            &kind,
            &format!("{} more errors not logged", report.errors.len() - MAX_REPORTED_ERRORS),
        )?;
    }
    Ok(())
}

fn trim_log(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let meta = fs::metadata(path)?;
    if meta.len() <= MAX_LOG_BYTES {
        return Ok(());
    }
    let data = fs::read(path)?;
    let keep_from = data.len().saturating_sub((MAX_LOG_BYTES / 2) as usize);
    fs::write(path, &data[keep_from..])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_redacts_paths_and_phone_numbers() {
        let cleaned = sanitize("contact +15551234567 failed");
        assert_eq!(cleaned, "contact [redacted] failed");
        let cleaned = sanitize("cannot open /home/alex/backup.bin");
        assert!(!cleaned.contains("alex"));
    }

    #[test]
    fn report_lines_are_capped() {
        let dir = tempdir().expect("temp");
        let mut report: BackupReport<String> = BackupReport::new(1_700_000_000_000);
        report.frames = 12;
        report.errors = (0..MAX_REPORTED_ERRORS + 5).map(|i| format!("entity {i} failed")).collect();
        log_report(dir.path(), "import", &report).expect("log");

        let log = fs::read_to_string(dir.path().join("diagnostics.log")).expect("read");
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 1 + MAX_REPORTED_ERRORS + 1);
        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(first["kind"], "import_summary");
        assert!(first["message"].as_str().expect("message").contains("frames=12 errors=205"));
        assert!(lines[lines.len() - 1].contains("5 more errors"));
    }
}

use std::fs;

use message_backup_core::canonical::canonical_string;
use message_backup_core::models::{AttachmentRole, GiftBadgeState, QuoteBodySource};
use message_backup_core::query::{list_attachments, list_messages_page, list_reactions, list_threads, store_stats};
use message_backup_core::seed::{seed_backup_fixture, SEED_BASE_TS, SEED_RICH_BODY};
use message_backup_core::{
    export_backup, export_backup_to_file, import_backup, import_backup_file, open_in_memory, open_store,
    BackupOptions, CoreError, MessageStore, StreamError,
};
use tempfile::tempdir;

fn options() -> BackupOptions {
    BackupOptions {
        backup_time_ms: Some(SEED_BASE_TS + 3_600_000),
        ..Default::default()
    }
}

fn seeded() -> MessageStore {
    let mut store = open_in_memory().expect("store");
    store.write(|tx| seed_backup_fixture(tx)).expect("seed");
    store
}

fn export_bytes(store: &mut MessageStore) -> Vec<u8> {
    let mut out = Vec::new();
    let report = export_backup(store, &mut out, &options()).expect("export");
    assert!(report.is_clean(), "export errors: {:?}", report.errors);
    out
}

#[test]
fn export_import_export_is_stable() {
    let mut source = seeded();
    let first = export_bytes(&mut source);

    let mut restored = open_in_memory().expect("store");
    let report = import_backup(&mut restored, first.as_slice(), &BackupOptions::default()).expect("import");
    assert!(report.is_clean(), "import errors: {:?}", report.errors);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.expired, 0);
    assert_eq!(report.backup_time_ms, SEED_BASE_TS + 3_600_000);

    let second = export_bytes(&mut restored);
    assert_eq!(
        canonical_string(&first).expect("first"),
        canonical_string(&second).expect("second")
    );
}

#[test]
fn export_skips_view_once_and_counts_frames() {
    let mut store = open_in_memory().expect("store");
    let summary = store.write(|tx| seed_backup_fixture(tx)).expect("seed");
    let mut out = Vec::new();
    let report = export_backup(&mut store, &mut out, &options()).expect("export");
    assert_eq!(report.skipped, summary.unsupported as u64);
    let expected = summary.recipients + summary.threads + summary.messages - summary.unsupported;
    assert_eq!(report.frames, expected as u64);
}

#[test]
fn restored_store_keeps_downstream_objects() {
    let mut source = seeded();
    let bytes = export_bytes(&mut source);
    let mut restored = open_in_memory().expect("store");
    import_backup(&mut restored, bytes.as_slice(), &BackupOptions::default()).expect("import");

    let stats = store_stats(&restored.conn).expect("stats");
    assert_eq!(stats.reactions, 2);
    assert_eq!(stats.archived_payments, 2);

    let threads = list_threads(&restored.conn).expect("threads");
    let direct = threads.iter().find(|t| t.pinned_order == Some(1)).expect("direct thread");
    let messages = list_messages_page(&restored.conn, direct.id, None, 100).expect("messages");
    let rich = messages
        .iter()
        .find(|m| m.body.as_deref() == Some(SEED_RICH_BODY))
        .expect("rich message");
    let quote = rich.quote.as_ref().expect("quote");
    assert_eq!(quote.body_source, QuoteBodySource::Local);
    assert_eq!(quote.body.as_deref(), Some("Lunch tomorrow?"));
    assert_eq!(rich.link_preview.as_ref().map(|p| p.url.as_str()), Some("https://example.org/post"));
    assert_eq!(list_reactions(&restored.conn, rich.id).expect("reactions").len(), 2);
    for role in [
        AttachmentRole::Body,
        AttachmentRole::QuoteThumbnail,
        AttachmentRole::LinkPreview,
        AttachmentRole::OversizeText,
    ] {
        assert_eq!(list_attachments(&restored.conn, rich.id, role).expect("attachments").len(), 1);
    }

    // a failed badge comes back as pending without a credential
    let badges: Vec<_> = messages.iter().filter_map(|m| m.gift_badge.as_ref()).collect();
    assert_eq!(badges.len(), 2);
    assert!(badges
        .iter()
        .any(|b| b.state == GiftBadgeState::Pending && b.redemption_credential.is_none()));
    assert!(badges.iter().any(|b| b.state == GiftBadgeState::Opened));
}

#[test]
fn file_round_trip_with_mac() {
    let dir = tempdir().expect("temp");
    let path = dir.path().join("out").join("backup.bin");
    let options = BackupOptions {
        backup_key: Some("5a".repeat(32)),
        diagnostics_dir: Some(dir.path().join("logs")),
        ..options()
    };
    let mut source = seeded();
    let exported = export_backup_to_file(&mut source, &path, &options).expect("export");
    assert!(path.exists());

    let mut restored = open_store(dir.path().join("restored.sqlite")).expect("store");
    let imported = import_backup_file(&mut restored, &path, &options).expect("import");
    assert_eq!(imported.frames, exported.frames);
    assert!(imported.is_clean());

    let log = fs::read_to_string(dir.path().join("logs").join("diagnostics.log")).expect("log");
    assert!(log.contains("export_summary"));
    assert!(log.contains("import_summary"));
}

#[test]
fn tampered_file_fails_mac_check() {
    let dir = tempdir().expect("temp");
    let path = dir.path().join("backup.bin");
    let options = BackupOptions {
        backup_key: Some("5a".repeat(32)),
        ..options()
    };
    let mut source = seeded();
    export_backup_to_file(&mut source, &path, &options).expect("export");
    let mut bytes = fs::read(&path).expect("read");
    bytes[4] ^= 0x01;
    fs::write(&path, &bytes).expect("write");

    let mut restored = open_in_memory().expect("store");
    let err = import_backup_file(&mut restored, &path, &options).expect_err("tampered");
    assert!(matches!(err, CoreError::Stream(StreamError::HmacValidationFailedOnEncryptedFile)));
    assert_eq!(store_stats(&restored.conn).expect("stats").messages, 0);

    let wrong_key = BackupOptions {
        backup_key: Some("6b".repeat(32)),
        ..options
    };
    bytes[4] ^= 0x01;
    fs::write(&path, &bytes).expect("restore bytes");
    let err = import_backup_file(&mut restored, &path, &wrong_key).expect_err("wrong key");
    assert!(matches!(err, CoreError::Stream(StreamError::HmacValidationFailedOnEncryptedFile)));
}

#[test]
fn missing_file_is_reported() {
    let dir = tempdir().expect("temp");
    let mut store = open_in_memory().expect("store");
    let err = import_backup_file(&mut store, &dir.path().join("absent.bin"), &BackupOptions::default())
        .expect_err("missing");
    assert!(matches!(err, CoreError::Stream(StreamError::FileNotFound(_))));
}

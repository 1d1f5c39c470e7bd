use message_backup_core::archiver::EXPORT_BATCH_SIZE;
use message_backup_core::frame::{frame_kind, FrameReader, FrameWriter};
use message_backup_core::models::{MessageDirection, NewMessage, Reaction, RecipientKind, Thread};
use message_backup_core::proto::{self, frame};
use message_backup_core::query::{insert_message, insert_reactions, insert_recipient, insert_thread, store_stats};
use message_backup_core::seed::seed_backup_fixture;
use message_backup_core::{export_backup, import_backup, open_in_memory, BackupOptions, CoreError, StreamError};
use uuid::Uuid;

fn header() -> Vec<u8> {
    let mut writer = FrameWriter::new(Vec::new());
    writer
        .write_header(&proto::BackupInfo {
            version: 1,
            backup_time_ms: 1,
        })
        .expect("header");
    writer.into_inner()
}

fn import_err(bytes: &[u8]) -> CoreError {
    let mut store = open_in_memory().expect("store");
    import_backup(&mut store, bytes, &BackupOptions::default()).expect_err("stream error")
}

#[test]
fn stream_errors_are_distinguished() {
    assert!(matches!(import_err(&[]), CoreError::Stream(StreamError::MissingBackupInfo)));
    assert!(matches!(
        import_err(&[0xff; 11]),
        CoreError::Stream(StreamError::InvalidByteLengthDelimiter(_))
    ));

    let mut truncated = header();
    truncated.extend([0x05, 0x0a, 0x00]);
    assert!(matches!(
        import_err(&truncated),
        CoreError::Stream(StreamError::InvalidByteLengthDelimiter(_))
    ));

    let mut garbage = header();
    garbage.extend([0x03, 0xff, 0xff, 0xff]);
    assert!(matches!(
        import_err(&garbage),
        CoreError::Stream(StreamError::ProtoDeserializationError(_))
    ));
}

#[test]
fn stream_error_rolls_back_the_pass() {
    let mut writer = FrameWriter::new(Vec::new());
    writer
        .write_header(&proto::BackupInfo {
            version: 1,
            backup_time_ms: 1,
        })
        .expect("header");
    writer
        .write_frame(&proto::Frame {
            item: Some(frame::Item::Recipient(proto::Recipient {
                id: 1,
                destination: Some(proto::recipient::Destination::Self_(proto::SelfRecipient {})),
            })),
        })
        .expect("frame");
    let mut bytes = writer.into_inner();
    bytes.extend([0x03, 0xff, 0xff, 0xff]);

    let mut store = open_in_memory().expect("store");
    assert!(import_backup(&mut store, bytes.as_slice(), &BackupOptions::default()).is_err());
    assert_eq!(store_stats(&store.conn).expect("stats").recipients, 0);
}

#[test]
fn writer_refuses_to_go_backwards() {
    let mut writer = FrameWriter::new(Vec::new());
    let chat = proto::Frame {
        item: Some(frame::Item::Chat(proto::Chat::default())),
    };
    assert!(matches!(
        writer.write_frame(&chat),
        Err(CoreError::Stream(StreamError::MissingBackupInfo))
    ));
    writer
        .write_header(&proto::BackupInfo {
            version: 1,
            backup_time_ms: 1,
        })
        .expect("header");
    writer
        .write_frame(&proto::Frame {
            item: Some(frame::Item::ChatItem(proto::ChatItem::default())),
        })
        .expect("item");
    assert!(matches!(
        writer.write_frame(&chat),
        Err(CoreError::Stream(StreamError::FrameOutOfOrder {
            current: "chat_item",
            found: "chat"
        }))
    ));
}

#[test]
fn export_writes_sections_in_order() {
    let mut store = open_in_memory().expect("store");
    store.write(|tx| seed_backup_fixture(tx)).expect("seed");
    let mut out = Vec::new();
    export_backup(&mut store, &mut out, &BackupOptions::default()).expect("export");

    let mut reader = FrameReader::new(out.as_slice());
    assert_eq!(reader.read_header().expect("header").version, 1);
    let rank = |kind: &str| match kind {
        "recipient" => 0,
        "chat" => 1,
        "chat_item" => 2,
        other => panic!("unexpected frame {other}"),
    };
    let mut ranks = Vec::new();
    while let Some(frame) = reader.next_frame().expect("frame") {
        ranks.push(rank(frame_kind(&frame)));
    }
    assert!(!ranks.is_empty());
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
}

fn direct_store() -> (message_backup_core::MessageStore, i64, i64) {
    let store = open_in_memory().expect("store");
    insert_recipient(&store.conn, &RecipientKind::LocalAccount).expect("self");
    let contact = insert_recipient(
        &store.conn,
        &RecipientKind::Contact {
            aci: Some(Uuid::new_v4()),
            pni: None,
            e164: None,
            profile_given_name: Some("Dana".to_string()),
            profile_family_name: None,
        },
    )
    .expect("contact");
    let thread = insert_thread(
        &store.conn,
        &Thread {
            id: 0,
            recipient_id: contact,
            archived: false,
            pinned_order: None,
            mute_until_ms: None,
            expiration_timer_ms: None,
        },
    )
    .expect("thread");
    (store, contact, thread)
}

fn incoming_text(thread_id: i64, author_id: i64, sent_at: u64) -> NewMessage {
    NewMessage {
        thread_id,
        direction: Some(MessageDirection::Incoming {
            author_id,
            received_at: sent_at,
            server_sent_at: None,
            read: false,
            sealed_sender: false,
        }),
        sent_at,
        body: Some(format!("message {sent_at}")),
        ..Default::default()
    }
}

#[test]
fn reactions_are_inserted_in_batches() {
    let (store, contact, thread) = direct_store();
    let message = insert_message(&store.conn, &incoming_text(thread, contact, 1)).expect("message");
    let reactions: Vec<Reaction> = (0..1_501u64)
        .map(|i| Reaction {
            message_id: message.id,
            author_id: contact + 1 + i as i64,
            emoji: "👍".to_string(),
            sent_at: i,
            sort_order: i,
        })
        .collect();
    let batches = insert_reactions(&store.conn, &reactions).expect("reactions");
    assert_eq!(batches, vec![500, 500, 500, 1]);
    assert_eq!(store_stats(&store.conn).expect("stats").reactions, 1_501);
}

#[test]
fn export_pages_through_every_message() {
    let (mut store, contact, thread) = direct_store();
    let count = EXPORT_BATCH_SIZE * 3 + 1;
    for i in 0..count as u64 {
        // shared timestamps across a page boundary
        insert_message(&store.conn, &incoming_text(thread, contact, 1_000 + i / 2)).expect("message");
    }
    let mut out = Vec::new();
    let report = export_backup(&mut store, &mut out, &BackupOptions::default()).expect("export");
    assert!(report.is_clean());
    assert_eq!(report.frames, (2 + 1 + count) as u64);

    let mut reader = FrameReader::new(out.as_slice());
    reader.read_header().expect("header");
    let mut sent = Vec::new();
    while let Some(frame) = reader.next_frame().expect("frame") {
        if let Some(frame::Item::ChatItem(item)) = frame.item {
            sent.push(item.date_sent);
        }
    }
    assert_eq!(sent.len(), count);
    assert!(sent.windows(2).all(|w| w[0] <= w[1]));
}

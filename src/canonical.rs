//! Canonical text form of a frame stream, for comparing two backups of the
//! same data.

use crate::error::CoreError;
use crate::frame::FrameReader;
use crate::proto::frame;

/// Renders every frame of `bytes` as one line. The header's
/// `backup_time_ms` is left out and chat items are ordered by chat and send
/// time, so two exports of equal stores compare equal.
pub fn canonical_string(bytes: &[u8]) -> Result<String, CoreError> {
    let mut reader = FrameReader::new(bytes);
    let header = reader.read_header()?;
    let mut recipients = Vec::new();
    let mut chats = Vec::new();
    let mut items = Vec::new();
    let mut unknown = 0usize;
    while let Some(frame) = reader.next_frame()? {
        match frame.item {
            Some(frame::Item::Recipient(recipient)) => recipients.push((recipient.id, format!("{recipient:?}"))),
            Some(frame::Item::Chat(chat)) => chats.push((chat.id, format!("{chat:?}"))),
            Some(frame::Item::ChatItem(item)) => items.push((item.chat_id, item.date_sent, format!("{item:?}"))),
            None => unknown += 1,
        }
    }
    recipients.sort();
    chats.sort();
    items.sort();

    let mut out = format!("version {}\n", header.version);
    for (_, line) in recipients {
        out.push_str("recipient ");
        out.push_str(&line);
        out.push('\n');
    }
    for (_, line) in chats {
        out.push_str("chat ");
        out.push_str(&line);
        out.push('\n');
    }
    for (_, _, line) in items {
        out.push_str("chat_item ");
        out.push_str(&line);
        out.push('\n');
    }
    if unknown > 0 {
        out.push_str(&format!("unknown {unknown}\n"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameWriter;
    use crate::proto::{self, BackupInfo, Frame};

    fn stream(backup_time_ms: u64, items: &[(u64, u64)]) -> Vec<u8> {
        let mut writer = FrameWriter::new(Vec::new());
        writer
            .write_header(&BackupInfo {
                version: 1,
                backup_time_ms,
            })
            .expect("header");
        for (chat_id, date_sent) in items {
            writer
                .write_frame(&Frame {
                    item: Some(frame::Item::ChatItem(proto::ChatItem {
                        chat_id: *chat_id,
                        date_sent: *date_sent,
                        ..Default::default()
                    })),
                })
                .expect("frame");
        }
        writer.into_inner()
    }

    #[test]
    fn ignores_backup_time_and_item_order() {
        let a = canonical_string(&stream(1, &[(1, 10), (2, 5), (1, 20)])).expect("a");
        let b = canonical_string(&stream(99, &[(2, 5), (1, 20), (1, 10)])).expect("b");
        assert_eq!(a, b);
        let c = canonical_string(&stream(1, &[(1, 10), (2, 5), (1, 21)])).expect("c");
        assert_ne!(a, c);
    }
}

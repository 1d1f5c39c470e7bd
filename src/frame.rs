//! Varint length-delimited frame codec.

use std::io::{self, Read, Write};

use prost::Message;
use tracing::debug;

use crate::error::{CoreError, StreamError};
use crate::proto::{frame, BackupInfo, Frame};

/// Longest varint a 64-bit length can take.
const MAX_DELIMITER_LEN: usize = 10;

/// Upper bound on a single frame; anything larger is treated as a corrupt
/// delimiter rather than an allocation request.
const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FramePhase {
    Start,
    Header,
    Recipients,
    Chats,
    ChatItems,
}

impl FramePhase {
    fn label(self) -> &'static str {
        match self {
            FramePhase::Start => "start",
            FramePhase::Header => "backup_info",
            FramePhase::Recipients => "recipient",
            FramePhase::Chats => "chat",
            FramePhase::ChatItems => "chat_item",
        }
    }

    fn of(item: &frame::Item) -> Self {
        match item {
            frame::Item::Recipient(_) => FramePhase::Recipients,
            frame::Item::Chat(_) => FramePhase::Chats,
            frame::Item::ChatItem(_) => FramePhase::ChatItems,
        }
    }
}

/// Frame kind name used in logs and reports.
pub fn frame_kind(frame: &Frame) -> &'static str {
    match &frame.item {
        Some(item) => FramePhase::of(item).label(),
        None => "empty",
    }
}

/// Writes the header and then frames, refusing to go back to an earlier
/// section of the stream.
pub struct FrameWriter<W: Write> {
    sink: W,
    phase: FramePhase,
    frames_written: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            phase: FramePhase::Start,
            frames_written: 0,
        }
    }

    pub fn write_header(&mut self, info: &BackupInfo) -> Result<(), CoreError> {
        if self.phase != FramePhase::Start {
            return Err(StreamError::FrameOutOfOrder {
                current: self.phase.label(),
                found: FramePhase::Header.label(),
            }
            .into());
        }
        self.sink.write_all(&info.encode_length_delimited_to_vec())?;
        self.phase = FramePhase::Header;
        Ok(())
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), CoreError> {
        let Some(item) = &frame.item else {
            return Err(CoreError::InvalidArgument("frame has no item".to_string()));
        };
        if self.phase == FramePhase::Start {
            return Err(StreamError::MissingBackupInfo.into());
        }
        let next = FramePhase::of(item);
        if next < self.phase {
            return Err(StreamError::FrameOutOfOrder {
                current: self.phase.label(),
                found: next.label(),
            }
            .into());
        }
        self.sink.write_all(&frame.encode_length_delimited_to_vec())?;
        self.phase = next;
        self.frames_written += 1;
        debug!(kind = next.label(), "frame written");
        Ok(())
    }

    /// Frames written after the header.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn flush(&mut self) -> Result<(), CoreError> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Reads a header and then one frame at a time.
pub struct FrameReader<R: Read> {
    source: R,
    header_read: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            header_read: false,
        }
    }

    pub fn read_header(&mut self) -> Result<BackupInfo, CoreError> {
        let bytes = self.read_message()?.ok_or(StreamError::MissingBackupInfo)?;
        let info = BackupInfo::decode(bytes.as_slice()).map_err(StreamError::from)?;
        if info.version == 0 {
            return Err(StreamError::MissingBackupInfo.into());
        }
        self.header_read = true;
        Ok(info)
    }

    /// Next frame, or `None` at a clean end of stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, CoreError> {
        if !self.header_read {
            return Err(StreamError::MissingBackupInfo.into());
        }
        let Some(bytes) = self.read_message()? else {
            return Ok(None);
        };
        let frame = Frame::decode(bytes.as_slice()).map_err(StreamError::from)?;
        Ok(Some(frame))
    }

    fn read_message(&mut self) -> Result<Option<Vec<u8>>, CoreError> {
        let Some(len) = self.read_delimiter()? else {
            return Ok(None);
        };
        if len > MAX_FRAME_LEN {
            return Err(StreamError::InvalidByteLengthDelimiter(format!("frame length {len} too large")).into());
        }
        let mut buf = vec![0u8; len];
        self.source.read_exact(&mut buf).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => {
                CoreError::from(StreamError::InvalidByteLengthDelimiter(format!(
                    "stream ended inside a {len} byte frame"
                )))
            }
            _ => CoreError::from(err),
        })?;
        Ok(Some(buf))
    }

    fn read_delimiter(&mut self) -> Result<Option<usize>, CoreError> {
        let mut raw = Vec::with_capacity(MAX_DELIMITER_LEN);
        loop {
            let mut byte = [0u8; 1];
            let n = match self.source.read(&mut byte) {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if n == 0 {
                if raw.is_empty() {
                    return Ok(None);
                }
                return Err(StreamError::InvalidByteLengthDelimiter("stream ended inside a delimiter".to_string()).into());
            }
            raw.push(byte[0]);
            if byte[0] & 0x80 == 0 {
                break;
            }
            if raw.len() >= MAX_DELIMITER_LEN {
                return Err(StreamError::InvalidByteLengthDelimiter("delimiter longer than 10 bytes".to_string()).into());
            }
        }
        let len = prost::decode_length_delimiter(raw.as_slice())
            .map_err(|err| StreamError::InvalidByteLengthDelimiter(err.to_string()))?;
        Ok(Some(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{recipient, Chat, Recipient, SelfRecipient};

    fn header() -> BackupInfo {
        BackupInfo {
            version: 1,
            backup_time_ms: 1_700_000_000_000,
        }
    }

    fn self_recipient(id: u64) -> Frame {
        Frame {
            item: Some(frame::Item::Recipient(Recipient {
                id,
                destination: Some(recipient::Destination::Self_(SelfRecipient {})),
            })),
        }
    }

    fn chat(id: u64) -> Frame {
        Frame {
            item: Some(frame::Item::Chat(Chat {
                id,
                recipient_id: 1,
                ..Default::default()
            })),
        }
    }

    #[test]
    fn writer_then_reader_preserves_frames() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.write_header(&header()).expect("header");
        writer.write_frame(&self_recipient(1)).expect("recipient");
        writer.write_frame(&chat(1)).expect("chat");
        assert_eq!(writer.frames_written(), 2);

        let bytes = writer.into_inner();
        let mut reader = FrameReader::new(bytes.as_slice());
        assert_eq!(reader.read_header().expect("header"), header());
        assert_eq!(reader.next_frame().expect("read"), Some(self_recipient(1)));
        assert_eq!(reader.next_frame().expect("read"), Some(chat(1)));
        assert_eq!(reader.next_frame().expect("read"), None);
    }

    #[test]
    fn writer_rejects_regressions() {
        let mut writer = FrameWriter::new(Vec::new());
        assert!(matches!(
            writer.write_frame(&self_recipient(1)),
            Err(CoreError::Stream(StreamError::MissingBackupInfo))
        ));
        writer.write_header(&header()).expect("header");
        writer.write_frame(&chat(1)).expect("chat");
        assert!(matches!(
            writer.write_frame(&self_recipient(2)),
            Err(CoreError::Stream(StreamError::FrameOutOfOrder {
                current: "chat",
                found: "recipient"
            }))
        ));
        assert!(writer.write_header(&header()).is_err());
    }

    #[test]
    fn truncated_delimiter_is_reported() {
        let mut bytes = header().encode_length_delimited_to_vec();
        bytes.push(0x80);
        let mut reader = FrameReader::new(bytes.as_slice());
        reader.read_header().expect("header");
        assert!(matches!(
            reader.next_frame(),
            Err(CoreError::Stream(StreamError::InvalidByteLengthDelimiter(_)))
        ));
    }

    #[test]
    fn garbage_frame_is_a_decode_error() {
        let mut bytes = header().encode_length_delimited_to_vec();
        bytes.extend_from_slice(&[3, 0xff, 0xff, 0xff]);
        let mut reader = FrameReader::new(bytes.as_slice());
        reader.read_header().expect("header");
        assert!(matches!(
            reader.next_frame(),
            Err(CoreError::Stream(StreamError::ProtoDeserializationError(_)))
        ));
    }

    #[test]
    fn empty_stream_has_no_header() {
        let mut reader = FrameReader::new(&[][..]);
        assert!(matches!(
            reader.read_header(),
            Err(CoreError::Stream(StreamError::MissingBackupInfo))
        ));
    }
}

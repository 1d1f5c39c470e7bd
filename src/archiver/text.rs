//! Message text and body ranges.

use uuid::Uuid;

use crate::interaction::{
    ArchiveErrorKind, ArchiveFrameError, ArchiveInteractionResult, ArchiveObjectId, InteractionResult,
    InvalidProtoData, RestoreFrameError, RestoreInteractionResult, RestoreObjectId,
};
use crate::models::{BodyRange, BodyRangeKind, TextStyle};
use crate::proto::{self, body_range};

pub fn archive_text(id: ArchiveObjectId, body: &str, ranges: &[BodyRange]) -> ArchiveInteractionResult<proto::Text> {
    archive_body_ranges(id, ranges).map(|body_ranges| proto::Text {
        body: body.to_string(),
        body_ranges,
    })
}

/// Each range that cannot be expressed is dropped with its own error; the
/// rest of the text is kept.
pub fn archive_body_ranges(id: ArchiveObjectId, ranges: &[BodyRange]) -> ArchiveInteractionResult<Vec<proto::BodyRange>> {
    InteractionResult::collect(|partial| {
        let mut out = Vec::with_capacity(ranges.len());
        for range in ranges {
            let value = match &range.kind {
                BodyRangeKind::Mention(aci) => body_range::AssociatedValue::MentionAci(aci.as_bytes().to_vec()),
                BodyRangeKind::Style(style) => match archive_style(*style) {
                    Some(style) => body_range::AssociatedValue::Style(style as i32),
                    None => {
                        partial.push(ArchiveFrameError::new(id, ArchiveErrorKind::UnrecognizedBodyRangeStyle));
                        continue;
                    }
                },
            };
            out.push(proto::BodyRange {
                start: range.start,
                length: range.length,
                associated_value: Some(value),
            });
        }
        Ok(out)
    })
}

fn archive_style(style: TextStyle) -> Option<body_range::Style> {
    match style {
        TextStyle::Bold => Some(body_range::Style::Bold),
        TextStyle::Italic => Some(body_range::Style::Italic),
        TextStyle::Spoiler => Some(body_range::Style::Spoiler),
        TextStyle::Strikethrough => Some(body_range::Style::Strikethrough),
        TextStyle::Monospace => Some(body_range::Style::Monospace),
        TextStyle::Unrecognized => None,
    }
}

fn restore_style(raw: i32) -> Option<TextStyle> {
    match body_range::Style::try_from(raw).ok()? {
        body_range::Style::None => None,
        body_range::Style::Bold => Some(TextStyle::Bold),
        body_range::Style::Italic => Some(TextStyle::Italic),
        body_range::Style::Spoiler => Some(TextStyle::Spoiler),
        body_range::Style::Strikethrough => Some(TextStyle::Strikethrough),
        body_range::Style::Monospace => Some(TextStyle::Monospace),
    }
}

/// Restores body ranges against `body`. Offsets are in UTF-16 code units.
pub fn restore_body_ranges(
    id: RestoreObjectId,
    body: &str,
    ranges: &[proto::BodyRange],
) -> RestoreInteractionResult<Vec<BodyRange>> {
    let body_len = body.encode_utf16().count() as u64;
    InteractionResult::collect(|partial| {
        let mut out = Vec::with_capacity(ranges.len());
        for range in ranges {
            if u64::from(range.start) + u64::from(range.length) > body_len {
                partial.push(RestoreFrameError::new(id, InvalidProtoData::BodyRangeOutOfBounds));
                continue;
            }
            let kind = match &range.associated_value {
                Some(body_range::AssociatedValue::MentionAci(raw)) => match Uuid::from_slice(raw) {
                    Ok(aci) => BodyRangeKind::Mention(aci),
                    Err(_) => {
                        partial.push(RestoreFrameError::new(id, InvalidProtoData::InvalidMentionAci));
                        continue;
                    }
                },
                Some(body_range::AssociatedValue::Style(raw)) => match restore_style(*raw) {
                    Some(style) => BodyRangeKind::Style(style),
                    None => {
                        partial.push(RestoreFrameError::new(id, InvalidProtoData::UnrecognizedBodyRangeStyle));
                        continue;
                    }
                },
                None => {
                    partial.push(RestoreFrameError::new(id, InvalidProtoData::UnrecognizedBodyRangeStyle));
                    continue;
                }
            };
            out.push(BodyRange {
                start: range.start,
                length: range.length,
                kind,
            });
        }
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BackupChatId;

    const RESTORE_ID: RestoreObjectId = RestoreObjectId::ChatItem {
        chat_id: BackupChatId(1),
        date_sent: 10,
    };

    #[test]
    fn unrecognized_style_is_a_partial_failure() {
        let id = ArchiveObjectId::Message {
            thread_id: 1,
            message_id: 2,
            sent_at: 3,
        };
        let ranges = vec![
            BodyRange {
                start: 0,
                length: 2,
                kind: BodyRangeKind::Style(TextStyle::Bold),
            },
            BodyRange {
                start: 2,
                length: 2,
                kind: BodyRangeKind::Style(TextStyle::Unrecognized),
            },
        ];
        let result = archive_text(id, "hey you", &ranges);
        let (text, errors) = result.into_parts();
        let text = text.expect("text kept");
        assert_eq!(text.body_ranges.len(), 1);
        assert_eq!(errors, vec![ArchiveFrameError::new(id, ArchiveErrorKind::UnrecognizedBodyRangeStyle)]);
    }

    #[test]
    fn restore_drops_only_the_bad_range() {
        let aci = Uuid::new_v4();
        let ranges = vec![
            proto::BodyRange {
                start: 0,
                length: 1,
                associated_value: Some(body_range::AssociatedValue::MentionAci(aci.as_bytes().to_vec())),
            },
            proto::BodyRange {
                start: 1,
                length: 1,
                associated_value: Some(body_range::AssociatedValue::MentionAci(vec![1, 2, 3])),
            },
            proto::BodyRange {
                start: 2,
                length: 3,
                associated_value: Some(body_range::AssociatedValue::Style(body_range::Style::Italic as i32)),
            },
            proto::BodyRange {
                start: 4,
                length: 40,
                associated_value: Some(body_range::AssociatedValue::Style(body_range::Style::Bold as i32)),
            },
        ];
        let result = restore_body_ranges(RESTORE_ID, "\u{fffc} hello", &ranges);
        match result {
            InteractionResult::PartialFailure(kept, errors) => {
                assert_eq!(kept.len(), 2);
                assert_eq!(kept[0].kind, BodyRangeKind::Mention(aci));
                assert_eq!(kept[1].kind, BodyRangeKind::Style(TextStyle::Italic));
                assert_eq!(
                    errors,
                    vec![
                        RestoreFrameError::new(RESTORE_ID, InvalidProtoData::InvalidMentionAci),
                        RestoreFrameError::new(RESTORE_ID, InvalidProtoData::BodyRangeOutOfBounds),
                    ]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn none_style_is_unrecognized() {
        let ranges = vec![proto::BodyRange {
            start: 0,
            length: 1,
            associated_value: Some(body_range::AssociatedValue::Style(body_range::Style::None as i32)),
        }];
        let result = restore_body_ranges(RESTORE_ID, "x", &ranges);
        assert_eq!(
            result.errors(),
            &[RestoreFrameError::new(RESTORE_ID, InvalidProtoData::UnrecognizedBodyRangeStyle)]
        );
    }
}

use crate::interaction::{
    ArchiveErrorKind, ArchiveFrameError, ArchiveInteractionResult, ArchiveObjectId, InteractionResult,
    InvalidProtoData, RestoreFrameError, RestoreInteractionResult, RestoreObjectId,
};
use crate::models::StickerInfo;
use crate::proto;

/// A sticker frame always carries its image pointer.
pub fn archive_sticker(
    id: ArchiveObjectId,
    sticker: &StickerInfo,
    data: Option<proto::FilePointer>,
) -> ArchiveInteractionResult<proto::Sticker> {
    let Some(data) = data else {
        return InteractionResult::fail(ArchiveFrameError::new(id, ArchiveErrorKind::MissingStickerAttachment));
    };
    InteractionResult::Success(proto::Sticker {
        pack_id: sticker.pack_id.clone(),
        pack_key: sticker.pack_key.clone(),
        sticker_id: sticker.sticker_id,
        emoji: sticker.emoji.clone(),
        data: Some(data),
    })
}

pub fn restore_sticker(
    id: RestoreObjectId,
    sticker: Option<&proto::Sticker>,
) -> RestoreInteractionResult<(StickerInfo, proto::FilePointer)> {
    let Some(sticker) = sticker else {
        return InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::StickerMessageMissingSticker));
    };
    let Some(data) = sticker.data.clone() else {
        return InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::StickerMissingData));
    };
    InteractionResult::Success((
        StickerInfo {
            pack_id: sticker.pack_id.clone(),
            pack_key: sticker.pack_key.clone(),
            sticker_id: sticker.sticker_id,
            emoji: sticker.emoji.clone(),
        },
        data,
    ))
}

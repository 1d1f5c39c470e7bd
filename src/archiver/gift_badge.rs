use crate::interaction::{
    ArchiveInteractionResult, InteractionResult, InvalidProtoData, RestoreFrameError, RestoreInteractionResult,
    RestoreObjectId,
};
use crate::models::{GiftBadge, GiftBadgeState};
use crate::proto::{self, gift_badge};

/// Never fails. A badge without a redemption credential is written as
/// `failed` with an empty credential.
pub fn archive_gift_badge(badge: &GiftBadge) -> ArchiveInteractionResult<proto::GiftBadge> {
    let archived = match &badge.redemption_credential {
        Some(credential) => {
            let state = match badge.state {
                GiftBadgeState::Pending => gift_badge::State::Unopened,
                GiftBadgeState::Opened => gift_badge::State::Opened,
                GiftBadgeState::Redeemed => gift_badge::State::Redeemed,
            };
            proto::GiftBadge {
                receipt_credential_presentation: credential.clone(),
                state: state as i32,
            }
        }
        None => proto::GiftBadge {
            receipt_credential_presentation: Vec::new(),
            state: gift_badge::State::Failed as i32,
        },
    };
    InteractionResult::Success(archived)
}

/// `failed` has no local counterpart and comes back as a pending badge with
/// no credential.
pub fn restore_gift_badge(id: RestoreObjectId, badge: &proto::GiftBadge) -> RestoreInteractionResult<GiftBadge> {
    let Ok(state) = gift_badge::State::try_from(badge.state) else {
        return InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::UnrecognizedGiftBadgeState));
    };
    let credential = Some(badge.receipt_credential_presentation.clone());
    let restored = match state {
        gift_badge::State::Unopened => GiftBadge {
            redemption_credential: credential,
            state: GiftBadgeState::Pending,
        },
        gift_badge::State::Opened => GiftBadge {
            redemption_credential: credential,
            state: GiftBadgeState::Opened,
        },
        gift_badge::State::Redeemed => GiftBadge {
            redemption_credential: credential,
            state: GiftBadgeState::Redeemed,
        },
        gift_badge::State::Failed => GiftBadge {
            redemption_credential: None,
            state: GiftBadgeState::Pending,
        },
    };
    InteractionResult::Success(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BackupChatId;

    const ID: RestoreObjectId = RestoreObjectId::ChatItem {
        chat_id: BackupChatId(2),
        date_sent: 7,
    };

    #[test]
    fn opened_badge_survives_a_round_trip() {
        let badge = GiftBadge {
            redemption_credential: Some(vec![1, 2, 3]),
            state: GiftBadgeState::Opened,
        };
        let archived = archive_gift_badge(&badge);
        let archived = archived.value().expect("archived");
        assert_eq!(archived.state, gift_badge::State::Opened as i32);
        assert_eq!(restore_gift_badge(ID, archived), InteractionResult::Success(badge));
    }

    #[test]
    fn failed_restores_as_pending_without_credential() {
        let failed = proto::GiftBadge {
            receipt_credential_presentation: vec![4, 4],
            state: gift_badge::State::Failed as i32,
        };
        assert_eq!(
            restore_gift_badge(ID, &failed),
            InteractionResult::Success(GiftBadge {
                redemption_credential: None,
                state: GiftBadgeState::Pending,
            })
        );
    }

    #[test]
    fn missing_credential_archives_as_failed() {
        let badge = GiftBadge {
            redemption_credential: None,
            state: GiftBadgeState::Redeemed,
        };
        let archived = archive_gift_badge(&badge);
        assert_eq!(
            archived,
            InteractionResult::Success(proto::GiftBadge {
                receipt_credential_presentation: Vec::new(),
                state: gift_badge::State::Failed as i32,
            })
        );
    }

    #[test]
    fn unknown_state_is_an_error() {
        let badge = proto::GiftBadge {
            receipt_credential_presentation: Vec::new(),
            state: 42,
        };
        assert!(restore_gift_badge(ID, &badge).is_message_failure());
    }
}

use crate::interaction::{
    ArchiveInteractionResult, InteractionResult, InvalidProtoData, RestoreFrameError, RestoreInteractionResult,
    RestoreObjectId,
};
use crate::models::{ContactAddress, ContactDetail, ContactDetailType, ContactShare};
use crate::proto::{self, contact_attachment};

fn archive_detail_type(kind: ContactDetailType) -> i32 {
    let kind = match kind {
        ContactDetailType::Unknown => contact_attachment::DetailType::Unknown,
        ContactDetailType::Home => contact_attachment::DetailType::Home,
        ContactDetailType::Mobile => contact_attachment::DetailType::Mobile,
        ContactDetailType::Work => contact_attachment::DetailType::Work,
        ContactDetailType::Custom => contact_attachment::DetailType::Custom,
    };
    kind as i32
}

fn restore_detail_type(raw: i32) -> ContactDetailType {
    match contact_attachment::DetailType::try_from(raw) {
        Ok(contact_attachment::DetailType::Home) => ContactDetailType::Home,
        Ok(contact_attachment::DetailType::Mobile) => ContactDetailType::Mobile,
        Ok(contact_attachment::DetailType::Work) => ContactDetailType::Work,
        Ok(contact_attachment::DetailType::Custom) => ContactDetailType::Custom,
        Ok(contact_attachment::DetailType::Unknown) | Err(_) => ContactDetailType::Unknown,
    }
}

/// The avatar pointer is read separately since it lives in `attachments`.
pub fn archive_contact_share(
    contact: &ContactShare,
    avatar: Option<proto::FilePointer>,
) -> ArchiveInteractionResult<proto::ContactAttachment> {
    let has_name = [
        &contact.given_name,
        &contact.family_name,
        &contact.name_prefix,
        &contact.name_suffix,
        &contact.middle_name,
        &contact.nickname,
    ]
    .iter()
    .any(|part| part.is_some());
    let name = has_name.then(|| contact_attachment::Name {
        given_name: contact.given_name.clone(),
        family_name: contact.family_name.clone(),
        prefix: contact.name_prefix.clone(),
        suffix: contact.name_suffix.clone(),
        middle_name: contact.middle_name.clone(),
        nickname: contact.nickname.clone(),
    });
    InteractionResult::Success(proto::ContactAttachment {
        name,
        number: contact
            .phone_numbers
            .iter()
            .map(|detail| contact_attachment::Phone {
                value: detail.value.clone(),
                r#type: archive_detail_type(detail.detail_type),
                label: detail.label.clone(),
            })
            .collect(),
        email: contact
            .emails
            .iter()
            .map(|detail| contact_attachment::Email {
                value: detail.value.clone(),
                r#type: archive_detail_type(detail.detail_type),
                label: detail.label.clone(),
            })
            .collect(),
        address: contact
            .addresses
            .iter()
            .map(|address| contact_attachment::PostalAddress {
                r#type: archive_detail_type(address.detail_type),
                label: address.label.clone(),
                street: address.street.clone(),
                pobox: address.pobox.clone(),
                neighborhood: address.neighborhood.clone(),
                city: address.city.clone(),
                region: address.region.clone(),
                postcode: address.postcode.clone(),
                country: address.country.clone(),
            })
            .collect(),
        avatar,
        organization: contact.organization.clone(),
    })
}

pub fn restore_contact_share(
    id: RestoreObjectId,
    contact: Option<&proto::ContactAttachment>,
) -> RestoreInteractionResult<(ContactShare, Option<proto::FilePointer>)> {
    let Some(contact) = contact else {
        return InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::ContactMessageMissingContact));
    };
    let name = contact.name.clone().unwrap_or_default();
    let share = ContactShare {
        given_name: name.given_name,
        family_name: name.family_name,
        name_prefix: name.prefix,
        name_suffix: name.suffix,
        middle_name: name.middle_name,
        nickname: name.nickname,
        organization: contact.organization.clone(),
        phone_numbers: contact
            .number
            .iter()
            .map(|phone| ContactDetail {
                value: phone.value.clone(),
                detail_type: restore_detail_type(phone.r#type),
                label: phone.label.clone(),
            })
            .collect(),
        emails: contact
            .email
            .iter()
            .map(|email| ContactDetail {
                value: email.value.clone(),
                detail_type: restore_detail_type(email.r#type),
                label: email.label.clone(),
            })
            .collect(),
        addresses: contact
            .address
            .iter()
            .map(|address| ContactAddress {
                detail_type: restore_detail_type(address.r#type),
                label: address.label.clone(),
                street: address.street.clone(),
                pobox: address.pobox.clone(),
                neighborhood: address.neighborhood.clone(),
                city: address.city.clone(),
                region: address.region.clone(),
                postcode: address.postcode.clone(),
                country: address.country.clone(),
            })
            .collect(),
    };
    InteractionResult::Success((share, contact.avatar.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BackupChatId;

    #[test]
    fn missing_contact_fails() {
        let id = RestoreObjectId::ChatItem {
            chat_id: BackupChatId(3),
            date_sent: 1,
        };
        assert_eq!(
            restore_contact_share(id, None),
            InteractionResult::fail(RestoreFrameError::new(id, InvalidProtoData::ContactMessageMissingContact))
        );
    }

    #[test]
    fn unknown_detail_type_restores_as_unknown() {
        let id = RestoreObjectId::ChatItem {
            chat_id: BackupChatId(3),
            date_sent: 1,
        };
        let contact = proto::ContactAttachment {
            number: vec![contact_attachment::Phone {
                value: Some("+15550100".to_string()),
                r#type: 99,
                label: None,
            }],
            ..Default::default()
        };
        let (share, avatar) = restore_contact_share(id, Some(&contact)).into_parts().0.expect("restored");
        assert_eq!(share.phone_numbers[0].detail_type, ContactDetailType::Unknown);
        assert_eq!(share.given_name, None);
        assert!(avatar.is_none());
    }
}

//! Directory objects returned by the external directory.
//!
//! Property access goes through [`DirectoryObject::property_value`], a closed
//! mapping from [`DirectoryObjectProperty`] to the typed fields. Extension
//! attributes are the exception: their storage key is prefixed per tenant, so
//! they are found by suffix in the additional data map. When several keys end
//! with the same attribute name, the first one in key order wins.

use crate::config::{DirectoryObjectProperty, DirectoryObjectType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `userType` value of guest accounts.
pub const GUEST_USER_TYPE: &str = "Guest";
/// `userType` value of member accounts.
pub const MEMBER_USER_TYPE: &str = "Member";

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectoryUser {
    pub id: String,
    pub user_principal_name: Option<String>,
    pub mail: Option<String>,
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub mobile_phone: Option<String>,
    pub office_location: Option<String>,
    pub mail_nickname: Option<String>,
    pub preferred_language: Option<String>,
    pub account_enabled: Option<bool>,
    pub user_type: Option<String>,
    pub other_mails: Vec<String>,
    pub on_premises_distinguished_name: Option<String>,
    pub on_premises_sam_account_name: Option<String>,
    pub on_premises_security_identifier: Option<String>,
    pub on_premises_user_principal_name: Option<String>,
    /// Tenant-specific attributes such as `extension_<appid>_extensionAttribute1`.
    pub additional_data: BTreeMap<String, Value>,
}

impl DirectoryUser {
    /// Minimal user with an object id and a user principal name.
    pub fn new(id: impl Into<String>, user_principal_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_principal_name: Some(user_principal_name.into()),
            ..Default::default()
        }
    }

    pub fn is_guest(&self) -> bool {
        self.user_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(GUEST_USER_TYPE))
    }
}

/// A group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectoryGroup {
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub mail_nickname: Option<String>,
    pub security_enabled: Option<bool>,
    pub on_premises_security_identifier: Option<String>,
    pub on_premises_sam_account_name: Option<String>,
    pub additional_data: BTreeMap<String, Value>,
}

impl DirectoryGroup {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: Some(display_name.into()),
            security_enabled: Some(true),
            ..Default::default()
        }
    }
}

/// A user or group returned by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "objectType")]
pub enum DirectoryObject {
    User(DirectoryUser),
    Group(DirectoryGroup),
}

impl From<DirectoryUser> for DirectoryObject {
    fn from(user: DirectoryUser) -> Self {
        Self::User(user)
    }
}

impl From<DirectoryGroup> for DirectoryObject {
    fn from(group: DirectoryGroup) -> Self {
        Self::Group(group)
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(values) => values.iter().find_map(render),
        Value::Object(_) => None,
    }
}

fn extension_value(
    additional_data: &BTreeMap<String, Value>,
    property: DirectoryObjectProperty,
) -> Option<String> {
    let suffix = property.graph_name().to_ascii_lowercase();
    additional_data
        .iter()
        .find(|(key, _)| key.to_ascii_lowercase().ends_with(&suffix))
        .and_then(|(_, value)| render(value))
}

impl DirectoryObject {
    pub fn object_type(&self) -> DirectoryObjectType {
        match self {
            Self::User(_) => DirectoryObjectType::User,
            Self::Group(_) => DirectoryObjectType::Group,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::User(u) => &u.id,
            Self::Group(g) => &g.id,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::User(u) if u.is_guest())
    }

    /// Value of `property` rendered as a string, `None` when unset or empty.
    pub fn property_value(&self, property: DirectoryObjectProperty) -> Option<String> {
        let value = match self {
            Self::User(user) => user_property(user, property),
            Self::Group(group) => group_property(group, property),
        };
        value.filter(|v| !v.is_empty())
    }
}

fn user_property(user: &DirectoryUser, property: DirectoryObjectProperty) -> Option<String> {
    use DirectoryObjectProperty as P;
    if property.is_extension_attribute() {
        return extension_value(&user.additional_data, property);
    }
    match property {
        P::Id => Some(user.id.clone()),
        P::UserPrincipalName => user.user_principal_name.clone(),
        P::Mail => user.mail.clone(),
        P::DisplayName => user.display_name.clone(),
        P::GivenName => user.given_name.clone(),
        P::Surname => user.surname.clone(),
        P::JobTitle => user.job_title.clone(),
        P::Department => user.department.clone(),
        P::MobilePhone => user.mobile_phone.clone(),
        P::OfficeLocation => user.office_location.clone(),
        P::MailNickname => user.mail_nickname.clone(),
        P::PreferredLanguage => user.preferred_language.clone(),
        P::AccountEnabled => user.account_enabled.map(|b| b.to_string()),
        P::UserType => user.user_type.clone(),
        P::OtherMails => user.other_mails.first().cloned(),
        P::OnPremisesDistinguishedName => user.on_premises_distinguished_name.clone(),
        P::OnPremisesSamAccountName => user.on_premises_sam_account_name.clone(),
        P::OnPremisesSecurityIdentifier => user.on_premises_security_identifier.clone(),
        P::OnPremisesUserPrincipalName => user.on_premises_user_principal_name.clone(),
        _ => None,
    }
}

fn group_property(group: &DirectoryGroup, property: DirectoryObjectProperty) -> Option<String> {
    use DirectoryObjectProperty as P;
    if property.is_extension_attribute() {
        return extension_value(&group.additional_data, property);
    }
    match property {
        P::Id => Some(group.id.clone()),
        P::DisplayName => group.display_name.clone(),
        P::Mail => group.mail.clone(),
        P::MailNickname => group.mail_nickname.clone(),
        P::SecurityEnabled => group.security_enabled.map(|b| b.to_string()),
        P::OnPremisesSecurityIdentifier => group.on_premises_security_identifier.clone(),
        P::OnPremisesSamAccountName => group.on_premises_sam_account_name.clone(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_properties() {
        let mut user = DirectoryUser::new("1", "jdoe@contoso.com");
        user.display_name = Some("John Doe".into());
        user.account_enabled = Some(true);
        user.mail = Some(String::new());
        let object = DirectoryObject::from(user);

        assert_eq!(
            object.property_value(DirectoryObjectProperty::UserPrincipalName),
            Some("jdoe@contoso.com".to_string())
        );
        assert_eq!(
            object.property_value(DirectoryObjectProperty::AccountEnabled),
            Some("true".to_string())
        );
        assert_eq!(object.property_value(DirectoryObjectProperty::Mail), None);
        assert_eq!(object.property_value(DirectoryObjectProperty::SecurityEnabled), None);
    }

    #[test]
    fn test_extension_attribute_suffix_lookup() {
        let mut user = DirectoryUser::new("1", "jdoe@contoso.com");
        user.additional_data.insert(
            "extension_9d98ed114c4840d298fad781915f27e4_extensionAttribute1".into(),
            json!("EMP-001"),
        );
        user.additional_data.insert(
            "extension_9d98ed114c4840d298fad781915f27e4_extensionAttribute11".into(),
            json!(42),
        );
        let object = DirectoryObject::User(user);
        assert_eq!(
            object.property_value(DirectoryObjectProperty::ExtensionAttribute1),
            Some("EMP-001".to_string())
        );
        assert_eq!(
            object.property_value(DirectoryObjectProperty::ExtensionAttribute11),
            Some("42".to_string())
        );
        assert_eq!(
            object.property_value(DirectoryObjectProperty::ExtensionAttribute2),
            None
        );
    }

    #[test]
    fn test_extension_attribute_first_key_wins() {
        let mut user = DirectoryUser::new("1", "jdoe@contoso.com");
        user.additional_data.insert(
            "extension_f1e2d3c4_extensionAttribute3".into(),
            json!("from-second-app"),
        );
        user.additional_data.insert(
            "extension_0a1b2c3d_extensionAttribute3".into(),
            json!("from-first-app"),
        );
        let object = DirectoryObject::User(user);
        for _ in 0..3 {
            assert_eq!(
                object.property_value(DirectoryObjectProperty::ExtensionAttribute3),
                Some("from-first-app".to_string())
            );
        }
    }

    #[test]
    fn test_guest_detection() {
        let mut user = DirectoryUser::new("1", "guest_fabrikam.com#EXT#@contoso.com");
        user.user_type = Some("guest".into());
        assert!(DirectoryObject::User(user).is_guest());
        assert!(!DirectoryObject::Group(DirectoryGroup::new("g", "Group")).is_guest());
    }

    #[test]
    fn test_tagged_serialization() {
        let group = DirectoryObject::Group(DirectoryGroup::new("g1", "AADGroup1"));
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["objectType"], "Group");
        assert_eq!(json["displayName"], "AADGroup1");
    }
}

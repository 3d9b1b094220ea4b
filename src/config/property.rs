//! Directory object types and the closed set of queryable properties.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of directory object a claim type config applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectoryObjectType {
    User,
    Group,
}

impl DirectoryObjectType {
    /// SharePoint entity type used when a config does not set one explicitly.
    pub fn default_sharepoint_entity_type(self) -> &'static str {
        match self {
            Self::User => sharepoint_entity_types::USER,
            Self::Group => sharepoint_entity_types::FORMS_ROLE,
        }
    }
}

impl fmt::Display for DirectoryObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("User"),
            Self::Group => f.write_str("Group"),
        }
    }
}

/// SharePoint entity type names understood by the people picker.
pub mod sharepoint_entity_types {
    pub const USER: &str = "User";
    pub const FORMS_ROLE: &str = "FormsRole";
    pub const SEC_GROUP: &str = "SecGroup";
}

/// Keys under which property values are surfaced as picker entity metadata.
pub mod entity_data_keys {
    pub const EMAIL: &str = "Email";
    pub const DISPLAY_NAME: &str = "DisplayName";
    pub const JOB_TITLE: &str = "JobTitle";
    pub const DEPARTMENT: &str = "Department";
    pub const MOBILE_PHONE: &str = "MobilePhone";
    pub const SIP_ADDRESS: &str = "SIPAddress";
    pub const ACCOUNT_NAME: &str = "AccountName";
    pub const TITLE: &str = "Title";
    pub const USER_ID: &str = "UserId";
    pub const SP_GROUP_ID: &str = "SPGroupID";
    pub const PRINCIPAL_TYPE: &str = "PrincipalType";
}

/// Directory attribute a claim type config reads.
///
/// `NotSet` is only valid transiently; a collection refuses entries that use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DirectoryObjectProperty {
    #[default]
    NotSet,
    AccountEnabled,
    Department,
    DisplayName,
    GivenName,
    Id,
    JobTitle,
    Mail,
    MailNickname,
    MobilePhone,
    OfficeLocation,
    OnPremisesDistinguishedName,
    OnPremisesSamAccountName,
    OnPremisesSecurityIdentifier,
    OnPremisesUserPrincipalName,
    OtherMails,
    PreferredLanguage,
    SecurityEnabled,
    Surname,
    UserPrincipalName,
    UserType,
    ExtensionAttribute1,
    ExtensionAttribute2,
    ExtensionAttribute3,
    ExtensionAttribute4,
    ExtensionAttribute5,
    ExtensionAttribute6,
    ExtensionAttribute7,
    ExtensionAttribute8,
    ExtensionAttribute9,
    ExtensionAttribute10,
    ExtensionAttribute11,
    ExtensionAttribute12,
    ExtensionAttribute13,
    ExtensionAttribute14,
    ExtensionAttribute15,
}

impl DirectoryObjectProperty {
    /// Name of the attribute in Microsoft Graph.
    pub fn graph_name(self) -> &'static str {
        match self {
            Self::NotSet => "",
            Self::AccountEnabled => "accountEnabled",
            Self::Department => "department",
            Self::DisplayName => "displayName",
            Self::GivenName => "givenName",
            Self::Id => "id",
            Self::JobTitle => "jobTitle",
            Self::Mail => "mail",
            Self::MailNickname => "mailNickname",
            Self::MobilePhone => "mobilePhone",
            Self::OfficeLocation => "officeLocation",
            Self::OnPremisesDistinguishedName => "onPremisesDistinguishedName",
            Self::OnPremisesSamAccountName => "onPremisesSamAccountName",
            Self::OnPremisesSecurityIdentifier => "onPremisesSecurityIdentifier",
            Self::OnPremisesUserPrincipalName => "onPremisesUserPrincipalName",
            Self::OtherMails => "otherMails",
            Self::PreferredLanguage => "preferredLanguage",
            Self::SecurityEnabled => "securityEnabled",
            Self::Surname => "surname",
            Self::UserPrincipalName => "userPrincipalName",
            Self::UserType => "userType",
            Self::ExtensionAttribute1 => "extensionAttribute1",
            Self::ExtensionAttribute2 => "extensionAttribute2",
            Self::ExtensionAttribute3 => "extensionAttribute3",
            Self::ExtensionAttribute4 => "extensionAttribute4",
            Self::ExtensionAttribute5 => "extensionAttribute5",
            Self::ExtensionAttribute6 => "extensionAttribute6",
            Self::ExtensionAttribute7 => "extensionAttribute7",
            Self::ExtensionAttribute8 => "extensionAttribute8",
            Self::ExtensionAttribute9 => "extensionAttribute9",
            Self::ExtensionAttribute10 => "extensionAttribute10",
            Self::ExtensionAttribute11 => "extensionAttribute11",
            Self::ExtensionAttribute12 => "extensionAttribute12",
            Self::ExtensionAttribute13 => "extensionAttribute13",
            Self::ExtensionAttribute14 => "extensionAttribute14",
            Self::ExtensionAttribute15 => "extensionAttribute15",
        }
    }

    /// Whether the value lives in the tenant-specific additional data bag.
    pub fn is_extension_attribute(self) -> bool {
        matches!(
            self,
            Self::ExtensionAttribute1
                | Self::ExtensionAttribute2
                | Self::ExtensionAttribute3
                | Self::ExtensionAttribute4
                | Self::ExtensionAttribute5
                | Self::ExtensionAttribute6
                | Self::ExtensionAttribute7
                | Self::ExtensionAttribute8
                | Self::ExtensionAttribute9
                | Self::ExtensionAttribute10
                | Self::ExtensionAttribute11
                | Self::ExtensionAttribute12
                | Self::ExtensionAttribute13
                | Self::ExtensionAttribute14
                | Self::ExtensionAttribute15
        )
    }

    pub fn is_set(self) -> bool {
        self != Self::NotSet
    }
}

impl fmt::Display for DirectoryObjectProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            f.write_str(self.graph_name())
        } else {
            f.write_str("NotSet")
        }
    }
}

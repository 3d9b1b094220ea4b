//! A single claim type mapping rule.
//!
//! A [`ClaimTypeConfig`] ties one directory property to one claim type (or to
//! picker metadata only). The identity variant adds the property substituted
//! for guest accounts. Configs are plain values; the rules that relate them to
//! each other are enforced by
//! [`ClaimTypeConfigCollection`](super::ClaimTypeConfigCollection).

use super::property::{DirectoryObjectProperty, DirectoryObjectType};
use serde::{Deserialize, Serialize};

/// Value type of string claims.
pub const CLAIM_VALUE_TYPE_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Distinguishes the identity config from ordinary ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ClaimTypeConfigKind {
    #[default]
    Standard,
    /// Config of the identity claim type. Guest accounts are resolved with
    /// `directory_object_property_for_guest_users` because their primary
    /// attribute is specific to the host tenant.
    #[serde(rename_all = "camelCase")]
    Identity {
        directory_object_property_for_guest_users: DirectoryObjectProperty,
    },
}

/// Maps one directory property to a claim type and/or picker metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTypeConfig {
    /// Claim type. Empty for metadata-only configs and for configs that use
    /// the main claim type of their directory object.
    #[serde(default)]
    pub claim_type: String,
    pub entity_type: DirectoryObjectType,
    pub entity_property: DirectoryObjectProperty,
    /// Property shown in the picker instead of the matched one.
    #[serde(default)]
    pub entity_property_to_use_as_display_text: DirectoryObjectProperty,
    /// Borrow the claim type of the identity (users) or main group config.
    #[serde(default)]
    pub use_main_claim_type_of_directory_object: bool,
    /// Metadata key the matched value is surfaced under.
    #[serde(default)]
    pub entity_data_key: String,
    /// Input prefix that creates a permission without a directory lookup.
    #[serde(default)]
    pub prefix_to_bypass_lookup: String,
    #[serde(default = "default_claim_value_type")]
    pub claim_value_type: String,
    #[serde(default)]
    pub claim_type_display_name: String,
    /// Only exact matches are returned for this config.
    #[serde(default)]
    pub filter_exact_match_only: bool,
    /// Overrides the SharePoint entity type of created picker entities.
    #[serde(default)]
    pub sharepoint_entity_type: String,
    #[serde(default)]
    pub kind: ClaimTypeConfigKind,
}

fn default_claim_value_type() -> String {
    CLAIM_VALUE_TYPE_STRING.to_string()
}

/// Logical key of a config inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClaimTypeConfigKey<'a> {
    ClaimType(&'a str),
    EntityData(DirectoryObjectType, &'a str),
    Property(DirectoryObjectType, DirectoryObjectProperty),
}

impl ClaimTypeConfig {
    /// Start building a config for `entity_property` of `entity_type` objects.
    pub fn builder(
        entity_type: DirectoryObjectType,
        entity_property: DirectoryObjectProperty,
    ) -> ClaimTypeConfigBuilder {
        ClaimTypeConfigBuilder::new(entity_type, entity_property)
    }

    /// Build the identity config of the trust.
    pub fn identity(
        claim_type: impl Into<String>,
        entity_property: DirectoryObjectProperty,
        property_for_guest_users: DirectoryObjectProperty,
    ) -> Self {
        Self::builder(DirectoryObjectType::User, entity_property)
            .claim_type(claim_type)
            .guest_users_property(property_for_guest_users)
            .build()
    }

    pub fn has_claim_type(&self) -> bool {
        !self.claim_type.is_empty()
    }

    pub fn has_entity_data_key(&self) -> bool {
        !self.entity_data_key.is_empty()
    }

    pub fn has_prefix_to_bypass_lookup(&self) -> bool {
        !self.prefix_to_bypass_lookup.is_empty()
    }

    /// Config contributes metadata only: no claim type of its own, nor borrowed.
    pub fn is_metadata_only(&self) -> bool {
        !self.has_claim_type() && !self.use_main_claim_type_of_directory_object
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.kind, ClaimTypeConfigKind::Identity { .. })
    }

    /// Guest substitution property, for the identity config.
    pub fn property_for_guest_users(&self) -> Option<DirectoryObjectProperty> {
        match self.kind {
            ClaimTypeConfigKind::Identity {
                directory_object_property_for_guest_users,
            } if directory_object_property_for_guest_users.is_set() => {
                Some(directory_object_property_for_guest_users)
            }
            _ => None,
        }
    }

    pub fn key(&self) -> ClaimTypeConfigKey<'_> {
        if self.has_claim_type() {
            ClaimTypeConfigKey::ClaimType(&self.claim_type)
        } else if self.has_entity_data_key() {
            ClaimTypeConfigKey::EntityData(self.entity_type, &self.entity_data_key)
        } else {
            ClaimTypeConfigKey::Property(self.entity_type, self.entity_property)
        }
    }

    /// Name shown in the picker hierarchy and used as display text prefix.
    pub fn display_name(&self) -> &str {
        if !self.claim_type_display_name.is_empty() {
            return &self.claim_type_display_name;
        }
        self.claim_type
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.claim_type)
    }

    /// SharePoint entity type of picker entities produced by this config.
    pub fn picker_entity_type(&self) -> &str {
        if self.sharepoint_entity_type.is_empty() {
            self.entity_type.default_sharepoint_entity_type()
        } else {
            &self.sharepoint_entity_type
        }
    }

    /// Copy of this config turned into a plain entry, dropping the identity extras.
    pub fn to_standard(&self) -> Self {
        Self {
            kind: ClaimTypeConfigKind::Standard,
            ..self.clone()
        }
    }

    /// Copy of this config promoted to identity, keeping its guest property if any.
    pub fn to_identity(&self, property_for_guest_users: DirectoryObjectProperty) -> Self {
        Self {
            kind: ClaimTypeConfigKind::Identity {
                directory_object_property_for_guest_users: property_for_guest_users,
            },
            ..self.clone()
        }
    }
}

/// Builder for [`ClaimTypeConfig`].
#[derive(Debug, Clone)]
pub struct ClaimTypeConfigBuilder {
    config: ClaimTypeConfig,
}

impl ClaimTypeConfigBuilder {
    fn new(entity_type: DirectoryObjectType, entity_property: DirectoryObjectProperty) -> Self {
        Self {
            config: ClaimTypeConfig {
                claim_type: String::new(),
                entity_type,
                entity_property,
                entity_property_to_use_as_display_text: DirectoryObjectProperty::NotSet,
                use_main_claim_type_of_directory_object: false,
                entity_data_key: String::new(),
                prefix_to_bypass_lookup: String::new(),
                claim_value_type: default_claim_value_type(),
                claim_type_display_name: String::new(),
                filter_exact_match_only: false,
                sharepoint_entity_type: String::new(),
                kind: ClaimTypeConfigKind::Standard,
            },
        }
    }

    pub fn claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.config.claim_type = claim_type.into();
        self
    }

    pub fn use_main_claim_type(mut self) -> Self {
        self.config.use_main_claim_type_of_directory_object = true;
        self
    }

    pub fn entity_data_key(mut self, key: impl Into<String>) -> Self {
        self.config.entity_data_key = key.into();
        self
    }

    pub fn display_text_property(mut self, property: DirectoryObjectProperty) -> Self {
        self.config.entity_property_to_use_as_display_text = property;
        self
    }

    pub fn prefix_to_bypass_lookup(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix_to_bypass_lookup = prefix.into();
        self
    }

    pub fn claim_value_type(mut self, value_type: impl Into<String>) -> Self {
        self.config.claim_value_type = value_type.into();
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.config.claim_type_display_name = name.into();
        self
    }

    pub fn exact_match_only(mut self) -> Self {
        self.config.filter_exact_match_only = true;
        self
    }

    pub fn sharepoint_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.config.sharepoint_entity_type = entity_type.into();
        self
    }

    pub fn guest_users_property(mut self, property: DirectoryObjectProperty) -> Self {
        self.config.kind = ClaimTypeConfigKind::Identity {
            directory_object_property_for_guest_users: property,
        };
        self
    }

    pub fn build(self) -> ClaimTypeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_claim_type_segment() {
        let config = ClaimTypeConfig::builder(DirectoryObjectType::User, DirectoryObjectProperty::Mail)
            .claim_type("http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress")
            .build();
        assert_eq!(config.display_name(), "emailaddress");

        let named = ClaimTypeConfig::builder(DirectoryObjectType::User, DirectoryObjectProperty::Mail)
            .claim_type("http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress")
            .display_name("E-mail")
            .build();
        assert_eq!(named.display_name(), "E-mail");
    }

    #[test]
    fn test_identity_config() {
        let config = ClaimTypeConfig::identity(
            "upn",
            DirectoryObjectProperty::UserPrincipalName,
            DirectoryObjectProperty::Mail,
        );
        assert!(config.is_identity());
        assert_eq!(config.entity_type, DirectoryObjectType::User);
        assert_eq!(
            config.property_for_guest_users(),
            Some(DirectoryObjectProperty::Mail)
        );
        assert!(!config.to_standard().is_identity());
    }

    #[test]
    fn test_keys() {
        let with_claim = ClaimTypeConfig::builder(DirectoryObjectType::Group, DirectoryObjectProperty::Id)
            .claim_type("groups")
            .build();
        assert_eq!(with_claim.key(), ClaimTypeConfigKey::ClaimType("groups"));

        let metadata = ClaimTypeConfig::builder(DirectoryObjectType::User, DirectoryObjectProperty::JobTitle)
            .entity_data_key("JobTitle")
            .build();
        assert!(metadata.is_metadata_only());
        assert_eq!(
            metadata.key(),
            ClaimTypeConfigKey::EntityData(DirectoryObjectType::User, "JobTitle")
        );
    }

    #[test]
    fn test_serde_round_trip_keeps_identity_kind() {
        let config = ClaimTypeConfig::identity(
            "upn",
            DirectoryObjectProperty::UserPrincipalName,
            DirectoryObjectProperty::Mail,
        );
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json["kind"]["identity"]["directoryObjectPropertyForGuestUsers"],
            "mail"
        );
        let parsed: ClaimTypeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_picker_entity_type_defaults() {
        let group = ClaimTypeConfig::builder(DirectoryObjectType::Group, DirectoryObjectProperty::Id)
            .claim_type("groups")
            .build();
        assert_eq!(group.picker_entity_type(), "FormsRole");
        let sec = ClaimTypeConfig::builder(DirectoryObjectType::Group, DirectoryObjectProperty::Id)
            .claim_type("groups")
            .sharepoint_entity_type("SecGroup")
            .build();
        assert_eq!(sec.picker_entity_type(), "SecGroup");
    }
}

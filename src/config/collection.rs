//! Invariant-checked collection of claim type configs.
//!
//! [`ClaimTypeConfigCollection`] is the central registry of mapping rules. It
//! keeps insertion order, which drives the order of hierarchy nodes and search
//! results, and it refuses any change that would leave it in an inconsistent
//! state. Changes touching more than one entry are applied to a trial copy,
//! validated from scratch, then swapped in.
//!
//! # Example
//!
//! ```rust
//! use entra_claims::config::{
//!     ClaimTypeConfig, ClaimTypeConfigCollection, DirectoryObjectProperty, DirectoryObjectType,
//!     claim_types,
//! };
//!
//! let mut collection = ClaimTypeConfigCollection::default_for_trust(claim_types::UPN);
//! let department = ClaimTypeConfig::builder(DirectoryObjectType::User, DirectoryObjectProperty::OfficeLocation)
//!     .entity_data_key("Office")
//!     .build();
//! collection.add(department)?;
//!
//! // A second group claim type is refused and the collection is left untouched.
//! let roles = ClaimTypeConfig::builder(DirectoryObjectType::Group, DirectoryObjectProperty::MailNickname)
//!     .claim_type("http://schemas.microsoft.com/ws/2008/06/identity/claims/role")
//!     .build();
//! assert!(collection.add(roles).is_err());
//! # Ok::<(), entra_claims::error::ConfigurationError>(())
//! ```

use super::claim_type_config::{ClaimTypeConfig, ClaimTypeConfigKey, ClaimTypeConfigKind};
use super::property::{DirectoryObjectProperty, DirectoryObjectType, entity_data_keys};
use crate::error::{ClaimTypeConfigRule, ConfigurationError, ConfigurationResult};
use crate::logging::LogCategory;
use crate::resolution::matching::equals_ignore_case;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Well-known claim types.
pub mod claim_types {
    pub const UPN: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/upn";
    pub const EMAIL: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
    pub const NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
    pub const ROLE: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";
    pub const GROUPS: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/groups";
}

fn same_text(a: &str, b: &str) -> bool {
    equals_ignore_case(a, b)
}

fn same_key(a: &ClaimTypeConfigKey<'_>, b: &ClaimTypeConfigKey<'_>) -> bool {
    match (a, b) {
        (ClaimTypeConfigKey::ClaimType(a), ClaimTypeConfigKey::ClaimType(b)) => same_text(a, b),
        (ClaimTypeConfigKey::EntityData(ta, a), ClaimTypeConfigKey::EntityData(tb, b)) => {
            ta == tb && same_text(a, b)
        }
        (ClaimTypeConfigKey::Property(ta, pa), ClaimTypeConfigKey::Property(tb, pb)) => {
            ta == tb && pa == pb
        }
        _ => false,
    }
}

/// Ordered set of [`ClaimTypeConfig`] that enforces the collection rules on
/// every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<ClaimTypeConfig>", into = "Vec<ClaimTypeConfig>")]
pub struct ClaimTypeConfigCollection {
    items: Vec<ClaimTypeConfig>,
    // Identity claim type of the trust the collection is bound to.
    trust_identity_claim_type: Option<String>,
}

// Two collections are equal when they hold the same entries in the same order;
// the trust binding is runtime state.
impl PartialEq for ClaimTypeConfigCollection {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for ClaimTypeConfigCollection {}

impl TryFrom<Vec<ClaimTypeConfig>> for ClaimTypeConfigCollection {
    type Error = ConfigurationError;

    fn try_from(items: Vec<ClaimTypeConfig>) -> ConfigurationResult<Self> {
        Self::from_configs(items, None)
    }
}

impl From<ClaimTypeConfigCollection> for Vec<ClaimTypeConfig> {
    fn from(collection: ClaimTypeConfigCollection) -> Self {
        collection.items
    }
}

impl<'a> IntoIterator for &'a ClaimTypeConfigCollection {
    type Item = &'a ClaimTypeConfig;
    type IntoIter = std::slice::Iter<'a, ClaimTypeConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl ClaimTypeConfigCollection {
    /// Create an empty collection, optionally bound to the identity claim type of a trust.
    pub fn new(trust_identity_claim_type: Option<String>) -> Self {
        Self {
            items: Vec::new(),
            trust_identity_claim_type: trust_identity_claim_type.filter(|c| !c.is_empty()),
        }
    }

    /// Build a collection by adding each config in order.
    pub fn from_configs(
        configs: impl IntoIterator<Item = ClaimTypeConfig>,
        trust_identity_claim_type: Option<String>,
    ) -> ConfigurationResult<Self> {
        let mut collection = Self::new(trust_identity_claim_type);
        for config in configs {
            collection.add(config)?;
        }
        Ok(collection)
    }

    /// Default mapping rules for a trust whose identity claim type is `identity_claim_type`.
    pub fn default_for_trust(identity_claim_type: &str) -> Self {
        let identity_property = if same_text(identity_claim_type, claim_types::EMAIL) {
            DirectoryObjectProperty::Mail
        } else {
            DirectoryObjectProperty::UserPrincipalName
        };
        let secondary_lookup = if identity_property == DirectoryObjectProperty::Mail {
            DirectoryObjectProperty::UserPrincipalName
        } else {
            DirectoryObjectProperty::Mail
        };

        let user = DirectoryObjectType::User;
        let group = DirectoryObjectType::Group;
        let items = vec![
            ClaimTypeConfig::builder(user, identity_property)
                .claim_type(identity_claim_type)
                .display_text_property(DirectoryObjectProperty::DisplayName)
                .guest_users_property(DirectoryObjectProperty::Mail)
                .build(),
            ClaimTypeConfig::builder(user, secondary_lookup)
                .use_main_claim_type()
                .entity_data_key(entity_data_keys::EMAIL)
                .build(),
            ClaimTypeConfig::builder(user, DirectoryObjectProperty::DisplayName)
                .use_main_claim_type()
                .entity_data_key(entity_data_keys::DISPLAY_NAME)
                .build(),
            ClaimTypeConfig::builder(user, DirectoryObjectProperty::GivenName)
                .use_main_claim_type()
                .build(),
            ClaimTypeConfig::builder(user, DirectoryObjectProperty::Surname)
                .use_main_claim_type()
                .build(),
            ClaimTypeConfig::builder(user, DirectoryObjectProperty::JobTitle)
                .entity_data_key(entity_data_keys::JOB_TITLE)
                .build(),
            ClaimTypeConfig::builder(user, DirectoryObjectProperty::Department)
                .entity_data_key(entity_data_keys::DEPARTMENT)
                .build(),
            ClaimTypeConfig::builder(user, DirectoryObjectProperty::MobilePhone)
                .entity_data_key(entity_data_keys::MOBILE_PHONE)
                .build(),
            ClaimTypeConfig::builder(group, DirectoryObjectProperty::Id)
                .claim_type(claim_types::GROUPS)
                .display_text_property(DirectoryObjectProperty::DisplayName)
                .build(),
            ClaimTypeConfig::builder(group, DirectoryObjectProperty::DisplayName)
                .use_main_claim_type()
                .entity_data_key(entity_data_keys::DISPLAY_NAME)
                .build(),
        ];

        Self {
            items,
            trust_identity_claim_type: Some(identity_claim_type.to_string()),
        }
    }

    /// Identity claim type of the trust this collection is bound to.
    pub fn trust_identity_claim_type(&self) -> Option<&str> {
        self.trust_identity_claim_type.as_deref()
    }

    /// Bind the collection to a trust, re-validating every entry against it.
    pub fn set_trust_identity_claim_type(
        &mut self,
        identity_claim_type: impl Into<String>,
    ) -> ConfigurationResult<()> {
        let trial = Self::from_configs(self.items.clone(), Some(identity_claim_type.into()))?;
        *self = trial;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClaimTypeConfig> {
        self.items.iter()
    }

    /// Config whose claim type is `claim_type`.
    pub fn get_by_claim_type(&self, claim_type: &str) -> Option<&ClaimTypeConfig> {
        if claim_type.is_empty() {
            return None;
        }
        self.items
            .iter()
            .find(|c| c.has_claim_type() && same_text(&c.claim_type, claim_type))
    }

    /// Configs targeting `entity_type`, in collection order.
    pub fn configs_for(
        &self,
        entity_type: DirectoryObjectType,
    ) -> impl Iterator<Item = &ClaimTypeConfig> {
        self.items.iter().filter(move |c| c.entity_type == entity_type)
    }

    /// Config mapping the identity claim type of the trust.
    pub fn identity_config(&self) -> Option<&ClaimTypeConfig> {
        self.identity_index().map(|index| &self.items[index])
    }

    fn identity_index(&self) -> Option<usize> {
        match self.trust_identity_claim_type.as_deref() {
            Some(identity) => self
                .items
                .iter()
                .position(|c| c.has_claim_type() && same_text(&c.claim_type, identity)),
            None => self.items.iter().position(|c| c.is_identity()),
        }
    }

    /// The single group config that carries a claim type.
    pub fn main_group_config(&self) -> Option<&ClaimTypeConfig> {
        self.items
            .iter()
            .find(|c| c.entity_type == DirectoryObjectType::Group && c.has_claim_type())
    }

    /// An entry with the same key as `config` exists. Claim types and entity
    /// data keys compare case-insensitively, as the collection rules do.
    pub fn contains(&self, config: &ClaimTypeConfig) -> bool {
        self.position_of(config).is_some()
    }

    fn position_of(&self, config: &ClaimTypeConfig) -> Option<usize> {
        let key = config.key();
        self.items.iter().position(|c| same_key(&c.key(), &key))
    }

    fn is_identity_claim_type(&self, claim_type: &str) -> bool {
        !claim_type.is_empty()
            && self
                .trust_identity_claim_type
                .as_deref()
                .is_some_and(|identity| same_text(identity, claim_type))
    }

    /// Validate and append `item`.
    ///
    /// An entry whose claim type is the identity claim type of the trust is
    /// stored as the identity variant. Any other entry is stored as a standard
    /// one, so the collection holds at most one identity config.
    pub fn add(&mut self, item: ClaimTypeConfig) -> ConfigurationResult<()> {
        let item = self.normalize_identity(item);
        self.check_item(&item, None)?;
        debug!(
            target: LogCategory::Configuration.target(),
            "Adding claim type config for {} '{}' (claim type '{}')",
            item.entity_type, item.entity_property, item.claim_type
        );
        self.items.push(item);
        Ok(())
    }

    fn normalize_identity(&self, item: ClaimTypeConfig) -> ClaimTypeConfig {
        let is_identity_claim_type = match self.trust_identity_claim_type {
            Some(_) => self.is_identity_claim_type(&item.claim_type),
            // Unbound: the first identity entry keeps the role.
            None => item.is_identity() && !self.items.iter().any(|c| c.is_identity()),
        };
        match (item.is_identity(), is_identity_claim_type) {
            (false, true) => item.to_identity(DirectoryObjectProperty::Mail),
            (true, false) => {
                debug!(
                    target: LogCategory::Configuration.target(),
                    "Claim type '{}' is not the identity claim type, storing it as a standard entry",
                    item.claim_type
                );
                item.to_standard()
            }
            _ => item,
        }
    }

    /// Check `item` against every other entry. `skip` is the index of the entry
    /// `item` replaces, if any.
    fn check_item(&self, item: &ClaimTypeConfig, skip: Option<usize>) -> ConfigurationResult<()> {
        use ClaimTypeConfigRule as Rule;

        if !item.entity_property.is_set() {
            return Err(ConfigurationError::invalid_operation(
                Rule::EntityPropertySet,
                "Property EntityProperty is required",
            ));
        }

        if item.use_main_claim_type_of_directory_object && item.has_claim_type() {
            return Err(ConfigurationError::invalid_operation(
                Rule::MainClaimTypeWithoutClaimType,
                format!(
                    "No claim type should be set if UseMainClaimTypeOfDirectoryObject is set, but '{}' was given",
                    item.claim_type
                ),
            ));
        }

        if item.is_metadata_only() && !item.has_entity_data_key() {
            return Err(ConfigurationError::invalid_operation(
                Rule::MetadataRequiresEntityDataKey,
                "EntityDataKey is required if ClaimType is not set and UseMainClaimTypeOfDirectoryObject is not set",
            ));
        }

        let others = || {
            self.items
                .iter()
                .enumerate()
                .filter(move |(index, _)| Some(*index) != skip)
                .map(|(_, c)| c)
        };

        if item.has_entity_data_key()
            && others().any(|c| {
                c.entity_type == item.entity_type
                    && same_text(&c.entity_data_key, &item.entity_data_key)
            })
        {
            return Err(ConfigurationError::invalid_operation(
                Rule::UniqueEntityDataKey,
                format!(
                    "Entity data key '{}' already exists in the collection for the directory object {}",
                    item.entity_data_key, item.entity_type
                ),
            ));
        }

        if item.has_claim_type()
            && others().any(|c| c.has_claim_type() && same_text(&c.claim_type, &item.claim_type))
        {
            return Err(ConfigurationError::invalid_operation(
                Rule::UniqueClaimType,
                format!("Claim type '{}' already exists in the collection", item.claim_type),
            ));
        }

        if item.has_prefix_to_bypass_lookup()
            && others().any(|c| {
                c.has_prefix_to_bypass_lookup()
                    && same_text(&c.prefix_to_bypass_lookup, &item.prefix_to_bypass_lookup)
            })
        {
            return Err(ConfigurationError::invalid_operation(
                Rule::UniquePrefixToBypassLookup,
                format!(
                    "Prefix '{}' is already set with another claim type and must be unique",
                    item.prefix_to_bypass_lookup
                ),
            ));
        }

        if others().any(|c| {
            c.entity_property == item.entity_property && c.entity_type == item.entity_type
        }) {
            return Err(ConfigurationError::invalid_operation(
                Rule::UniqueEntityProperty,
                format!(
                    "An item with property '{}' already exists for the object type '{}'",
                    item.entity_property, item.entity_type
                ),
            ));
        }

        if item.entity_type == DirectoryObjectType::Group
            && item.has_claim_type()
            && others().any(|c| c.entity_type == DirectoryObjectType::Group && c.has_claim_type())
        {
            return Err(ConfigurationError::invalid_operation(
                Rule::SingleGroupClaimType,
                "A claim type for EntityType 'Group' already exists in the collection",
            ));
        }

        if self.is_identity_claim_type(&item.claim_type)
            && item.entity_type != DirectoryObjectType::User
        {
            return Err(ConfigurationError::invalid_operation(
                Rule::IdentityClaimTypeIsUser,
                format!(
                    "Claim type '{}' is the identity claim type of the trust and must have EntityType 'User'",
                    item.claim_type
                ),
            ));
        }

        Ok(())
    }

    /// Replace the entry whose claim type is `old_claim_type` with `new_item`.
    ///
    /// The replacement is applied to a copy of the collection which is then
    /// validated as a whole; the live collection changes only if that succeeds.
    pub fn update(
        &mut self,
        old_claim_type: &str,
        new_item: ClaimTypeConfig,
    ) -> ConfigurationResult<()> {
        if old_claim_type.is_empty() {
            return Err(ConfigurationError::UpdateRequiresClaimType);
        }

        let index = self
            .items
            .iter()
            .position(|c| c.has_claim_type() && same_text(&c.claim_type, old_claim_type))
            .ok_or_else(|| ConfigurationError::ClaimTypeNotFound {
                claim_type: old_claim_type.to_string(),
            })?;

        let existing = &self.items[index];
        let new_item = if self.is_identity_claim_type(&existing.claim_type) {
            if !same_text(&new_item.claim_type, &existing.claim_type)
                || new_item.entity_type != DirectoryObjectType::User
            {
                return Err(ConfigurationError::invalid_operation(
                    ClaimTypeConfigRule::IdentityClaimTypeImmutable,
                    format!(
                        "Claim type '{}' is the identity claim type: it cannot be renamed and must keep EntityType 'User'",
                        existing.claim_type
                    ),
                ));
            }
            match new_item.kind {
                ClaimTypeConfigKind::Identity { .. } => new_item,
                ClaimTypeConfigKind::Standard => {
                    let guest = existing
                        .property_for_guest_users()
                        .unwrap_or(DirectoryObjectProperty::Mail);
                    new_item.to_identity(guest)
                }
            }
        } else {
            new_item
        };

        let mut trial_items = self.items.clone();
        trial_items[index] = new_item;
        let trial = Self::from_configs(trial_items, self.trust_identity_claim_type.clone())?;

        info!(
            target: LogCategory::Configuration.target(),
            "Updated claim type config '{}'", old_claim_type
        );
        self.items = trial.items;
        Ok(())
    }

    /// Remove the entry whose claim type is `claim_type`.
    ///
    /// Returns `Ok(false)` when no entry has this claim type.
    pub fn remove(&mut self, claim_type: &str) -> ConfigurationResult<bool> {
        if claim_type.is_empty() {
            return Ok(false);
        }
        let Some(index) = self
            .items
            .iter()
            .position(|c| c.has_claim_type() && same_text(&c.claim_type, claim_type))
        else {
            return Ok(false);
        };
        self.remove_at(index).map(|_| true)
    }

    /// Remove the entry with the same key as `item`.
    pub fn remove_config(&mut self, item: &ClaimTypeConfig) -> ConfigurationResult<bool> {
        let Some(index) = self.position_of(item) else {
            return Ok(false);
        };
        self.remove_at(index).map(|_| true)
    }

    fn remove_at(&mut self, index: usize) -> ConfigurationResult<ClaimTypeConfig> {
        let item = &self.items[index];
        if self.is_identity_claim_type(&item.claim_type) {
            return Err(ConfigurationError::IdentityClaimTypeProtected {
                claim_type: item.claim_type.clone(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Change the property the identity config queries.
    ///
    /// Any other user entry already querying `new_property` is removed first,
    /// otherwise the property uniqueness rule would reject the change. Returns
    /// `Ok(false)` if the identity config already uses `new_property`.
    pub fn update_user_identifier(
        &mut self,
        new_property: DirectoryObjectProperty,
    ) -> ConfigurationResult<bool> {
        let identity_index = self
            .identity_index()
            .ok_or_else(|| ConfigurationError::invalid("No identity claim type is configured"))?;
        self.replace_identifier(identity_index, new_property)
    }

    /// Change the property the main group config queries, with the same
    /// reconciliation as [`update_user_identifier`](Self::update_user_identifier).
    pub fn update_group_identifier(
        &mut self,
        new_property: DirectoryObjectProperty,
    ) -> ConfigurationResult<bool> {
        let group_index = self
            .items
            .iter()
            .position(|c| c.entity_type == DirectoryObjectType::Group && c.has_claim_type())
            .ok_or_else(|| ConfigurationError::invalid("No group claim type is configured"))?;
        self.replace_identifier(group_index, new_property)
    }

    fn replace_identifier(
        &mut self,
        index: usize,
        new_property: DirectoryObjectProperty,
    ) -> ConfigurationResult<bool> {
        if !new_property.is_set() {
            return Err(ConfigurationError::invalid_operation(
                ClaimTypeConfigRule::EntityPropertySet,
                "Property EntityProperty is required",
            ));
        }
        let target = &self.items[index];
        if target.entity_property == new_property {
            return Ok(false);
        }
        let entity_type = target.entity_type;

        let mut trial_items: Vec<ClaimTypeConfig> = Vec::with_capacity(self.items.len());
        for (i, item) in self.items.iter().enumerate() {
            if i == index {
                let mut updated = item.clone();
                updated.entity_property = new_property;
                trial_items.push(updated);
            } else if item.entity_type == entity_type && item.entity_property == new_property {
                debug!(
                    target: LogCategory::Configuration.target(),
                    "Removing {} config on '{}' replaced by the main identifier",
                    entity_type, new_property
                );
            } else {
                trial_items.push(item.clone());
            }
        }

        let trial = Self::from_configs(trial_items, self.trust_identity_claim_type.clone())?;
        self.items = trial.items;
        Ok(true)
    }

    /// Change the property substituted for guest accounts on the identity config.
    pub fn update_identifier_for_guest_users(
        &mut self,
        new_property: DirectoryObjectProperty,
    ) -> ConfigurationResult<()> {
        if !new_property.is_set() {
            return Err(ConfigurationError::invalid_operation(
                ClaimTypeConfigRule::EntityPropertySet,
                "Property DirectoryObjectPropertyForGuestUsers is required",
            ));
        }
        let index = self
            .identity_index()
            .ok_or_else(|| ConfigurationError::invalid("No identity claim type is configured"))?;
        let updated = self.items[index].to_identity(new_property);
        self.items[index] = updated;
        Ok(())
    }

    /// Set the exact-match search behavior of the entry with `claim_type`.
    pub fn set_search_behavior(
        &mut self,
        claim_type: &str,
        exact_match_only: bool,
    ) -> ConfigurationResult<()> {
        let item = self
            .items
            .iter_mut()
            .find(|c| c.has_claim_type() && same_text(&c.claim_type, claim_type))
            .ok_or_else(|| ConfigurationError::ClaimTypeNotFound {
                claim_type: claim_type.to_string(),
            })?;
        item.filter_exact_match_only = exact_match_only;
        Ok(())
    }

    /// Replace every entry with the default mapping rules of the bound trust.
    pub fn reset(&mut self) {
        let identity_claim_type = self
            .trust_identity_claim_type
            .clone()
            .or_else(|| {
                self.identity_config()
                    .filter(|c| c.has_claim_type())
                    .map(|c| c.claim_type.clone())
            })
            .unwrap_or_else(|| claim_types::UPN.to_string());
        info!(
            target: LogCategory::Configuration.target(),
            "Resetting claim type configs to the defaults of '{}'", identity_claim_type
        );
        self.items = Self::default_for_trust(&identity_claim_type).items;
    }
}

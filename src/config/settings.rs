//! Persisted provider configuration and the runtime snapshot derived from it.
//!
//! [`EntityProviderConfig`] is what the configuration store keeps. Before it is
//! used by a request it is cross-checked against the trust and turned into a
//! [`SettingsSnapshot`]: an immutable value tagged with the version it was
//! built from.

use super::claim_type_config::ClaimTypeConfig;
use super::collection::ClaimTypeConfigCollection;
use super::property::DirectoryObjectType;
use super::tenant::EntraIdTenant;
use crate::claims::TrustedLoginProvider;
use crate::error::{ConfigurationError, ConfigurationResult};
use crate::logging::LogCategory;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Default timeout of directory requests, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Global configuration of a claims provider, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProviderConfig {
    pub id: Uuid,
    pub name: String,
    /// Incremented by the store on every successful update.
    #[serde(default)]
    pub version: u64,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub tenants: Vec<EntraIdTenant>,
    pub claim_types: ClaimTypeConfigCollection,
    /// Create permissions from the raw input without querying the directory.
    #[serde(default)]
    pub always_resolve_user_input: bool,
    #[serde(default)]
    pub filter_exact_match_only: bool,
    #[serde(default)]
    pub enable_augmentation: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Text prepended to the display text of every entity.
    #[serde(default)]
    pub entity_display_text_prefix: String,
    #[serde(default)]
    pub filter_security_enabled_groups_only: bool,
    #[serde(default)]
    pub proxy_address: String,
    /// Names of the tenants searches are restricted to; empty means all.
    #[serde(default)]
    pub restrict_search_to_tenants: Vec<String>,
}

impl EntityProviderConfig {
    /// Configuration with the default claim types for `trust`.
    pub fn default_configuration(name: impl Into<String>, trust: &TrustedLoginProvider) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            version: 0,
            last_modified: Utc::now(),
            tenants: Vec::new(),
            claim_types: ClaimTypeConfigCollection::default_for_trust(&trust.identity_claim_type),
            always_resolve_user_input: false,
            filter_exact_match_only: false,
            enable_augmentation: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            entity_display_text_prefix: String::new(),
            filter_security_enabled_groups_only: false,
            proxy_address: String::new(),
            restrict_search_to_tenants: Vec::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Update the last modified timestamp and increment version.
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
        self.version += 1;
    }

    /// Parse a configuration from JSON and re-import tenant certificates.
    pub fn from_json(json: &str) -> ConfigurationResult<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.after_load();
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigurationResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore runtime-only state after deserialization.
    pub fn after_load(&mut self) {
        for tenant in &mut self.tenants {
            tenant.import_certificate();
        }
    }

    /// Check the parts of the configuration that do not depend on the trust.
    pub fn validate(&self) -> ConfigurationResult<()> {
        if self.timeout_ms == 0 {
            return Err(ConfigurationError::invalid("Timeout must be greater than 0"));
        }
        let mut names = std::collections::HashSet::new();
        for tenant in &self.tenants {
            tenant.validate()?;
            if !names.insert(tenant.name.to_ascii_lowercase()) {
                return Err(ConfigurationError::invalid(format!(
                    "Duplicate tenant: {}",
                    tenant.name
                )));
            }
        }
        Ok(())
    }

    /// Tenants searched by requests.
    pub fn search_tenants(&self) -> impl Iterator<Item = &EntraIdTenant> {
        self.tenants.iter().filter(|t| {
            self.restrict_search_to_tenants.is_empty()
                || self
                    .restrict_search_to_tenants
                    .iter()
                    .any(|n| n.eq_ignore_ascii_case(&t.name))
        })
    }
}

/// Validated, read-only view of the configuration used by requests.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    version: u64,
    config: EntityProviderConfig,
    runtime_claim_types: Vec<ClaimTypeConfig>,
    identity_claim_type_config: ClaimTypeConfig,
    main_group_claim_type_config: Option<ClaimTypeConfig>,
    runtime_metadata_config: Vec<ClaimTypeConfig>,
}

impl SettingsSnapshot {
    /// Derive the runtime snapshot of `config` for `trust`.
    ///
    /// Only configs whose claim type is registered in the trust are kept, along
    /// with metadata and lookup configs of object types whose main config was
    /// kept. Fails if nothing usable remains or if the identity claim type of
    /// the trust has no config.
    pub fn build(
        config: &EntityProviderConfig,
        trust: &TrustedLoginProvider,
    ) -> ConfigurationResult<Self> {
        let collection = &config.claim_types;
        if collection.is_empty() {
            return Err(ConfigurationError::invalid("No claim type is configured"));
        }

        let Some(identity) = collection
            .get_by_claim_type(&trust.identity_claim_type)
            .filter(|c| c.entity_type == DirectoryObjectType::User)
        else {
            error!(
                target: LogCategory::Core.target(),
                "Identity claim type '{}' of trust '{}' has no claim type config",
                trust.identity_claim_type, trust.name
            );
            return Err(ConfigurationError::invalid(format!(
                "Identity claim type '{}' of trust '{}' is not configured",
                trust.identity_claim_type, trust.name
            )));
        };
        let identity = if identity.is_identity() {
            identity.clone()
        } else {
            identity.to_identity(super::DirectoryObjectProperty::Mail)
        };

        let main_group = collection
            .main_group_config()
            .filter(|c| trust.is_registered(&c.claim_type))
            .cloned();

        let mut runtime_claim_types = Vec::with_capacity(collection.len());
        for item in collection {
            if item.has_claim_type() {
                if item.claim_type.eq_ignore_ascii_case(&identity.claim_type) {
                    runtime_claim_types.push(identity.clone());
                } else if trust.is_registered(&item.claim_type) {
                    // Guest substitution belongs to the identity claim type only.
                    runtime_claim_types.push(item.to_standard());
                } else {
                    warn!(
                        target: LogCategory::Core.target(),
                        "Claim type '{}' is not registered in trust '{}' and is ignored",
                        item.claim_type, trust.name
                    );
                }
                continue;
            }
            let main_kept = match item.entity_type {
                DirectoryObjectType::User => true,
                DirectoryObjectType::Group => main_group.is_some(),
            };
            if main_kept {
                runtime_claim_types.push(item.to_standard());
            }
        }

        let runtime_metadata_config = runtime_claim_types
            .iter()
            .filter(|c| c.has_entity_data_key())
            .cloned()
            .collect();

        debug!(
            target: LogCategory::Core.target(),
            "Built settings snapshot version {} with {} runtime claim types",
            config.version,
            runtime_claim_types.len()
        );

        Ok(Self {
            version: config.version,
            config: config.clone(),
            runtime_claim_types,
            identity_claim_type_config: identity,
            main_group_claim_type_config: main_group,
            runtime_metadata_config,
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &EntityProviderConfig {
        &self.config
    }

    pub fn runtime_claim_types(&self) -> &[ClaimTypeConfig] {
        &self.runtime_claim_types
    }

    pub fn identity_claim_type_config(&self) -> &ClaimTypeConfig {
        &self.identity_claim_type_config
    }

    pub fn main_group_claim_type_config(&self) -> Option<&ClaimTypeConfig> {
        self.main_group_claim_type_config.as_ref()
    }

    pub fn runtime_metadata_config(&self) -> &[ClaimTypeConfig] {
        &self.runtime_metadata_config
    }

    /// Main config of `entity_type` objects: identity for users, main group for groups.
    pub fn main_config_for(&self, entity_type: DirectoryObjectType) -> Option<&ClaimTypeConfig> {
        match entity_type {
            DirectoryObjectType::User => Some(&self.identity_claim_type_config),
            DirectoryObjectType::Group => self.main_group_claim_type_config.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DirectoryObjectProperty, claim_types};

    fn trust() -> TrustedLoginProvider {
        TrustedLoginProvider::new("Entra", claim_types::UPN, [claim_types::GROUPS])
    }

    #[test]
    fn test_snapshot_from_default_configuration() {
        let config = EntityProviderConfig::default_configuration("EntraCP", &trust());
        let snapshot = SettingsSnapshot::build(&config, &trust()).unwrap();

        assert_eq!(snapshot.identity_claim_type_config().claim_type, claim_types::UPN);
        assert!(snapshot.identity_claim_type_config().is_identity());
        assert_eq!(
            snapshot.main_group_claim_type_config().unwrap().claim_type,
            claim_types::GROUPS
        );
        assert_eq!(snapshot.runtime_claim_types().len(), config.claim_types.len());
        assert!(snapshot
            .runtime_metadata_config()
            .iter()
            .all(|c| c.has_entity_data_key()));
    }

    #[test]
    fn test_unregistered_claim_types_are_dropped() {
        let trust = TrustedLoginProvider::new("Entra", claim_types::UPN, Vec::<String>::new());
        let config = EntityProviderConfig::default_configuration("EntraCP", &trust);
        let snapshot = SettingsSnapshot::build(&config, &trust).unwrap();

        assert!(snapshot.main_group_claim_type_config().is_none());
        assert!(snapshot
            .runtime_claim_types()
            .iter()
            .all(|c| c.entity_type == DirectoryObjectType::User));
    }

    #[test]
    fn test_missing_identity_config_fails() {
        let config = EntityProviderConfig::default_configuration("EntraCP", &trust());
        let other_trust = TrustedLoginProvider::new("Entra", claim_types::EMAIL, [claim_types::GROUPS]);
        assert!(matches!(
            SettingsSnapshot::build(&config, &other_trust),
            Err(ConfigurationError::Invalid { .. })
        ));
    }

    #[test]
    fn test_only_identity_claim_type_substitutes_guest_property() {
        let trust = TrustedLoginProvider::new("Entra", claim_types::UPN, [claim_types::EMAIL]);
        let mut config = EntityProviderConfig::default_configuration("EntraCP", &trust);
        let email = ClaimTypeConfig::identity(
            claim_types::EMAIL,
            DirectoryObjectProperty::OtherMails,
            DirectoryObjectProperty::Mail,
        );
        let upn = ClaimTypeConfig::builder(
            DirectoryObjectType::User,
            DirectoryObjectProperty::UserPrincipalName,
        )
        .claim_type(claim_types::UPN)
        .build();
        config.claim_types = ClaimTypeConfigCollection::from_configs([email, upn], None).unwrap();

        let snapshot = SettingsSnapshot::build(&config, &trust).unwrap();
        let identities: Vec<&str> = snapshot
            .runtime_claim_types()
            .iter()
            .filter(|c| c.is_identity())
            .map(|c| c.claim_type.as_str())
            .collect();
        assert_eq!(identities, vec![claim_types::UPN]);
    }

    #[test]
    fn test_empty_claim_types_fail() {
        let mut config = EntityProviderConfig::default_configuration("EntraCP", &trust());
        config.claim_types = ClaimTypeConfigCollection::new(None);
        assert!(SettingsSnapshot::build(&config, &trust()).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EntityProviderConfig::default_configuration("EntraCP", &trust());
        config.tenants.push(EntraIdTenant::with_client_secret(
            "contoso.onmicrosoft.com",
            "app",
            "secret",
        ));
        let json = config.to_json().unwrap();
        let parsed = EntityProviderConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(
            parsed.claim_types.identity_config().unwrap().entity_property,
            DirectoryObjectProperty::UserPrincipalName
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_tenants() {
        let mut config = EntityProviderConfig::default_configuration("EntraCP", &trust());
        for _ in 0..2 {
            config.tenants.push(EntraIdTenant::with_client_secret(
                "contoso.onmicrosoft.com",
                "app",
                "secret",
            ));
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_tenants_restriction() {
        let mut config = EntityProviderConfig::default_configuration("EntraCP", &trust());
        config.tenants.push(EntraIdTenant::with_client_secret("a.onmicrosoft.com", "app", "s"));
        config.tenants.push(EntraIdTenant::with_client_secret("b.onmicrosoft.com", "app", "s"));
        assert_eq!(config.search_tenants().count(), 2);
        config.restrict_search_to_tenants = vec!["B.onmicrosoft.com".into()];
        let names: Vec<_> = config.search_tenants().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b.onmicrosoft.com"]);
    }
}

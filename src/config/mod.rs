//! Claims provider configuration.
//!
//! # Core Components
//!
//! - [`ClaimTypeConfig`] - one mapping rule between a directory property and a claim type
//! - [`ClaimTypeConfigCollection`] - the invariant-checked registry of mapping rules
//! - [`EntityProviderConfig`] - the persisted global configuration
//! - [`SettingsSnapshot`] - the validated runtime view used by requests
//! - [`ConfigurationStore`] - versioned persistence boundary
//! - [`EntraIdTenant`] - one directory endpoint with its credentials

pub mod claim_type_config;
pub mod collection;
pub mod property;
pub mod settings;
pub mod store;
pub mod tenant;

pub use claim_type_config::{
    CLAIM_VALUE_TYPE_STRING, ClaimTypeConfig, ClaimTypeConfigBuilder, ClaimTypeConfigKey,
    ClaimTypeConfigKind,
};
pub use collection::{ClaimTypeConfigCollection, claim_types};
pub use property::{
    DirectoryObjectProperty, DirectoryObjectType, entity_data_keys, sharepoint_entity_types,
};
pub use settings::{DEFAULT_TIMEOUT_MS, EntityProviderConfig, SettingsSnapshot};
pub use store::{ConfigurationStore, InMemoryConfigurationStore};
pub use tenant::{
    CertificateCredential, CloudInstance, CredentialKind, EntraIdTenant, ImportedCertificate,
    TenantClient, TenantCredentials,
};

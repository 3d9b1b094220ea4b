//! Claims provider for SharePoint trusts backed by Microsoft Entra ID.
//!
//! Resolves people picker input into permissions, validates existing
//! permissions and adds group claims to users at sign-in. Users and groups
//! are looked up through a pluggable directory; the mapping from directory
//! properties to claim types is a validated, versioned configuration.
//!
//! # Core Components
//!
//! - [`EntraClaimsProvider`] - Front end serving search, validation and augmentation
//! - [`ClaimTypeConfigCollection`](config::ClaimTypeConfigCollection) - Validated claim type mappings
//! - [`ConfigurationStore`](config::ConfigurationStore) - Versioned configuration persistence
//! - [`DirectoryProvider`](directory::DirectoryProvider) - Trait for directory backends
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use entra_claims::EntraClaimsProvider;
//! use entra_claims::claims::TrustedLoginProvider;
//! use entra_claims::config::{ConfigurationStore, DirectoryObjectType, EntityProviderConfig, InMemoryConfigurationStore, claim_types};
//! use entra_claims::directory::{DirectoryUser, InMemoryDirectory};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let trust = TrustedLoginProvider::new("Entra", claim_types::UPN, [claim_types::GROUPS]);
//! let store = Arc::new(InMemoryConfigurationStore::new());
//! let config = store
//!     .create(EntityProviderConfig::default_configuration("EntraCP", &trust))
//!     .await?;
//!
//! let directory = InMemoryDirectory::new();
//! directory
//!     .add_object("contoso.onmicrosoft.com", DirectoryUser::new("1", "john@contoso.com"))
//!     .await;
//!
//! let provider = EntraClaimsProvider::new("EntraCP", trust, store, config.id, directory);
//! let results = provider
//!     .search("john", &[DirectoryObjectType::User], None)
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod claims;
pub mod claims_provider;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod operation;
pub mod resolution;

// Re-export commonly used types for convenience
pub use claims::{Claim, HierarchyNode, PickerEntity, SearchResults, TrustedLoginProvider};
pub use claims_provider::EntraClaimsProvider;
pub use config::{
    ClaimTypeConfig, ClaimTypeConfigCollection, DirectoryObjectProperty, DirectoryObjectType,
    EntityProviderConfig, SettingsSnapshot,
};
pub use error::{ClaimsProviderError, ClaimsProviderResult, ConfigurationError};
pub use operation::{OperationContext, OperationRequest, OperationType};

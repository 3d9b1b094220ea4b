//! Versioned persistence of provider configurations.
//!
//! The store is an opaque object store keyed by configuration id. Every
//! successful update bumps the version; a writer holding a stale copy gets
//! [`ConfigurationError::VersionMismatch`]. Each front end keeps its own
//! snapshot and compares versions to decide whether to rebuild it.
//!
//! # Example Usage
//!
//! ```rust
//! use entra_claims::claims::TrustedLoginProvider;
//! use entra_claims::config::{ConfigurationStore, EntityProviderConfig, InMemoryConfigurationStore, claim_types};
//!
//! # async fn example() -> Result<(), entra_claims::error::ConfigurationError> {
//! let trust = TrustedLoginProvider::new("Entra", claim_types::UPN, [claim_types::GROUPS]);
//! let store = InMemoryConfigurationStore::new();
//!
//! let created = store.create(EntityProviderConfig::default_configuration("EntraCP", &trust)).await?;
//! assert_eq!(created.version, 1);
//!
//! let mut edited = created.clone();
//! edited.always_resolve_user_input = true;
//! let new_version = store.update(edited).await?;
//! assert_eq!(new_version, 2);
//!
//! // The first copy is now stale.
//! assert!(store.update(created).await.is_err());
//! # Ok(())
//! # }
//! ```

use super::settings::EntityProviderConfig;
use crate::error::{ConfigurationError, ConfigurationResult};
use crate::logging::LogCategory;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistence boundary for [`EntityProviderConfig`].
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Current configuration, or `None` if it does not exist.
    async fn get(&self, id: Uuid) -> ConfigurationResult<Option<EntityProviderConfig>>;

    /// Version of the stored configuration, without copying it.
    async fn current_version(&self, id: Uuid) -> ConfigurationResult<Option<u64>>;

    /// Store a new configuration; its version starts at 1.
    async fn create(
        &self,
        configuration: EntityProviderConfig,
    ) -> ConfigurationResult<EntityProviderConfig>;

    /// Replace a configuration if `configuration.version` is the stored one.
    /// Returns the new version.
    async fn update(&self, configuration: EntityProviderConfig) -> ConfigurationResult<u64>;

    /// Delete a configuration, optionally checking its version first.
    async fn delete(&self, id: Uuid, expected_version: Option<u64>) -> ConfigurationResult<()>;
}

/// Thread-safe in-memory store with optional JSON file persistence.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigurationStore {
    configurations: Arc<RwLock<HashMap<Uuid, EntityProviderConfig>>>,
    persistence_file: Option<PathBuf>,
}

impl InMemoryConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that mirrors its content to `file_path`.
    pub fn with_persistence<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            configurations: Arc::new(RwLock::new(HashMap::new())),
            persistence_file: Some(file_path.as_ref().to_path_buf()),
        }
    }

    fn persistence_file(&self) -> ConfigurationResult<&Path> {
        self.persistence_file
            .as_deref()
            .ok_or_else(|| ConfigurationError::invalid("Persistence is not enabled"))
    }

    /// Load configurations from the persistence file. Returns how many were loaded.
    pub async fn load_from_file(&self) -> ConfigurationResult<usize> {
        let file_path = self.persistence_file()?;
        if !fs::try_exists(file_path).await.unwrap_or(false) {
            return Ok(0);
        }

        let content = fs::read_to_string(file_path).await?;
        let stored: Vec<EntityProviderConfig> = serde_json::from_str(&content)?;

        let mut configurations = self.configurations.write().await;
        let count = stored.len();
        for mut configuration in stored {
            configuration.after_load();
            configurations.insert(configuration.id, configuration);
        }
        info!(
            target: LogCategory::Configuration.target(),
            "Loaded {} configuration(s) from {}",
            count,
            file_path.display()
        );
        Ok(count)
    }

    /// Save configurations to the persistence file. Returns how many were saved.
    pub async fn save_to_file(&self) -> ConfigurationResult<usize> {
        let file_path = self.persistence_file()?;
        let configurations = self.configurations.read().await;
        let configs: Vec<&EntityProviderConfig> = configurations.values().collect();
        let count = configs.len();
        let content = serde_json::to_string_pretty(&configs)?;
        fs::write(file_path, content).await?;
        Ok(count)
    }

    async fn auto_save(&self) {
        if self.persistence_file.is_some() {
            if let Err(e) = self.save_to_file().await {
                warn!(
                    target: LogCategory::Configuration.target(),
                    "Failed to persist configurations: {}", e
                );
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.configurations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.configurations.read().await.is_empty()
    }
}

#[async_trait]
impl ConfigurationStore for InMemoryConfigurationStore {
    async fn get(&self, id: Uuid) -> ConfigurationResult<Option<EntityProviderConfig>> {
        Ok(self.configurations.read().await.get(&id).cloned())
    }

    async fn current_version(&self, id: Uuid) -> ConfigurationResult<Option<u64>> {
        Ok(self.configurations.read().await.get(&id).map(|c| c.version))
    }

    async fn create(
        &self,
        mut configuration: EntityProviderConfig,
    ) -> ConfigurationResult<EntityProviderConfig> {
        configuration.validate()?;

        let mut configurations = self.configurations.write().await;
        if configurations.contains_key(&configuration.id) {
            return Err(ConfigurationError::AlreadyExists {
                id: configuration.id.to_string(),
            });
        }

        configuration.last_modified = Utc::now();
        configuration.version = 1;
        configurations.insert(configuration.id, configuration.clone());
        drop(configurations);

        debug!(
            target: LogCategory::Configuration.target(),
            "Created configuration '{}' ({})", configuration.name, configuration.id
        );
        self.auto_save().await;
        Ok(configuration)
    }

    async fn update(&self, mut configuration: EntityProviderConfig) -> ConfigurationResult<u64> {
        configuration.validate()?;

        let mut configurations = self.configurations.write().await;
        let existing = configurations.get(&configuration.id).ok_or_else(|| {
            ConfigurationError::NotFound {
                id: configuration.id.to_string(),
            }
        })?;

        if configuration.version != existing.version {
            return Err(ConfigurationError::VersionMismatch {
                expected: existing.version,
                actual: configuration.version,
            });
        }

        configuration.touch();
        let version = configuration.version;
        configurations.insert(configuration.id, configuration);
        drop(configurations);

        info!(
            target: LogCategory::Configuration.target(),
            "Configuration updated to version {}", version
        );
        self.auto_save().await;
        Ok(version)
    }

    async fn delete(&self, id: Uuid, expected_version: Option<u64>) -> ConfigurationResult<()> {
        let mut configurations = self.configurations.write().await;
        let existing = configurations
            .get(&id)
            .ok_or_else(|| ConfigurationError::NotFound { id: id.to_string() })?;

        if let Some(expected) = expected_version {
            if existing.version != expected {
                return Err(ConfigurationError::VersionMismatch {
                    expected,
                    actual: existing.version,
                });
            }
        }

        configurations.remove(&id);
        drop(configurations);
        self.auto_save().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::TrustedLoginProvider;
    use crate::config::claim_types;

    fn configuration() -> EntityProviderConfig {
        let trust = TrustedLoginProvider::new("Entra", claim_types::UPN, [claim_types::GROUPS]);
        EntityProviderConfig::default_configuration("EntraCP", &trust)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryConfigurationStore::new();
        let created = store.create(configuration()).await.unwrap();
        assert_eq!(created.version, 1);

        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(store.current_version(created.id).await.unwrap(), Some(1));
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let store = InMemoryConfigurationStore::new();
        let created = store.create(configuration()).await.unwrap();
        assert!(matches!(
            store.create(created).await,
            Err(ConfigurationError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_checks_version() {
        let store = InMemoryConfigurationStore::new();
        let created = store.create(configuration()).await.unwrap();

        let mut first = created.clone();
        first.enable_augmentation = false;
        assert_eq!(store.update(first).await.unwrap(), 2);

        let result = store.update(created).await;
        assert!(matches!(
            result,
            Err(ConfigurationError::VersionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryConfigurationStore::new();
        let created = store.create(configuration()).await.unwrap();
        assert!(store.delete(created.id, Some(5)).await.is_err());
        store.delete(created.id, Some(1)).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.delete(created.id, None).await,
            Err(ConfigurationError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_persistence() {
        let path = std::env::temp_dir().join(format!("entra-claims-{}.json", Uuid::new_v4()));
        let store = InMemoryConfigurationStore::with_persistence(&path);
        let created = store.create(configuration()).await.unwrap();

        let reloaded = InMemoryConfigurationStore::with_persistence(&path);
        assert_eq!(reloaded.load_from_file().await.unwrap(), 1);
        assert_eq!(reloaded.get(created.id).await.unwrap(), Some(created));

        let _ = std::fs::remove_file(&path);
    }

    proptest::proptest! {
        #[test]
        fn prop_each_update_bumps_version(updates in 1u64..12) {
            tokio_test::block_on(async {
                let store = InMemoryConfigurationStore::new();
                let mut current = store.create(configuration()).await.unwrap();
                for expected in 2..=updates + 1 {
                    current.timeout_ms += 1;
                    let version = store.update(current.clone()).await.unwrap();
                    assert_eq!(version, expected);
                    current = store.get(current.id).await.unwrap().unwrap();
                }
                assert_eq!(store.current_version(current.id).await.unwrap(), Some(updates + 1));
            });
        }
    }

    #[tokio::test]
    async fn test_persistence_disabled() {
        let store = InMemoryConfigurationStore::new();
        assert!(store.save_to_file().await.is_err());
    }
}

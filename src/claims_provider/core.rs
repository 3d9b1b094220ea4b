//! Core claims provider structure and settings refresh.

use crate::claims::TrustedLoginProvider;
use crate::config::{ConfigurationStore, EntityProviderConfig, SettingsSnapshot};
use crate::directory::DirectoryProvider;
use crate::error::{ClaimsProviderError, ClaimsProviderResult, DirectoryError};
use crate::logging::LogCategory;
use crate::operation::OperationContext;
use crate::resolution::{ResolvedEntity, process_directory_results, resolve_without_lookup};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Claims provider bound to one trust and one stored configuration.
///
/// Requests run against a [`SettingsSnapshot`] held behind a read-write lock.
/// Each request first compares the snapshot version with the stored one and
/// rebuilds the snapshot under the write lock when it changed; the rest of
/// the request holds the read lock, so a rebuild waits for requests in flight.
///
/// # Type Parameters
///
/// * `D` - The directory queried for users and groups
///
/// # Examples
///
/// ```rust
/// use entra_claims::EntraClaimsProvider;
/// use entra_claims::claims::TrustedLoginProvider;
/// use entra_claims::config::{ConfigurationStore, EntityProviderConfig, InMemoryConfigurationStore, claim_types};
/// use entra_claims::directory::InMemoryDirectory;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let trust = TrustedLoginProvider::new("Entra", claim_types::UPN, [claim_types::GROUPS]);
/// let store = Arc::new(InMemoryConfigurationStore::new());
/// let config = store
///     .create(EntityProviderConfig::default_configuration("EntraCP", &trust))
///     .await?;
///
/// let provider = EntraClaimsProvider::new("EntraCP", trust, store, config.id, InMemoryDirectory::new());
/// assert!(provider.refresh_settings().await);
/// # Ok(())
/// # }
/// ```
pub struct EntraClaimsProvider<D> {
    pub(super) name: String,
    pub(super) trust: TrustedLoginProvider,
    pub(super) configuration_id: Uuid,
    pub(super) store: Arc<dyn ConfigurationStore>,
    pub(super) directory: D,
    pub(super) settings: RwLock<Option<SettingsSnapshot>>,
}

impl<D: DirectoryProvider> EntraClaimsProvider<D> {
    pub fn new(
        name: impl Into<String>,
        trust: TrustedLoginProvider,
        store: Arc<dyn ConfigurationStore>,
        configuration_id: Uuid,
        directory: D,
    ) -> Self {
        Self {
            name: name.into(),
            trust,
            configuration_id,
            store,
            directory,
            settings: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trust(&self) -> &TrustedLoginProvider {
        &self.trust
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn configuration_id(&self) -> Uuid {
        self.configuration_id
    }

    /// Version of the loaded snapshot, if any.
    pub async fn settings_version(&self) -> Option<u64> {
        self.settings.read().await.as_ref().map(SettingsSnapshot::version)
    }

    /// Make sure the snapshot matches the stored configuration.
    ///
    /// Returns whether a usable snapshot is loaded. A missing configuration,
    /// or one that fails to build, leaves no snapshot, so requests return
    /// nothing until the configuration is fixed. Store errors keep the
    /// current snapshot.
    pub async fn refresh_settings(&self) -> bool {
        let stored_version = match self.store.current_version(self.configuration_id).await {
            Ok(Some(version)) => version,
            Ok(None) => {
                error!(
                    target: LogCategory::Core.target(),
                    "Configuration {} of claims provider '{}' was not found",
                    self.configuration_id, self.name
                );
                *self.settings.write().await = None;
                return false;
            }
            Err(e) => {
                warn!(
                    target: LogCategory::Core.target(),
                    "Unable to read the configuration version of '{}': {}", self.name, e
                );
                return self.settings.read().await.is_some();
            }
        };

        {
            let settings = self.settings.read().await;
            if settings.as_ref().is_some_and(|s| s.version() == stored_version) {
                return true;
            }
        }

        let mut settings = self.settings.write().await;
        // another request may have refreshed while we waited
        if settings.as_ref().is_some_and(|s| s.version() == stored_version) {
            return true;
        }

        // A store that cannot be read keeps the current snapshot; the next
        // request tries again.
        let config = match self.store.get(self.configuration_id).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                error!(
                    target: LogCategory::Core.target(),
                    "{}", ClaimsProviderError::NotConfigured(self.name.clone())
                );
                *settings = None;
                return false;
            }
            Err(e) => {
                warn!(
                    target: LogCategory::Core.target(),
                    "Unable to read the configuration of '{}', keeping version {:?}: {}",
                    self.name,
                    settings.as_ref().map(SettingsSnapshot::version),
                    e
                );
                return settings.is_some();
            }
        };

        match self.build_settings(config) {
            Ok(snapshot) => {
                info!(
                    target: LogCategory::Core.target(),
                    "Claims provider '{}' uses configuration version {}",
                    self.name,
                    snapshot.version()
                );
                *settings = Some(snapshot);
                true
            }
            Err(e) => {
                error!(
                    target: LogCategory::Core.target(),
                    "Claims provider '{}' cannot use its configuration: {}", self.name, e
                );
                *settings = None;
                false
            }
        }
    }

    fn build_settings(
        &self,
        mut config: EntityProviderConfig,
    ) -> ClaimsProviderResult<SettingsSnapshot> {
        config.validate()?;
        config
            .claim_types
            .set_trust_identity_claim_type(self.trust.identity_claim_type.clone())?;

        let timeout = config.timeout();
        let proxy = config.proxy_address.clone();
        for tenant in &mut config.tenants {
            if !tenant.initialize_authentication(timeout, Some(&proxy), false) {
                warn!(
                    target: LogCategory::Core.target(),
                    "Tenant '{}' is skipped: authentication could not be initialized",
                    tenant.name
                );
            }
        }

        Ok(SettingsSnapshot::build(&config, &self.trust)?)
    }

    /// Permissions for `context`, from the input alone or from the directory.
    pub(super) async fn resolve_entities(
        &self,
        context: &OperationContext,
        settings: &SettingsSnapshot,
    ) -> Vec<ResolvedEntity> {
        if let Some(entities) = resolve_without_lookup(context, settings) {
            return entities;
        }

        let started = Instant::now();
        let call = self.directory.search_or_validate_entities(context);
        let objects = match tokio::time::timeout(context.timeout, call).await {
            Ok(Ok(objects)) => objects,
            Ok(Err(e)) => {
                error!(
                    target: LogCategory::Lookup.target(),
                    "[{}] Directory query for '{}' failed: {}", context.request_id, context.input, e
                );
                return Vec::new();
            }
            Err(_) => {
                let e = DirectoryError::Timeout {
                    operation: context.operation_type.to_string(),
                    timeout: context.timeout,
                };
                error!(
                    target: LogCategory::Lookup.target(),
                    "[{}] {}", context.request_id, e
                );
                return Vec::new();
            }
        };
        debug!(
            target: LogCategory::Lookup.target(),
            "[{}] Directory returned {} object(s) in {} ms",
            context.request_id,
            objects.len(),
            started.elapsed().as_millis()
        );

        process_directory_results(&objects, context, settings)
    }
}

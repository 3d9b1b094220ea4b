//! In-memory directory.
//!
//! Thread-safe stand-in for Microsoft Graph, used by tests, benchmarks and
//! the configuration tool. Objects are stored per tenant; group membership is
//! a map from user id to group ids. Calls are counted so callers can check
//! that a request was answered without querying the directory, and failures
//! or latency can be injected.
//!
//! # Example Usage
//!
//! ```rust
//! use entra_claims::directory::{DirectoryGroup, DirectoryUser, InMemoryDirectory};
//!
//! # async fn example() {
//! let directory = InMemoryDirectory::new();
//! directory
//!     .add_object("contoso.onmicrosoft.com", DirectoryUser::new("u1", "john@contoso.com"))
//!     .await;
//! directory
//!     .add_object("contoso.onmicrosoft.com", DirectoryGroup::new("g1", "AADGroup1"))
//!     .await;
//! directory.add_member("contoso.onmicrosoft.com", "u1", "g1").await;
//! assert_eq!(directory.object_count().await, 2);
//! # }
//! ```

use super::object::DirectoryObject;
use super::provider::DirectoryProvider;
use crate::config::DirectoryObjectProperty;
use crate::error::DirectoryError;
use crate::logging::LogCategory;
use crate::operation::OperationContext;
use crate::resolution::{config_value, matching};
use log::trace;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct TenantDirectory {
    objects: Vec<DirectoryObject>,
    // user id -> group ids
    memberships: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
struct Behavior {
    failure: Option<String>,
    latency: Option<Duration>,
}

/// Directory held in memory, keyed by tenant name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    tenants: Arc<RwLock<HashMap<String, TenantDirectory>>>,
    behavior: Arc<RwLock<Behavior>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_object(&self, tenant: &str, object: impl Into<DirectoryObject>) {
        let mut tenants = self.tenants.write().await;
        tenants
            .entry(tenant.to_lowercase())
            .or_default()
            .objects
            .push(object.into());
    }

    /// Make `user_id` a member of `group_id` in `tenant`.
    pub async fn add_member(&self, tenant: &str, user_id: &str, group_id: &str) {
        let mut tenants = self.tenants.write().await;
        tenants
            .entry(tenant.to_lowercase())
            .or_default()
            .memberships
            .entry(user_id.to_string())
            .or_default()
            .push(group_id.to_string());
    }

    /// Make every following call fail with `message`, or succeed again with `None`.
    pub async fn set_failure(&self, message: Option<&str>) {
        self.behavior.write().await.failure = message.map(str::to_string);
    }

    /// Delay every following call by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.behavior.write().await.latency = latency;
    }

    /// Number of directory calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_call_count(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub async fn object_count(&self) -> usize {
        self.tenants
            .read()
            .await
            .values()
            .map(|t| t.objects.len())
            .sum()
    }

    pub async fn clear(&self) {
        self.tenants.write().await.clear();
    }

    async fn begin_call(&self, operation: &str) -> Result<(), DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (failure, latency) = {
            let behavior = self.behavior.read().await;
            (behavior.failure.clone(), behavior.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(message) => Err(DirectoryError::Provider(format!("{}: {}", operation, message))),
            None => Ok(()),
        }
    }
}

impl DirectoryProvider for InMemoryDirectory {
    async fn search_or_validate_entities(
        &self,
        context: &OperationContext,
    ) -> Result<Vec<DirectoryObject>, DirectoryError> {
        self.begin_call("search").await?;

        let tenants = self.tenants.read().await;
        let mut found = Vec::new();
        for tenant in &context.tenants {
            let Some(directory) = tenants.get(&tenant.name.to_lowercase()) else {
                continue;
            };
            for object in &directory.objects {
                if !context.directory_object_types.contains(&object.object_type()) {
                    continue;
                }
                if let DirectoryObject::User(user) = object {
                    if !tenant.includes_user(user.is_guest()) {
                        continue;
                    }
                }
                let matched = context
                    .current_claim_type_configs
                    .iter()
                    .filter(|c| c.entity_type == object.object_type())
                    .any(|c| {
                        config_value(object, c).is_some_and(|value| {
                            matching::matches_input(
                                &value,
                                &context.input,
                                context.exact_search || c.filter_exact_match_only,
                            )
                        })
                    });
                if matched {
                    found.push(object.clone());
                }
            }
        }

        trace!(
            target: LogCategory::Graph.target(),
            "[{}] Directory returned {} object(s) for '{}'",
            context.request_id,
            found.len(),
            context.input
        );
        Ok(found)
    }

    async fn get_entity_groups(
        &self,
        context: &OperationContext,
        group_property: DirectoryObjectProperty,
    ) -> Result<Vec<String>, DirectoryError> {
        self.begin_call("get_entity_groups").await?;

        let (Some(entity), Some(config)) = (&context.incoming_entity, context.incoming_config())
        else {
            return Ok(Vec::new());
        };

        let tenants = self.tenants.read().await;
        let mut groups = Vec::new();
        for tenant in &context.tenants {
            let Some(directory) = tenants.get(&tenant.name.to_lowercase()) else {
                continue;
            };
            let user = directory.objects.iter().find(|o| {
                matches!(o, DirectoryObject::User(_))
                    && config_value(o, config)
                        .is_some_and(|v| matching::equals_ignore_case(&v, &entity.value))
            });
            let Some(user) = user else {
                continue;
            };

            let member_of = directory
                .memberships
                .get(user.id())
                .map(Vec::as_slice)
                .unwrap_or_default();
            for group_id in member_of {
                let group = directory
                    .objects
                    .iter()
                    .find(|o| matches!(o, DirectoryObject::Group(g) if &g.id == group_id));
                let Some(group) = group else {
                    continue;
                };
                if context.filter_security_enabled_groups_only
                    && !matches!(group, DirectoryObject::Group(g) if g.security_enabled == Some(true))
                {
                    continue;
                }
                if let Some(value) = group.property_value(group_property) {
                    groups.push(value);
                }
            }
        }

        trace!(
            target: LogCategory::Augmentation.target(),
            "[{}] '{}' is member of {} group(s)",
            context.request_id,
            entity.value,
            groups.len()
        );
        Ok(groups)
    }
}

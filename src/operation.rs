//! Per-request operation context.
//!
//! A context is derived from the current [`SettingsSnapshot`] and the request
//! arguments. It fixes which claim type configs a request may use, the input
//! to match, and whether matching is exact. It is immutable once built and
//! handed as-is to the directory provider.

use crate::claims::Claim;
use crate::config::{ClaimTypeConfig, DirectoryObjectType, EntraIdTenant, SettingsSnapshot};
use crate::error::OperationError;
use crate::logging::LogCategory;
use crate::resolution::matching::equals_ignore_case;
use log::{debug, error};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Kind of request served by the claims provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// People picker search or resolution of typed input.
    Search,
    /// Exact check that an entity exists.
    Validation,
    /// Group membership lookup at sign-in.
    Augmentation,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search => write!(f, "Search"),
            Self::Validation => write!(f, "Validation"),
            Self::Augmentation => write!(f, "Augmentation"),
        }
    }
}

/// Arguments of a request, before they are checked against the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub operation_type: OperationType,
    pub input: String,
    pub incoming_entity: Option<Claim>,
    pub exact_search: bool,
    pub entity_types: Vec<DirectoryObjectType>,
    pub hierarchy_node_id: Option<String>,
}

impl OperationRequest {
    /// Empty request of the given type.
    pub fn new(operation_type: OperationType) -> Self {
        Self {
            operation_type,
            input: String::new(),
            incoming_entity: None,
            exact_search: false,
            entity_types: Vec::new(),
            hierarchy_node_id: None,
        }
    }

    pub fn search(
        input: impl Into<String>,
        entity_types: impl IntoIterator<Item = DirectoryObjectType>,
    ) -> Self {
        Self {
            input: input.into(),
            entity_types: entity_types.into_iter().collect(),
            ..Self::new(OperationType::Search)
        }
    }

    pub fn validation(
        entity: Claim,
        entity_types: impl IntoIterator<Item = DirectoryObjectType>,
    ) -> Self {
        Self {
            entity_types: entity_types.into_iter().collect(),
            incoming_entity: Some(entity),
            ..Self::new(OperationType::Validation)
        }
    }

    pub fn augmentation(entity: Claim) -> Self {
        Self {
            incoming_entity: Some(entity),
            ..Self::new(OperationType::Augmentation)
        }
    }

    pub fn exact(mut self, exact_search: bool) -> Self {
        self.exact_search = exact_search;
        self
    }

    /// Restrict a search to the claim type of a hierarchy node.
    pub fn hierarchy_node(mut self, node_id: Option<impl Into<String>>) -> Self {
        self.hierarchy_node_id = node_id.map(Into::into);
        self
    }
}

/// Everything a request needs to query the directory and interpret its results.
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Correlates the log lines of one request.
    pub request_id: String,
    pub operation_type: OperationType,
    /// Text to match; the claim value for validation.
    pub input: String,
    pub incoming_entity: Option<Claim>,
    pub exact_search: bool,
    pub directory_object_types: Vec<DirectoryObjectType>,
    pub hierarchy_node_id: Option<String>,
    /// Configs allowed to match for this request, in configuration order.
    pub current_claim_type_configs: Vec<ClaimTypeConfig>,
    /// Config of the incoming claim type, for validation and augmentation.
    pub incoming_entity_claim_type_config: Option<ClaimTypeConfig>,
    /// Authenticated tenants to query.
    pub tenants: Vec<EntraIdTenant>,
    pub timeout: Duration,
    pub filter_security_enabled_groups_only: bool,
}

impl OperationContext {
    /// Build the context of `request` against `settings`.
    pub fn new(
        settings: &SettingsSnapshot,
        request: OperationRequest,
    ) -> Result<Self, OperationError> {
        let config = settings.config();
        let mut context = Self {
            request_id: Uuid::new_v4().to_string(),
            operation_type: request.operation_type,
            input: request.input,
            incoming_entity: request.incoming_entity,
            exact_search: request.exact_search,
            directory_object_types: request.entity_types,
            hierarchy_node_id: request.hierarchy_node_id.filter(|n| !n.is_empty()),
            current_claim_type_configs: Vec::new(),
            incoming_entity_claim_type_config: None,
            tenants: config
                .search_tenants()
                .filter(|t| t.client().is_some())
                .cloned()
                .collect(),
            timeout: config.timeout(),
            filter_security_enabled_groups_only: config.filter_security_enabled_groups_only,
        };

        match context.operation_type {
            OperationType::Search => context.init_search(settings),
            OperationType::Validation => {
                let incoming = context.init_incoming_entity(settings)?;
                context.input = context
                    .incoming_entity
                    .as_ref()
                    .map(|e| e.value.clone())
                    .unwrap_or_default();
                context.exact_search = true;
                context.directory_object_types = vec![incoming.entity_type];
                context.current_claim_type_configs = vec![incoming];
            }
            OperationType::Augmentation => {
                let incoming = context.init_incoming_entity(settings)?;
                context.directory_object_types = vec![incoming.entity_type];
                context.current_claim_type_configs = vec![incoming];
            }
        }

        debug!(
            target: LogCategory::Core.target(),
            "[{}] {} context: input '{}', exact {}, {} claim type config(s), {} tenant(s)",
            context.request_id,
            context.operation_type,
            context.input,
            context.exact_search,
            context.current_claim_type_configs.len(),
            context.tenants.len()
        );
        Ok(context)
    }

    fn init_search(&mut self, settings: &SettingsSnapshot) {
        let node = self.hierarchy_node_id.as_deref();
        self.current_claim_type_configs = settings
            .runtime_claim_types()
            .iter()
            .filter(|c| self.directory_object_types.contains(&c.entity_type))
            .filter(|c| !c.is_metadata_only())
            .filter(|c| match node {
                None => true,
                Some(node) => equals_ignore_case(&effective_claim_type(settings, c), node),
            })
            .cloned()
            .collect();
    }

    fn init_incoming_entity(
        &mut self,
        settings: &SettingsSnapshot,
    ) -> Result<ClaimTypeConfig, OperationError> {
        let Some(entity) = self.incoming_entity.as_ref() else {
            return Err(OperationError::InvalidArgument(format!(
                "{} requires an incoming entity",
                self.operation_type
            )));
        };

        let incoming = settings
            .runtime_claim_types()
            .iter()
            .find(|c| {
                c.has_claim_type()
                    && !c.use_main_claim_type_of_directory_object
                    && equals_ignore_case(&c.claim_type, &entity.claim_type)
            })
            .cloned();

        match incoming {
            Some(config) => {
                self.incoming_entity_claim_type_config = Some(config.clone());
                Ok(config)
            }
            None => {
                let err = OperationError::ClaimTypeNotConfigured {
                    claim_type: entity.claim_type.clone(),
                    value: entity.value.clone(),
                };
                error!(target: LogCategory::Core.target(), "[{}] {}", self.request_id, err);
                Err(err)
            }
        }
    }

    /// Config of the incoming entity, when the request has one.
    pub fn incoming_config(&self) -> Option<&ClaimTypeConfig> {
        self.incoming_entity_claim_type_config.as_ref()
    }
}

/// Claim type a config issues: its own, or the main claim type of its object type.
pub(crate) fn effective_claim_type(settings: &SettingsSnapshot, config: &ClaimTypeConfig) -> String {
    if config.use_main_claim_type_of_directory_object {
        settings
            .main_config_for(config.entity_type)
            .map(|main| main.claim_type.clone())
            .unwrap_or_default()
    } else {
        config.claim_type.clone()
    }
}

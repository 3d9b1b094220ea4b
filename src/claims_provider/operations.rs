//! People picker operations.

use super::core::EntraClaimsProvider;
use super::hierarchy::hierarchy_nodes;
use crate::claims::{Claim, PickerEntity, SearchNode, SearchResults};
use crate::config::{DirectoryObjectType, SettingsSnapshot};
use crate::directory::DirectoryProvider;
use crate::logging::LogCategory;
use crate::operation::{OperationContext, OperationRequest};
use crate::resolution::create_picker_entity;
use crate::resolution::matching::equals_ignore_case;
use log::{debug, error, info, warn};

impl<D: DirectoryProvider> EntraClaimsProvider<D> {
    /// Search users and groups matching `input`, grouped per claim type.
    ///
    /// With a `hierarchy_node_id`, only the claim type of that node is searched.
    pub async fn search(
        &self,
        input: &str,
        entity_types: &[DirectoryObjectType],
        hierarchy_node_id: Option<&str>,
    ) -> SearchResults {
        if !self.refresh_settings().await {
            return SearchResults::default();
        }
        let settings = self.settings.read().await;
        let Some(settings) = settings.as_ref() else {
            return SearchResults::default();
        };

        let request = OperationRequest::search(input, entity_types.iter().copied())
            .exact(settings.config().filter_exact_match_only)
            .hierarchy_node(hierarchy_node_id);
        let entities = self.picker_entities(settings, request).await;

        let mut results = SearchResults::default();
        for node in hierarchy_nodes(settings, entity_types) {
            let entities: Vec<PickerEntity> = entities
                .iter()
                .filter(|e| equals_ignore_case(&e.claim.claim_type, &node.id))
                .cloned()
                .collect();
            if !entities.is_empty() {
                results.nodes.push(SearchNode { node, entities });
            }
        }
        results
    }

    /// Resolve text typed in the picker into entities.
    pub async fn resolve_input(
        &self,
        input: &str,
        entity_types: &[DirectoryObjectType],
    ) -> Vec<PickerEntity> {
        if !self.refresh_settings().await {
            return Vec::new();
        }
        let settings = self.settings.read().await;
        let Some(settings) = settings.as_ref() else {
            return Vec::new();
        };

        let request = OperationRequest::search(input, entity_types.iter().copied())
            .exact(settings.config().filter_exact_match_only);
        self.picker_entities(settings, request).await
    }

    /// Validate an existing permission.
    ///
    /// Returns the entity when exactly one directory object matches the claim
    /// value on its claim type, nothing otherwise.
    pub async fn resolve_claim(
        &self,
        claim: &Claim,
        entity_types: &[DirectoryObjectType],
    ) -> Vec<PickerEntity> {
        if !self.trust.is_issuer_of(claim) {
            debug!(
                target: LogCategory::Rehydration.target(),
                "Claim '{}' was not issued by trust '{}'", claim.value, self.trust.name
            );
            return Vec::new();
        }
        if !self.refresh_settings().await {
            return Vec::new();
        }
        let settings = self.settings.read().await;
        let Some(settings) = settings.as_ref() else {
            return Vec::new();
        };

        let request = OperationRequest::validation(claim.clone(), entity_types.iter().copied());
        let entities = self.picker_entities(settings, request).await;
        match entities.len() {
            1 => {
                info!(
                    target: LogCategory::Rehydration.target(),
                    "Validated permission '{}' on claim type '{}'", claim.value, claim.claim_type
                );
                entities
            }
            0 => {
                debug!(
                    target: LogCategory::Rehydration.target(),
                    "Permission '{}' on claim type '{}' was not found", claim.value, claim.claim_type
                );
                Vec::new()
            }
            n => {
                warn!(
                    target: LogCategory::Rehydration.target(),
                    "Permission '{}' on claim type '{}' matches {} entities and is not validated",
                    claim.value,
                    claim.claim_type,
                    n
                );
                Vec::new()
            }
        }
    }

    async fn picker_entities(
        &self,
        settings: &SettingsSnapshot,
        request: OperationRequest,
    ) -> Vec<PickerEntity> {
        let context = match OperationContext::new(settings, request) {
            Ok(context) => context,
            Err(e) => {
                error!(target: LogCategory::ClaimsPicking.target(), "{}", e);
                return Vec::new();
            }
        };

        self.resolve_entities(&context, settings)
            .await
            .iter()
            .map(|r| create_picker_entity(r, settings, &self.trust))
            .collect()
    }
}

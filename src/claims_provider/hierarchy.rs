//! Hierarchy nodes and advertised claim types.

use super::core::EntraClaimsProvider;
use crate::claims::HierarchyNode;
use crate::config::{DirectoryObjectType, SettingsSnapshot};
use crate::directory::DirectoryProvider;

/// One node per claim type that can be searched for the requested object types.
pub(crate) fn hierarchy_nodes(
    settings: &SettingsSnapshot,
    entity_types: &[DirectoryObjectType],
) -> Vec<HierarchyNode> {
    settings
        .runtime_claim_types()
        .iter()
        .filter(|c| c.has_claim_type() && !c.use_main_claim_type_of_directory_object)
        .filter(|c| entity_types.contains(&c.entity_type))
        .map(|c| HierarchyNode {
            id: c.claim_type.clone(),
            display_name: c.display_name().to_string(),
            entity_type: c.entity_type,
        })
        .collect()
}

impl<D: DirectoryProvider> EntraClaimsProvider<D> {
    /// Nodes of the people picker hierarchy.
    pub async fn fill_hierarchy(&self, entity_types: &[DirectoryObjectType]) -> Vec<HierarchyNode> {
        if !self.refresh_settings().await {
            return Vec::new();
        }
        let settings = self.settings.read().await;
        settings
            .as_ref()
            .map(|s| hierarchy_nodes(s, entity_types))
            .unwrap_or_default()
    }

    /// Claim types the provider issues.
    pub async fn fill_claim_types(&self) -> Vec<String> {
        self.collect_claim_type_field(|c| c.claim_type.clone()).await
    }

    /// Value types of the claims the provider issues, in the same order as
    /// [`fill_claim_types`](Self::fill_claim_types).
    pub async fn fill_claim_value_types(&self) -> Vec<String> {
        self.collect_claim_type_field(|c| c.claim_value_type.clone()).await
    }

    /// SharePoint entity types of the entities the provider returns.
    pub async fn fill_entity_types(&self) -> Vec<String> {
        let mut entity_types: Vec<String> = Vec::new();
        for entity_type in self
            .collect_claim_type_field(|c| c.picker_entity_type().to_string())
            .await
        {
            if !entity_types.contains(&entity_type) {
                entity_types.push(entity_type);
            }
        }
        entity_types
    }

    async fn collect_claim_type_field(
        &self,
        field: impl Fn(&crate::config::ClaimTypeConfig) -> String,
    ) -> Vec<String> {
        if !self.refresh_settings().await {
            return Vec::new();
        }
        let settings = self.settings.read().await;
        let Some(settings) = settings.as_ref() else {
            return Vec::new();
        };
        settings
            .runtime_claim_types()
            .iter()
            .filter(|c| c.has_claim_type() && !c.use_main_claim_type_of_directory_object)
            .map(field)
            .collect()
    }
}

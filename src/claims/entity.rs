//! People picker results.

use super::trust::Claim;
use crate::config::DirectoryObjectType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An entry returned to the people picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerEntity {
    pub claim: Claim,
    pub display_text: String,
    pub description: String,
    /// SharePoint entity type (`User`, `FormsRole`, `SecGroup`).
    pub entity_type: String,
    /// Name of the search tree node the entity is listed under.
    pub entity_group_name: String,
    pub is_resolved: bool,
    pub entity_data: BTreeMap<String, String>,
}

/// A node of the picker hierarchy: one per searchable claim type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    /// Claim type, passed back as hierarchy node id in searches.
    pub id: String,
    pub display_name: String,
    pub entity_type: DirectoryObjectType,
}

/// Entities found for one claim type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNode {
    pub node: HierarchyNode,
    pub entities: Vec<PickerEntity>,
}

/// Search results grouped per claim type, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub nodes: Vec<SearchNode>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| n.entities.is_empty())
    }

    /// Total number of entities across nodes.
    pub fn entity_count(&self) -> usize {
        self.nodes.iter().map(|n| n.entities.len()).sum()
    }

    pub fn entities(&self) -> impl Iterator<Item = &PickerEntity> {
        self.nodes.iter().flat_map(|n| n.entities.iter())
    }
}

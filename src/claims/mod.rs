//! SharePoint-facing claim, trust and picker entity types.

pub mod entity;
pub mod trust;

pub use entity::{HierarchyNode, PickerEntity, SearchNode, SearchResults};
pub use trust::{Claim, TrustedLoginProvider};

//! Directory provider trait.

use super::object::DirectoryObject;
use crate::config::DirectoryObjectProperty;
use crate::error::DirectoryError;
use crate::operation::OperationContext;
use std::future::Future;

/// Queries the directory on behalf of the claims provider.
///
/// Implementations decide how to turn the context into queries (filters,
/// paging, throttling, per-tenant fan-out). Results may come back in any
/// order; the caller deduplicates and re-checks matches. Errors are logged by
/// the caller and treated as "no results".
pub trait DirectoryProvider: Send + Sync {
    /// Search (or, for a validation context, look up exactly) the users and
    /// groups matching the context, across the tenants it lists.
    fn search_or_validate_entities(
        &self,
        context: &OperationContext,
    ) -> impl Future<Output = Result<Vec<DirectoryObject>, DirectoryError>> + Send;

    /// Values of `group_property` for every group the incoming entity of an
    /// augmentation context is a member of.
    fn get_entity_groups(
        &self,
        context: &OperationContext,
        group_property: DirectoryObjectProperty,
    ) -> impl Future<Output = Result<Vec<String>, DirectoryError>> + Send;
}

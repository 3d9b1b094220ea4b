//! Requests answered from the input alone.
//!
//! Two settings let a request skip the directory:
//!
//! * `always_resolve_user_input` creates a permission from the raw input on
//!   every config that has a claim type of its own.
//! * A config's `prefix_to_bypass_lookup`: input starting with it creates a
//!   permission from the remainder, on that config only.

use super::matching::starts_with_ignore_case;
use super::results::ResolvedEntity;
use crate::config::SettingsSnapshot;
use crate::logging::LogCategory;
use crate::operation::{OperationContext, OperationType};
use log::debug;

/// Permissions created without a lookup, or `None` if the directory must be queried.
pub fn resolve_without_lookup(
    context: &OperationContext,
    settings: &SettingsSnapshot,
) -> Option<Vec<ResolvedEntity>> {
    match context.operation_type {
        OperationType::Augmentation => None,
        OperationType::Search => resolve_search(context, settings),
        OperationType::Validation => resolve_validation(context, settings),
    }
}

fn resolve_search(
    context: &OperationContext,
    settings: &SettingsSnapshot,
) -> Option<Vec<ResolvedEntity>> {
    let input = context.input.as_str();
    if input.is_empty() {
        return Some(Vec::new());
    }

    if settings.config().always_resolve_user_input {
        let entities = context
            .current_claim_type_configs
            .iter()
            .filter(|c| c.has_claim_type() && !c.use_main_claim_type_of_directory_object)
            .filter_map(|c| ResolvedEntity::from_input(c, input, settings))
            .collect::<Vec<_>>();
        debug!(
            target: LogCategory::ClaimsPicking.target(),
            "[{}] Created {} permission(s) from input '{}' without lookup",
            context.request_id,
            entities.len(),
            input
        );
        return Some(entities);
    }

    let bypassed: Vec<_> = context
        .current_claim_type_configs
        .iter()
        .filter(|c| c.has_prefix_to_bypass_lookup())
        .filter(|c| starts_with_ignore_case(input, &c.prefix_to_bypass_lookup))
        .collect();
    if bypassed.is_empty() {
        return None;
    }

    let entities = bypassed
        .into_iter()
        .filter_map(|c| {
            // prefix compared case-insensitively, so cut by character count
            let value: String = input
                .chars()
                .skip(c.prefix_to_bypass_lookup.chars().count())
                .collect();
            if value.is_empty() {
                return None;
            }
            ResolvedEntity::from_input(c, value, settings)
        })
        .collect::<Vec<_>>();
    debug!(
        target: LogCategory::ClaimsPicking.target(),
        "[{}] Input '{}' matches a bypass prefix, created {} permission(s)",
        context.request_id,
        input,
        entities.len()
    );
    Some(entities)
}

fn resolve_validation(
    context: &OperationContext,
    settings: &SettingsSnapshot,
) -> Option<Vec<ResolvedEntity>> {
    let config = context.incoming_config()?;
    if !settings.config().always_resolve_user_input && !config.has_prefix_to_bypass_lookup() {
        return None;
    }
    debug!(
        target: LogCategory::ClaimsPicking.target(),
        "[{}] Validated '{}' without lookup",
        context.request_id,
        context.input
    );
    Some(
        ResolvedEntity::from_input(config, context.input.clone(), settings)
            .into_iter()
            .collect(),
    )
}

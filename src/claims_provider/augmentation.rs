//! Group claims added to a user at sign-in.

use super::core::EntraClaimsProvider;
use crate::claims::Claim;
use crate::directory::DirectoryProvider;
use crate::error::DirectoryError;
use crate::logging::LogCategory;
use crate::operation::{OperationContext, OperationRequest};
use crate::resolution::matching::equals_ignore_case;
use log::{debug, error, info};

impl<D: DirectoryProvider> EntraClaimsProvider<D> {
    /// Group claims of the user identified by `entity`.
    ///
    /// Returns nothing when augmentation is disabled, when the claim comes from
    /// another trust, when no group claim type is configured, or when the
    /// directory fails.
    pub async fn augment(&self, entity: &Claim) -> Vec<Claim> {
        if !self.trust.is_issuer_of(entity) {
            debug!(
                target: LogCategory::Augmentation.target(),
                "Not augmenting '{}': issued by '{}'", entity.value, entity.original_issuer
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

        if !settings.config().enable_augmentation {
            debug!(
                target: LogCategory::Augmentation.target(),
                "Augmentation is disabled for '{}'", self.name
            );
            return Vec::new();
        }
        let Some(group_config) = settings.main_group_claim_type_config() else {
            debug!(
                target: LogCategory::Augmentation.target(),
                "No group claim type is configured, '{}' is not augmented", entity.value
            );
            return Vec::new();
        };

        let context =
            match OperationContext::new(settings, OperationRequest::augmentation(entity.clone())) {
                Ok(context) => context,
                Err(e) => {
                    error!(target: LogCategory::Augmentation.target(), "{}", e);
                    return Vec::new();
                }
            };

        let call = self
            .directory
            .get_entity_groups(&context, group_config.entity_property);
        let values = match tokio::time::timeout(context.timeout, call).await {
            Ok(Ok(values)) => values,
            Ok(Err(e)) => {
                error!(
                    target: LogCategory::Augmentation.target(),
                    "[{}] Unable to get the groups of '{}': {}", context.request_id, entity.value, e
                );
                return Vec::new();
            }
            Err(_) => {
                let e = DirectoryError::Timeout {
                    operation: context.operation_type.to_string(),
                    timeout: context.timeout,
                };
                error!(
                    target: LogCategory::Augmentation.target(),
                    "[{}] {}", context.request_id, e
                );
                return Vec::new();
            }
        };

        let mut claims: Vec<Claim> = Vec::with_capacity(values.len());
        for value in values {
            if claims.iter().any(|c| equals_ignore_case(&c.value, &value)) {
                continue;
            }
            claims.push(Claim::new(
                group_config.claim_type.clone(),
                value,
                group_config.claim_value_type.clone(),
                self.trust.original_issuer(),
            ));
        }

        info!(
            target: LogCategory::Augmentation.target(),
            "[{}] Added {} group claim(s) to '{}'",
            context.request_id,
            claims.len(),
            entity.value
        );
        claims
    }
}

//! Error types for claims provider operations.
//!
//! Each layer has its own error enum; [`ClaimsProviderError`] wraps them for
//! callers that drive the whole pipeline.

use std::time::Duration;

/// The invariant of a [`ClaimTypeConfigCollection`](crate::config::ClaimTypeConfigCollection)
/// that an insert or update violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimTypeConfigRule {
    /// `entity_property` must be set.
    EntityPropertySet,
    /// A config using the main claim type of its object must not carry a claim type.
    MainClaimTypeWithoutClaimType,
    /// A config without claim type that does not borrow the main one must have an entity data key.
    MetadataRequiresEntityDataKey,
    /// Entity data keys are unique per entity type.
    UniqueEntityDataKey,
    /// Claim types are unique across the collection.
    UniqueClaimType,
    /// Bypass prefixes are unique across the collection.
    UniquePrefixToBypassLookup,
    /// `(entity_property, entity_type)` pairs are unique.
    UniqueEntityProperty,
    /// Only one claim type may target groups.
    SingleGroupClaimType,
    /// The identity claim type of the trust must target users.
    IdentityClaimTypeIsUser,
    /// The identity claim type config cannot be renamed or retargeted.
    IdentityClaimTypeImmutable,
}

impl std::fmt::Display for ClaimTypeConfigRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::EntityPropertySet => "entity-property-set",
            Self::MainClaimTypeWithoutClaimType => "main-claim-type-without-claim-type",
            Self::MetadataRequiresEntityDataKey => "metadata-requires-entity-data-key",
            Self::UniqueEntityDataKey => "unique-entity-data-key",
            Self::UniqueClaimType => "unique-claim-type",
            Self::UniquePrefixToBypassLookup => "unique-prefix-to-bypass-lookup",
            Self::UniqueEntityProperty => "unique-entity-property",
            Self::SingleGroupClaimType => "single-group-claim-type",
            Self::IdentityClaimTypeIsUser => "identity-claim-type-is-user",
            Self::IdentityClaimTypeImmutable => "identity-claim-type-immutable",
        };
        f.write_str(name)
    }
}

/// Errors raised while editing or loading claims provider configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A collection invariant would be broken by the requested change.
    #[error("Invalid operation ({rule}): {message}")]
    InvalidOperation {
        rule: ClaimTypeConfigRule,
        message: String,
    },

    /// No config matches the given claim type.
    #[error("Claim type '{claim_type}' is not configured")]
    ClaimTypeNotFound { claim_type: String },

    /// Update was attempted on an entry that has no claim type.
    #[error("Only entries with a claim type can be updated")]
    UpdateRequiresClaimType,

    /// The entry representing the identity claim type of the trust cannot be removed.
    #[error("Cannot remove the identity claim type '{claim_type}'")]
    IdentityClaimTypeProtected { claim_type: String },

    /// The runtime snapshot could not be derived from the persisted configuration.
    #[error("Configuration is not valid: {message}")]
    Invalid { message: String },

    /// No persisted configuration with this identifier exists.
    #[error("Configuration not found: {id}")]
    NotFound { id: String },

    /// A persisted configuration with this identifier already exists.
    #[error("Configuration already exists: {id}")]
    AlreadyExists { id: String },

    /// Optimistic concurrency check failed.
    #[error("Invalid configuration version: expected {expected}, got {actual}")]
    VersionMismatch { expected: u64, actual: u64 },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// Reading or writing a configuration file failed.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A tenant definition is not usable.
    #[error("Tenant error: {0}")]
    Tenant(#[from] TenantError),
}

impl ConfigurationError {
    pub(crate) fn invalid_operation(rule: ClaimTypeConfigRule, message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            rule,
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// The violated rule, for invariant violations.
    pub fn rule(&self) -> Option<ClaimTypeConfigRule> {
        match self {
            Self::InvalidOperation { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}

/// Errors raised when an [`OperationContext`](crate::operation::OperationContext)
/// cannot be built for a request.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// A required argument was missing.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The incoming claim type has no matching configuration.
    #[error("Unable to validate entity \"{value}\" because its claim type \"{claim_type}\" was not found in the claim types list")]
    ClaimTypeNotConfigured { claim_type: String, value: String },
}

/// Errors surfaced by the external directory collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The directory backend failed.
    #[error("Directory provider error: {0}")]
    Provider(String),

    /// The call did not finish within the configured timeout.
    #[error("Directory operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },
}

/// Errors related to tenant credentials.
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    /// The persisted certificate blob could not be decoded.
    #[error("Unable to import certificate for tenant '{tenant}': {reason}")]
    CertificateImport { tenant: String, reason: String },

    /// Neither a client secret nor a certificate is configured.
    #[error("Tenant '{0}' has no credentials")]
    MissingCredentials(String),

    /// Both user-type exclusions are enabled, which would hide every user.
    #[error("Tenant '{0}' cannot exclude both guest and member users")]
    ConflictingExclusions(String),

    /// A required tenant field is empty.
    #[error("Tenant field '{field}' cannot be empty")]
    MissingField { field: String },
}

/// Umbrella error for the claims provider.
#[derive(Debug, thiserror::Error)]
pub enum ClaimsProviderError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// No usable settings snapshot is loaded.
    #[error("Claims provider '{0}' has no valid configuration")]
    NotConfigured(String),
}

/// Result type for configuration operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

/// Result type for claims provider operations.
pub type ClaimsProviderResult<T> = Result<T, ClaimsProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operation_message_names_rule() {
        let error = ConfigurationError::invalid_operation(
            ClaimTypeConfigRule::UniqueClaimType,
            "Claim type 'x' already exists in the collection",
        );
        assert_eq!(error.rule(), Some(ClaimTypeConfigRule::UniqueClaimType));
        assert!(error.to_string().contains("unique-claim-type"));
    }

    #[test]
    fn test_umbrella_conversion() {
        let error: ClaimsProviderError = OperationError::InvalidArgument("entity".into()).into();
        assert!(matches!(error, ClaimsProviderError::Operation(_)));
    }
}

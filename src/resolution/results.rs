//! Matching directory objects against claim type configs.

use super::matching::{equals_ignore_case, matches_input};
use crate::config::{ClaimTypeConfig, DirectoryObjectType, SettingsSnapshot};
use crate::directory::DirectoryObject;
use crate::logging::LogCategory;
use crate::operation::OperationContext;
use log::debug;

/// A permission produced for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    /// Directory object it was found from; `None` when created from the input.
    pub object: Option<DirectoryObject>,
    pub entity_type: DirectoryObjectType,
    /// Config whose property matched the input.
    pub matched_config: ClaimTypeConfig,
    /// Value of the matched property.
    pub matched_value: String,
    pub claim_type: String,
    pub claim_value_type: String,
    pub permission_value: String,
}

impl ResolvedEntity {
    /// Permission created from the input without a directory lookup.
    pub fn from_input(
        config: &ClaimTypeConfig,
        value: impl Into<String>,
        settings: &SettingsSnapshot,
    ) -> Option<Self> {
        let value = value.into();
        let issuing = issuing_config(config, settings)?;
        Some(Self {
            object: None,
            entity_type: config.entity_type,
            matched_config: config.clone(),
            matched_value: value.clone(),
            claim_type: issuing.claim_type.clone(),
            claim_value_type: issuing.claim_value_type.clone(),
            permission_value: value,
        })
    }

    pub fn is_from_directory(&self) -> bool {
        self.object.is_some()
    }
}

/// Config whose claim type a permission is issued with.
pub(crate) fn issuing_config<'a>(
    config: &'a ClaimTypeConfig,
    settings: &'a SettingsSnapshot,
) -> Option<&'a ClaimTypeConfig> {
    if config.use_main_claim_type_of_directory_object {
        settings.main_config_for(config.entity_type)
    } else {
        Some(config)
    }
}

/// Value `config` reads from `object`.
///
/// Guest accounts are read through the guest property of the identity
/// config: their primary property is not what they sign in with.
pub fn config_value(object: &DirectoryObject, config: &ClaimTypeConfig) -> Option<String> {
    if object.is_guest() {
        if let Some(property) = config.property_for_guest_users() {
            return object.property_value(property);
        }
    }
    object.property_value(config.entity_property)
}

/// Match `objects` against the configs of `context`.
///
/// Every object is tested against each config of its type, in configuration
/// order. A match produces a permission on the config's claim type, or on the
/// main claim type of the object for lookup configs. A permission with the
/// same claim type and value as an earlier one is dropped.
pub fn process_directory_results(
    objects: &[DirectoryObject],
    context: &OperationContext,
    settings: &SettingsSnapshot,
) -> Vec<ResolvedEntity> {
    let mut resolved: Vec<ResolvedEntity> = Vec::new();

    for object in objects {
        let object_type = object.object_type();
        if let DirectoryObject::Group(group) = object {
            if context.filter_security_enabled_groups_only && group.security_enabled != Some(true) {
                continue;
            }
        }

        for config in context
            .current_claim_type_configs
            .iter()
            .filter(|c| c.entity_type == object_type && !c.is_metadata_only())
        {
            let Some(matched_value) = config_value(object, config) else {
                continue;
            };
            let exact = context.exact_search || config.filter_exact_match_only;
            if !matches_input(&matched_value, &context.input, exact) {
                continue;
            }

            let Some(issuing) = issuing_config(config, settings) else {
                continue;
            };
            let permission_value = if config.use_main_claim_type_of_directory_object {
                match config_value(object, issuing) {
                    Some(value) => value,
                    None => continue,
                }
            } else {
                matched_value.clone()
            };

            let duplicate = resolved.iter().any(|r| {
                equals_ignore_case(&r.claim_type, &issuing.claim_type)
                    && equals_ignore_case(&r.permission_value, &permission_value)
            });
            if duplicate {
                continue;
            }

            resolved.push(ResolvedEntity {
                object: Some(object.clone()),
                entity_type: object_type,
                matched_config: config.clone(),
                matched_value,
                claim_type: issuing.claim_type.clone(),
                claim_value_type: issuing.claim_value_type.clone(),
                permission_value,
            });
        }
    }

    debug!(
        target: LogCategory::Lookup.target(),
        "[{}] {} directory object(s) produced {} permission(s) for '{}'",
        context.request_id,
        objects.len(),
        resolved.len(),
        context.input
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::TrustedLoginProvider;
    use crate::config::{DirectoryObjectProperty, EntityProviderConfig, claim_types};
    use crate::directory::{DirectoryGroup, DirectoryUser, GUEST_USER_TYPE};
    use crate::operation::OperationRequest;

    const BOTH: [DirectoryObjectType; 2] = [DirectoryObjectType::User, DirectoryObjectType::Group];

    fn settings_with(edit: impl FnOnce(&mut EntityProviderConfig)) -> SettingsSnapshot {
        let trust = TrustedLoginProvider::new("Entra", claim_types::UPN, [claim_types::GROUPS]);
        let mut config = EntityProviderConfig::default_configuration("EntraCP", &trust);
        edit(&mut config);
        SettingsSnapshot::build(&config, &trust).unwrap()
    }

    fn search(settings: &SettingsSnapshot, input: &str, exact: bool) -> OperationContext {
        OperationContext::new(settings, OperationRequest::search(input, BOTH).exact(exact)).unwrap()
    }

    fn user(id: &str, upn: &str, mail: &str, display_name: &str) -> DirectoryUser {
        DirectoryUser {
            mail: Some(mail.into()),
            display_name: Some(display_name.into()),
            ..DirectoryUser::new(id, upn)
        }
    }

    #[test]
    fn test_member_and_guest_give_distinct_permissions() {
        let settings = settings_with(|_| {});
        let member = user("1", "john@contoso.com", "john@contoso.com", "John");
        let guest = DirectoryUser {
            user_type: Some(GUEST_USER_TYPE.into()),
            ..user("2", "john@contoso.com", "john@fabrikam.com", "John (guest)")
        };
        let objects: Vec<DirectoryObject> = vec![member.into(), guest.into()];

        let context = search(&settings, "john", false);
        let resolved = process_directory_results(&objects, &context, &settings);
        let values: Vec<_> = resolved.iter().map(|r| r.permission_value.as_str()).collect();
        assert_eq!(values, vec!["john@contoso.com", "john@fabrikam.com"]);
        assert!(resolved.iter().all(|r| r.claim_type == claim_types::UPN));
    }

    #[test]
    fn test_lookup_config_uses_main_claim_type() {
        let settings = settings_with(|_| {});
        let jane = user("1", "jdoe@contoso.com", "jdoe@contoso.com", "Jane Doe");
        let objects: Vec<DirectoryObject> = vec![jane.into()];

        let context = search(&settings, "Jane", false);
        let resolved = process_directory_results(&objects, &context, &settings);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].claim_type, claim_types::UPN);
        assert_eq!(resolved[0].permission_value, "jdoe@contoso.com");
        assert_eq!(resolved[0].matched_value, "Jane Doe");
        assert!(resolved[0].matched_config.use_main_claim_type_of_directory_object);
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let settings = settings_with(|_| {});
        let u = user("1", "john@contoso.com", "john@contoso.com", "john");
        let objects: Vec<DirectoryObject> = vec![u.clone().into(), u.into()];

        let context = search(&settings, "john", false);
        let resolved = process_directory_results(&objects, &context, &settings);
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_exact_search() {
        let settings = settings_with(|_| {});
        let objects: Vec<DirectoryObject> = vec![
            DirectoryGroup::new("g1", "AADGroup1").into(),
            DirectoryGroup::new("g10", "AADGroup10").into(),
        ];

        let resolved =
            process_directory_results(&objects, &search(&settings, "AADGroup1", true), &settings);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].permission_value, "g1");
        assert_eq!(resolved[0].claim_type, claim_types::GROUPS);

        let resolved =
            process_directory_results(&objects, &search(&settings, "AADGroup1", false), &settings);
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_security_enabled_filter() {
        let settings = settings_with(|c| c.filter_security_enabled_groups_only = true);
        let distribution = DirectoryGroup {
            security_enabled: Some(false),
            ..DirectoryGroup::new("g2", "AADGroup2")
        };
        let objects: Vec<DirectoryObject> =
            vec![DirectoryGroup::new("g1", "AADGroup1").into(), distribution.into()];

        let context = search(&settings, "AADGroup", false);
        let resolved = process_directory_results(&objects, &context, &settings);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].permission_value, "g1");
    }

    #[test]
    fn test_missing_property_is_skipped() {
        let settings = settings_with(|c| {
            c.claim_types
                .update_user_identifier(DirectoryObjectProperty::Mail)
                .unwrap();
        });
        let objects: Vec<DirectoryObject> =
            vec![DirectoryUser::new("1", "nomail@contoso.com").into()];

        let resolved =
            process_directory_results(&objects, &search(&settings, "nomail", false), &settings);
        assert!(resolved.is_empty());
    }
}

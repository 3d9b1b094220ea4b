//! Picker entities and their display text.

use super::matching::equals_ignore_case;
use super::results::{ResolvedEntity, issuing_config};
use crate::claims::{Claim, PickerEntity, TrustedLoginProvider};
use crate::config::{DirectoryObjectType, SettingsSnapshot, sharepoint_entity_types};
use std::collections::BTreeMap;

/// Text shown for a permission in the picker.
///
/// Uses the display text property of the matched config (or of the main
/// config for lookup configs) when the object has it, the matched value
/// otherwise. Permissions on a claim type other than the main one of their
/// object type get the claim type display name in parentheses. The
/// configured prefix goes first.
pub fn format_permission_display_text(
    resolved: &ResolvedEntity,
    settings: &SettingsSnapshot,
) -> String {
    let matched = &resolved.matched_config;
    let main = settings.main_config_for(resolved.entity_type);

    let value = match &resolved.object {
        None => resolved.permission_value.clone(),
        Some(object) => {
            let display_config = if matched.entity_property_to_use_as_display_text.is_set() {
                Some(matched)
            } else if matched.use_main_claim_type_of_directory_object {
                main
            } else {
                None
            };
            display_config
                .filter(|c| c.entity_property_to_use_as_display_text.is_set())
                .and_then(|c| object.property_value(c.entity_property_to_use_as_display_text))
                .unwrap_or_else(|| resolved.matched_value.clone())
        }
    };

    let canonical = matched.use_main_claim_type_of_directory_object
        || main.is_some_and(|m| equals_ignore_case(&m.claim_type, &resolved.claim_type));

    let mut text = settings.config().entity_display_text_prefix.clone();
    if canonical {
        text.push_str(&value);
    } else {
        text.push_str(&format!("({}) {}", matched.display_name(), value));
    }
    text
}

/// Build the picker entity of a permission.
pub fn create_picker_entity(
    resolved: &ResolvedEntity,
    settings: &SettingsSnapshot,
    trust: &TrustedLoginProvider,
) -> PickerEntity {
    let matched = &resolved.matched_config;
    let issuing = issuing_config(matched, settings).unwrap_or(matched);

    let entity_type = if matched.sharepoint_entity_type.is_empty() {
        issuing.picker_entity_type().to_string()
    } else {
        matched.sharepoint_entity_type.clone()
    };

    let mut entity_data = BTreeMap::new();
    match &resolved.object {
        Some(object) => {
            // a group-typed entity found from a user carries none of the user's metadata
            let suppressed = object.object_type() == DirectoryObjectType::User
                && entity_type != sharepoint_entity_types::USER;
            if !suppressed {
                for metadata in settings
                    .runtime_metadata_config()
                    .iter()
                    .filter(|m| m.entity_type == object.object_type())
                {
                    if let Some(value) = object.property_value(metadata.entity_property) {
                        entity_data
                            .entry(metadata.entity_data_key.clone())
                            .or_insert(value);
                    }
                }
            }
        }
        None => {
            if matched.has_entity_data_key() {
                entity_data.insert(
                    matched.entity_data_key.clone(),
                    resolved.permission_value.clone(),
                );
            }
        }
    }

    PickerEntity {
        claim: Claim::new(
            resolved.claim_type.clone(),
            resolved.permission_value.clone(),
            resolved.claim_value_type.clone(),
            trust.original_issuer(),
        ),
        display_text: format_permission_display_text(resolved, settings),
        description: format!("{}:{}", settings.config().name, resolved.permission_value),
        entity_type,
        entity_group_name: issuing.display_name().to_string(),
        is_resolved: true,
        entity_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ClaimTypeConfig, DirectoryObjectProperty, EntityProviderConfig, claim_types,
        entity_data_keys,
    };
    use crate::directory::{DirectoryGroup, DirectoryObject, DirectoryUser};
    use crate::operation::{OperationContext, OperationRequest};
    use crate::resolution::process_directory_results;

    const BOTH: [DirectoryObjectType; 2] = [DirectoryObjectType::User, DirectoryObjectType::Group];

    fn trust() -> TrustedLoginProvider {
        TrustedLoginProvider::new(
            "Entra",
            claim_types::UPN,
            [claim_types::GROUPS, claim_types::ROLE],
        )
    }

    fn settings_with(edit: impl FnOnce(&mut EntityProviderConfig)) -> SettingsSnapshot {
        let mut config = EntityProviderConfig::default_configuration("EntraCP", &trust());
        edit(&mut config);
        SettingsSnapshot::build(&config, &trust()).unwrap()
    }

    fn entities(
        settings: &SettingsSnapshot,
        objects: Vec<DirectoryObject>,
        input: &str,
    ) -> Vec<PickerEntity> {
        let context =
            OperationContext::new(settings, OperationRequest::search(input, BOTH)).unwrap();
        process_directory_results(&objects, &context, settings)
            .iter()
            .map(|r| create_picker_entity(r, settings, &trust()))
            .collect()
    }

    fn jane() -> DirectoryUser {
        DirectoryUser {
            mail: Some("jane@contoso.com".into()),
            display_name: Some("Jane Doe".into()),
            job_title: Some("Engineer".into()),
            department: Some("R&D".into()),
            ..DirectoryUser::new("u1", "jane@contoso.com")
        }
    }

    #[test]
    fn test_user_entity() {
        let settings = settings_with(|c| c.entity_display_text_prefix = "Entra: ".into());
        let result = entities(&settings, vec![jane().into()], "jane");

        assert_eq!(result.len(), 1);
        let entity = &result[0];
        assert_eq!(entity.display_text, "Entra: Jane Doe");
        assert_eq!(entity.description, "EntraCP:jane@contoso.com");
        assert_eq!(entity.entity_type, sharepoint_entity_types::USER);
        assert_eq!(entity.claim.original_issuer, "TrustedProvider:Entra");
        assert_eq!(entity.entity_data[entity_data_keys::EMAIL], "jane@contoso.com");
        assert_eq!(entity.entity_data[entity_data_keys::JOB_TITLE], "Engineer");
        assert_eq!(entity.entity_data[entity_data_keys::DISPLAY_NAME], "Jane Doe");
    }

    #[test]
    fn test_group_entity() {
        let settings = settings_with(|_| {});
        let group = DirectoryGroup::new("g1", "AADGroup1");
        let result = entities(&settings, vec![group.into()], "AADGroup1");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].claim.value, "g1");
        assert_eq!(result[0].display_text, "AADGroup1");
        assert_eq!(result[0].entity_type, sharepoint_entity_types::FORMS_ROLE);
        assert_eq!(result[0].entity_group_name, "groups");
        assert_eq!(result[0].entity_data[entity_data_keys::DISPLAY_NAME], "AADGroup1");
    }

    #[test]
    fn test_secondary_claim_type_from_user() {
        let settings = settings_with(|c| {
            let job_title = c
                .claim_types
                .iter()
                .find(|i| i.entity_property == DirectoryObjectProperty::JobTitle)
                .unwrap()
                .clone();
            c.claim_types.remove_config(&job_title).unwrap();
            c.claim_types
                .add(
                    ClaimTypeConfig::builder(DirectoryObjectType::User, DirectoryObjectProperty::JobTitle)
                        .claim_type(claim_types::ROLE)
                        .display_name("Job")
                        .sharepoint_entity_type(sharepoint_entity_types::FORMS_ROLE)
                        .build(),
                )
                .unwrap();
        });
        let result = entities(&settings, vec![jane().into()], "Engineer");

        assert_eq!(result.len(), 1);
        let entity = &result[0];
        assert_eq!(entity.claim.claim_type, claim_types::ROLE);
        assert_eq!(entity.claim.value, "Engineer");
        assert_eq!(entity.display_text, "(Job) Engineer");
        assert_eq!(entity.entity_type, sharepoint_entity_types::FORMS_ROLE);
        assert!(entity.entity_data.is_empty());
    }
}

//! Shared fixtures for the claims provider integration tests.
//!
//! The directory holds one tenant with a few members, one guest and a few
//! groups; see [`seeded_directory`].

#![allow(dead_code)]

use entra_claims::EntraClaimsProvider;
use entra_claims::claims::TrustedLoginProvider;
use entra_claims::config::{
    ConfigurationStore, EntityProviderConfig, EntraIdTenant, InMemoryConfigurationStore,
    claim_types,
};
use entra_claims::directory::{DirectoryGroup, DirectoryUser, GUEST_USER_TYPE, InMemoryDirectory};
use std::sync::Arc;
use uuid::Uuid;

pub const TENANT: &str = "contoso.onmicrosoft.com";
pub const AAD_GROUP1_ID: &str = "5b0f6c56-c87f-44c3-9354-56cba03da433";
pub const AAD_GROUP10_ID: &str = "e2bf9d0c-2a54-4b8e-a5f5-d3a8b4c9d001";
pub const AAD_GROUP11_ID: &str = "a7a1c0f2-1d2e-4f11-8b6a-5e4f3c2b1a11";
pub const SALES_GROUP_ID: &str = "0c6d9a4e-7b1f-4d6c-9e2a-3f5b8c7d6e12";
pub const GUEST_UPN: &str = "guest_fabrikam.com#EXT#@contoso.onmicrosoft.com";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn trust() -> TrustedLoginProvider {
    TrustedLoginProvider::new("Entra", claim_types::UPN, [claim_types::GROUPS])
}

/// Default configuration with the test tenant.
pub fn default_configuration() -> EntityProviderConfig {
    let mut config = EntityProviderConfig::default_configuration("EntraCP", &trust());
    config
        .tenants
        .push(EntraIdTenant::with_client_secret(TENANT, "client-id", "client-secret"));
    config
}

fn member(id: &str, upn: &str, mail: Option<&str>, given: &str, surname: &str) -> DirectoryUser {
    DirectoryUser {
        mail: mail.map(str::to_string),
        display_name: Some(format!("{} {}", given, surname)),
        given_name: Some(given.to_string()),
        surname: Some(surname.to_string()),
        ..DirectoryUser::new(id, upn)
    }
}

/// Directory used by most tests:
///
/// | user | upn | mail | groups |
/// |------|-----|------|--------|
/// | John Smith | john@contoso.com | john@contoso.com | AADGroup1, Sales Team |
/// | Jane Doe | jane@contoso.com | jane.doe@contoso.com | AADGroup10 |
/// | Mary Major | mary@contoso.com | | |
/// | Fabrikam Guest (guest) | guest_fabrikam.com#EXT#@... | guest@fabrikam.com | AADGroup1 |
pub async fn seeded_directory() -> InMemoryDirectory {
    let directory = InMemoryDirectory::new();

    let mut john = member("u-john", "john@contoso.com", Some("john@contoso.com"), "John", "Smith");
    john.job_title = Some("Engineer".into());
    john.department = Some("R&D".into());
    directory.add_object(TENANT, john).await;
    directory
        .add_object(
            TENANT,
            member("u-jane", "jane@contoso.com", Some("jane.doe@contoso.com"), "Jane", "Doe"),
        )
        .await;
    directory
        .add_object(TENANT, member("u-mary", "mary@contoso.com", None, "Mary", "Major"))
        .await;
    directory
        .add_object(
            TENANT,
            DirectoryUser {
                mail: Some("guest@fabrikam.com".into()),
                display_name: Some("Fabrikam Guest".into()),
                user_type: Some(GUEST_USER_TYPE.into()),
                ..DirectoryUser::new("u-guest", GUEST_UPN)
            },
        )
        .await;

    directory
        .add_object(TENANT, DirectoryGroup::new(AAD_GROUP1_ID, "AADGroup1"))
        .await;
    directory
        .add_object(TENANT, DirectoryGroup::new(AAD_GROUP10_ID, "AADGroup10"))
        .await;
    directory
        .add_object(
            TENANT,
            DirectoryGroup {
                security_enabled: Some(false),
                ..DirectoryGroup::new(AAD_GROUP11_ID, "AADGroup11")
            },
        )
        .await;
    directory
        .add_object(TENANT, DirectoryGroup::new(SALES_GROUP_ID, "Sales Team"))
        .await;

    directory.add_member(TENANT, "u-john", AAD_GROUP1_ID).await;
    directory.add_member(TENANT, "u-john", SALES_GROUP_ID).await;
    directory.add_member(TENANT, "u-jane", AAD_GROUP10_ID).await;
    directory.add_member(TENANT, "u-guest", AAD_GROUP1_ID).await;
    directory
}

/// A claims provider over the seeded directory and its configuration store.
pub struct TestProvider {
    pub provider: EntraClaimsProvider<InMemoryDirectory>,
    pub store: Arc<InMemoryConfigurationStore>,
    pub configuration_id: Uuid,
}

impl TestProvider {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Provider whose default configuration is first changed by `edit`.
    pub async fn with_config(edit: impl FnOnce(&mut EntityProviderConfig)) -> Self {
        init_logging();
        let mut config = default_configuration();
        edit(&mut config);

        let store = Arc::new(InMemoryConfigurationStore::new());
        let created = store
            .create(config)
            .await
            .expect("Failed to store configuration");
        let provider = EntraClaimsProvider::new(
            "EntraCP",
            trust(),
            store.clone(),
            created.id,
            seeded_directory().await,
        );

        Self {
            provider,
            store,
            configuration_id: created.id,
        }
    }

    /// Apply `edit` to the stored configuration. Returns the new version.
    pub async fn update_config(&self, edit: impl FnOnce(&mut EntityProviderConfig)) -> u64 {
        let mut config = self
            .store
            .get(self.configuration_id)
            .await
            .expect("Failed to read configuration")
            .expect("Configuration not found");
        edit(&mut config);
        self.store
            .update(config)
            .await
            .expect("Failed to update configuration")
    }
}

//! Entra ID tenants queried by the claims provider.
//!
//! A tenant carries its own application credentials: either a client secret or
//! a certificate, never both. Certificates are persisted as an exported,
//! password-protected blob and imported again when the configuration is
//! loaded; the imported key is kept in memory only.

use crate::error::TenantError;
use crate::logging::LogCategory;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

/// National cloud hosting a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CloudInstance {
    #[default]
    AzurePublic,
    AzureChina,
    AzureGermany,
    AzureUsGovernment,
}

impl CloudInstance {
    /// Returns the Azure AD login endpoint for this cloud.
    pub fn login_endpoint(&self) -> &'static str {
        match self {
            Self::AzurePublic => "https://login.microsoftonline.com",
            Self::AzureChina => "https://login.chinacloudapi.cn",
            Self::AzureGermany => "https://login.microsoftonline.de",
            Self::AzureUsGovernment => "https://login.microsoftonline.us",
        }
    }

    /// Returns the Microsoft Graph endpoint for this cloud.
    pub fn graph_endpoint(&self) -> &'static str {
        match self {
            Self::AzurePublic => "https://graph.microsoft.com",
            Self::AzureChina => "https://microsoftgraph.chinacloudapi.cn",
            Self::AzureGermany => "https://graph.microsoft.de",
            Self::AzureUsGovernment => "https://graph.microsoft.us",
        }
    }
}

/// Certificate imported from its persisted blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedCertificate {
    pub raw: Vec<u8>,
    /// Upper-case hex SHA-256 of the raw blob.
    pub thumbprint: String,
    /// The private key lives in memory only and is never written back to a key store.
    pub ephemeral_key: bool,
}

/// Certificate credential: the persisted export plus its in-memory import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateCredential {
    /// Base64 of the password-protected export.
    pub exported_blob: String,
    pub password: String,
    #[serde(skip)]
    imported: Option<ImportedCertificate>,
}

impl PartialEq for CertificateCredential {
    fn eq(&self, other: &Self) -> bool {
        self.exported_blob == other.exported_blob && self.password == other.password
    }
}

impl CertificateCredential {
    /// Import a certificate from its exported blob.
    pub fn import(
        tenant: &str,
        exported_blob: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, TenantError> {
        let mut credential = Self {
            exported_blob: exported_blob.into(),
            password: password.into(),
            imported: None,
        };
        credential.reimport(tenant)?;
        Ok(credential)
    }

    /// Build a credential from raw certificate bytes, exporting them for persistence.
    pub fn from_bytes(raw: &[u8], password: impl Into<String>) -> Self {
        Self {
            exported_blob: BASE64.encode(raw),
            password: password.into(),
            imported: Some(Self::imported_from(raw.to_vec())),
        }
    }

    fn imported_from(raw: Vec<u8>) -> ImportedCertificate {
        let thumbprint = format!("{:X}", Sha256::digest(&raw));
        ImportedCertificate {
            raw,
            thumbprint,
            ephemeral_key: true,
        }
    }

    fn reimport(&mut self, tenant: &str) -> Result<(), TenantError> {
        let raw = BASE64
            .decode(self.exported_blob.trim())
            .map_err(|e| TenantError::CertificateImport {
                tenant: tenant.to_string(),
                reason: e.to_string(),
            })?;
        if raw.is_empty() {
            return Err(TenantError::CertificateImport {
                tenant: tenant.to_string(),
                reason: "certificate blob is empty".to_string(),
            });
        }
        self.imported = Some(Self::imported_from(raw));
        Ok(())
    }

    pub fn imported(&self) -> Option<&ImportedCertificate> {
        self.imported.as_ref()
    }

    /// The blob written to the configuration store.
    pub fn export(&self) -> &str {
        &self.exported_blob
    }
}

/// Application credentials of a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TenantCredentials {
    ClientSecret { secret: String },
    Certificate(CertificateCredential),
}

/// How the directory client authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialKind {
    ClientSecret,
    Certificate { thumbprint: String },
}

/// Authenticated client settings for one tenant, handed to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantClient {
    pub authority: String,
    pub graph_endpoint: String,
    pub scope: String,
    pub client_id: String,
    pub credential: CredentialKind,
    pub timeout: Duration,
    pub proxy: Option<String>,
}

/// One configured Entra ID tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntraIdTenant {
    pub identifier: Uuid,
    /// Tenant domain or id, e.g. `contoso.onmicrosoft.com`.
    pub name: String,
    pub client_id: String,
    pub credentials: TenantCredentials,
    #[serde(default)]
    pub cloud_instance: CloudInstance,
    #[serde(default)]
    pub exclude_guest_users: bool,
    #[serde(default)]
    pub exclude_member_users: bool,
    #[serde(skip)]
    client: Option<TenantClient>,
}

impl PartialEq for EntraIdTenant {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.name == other.name
            && self.client_id == other.client_id
            && self.credentials == other.credentials
            && self.cloud_instance == other.cloud_instance
            && self.exclude_guest_users == other.exclude_guest_users
            && self.exclude_member_users == other.exclude_member_users
    }
}

impl EntraIdTenant {
    /// Tenant authenticating with a client secret.
    pub fn with_client_secret(
        name: impl Into<String>,
        client_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            identifier: Uuid::new_v4(),
            name: name.into(),
            client_id: client_id.into(),
            credentials: TenantCredentials::ClientSecret {
                secret: secret.into(),
            },
            cloud_instance: CloudInstance::default(),
            exclude_guest_users: false,
            exclude_member_users: false,
            client: None,
        }
    }

    /// Tenant authenticating with a certificate.
    pub fn with_certificate(
        name: impl Into<String>,
        client_id: impl Into<String>,
        certificate: CertificateCredential,
    ) -> Self {
        let mut tenant = Self::with_client_secret(name, client_id, "");
        tenant.credentials = TenantCredentials::Certificate(certificate);
        tenant
    }

    /// Switch to a client secret, dropping any certificate.
    pub fn set_client_secret(&mut self, secret: impl Into<String>) {
        self.credentials = TenantCredentials::ClientSecret {
            secret: secret.into(),
        };
        self.client = None;
    }

    /// Switch to a certificate, dropping any client secret.
    pub fn set_certificate(&mut self, certificate: CertificateCredential) {
        self.credentials = TenantCredentials::Certificate(certificate);
        self.client = None;
    }

    pub fn validate(&self) -> Result<(), TenantError> {
        if self.name.trim().is_empty() {
            return Err(TenantError::MissingField {
                field: "name".to_string(),
            });
        }
        if self.client_id.trim().is_empty() {
            return Err(TenantError::MissingField {
                field: "clientId".to_string(),
            });
        }
        match &self.credentials {
            TenantCredentials::ClientSecret { secret } if secret.is_empty() => {
                return Err(TenantError::MissingCredentials(self.name.clone()));
            }
            TenantCredentials::Certificate(c) if c.exported_blob.is_empty() => {
                return Err(TenantError::MissingCredentials(self.name.clone()));
            }
            _ => {}
        }
        if self.exclude_guest_users && self.exclude_member_users {
            return Err(TenantError::ConflictingExclusions(self.name.clone()));
        }
        Ok(())
    }

    /// Re-import the certificate after loading from the store. Failures are
    /// logged and leave the tenant without a usable certificate.
    pub fn import_certificate(&mut self) {
        if let TenantCredentials::Certificate(certificate) = &mut self.credentials {
            if certificate.imported.is_none() {
                if let Err(e) = certificate.reimport(&self.name) {
                    error!(target: LogCategory::Core.target(), "{}", e);
                }
            }
        }
    }

    /// Client settings, once [`initialize_authentication`](Self::initialize_authentication) succeeded.
    pub fn client(&self) -> Option<&TenantClient> {
        self.client.as_ref()
    }

    /// Prepare the authenticated client. Does nothing if already initialized
    /// unless `force` is set. Returns whether a client is available.
    pub fn initialize_authentication(
        &mut self,
        timeout: Duration,
        proxy: Option<&str>,
        force: bool,
    ) -> bool {
        if self.client.is_some() && !force {
            return true;
        }
        self.client = None;

        if let Err(e) = self.validate() {
            error!(target: LogCategory::Core.target(), "{}", e);
            return false;
        }

        let credential = match &mut self.credentials {
            TenantCredentials::ClientSecret { .. } => CredentialKind::ClientSecret,
            TenantCredentials::Certificate(certificate) => {
                if certificate.imported.is_none() {
                    if let Err(e) = certificate.reimport(&self.name) {
                        error!(target: LogCategory::Core.target(), "{}", e);
                        return false;
                    }
                }
                match certificate.imported() {
                    Some(imported) => CredentialKind::Certificate {
                        thumbprint: imported.thumbprint.clone(),
                    },
                    None => return false,
                }
            }
        };

        let client = TenantClient {
            authority: format!("{}/{}", self.cloud_instance.login_endpoint(), self.name),
            graph_endpoint: self.cloud_instance.graph_endpoint().to_string(),
            scope: format!("{}/.default", self.cloud_instance.graph_endpoint()),
            client_id: self.client_id.clone(),
            credential,
            timeout,
            proxy: proxy.filter(|p| !p.is_empty()).map(str::to_string),
        };
        debug!(
            target: LogCategory::Core.target(),
            "Initialized authentication for tenant '{}' on {}",
            self.name, client.authority
        );
        self.client = Some(client);
        true
    }

    /// Whether a user of the given kind is kept for this tenant.
    pub fn includes_user(&self, is_guest: bool) -> bool {
        if is_guest {
            !self.exclude_guest_users
        } else {
            !self.exclude_member_users
        }
    }
}

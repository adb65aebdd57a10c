//! Storage account options
//!
//! Endpoint URLs are derived from the account name, or point at the local
//! Azurite emulator. Two option sets are equal when their endpoints and
//! credential kind match; the credential material itself is not compared.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fixed endpoint of a local Azurite emulator
pub const AZURITE_ENDPOINT: &str = "http://127.0.0.1:10000/";

/// Which service the endpoints point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AzureBackend {
    /// Azure Storage in the public cloud
    #[default]
    Azure,
    /// Local Azurite emulator
    Azurite,
}

impl std::fmt::Display for AzureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AzureBackend::Azure => write!(f, "azure"),
            AzureBackend::Azurite => write!(f, "azurite"),
        }
    }
}

impl std::str::FromStr for AzureBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azure" => Ok(AzureBackend::Azure),
            "azurite" => Ok(AzureBackend::Azurite),
            _ => Err(format!("Invalid backend: {s}")),
        }
    }
}

/// Tag describing how requests are authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsKind {
    #[default]
    Anonymous,
    /// Shared Key (account name + account key)
    StorageCredentials,
    /// Shared access signature appended to every URL
    SasToken,
}

/// Credential material
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Anonymous,
    SharedKey {
        account_name: String,
        account_key: String,
    },
    SasToken(String),
}

impl Credentials {
    pub fn kind(&self) -> CredentialsKind {
        match self {
            Credentials::Anonymous => CredentialsKind::Anonymous,
            Credentials::SharedKey { .. } => CredentialsKind::StorageCredentials,
            Credentials::SasToken(_) => CredentialsKind::SasToken,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Anonymous => write!(f, "Anonymous"),
            Credentials::SharedKey { account_name, .. } => f
                .debug_struct("SharedKey")
                .field("account_name", account_name)
                .field("account_key", &"<redacted>")
                .finish(),
            Credentials::SasToken(_) => write!(f, "SasToken(<redacted>)"),
        }
    }
}

/// Options for connecting to one storage account
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    pub backend: AzureBackend,
    pub account_blob_url: String,
    pub account_dfs_url: String,
    pub credentials_kind: CredentialsKind,
    pub credentials: Credentials,
}

impl StorageOptions {
    pub fn new(backend: AzureBackend) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    fn configure_endpoints(&mut self, account_name: &str) -> Result<()> {
        if account_name.is_empty() {
            return Err(Error::Config("Account name cannot be empty".to_string()));
        }
        match self.backend {
            AzureBackend::Azurite => {
                self.account_blob_url = format!("{AZURITE_ENDPOINT}{account_name}/");
                self.account_dfs_url = format!("{AZURITE_ENDPOINT}{account_name}/");
            }
            AzureBackend::Azure => {
                self.account_dfs_url = format!("https://{account_name}.dfs.core.windows.net/");
                self.account_blob_url = format!("https://{account_name}.blob.core.windows.net/");
            }
        }
        Ok(())
    }

    /// Authorize with the account key (Shared Key)
    pub fn configure_account_key_credentials(
        &mut self,
        account_name: &str,
        account_key: &str,
    ) -> Result<()> {
        self.configure_endpoints(account_name)?;
        self.set_credentials(Credentials::SharedKey {
            account_name: account_name.to_string(),
            account_key: account_key.to_string(),
        });
        Ok(())
    }

    /// Authorize with a shared access signature
    pub fn configure_sas_credentials(&mut self, account_name: &str, sas_token: &str) -> Result<()> {
        self.configure_endpoints(account_name)?;
        let token = sas_token.trim_start_matches('?');
        self.set_credentials(Credentials::SasToken(token.to_string()));
        Ok(())
    }

    /// Unauthenticated access (public containers)
    pub fn configure_anonymous(&mut self, account_name: &str) -> Result<()> {
        self.configure_endpoints(account_name)?;
        self.set_credentials(Credentials::Anonymous);
        Ok(())
    }

    /// Replace the derived blob endpoint, e.g. for a custom domain
    pub fn with_blob_endpoint(mut self, url: impl Into<String>) -> Self {
        self.account_blob_url = url.into();
        self
    }

    fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials_kind = credentials.kind();
        self.credentials = credentials;
    }
}

impl PartialEq for StorageOptions {
    fn eq(&self, other: &Self) -> bool {
        self.account_dfs_url == other.account_dfs_url
            && self.account_blob_url == other.account_blob_url
            && self.credentials_kind == other.credentials_kind
    }
}

impl Eq for StorageOptions {}

//! Configuration file management
//!
//! Profiles are stored in `config.toml` under `$BFS_CONFIG_DIR`, or under
//! the platform configuration directory (`~/.config/blobfs` on Linux).
//! Each profile names a storage account and how to authorize against it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::options::{AzureBackend, StorageOptions};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "BFS_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Retry settings for callers that wrap adapter calls in a retry loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
        }
    }
}

/// A named storage account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name, used as the first segment of CLI paths
    pub name: String,

    /// Storage account name
    pub account_name: String,

    /// Azure or the local emulator
    #[serde(default)]
    pub backend: AzureBackend,

    /// Account key for Shared Key authorization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_key: Option<String>,

    /// Shared access signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sas_token: Option<String>,

    /// Custom blob endpoint replacing the derived one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

impl Profile {
    /// Create an anonymous Azure profile
    pub fn new(name: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account_name: account_name.into(),
            backend: AzureBackend::Azure,
            account_key: None,
            sas_token: None,
            blob_endpoint: None,
            retry: None,
        }
    }

    /// How requests made with this profile are authorized
    pub fn auth_label(&self) -> &'static str {
        match (&self.account_key, &self.sas_token) {
            (Some(_), _) => "shared-key",
            (None, Some(_)) => "sas",
            (None, None) => "anonymous",
        }
    }

    /// Build the storage options this profile describes
    pub fn to_options(&self) -> Result<StorageOptions> {
        let mut options = StorageOptions::new(self.backend);
        match (&self.account_key, &self.sas_token) {
            (Some(_), Some(_)) => {
                return Err(Error::Config(format!(
                    "Profile '{}' sets both an account key and a SAS token",
                    self.name
                )));
            }
            (Some(key), None) => {
                options.configure_account_key_credentials(&self.account_name, key)?
            }
            (None, Some(token)) => options.configure_sas_credentials(&self.account_name, token)?,
            (None, None) => options.configure_anonymous(&self.account_name)?,
        }
        if let Some(endpoint) = &self.blob_endpoint {
            options = options.with_blob_endpoint(endpoint.clone());
        }
        Ok(options)
    }
}

/// Contents of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            profiles: Vec::new(),
        }
    }
}

impl Config {
    pub fn get(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    /// Add or replace a profile, keeping profiles sorted by name
    pub fn set(&mut self, profile: Profile) {
        self.profiles.retain(|p| p.name != profile.name);
        self.profiles.push(profile);
        self.profiles.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.name != name);
        if self.profiles.len() == before {
            return Err(Error::ProfileNotFound(name.to_string()));
        }
        Ok(())
    }
}

/// Loads and saves the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Use `$BFS_CONFIG_DIR` or the platform configuration directory
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Cannot determine config directory".to_string()))?
                .join("blobfs"),
        };
        Ok(Self::with_dir(dir))
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the configuration; a missing file yields an empty one
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let config: Config = toml::from_str(&contents)?;
        if config.version > CONFIG_VERSION {
            return Err(Error::Config(format!(
                "Unsupported config version {} in {}",
                config.version,
                self.path.display()
            )));
        }
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, contents)?;

        // Profiles may hold account keys
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }
}

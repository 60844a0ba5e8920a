use crate::error::{BootstrapError, Result};
use crate::keystore::KeystoreValidation;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the bootstrap reads. Built once at startup and passed in explicitly.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct BootstrapConfig {
    #[serde(default)]
    pub ssl: SslConfig,
    #[serde(default)]
    pub secret_store: SecretStoreConfig,
    #[serde(default)]
    pub resources: ResourceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SslConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Destination of the PKCS#12 file. Empty disables generation.
    #[serde(default)]
    pub keystore_path: String,
    #[serde(default = "default_keystore_password")]
    pub keystore_password: String,
    #[serde(default = "default_key_alias")]
    pub key_alias: String,
    #[serde(default = "default_cert_path")]
    pub cert_path: String,
    #[serde(default = "default_key_path")]
    pub key_path: String,
    /// When set, certificate material comes from this secret and the local paths are ignored.
    #[serde(default)]
    pub remote_secret_name: Option<String>,
    #[serde(default)]
    pub keystore_validation: KeystoreValidation,
}

impl SslConfig {
    pub fn remote_secret_name(&self) -> Option<&str> {
        non_empty(self.remote_secret_name.as_deref())
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            keystore_path: String::new(),
            keystore_password: default_keystore_password(),
            key_alias: default_key_alias(),
            cert_path: default_cert_path(),
            key_path: default_key_path(),
            remote_secret_name: None,
            keystore_validation: KeystoreValidation::default(),
        }
    }
}

impl fmt::Debug for SslConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SslConfig")
            .field("enabled", &self.enabled)
            .field("keystore_path", &self.keystore_path)
            .field("keystore_password", &"<redacted>")
            .field("key_alias", &self.key_alias)
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .field("remote_secret_name", &self.remote_secret_name)
            .field("keystore_validation", &self.keystore_validation)
            .finish()
    }
}

fn default_enabled() -> bool {
    true
}

fn default_keystore_password() -> String {
    "changeit".to_string()
}

fn default_key_alias() -> String {
    "tls-server".to_string()
}

fn default_cert_path() -> String {
    "resource:certs/certificate.pem".to_string()
}

fn default_key_path() -> String {
    "resource:certs/private-key.pem".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct SecretStoreConfig {
    /// Base URL of the secret store API.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding a bearer token for the store.
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

impl SecretStoreConfig {
    pub fn endpoint(&self) -> Option<&str> {
        non_empty(self.endpoint.as_deref())
    }

    /// Reads the token from the configured environment variable, if any.
    pub fn auth_token(&self) -> Option<String> {
        let var = non_empty(self.auth_token_env.as_deref())?;
        std::env::var(var).ok().filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ResourceConfig {
    /// Directory that `resource:` paths resolve against.
    #[serde(default = "default_resource_root")]
    pub root: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            root: default_resource_root(),
        }
    }
}

fn default_resource_root() -> PathBuf {
    PathBuf::from("resources")
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    #[serde(default)]
    pub remote_secret_name: Option<String>,
}

impl DatabaseConfig {
    pub fn remote_secret_name(&self) -> Option<&str> {
        non_empty(self.remote_secret_name.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl BootstrapConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            BootstrapError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            log::info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

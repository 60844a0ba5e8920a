pub mod certs;
pub mod config;
pub mod error;
pub mod key;
pub mod keystore;
pub mod pem;
pub mod resolver;
pub mod resources;
pub mod secrets;
pub mod utils;

use config::BootstrapConfig;
use resolver::MaterialSource;
use resources::ResourceLoader;
use secrets::{DatabaseCredentials, HttpSecretStore, SecretStore};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// What the TLS listener needs to open the keystore.
#[derive(Clone, PartialEq, Eq)]
pub struct KeystoreHandoff {
    pub path: PathBuf,
    pub password: String,
    pub alias: String,
}

impl fmt::Debug for KeystoreHandoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreHandoff")
            .field("path", &self.path)
            .field("password", &"<redacted>")
            .field("alias", &self.alias)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// `enabled = false`.
    Disabled,
    /// No keystore path configured.
    Skipped,
    /// An existing keystore passed validation and was left alone.
    Reused(KeystoreHandoff),
    Generated(KeystoreHandoff),
}

impl BootstrapOutcome {
    pub fn handoff(&self) -> Option<&KeystoreHandoff> {
        match self {
            BootstrapOutcome::Reused(handoff) | BootstrapOutcome::Generated(handoff) => {
                Some(handoff)
            }
            BootstrapOutcome::Disabled | BootstrapOutcome::Skipped => None,
        }
    }
}

/// Startup routine that makes sure a PKCS#12 keystore exists before TLS is configured.
pub struct KeystoreBootstrap {
    config: BootstrapConfig,
    secret_store: Option<Box<dyn SecretStore>>,
    resources: ResourceLoader,
}

impl KeystoreBootstrap {
    /// Bootstrap without a secret store. Resources resolve against `config.resources.root`.
    pub fn new(config: BootstrapConfig) -> Self {
        let resources = ResourceLoader::new(config.resources.root.clone());
        KeystoreBootstrap {
            config,
            secret_store: None,
            resources,
        }
    }

    /// Bootstrap wired to the HTTP secret store when `secret-store.endpoint` is set.
    pub fn from_config(config: BootstrapConfig) -> Result<Self> {
        let store = match config.secret_store.endpoint() {
            Some(_) => Some(HttpSecretStore::from_config(&config.secret_store)?),
            None => None,
        };
        let bootstrap = KeystoreBootstrap::new(config);
        Ok(match store {
            Some(store) => bootstrap.with_secret_store(Box::new(store)),
            None => bootstrap,
        })
    }

    pub fn with_secret_store(mut self, store: Box<dyn SecretStore>) -> Self {
        self.secret_store = Some(store);
        self
    }

    pub fn with_resources(mut self, resources: ResourceLoader) -> Self {
        self.resources = resources;
        self
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Produce the keystore unless it is disabled, unconfigured or already present.
    ///
    /// Returns:
    /// - Ok: what happened, with the keystore coordinates when one is available
    /// - Error: any failure; the caller must not start TLS without a keystore
    pub fn run(&self) -> Result<BootstrapOutcome> {
        let ssl = &self.config.ssl;
        if !ssl.enabled {
            log::info!("SSL is disabled, skipping keystore generation");
            return Ok(BootstrapOutcome::Disabled);
        }
        if ssl.keystore_path.trim().is_empty() {
            log::warn!("Keystore path not configured (ssl.keystore-path), skipping keystore generation");
            return Ok(BootstrapOutcome::Skipped);
        }

        let handoff = KeystoreHandoff {
            path: PathBuf::from(&ssl.keystore_path),
            password: ssl.keystore_password.clone(),
            alias: ssl.key_alias.clone(),
        };

        if keystore::is_reusable(
            &handoff.path,
            ssl.keystore_validation,
            &handoff.password,
            &handoff.alias,
        ) {
            log::info!("Valid keystore already exists at: {}", handoff.path.display());
            return Ok(BootstrapOutcome::Reused(handoff));
        }

        log::info!("Generating PKCS12 keystore from PEM material...");
        let source = MaterialSource::from_config(ssl);
        let material = resolver::resolve(&source, self.secret_store.as_deref(), &self.resources)?;
        generate(
            material.cert_path(),
            material.key_path(),
            &handoff.path,
            &handoff.password,
            &handoff.alias,
        )?;
        drop(material);

        Ok(BootstrapOutcome::Generated(handoff))
    }

    /// Fetch database credentials when `database.remote-secret-name` is configured.
    pub fn database_credentials(&self) -> Result<Option<DatabaseCredentials>> {
        let Some(name) = self.config.database.remote_secret_name() else {
            return Ok(None);
        };
        let store = self.secret_store.as_deref().ok_or_else(|| {
            error::BootstrapError::Config(format!(
                "secret {name} configured but no secret store is available"
            ))
        })?;
        secrets::resolve_database_credentials(store, name)
    }
}

/// Build a keystore at `keystore_path` from PEM files, replacing whatever is there.
pub fn generate<C, K, D>(
    cert_path: C,
    key_path: K,
    keystore_path: D,
    password: &str,
    alias: &str,
) -> Result<()>
where
    C: AsRef<Path>,
    K: AsRef<Path>,
    D: AsRef<Path>,
{
    let certificate = certs::load_certificate(cert_path)?;
    let private_key = key::load_private_key(key_path)?;
    keystore::assemble(&certificate, &private_key, keystore_path, password, alias)
}

use std::fmt::Display;

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BootstrapError {
    /// A configured path or bundled resource does not exist or cannot be read.
    ResourceNotFound(String),
    MalformedCertificate(String),
    /// The key could not be parsed under `label`, including after relabelling.
    MalformedPrivateKey { label: String, reason: String },
    SecretFetchFailure(String),
    /// Name of the JSON field that was absent or empty.
    SecretFieldMissing(String),
    KeystoreWriteFailure(String),
    KeystoreAssemblyFailure(String),
    KeystoreOpenFailure(String),
    Config(String),
}

impl BootstrapError {
    /// Short name of the failure class, used as a log prefix by the binary.
    pub fn kind(&self) -> &'static str {
        match self {
            BootstrapError::ResourceNotFound(_) => "ResourceNotFound",
            BootstrapError::MalformedCertificate(_) => "MalformedCertificate",
            BootstrapError::MalformedPrivateKey { .. } => "MalformedPrivateKey",
            BootstrapError::SecretFetchFailure(_) => "SecretFetchFailure",
            BootstrapError::SecretFieldMissing(_) => "SecretFieldMissing",
            BootstrapError::KeystoreWriteFailure(_) => "KeystoreWriteFailure",
            BootstrapError::KeystoreAssemblyFailure(_) => "KeystoreAssemblyFailure",
            BootstrapError::KeystoreOpenFailure(_) => "KeystoreOpenFailure",
            BootstrapError::Config(_) => "Config",
        }
    }
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapError::ResourceNotFound(msg) => write!(f, "resource not found: {msg}"),
            BootstrapError::MalformedCertificate(msg) => write!(f, "malformed certificate: {msg}"),
            BootstrapError::MalformedPrivateKey { label, reason } => {
                write!(f, "malformed private key (label {label}): {reason}")
            }
            BootstrapError::SecretFetchFailure(msg) => write!(f, "failed to fetch secret: {msg}"),
            BootstrapError::SecretFieldMissing(field) => {
                write!(f, "secret does not contain a '{field}' field")
            }
            BootstrapError::KeystoreWriteFailure(msg) => {
                write!(f, "failed to write keystore: {msg}")
            }
            BootstrapError::KeystoreAssemblyFailure(msg) => {
                write!(f, "failed to assemble keystore: {msg}")
            }
            BootstrapError::KeystoreOpenFailure(msg) => write!(f, "failed to open keystore: {msg}"),
            BootstrapError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<openssl::error::ErrorStack> for BootstrapError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        BootstrapError::KeystoreAssemblyFailure(format!("{err}"))
    }
}

impl From<ureq::Error> for BootstrapError {
    fn from(err: ureq::Error) -> Self {
        BootstrapError::SecretFetchFailure(format!("{err}"))
    }
}

impl From<toml::de::Error> for BootstrapError {
    fn from(err: toml::de::Error) -> Self {
        BootstrapError::Config(format!("{err}"))
    }
}

//! Remote secret store access.
//!
//! The store is reached through [`SecretStore`]; [`HttpSecretStore`] talks to any endpoint
//! that understands the Secrets Manager `GetSecretValue` JSON action (the AWS API itself via
//! a signing proxy, LocalStack, or an in-cluster sidecar).

use crate::config::SecretStoreConfig;
use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const GET_SECRET_VALUE_TARGET: &str = "secretsmanager.GetSecretValue";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Look up a secret's string value by name.
pub trait SecretStore {
    fn get_secret(&self, name: &str) -> Result<String>;
}

pub struct HttpSecretStore {
    endpoint: String,
    auth_token: Option<String>,
    agent: ureq::Agent,
}

impl HttpSecretStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpSecretStore {
            endpoint: endpoint.into(),
            auth_token: None,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn from_config(config: &SecretStoreConfig) -> Result<Self> {
        let endpoint = config.endpoint().ok_or_else(|| {
            BootstrapError::Config("secret-store.endpoint is required for remote secrets".into())
        })?;
        let store = HttpSecretStore::new(endpoint);
        Ok(match config.auth_token() {
            Some(token) => store.with_auth_token(token),
            None => store,
        })
    }
}

impl SecretStore for HttpSecretStore {
    fn get_secret(&self, name: &str) -> Result<String> {
        log::info!("Retrieving secret {name} from {}", self.endpoint);
        let mut request = self
            .agent
            .post(&self.endpoint)
            .set("X-Amz-Target", GET_SECRET_VALUE_TARGET)
            .set("Content-Type", CONTENT_TYPE);
        if let Some(token) = &self.auth_token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let body = serde_json::json!({ "SecretId": name }).to_string();
        let response = match request.send_string(&body) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let detail = response.into_string().unwrap_or_default();
                log::error!("Secret store returned {code} for {name}");
                return Err(BootstrapError::SecretFetchFailure(format!(
                    "{name}: HTTP {code}: {detail}"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let text = response
            .into_string()
            .map_err(|e| BootstrapError::SecretFetchFailure(format!("{name}: {e}")))?;
        secret_string_from_response(name, &text)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSecretValueResponse {
    #[serde(default)]
    secret_string: Option<String>,
}

fn secret_string_from_response(name: &str, text: &str) -> Result<String> {
    let response: GetSecretValueResponse = serde_json::from_str(text)
        .map_err(|e| BootstrapError::SecretFetchFailure(format!("{name}: {e}")))?;
    response.secret_string.ok_or_else(|| {
        BootstrapError::SecretFetchFailure(format!("{name}: secret does not contain a string value"))
    })
}

/// Certificate material as stored in a JSON secret.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateSecret {
    pub certificate: String,
    pub private_key: String,
}

impl fmt::Debug for CertificateSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateSecret")
            .field("certificate", &format!("{} bytes", self.certificate.len()))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl CertificateSecret {
    /// Decode `{"certificate": "...", "privateKey": "..."}`. Both fields must be non-empty
    /// strings.
    pub fn from_json(text: &str) -> Result<Self> {
        let object = json_object(text)?;
        Ok(CertificateSecret {
            certificate: required_field(&object, "certificate")?,
            private_key: required_field(&object, "privateKey")?,
        })
    }
}

pub fn fetch_certificate_secret(store: &dyn SecretStore, name: &str) -> Result<CertificateSecret> {
    let secret = store.get_secret(name)?;
    CertificateSecret::from_json(&secret)
}

/// Database connection settings kept in a JSON secret. Every field is optional.
/// Numbers and booleans are taken as their text form; `null`, arrays and objects count as
/// absent.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseCredentials {
    #[serde(
        default,
        deserialize_with = "scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
}

fn scalar_as_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

impl DatabaseCredentials {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.url.is_none()
    }
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("url", &self.url)
            .finish()
    }
}

/// Fetch database credentials from the secret `name`. A secret holding none of `username`,
/// `password` or `url` yields `None`.
pub fn resolve_database_credentials(
    store: &dyn SecretStore,
    name: &str,
) -> Result<Option<DatabaseCredentials>> {
    log::info!("Loading database credentials from secret {name}");
    let secret = store.get_secret(name)?;
    let credentials: DatabaseCredentials = serde_json::from_str(&secret)
        .map_err(|e| BootstrapError::SecretFetchFailure(format!("{name}: {e}")))?;

    if credentials.is_empty() {
        log::warn!("Secret {name} contained no 'username', 'password', or 'url' keys");
        return Ok(None);
    }
    Ok(Some(credentials))
}

fn json_object(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(BootstrapError::SecretFetchFailure(
            "secret is not a JSON object".into(),
        )),
        Err(e) => Err(BootstrapError::SecretFetchFailure(format!(
            "secret is not valid JSON: {e}"
        ))),
    }
}

fn required_field(object: &Map<String, Value>, field: &str) -> Result<String> {
    match object.get(field).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(BootstrapError::SecretFieldMissing(field.to_string())),
    }
}

//! PKCS#12 keystore assembly, presence checks and inspection.

use crate::certs::Certificate;
use crate::error::{BootstrapError, Result};
use crate::key::PrivateKey;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private, Public};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;

/// How much the validator checks before an existing keystore is reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeystoreValidation {
    /// The file exists and is readable. Its contents are not examined.
    #[default]
    Exists,
    /// The file also opens with the keystore password and holds the expected alias.
    Open,
}

/// Build a PKCS#12 container holding `key` and the single-element chain `[certificate]`
/// under `alias`, and write it to `destination`, replacing any existing file.
///
/// OpenSSL refuses a key that does not belong to the certificate, so a mismatched pair fails
/// with `KeystoreAssemblyFailure` and `destination` is left untouched.
pub fn assemble<P: AsRef<Path>>(
    certificate: &Certificate,
    key: &PrivateKey,
    destination: P,
    password: &str,
    alias: &str,
) -> Result<()> {
    let destination = destination.as_ref();
    let der = build_pkcs12(certificate, key, password, alias)?;
    write_atomically(destination, &der)?;
    log::info!(
        "PKCS12 keystore written to {} with alias {alias}",
        destination.display()
    );
    Ok(())
}

fn build_pkcs12(
    certificate: &Certificate,
    key: &PrivateKey,
    password: &str,
    alias: &str,
) -> Result<Vec<u8>> {
    let mut builder = Pkcs12::builder();
    builder
        .name(alias)
        .pkey(key.pkey())
        .cert(certificate.x509());
    let pkcs12 = builder.build2(password)?;
    Ok(pkcs12.to_der()?)
}

/// Stage the bytes next to `destination` and rename over it.
fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    let write_error = |e: std::io::Error| {
        BootstrapError::KeystoreWriteFailure(format!("{}: {e}", destination.display()))
    };

    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".keystore-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(write_error)?;
    staged.write_all(bytes).map_err(write_error)?;
    staged.as_file().sync_all().map_err(write_error)?;
    staged
        .persist(destination)
        .map_err(|e| write_error(e.error))?;
    Ok(())
}

/// True when `path` exists and can be opened for reading. Nothing about the contents is
/// checked.
pub fn is_present<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    match std::fs::File::open(path) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("Keystore not readable at {}: {e}", path.display());
            false
        }
    }
}

/// Decide whether an existing keystore at `path` can be reused.
pub fn is_reusable<P: AsRef<Path>>(
    path: P,
    mode: KeystoreValidation,
    password: &str,
    alias: &str,
) -> bool {
    let path = path.as_ref();
    if !is_present(path) {
        return false;
    }
    match mode {
        KeystoreValidation::Exists => true,
        KeystoreValidation::Open => match open(path, password) {
            Ok(contents) if contents.alias.as_deref() == Some(alias) => true,
            Ok(contents) => {
                log::warn!(
                    "Keystore at {} holds alias {:?}, expected {alias}",
                    path.display(),
                    contents.alias
                );
                false
            }
            Err(e) => {
                log::warn!("Existing keystore at {} is unusable: {e}", path.display());
                false
            }
        },
    }
}

/// The entry recovered from a keystore file.
#[derive(Debug)]
pub struct KeystoreContents {
    /// Friendly name of the key entry, if one was stored.
    pub alias: Option<String>,
    pub certificate: Certificate,
    pub private_key: PKey<Private>,
    /// Certificates beyond the leaf.
    pub chain_len: usize,
}

impl KeystoreContents {
    /// Whether the private key belongs to the certificate's public key.
    pub fn key_matches_certificate(&self) -> bool {
        match self.certificate.x509().public_key() {
            Ok(public) => self.private_key.public_eq::<Public>(&public),
            Err(_) => false,
        }
    }
}

/// Open the PKCS#12 file at `path` with `password`.
pub fn open<P: AsRef<Path>>(path: P, password: &str) -> Result<KeystoreContents> {
    let path = path.as_ref();
    let der = std::fs::read(path)
        .map_err(|e| BootstrapError::ResourceNotFound(format!("{}: {e}", path.display())))?;
    let parsed = Pkcs12::from_der(&der)
        .and_then(|pkcs12| pkcs12.parse2(password))
        .map_err(|e| BootstrapError::KeystoreOpenFailure(format!("{}: {e}", path.display())))?;

    let cert = parsed.cert.ok_or_else(|| {
        BootstrapError::KeystoreOpenFailure(format!("{}: no certificate entry", path.display()))
    })?;
    let private_key = parsed.pkey.ok_or_else(|| {
        BootstrapError::KeystoreOpenFailure(format!("{}: no private key entry", path.display()))
    })?;
    let alias = cert
        .alias()
        .map(|raw| String::from_utf8_lossy(raw).into_owned());
    let chain_len = parsed.ca.map_or(0, |ca| ca.len());

    Ok(KeystoreContents {
        alias,
        certificate: Certificate::new(cert),
        private_key,
        chain_len,
    })
}

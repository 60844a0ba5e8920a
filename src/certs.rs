use crate::error::{BootstrapError, Result};
use crate::pem::{normalize, parse_pem, PemLabel, PemObject};
use openssl::hash::MessageDigest;
use openssl::x509::X509;
use std::path::Path;
use x509_parser::prelude::parse_x509_certificate;

/// A parsed X.509 leaf certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    inner: X509,
}

impl Certificate {
    pub fn new(inner: X509) -> Self {
        Certificate { inner }
    }

    pub fn x509(&self) -> &X509 {
        &self.inner
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| BootstrapError::MalformedCertificate(format!("{e}")))
    }

    /// Hex-encoded SHA-256 over the DER encoding.
    pub fn fingerprint(&self) -> Result<String> {
        let digest = self
            .inner
            .digest(MessageDigest::sha256())
            .map_err(|e| BootstrapError::MalformedCertificate(format!("{e}")))?;
        Ok(hex::encode(digest))
    }

    pub fn summary(&self) -> Result<CertificateSummary> {
        let der = self.to_der()?;
        let (_, cert) = parse_x509_certificate(&der)
            .map_err(|e| BootstrapError::MalformedCertificate(format!("{e}")))?;
        let validity = cert.validity();
        Ok(CertificateSummary {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before: validity.not_before.to_string(),
            not_after: validity.not_after.to_string(),
            currently_valid: validity.is_valid(),
            fingerprint: self.fingerprint()?,
        })
    }
}

/// Human-readable facts about a certificate, for logs and `inspect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub not_before: String,
    pub not_after: String,
    pub currently_valid: bool,
    pub fingerprint: String,
}

/// Read a PEM certificate from `path`.
pub fn load_certificate<P: AsRef<Path>>(path: P) -> Result<Certificate> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| BootstrapError::ResourceNotFound(format!("{}: {e}", path.display())))?;
    let certificate = parse_certificate(&content)?;

    match certificate.summary() {
        Ok(summary) => {
            log::info!(
                "Certificate loaded from {}: subject={}, expires={}, sha256={}",
                path.display(),
                summary.subject,
                summary.not_after,
                summary.fingerprint
            );
            if !summary.currently_valid {
                log::warn!(
                    "Certificate {} is outside its validity window ({} to {})",
                    summary.subject,
                    summary.not_before,
                    summary.not_after
                );
            }
        }
        Err(e) => log::debug!("Could not summarize certificate {}: {e}", path.display()),
    }

    Ok(certificate)
}

/// Parse PEM text holding one `CERTIFICATE` block, tolerating flattened whitespace.
pub fn parse_certificate(content: &str) -> Result<Certificate> {
    let canonical = normalize(content, PemLabel::Certificate);
    match parse_pem(&canonical) {
        Ok(PemObject::Certificate(x509)) => Ok(Certificate::new(x509)),
        Ok(other) => Err(BootstrapError::MalformedCertificate(format!(
            "expected a certificate, got {}",
            other.kind()
        ))),
        Err(e) => Err(BootstrapError::MalformedCertificate(format!("{e}"))),
    }
}

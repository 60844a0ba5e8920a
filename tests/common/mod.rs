#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509NameBuilder, X509};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Self-signed CN=localhost material written to a temporary directory in every
/// encoding the loaders accept.
pub struct Fixture {
    pub dir: TempDir,
    pub cert: X509,
    pub key: PKey<Private>,
    pub cert_pem: String,
    pub pkcs8_pem: String,
    pub pkcs1_pem: String,
}

impl Fixture {
    pub fn new() -> Self {
        let rsa = Rsa::generate(2048).unwrap();
        let key = PKey::from_rsa(rsa).unwrap();
        let cert = self_signed(&key);

        let cert_pem = String::from_utf8(cert.to_pem().unwrap()).unwrap();
        let pkcs8_pem = String::from_utf8(key.private_key_to_pem_pkcs8().unwrap()).unwrap();
        let pkcs1_pem =
            String::from_utf8(key.rsa().unwrap().private_key_to_pem().unwrap()).unwrap();

        let fixture = Fixture {
            dir: tempfile::tempdir().unwrap(),
            cert,
            key,
            cert_pem,
            pkcs8_pem,
            pkcs1_pem,
        };
        fixture.write("certificate.pem", &fixture.cert_pem);
        fixture.write("pkcs8-key.pem", &fixture.pkcs8_pem);
        fixture.write("pkcs1-key.pem", &fixture.pkcs1_pem);
        fixture.write("mislabeled-key.pem", &fixture.mislabeled_pem());
        fixture
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// PKCS#8 payload under `RSA PRIVATE KEY` markers.
    pub fn mislabeled_pem(&self) -> String {
        self.pkcs8_pem.replace("PRIVATE KEY-----", "RSA PRIVATE KEY-----")
    }

    pub fn cert_der(&self) -> Vec<u8> {
        self.cert.to_der().unwrap()
    }
}

/// Collapse a PEM document onto one line, the way secret stores tend to hand it back.
pub fn flatten(pem: &str) -> String {
    pem.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn self_signed(key: &PKey<Private>) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
}

pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

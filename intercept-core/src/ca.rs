use crate::error::InterceptError;
use crate::Result;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose, PKCS_ECDSA_P256_SHA256,
};
use std::fs;
use std::path::Path;
use time::{Duration, OffsetDateTime};
use tracing::info;

const CA_CERT_FILE: &str = "ca.pem";
const CA_KEY_FILE: &str = "ca.key";

/// Local root CA used by the proxy to answer intercepted HTTPS requests.
///
/// The rendering surface must trust `ca.pem` for substitutions on HTTPS URLs
/// to be accepted.
pub struct CertificateAuthority {
    ca_cert: Certificate,
}

impl CertificateAuthority {
    /// Load the CA from `ca_dir`, generating and saving one on first use.
    ///
    /// On reload only `ca.key` is read. The certificate is re-issued around that
    /// key with the same subject, so its serial and validity dates differ from
    /// the saved `ca.pem`. Chains still verify against the saved file because
    /// the issuer name and signing key are unchanged; `ca.pem` is never rewritten.
    pub fn load_or_generate(ca_dir: &Path) -> Result<Self> {
        let cert_path = ca_dir.join(CA_CERT_FILE);
        let key_path = ca_dir.join(CA_KEY_FILE);

        if cert_path.exists() && key_path.exists() {
            let key_pem = fs::read_to_string(&key_path)?;
            return Self::from_key_pem(&key_pem);
        }

        fs::create_dir_all(ca_dir)?;
        let ca = Self::build(KeyPair::generate(&PKCS_ECDSA_P256_SHA256).map_err(cert_err)?)?;
        fs::write(&cert_path, ca.cert_pem()?)?;
        fs::write(&key_path, ca.ca_cert.serialize_private_key_pem())?;
        info!("Generated local CA at {}", cert_path.display());
        Ok(ca)
    }

    /// Rebuild the CA certificate around an existing private key.
    pub fn from_key_pem(key_pem: &str) -> Result<Self> {
        let key_pair = KeyPair::from_pem(key_pem).map_err(cert_err)?;
        Self::build(key_pair)
    }

    fn build(key_pair: KeyPair) -> Result<Self> {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "WebView Intercept CA");
        dn.push(DnType::OrganizationName, "WebView Intercept");
        params.distinguished_name = dn;
        params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];

        let not_before = OffsetDateTime::now_utc() - Duration::days(1);
        params.not_before = not_before;
        params.not_after = not_before + Duration::days(365 * 10);
        params.key_pair = Some(key_pair);

        let ca_cert = Certificate::from_params(params).map_err(cert_err)?;
        Ok(Self { ca_cert })
    }

    pub fn cert_pem(&self) -> Result<String> {
        self.ca_cert.serialize_pem().map_err(cert_err)
    }

    /// Certificate in DER form, as rustls expects it.
    pub fn cert_der(&self) -> Result<Vec<u8>> {
        self.ca_cert.serialize_der().map_err(cert_err)
    }

    pub fn key_der(&self) -> Vec<u8> {
        self.ca_cert.serialize_private_key_der()
    }
}

fn cert_err(e: rcgen::Error) -> InterceptError {
    InterceptError::Certificate(e.to_string())
}

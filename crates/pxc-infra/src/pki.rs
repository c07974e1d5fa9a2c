//! PKI operations for cluster TLS material
//!
//! Every call to [`SelfSignedIssuer::issue`] mints a brand new certificate
//! authority and signs exactly one leaf certificate with it. The CA key is
//! dropped afterwards; nothing here is able to re-sign or renew.
//!
//! # Output
//!
//! - `ca.crt`: PEM-encoded self-signed CA certificate
//! - `tls.crt`: PEM-encoded leaf certificate carrying the requested SANs
//! - `tls.key`: PEM-encoded PKCS#8 private key of the leaf

use rcgen::{
    string::Ia5String, BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType,
};
use thiserror::Error;
use tracing::debug;
use x509_parser::prelude::*;

/// Default validity period for CA certificates (10 years)
pub const CA_VALIDITY_YEARS: i64 = 10;

/// Default validity period for leaf certificates (1 year)
pub const CERT_VALIDITY_YEARS: i64 = 1;

/// Organization stamped on every generated CA
const CA_ORGANIZATION: &str = "Root CA";

/// Organization stamped on every generated leaf certificate
const LEAF_ORGANIZATION: &str = "PXC";

/// Compute certificate validity period from now
fn compute_validity(years: i64) -> (::time::OffsetDateTime, ::time::OffsetDateTime) {
    let now = ::time::OffsetDateTime::now_utc();
    let not_after = now + ::time::Duration::days(years * 365);
    (now, not_after)
}

/// PKI errors
#[derive(Debug, Error)]
pub enum PkiError {
    /// No hostnames were supplied for a leaf certificate
    #[error("at least one hostname is required")]
    NoHostnames,

    /// Certificate generation failed
    #[error("certificate generation failed: {0}")]
    CertificateGenerationFailed(String),

    /// Key generation failed
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Certificate parsing error
    #[error("certificate parsing error: {0}")]
    ParseError(String),
}

/// Result type for PKI operations
pub type Result<T> = std::result::Result<T, PkiError>;

/// Parse PEM-encoded data and return the DER bytes
pub fn parse_pem(pem_data: &str) -> Result<Vec<u8>> {
    let pem_obj = ::pem::parse(pem_data.as_bytes())
        .map_err(|e| PkiError::ParseError(format!("failed to parse PEM: {}", e)))?;
    Ok(pem_obj.contents().to_vec())
}

/// Information extracted from an issued certificate
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    /// When the certificate becomes valid (Unix timestamp)
    pub not_before: i64,
    /// When the certificate expires (Unix timestamp)
    pub not_after: i64,
    /// Subject common name
    pub common_name: String,
    /// DNS subject alternative names, in certificate order
    pub dns_names: Vec<String>,
    /// Whether the basic constraints mark this certificate as a CA
    pub is_ca: bool,
}

impl CertificateInfo {
    /// Parse certificate info from PEM-encoded certificate
    pub fn from_pem(pem_data: &str) -> Result<Self> {
        let der = parse_pem(pem_data)?;
        Self::from_der(&der)
    }

    /// Parse certificate info from DER-encoded certificate
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| PkiError::ParseError(format!("failed to parse certificate: {}", e)))?;

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or("")
            .to_string();

        let dns_names = cert
            .subject_alternative_name()
            .map_err(|e| PkiError::ParseError(format!("invalid SAN extension: {}", e)))?
            .map(|ext| {
                ext.value
                    .general_names
                    .iter()
                    .filter_map(|name| match name {
                        GeneralName::DNSName(dns) => Some(dns.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            not_before: cert.validity().not_before.timestamp(),
            not_after: cert.validity().not_after.timestamp(),
            common_name,
            dns_names,
            is_ca: cert.is_ca(),
        })
    }

    /// Total lifetime of the certificate in seconds
    pub fn lifetime_secs(&self) -> i64 {
        self.not_after - self.not_before
    }
}

/// Short-lived certificate authority used to sign a single leaf
pub struct CertificateAuthority {
    ca_key_pem: String,
    ca_cert_pem: String,
}

impl CertificateAuthority {
    /// Create a new self-signed CA
    pub fn new(common_name: &str) -> Result<Self> {
        let mut params = CertificateParams::default();

        let mut dn = DistinguishedName::new();
        dn.push(
            DnType::CommonName,
            DnValue::Utf8String(common_name.to_string()),
        );
        dn.push(
            DnType::OrganizationName,
            DnValue::Utf8String(CA_ORGANIZATION.to_string()),
        );
        params.distinguished_name = dn;

        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        let (not_before, not_after) = compute_validity(CA_VALIDITY_YEARS);
        params.not_before = not_before;
        params.not_after = not_after;

        let key_pair = KeyPair::generate().map_err(|e| {
            PkiError::KeyGenerationFailed(format!("failed to generate CA key: {}", e))
        })?;

        let cert = params.self_signed(&key_pair).map_err(|e| {
            PkiError::CertificateGenerationFailed(format!("failed to create CA cert: {}", e))
        })?;

        Ok(Self {
            ca_key_pem: key_pair.serialize_pem(),
            ca_cert_pem: cert.pem(),
        })
    }

    /// Get the CA certificate in PEM format
    pub fn ca_cert_pem(&self) -> &str {
        &self.ca_cert_pem
    }

    fn load_key_pair(&self) -> Result<KeyPair> {
        KeyPair::from_pem(&self.ca_key_pem)
            .map_err(|e| PkiError::ParseError(format!("failed to load CA key: {}", e)))
    }

    /// Generate a leaf certificate for the given hostnames
    ///
    /// The first hostname becomes the subject common name. The leaf is valid
    /// for both server and client authentication since cluster nodes dial
    /// each other with the same material they serve.
    ///
    /// Returns `(cert_pem, key_pem)`.
    pub fn generate_leaf_cert(&self, hosts: &[String]) -> Result<(String, String)> {
        let common_name = hosts.first().ok_or(PkiError::NoHostnames)?;

        let mut params = CertificateParams::default();

        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, DnValue::Utf8String(common_name.clone()));
        dn.push(
            DnType::OrganizationName,
            DnValue::Utf8String(LEAF_ORGANIZATION.to_string()),
        );
        params.distinguished_name = dn;

        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];

        let (not_before, not_after) = compute_validity(CERT_VALIDITY_YEARS);
        params.not_before = not_before;
        params.not_after = not_after;

        params.subject_alt_names = hosts
            .iter()
            .map(|host| {
                if let Ok(ip) = host.parse::<std::net::IpAddr>() {
                    Ok(SanType::IpAddress(ip))
                } else {
                    Ia5String::try_from(host.clone())
                        .map(SanType::DnsName)
                        .map_err(|e| {
                            PkiError::CertificateGenerationFailed(format!(
                                "invalid DNS name '{}': {}",
                                host, e
                            ))
                        })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let leaf_key = KeyPair::generate().map_err(|e| {
            PkiError::KeyGenerationFailed(format!("failed to generate leaf key: {}", e))
        })?;

        let ca_key = self.load_key_pair()?;
        let issuer = Issuer::from_ca_cert_pem(&self.ca_cert_pem, &ca_key)
            .map_err(|e| PkiError::ParseError(format!("failed to create issuer: {}", e)))?;

        let leaf_cert = params.signed_by(&leaf_key, &issuer).map_err(|e| {
            PkiError::CertificateGenerationFailed(format!("failed to sign leaf cert: {}", e))
        })?;

        Ok((leaf_cert.pem(), leaf_key.serialize_pem()))
    }
}

/// PEM material for one TLS secret
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedCredentials {
    /// CA certificate (`ca.crt`)
    pub ca_cert: Vec<u8>,
    /// Leaf certificate (`tls.crt`)
    pub tls_cert: Vec<u8>,
    /// Leaf private key (`tls.key`)
    pub tls_key: Vec<u8>,
}

impl std::fmt::Debug for IssuedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCredentials")
            .field("ca_cert_len", &self.ca_cert.len())
            .field("tls_cert_len", &self.tls_cert.len())
            .field("tls_key", &"<redacted>")
            .finish()
    }
}

/// Produces a CA, a leaf certificate and its key for a set of hostnames
pub trait CredentialIssuer: Send + Sync {
    /// Issue credentials whose leaf covers `hosts`
    fn issue(&self, hosts: &[String]) -> Result<IssuedCredentials>;
}

/// [`CredentialIssuer`] backed by a fresh in-process CA per call
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfSignedIssuer;

impl CredentialIssuer for SelfSignedIssuer {
    fn issue(&self, hosts: &[String]) -> Result<IssuedCredentials> {
        if hosts.is_empty() {
            return Err(PkiError::NoHostnames);
        }

        let ca = CertificateAuthority::new(CA_ORGANIZATION)?;
        let (tls_cert, tls_key) = ca.generate_leaf_cert(hosts)?;
        debug!(hosts = hosts.len(), "issued self-signed credentials");

        Ok(IssuedCredentials {
            ca_cert: ca.ca_cert_pem().as_bytes().to_vec(),
            tls_cert: tls_cert.into_bytes(),
            tls_key: tls_key.into_bytes(),
        })
    }
}

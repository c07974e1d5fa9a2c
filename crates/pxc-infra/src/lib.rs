//! Infrastructure components for the PXC operator
//!
//! Provides the PKI used when cert-manager cannot serve a cluster:
//!
//! - [`pki::CertificateAuthority`]: short-lived CA that signs one leaf
//! - [`pki::SelfSignedIssuer`]: [`pki::CredentialIssuer`] minting a fresh CA per call
//! - [`pki::CertificateInfo`]: inspection of issued certificates
//! - [`pki::PkiError`]: Error type for PKI operations

#![deny(missing_docs)]

pub mod pki;

pub use pki::{
    CertificateAuthority, CertificateInfo, CredentialIssuer, IssuedCredentials, PkiError,
    SelfSignedIssuer,
};

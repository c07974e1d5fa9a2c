//! TLS provisioning for PerconaXtraDBCluster resources
//!
//! Guarantees that every cluster has a client-facing and an internal TLS
//! secret. Certificates are requested from cert-manager when possible; when
//! the operator's default issuer cannot be used, self-signed credentials are
//! written directly into the secrets instead.
//!
//! - [`reconcile::TlsReconciler`]: entry point called once per reconcile
//! - [`plan::TlsPlan`]: issuer and secret-layout decisions for one cluster
//! - [`store::TlsObjectStore`]: the API calls provisioning makes
//! - [`managed`] / [`self_signed`]: the two provisioning paths
//!
//! Existing secrets are never refreshed, so changing SANs on a running
//! cluster has no effect until the secret is deleted.

#![deny(missing_docs)]

pub mod create;
pub mod managed;
pub mod naming;
pub mod plan;
pub mod reconcile;
pub mod self_signed;
pub mod store;

#[cfg(test)]
mod testing;

pub use create::ExistingPolicy;
pub use plan::{IssuerMode, SecretTopology, TlsPlan};
pub use reconcile::TlsReconciler;
pub use store::{KubeTlsStore, TlsObjectStore};

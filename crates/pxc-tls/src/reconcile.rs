//! TLS reconciliation for one cluster
//!
//! [`TlsReconciler::ensure_tls`] runs on every reconcile tick. It only acts
//! when the client-facing secret is missing, and it never touches material
//! that is already there.

use std::sync::Arc;

use kube::ResourceExt;
use tracing::{debug, info, warn};

use pxc_common::crd::PerconaXtraDBCluster;
use pxc_common::{Error, Result};
use pxc_infra::CredentialIssuer;

use crate::plan::TlsPlan;
use crate::store::TlsObjectStore;
use crate::{managed, self_signed};

/// Makes sure a cluster has TLS secrets, requesting or minting them if not
#[derive(Clone)]
pub struct TlsReconciler {
    store: Arc<dyn TlsObjectStore>,
    issuer: Arc<dyn CredentialIssuer>,
}

impl TlsReconciler {
    /// Create a reconciler over the given store and credential issuer
    pub fn new(store: Arc<dyn TlsObjectStore>, issuer: Arc<dyn CredentialIssuer>) -> Self {
        Self { store, issuer }
    }

    /// Ensure the cluster's TLS secrets exist
    ///
    /// Skipped entirely for clusters that allow unsafe configurations and do
    /// not pin an issuer. A present client-facing secret is taken as proof
    /// that provisioning already happened. Otherwise cert-manager is asked
    /// first; if that fails and the issuer is the operator's own default,
    /// self-signed secrets are created instead.
    pub async fn ensure_tls(&self, cluster: &PerconaXtraDBCluster) -> Result<()> {
        if cluster.tls_optional() {
            debug!(cluster = %cluster.name_any(), "unsafe configurations allowed, skipping TLS");
            return Ok(());
        }

        let plan = TlsPlan::resolve(cluster)?;

        let existing = self
            .store
            .get_secret(&plan.namespace, &plan.ssl_secret)
            .await
            .map_err(|e| Error::lookup("get secret", e))?;
        if existing.is_some() {
            debug!(cluster = %plan.cluster, secret = %plan.ssl_secret, "TLS secret present");
            return Ok(());
        }

        match self.provision_via_managed_issuer(&plan).await {
            Ok(()) => Ok(()),
            Err(e) if plan.is_external() => Err(e),
            Err(e) => {
                info!(
                    cluster = %plan.cluster,
                    error = %e,
                    "cert-manager unavailable, falling back to self-signed certificates"
                );
                self.provision_self_signed(&plan).await.inspect_err(|e| {
                    warn!(cluster = %plan.cluster, error = %e, "self-signed fallback failed");
                })
            }
        }
    }

    /// Request certificates from cert-manager
    pub async fn provision_via_managed_issuer(&self, plan: &TlsPlan) -> Result<()> {
        managed::provision(self.store.as_ref(), plan).await
    }

    /// Mint self-signed credentials and store them as secrets
    pub async fn provision_self_signed(&self, plan: &TlsPlan) -> Result<()> {
        self_signed::provision(self.store.as_ref(), self.issuer.as_ref(), plan).await
    }
}

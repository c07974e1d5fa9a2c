//! Provisioning through cert-manager
//!
//! Requests one Certificate per secret and lets cert-manager populate the
//! secrets asynchronously. When no issuer is pinned a namespaced self-signed
//! Issuer is created first.

use tracing::{debug, info};

use pxc_common::cert_manager::{Certificate, CertificateSpec, Issuer};
use pxc_common::kube_utils::owned_metadata;
use pxc_common::Result;

use crate::create::ExistingPolicy;
use crate::naming;
use crate::plan::{IssuerMode, SecretTopology, TlsPlan};
use crate::store::TlsObjectStore;

/// Request certificates for a cluster from cert-manager
///
/// Every create tolerates objects left over from an earlier attempt. The
/// first failing step aborts the rest.
pub async fn provision(store: &dyn TlsObjectStore, plan: &TlsPlan) -> Result<()> {
    if plan.issuer == IssuerMode::ManagedDefault {
        let name = naming::issuer_name(&plan.cluster);
        let issuer = Issuer::self_signed(owned_metadata(&name, &plan.namespace, &plan.owner));
        ExistingPolicy::Tolerate.check("create issuer", store.create_issuer(&issuer).await)?;
        debug!(issuer = %name, "managed issuer ready");
    }

    let client = client_certificate(plan);
    ExistingPolicy::Tolerate.check(
        "create certificate",
        store.create_certificate(&client).await,
    )?;

    if let SecretTopology::Split { internal_secret } = &plan.topology {
        let internal = internal_certificate(plan, internal_secret);
        ExistingPolicy::Tolerate.check(
            "create internal certificate",
            store.create_certificate(&internal).await,
        )?;
    }

    info!(
        cluster = %plan.cluster,
        issuer = %plan.issuer_ref().name,
        "requested certificates from cert-manager"
    );
    Ok(())
}

/// Certificate backing the client-facing secret
pub fn client_certificate(plan: &TlsPlan) -> Certificate {
    let name = naming::certificate_name(&plan.cluster);
    Certificate::new(
        owned_metadata(&name, &plan.namespace, &plan.owner),
        CertificateSpec {
            secret_name: plan.ssl_secret.clone(),
            common_name: naming::proxy_common_name(&plan.cluster),
            dns_names: plan.client_hosts(),
            is_ca: true,
            issuer_ref: plan.issuer_ref(),
        },
    )
}

/// Certificate backing the internal secret
pub fn internal_certificate(plan: &TlsPlan, secret_name: &str) -> Certificate {
    let name = naming::internal_certificate_name(&plan.cluster);
    Certificate::new(
        owned_metadata(&name, &plan.namespace, &plan.owner),
        CertificateSpec {
            secret_name: secret_name.to_string(),
            common_name: naming::pxc_common_name(&plan.cluster),
            dns_names: plan.internal_hosts(),
            is_ca: true,
            issuer_ref: plan.issuer_ref(),
        },
    )
}

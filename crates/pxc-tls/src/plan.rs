//! Provisioning decisions resolved once per reconcile
//!
//! The raw optional fields of the cluster spec (issuer configuration, secret
//! names) are folded into two tagged decisions, [`IssuerMode`] and
//! [`SecretTopology`]. The provisioners only ever look at the plan.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;

use pxc_common::cert_manager::IssuerRef;
use pxc_common::crd::PerconaXtraDBCluster;
use pxc_common::kube_utils::owner_reference;
use pxc_common::{Result, DEFAULT_ISSUER_KIND};

use crate::naming;

/// Where certificates requested through cert-manager are signed
#[derive(Clone, Debug, PartialEq)]
pub enum IssuerMode {
    /// User pinned an issuer; failures are never papered over
    External(IssuerRef),
    /// Operator creates and uses `<cluster>-pxc-ca`; failures fall back to
    /// self-signed material
    ManagedDefault,
}

/// Whether the client-facing and internal roles share one secret
#[derive(Clone, Debug, PartialEq)]
pub enum SecretTopology {
    /// One secret serves both roles
    Shared,
    /// Internal traffic uses its own secret
    Split {
        /// Name of the internal secret
        internal_secret: String,
    },
}

/// Everything the provisioners need to know about one cluster
#[derive(Clone, Debug)]
pub struct TlsPlan {
    /// Cluster name
    pub cluster: String,
    /// Cluster namespace; every object is created here
    pub namespace: String,
    /// Controller reference stamped on every created object
    pub owner: OwnerReference,
    /// Issuer decision
    pub issuer: IssuerMode,
    /// Secret layout decision
    pub topology: SecretTopology,
    /// Name of the client-facing secret
    pub ssl_secret: String,
    /// User SANs appended to every certificate
    pub extra_sans: Vec<String>,
}

impl TlsPlan {
    /// Resolve the plan for a cluster
    pub fn resolve(cluster: &PerconaXtraDBCluster) -> Result<Self> {
        let name = cluster.name_any();
        let namespace = cluster.namespace().unwrap_or_default();
        let owner = owner_reference(cluster)?;

        let issuer = match cluster.issuer_conf() {
            Some(conf) => {
                IssuerMode::External(IssuerRef::new(&conf.name, &conf.kind, &conf.group))
            }
            None => IssuerMode::ManagedDefault,
        };

        let ssl_secret = cluster.ssl_secret_name();
        let internal_secret = cluster.ssl_internal_secret_name();
        let topology = if internal_secret == ssl_secret {
            SecretTopology::Shared
        } else {
            SecretTopology::Split { internal_secret }
        };

        Ok(Self {
            cluster: name,
            namespace,
            owner,
            issuer,
            topology,
            ssl_secret,
            extra_sans: cluster.extra_sans().to_vec(),
        })
    }

    /// Issuer that signs the requested certificates
    pub fn issuer_ref(&self) -> IssuerRef {
        match &self.issuer {
            IssuerMode::External(issuer_ref) => issuer_ref.clone(),
            IssuerMode::ManagedDefault => {
                IssuerRef::new(naming::issuer_name(&self.cluster), DEFAULT_ISSUER_KIND, "")
            }
        }
    }

    /// Returns true if the user pinned an external issuer
    pub fn is_external(&self) -> bool {
        matches!(self.issuer, IssuerMode::External(_))
    }

    /// SANs for the client-facing certificate
    pub fn client_hosts(&self) -> Vec<String> {
        naming::client_hosts(&self.cluster, &self.extra_sans)
    }

    /// SANs for the internal certificate
    pub fn internal_hosts(&self) -> Vec<String> {
        naming::internal_hosts(&self.cluster, &self.extra_sans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cluster, with_issuer, with_secret_names, with_sans};

    #[test]
    fn defaults_to_managed_issuer_and_split_secrets() {
        let plan = TlsPlan::resolve(&cluster("c1")).expect("plan should resolve");

        assert_eq!(plan.issuer, IssuerMode::ManagedDefault);
        assert!(!plan.is_external());
        assert_eq!(
            plan.topology,
            SecretTopology::Split {
                internal_secret: "c1-ssl-internal".to_string()
            }
        );
        assert_eq!(plan.ssl_secret, "c1-ssl");
        assert_eq!(plan.namespace, "db");
        assert_eq!(plan.owner.name, "c1");
    }

    #[test]
    fn managed_issuer_ref_uses_default_name() {
        let plan = TlsPlan::resolve(&cluster("c1")).expect("plan should resolve");
        assert_eq!(plan.issuer_ref(), IssuerRef::new("c1-pxc-ca", "Issuer", ""));
    }

    #[test]
    fn external_issuer_is_used_verbatim() {
        let c = with_issuer(cluster("c1"), "corp-ca", "ClusterIssuer", "cert-manager.io");
        let plan = TlsPlan::resolve(&c).expect("plan should resolve");

        assert!(plan.is_external());
        assert_eq!(
            plan.issuer_ref(),
            IssuerRef::new("corp-ca", "ClusterIssuer", "cert-manager.io")
        );
    }

    #[test]
    fn equal_secret_names_collapse_to_shared() {
        let c = with_secret_names(cluster("c1"), "tls", "tls");
        let plan = TlsPlan::resolve(&c).expect("plan should resolve");

        assert_eq!(plan.topology, SecretTopology::Shared);
        assert_eq!(plan.ssl_secret, "tls");
    }

    #[test]
    fn extra_sans_flow_into_both_lists() {
        let c = with_sans(cluster("c1"), &["foo.example.com"]);
        let plan = TlsPlan::resolve(&c).expect("plan should resolve");

        let client = plan.client_hosts();
        let internal = plan.internal_hosts();
        assert_eq!(client.last().map(String::as_str), Some("foo.example.com"));
        assert_eq!(internal.last().map(String::as_str), Some("foo.example.com"));
    }

    #[test]
    fn resolve_requires_persisted_cluster() {
        let mut c = cluster("c1");
        c.metadata.uid = None;
        assert!(TlsPlan::resolve(&c).is_err());
    }
}

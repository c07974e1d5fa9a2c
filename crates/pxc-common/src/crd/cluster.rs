//! PerconaXtraDBCluster Custom Resource Definition
//!
//! Only the parts of the cluster spec the TLS machinery reads are modelled
//! here: the unsafe-configuration escape hatch, the TLS block and the names
//! of the two TLS secrets.

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_ISSUER_KIND, INTERNAL_SECRET_SUFFIX, SSL_SECRET_SUFFIX};

/// Specification for a PerconaXtraDBCluster
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "pxc.percona.com",
    version = "v1",
    kind = "PerconaXtraDBCluster",
    plural = "perconaxtradbclusters",
    shortname = "pxc",
    namespaced,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PerconaXtraDBClusterSpec {
    /// Allow configurations that are unsafe for production
    ///
    /// When set and no issuer is configured, TLS is optional and the operator
    /// does not provision any certificates.
    #[serde(default)]
    pub allow_unsafe_configurations: bool,

    /// TLS configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsSpec>,

    /// Database node configuration
    #[serde(default)]
    pub pxc: PxcSpec,
}

/// TLS configuration for the cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TlsSpec {
    /// Extra subject alternative names appended to every certificate
    #[serde(rename = "SANs", default, skip_serializing_if = "Vec::is_empty")]
    pub sans: Vec<String>,

    /// External cert-manager issuer to use instead of the operator-managed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_conf: Option<IssuerConf>,
}

/// Reference to a cert-manager issuer supplied by the user
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssuerConf {
    /// Issuer name
    pub name: String,

    /// Issuer kind (Issuer or ClusterIssuer)
    #[serde(default = "default_issuer_kind")]
    pub kind: String,

    /// API group of the issuer; empty means cert-manager.io
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
}

fn default_issuer_kind() -> String {
    DEFAULT_ISSUER_KIND.to_string()
}

/// Database node settings relevant to TLS
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PxcSpec {
    /// Secret holding the client-facing TLS material (defaults to `<cluster>-ssl`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_secret_name: Option<String>,

    /// Secret holding the replication TLS material (defaults to `<cluster>-ssl-internal`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_internal_secret_name: Option<String>,
}

impl PerconaXtraDBCluster {
    /// Name of the client-facing TLS secret
    pub fn ssl_secret_name(&self) -> String {
        match self.spec.pxc.ssl_secret_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{}{}", self.name_any(), SSL_SECRET_SUFFIX),
        }
    }

    /// Name of the internal (replication) TLS secret
    pub fn ssl_internal_secret_name(&self) -> String {
        match self.spec.pxc.ssl_internal_secret_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{}{}", self.name_any(), INTERNAL_SECRET_SUFFIX),
        }
    }

    /// User-pinned external issuer, if any
    pub fn issuer_conf(&self) -> Option<&IssuerConf> {
        self.spec.tls.as_ref().and_then(|tls| tls.issuer_conf.as_ref())
    }

    /// Extra SANs declared by the user
    pub fn extra_sans(&self) -> &[String] {
        self.spec
            .tls
            .as_ref()
            .map(|tls| tls.sans.as_slice())
            .unwrap_or_default()
    }

    /// Returns true if TLS provisioning can be skipped entirely
    pub fn tls_optional(&self) -> bool {
        self.spec.allow_unsafe_configurations && self.issuer_conf().is_none()
    }

    /// Validate the TLS-related parts of the spec
    pub fn validate(&self) -> Result<(), crate::Error> {
        let name = self.name_any();

        if let Some(issuer) = self.issuer_conf() {
            if issuer.name.is_empty() {
                return Err(crate::Error::validation_for_field(
                    &name,
                    "spec.tls.issuerConf.name",
                    "issuer name cannot be empty",
                ));
            }
            if issuer.kind.is_empty() {
                return Err(crate::Error::validation_for_field(
                    &name,
                    "spec.tls.issuerConf.kind",
                    "issuer kind cannot be empty",
                ));
            }
        }

        if let Some(san) = self.extra_sans().iter().find(|san| san.trim().is_empty()) {
            return Err(crate::Error::validation_for_field(
                &name,
                "spec.tls.SANs",
                format!("invalid subject alternative name {:?}", san),
            ));
        }

        Ok(())
    }
}

//! cert-manager Issuer and Certificate resources
//!
//! cert-manager CRDs are third-party, so these types carry their own
//! apiVersion/kind and are sent through the dynamic API. Both implement
//! `HasApiResource` for consistent API version handling.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::kube_utils::HasApiResource;

/// Macro to implement default_api_version() and default_kind() for types
/// implementing HasApiResource.
macro_rules! impl_api_defaults {
    ($type:ty) => {
        impl $type {
            fn default_api_version() -> String {
                <Self as HasApiResource>::API_VERSION.to_string()
            }
            fn default_kind() -> String {
                <Self as HasApiResource>::KIND.to_string()
            }
        }
    };
}

// =============================================================================
// Issuer
// =============================================================================

/// cert-manager Issuer resource
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    /// API version (cert-manager.io/v1)
    #[serde(default = "Issuer::default_api_version")]
    pub api_version: String,
    /// Resource kind (Issuer)
    #[serde(default = "Issuer::default_kind")]
    pub kind: String,
    /// Resource metadata
    pub metadata: ObjectMeta,
    /// Issuer specification
    pub spec: IssuerSpec,
}

impl HasApiResource for Issuer {
    const API_VERSION: &'static str = "cert-manager.io/v1";
    const KIND: &'static str = "Issuer";
}

impl_api_defaults!(Issuer);

impl Issuer {
    /// Create an Issuer that signs certificates with their own key
    pub fn self_signed(metadata: ObjectMeta) -> Self {
        Self {
            api_version: Self::default_api_version(),
            kind: Self::default_kind(),
            metadata,
            spec: IssuerSpec {
                self_signed: Some(SelfSignedIssuer {}),
            },
        }
    }
}

/// Issuer spec
///
/// Only the self-signed issuer configuration is modelled.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssuerSpec {
    /// Self-signed issuer configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_signed: Option<SelfSignedIssuer>,
}

/// Self-signed issuer configuration (no fields)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SelfSignedIssuer {}

// =============================================================================
// Certificate
// =============================================================================

/// cert-manager Certificate resource
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// API version (cert-manager.io/v1)
    #[serde(default = "Certificate::default_api_version")]
    pub api_version: String,
    /// Resource kind (Certificate)
    #[serde(default = "Certificate::default_kind")]
    pub kind: String,
    /// Resource metadata
    pub metadata: ObjectMeta,
    /// Certificate specification
    pub spec: CertificateSpec,
}

impl HasApiResource for Certificate {
    const API_VERSION: &'static str = "cert-manager.io/v1";
    const KIND: &'static str = "Certificate";
}

impl_api_defaults!(Certificate);

impl Certificate {
    /// Create a new Certificate
    pub fn new(metadata: ObjectMeta, spec: CertificateSpec) -> Self {
        Self {
            api_version: Self::default_api_version(),
            kind: Self::default_kind(),
            metadata,
            spec,
        }
    }
}

/// Certificate spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    /// Name of the Secret cert-manager writes the certificate to
    pub secret_name: String,
    /// Subject common name
    pub common_name: String,
    /// DNS names for the certificate
    pub dns_names: Vec<String>,
    /// Whether the issued certificate may sign others
    #[serde(rename = "isCA", default)]
    pub is_ca: bool,
    /// Reference to the issuer
    pub issuer_ref: IssuerRef,
}

/// Issuer reference for Certificate
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRef {
    /// Issuer name
    pub name: String,
    /// Issuer kind (Issuer or ClusterIssuer)
    pub kind: String,
    /// API group (cert-manager.io when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl IssuerRef {
    /// Build a reference, treating an empty group as unset
    pub fn new(name: impl Into<String>, kind: impl Into<String>, group: &str) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            group: (!group.is_empty()).then(|| group.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("db".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn self_signed_issuer_serializes_empty_block() {
        let issuer = Issuer::self_signed(meta("c1-pxc-ca"));
        let json = serde_json::to_value(&issuer).expect("issuer should serialize");

        assert_eq!(json["apiVersion"], "cert-manager.io/v1");
        assert_eq!(json["kind"], "Issuer");
        assert_eq!(json["metadata"]["name"], "c1-pxc-ca");
        assert_eq!(json["spec"]["selfSigned"], serde_json::json!({}));
    }

    #[test]
    fn certificate_uses_cert_manager_field_names() {
        let cert = Certificate::new(
            meta("c1-ssl"),
            CertificateSpec {
                secret_name: "c1-ssl".to_string(),
                common_name: "c1-proxysql".to_string(),
                dns_names: vec!["c1-pxc".to_string()],
                is_ca: true,
                issuer_ref: IssuerRef::new("c1-pxc-ca", "Issuer", ""),
            },
        );
        let json = serde_json::to_value(&cert).expect("certificate should serialize");

        assert_eq!(json["kind"], "Certificate");
        assert_eq!(json["spec"]["secretName"], "c1-ssl");
        assert_eq!(json["spec"]["commonName"], "c1-proxysql");
        assert_eq!(json["spec"]["isCA"], true);
        assert_eq!(json["spec"]["dnsNames"][0], "c1-pxc");
        assert!(json["spec"]["issuerRef"].get("group").is_none());
    }

    #[test]
    fn issuer_ref_keeps_explicit_group() {
        let r = IssuerRef::new("vault", "ClusterIssuer", "cert-manager.io");
        assert_eq!(r.group.as_deref(), Some("cert-manager.io"));
    }

    #[test]
    fn deserializes_with_default_type_meta() {
        let json = serde_json::json!({
            "metadata": { "name": "c1-ssl" },
            "spec": {
                "secretName": "c1-ssl",
                "commonName": "c1-proxysql",
                "dnsNames": [],
                "issuerRef": { "name": "ca", "kind": "Issuer" }
            }
        });
        let cert: Certificate = serde_json::from_value(json).expect("should deserialize");
        assert_eq!(cert.api_version, "cert-manager.io/v1");
        assert!(!cert.spec.is_ca);
    }
}

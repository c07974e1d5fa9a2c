//! Common types for the PXC operator: CRDs, cert-manager resources, errors and utilities

#![deny(missing_docs)]

pub mod cert_manager;
pub mod crd;
pub mod error;
pub mod kube_utils;

pub use error::{Error, StoreError};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Suffix of the default client-facing TLS secret and its Certificate
pub const SSL_SECRET_SUFFIX: &str = "-ssl";

/// Suffix of the default internal TLS secret and its Certificate
pub const INTERNAL_SECRET_SUFFIX: &str = "-ssl-internal";

/// Suffix of the operator-managed cert-manager Issuer
pub const ISSUER_SUFFIX: &str = "-pxc-ca";

/// Component name of the database nodes (`<cluster>-pxc`)
pub const PXC_COMPONENT: &str = "pxc";

/// Component name of the client-facing proxy (`<cluster>-proxysql`)
pub const PROXY_COMPONENT: &str = "proxysql";

/// Issuer kind used when none is specified
pub const DEFAULT_ISSUER_KIND: &str = "Issuer";

/// Secret key holding the CA certificate
pub const SECRET_KEY_CA_CERT: &str = "ca.crt";

/// Secret key holding the leaf certificate
pub const SECRET_KEY_TLS_CERT: &str = "tls.crt";

/// Secret key holding the leaf private key
pub const SECRET_KEY_TLS_KEY: &str = "tls.key";

/// Kubernetes secret type for TLS material
pub const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";

/// Field manager / component name used for API calls and events
pub const OPERATOR_NAME: &str = "pxc-operator";

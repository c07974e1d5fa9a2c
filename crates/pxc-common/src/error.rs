//! Error types for the PXC operator
//!
//! Errors carry the static name of the step that failed (e.g. "get secret",
//! "create certificate") so a failed reconciliation can be traced back to a
//! single API call without inspecting logs.

use pxc_infra::PkiError;
use thiserror::Error;

/// Failure reported by the object store for a single get/create call
///
/// "Not found" is not an error here: lookups return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An object with the same name already exists
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        /// Resource kind (Secret, Issuer, Certificate)
        kind: String,
        /// Namespace of the conflicting object
        namespace: String,
        /// Name of the conflicting object
        name: String,
    },

    /// Any other API failure (transport, authorization, validation, ...)
    #[error("{0}")]
    Api(String),
}

impl StoreError {
    /// Create an already-exists error for an object
    pub fn already_exists(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create a generic API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Returns true if this is an already-exists conflict
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Main error type for PXC operator operations
#[derive(Debug, Error)]
pub enum Error {
    /// Lookup failed for a reason other than "not found"; state is indeterminate
    #[error("{step}: {source}")]
    Lookup {
        /// Step that failed (e.g. "get secret")
        step: &'static str,
        /// The underlying store error
        source: StoreError,
    },

    /// Object already exists on a path that requires exclusive creation
    #[error("{step}: {kind} {name} already exists")]
    AlreadyExists {
        /// Step that failed (e.g. "create TLS secret")
        step: &'static str,
        /// Resource kind
        kind: String,
        /// Resource name
        name: String,
    },

    /// Credential issuer failed to produce TLS material
    #[error("{step}: {source}")]
    Issuer {
        /// Step that failed (e.g. "create proxy certificate")
        step: &'static str,
        /// The underlying PKI error
        source: PkiError,
    },

    /// Object store rejected a create for a reason other than already-exists
    #[error("{step}: {source}")]
    Create {
        /// Step that failed (e.g. "create certificate")
        step: &'static str,
        /// The underlying store error
        source: StoreError,
    },

    /// Owner reference could not be computed for a cluster
    #[error("owner reference for {cluster}: {message}")]
    OwnerReference {
        /// Name of the owning cluster
        cluster: String,
        /// Why the reference could not be built
        message: String,
    },

    /// Validation error for CRD specs
    #[error("validation error for {cluster}: {message}")]
    Validation {
        /// Name of the cluster with invalid configuration
        cluster: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.tls.issuerConf.name")
        field: Option<String>,
    },
}

impl Error {
    /// Wrap a failed lookup
    pub fn lookup(step: &'static str, source: StoreError) -> Self {
        Self::Lookup { step, source }
    }

    /// Wrap a failed create
    ///
    /// Already-exists conflicts are kept distinct from other failures so
    /// callers can tell a lost race from a rejected object.
    pub fn create(step: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::AlreadyExists { kind, name, .. } => Self::AlreadyExists { step, kind, name },
            other => Self::Create {
                step,
                source: other,
            },
        }
    }

    /// Wrap a credential issuer failure
    pub fn issuer(step: &'static str, source: PkiError) -> Self {
        Self::Issuer { step, source }
    }

    /// Create an owner reference error
    pub fn owner_reference(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::OwnerReference {
            cluster: cluster.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error with cluster context and field path
    pub fn validation_for_field(
        cluster: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Name of the step that failed, when the error came from a TLS step
    pub fn step(&self) -> Option<&'static str> {
        match self {
            Self::Lookup { step, .. }
            | Self::AlreadyExists { step, .. }
            | Self::Issuer { step, .. }
            | Self::Create { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Returns true if retrying on the next reconcile may succeed
    ///
    /// Validation errors need a spec change; everything else is retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Validation { .. })
    }
}

//! Shared Kubernetes utilities using kube-rs

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::discovery::ApiResource;
use kube::{Resource, ResourceExt};

use crate::Error;

// =============================================================================
// HasApiResource Trait
// =============================================================================

/// Trait for types that have a known API group, version, and kind.
///
/// Implement this for third-party resource types (cert-manager) so their
/// `ApiResource` is derived from the same constants used for serialization.
///
/// # Example
/// ```ignore
/// impl HasApiResource for Certificate {
///     const API_VERSION: &'static str = "cert-manager.io/v1";
///     const KIND: &'static str = "Certificate";
/// }
///
/// let ar = Certificate::api_resource();
/// ```
pub trait HasApiResource {
    /// Full API version (e.g., "cert-manager.io/v1", "v1")
    const API_VERSION: &'static str;
    /// Resource kind (e.g., "Certificate")
    const KIND: &'static str;

    /// Build an ApiResource from the type's constants.
    fn api_resource() -> ApiResource {
        build_api_resource(Self::API_VERSION, Self::KIND)
    }
}

/// Build an ApiResource from an apiVersion string and kind
pub fn build_api_resource(api_version: &str, kind: &str) -> ApiResource {
    let (group, version) = parse_api_version(api_version);
    ApiResource {
        group,
        version,
        kind: kind.to_string(),
        api_version: api_version.to_string(),
        plural: pluralize_kind(kind),
    }
}

/// Split an apiVersion into (group, version)
///
/// ```
/// use pxc_common::kube_utils::parse_api_version;
///
/// let (group, version) = parse_api_version("cert-manager.io/v1");
/// assert_eq!(group, "cert-manager.io");
/// assert_eq!(version, "v1");
///
/// let (group, version) = parse_api_version("v1");
/// assert_eq!(group, "");
/// assert_eq!(version, "v1");
/// ```
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// Pluralize a Kubernetes resource kind using simple English rules
pub fn pluralize_kind(kind: &str) -> String {
    let lower = kind.to_lowercase();
    if lower.ends_with('s') || lower.ends_with("ch") || lower.ends_with("sh") {
        format!("{}es", lower)
    } else if lower.ends_with('y') && !lower.ends_with("ay") && !lower.ends_with("ey") {
        format!("{}ies", &lower[..lower.len() - 1])
    } else {
        format!("{}s", lower)
    }
}

// =============================================================================
// Ownership
// =============================================================================

/// Build a controller owner reference pointing at `owner`
///
/// Objects stamped with it are garbage collected when the owner is deleted.
/// Fails when the owner has not been persisted yet (no uid).
pub fn owner_reference<K>(owner: &K) -> Result<OwnerReference, Error>
where
    K: Resource<DynamicType = ()>,
{
    let mut reference = owner
        .controller_owner_ref(&())
        .ok_or_else(|| Error::owner_reference(owner.name_any(), "owner has no uid"))?;
    reference.block_owner_deletion = Some(true);
    Ok(reference)
}

/// Metadata for an object owned by `owner`
pub fn owned_metadata(
    name: impl Into<String>,
    namespace: impl Into<String>,
    owner: &OwnerReference,
) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        namespace: Some(namespace.into()),
        owner_references: Some(vec![owner.clone()]),
        ..Default::default()
    }
}

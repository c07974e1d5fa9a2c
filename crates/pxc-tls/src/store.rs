//! Object store access for TLS provisioning
//!
//! [`TlsObjectStore`] is the only way the TLS core talks to the API server.
//! It exposes exactly the calls provisioning needs and keeps "not found"
//! (`Ok(None)`) and "already exists" ([`StoreError::AlreadyExists`]) apart
//! from every other failure.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, DynamicObject, PostParams};
use kube::Client;
use serde::Serialize;
use tracing::{debug, trace};

#[cfg(test)]
use mockall::automock;

use pxc_common::cert_manager::{Certificate, Issuer};
use pxc_common::kube_utils::HasApiResource;
use pxc_common::{StoreError, OPERATOR_NAME};

/// Trait abstracting the Kubernetes calls made while provisioning TLS
///
/// This trait allows mocking the Kubernetes client in tests while using
/// the real client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TlsObjectStore: Send + Sync {
    /// Get a Secret by namespace and name, `None` if it does not exist
    async fn get_secret(&self, namespace: &str, name: &str)
        -> Result<Option<Secret>, StoreError>;

    /// Create a Secret
    async fn create_secret(&self, secret: &Secret) -> Result<(), StoreError>;

    /// Create a cert-manager Issuer
    async fn create_issuer(&self, issuer: &Issuer) -> Result<(), StoreError>;

    /// Create a cert-manager Certificate
    async fn create_certificate(&self, certificate: &Certificate) -> Result<(), StoreError>;
}

/// Real Kubernetes implementation of [`TlsObjectStore`]
#[derive(Clone)]
pub struct KubeTlsStore {
    client: Client,
}

impl KubeTlsStore {
    /// Create a store wrapping the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        }
    }

    /// Create a cert-manager resource through the dynamic API
    async fn create_dynamic<T>(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
        object: &T,
    ) -> Result<(), StoreError>
    where
        T: Serialize + HasApiResource,
    {
        let value = serde_json::to_value(object)
            .map_err(|e| StoreError::api(format!("failed to serialize {kind}: {e}")))?;
        let dynamic: DynamicObject = serde_json::from_value(value)
            .map_err(|e| StoreError::api(format!("failed to build {kind}: {e}")))?;

        let api_resource = T::api_resource();
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &api_resource);

        api.create(&Self::post_params(), &dynamic)
            .await
            .map(|_| debug!(kind = %kind, namespace = %namespace, name = %name, "created"))
            .map_err(|e| map_create_error(kind, namespace, name, e))
    }
}

#[async_trait]
impl TlsObjectStore for KubeTlsStore {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>, StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                trace!(namespace = %namespace, name = %name, "secret not found");
                Ok(None)
            }
            Err(e) => Err(StoreError::api(e.to_string())),
        }
    }

    async fn create_secret(&self, secret: &Secret) -> Result<(), StoreError> {
        let namespace = secret.metadata.namespace.as_deref().unwrap_or_default();
        let name = secret.metadata.name.as_deref().unwrap_or_default();
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        api.create(&Self::post_params(), secret)
            .await
            .map(|_| debug!(kind = "Secret", namespace = %namespace, name = %name, "created"))
            .map_err(|e| map_create_error("Secret", namespace, name, e))
    }

    async fn create_issuer(&self, issuer: &Issuer) -> Result<(), StoreError> {
        let namespace = issuer.metadata.namespace.as_deref().unwrap_or_default();
        let name = issuer.metadata.name.as_deref().unwrap_or_default();
        self.create_dynamic(Issuer::KIND, namespace, name, issuer).await
    }

    async fn create_certificate(&self, certificate: &Certificate) -> Result<(), StoreError> {
        let namespace = certificate.metadata.namespace.as_deref().unwrap_or_default();
        let name = certificate.metadata.name.as_deref().unwrap_or_default();
        self.create_dynamic(Certificate::KIND, namespace, name, certificate)
            .await
    }
}

/// Translate a kube error from a create call into a [`StoreError`]
///
/// 409 is also returned for resourceVersion conflicts, so the reason must be
/// checked as well.
fn map_create_error(kind: &str, namespace: &str, name: &str, err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
            StoreError::already_exists(kind, namespace, name)
        }
        e => StoreError::api(format!("failed to create {kind} {namespace}/{name}: {e}")),
    }
}

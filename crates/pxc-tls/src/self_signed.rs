//! Provisioning with in-process self-signed credentials
//!
//! Used when cert-manager is not available. Each secret gets its own freshly
//! minted CA, so client and internal secrets never share a trust root.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use tracing::info;

use pxc_common::kube_utils::owned_metadata;
use pxc_common::{
    Error, Result, SECRET_KEY_CA_CERT, SECRET_KEY_TLS_CERT, SECRET_KEY_TLS_KEY, SECRET_TYPE_TLS,
};
use pxc_infra::{CredentialIssuer, IssuedCredentials};

use crate::create::ExistingPolicy;
use crate::plan::{SecretTopology, TlsPlan};
use crate::store::TlsObjectStore;

/// Mint credentials and write them straight into TLS secrets
///
/// Secrets are created exclusively: if one appeared since the caller's
/// lookup the step fails instead of silently keeping foreign material.
pub async fn provision(
    store: &dyn TlsObjectStore,
    issuer: &dyn CredentialIssuer,
    plan: &TlsPlan,
) -> Result<()> {
    let client = issuer
        .issue(&plan.client_hosts())
        .map_err(|e| Error::issuer("create proxy certificate", e))?;
    let secret = tls_secret(plan, &plan.ssl_secret, client);
    ExistingPolicy::Reject.check("create TLS secret", store.create_secret(&secret).await)?;

    if let SecretTopology::Split { internal_secret } = &plan.topology {
        let internal = issuer
            .issue(&plan.internal_hosts())
            .map_err(|e| Error::issuer("create pxc certificate", e))?;
        let secret = tls_secret(plan, internal_secret, internal);
        ExistingPolicy::Reject.check(
            "create TLS internal secret",
            store.create_secret(&secret).await,
        )?;
    }

    info!(cluster = %plan.cluster, "created self-signed TLS secrets");
    Ok(())
}

/// Build a `kubernetes.io/tls` secret holding issued credentials
pub fn tls_secret(plan: &TlsPlan, name: &str, credentials: IssuedCredentials) -> Secret {
    let data = BTreeMap::from([
        (
            SECRET_KEY_CA_CERT.to_string(),
            ByteString(credentials.ca_cert),
        ),
        (
            SECRET_KEY_TLS_CERT.to_string(),
            ByteString(credentials.tls_cert),
        ),
        (
            SECRET_KEY_TLS_KEY.to_string(),
            ByteString(credentials.tls_key),
        ),
    ]);

    Secret {
        metadata: owned_metadata(name, &plan.namespace, &plan.owner),
        data: Some(data),
        type_: Some(SECRET_TYPE_TLS.to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockTlsObjectStore;
    use crate::testing::{cluster, fake_credentials, with_secret_names, MockIssuer};
    use pxc_common::StoreError;
    use pxc_infra::{CertificateInfo, PkiError, SelfSignedIssuer};
    use std::sync::{Arc, Mutex};

    fn plan_for(c: &pxc_common::crd::PerconaXtraDBCluster) -> TlsPlan {
        TlsPlan::resolve(c).expect("plan should resolve")
    }

    fn key<'a>(secret: &'a Secret, key: &str) -> &'a [u8] {
        secret
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .map(|b| b.0.as_slice())
            .unwrap_or_default()
    }

    #[test]
    fn secret_has_tls_type_and_three_keys() {
        let plan = plan_for(&cluster("c1"));
        let secret = tls_secret(&plan, "c1-ssl", fake_credentials(&plan.client_hosts()));

        assert_eq!(secret.type_.as_deref(), Some("kubernetes.io/tls"));
        assert_eq!(secret.metadata.name.as_deref(), Some("c1-ssl"));
        assert_eq!(secret.metadata.namespace.as_deref(), Some("db"));
        assert!(secret.metadata.owner_references.is_some());
        assert_eq!(key(&secret, "ca.crt"), b"ca-for-c1-pxc");
        assert_eq!(key(&secret, "tls.crt"), b"cert-for-c1-pxc");
        assert_eq!(key(&secret, "tls.key"), b"key-for-c1-pxc");
    }

    #[tokio::test]
    async fn split_topology_issues_twice_with_role_sans() {
        let plan = plan_for(&cluster("c1"));
        let mut store = MockTlsObjectStore::new();
        let mut issuer = MockIssuer::new();

        issuer
            .expect_issue()
            .withf(|hosts| hosts.len() == 4 && hosts[1] == "c1-proxysql")
            .times(1)
            .returning(|hosts| Ok(fake_credentials(hosts)));
        issuer
            .expect_issue()
            .withf(|hosts| hosts.len() == 2 && hosts[0] == "c1-pxc" && hosts[1] == "*.c1-pxc")
            .times(1)
            .returning(|hosts| Ok(fake_credentials(hosts)));

        let created = Arc::new(Mutex::new(Vec::new()));
        let sink = created.clone();
        store
            .expect_create_secret()
            .times(2)
            .returning(move |secret| {
                sink.lock()
                    .expect("lock")
                    .push(secret.metadata.name.clone().unwrap_or_default());
                Ok(())
            });

        provision(&store, &issuer, &plan).await.expect("provision should succeed");
        assert_eq!(
            *created.lock().expect("lock"),
            vec!["c1-ssl".to_string(), "c1-ssl-internal".to_string()]
        );
    }

    #[tokio::test]
    async fn shared_topology_creates_one_secret() {
        let plan = plan_for(&with_secret_names(cluster("c1"), "tls", "tls"));
        let mut store = MockTlsObjectStore::new();
        let mut issuer = MockIssuer::new();

        issuer
            .expect_issue()
            .times(1)
            .returning(|hosts| Ok(fake_credentials(hosts)));
        store
            .expect_create_secret()
            .withf(|s| s.metadata.name.as_deref() == Some("tls"))
            .times(1)
            .returning(|_| Ok(()));

        provision(&store, &issuer, &plan).await.expect("provision should succeed");
    }

    #[tokio::test]
    async fn existing_secret_is_fatal() {
        let plan = plan_for(&cluster("c1"));
        let mut store = MockTlsObjectStore::new();
        let mut issuer = MockIssuer::new();

        issuer
            .expect_issue()
            .times(1)
            .returning(|hosts| Ok(fake_credentials(hosts)));
        store
            .expect_create_secret()
            .times(1)
            .returning(|_| Err(StoreError::already_exists("Secret", "db", "c1-ssl")));

        let err = provision(&store, &issuer, &plan).await.expect_err("should fail");
        assert!(matches!(
            err,
            Error::AlreadyExists {
                step: "create TLS secret",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn issuer_failure_names_role() {
        let plan = plan_for(&cluster("c1"));
        let mut store = MockTlsObjectStore::new();
        let mut issuer = MockIssuer::new();

        issuer
            .expect_issue()
            .times(1)
            .returning(|_| Err(PkiError::KeyGenerationFailed("entropy".to_string())));
        store.expect_create_secret().never();

        let err = provision(&store, &issuer, &plan).await.expect_err("should fail");
        assert_eq!(err.step(), Some("create proxy certificate"));
    }

    #[tokio::test]
    async fn internal_secret_failure_names_its_step() {
        let plan = plan_for(&cluster("c1"));
        let mut store = MockTlsObjectStore::new();
        let mut issuer = MockIssuer::new();

        issuer
            .expect_issue()
            .returning(|hosts| Ok(fake_credentials(hosts)));
        store
            .expect_create_secret()
            .returning(|s| match s.metadata.name.as_deref() {
                Some("c1-ssl-internal") => Err(StoreError::api("forbidden")),
                _ => Ok(()),
            });

        let err = provision(&store, &issuer, &plan).await.expect_err("should fail");
        assert_eq!(err.step(), Some("create TLS internal secret"));
    }

    #[tokio::test]
    async fn real_issuer_produces_distinct_trust_roots() {
        let plan = plan_for(&cluster("c1"));
        let mut store = MockTlsObjectStore::new();

        let created = Arc::new(Mutex::new(Vec::new()));
        let sink = created.clone();
        store.expect_create_secret().times(2).returning(move |secret| {
            sink.lock().expect("lock").push(secret.clone());
            Ok(())
        });

        provision(&store, &SelfSignedIssuer, &plan)
            .await
            .expect("provision should succeed");

        let secrets = created.lock().expect("lock");
        for secret in secrets.iter() {
            for k in ["ca.crt", "tls.crt", "tls.key"] {
                assert!(!key(secret, k).is_empty(), "{k} should be populated");
            }
        }
        assert_ne!(key(&secrets[0], "ca.crt"), key(&secrets[1], "ca.crt"));

        let client_pem =
            std::str::from_utf8(key(&secrets[0], "tls.crt")).expect("PEM should be UTF-8");
        let info = CertificateInfo::from_pem(client_pem).expect("leaf should parse");
        assert!(info.dns_names.contains(&"*.c1-proxysql".to_string()));
        assert!(!info.is_ca);
    }
}

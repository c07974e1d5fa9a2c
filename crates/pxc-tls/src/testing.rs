//! Shared test fixtures

use kube::api::ObjectMeta;
use mockall::mock;

use pxc_common::crd::{IssuerConf, PerconaXtraDBCluster, PerconaXtraDBClusterSpec, TlsSpec};
use pxc_infra::pki::{CredentialIssuer, IssuedCredentials, Result as PkiResult};

mock! {
    pub Issuer {}

    impl CredentialIssuer for Issuer {
        fn issue(&self, hosts: &[String]) -> PkiResult<IssuedCredentials>;
    }
}

/// Persisted cluster in namespace `db` with default TLS settings
pub fn cluster(name: &str) -> PerconaXtraDBCluster {
    PerconaXtraDBCluster {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("db".to_string()),
            uid: Some(format!("{name}-uid")),
            ..Default::default()
        },
        spec: PerconaXtraDBClusterSpec::default(),
    }
}

fn tls_mut(c: &mut PerconaXtraDBCluster) -> &mut TlsSpec {
    c.spec.tls.get_or_insert_with(TlsSpec::default)
}

pub fn with_issuer(
    mut c: PerconaXtraDBCluster,
    name: &str,
    kind: &str,
    group: &str,
) -> PerconaXtraDBCluster {
    tls_mut(&mut c).issuer_conf = Some(IssuerConf {
        name: name.to_string(),
        kind: kind.to_string(),
        group: group.to_string(),
    });
    c
}

pub fn with_sans(mut c: PerconaXtraDBCluster, sans: &[&str]) -> PerconaXtraDBCluster {
    tls_mut(&mut c).sans = sans.iter().map(|s| s.to_string()).collect();
    c
}

pub fn with_secret_names(
    mut c: PerconaXtraDBCluster,
    ssl: &str,
    internal: &str,
) -> PerconaXtraDBCluster {
    c.spec.pxc.ssl_secret_name = Some(ssl.to_string());
    c.spec.pxc.ssl_internal_secret_name = Some(internal.to_string());
    c
}

pub fn unsafe_allowed(mut c: PerconaXtraDBCluster) -> PerconaXtraDBCluster {
    c.spec.allow_unsafe_configurations = true;
    c
}

/// Deterministic fake credentials tagged with the first host
pub fn fake_credentials(hosts: &[String]) -> IssuedCredentials {
    let tag = hosts.first().cloned().unwrap_or_default();
    IssuedCredentials {
        ca_cert: format!("ca-for-{tag}").into_bytes(),
        tls_cert: format!("cert-for-{tag}").into_bytes(),
        tls_key: format!("key-for-{tag}").into_bytes(),
    }
}

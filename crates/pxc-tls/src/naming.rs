//! Object names and SAN lists derived from a cluster name
//!
//! These names are shared with the rest of the PXC deployment (services,
//! statefulsets, client configuration) and must not drift.

use pxc_common::{
    INTERNAL_SECRET_SUFFIX, ISSUER_SUFFIX, PROXY_COMPONENT, PXC_COMPONENT, SSL_SECRET_SUFFIX,
};

/// Service host for a cluster component (`<cluster>-<component>`)
pub fn component_host(cluster: &str, component: &str) -> String {
    format!("{}-{}", cluster, component)
}

/// Wildcard form of a host (`*.<host>`)
pub fn wildcard(host: &str) -> String {
    format!("*.{}", host)
}

/// Name of the operator-managed self-signed Issuer
pub fn issuer_name(cluster: &str) -> String {
    format!("{}{}", cluster, ISSUER_SUFFIX)
}

/// Name of the client-facing Certificate
pub fn certificate_name(cluster: &str) -> String {
    format!("{}{}", cluster, SSL_SECRET_SUFFIX)
}

/// Name of the internal Certificate
pub fn internal_certificate_name(cluster: &str) -> String {
    format!("{}{}", cluster, INTERNAL_SECRET_SUFFIX)
}

/// Common name of the client-facing certificate
pub fn proxy_common_name(cluster: &str) -> String {
    component_host(cluster, PROXY_COMPONENT)
}

/// Common name of the internal certificate
pub fn pxc_common_name(cluster: &str) -> String {
    component_host(cluster, PXC_COMPONENT)
}

/// SANs for the client-facing certificate
///
/// Bare hosts come first, then their wildcards, then user SANs in the order
/// declared. Clients reach the cluster through the proxy as well as directly
/// through the database nodes, so both services are covered.
pub fn client_hosts(cluster: &str, extra_sans: &[String]) -> Vec<String> {
    let pxc = component_host(cluster, PXC_COMPONENT);
    let proxy = component_host(cluster, PROXY_COMPONENT);

    let mut hosts = vec![
        pxc.clone(),
        proxy.clone(),
        wildcard(&pxc),
        wildcard(&proxy),
    ];
    hosts.extend(extra_sans.iter().cloned());
    hosts
}

/// SANs for the internal (replication) certificate
pub fn internal_hosts(cluster: &str, extra_sans: &[String]) -> Vec<String> {
    let pxc = component_host(cluster, PXC_COMPONENT);

    let mut hosts = vec![pxc.clone(), wildcard(&pxc)];
    hosts.extend(extra_sans.iter().cloned());
    hosts
}

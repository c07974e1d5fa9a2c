//! Custom Resource Definitions consumed by the PXC operator

mod cluster;

pub use cluster::{IssuerConf, PerconaXtraDBCluster, PerconaXtraDBClusterSpec, PxcSpec, TlsSpec};

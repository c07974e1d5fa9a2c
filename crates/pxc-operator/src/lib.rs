//! PXC operator - keeps TLS material in place for PerconaXtraDBCluster resources

#![deny(missing_docs)]

pub mod controller;
pub mod telemetry;

pub use pxc_common::crd;
pub use pxc_common::{Error, Result};

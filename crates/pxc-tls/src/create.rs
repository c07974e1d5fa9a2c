//! Create-call outcome handling shared by the provisioners

use tracing::debug;

use pxc_common::{Error, Result, StoreError};

/// What to do when the object being created already exists
///
/// cert-manager objects are requested idempotently, so an existing object
/// means an earlier attempt got that far. Self-signed secrets are only ever
/// created by this operator in one go, so finding one means the state is not
/// what the caller believed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExistingPolicy {
    /// Treat "already exists" as success
    Tolerate,
    /// Treat "already exists" as a failure of the step
    Reject,
}

impl ExistingPolicy {
    /// Turn the outcome of a create call into the step result
    pub fn check(
        self,
        step: &'static str,
        outcome: std::result::Result<(), StoreError>,
    ) -> Result<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.is_already_exists() && self == Self::Tolerate => {
                debug!(step, error = %err, "object already exists");
                Ok(())
            }
            Err(err) => Err(Error::create(step, err)),
        }
    }
}

//! PerconaXtraDBCluster controller
//!
//! Runs TLS provisioning on every reconcile of a cluster. The rest of the
//! cluster lifecycle is out of scope for this binary, so a successful
//! reconcile simply requeues after the configured interval.

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use tracing::{debug, error, info, instrument, warn};

use pxc_common::crd::PerconaXtraDBCluster;
use pxc_common::Error;
use pxc_infra::SelfSignedIssuer;
use pxc_tls::{KubeTlsStore, TlsObjectStore, TlsReconciler};

/// Default interval between successful reconciles
pub const DEFAULT_REQUEUE: Duration = Duration::from_secs(300);

/// Backoff after a retryable reconcile error
pub const ERROR_REQUEUE: Duration = Duration::from_secs(5);

/// Controller context shared by all reconciles
pub struct Context {
    /// TLS provisioning for clusters
    pub tls: TlsReconciler,
    /// Interval between successful reconciles
    pub requeue: Duration,
}

impl Context {
    /// Create a context backed by the given Kubernetes client
    pub fn new(client: Client, requeue: Duration) -> Self {
        let store: Arc<dyn TlsObjectStore> = Arc::new(KubeTlsStore::new(client));
        Self::from_parts(TlsReconciler::new(store, Arc::new(SelfSignedIssuer)), requeue)
    }

    /// Create a context from an existing reconciler
    pub fn from_parts(tls: TlsReconciler, requeue: Duration) -> Self {
        Self { tls, requeue }
    }
}

/// Reconcile a PerconaXtraDBCluster
#[instrument(skip(cluster, ctx), fields(cluster = %cluster.name_any()))]
pub async fn reconcile(
    cluster: Arc<PerconaXtraDBCluster>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    debug!("reconciling cluster");

    cluster.validate()?;
    ctx.tls.ensure_tls(&cluster).await?;

    info!(requeue_secs = ctx.requeue.as_secs(), "cluster TLS in place");
    Ok(Action::requeue(ctx.requeue))
}

/// Error policy for the controller
///
/// Validation errors wait for the user to change the spec. Everything else
/// is retried after a short backoff.
pub fn error_policy(
    cluster: Arc<PerconaXtraDBCluster>,
    error: &Error,
    _ctx: Arc<Context>,
) -> Action {
    if !error.is_retryable() {
        warn!(
            ?error,
            cluster = %cluster.name_any(),
            "invalid cluster spec, waiting for change"
        );
        return Action::await_change();
    }

    error!(
        ?error,
        cluster = %cluster.name_any(),
        step = error.step().unwrap_or("reconcile"),
        "reconciliation failed"
    );
    Action::requeue(ERROR_REQUEUE)
}

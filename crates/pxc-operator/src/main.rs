//! PXC Operator - TLS provisioning for PerconaXtraDBCluster resources

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, CustomResourceExt};

use pxc_operator::controller::{error_policy, reconcile, Context, DEFAULT_REQUEUE};
use pxc_operator::crd::PerconaXtraDBCluster;
use pxc_operator::telemetry::{init_telemetry, TelemetryConfig};

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
const WATCH_TIMEOUT_SECS: u32 = 25;

/// PXC operator - ensures database clusters have TLS secrets
#[derive(Parser, Debug)]
#[command(name = "pxc-operator", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifest and exit
    #[arg(long)]
    crd: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as controller (default mode)
    Controller(ControllerArgs),
}

#[derive(Args, Debug, Default)]
struct ControllerArgs {
    /// Only watch clusters in this namespace (all namespaces when unset)
    #[arg(long, env = "WATCH_NAMESPACE")]
    namespace: Option<String>,

    /// Seconds between reconciles of a healthy cluster
    #[arg(long, env = "PXC_REQUEUE_SECS", default_value_t = DEFAULT_REQUEUE.as_secs())]
    requeue_secs: u64,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&PerconaXtraDBCluster::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    let args = match cli.command {
        Some(Commands::Controller(args)) => args,
        None => ControllerArgs {
            requeue_secs: DEFAULT_REQUEUE.as_secs(),
            ..Default::default()
        },
    };

    init_telemetry(TelemetryConfig {
        json: args.log_json,
    })?;

    run_controller(args).await
}

async fn run_controller(args: ControllerArgs) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    let clusters: Api<PerconaXtraDBCluster> = match args.namespace.as_deref() {
        Some(ns) => {
            tracing::info!(namespace = %ns, "Watching PerconaXtraDBClusters in namespace");
            Api::namespaced(client.clone(), ns)
        }
        None => {
            tracing::info!("Watching PerconaXtraDBClusters in all namespaces");
            Api::all(client.clone())
        }
    };

    let ctx = Arc::new(Context::new(
        client,
        Duration::from_secs(args.requeue_secs),
    ));

    Controller::new(
        clusters,
        WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS),
    )
    .shutdown_on_signal()
    .run(reconcile, error_policy, ctx)
    .for_each(|result| async move {
        match result {
            Ok(action) => tracing::debug!(?action, "Cluster reconciliation completed"),
            Err(e) => tracing::error!(error = ?e, "Cluster reconciliation error"),
        }
    })
    .await;

    tracing::info!("Controller stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_subcommand_parses_flags() {
        let cli = Cli::try_parse_from([
            "pxc-operator",
            "controller",
            "--namespace",
            "db",
            "--requeue-secs",
            "30",
            "--log-json",
        ])
        .expect("arguments should parse");

        match cli.command {
            Some(Commands::Controller(args)) => {
                assert_eq!(args.namespace.as_deref(), Some("db"));
                assert_eq!(args.requeue_secs, 30);
                assert!(args.log_json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn crd_flag_needs_no_subcommand() {
        let cli = Cli::try_parse_from(["pxc-operator", "--crd"]).expect("should parse");
        assert!(cli.crd);
        assert!(cli.command.is_none());
    }

    #[test]
    fn crd_manifest_names_the_resource() {
        let yaml = serde_yaml::to_string(&PerconaXtraDBCluster::crd()).expect("should serialize");
        assert!(yaml.contains("perconaxtradbclusters.pxc.percona.com"));
    }
}

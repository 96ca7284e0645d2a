use crate::{api::Api, index::Index, metrics::AnalysisMetrics, SharedResult};
use anyhow::{bail, Result};
use clap::Parser;
use k8s_openapi::api::{core::v1 as corev1, networking::v1 as networkingv1};
use kube::runtime::watcher;
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use tracing::{error, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "netpol-analyzer",
    about = "Analyzes pod-to-pod reachability under network policies"
)]
pub struct Args {
    #[clap(long, default_value = "netpol=info,warn", env = "NETPOL_ANALYZER_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Address of the analysis results API.
    #[clap(long, default_value = "0.0.0.0:8000")]
    api_addr: SocketAddr,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            api_addr,
        } = self;

        let mut prom = <Registry>::default();
        let analysis_metrics = AnalysisMetrics::register(prom.sub_registry_with_prefix("analysis"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let (index, changes) = Index::shared();

        // Spawn resource watches.

        let pods = runtime.watch_all::<corev1::Pod>(watcher::Config::default());
        tokio::spawn(kubert::index::namespaced(index.clone(), pods).instrument(info_span!("pods")));

        let services = runtime.watch_all::<corev1::Service>(watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(index.clone(), services).instrument(info_span!("services")),
        );

        let policies = runtime.watch_all::<networkingv1::NetworkPolicy>(watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(index.clone(), policies)
                .instrument(info_span!("networkpolicies")),
        );

        let namespaces = runtime.watch_all::<corev1::Namespace>(watcher::Config::default());
        tokio::spawn(
            kubert::index::cluster(index.clone(), namespaces).instrument(info_span!("namespaces")),
        );

        // Recompute the analysis whenever the index changes.
        let result = SharedResult::default();
        tokio::spawn(
            crate::analyze(index, changes, result.clone(), analysis_metrics)
                .instrument(info_span!("analysis")),
        );

        // Serve results by reading the shared result handle.
        let api = Api::new(result);
        let shutdown = runtime.shutdown_handle();
        tokio::spawn(async move {
            if let Err(error) = api.serve(api_addr, shutdown).await {
                error!(%error, "Analysis API failed");
            }
        });

        // Block the main thread on the shutdown signal. Once it fires, wait
        // for the background tasks to complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

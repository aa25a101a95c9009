// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wave::config::Config;
use wave::reconcilers::WorkloadReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Wave operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={}, resync_interval={:?}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.resync_interval
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let deployments = WorkloadReconciler::<Deployment>::new(client.clone(), config.clone());
    let statefulsets = WorkloadReconciler::<StatefulSet>::new(client.clone(), config.clone());
    let daemonsets = WorkloadReconciler::<DaemonSet>::new(client, config);

    info!("Starting reconcilers...");

    tokio::try_join!(deployments.run(), statefulsets.run(), daemonsets.run())?;

    // Reconcilers only return once a shutdown signal has been received
    warn!("All reconcilers stopped");
    Ok(())
}

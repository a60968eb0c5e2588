// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use knative_reconciler::config::Config;
use knative_reconciler::constants::OPERATOR_NAME;
use knative_reconciler::kubernetes::KubeClusterApi;
use knative_reconciler::reconcile::Reconciler;
use knative_reconciler::workloads;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, the report to stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    info!("Starting {}", OPERATOR_NAME);

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: workload={}, trigger={}, app={}, model={}",
        config.workload, config.trigger, config.app_name, config.model_name
    );

    let trigger = config.load_trigger()?;
    let workload = workloads::load(
        &config.workload,
        &config.app_name,
        &config.model_name,
        config.workload_file.as_deref(),
    )?;

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let cluster = KubeClusterApi::new(client, workload.field_manager());
    let mut reconciler = Reconciler::new(workload, cluster);

    if trigger.kind.is_removal() {
        let report = reconciler.teardown(&trigger).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        report.into_result()?;
    } else {
        let report = reconciler.reconcile(&trigger).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

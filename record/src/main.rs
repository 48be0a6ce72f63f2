// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use for_the_record::config::RecordNodeConfig;
use for_the_record::node::run_record_node;
use for_the_record_config::Config;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
#[clap(name = env!("CARGO_BIN_NAME"))]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[clap(long, env = "FTR_NODE_CONFIG")]
    pub config_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RecordNodeConfig::load(&args.config_path)?;
    info!(
        "Starting record node on port {} against {}",
        config.server_listen_port, config.ledger.rpc_url
    );

    let prometheus_registry = prometheus::Registry::new();
    let handle = run_record_node(config, prometheus_registry).await?;
    handle
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
}

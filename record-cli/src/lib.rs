// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use clap::*;
use for_the_record::app::RecordApp;
use for_the_record::client::RecordServerClient;
use for_the_record::eth_client::EthClient;
use for_the_record::event_scanner::EventScanner;
use for_the_record::metered_eth_provider::MeteredEthHttpProvider;
use for_the_record::metrics::RecordMetrics;
use for_the_record::pending_tracker::PendingTracker;
use for_the_record::settings::FileSettingsStore;
use for_the_record::types::SearchSettings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_SETTINGS_PATH: &str = ".for-the-record/settings.json";

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
#[clap(name = "ftr", version)]
pub struct Args {
    /// Base url of the record node
    #[clap(long, env = "FTR_NODE_URL", default_value = DEFAULT_NODE_URL, global = true)]
    pub node_url: String,
    /// Where search settings are persisted
    #[clap(long, env = "FTR_SETTINGS_PATH", default_value = DEFAULT_SETTINGS_PATH, global = true)]
    pub settings_path: PathBuf,
    #[clap(subcommand)]
    pub command: RecordCommand,
}

#[derive(Parser, Debug, PartialEq, Eq)]
#[clap(rename_all = "kebab-case")]
pub enum RecordCommand {
    /// Record a message on the ledger
    #[clap(name = "submit")]
    Submit {
        message: String,
        /// Return once the node accepted the transaction
        #[clap(long)]
        no_wait: bool,
    },
    /// Scan the ledger for recorded messages
    #[clap(name = "history")]
    History {
        /// Abort a slow scan and retry with default settings
        #[clap(long)]
        abort_when_slow: bool,
    },
    #[clap(name = "contract-info")]
    ContractInfo,
    #[clap(name = "settings")]
    Settings {
        #[clap(subcommand)]
        cmd: SettingsCommand,
    },
}

#[derive(Parser, Debug, PartialEq, Eq)]
#[clap(rename_all = "kebab-case")]
pub enum SettingsCommand {
    #[clap(name = "show")]
    Show,
    #[clap(name = "set")]
    Set {
        #[clap(long)]
        block_count: Option<u64>,
        #[clap(long)]
        use_cache: Option<bool>,
    },
    #[clap(name = "reset")]
    Reset,
}

/// Applies the given overrides on top of `current`.
pub fn apply_settings_overrides(
    current: SearchSettings,
    block_count: Option<u64>,
    use_cache: Option<bool>,
) -> SearchSettings {
    SearchSettings {
        block_window: block_count.unwrap_or(current.block_window),
        use_cache: use_cache.unwrap_or(current.use_cache),
    }
}

/// Fetches the contract descriptor from the node and wires a [`RecordApp`] around it.
/// Submissions go through the node; receipts and history are read from the ledger directly.
pub async fn connect_app(
    node_url: &str,
    settings_path: &Path,
    metrics: Arc<RecordMetrics>,
) -> anyhow::Result<RecordApp<MeteredEthHttpProvider>> {
    let client = RecordServerClient::new(node_url)?;
    let descriptor = client
        .contract_info()
        .await
        .with_context(|| format!("Failed to fetch contract info from {}", node_url))?;
    info!(
        "Contract {:?} on {} (cache: {})",
        descriptor.address,
        descriptor.endpoint,
        descriptor.cache_endpoint.as_deref().unwrap_or("none")
    );

    let live = Arc::new(EthClient::new(
        &descriptor.endpoint,
        descriptor.address,
        metrics.clone(),
    )?);
    let tracker = PendingTracker::new(live, metrics.clone());
    let scanner = Arc::new(EventScanner::from_descriptor(&descriptor, metrics.clone())?);
    Ok(RecordApp::new(
        Arc::new(client),
        tracker,
        scanner,
        Box::new(FileSettingsStore::new(settings_path)),
        metrics,
    ))
}

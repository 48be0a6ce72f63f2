// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use clap::*;
use for_the_record::app::AppUpdate;
use for_the_record::client::RecordServerClient;
use for_the_record::metrics::RecordMetrics;
use for_the_record::settings::{FileSettingsStore, SettingsStore};
use for_the_record::state::MessageView;
use for_the_record::types::SearchSettings;
use for_the_record_cli::{
    apply_settings_overrides, connect_app, Args, RecordCommand, SettingsCommand,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging, kept off stdout so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let registry = prometheus::Registry::new();
    let metrics = Arc::new(RecordMetrics::new(&registry));

    match args.command {
        RecordCommand::Submit { message, no_wait } => {
            let mut app = connect_app(&args.node_url, &args.settings_path, metrics).await?;
            let submitted = app.submit_message(&message).await?;
            println!("Transaction: {:?}", submitted.tx_hash);
            println!("Explorer:    {}", submitted.url);
            if no_wait {
                return Ok(());
            }
            println!("Waiting for confirmation...");
            loop {
                match app.next_update().await? {
                    AppUpdate::RecordConfirmed { tx_hash } if tx_hash == submitted.tx_hash => {
                        println!("Confirmed: {}", message);
                        break;
                    }
                    AppUpdate::RecordReverted { tx_hash } if tx_hash == submitted.tx_hash => {
                        anyhow::bail!("Transaction {:?} was reverted", tx_hash);
                    }
                    AppUpdate::RecordAbandoned { tx_hash, reason }
                        if tx_hash == submitted.tx_hash =>
                    {
                        anyhow::bail!("Stopped tracking {:?}: {}", tx_hash, reason);
                    }
                    other => tracing::debug!("Ignoring update {:?}", other),
                }
            }
        }

        RecordCommand::History { abort_when_slow } => {
            let mut app = connect_app(&args.node_url, &args.settings_path, metrics).await?;
            let mut session = app.load_events();
            loop {
                match app.next_update().await? {
                    AppUpdate::ScanSlow { session_id } if session_id == session => {
                        if abort_when_slow {
                            eprintln!("Scan is slow, retrying with default settings");
                            session = app.abort_and_reset()?;
                        } else {
                            eprintln!(
                                "Scan is taking a while, rerun with --abort-when-slow to fall back to defaults"
                            );
                        }
                    }
                    AppUpdate::ScanCompleted {
                        session_id,
                        records,
                        load_time,
                    } if session_id == session => {
                        let window = app.settings().block_window;
                        match app.state().view() {
                            MessageView::Records(messages) => {
                                for record in messages {
                                    println!(
                                        "{:<9} {:?} {}",
                                        record.status.to_string(),
                                        record.source_tx,
                                        record.text
                                    );
                                }
                            }
                            MessageView::Empty | MessageView::Loading => {
                                println!("No messages recorded in the last {} blocks", window)
                            }
                        }
                        eprintln!("{} messages loaded in {:.2?}", records, load_time);
                        break;
                    }
                    AppUpdate::ScanFailed { session_id, error } if session_id == session => {
                        anyhow::bail!("History scan failed: {}", error);
                    }
                    other => tracing::debug!("Ignoring update {:?}", other),
                }
            }
        }

        RecordCommand::ContractInfo => {
            let client = RecordServerClient::new(&args.node_url)?;
            let descriptor = client.contract_info().await?;
            println!("Address:        {:?}", descriptor.address);
            println!("Endpoint:       {}", descriptor.endpoint);
            println!(
                "Cache endpoint: {}",
                descriptor.cache_endpoint.as_deref().unwrap_or("-")
            );
            for event in descriptor.abi.events() {
                println!("Event:          {}", event.name);
            }
        }

        RecordCommand::Settings { cmd } => {
            let store = FileSettingsStore::new(&args.settings_path);
            let settings = match cmd {
                SettingsCommand::Show => store.load(),
                SettingsCommand::Set {
                    block_count,
                    use_cache,
                } => {
                    let settings = apply_settings_overrides(store.load(), block_count, use_cache);
                    store.save(&settings)?;
                    settings
                }
                SettingsCommand::Reset => store.reset()?,
            };
            print_settings(&settings, &store);
        }
    }
    Ok(())
}

fn print_settings(settings: &SearchSettings, store: &FileSettingsStore) {
    println!("Settings file: {}", store.path().display());
    println!("Block count:   {}", settings.block_window);
    println!("Event cache:   {}", settings.use_cache);
}

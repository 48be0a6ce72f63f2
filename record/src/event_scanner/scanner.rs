// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use super::decode::{logs_to_records, RecordEventDecoder};
use super::session::ScanSession;
use crate::error::{RecordError, RecordResult};
use crate::eth_client::EthClient;
use crate::metered_eth_provider::MeteredEthHttpProvider;
use crate::metrics::RecordMetrics;
use crate::types::{ContractDescriptor, MessageRecord, SearchSettings};
use ethers::abi::Abi;
use ethers::providers::JsonRpcClient;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tap::TapFallible;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A scan still running after this long is reported as slow.
pub const SLOW_SCAN_THRESHOLD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSource {
    Live,
    Cache,
}

impl ScanSource {
    pub fn label(&self) -> &'static str {
        match self {
            ScanSource::Live => "live",
            ScanSource::Cache => "cache",
        }
    }
}

impl fmt::Display for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Most recent first
    pub records: Vec<MessageRecord>,
    pub source: ScanSource,
    pub head: u64,
    pub start_block: u64,
    pub load_time: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Slow {
        session_id: u64,
        elapsed: Duration,
    },
    Completed {
        session_id: u64,
        result: RecordResult<ScanResult>,
    },
}

pub struct EventScanner<P> {
    live: Arc<EthClient<P>>,
    cache: Option<Arc<EthClient<P>>>,
    decoder: RecordEventDecoder,
    metrics: Arc<RecordMetrics>,
}

impl EventScanner<MeteredEthHttpProvider> {
    pub fn from_descriptor(
        descriptor: &ContractDescriptor,
        metrics: Arc<RecordMetrics>,
    ) -> anyhow::Result<Self> {
        let live = Arc::new(EthClient::new(
            &descriptor.endpoint,
            descriptor.address,
            metrics.clone(),
        )?);
        let cache = match &descriptor.cache_endpoint {
            Some(endpoint) => Some(Arc::new(EthClient::new(
                endpoint,
                descriptor.address,
                metrics.clone(),
            )?)),
            None => None,
        };
        Ok(Self::new(live, cache, &descriptor.abi, metrics)?)
    }
}

impl<P> EventScanner<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn new(
        live: Arc<EthClient<P>>,
        cache: Option<Arc<EthClient<P>>>,
        abi: &Abi,
        metrics: Arc<RecordMetrics>,
    ) -> RecordResult<Self> {
        Ok(Self {
            live,
            cache,
            decoder: RecordEventDecoder::new(abi)?,
            metrics,
        })
    }

    fn client_for(&self, settings: &SearchSettings) -> (ScanSource, &Arc<EthClient<P>>) {
        match (&self.cache, settings.use_cache) {
            (Some(cache), true) => (ScanSource::Cache, cache),
            (None, true) => {
                tracing::warn!("[EventScanner] Event cache requested but not configured, using live endpoint");
                (ScanSource::Live, &self.live)
            }
            _ => (ScanSource::Live, &self.live),
        }
    }

    /// Reads the contract's history over the configured block window.
    pub async fn scan(&self, settings: SearchSettings) -> RecordResult<ScanResult> {
        let started = Instant::now();
        let (source, client) = self.client_for(&settings);
        self.metrics
            .event_scans
            .with_label_values(&[source.label()])
            .inc();
        let _timer = self
            .metrics
            .event_scan_latency
            .with_label_values(&[source.label()])
            .start_timer();

        let result = async {
            let head = client.get_latest_block_id().await?;
            let start_block = settings.start_block(head);
            tracing::info!(
                "[EventScanner] Scanning blocks {}..=latest (head {}) from {} endpoint",
                start_block,
                head,
                source
            );
            let logs = client.get_events_in_range(start_block).await?;
            let records = logs_to_records(&self.decoder, &logs);
            Ok::<_, RecordError>(ScanResult {
                records,
                source,
                head,
                start_block,
                load_time: started.elapsed(),
            })
        }
        .await
        .tap_ok(|result| {
            self.metrics
                .event_scan_records
                .set(result.records.len() as i64);
            tracing::info!(
                "[EventScanner] Loaded {} records in {:?}",
                result.records.len(),
                result.load_time
            );
        })
        .tap_err(|e| {
            self.metrics.err_event_scans.inc();
            tracing::error!("[EventScanner] An unexpected error occurred when reading event logs: {}", e);
        });
        result
    }

    /// Runs a scan for `session` in the background, reporting a slow signal
    /// once past the threshold and the completion either way.
    pub fn spawn_scan<E>(
        self: &Arc<Self>,
        session: ScanSession,
        settings: SearchSettings,
        events_tx: mpsc::Sender<E>,
    ) -> JoinHandle<()>
    where
        E: From<ScanEvent> + Send + 'static,
    {
        let scanner = self.clone();
        tokio::spawn(async move {
            let scan = scanner.scan(settings);
            tokio::pin!(scan);
            // Counted from session start, so the head lookup is part of it
            let slow = tokio::time::sleep_until(session.started_at + SLOW_SCAN_THRESHOLD);
            tokio::pin!(slow);
            let mut slow_reported = false;

            let result = loop {
                tokio::select! {
                    result = &mut scan => break result,
                    _ = &mut slow, if !slow_reported => {
                        slow_reported = true;
                        tracing::warn!(
                            "[EventScanner] Scan session {} still running after {:?}",
                            session.id,
                            SLOW_SCAN_THRESHOLD
                        );
                        let event = ScanEvent::Slow {
                            session_id: session.id,
                            elapsed: session.elapsed(),
                        };
                        if events_tx.send(E::from(event)).await.is_err() {
                            return;
                        }
                    }
                }
            };

            let event = ScanEvent::Completed {
                session_id: session.id,
                result,
            };
            if events_tx.send(E::from(event)).await.is_err() {
                tracing::debug!(
                    "[EventScanner] Receiver dropped before session {} completed",
                    session.id
                );
            }
        })
    }
}

// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use super::types::{TrackerEvent, TrackerOutcome};
use crate::eth_client::EthClient;
use crate::metrics::RecordMetrics;
use ethers::providers::JsonRpcClient;
use ethers::types::TxHash;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns one receipt poller per transaction. Each poller owns a child of the
/// tracker's root token, so a single id or everything can be cancelled.
pub struct PendingTracker<P> {
    eth_client: Arc<EthClient<P>>,
    poll_interval: Duration,
    root: CancellationToken,
    tasks: Arc<Mutex<HashMap<TxHash, (u64, CancellationToken)>>>,
    next_generation: AtomicU64,
    metrics: Arc<RecordMetrics>,
}

impl<P> PendingTracker<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn new(eth_client: Arc<EthClient<P>>, metrics: Arc<RecordMetrics>) -> Self {
        Self::with_poll_interval(eth_client, DEFAULT_POLL_INTERVAL, metrics)
    }

    pub fn with_poll_interval(
        eth_client: Arc<EthClient<P>>,
        poll_interval: Duration,
        metrics: Arc<RecordMetrics>,
    ) -> Self {
        Self {
            eth_client,
            poll_interval,
            root: CancellationToken::new(),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            metrics,
        }
    }

    /// Start polling for `tx_hash`. Tracking an id twice replaces the earlier poller.
    pub fn track<E>(
        &self,
        tx_hash: TxHash,
        text: String,
        events_tx: mpsc::Sender<E>,
    ) -> JoinHandle<()>
    where
        E: From<TrackerEvent> + Send + 'static,
    {
        let token = self.root.child_token();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        if let Some((_, previous)) = self
            .tasks
            .lock()
            .unwrap()
            .insert(tx_hash, (generation, token.clone()))
        {
            previous.cancel();
        }
        self.metrics.pending_tx_tracked.inc();
        tracing::info!("[PendingTracker] Tracking transaction {:?}", tx_hash);

        let eth_client = self.eth_client.clone();
        let poll_interval = self.poll_interval;
        let tasks = self.tasks.clone();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => None,
                outcome = poll_until_terminal(&eth_client, tx_hash, poll_interval) => Some(outcome),
            };
            metrics.pending_tx_tracked.dec();
            {
                let mut tasks = tasks.lock().unwrap();
                // Only drop our own entry, a re-track may have replaced it
                if tasks.get(&tx_hash).map(|(g, _)| *g) == Some(generation) {
                    tasks.remove(&tx_hash);
                }
            }
            let Some(outcome) = outcome else {
                metrics
                    .pending_tx_outcomes
                    .with_label_values(&["cancelled"])
                    .inc();
                tracing::debug!("[PendingTracker] Tracking of {:?} cancelled", tx_hash);
                return;
            };
            metrics
                .pending_tx_outcomes
                .with_label_values(&[outcome.label()])
                .inc();
            match &outcome {
                TrackerOutcome::Confirmed { .. } => {
                    tracing::info!("[PendingTracker] Transaction {:?} {}", tx_hash, outcome)
                }
                _ => tracing::warn!("[PendingTracker] Transaction {:?} {}", tx_hash, outcome),
            }
            let event = TrackerEvent {
                tx_hash,
                text,
                outcome,
            };
            if events_tx.send(E::from(event)).await.is_err() {
                tracing::debug!(
                    "[PendingTracker] Event receiver dropped before {:?} resolved",
                    tx_hash
                );
            }
        })
    }
}

impl<P> PendingTracker<P> {
    pub fn cancel(&self, tx_hash: &TxHash) -> bool {
        match self.tasks.lock().unwrap().remove(tx_hash) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every poller, including ones started later.
    pub fn cancel_all(&self) {
        self.root.cancel();
        self.tasks.lock().unwrap().clear();
    }

    pub fn is_tracking(&self, tx_hash: &TxHash) -> bool {
        self.tasks.lock().unwrap().contains_key(tx_hash)
    }

    pub fn tracked_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

async fn poll_until_terminal<P: JsonRpcClient + 'static>(
    eth_client: &EthClient<P>,
    tx_hash: TxHash,
    poll_interval: Duration,
) -> TrackerOutcome {
    let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match eth_client.get_transaction_receipt(tx_hash).await {
            Ok(None) => {
                tracing::debug!("[PendingTracker] No receipt yet for {:?}", tx_hash);
            }
            Ok(Some(receipt)) => match TrackerOutcome::from_receipt(&receipt) {
                Some(outcome) => return outcome,
                None => tracing::debug!(
                    "[PendingTracker] Receipt for {:?} has no status yet",
                    tx_hash
                ),
            },
            Err(e) => {
                tracing::error!(
                    "[PendingTracker] Receipt query for {:?} failed: {:?}",
                    tx_hash,
                    e
                );
                return TrackerOutcome::Abandoned {
                    reason: e.to_string(),
                };
            }
        }
    }
}

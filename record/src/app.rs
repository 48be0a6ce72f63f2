// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

//! Client-side control loop.
//!
//! [`RecordApp`] owns the [`AppState`]. Receipt pollers and scan tasks run in
//! the background and report through one channel; the owner applies what they
//! report in [`RecordApp::next_update`].

use crate::error::{RecordError, RecordResult};
use crate::event_scanner::{EventScanner, ScanEvent, SessionCounter};
use crate::metrics::RecordMetrics;
use crate::pending_tracker::{PendingTracker, TrackerEvent, TrackerOutcome};
use crate::settings::SettingsStore;
use crate::state::{AppState, ScanApplied};
use crate::submission::{RecordSubmitter, SubmittedRecord};
use crate::types::{validate_message, SearchSettings};
use ethers::providers::JsonRpcClient;
use ethers::types::TxHash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const APP_EVENT_CHANNEL_SIZE: usize = 1000;

#[derive(Debug)]
pub enum AppEvent {
    Tracker(TrackerEvent),
    Scan(ScanEvent),
}

impl From<TrackerEvent> for AppEvent {
    fn from(event: TrackerEvent) -> Self {
        AppEvent::Tracker(event)
    }
}

impl From<ScanEvent> for AppEvent {
    fn from(event: ScanEvent) -> Self {
        AppEvent::Scan(event)
    }
}

/// A state change, as seen by whoever drives the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppUpdate {
    RecordConfirmed { tx_hash: TxHash },
    RecordReverted { tx_hash: TxHash },
    RecordAbandoned { tx_hash: TxHash, reason: String },
    ScanSlow { session_id: u64 },
    ScanCompleted { session_id: u64, records: usize, load_time: Duration },
    ScanFailed { session_id: u64, error: String },
    StaleScanDiscarded { session_id: u64 },
}

pub struct RecordApp<P> {
    state: AppState,
    submitter: Arc<dyn RecordSubmitter>,
    tracker: PendingTracker<P>,
    scanner: Arc<EventScanner<P>>,
    settings_store: Box<dyn SettingsStore>,
    sessions: SessionCounter,
    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
    metrics: Arc<RecordMetrics>,
}

impl<P> RecordApp<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn new(
        submitter: Arc<dyn RecordSubmitter>,
        tracker: PendingTracker<P>,
        scanner: Arc<EventScanner<P>>,
        settings_store: Box<dyn SettingsStore>,
        metrics: Arc<RecordMetrics>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(APP_EVENT_CHANNEL_SIZE);
        let state = AppState::new(settings_store.load());
        Self {
            state,
            submitter,
            tracker,
            scanner,
            settings_store,
            sessions: SessionCounter::new(),
            events_tx,
            events_rx,
            metrics,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn settings(&self) -> SearchSettings {
        self.state.settings()
    }

    /// Submits `message` and starts tracking it. Over-long messages never leave the process.
    pub async fn submit_message(&mut self, message: &str) -> RecordResult<SubmittedRecord> {
        validate_message(message)?;
        let submitted = self.submitter.submit_record(message).await?;
        self.state
            .record_submitted(submitted.tx_hash, message.to_string());
        self.tracker.track(
            submitted.tx_hash,
            message.to_string(),
            self.events_tx.clone(),
        );
        Ok(submitted)
    }

    /// Starts a new scan session with the current settings and returns its id.
    pub fn load_events(&mut self) -> u64 {
        let session = self.sessions.next_session();
        let settings = self.state.settings();
        tracing::info!(
            "[RecordApp] Starting scan session {} with window {} (cache: {})",
            session.id,
            settings.block_window,
            settings.use_cache
        );
        self.state.scan_started(session);
        self.scanner
            .spawn_scan(session, settings, self.events_tx.clone());
        session.id
    }

    /// Persists new settings and reloads history with them.
    pub fn change_settings(&mut self, settings: SearchSettings) -> RecordResult<u64> {
        self.settings_store.save(&settings)?;
        self.state.settings_changed(settings);
        Ok(self.load_events())
    }

    /// Abandons the running scan, restores default settings and scans again.
    pub fn abort_and_reset(&mut self) -> RecordResult<u64> {
        if self.state.abort_scan() {
            tracing::warn!("[RecordApp] Scan aborted, resetting settings");
        }
        let defaults = self.settings_store.reset()?;
        self.state.settings_changed(defaults);
        Ok(self.load_events())
    }

    /// Waits for the next background report and applies it.
    pub async fn next_update(&mut self) -> RecordResult<AppUpdate> {
        let event = self
            .events_rx
            .recv()
            .await
            .ok_or(RecordError::ChannelClosed)?;
        Ok(self.apply(event))
    }

    fn apply(&mut self, event: AppEvent) -> AppUpdate {
        match event {
            AppEvent::Tracker(TrackerEvent {
                tx_hash,
                text,
                outcome,
            }) => match outcome {
                TrackerOutcome::Confirmed { .. } => {
                    self.state.record_confirmed(tx_hash, text);
                    AppUpdate::RecordConfirmed { tx_hash }
                }
                TrackerOutcome::Reverted { .. } => {
                    self.state.record_reverted(tx_hash);
                    AppUpdate::RecordReverted { tx_hash }
                }
                TrackerOutcome::Abandoned { reason } => {
                    self.state.record_abandoned(tx_hash);
                    AppUpdate::RecordAbandoned { tx_hash, reason }
                }
            },
            AppEvent::Scan(ScanEvent::Slow { session_id, .. }) => {
                self.state.scan_slow(session_id);
                AppUpdate::ScanSlow { session_id }
            }
            AppEvent::Scan(ScanEvent::Completed { session_id, result }) => {
                let records = result.as_ref().map(|r| r.records.len()).unwrap_or_default();
                let error = result.as_ref().err().map(|e| e.to_string());
                match self.state.scan_completed(session_id, result) {
                    ScanApplied::Applied => AppUpdate::ScanCompleted {
                        session_id,
                        records,
                        load_time: self.state.load_time().unwrap_or_default(),
                    },
                    ScanApplied::Failed => AppUpdate::ScanFailed {
                        session_id,
                        error: error.unwrap_or_default(),
                    },
                    ScanApplied::Stale => {
                        self.metrics.stale_scan_results.inc();
                        tracing::warn!(
                            "[RecordApp] Discarding result of superseded scan session {}",
                            session_id
                        );
                        AppUpdate::StaleScanDiscarded { session_id }
                    }
                }
            }
        }
    }

    pub fn shutdown(&self) {
        self.tracker.cancel_all();
    }
}

impl<P> Drop for RecordApp<P> {
    fn drop(&mut self) {
        self.tracker.cancel_all();
    }
}

// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

//! Application state and the only transitions allowed on it.

use crate::error::RecordError;
use crate::event_scanner::{ScanResult, ScanSession};
use crate::types::{MessageRecord, RecordStatus, SearchSettings};
use ethers::types::TxHash;
use std::collections::HashSet;
use std::time::Duration;

/// What a scan completion did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanApplied {
    Applied,
    Failed,
    Stale,
}

/// What the message list should show right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageView<'a> {
    Loading,
    Empty,
    Records(&'a [MessageRecord]),
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    // Most recent first
    messages: Vec<MessageRecord>,
    abandoned: HashSet<TxHash>,
    reverted: HashSet<TxHash>,
    settings: SearchSettings,
    session: Option<ScanSession>,
    loading: bool,
    slow: bool,
    load_time: Option<Duration>,
    last_scan_error: Option<String>,
}

impl AppState {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> &[MessageRecord] {
        &self.messages
    }

    pub fn message(&self, tx_hash: &TxHash) -> Option<&MessageRecord> {
        self.messages.iter().find(|m| m.source_tx == *tx_hash)
    }

    pub fn view(&self) -> MessageView<'_> {
        if self.loading {
            MessageView::Loading
        } else if self.messages.is_empty() {
            MessageView::Empty
        } else {
            MessageView::Records(&self.messages)
        }
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    pub fn current_session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True once the current scan passed the slow threshold; enables abort and reset.
    pub fn is_slow(&self) -> bool {
        self.slow
    }

    pub fn load_time(&self) -> Option<Duration> {
        self.load_time
    }

    pub fn last_scan_error(&self) -> Option<&str> {
        self.last_scan_error.as_deref()
    }

    pub fn is_abandoned(&self, tx_hash: &TxHash) -> bool {
        self.abandoned.contains(tx_hash)
    }

    pub fn is_reverted(&self, tx_hash: &TxHash) -> bool {
        self.reverted.contains(tx_hash)
    }

    pub fn record_submitted(&mut self, tx_hash: TxHash, text: String) {
        if self.message(&tx_hash).is_some() {
            return;
        }
        self.messages.insert(0, MessageRecord::pending(tx_hash, text));
    }

    /// Pending becomes Confirmed; a record dropped by a scan in the meantime is restored.
    pub fn record_confirmed(&mut self, tx_hash: TxHash, text: String) {
        self.abandoned.remove(&tx_hash);
        match self.messages.iter_mut().find(|m| m.source_tx == tx_hash) {
            Some(record) => record.status = RecordStatus::Confirmed,
            None => self
                .messages
                .insert(0, MessageRecord::confirmed(tx_hash, text)),
        }
    }

    /// Tracking gave up; the record stays pending.
    pub fn record_abandoned(&mut self, tx_hash: TxHash) {
        if self.message(&tx_hash).is_some_and(|m| m.status.is_pending()) {
            self.abandoned.insert(tx_hash);
        }
    }

    /// The transaction was mined but failed; the record stays pending.
    pub fn record_reverted(&mut self, tx_hash: TxHash) {
        if self.message(&tx_hash).is_some_and(|m| m.status.is_pending()) {
            self.reverted.insert(tx_hash);
        }
    }

    pub fn scan_started(&mut self, session: ScanSession) {
        self.session = Some(session);
        self.loading = true;
        self.slow = false;
    }

    pub fn scan_slow(&mut self, session_id: u64) -> bool {
        match &self.session {
            Some(session) if session.id == session_id && !session.aborted && self.loading => {
                self.slow = true;
                true
            }
            _ => false,
        }
    }

    /// Marks the running session aborted. Its completion will be ignored.
    pub fn abort_scan(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) if self.loading && !session.aborted => {
                session.abort();
                self.loading = false;
                self.slow = false;
                true
            }
            _ => false,
        }
    }

    pub fn scan_completed(
        &mut self,
        session_id: u64,
        result: Result<ScanResult, RecordError>,
    ) -> ScanApplied {
        let current = match &self.session {
            Some(session) if session.id == session_id && !session.aborted => session,
            _ => return ScanApplied::Stale,
        };
        let elapsed = current.elapsed();
        self.loading = false;
        self.slow = false;
        match result {
            Ok(result) => {
                self.load_time = Some(result.load_time);
                self.messages = result.records;
                self.abandoned
                    .retain(|h| self.messages.iter().any(|m| m.source_tx == *h && m.status.is_pending()));
                self.reverted
                    .retain(|h| self.messages.iter().any(|m| m.source_tx == *h && m.status.is_pending()));
                self.last_scan_error = None;
                ScanApplied::Applied
            }
            Err(e) => {
                // A failed read leaves an empty history
                self.load_time = Some(elapsed);
                self.messages.clear();
                self.abandoned.clear();
                self.reverted.clear();
                self.last_scan_error = Some(e.to_string());
                ScanApplied::Failed
            }
        }
    }

    pub fn settings_changed(&mut self, settings: SearchSettings) {
        self.settings = settings;
    }
}

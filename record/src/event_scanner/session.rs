// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// One scan invocation. Only the newest session's completion is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSession {
    pub id: u64,
    pub started_at: Instant,
    pub aborted: bool,
}

impl ScanSession {
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn abort(&mut self) {
        self.aborted = true;
    }
}

/// Hands out strictly increasing session ids, starting at 1.
#[derive(Debug, Default)]
pub struct SessionCounter {
    last: AtomicU64,
}

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_session(&self) -> ScanSession {
        let id = self.last.fetch_add(1, Ordering::SeqCst) + 1;
        ScanSession {
            id,
            started_at: Instant::now(),
            aborted: false,
        }
    }

    pub fn latest_id(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pending Tracker Module
//!
//! Follows submitted record transactions until their receipt is terminal:
//! - One task per transaction id, polling `eth_getTransactionReceipt` at a fixed interval
//! - First poll one interval after submission, never more than one query in flight per id
//! - Outcomes are delivered as events, the tracker never touches application state
//!
//! ## Lifecycle
//!
//! ```text
//! Submitted ──(receipt, status 1)──▶ Confirmed
//!     │     ──(receipt, status 0)──▶ Reverted
//!     │     ──(receipt, no status)─▶ Submitted
//!     │     ──(query error)────────▶ Abandoned
//!     └─────(token cancelled)──────▶ (no event)
//! ```

mod tracker;
mod types;

pub use tracker::{PendingTracker, DEFAULT_POLL_INTERVAL};
pub use types::*;

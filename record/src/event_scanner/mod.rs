// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

//! Event Scanner Module
//!
//! Rebuilds message history from the record contract's event log:
//! - Resolves the chain head on the live node or the event cache
//! - Pulls every contract log over `[head - window, latest]`
//! - Decodes logs carrying a `message` string into confirmed records
//!
//! Each background scan belongs to a [`ScanSession`]. A scan that outlives
//! [`SLOW_SCAN_THRESHOLD`] emits a slow signal before its completion; the
//! owner decides whether the completion is still current.

mod decode;
mod scanner;
mod session;

pub use decode::{logs_to_records, RecordEventDecoder, MESSAGE_PARAM};
pub use scanner::{EventScanner, ScanEvent, ScanResult, ScanSource, SLOW_SCAN_THRESHOLD};
pub use session::{ScanSession, SessionCounter};

// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

//! Type definitions for pending transaction tracking

use ethers::types::{TransactionReceipt, TxHash};
use std::fmt;

/// Terminal result of following one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerOutcome {
    /// Receipt found with success status
    Confirmed { block_number: Option<u64> },
    /// Receipt found but execution failed
    Reverted { block_number: Option<u64> },
    /// Receipt query failed, polling stopped
    Abandoned { reason: String },
}

impl TrackerOutcome {
    /// `None` while the receipt carries no status yet; polling goes on.
    pub fn from_receipt(receipt: &TransactionReceipt) -> Option<Self> {
        let block_number = receipt.block_number.map(|b| b.as_u64());
        match receipt.status.map(|s| s.as_u64()) {
            Some(1) => Some(TrackerOutcome::Confirmed { block_number }),
            Some(_) => Some(TrackerOutcome::Reverted { block_number }),
            None => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrackerOutcome::Confirmed { .. } => "confirmed",
            TrackerOutcome::Reverted { .. } => "reverted",
            TrackerOutcome::Abandoned { .. } => "abandoned",
        }
    }
}

impl fmt::Display for TrackerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerOutcome::Confirmed { block_number } => {
                write!(f, "confirmed in block {:?}", block_number)
            }
            TrackerOutcome::Reverted { block_number } => {
                write!(f, "reverted in block {:?}", block_number)
            }
            TrackerOutcome::Abandoned { reason } => write!(f, "abandoned: {}", reason),
        }
    }
}

/// Emitted once per tracked transaction, unless tracking was cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerEvent {
    pub tx_hash: TxHash,
    pub text: String,
    pub outcome: TrackerOutcome,
}

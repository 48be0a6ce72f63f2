// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use ethers::abi::Abi;
use ethers::types::{Address as EthAddress, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest message, in characters, the contract accepts.
pub const MAX_MESSAGE_CHARS: usize = 140;

/// Default explorer page for a transaction, the hash is appended.
pub const DEFAULT_EXPLORER_BASE_URL: &str = "https://mastery.aion.network/#/transaction/";

pub fn validate_message(text: &str) -> Result<(), crate::error::RecordError> {
    let len = text.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(crate::error::RecordError::MessageTooLong(len));
    }
    Ok(())
}

pub fn explorer_url(base_url: &str, tx_hash: TxHash) -> String {
    format!("{}{:#x}", base_url, tx_hash)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    Pending,
    Confirmed,
}

impl RecordStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, RecordStatus::Pending)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Pending => write!(f, "PENDING"),
            RecordStatus::Confirmed => write!(f, "CONFIRMED"),
        }
    }
}

/// A message as shown to the user, keyed by the transaction that carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub text: String,
    pub status: RecordStatus,
    pub source_tx: TxHash,
}

impl MessageRecord {
    pub fn pending(source_tx: TxHash, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: RecordStatus::Pending,
            source_tx,
        }
    }

    pub fn confirmed(source_tx: TxHash, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: RecordStatus::Confirmed,
            source_tx,
        }
    }
}

/// Everything a client needs to talk to the record contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDescriptor {
    pub abi: Abi,
    pub address: EthAddress,
    // Live ledger node
    pub endpoint: String,
    // Event cache endpoint, falls back to `endpoint` when absent
    #[serde(
        default,
        alias = "eventCacheEndpoint",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache_endpoint: Option<String>,
}

impl ContractDescriptor {
    pub fn scan_endpoint(&self, use_cache: bool) -> &str {
        match (&self.cache_endpoint, use_cache) {
            (Some(cache), true) => cache,
            _ => &self.endpoint,
        }
    }
}

/// Scan window and source preference, persisted between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(rename = "blockCount")]
    pub block_window: u64,
    #[serde(rename = "eventCacheEnabled")]
    pub use_cache: bool,
}

pub const DEFAULT_BLOCK_WINDOW: u64 = 1000;

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            block_window: DEFAULT_BLOCK_WINDOW,
            use_cache: false,
        }
    }
}

impl SearchSettings {
    pub fn new(block_window: u64, use_cache: bool) -> Self {
        Self {
            block_window,
            use_cache,
        }
    }

    /// First block of the scan range for a chain whose head is `head`.
    pub fn start_block(&self, head: u64) -> u64 {
        head.saturating_sub(self.block_window)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRecordRequest {
    pub message: String,
}

/// Wire response of the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitRecordResponse {
    Success { hash: TxHash, url: String },
    Fail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_block_saturates() {
        let settings = SearchSettings::new(1000, false);
        assert_eq!(settings.start_block(5000), 4000);
        assert_eq!(settings.start_block(1000), 0);
        assert_eq!(settings.start_block(999), 0);
        assert_eq!(settings.start_block(0), 0);
        assert_eq!(SearchSettings::new(0, false).start_block(42), 42);
    }

    #[test]
    fn test_validate_message_counts_chars() {
        assert!(validate_message(&"a".repeat(140)).is_ok());
        assert_eq!(
            validate_message(&"a".repeat(141)),
            Err(crate::error::RecordError::MessageTooLong(141))
        );
        // 140 multi-byte characters are still within the limit
        assert!(validate_message(&"é".repeat(140)).is_ok());
        assert!(validate_message("").is_ok());
    }

    #[test]
    fn test_settings_wire_format() {
        let settings = SearchSettings::new(500, true);
        let json = serde_json::to_value(settings).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "blockCount": 500, "eventCacheEnabled": true })
        );
        assert_eq!(SearchSettings::default(), SearchSettings::new(1000, false));
    }

    #[test]
    fn test_submit_response_wire_format() {
        let hash = TxHash::repeat_byte(0xab);
        let success = SubmitRecordResponse::Success {
            hash,
            url: explorer_url(DEFAULT_EXPLORER_BASE_URL, hash),
        };
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["hash"], format!("0x{}", "ab".repeat(32)));
        assert_eq!(
            json["url"],
            format!(
                "https://mastery.aion.network/#/transaction/0x{}",
                "ab".repeat(32)
            )
        );

        let fail: SubmitRecordResponse =
            serde_json::from_str(r#"{"status":"fail"}"#).unwrap();
        assert_eq!(fail, SubmitRecordResponse::Fail);
    }

    #[test]
    fn test_scan_endpoint_fallback() {
        let mut descriptor = ContractDescriptor {
            abi: serde_json::from_str("[]").unwrap(),
            address: EthAddress::zero(),
            endpoint: "http://live".to_string(),
            cache_endpoint: None,
        };
        assert_eq!(descriptor.scan_endpoint(true), "http://live");
        descriptor.cache_endpoint = Some("http://cache".to_string());
        assert_eq!(descriptor.scan_endpoint(true), "http://cache");
        assert_eq!(descriptor.scan_endpoint(false), "http://live");
    }
}

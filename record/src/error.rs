// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use ethers::providers::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    // Message exceeds the 140 character limit, rejected before any RPC
    #[error("Message is {0} characters long, the limit is {max}", max = crate::types::MAX_MESSAGE_CHARS)]
    MessageTooLong(usize),
    // Contract ABI is missing the expected entry point or cannot be parsed
    #[error("Invalid contract ABI: {0}")]
    InvalidAbi(String),
    // Call data could not be encoded against the ABI
    #[error("Failed to encode contract call: {0}")]
    EncodingError(String),
    // eth_estimateGas failed, nothing was sent
    #[error("Gas estimation failed: {0}")]
    GasEstimationFailed(String),
    // Local signing of the envelope failed
    #[error("Failed to sign transaction: {0}")]
    SigningError(String),
    // Node refused the raw transaction (bad nonce, balance, signature)
    #[error("Transaction rejected by node: {0}")]
    BroadcastRejected(String),
    // Receipt lookup itself failed, distinct from "not mined yet"
    #[error("Receipt query failed: {0}")]
    ReceiptQueryFailed(String),
    // eth_getLogs failed for the scan range
    #[error("Event log query failed: {0}")]
    LogQueryFailed(String),
    // Generic JSON-RPC provider error
    #[error("Provider error: {0}")]
    ProviderError(String),
    // Settings could not be persisted
    #[error("Settings store error: {0}")]
    SettingsError(String),
    // Submission node answered with a failure or could not be reached
    #[error("Submission server error: {0}")]
    ServerError(String),
    // Internal channel closed, the app is shutting down
    #[error("Channel closed")]
    ChannelClosed,
    // Uncategorized error
    #[error("{0}")]
    Generic(String),
}

impl RecordError {
    /// Returns a short string identifying the error type for metrics labels
    pub fn error_type(&self) -> &'static str {
        match self {
            RecordError::MessageTooLong(_) => "message_too_long",
            RecordError::InvalidAbi(_) => "invalid_abi",
            RecordError::EncodingError(_) => "encoding_error",
            RecordError::GasEstimationFailed(_) => "gas_estimation_failed",
            RecordError::SigningError(_) => "signing_error",
            RecordError::BroadcastRejected(_) => "broadcast_rejected",
            RecordError::ReceiptQueryFailed(_) => "receipt_query_failed",
            RecordError::LogQueryFailed(_) => "log_query_failed",
            RecordError::ProviderError(_) => "provider_error",
            RecordError::SettingsError(_) => "settings_error",
            RecordError::ServerError(_) => "server_error",
            RecordError::ChannelClosed => "channel_closed",
            RecordError::Generic(_) => "generic",
        }
    }

    /// Validation failures never reached the network layer
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, RecordError::MessageTooLong(_))
    }
}

impl From<ProviderError> for RecordError {
    fn from(err: ProviderError) -> Self {
        RecordError::ProviderError(err.to_string())
    }
}

impl From<reqwest::Error> for RecordError {
    fn from(err: reqwest::Error) -> Self {
        RecordError::ServerError(err.to_string())
    }
}

pub type RecordResult<T> = Result<T, RecordError>;

// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

//! Submission path: validate, fingerprint, build, broadcast.

use crate::broadcaster::Broadcaster;
use crate::error::RecordResult;
use crate::eth_transaction_builder::RecordTransactionBuilder;
use crate::fingerprint::fingerprint;
use crate::metrics::RecordMetrics;
use crate::types::{explorer_url, validate_message};
use async_trait::async_trait;
use ethers::providers::JsonRpcClient;
use ethers::types::TxHash;
use std::sync::Arc;
use tap::TapFallible;

/// An accepted submission. The record is pending until its receipt shows up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRecord {
    pub tx_hash: TxHash,
    pub url: String,
}

/// Anything that can put a message on the ledger: the local pipeline or a remote node.
#[async_trait]
pub trait RecordSubmitter: Send + Sync {
    async fn submit_record(&self, message: &str) -> RecordResult<SubmittedRecord>;
}

pub struct SubmissionPipeline<P> {
    builder: RecordTransactionBuilder<P>,
    broadcaster: Broadcaster<P>,
    explorer_base_url: String,
    log_receipts: bool,
    metrics: Arc<RecordMetrics>,
}

impl<P> SubmissionPipeline<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn new(
        builder: RecordTransactionBuilder<P>,
        broadcaster: Broadcaster<P>,
        explorer_base_url: String,
        metrics: Arc<RecordMetrics>,
    ) -> Self {
        Self {
            builder,
            broadcaster,
            explorer_base_url,
            log_receipts: true,
            metrics,
        }
    }

    pub fn with_receipt_logging(mut self, enabled: bool) -> Self {
        self.log_receipts = enabled;
        self
    }

    async fn submit_inner(&self, message: &str) -> RecordResult<SubmittedRecord> {
        validate_message(message)?;
        let fingerprint = fingerprint(message);
        let envelope = self.builder.build(message, fingerprint).await?;
        let tx_hash = self.broadcaster.broadcast(&envelope).await?;
        if self.log_receipts {
            self.broadcaster.spawn_receipt_logger(tx_hash);
        }
        let url = explorer_url(&self.explorer_base_url, tx_hash);
        tracing::info!("Check {} once transaction is confirmed.", url);
        Ok(SubmittedRecord { tx_hash, url })
    }
}

#[async_trait]
impl<P> RecordSubmitter for SubmissionPipeline<P>
where
    P: JsonRpcClient + 'static,
{
    async fn submit_record(&self, message: &str) -> RecordResult<SubmittedRecord> {
        tracing::info!("Received message from client: {:?}", message);
        self.submit_inner(message)
            .await
            .tap_ok(|_| self.metrics.tx_submitted.inc())
            .tap_err(|e| {
                self.metrics
                    .err_tx_submission
                    .with_label_values(&[e.error_type()])
                    .inc();
                tracing::error!("Error occurred sending transaction: {}", e);
            })
    }
}

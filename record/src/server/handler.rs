// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::RecordResult;
use crate::submission::{RecordSubmitter, SubmittedRecord};
use crate::types::ContractDescriptor;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait RecordRequestHandlerTrait {
    // Submits `message` to the ledger under the node's account and returns
    // the transaction id once the ledger node accepted it
    async fn handle_submit_record(&self, message: String) -> RecordResult<SubmittedRecord>;
    // Describes the record contract so clients can scan its events
    async fn handle_contract_info(&self) -> RecordResult<ContractDescriptor>;
}

pub struct RecordRequestHandler {
    submitter: Arc<dyn RecordSubmitter>,
    descriptor: Arc<ContractDescriptor>,
}

impl RecordRequestHandler {
    pub fn new(submitter: Arc<dyn RecordSubmitter>, descriptor: ContractDescriptor) -> Self {
        Self {
            submitter,
            descriptor: Arc::new(descriptor),
        }
    }
}

#[async_trait]
impl RecordRequestHandlerTrait for RecordRequestHandler {
    async fn handle_submit_record(&self, message: String) -> RecordResult<SubmittedRecord> {
        info!(
            "[Handler] Received record submission ({} chars)",
            message.chars().count()
        );
        self.submitter.submit_record(&message).await
    }

    async fn handle_contract_info(&self) -> RecordResult<ContractDescriptor> {
        Ok(self.descriptor.as_ref().clone())
    }
}

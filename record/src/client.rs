// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::{RecordError, RecordResult};
use crate::server::{CONTRACT_INFO_PATH, HEALTH_PATH, SUBMIT_RECORD_PATH};
use crate::submission::{RecordSubmitter, SubmittedRecord};
use crate::types::{validate_message, ContractDescriptor, SubmitRecordRequest, SubmitRecordResponse};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// HTTP client of a record node.
#[derive(Clone, Debug)]
pub struct RecordServerClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl RecordServerClient {
    pub fn new(base_url: &str) -> RecordResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| RecordError::ServerError(format!("invalid node url {}: {}", base_url, e)))?;
        // Keep any path prefix: joins resolve against the last segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn url(&self, path: &str) -> RecordResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RecordError::ServerError(e.to_string()))
    }

    pub async fn health(&self) -> RecordResult<bool> {
        let response = self.http_client.get(self.url(HEALTH_PATH)?).send().await?;
        Ok(response.status().is_success())
    }

    pub async fn contract_info(&self) -> RecordResult<ContractDescriptor> {
        let response = self
            .http_client
            .get(self.url(CONTRACT_INFO_PATH)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Raw submission; the node's verdict is returned as is.
    pub async fn submit(&self, message: &str) -> RecordResult<SubmitRecordResponse> {
        let request = SubmitRecordRequest {
            message: message.to_string(),
        };
        let response = self
            .http_client
            .post(self.url(SUBMIT_RECORD_PATH)?)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RecordSubmitter for RecordServerClient {
    async fn submit_record(&self, message: &str) -> RecordResult<SubmittedRecord> {
        validate_message(message)?;
        match self.submit(message).await? {
            SubmitRecordResponse::Success { hash, url } => {
                tracing::info!("Record node accepted message, transaction {:?}", hash);
                Ok(SubmittedRecord { tx_hash: hash, url })
            }
            SubmitRecordResponse::Fail => Err(RecordError::ServerError(
                "node failed to submit the record".to_string(),
            )),
        }
    }
}

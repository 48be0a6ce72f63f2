// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

//! A mock implementation for `RecordRequestHandlerTrait`
//! that handles requests according to preset behaviors.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::error::{RecordError, RecordResult};
use crate::metrics::RecordMetrics;
use crate::submission::SubmittedRecord;
use crate::types::ContractDescriptor;
use async_trait::async_trait;
use prometheus::Registry;

use super::handler::RecordRequestHandlerTrait;
use super::make_router;

#[derive(Clone, Default)]
pub struct RecordRequestMockHandler {
    submit_response: Arc<Mutex<Option<RecordResult<SubmittedRecord>>>>,
    contract_info: Arc<Mutex<Option<ContractDescriptor>>>,
    submitted: Arc<Mutex<Vec<String>>>,
}

impl RecordRequestMockHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_submit_response(&self, response: RecordResult<SubmittedRecord>) {
        *self.submit_response.lock().unwrap() = Some(response);
    }

    pub fn set_contract_info(&self, descriptor: ContractDescriptor) {
        *self.contract_info.lock().unwrap() = Some(descriptor);
    }

    pub fn submitted_messages(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordRequestHandlerTrait for RecordRequestMockHandler {
    async fn handle_submit_record(&self, message: String) -> RecordResult<SubmittedRecord> {
        self.submitted.lock().unwrap().push(message);
        self.submit_response
            .lock()
            .unwrap()
            .clone()
            // Ok to panic in test
            .expect("No preset handle_submit_record result")
    }

    async fn handle_contract_info(&self) -> RecordResult<ContractDescriptor> {
        self.contract_info
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RecordError::Generic("no contract info preset".to_string()))
    }
}

pub fn run_mock_server(
    socket_address: SocketAddr,
    mock_handler: RecordRequestMockHandler,
) -> tokio::task::JoinHandle<()> {
    tracing::info!("Starting mock server at {}", socket_address);
    let listener = std::net::TcpListener::bind(socket_address).unwrap();
    listener.set_nonblocking(true).unwrap();
    let listener = tokio::net::TcpListener::from_std(listener).unwrap();
    tokio::spawn(async move {
        let registry = Registry::new();
        let metrics = Arc::new(RecordMetrics::new(&registry));
        let router = make_router(Arc::new(mock_handler), metrics, Arc::new(registry));
        axum::serve(listener, router).await.unwrap()
    })
}

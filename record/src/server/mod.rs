// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::with_metrics;
use crate::{
    error::RecordError,
    metrics::RecordMetrics,
    server::handler::RecordRequestHandlerTrait,
    types::{ContractDescriptor, SubmitRecordRequest, SubmitRecordResponse},
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::instrument;

pub mod handler;

#[cfg(test)]
pub(crate) mod mock_handler;

pub const APPLICATION_JSON: &str = "application/json";

// Note: the paths need to match the ones in client.rs
pub const SUBMIT_RECORD_PATH: &str = "/submitRecord";
pub const CONTRACT_INFO_PATH: &str = "/contractInfo";
pub const HEALTH_PATH: &str = "/health";
pub const METRICS_PATH: &str = "/metrics";

type ServerState<H> = (Arc<H>, Arc<RecordMetrics>, Arc<Registry>);

pub fn run_server(
    socket_address: &SocketAddr,
    handler: impl RecordRequestHandlerTrait + Sync + Send + 'static,
    metrics: Arc<RecordMetrics>,
    registry: Arc<Registry>,
) -> tokio::task::JoinHandle<anyhow::Result<()>> {
    let socket_address = *socket_address;
    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(socket_address).await?;
        tracing::info!("Record node listening on {}", socket_address);
        axum::serve(
            listener,
            make_router(Arc::new(handler), metrics, registry).into_make_service(),
        )
        .await?;
        Ok(())
    })
}

pub(crate) fn make_router<H>(
    handler: Arc<H>,
    metrics: Arc<RecordMetrics>,
    registry: Arc<Registry>,
) -> Router
where
    H: RecordRequestHandlerTrait + Sync + Send + 'static,
{
    Router::new()
        .route("/", get(health_check))
        .route(HEALTH_PATH, get(health_check))
        .route(METRICS_PATH, get(metrics_fetch::<H>))
        .route(SUBMIT_RECORD_PATH, post(handle_submit_record::<H>))
        .route(CONTRACT_INFO_PATH, get(handle_contract_info::<H>))
        .with_state((handler, metrics, registry))
}

impl IntoResponse for RecordError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            RecordError::MessageTooLong(_) => StatusCode::BAD_REQUEST,
            RecordError::GasEstimationFailed(_)
            | RecordError::BroadcastRejected(_)
            | RecordError::ProviderError(_)
            | RecordError::ReceiptQueryFailed(_)
            | RecordError::LogQueryFailed(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("Something went wrong: {}", self)).into_response()
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn metrics_fetch<H>(
    State((_, _, registry)): State<ServerState<H>>,
) -> Result<impl IntoResponse, RecordError>
where
    H: RecordRequestHandlerTrait + Sync + Send + 'static,
{
    let mut buffer = vec![];
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| RecordError::Generic(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        buffer,
    ))
}

// Failures are answered with `{"status":"fail"}` rather than an error status.
#[instrument(level = "error", skip_all)]
async fn handle_submit_record<H>(
    State((handler, metrics, _)): State<ServerState<H>>,
    Json(request): Json<SubmitRecordRequest>,
) -> Json<SubmitRecordResponse>
where
    H: RecordRequestHandlerTrait + Sync + Send + 'static,
{
    let future = async { handler.handle_submit_record(request.message).await };
    match with_metrics!(metrics.clone(), "handle_submit_record", future).await {
        Ok(submitted) => Json(SubmitRecordResponse::Success {
            hash: submitted.tx_hash,
            url: submitted.url,
        }),
        Err(_) => Json(SubmitRecordResponse::Fail),
    }
}

#[instrument(level = "error", skip_all)]
async fn handle_contract_info<H>(
    State((handler, metrics, _)): State<ServerState<H>>,
) -> Result<Json<ContractDescriptor>, RecordError>
where
    H: RecordRequestHandlerTrait + Sync + Send + 'static,
{
    let future = async { handler.handle_contract_info().await.map(Json) };
    with_metrics!(metrics.clone(), "handle_contract_info", future).await
}

#[macro_export]
macro_rules! with_metrics {
    ($metrics:expr, $type_:expr, $func:expr) => {
        async move {
            tracing::info!("Received {} request", $type_);
            $metrics
                .requests_received
                .with_label_values(&[$type_])
                .inc();
            $metrics
                .requests_inflight
                .with_label_values(&[$type_])
                .inc();

            let result = $func.await;

            match &result {
                Ok(_) => {
                    tracing::info!("{} request succeeded", $type_);
                    $metrics.requests_ok.with_label_values(&[$type_]).inc();
                }
                Err(e) => {
                    tracing::info!("{} request failed: {:?}", $type_, e);
                    $metrics.err_requests.with_label_values(&[$type_]).inc();
                }
            }

            $metrics
                .requests_inflight
                .with_label_values(&[$type_])
                .dec();
            result
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RecordServerClient;
    use crate::error::RecordError;
    use crate::server::mock_handler::RecordRequestMockHandler;
    use crate::submission::{RecordSubmitter, SubmittedRecord};
    use crate::test_utils::{run_mock_record_server, test_descriptor};
    use ethers::types::TxHash;

    #[tokio::test]
    async fn test_submit_record_success_wire_format() {
        let mock_handler = RecordRequestMockHandler::new();
        let tx_hash = TxHash::repeat_byte(0xab);
        mock_handler.set_submit_response(Ok(SubmittedRecord {
            tx_hash,
            url: format!("https://mastery.aion.network/#/transaction/{:#x}", tx_hash),
        }));
        let (_handle, port) = run_mock_record_server(mock_handler.clone());

        let body: serde_json::Value = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{}{}", port, SUBMIT_RECORD_PATH))
            .json(&serde_json::json!({ "message": "abc" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["hash"], format!("{:#x}", tx_hash));
        assert_eq!(
            body["url"],
            format!("https://mastery.aion.network/#/transaction/{:#x}", tx_hash)
        );
        assert_eq!(mock_handler.submitted_messages(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_submit_record_failure_answers_fail() {
        let mock_handler = RecordRequestMockHandler::new();
        mock_handler.set_submit_response(Err(RecordError::BroadcastRejected(
            "insufficient funds".to_string(),
        )));
        let (_handle, port) = run_mock_record_server(mock_handler);

        let client = RecordServerClient::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        assert_eq!(
            client.submit("abc").await.unwrap(),
            SubmitRecordResponse::Fail
        );
        let err = client.submit_record("abc").await.unwrap_err();
        assert_eq!(err.error_type(), "server_error");
    }

    #[tokio::test]
    async fn test_contract_info_and_health() {
        let mock_handler = RecordRequestMockHandler::new();
        let descriptor = test_descriptor("http://ledger:8545", Some("http://cache:8545"));
        mock_handler.set_contract_info(descriptor.clone());
        let (_handle, port) = run_mock_record_server(mock_handler);

        let client = RecordServerClient::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        assert!(client.health().await.unwrap());
        assert_eq!(client.contract_info().await.unwrap(), descriptor);

        let raw: serde_json::Value = reqwest::get(format!(
            "http://127.0.0.1:{}{}",
            port, CONTRACT_INFO_PATH
        ))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
        assert_eq!(raw["endpoint"], "http://ledger:8545");
        assert_eq!(raw["cacheEndpoint"], "http://cache:8545");
        assert!(raw["abi"].is_array());
    }

    #[tokio::test]
    async fn test_metrics_endpoint_counts_requests() {
        let mock_handler = RecordRequestMockHandler::new();
        mock_handler.set_contract_info(test_descriptor("http://ledger:8545", None));
        let (_handle, port) = run_mock_record_server(mock_handler);

        let client = RecordServerClient::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        client.contract_info().await.unwrap();

        let text = reqwest::get(format!("http://127.0.0.1:{}{}", port, METRICS_PATH))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(text.contains("record_requests_ok{type=\"handle_contract_info\"} 1"));
    }
}

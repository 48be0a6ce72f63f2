// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_vec_with_registry,
    register_int_gauge_with_registry, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Registry,
};

const FINE_GRAINED_LATENCY_SEC_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.35, 0.4, 0.45, 0.5, 0.6, 0.7, 0.8, 0.9,
    1.0, 1.2, 1.4, 1.6, 1.8, 2.0, 2.5, 3.0, 3.5, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10., 15., 20., 25.,
    30., 45., 60., 90., 120.,
];

#[derive(Clone, Debug)]
pub struct RecordMetrics {
    pub(crate) requests_received: IntCounterVec,
    pub(crate) requests_ok: IntCounterVec,
    pub(crate) err_requests: IntCounterVec,
    pub(crate) requests_inflight: IntGaugeVec,

    pub(crate) eth_rpc_queries: IntCounterVec,
    pub(crate) eth_rpc_queries_latency: HistogramVec,
    pub(crate) eth_node_connected: IntGauge,

    pub(crate) tx_submitted: IntCounter,
    pub(crate) err_tx_submission: IntCounterVec,

    pub(crate) pending_tx_tracked: IntGauge,
    pub(crate) pending_tx_outcomes: IntCounterVec,

    pub(crate) event_scans: IntCounterVec,
    pub(crate) err_event_scans: IntCounter,
    pub(crate) event_scan_latency: HistogramVec,
    pub(crate) event_scan_records: IntGauge,
    pub(crate) stale_scan_results: IntCounter,
}

impl RecordMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            requests_received: register_int_counter_vec_with_registry!(
                "record_requests_received",
                "Total number of requests received by the node, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            requests_ok: register_int_counter_vec_with_registry!(
                "record_requests_ok",
                "Total number of ok requests, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            err_requests: register_int_counter_vec_with_registry!(
                "record_err_requests",
                "Total number of erred requests, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            requests_inflight: register_int_gauge_vec_with_registry!(
                "record_requests_inflight",
                "Total number of inflight requests, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            eth_rpc_queries: register_int_counter_vec_with_registry!(
                "record_eth_rpc_queries",
                "Total number of queries issued to the ledger node, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            eth_rpc_queries_latency: register_histogram_vec_with_registry!(
                "record_eth_rpc_queries_latency",
                "Latency of queries issued to the ledger node, by request type",
                &["type"],
                FINE_GRAINED_LATENCY_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
            eth_node_connected: register_int_gauge_with_registry!(
                "record_eth_node_connected",
                "Whether the last query to the ledger node succeeded (1) or failed (0)",
                registry,
            )
            .unwrap(),
            tx_submitted: register_int_counter_with_registry!(
                "record_tx_submitted",
                "Total number of record transactions accepted by the node",
                registry,
            )
            .unwrap(),
            err_tx_submission: register_int_counter_vec_with_registry!(
                "record_err_tx_submission",
                "Total number of failed record submissions, by error type",
                &["error_type"],
                registry,
            )
            .unwrap(),
            pending_tx_tracked: register_int_gauge_with_registry!(
                "record_pending_tx_tracked",
                "Number of transactions whose receipt is currently being polled",
                registry,
            )
            .unwrap(),
            pending_tx_outcomes: register_int_counter_vec_with_registry!(
                "record_pending_tx_outcomes",
                "Terminal outcomes of receipt polling, by outcome",
                &["outcome"],
                registry,
            )
            .unwrap(),
            event_scans: register_int_counter_vec_with_registry!(
                "record_event_scans",
                "Total number of event log scans, by source",
                &["source"],
                registry,
            )
            .unwrap(),
            err_event_scans: register_int_counter_with_registry!(
                "record_err_event_scans",
                "Total number of event log scans that failed",
                registry,
            )
            .unwrap(),
            event_scan_latency: register_histogram_vec_with_registry!(
                "record_event_scan_latency",
                "Latency of event log scans, by source",
                &["source"],
                FINE_GRAINED_LATENCY_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
            event_scan_records: register_int_gauge_with_registry!(
                "record_event_scan_records",
                "Number of records returned by the most recent scan",
                registry,
            )
            .unwrap(),
            stale_scan_results: register_int_counter_with_registry!(
                "record_stale_scan_results",
                "Total number of scan results discarded because a newer scan was started",
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_testing() -> Self {
        let registry = Registry::new();
        Self::new(&registry)
    }
}

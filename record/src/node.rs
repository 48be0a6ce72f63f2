// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    broadcaster::Broadcaster,
    config::RecordNodeConfig,
    eth_transaction_builder::RecordTransactionBuilder,
    metrics::RecordMetrics,
    server::{handler::RecordRequestHandler, run_server},
    submission::SubmissionPipeline,
};
use prometheus::Registry;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::task::JoinHandle;

pub async fn run_record_node(
    config: RecordNodeConfig,
    prometheus_registry: Registry,
) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
    let metrics = Arc::new(RecordMetrics::new(&prometheus_registry));
    let server_config = config.validate(metrics.clone())?;

    // Refuse to sign for a chain other than the one the node serves
    server_config
        .eth_client
        .describe(Some(server_config.chain_id))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to ledger node: {}", e))?;

    let eth_client = server_config.eth_client;
    let builder = RecordTransactionBuilder::new(
        eth_client.clone(),
        server_config.descriptor.abi.clone(),
        server_config.wallet,
        server_config.gas_price,
    )?;
    let pipeline = SubmissionPipeline::new(
        builder,
        Broadcaster::new(eth_client),
        server_config.explorer_base_url,
        metrics.clone(),
    );
    let handler = RecordRequestHandler::new(Arc::new(pipeline), server_config.descriptor);

    let socket_address = SocketAddr::new(
        IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
        server_config.server_listen_port,
    );
    Ok(run_server(
        &socket_address,
        handler,
        metrics,
        Arc::new(prometheus_registry),
    ))
}

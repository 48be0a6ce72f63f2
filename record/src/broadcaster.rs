// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::RecordResult;
use crate::eth_client::EthClient;
use crate::eth_transaction_builder::SignedEnvelope;
use ethers::providers::JsonRpcClient;
use ethers::types::TxHash;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

pub const RECEIPT_LOG_INTERVAL: Duration = Duration::from_secs(1);
pub const RECEIPT_LOG_TIMEOUT: Duration = Duration::from_secs(600);

pub struct Broadcaster<P> {
    eth_client: Arc<EthClient<P>>,
}

impl<P> Broadcaster<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn new(eth_client: Arc<EthClient<P>>) -> Self {
        Self { eth_client }
    }

    /// Returns as soon as the node accepts the envelope; inclusion is not awaited.
    pub async fn broadcast(&self, envelope: &SignedEnvelope) -> RecordResult<TxHash> {
        let tx_hash = self
            .eth_client
            .send_raw_transaction(envelope.raw.clone())
            .await?;
        if tx_hash != envelope.tx_hash {
            tracing::warn!(
                "[Broadcaster] Node reported hash {:?}, locally computed {:?}",
                tx_hash,
                envelope.tx_hash
            );
        }
        tracing::info!("[Broadcaster] Received transaction hash {:?}", tx_hash);
        Ok(tx_hash)
    }

    /// Logs the receipt once the transaction is mined. Nobody waits on the handle.
    pub fn spawn_receipt_logger(&self, tx_hash: TxHash) -> JoinHandle<()> {
        let eth_client = self.eth_client.clone();
        tokio::spawn(async move {
            let result = timeout(
                RECEIPT_LOG_TIMEOUT,
                log_receipt_when_mined(eth_client, tx_hash),
            )
            .await;
            if result.is_err() {
                tracing::warn!(
                    "[Broadcaster] No receipt for {:?} after {:?}, giving up",
                    tx_hash,
                    RECEIPT_LOG_TIMEOUT
                );
            }
        })
    }
}

async fn log_receipt_when_mined<P: JsonRpcClient + 'static>(
    eth_client: Arc<EthClient<P>>,
    tx_hash: TxHash,
) {
    let mut ticker = interval(RECEIPT_LOG_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match eth_client.get_transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) => {
                tracing::info!(
                    "[Broadcaster] Transaction {:?} mined in block {:?} with status {:?}, gas used {:?}",
                    tx_hash,
                    receipt.block_number,
                    receipt.status,
                    receipt.gas_used
                );
                return;
            }
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(
                    "[Broadcaster] Receipt lookup for {:?} failed: {:?}",
                    tx_hash,
                    e
                );
                return;
            }
        }
    }
}

// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use crate::error::{RecordError, RecordResult};
use crate::metered_eth_provider::{new_metered_eth_provider, MeteredEthHttpProvider};
use crate::metrics::RecordMetrics;
use ethers::providers::{JsonRpcClient, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address as EthAddress, BlockNumber, Bytes, Filter, Log, TransactionReceipt, TxHash, U256,
};
use tap::TapFallible;

#[cfg(test)]
use crate::eth_mock_provider::EthMockProvider;

/// Ledger node access scoped to the record contract.
pub struct EthClient<P> {
    provider: Provider<P>,
    contract_address: EthAddress,
}

impl EthClient<MeteredEthHttpProvider> {
    pub fn new(
        provider_url: &str,
        contract_address: EthAddress,
        metrics: Arc<RecordMetrics>,
    ) -> anyhow::Result<Self> {
        let provider = new_metered_eth_provider(provider_url, metrics)?;
        Ok(Self {
            provider,
            contract_address,
        })
    }
}

#[cfg(test)]
impl EthClient<EthMockProvider> {
    pub fn new_mocked(provider: EthMockProvider, contract_address: EthAddress) -> Self {
        Self {
            provider: Provider::new(provider),
            contract_address,
        }
    }
}

impl<P> EthClient<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn contract_address(&self) -> EthAddress {
        self.contract_address
    }

    pub async fn get_chain_id(&self) -> RecordResult<u64> {
        let chain_id = self.provider.get_chainid().await?;
        Ok(chain_id.as_u64())
    }

    // Log connection info, verifying the chain id when one is expected
    pub async fn describe(&self, expected_chain_id: Option<u64>) -> RecordResult<u64> {
        let chain_id = self.get_chain_id().await?;
        let block_number = self.get_latest_block_id().await?;
        match expected_chain_id {
            Some(expected) if expected != chain_id => {
                return Err(RecordError::Generic(format!(
                    "Chain ID mismatch: expected {}, got {}",
                    expected, chain_id
                )));
            }
            Some(_) => tracing::info!(
                "EthClient connected to chain {} (verified), current block: {}",
                chain_id,
                block_number
            ),
            None => tracing::warn!(
                "EthClient connected to chain {} (NOT VERIFIED), current block: {}",
                chain_id,
                block_number
            ),
        }
        Ok(block_number)
    }

    pub async fn get_latest_block_id(&self) -> RecordResult<u64> {
        let block = self
            .provider
            .get_block_number()
            .await
            .tap_err(|e| tracing::error!("eth_blockNumber failed: {:?}", e))?;
        Ok(block.as_u64())
    }

    pub async fn estimate_gas(&self, tx: &TypedTransaction) -> RecordResult<U256> {
        self.provider
            .estimate_gas(tx, None)
            .await
            .map_err(|e| RecordError::GasEstimationFailed(e.to_string()))
            .tap_err(|e| tracing::error!("estimate_gas failed. Tx: {:?}. Error {:?}", tx, e))
    }

    pub async fn get_pending_nonce(&self, account: EthAddress) -> RecordResult<U256> {
        self.provider
            .get_transaction_count(account, Some(BlockNumber::Pending.into()))
            .await
            .map_err(RecordError::from)
            .tap_err(|e| {
                tracing::error!(
                    "get_transaction_count failed for {:?}. Error {:?}",
                    account,
                    e
                )
            })
    }

    /// Returns the hash once the node has accepted the transaction for relay.
    pub async fn send_raw_transaction(&self, raw: Bytes) -> RecordResult<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| RecordError::BroadcastRejected(e.to_string()))?;
        Ok(pending.tx_hash())
    }

    /// `Ok(None)` means the transaction is not mined yet.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> RecordResult<Option<TransactionReceipt>> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| RecordError::ReceiptQueryFailed(e.to_string()))
    }

    // Note: query may fail if range is too big for the node.
    pub async fn get_events_in_range(&self, start_block: u64) -> RecordResult<Vec<Log>> {
        let filter = Filter::new()
            .from_block(start_block)
            .to_block(BlockNumber::Latest)
            .address(self.contract_address);
        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| RecordError::LogQueryFailed(e.to_string()))
            .tap_err(|e| {
                tracing::error!(
                    "get_events_in_range failed. Filter: {:?}. Error {:?}",
                    filter,
                    e
                )
            })?;

        // Safeguard check that all events are emitted from the record contract
        if let Some(log) = logs.iter().find(|log| log.address != self.contract_address) {
            return Err(RecordError::ProviderError(format!(
                "Provider returns logs from different contract address (expected: {:?}): {:?}",
                self.contract_address, log
            )));
        }
        Ok(logs)
    }
}

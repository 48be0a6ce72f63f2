// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::{RecordError, RecordResult};
use crate::eth_client::EthClient;
use crate::fingerprint::Fingerprint;
use ethers::abi::{Abi, Token};
use ethers::providers::JsonRpcClient;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address as EthAddress, Bytes, TransactionRequest, TxHash, U256};
use ethers::utils::keccak256;
use std::sync::Arc;

/// Entry point of the record contract.
pub const STORE_HASH_FUNCTION: &str = "storeHash";

/// Gas price used for every record transaction unless configured otherwise.
pub const DEFAULT_GAS_PRICE: u64 = 20_000_000_000; // 0x4A817C800

/// A signed legacy transaction, ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub raw: Bytes,
    pub tx_hash: TxHash,
    pub nonce: U256,
    pub gas: U256,
    pub gas_price: U256,
    pub fingerprint: Fingerprint,
}

pub fn encode_store_hash_call(
    abi: &Abi,
    fingerprint: Fingerprint,
    message: &str,
) -> RecordResult<Bytes> {
    let function = abi
        .function(STORE_HASH_FUNCTION)
        .map_err(|e| RecordError::InvalidAbi(e.to_string()))?;
    let data = function
        .encode_input(&[
            Token::Uint(fingerprint.into()),
            Token::String(message.to_string()),
        ])
        .map_err(|e| RecordError::EncodingError(e.to_string()))?;
    Ok(data.into())
}

pub struct RecordTransactionBuilder<P> {
    eth_client: Arc<EthClient<P>>,
    abi: Abi,
    wallet: LocalWallet,
    gas_price: U256,
}

impl<P> RecordTransactionBuilder<P>
where
    P: JsonRpcClient + 'static,
{
    /// `wallet` must already carry the target chain id.
    pub fn new(
        eth_client: Arc<EthClient<P>>,
        abi: Abi,
        wallet: LocalWallet,
        gas_price: Option<U256>,
    ) -> RecordResult<Self> {
        abi.function(STORE_HASH_FUNCTION)
            .map_err(|e| RecordError::InvalidAbi(e.to_string()))?;
        Ok(Self {
            eth_client,
            abi,
            wallet,
            gas_price: gas_price.unwrap_or_else(|| U256::from(DEFAULT_GAS_PRICE)),
        })
    }

    pub fn sender(&self) -> EthAddress {
        self.wallet.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    /// Encodes, estimates, assigns a nonce and signs. Nothing is sent.
    pub async fn build(
        &self,
        message: &str,
        fingerprint: Fingerprint,
    ) -> RecordResult<SignedEnvelope> {
        let data = encode_store_hash_call(&self.abi, fingerprint, message)?;
        let sender = self.wallet.address();

        let request = TransactionRequest::new()
            .to(self.eth_client.contract_address())
            .from(sender)
            .data(data);

        let gas = self
            .eth_client
            .estimate_gas(&TypedTransaction::Legacy(request.clone()))
            .await?;
        let nonce = self.eth_client.get_pending_nonce(sender).await?;

        let tx: TypedTransaction = request
            .gas_price(self.gas_price)
            .gas(gas)
            .nonce(nonce)
            .chain_id(self.wallet.chain_id())
            .into();

        let signature = self
            .wallet
            .sign_transaction_sync(&tx)
            .map_err(|e| RecordError::SigningError(e.to_string()))?;
        let raw = tx.rlp_signed(&signature);
        let tx_hash = TxHash::from(keccak256(&raw));

        tracing::debug!(
            "Built record transaction {:?} (nonce {}, gas {}) for fingerprint {}",
            tx_hash,
            nonce,
            gas,
            fingerprint
        );
        Ok(SignedEnvelope {
            raw,
            tx_hash,
            nonce,
            gas,
            gas_price: self.gas_price,
            fingerprint,
        })
    }
}

// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::eth_client::EthClient;
use crate::eth_transaction_builder::STORE_HASH_FUNCTION;
use crate::event_scanner::RecordEventDecoder;
use crate::metered_eth_provider::MeteredEthHttpProvider;
use crate::metrics::RecordMetrics;
use crate::types::{ContractDescriptor, DEFAULT_EXPLORER_BASE_URL};
use anyhow::{anyhow, Context};
use ethers::abi::Abi;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address as EthAddress, U256};
use for_the_record_config::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LedgerConfig {
    // Rpc url of the ledger node, used to submit transactions and scan events.
    pub rpc_url: String,
    // Rpc url of an event cache serving the same logs faster, handed to clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_rpc_url: Option<String>,
    // Chain id used when signing. Verified against the node at startup.
    pub chain_id: u64,
    // Address of the deployed record contract.
    pub contract_address: String,
    // Path of the contract ABI, either a bare JSON array or a compiler artifact with an `abi` field.
    pub abi_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RecordNodeConfig {
    // The port that the server listens on.
    pub server_listen_port: u16,
    // Path of the file holding the hex encoded secp256k1 key that pays for submissions.
    pub account_key_path: PathBuf,
    pub ledger: LedgerConfig,
    #[serde(default = "default_explorer_base_url")]
    pub explorer_base_url: String,
    // Overrides the default 20 gwei gas price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
}

fn default_explorer_base_url() -> String {
    DEFAULT_EXPLORER_BASE_URL.to_string()
}

impl Config for RecordNodeConfig {}

impl RecordNodeConfig {
    /// Reads the key and ABI files and prepares the ledger client. Makes no network calls.
    pub fn validate(&self, metrics: Arc<RecordMetrics>) -> anyhow::Result<RecordServerConfig> {
        info!("Starting config validation");
        let contract_address = EthAddress::from_str(&self.ledger.contract_address)
            .with_context(|| format!("Invalid contract address {}", self.ledger.contract_address))?;

        let abi = read_abi(&self.ledger.abi_path)?;
        abi.function(STORE_HASH_FUNCTION).map_err(|_| {
            anyhow!(
                "ABI at {:?} has no `{}` function",
                self.ledger.abi_path,
                STORE_HASH_FUNCTION
            )
        })?;
        RecordEventDecoder::new(&abi)?;

        let wallet = read_account_key(&self.account_key_path)?.with_chain_id(self.ledger.chain_id);
        info!(
            "Loaded account {:?} from {:?}",
            wallet.address(),
            self.account_key_path
        );

        let eth_client = Arc::new(EthClient::new(
            &self.ledger.rpc_url,
            contract_address,
            metrics,
        )?);

        let descriptor = ContractDescriptor {
            abi,
            address: contract_address,
            endpoint: self.ledger.rpc_url.clone(),
            cache_endpoint: self.ledger.cache_rpc_url.clone(),
        };

        info!("Config validation complete");
        Ok(RecordServerConfig {
            server_listen_port: self.server_listen_port,
            descriptor,
            wallet,
            chain_id: self.ledger.chain_id,
            gas_price: self.gas_price.map(U256::from),
            explorer_base_url: self.explorer_base_url.clone(),
            eth_client,
        })
    }
}

pub struct RecordServerConfig {
    pub server_listen_port: u16,
    pub descriptor: ContractDescriptor,
    pub wallet: LocalWallet,
    pub chain_id: u64,
    pub gas_price: Option<U256>,
    pub explorer_base_url: String,
    pub eth_client: Arc<EthClient<MeteredEthHttpProvider>>,
}

pub fn read_abi(path: &Path) -> anyhow::Result<Abi> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ABI file {:?}", path))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))?;
    let abi_value = match value {
        serde_json::Value::Object(mut artifact) => artifact
            .remove("abi")
            .ok_or_else(|| anyhow!("Artifact {:?} has no `abi` field", path))?,
        other => other,
    };
    serde_json::from_value(abi_value).with_context(|| format!("Invalid ABI in {:?}", path))
}

pub fn read_account_key(path: &Path) -> anyhow::Result<LocalWallet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read account key file {:?}", path))?;
    let hex_key = content.trim().trim_start_matches("0x");
    LocalWallet::from_str(hex_key).map_err(|e| {
        anyhow!(
            "Account key at {:?} is not a hex encoded secp256k1 private key: {}",
            path,
            e
        )
    })
}

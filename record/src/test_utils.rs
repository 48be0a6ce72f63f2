// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::eth_mock_provider::EthMockProvider;
use crate::fingerprint::fingerprint;
use crate::server::mock_handler::{run_mock_server, RecordRequestMockHandler};
use crate::types::ContractDescriptor;
use ethers::abi::{long_signature, Abi, ParamType, Token};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address as EthAddress, Log, TransactionReceipt, TxHash, U256, U64};
use for_the_record_config::local_ip_utils;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

pub const TEST_CHAIN_ID: u64 = 31337;

// Well known development key, never funded outside local chains
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const TEST_ABI_JSON: &str = r#"[
  {
    "type": "function",
    "name": "storeHash",
    "stateMutability": "nonpayable",
    "inputs": [
      { "name": "hash", "type": "uint128" },
      { "name": "message", "type": "string" }
    ],
    "outputs": []
  },
  {
    "type": "event",
    "name": "RecordStored",
    "anonymous": false,
    "inputs": [
      { "name": "hash", "type": "uint128", "indexed": false },
      { "name": "message", "type": "string", "indexed": false }
    ]
  },
  {
    "type": "event",
    "name": "OwnerChanged",
    "anonymous": false,
    "inputs": [
      { "name": "owner", "type": "address", "indexed": true }
    ]
  }
]"#;

pub fn test_abi() -> Abi {
    serde_json::from_str(TEST_ABI_JSON).unwrap()
}

pub fn test_contract_address() -> EthAddress {
    EthAddress::repeat_byte(0x42)
}

pub fn test_descriptor(endpoint: &str, cache_endpoint: Option<&str>) -> ContractDescriptor {
    ContractDescriptor {
        abi: test_abi(),
        address: test_contract_address(),
        endpoint: endpoint.to_string(),
        cache_endpoint: cache_endpoint.map(|s| s.to_string()),
    }
}

pub fn test_wallet() -> LocalWallet {
    TEST_PRIVATE_KEY
        .parse::<LocalWallet>()
        .unwrap()
        .with_chain_id(TEST_CHAIN_ID)
}

pub fn mock_block_number(mock_provider: &EthMockProvider, block_number: u64) {
    mock_provider
        .add_method_response("eth_blockNumber", U64::from(block_number))
        .unwrap();
}

pub fn mock_gas_and_nonce(mock_provider: &EthMockProvider, gas: u64, nonce: u64) {
    mock_provider
        .add_method_response("eth_estimateGas", U256::from(gas))
        .unwrap();
    mock_provider
        .add_method_response("eth_getTransactionCount", U256::from(nonce))
        .unwrap();
}

pub fn mock_receipt(mock_provider: &EthMockProvider, receipt: Option<TransactionReceipt>) {
    mock_provider
        .add_method_response("eth_getTransactionReceipt", receipt)
        .unwrap();
}

pub fn get_test_receipt(tx_hash: TxHash, success: bool, block_number: u64) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: tx_hash,
        block_number: Some(U64::from(block_number)),
        status: Some(U64::from(success as u64)),
        gas_used: Some(U256::from(21_000)),
        ..Default::default()
    }
}

// Returns a `RecordStored` log carrying `message`, as the contract emits it.
pub fn get_test_record_log(
    contract_address: EthAddress,
    tx_hash: TxHash,
    block_number: u64,
    log_index: u64,
    message: &str,
) -> Log {
    // Note: must use `encode` rather than `encode_packed`
    let data = ethers::abi::encode(&[
        Token::Uint(fingerprint(message).into()),
        Token::String(message.to_string()),
    ]);
    Log {
        address: contract_address,
        topics: vec![long_signature(
            "RecordStored",
            &[ParamType::Uint(128), ParamType::String],
        )],
        data: data.into(),
        block_hash: Some(TxHash::random()),
        block_number: Some(U64::from(block_number)),
        transaction_hash: Some(tx_hash),
        log_index: Some(U256::from(log_index)),
        ..Default::default()
    }
}

pub fn run_mock_record_server(
    mock_handler: RecordRequestMockHandler,
) -> (JoinHandle<()>, u16) {
    let localhost = local_ip_utils::localhost_for_testing();
    let port = local_ip_utils::get_available_port(&localhost);
    let handle = run_mock_server(
        SocketAddr::new(localhost, port),
        mock_handler,
    );
    (handle, port)
}

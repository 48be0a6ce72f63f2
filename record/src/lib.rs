// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::new_without_default)]

pub mod app;
pub mod broadcaster;
pub mod client;
pub mod config;
pub mod error;
pub mod eth_client;
pub mod eth_transaction_builder;
pub mod event_scanner;
pub mod fingerprint;
pub mod metered_eth_provider;
pub mod metrics;
pub mod node;
pub mod pending_tracker;
pub mod server;
pub mod settings;
pub mod state;
pub mod submission;
pub mod types;

#[cfg(test)]
pub mod eth_mock_provider;

#[cfg(test)]
pub mod test_utils;

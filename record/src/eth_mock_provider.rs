// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

//! A JSON-RPC client answering from preset responses, for tests.
//!
//! Responses are keyed by method and, optionally, by the exact serialized
//! params. Several responses queued under one key are returned in order and
//! the last one repeats, which is how tests model "not mined yet, then mined".

use async_trait::async_trait;
use ethers::providers::{JsonRpcClient, ProviderError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockReply {
    Value(Value),
    Error(String),
}

type ResponseKey = (String, Option<String>);

#[derive(Debug, Clone, Default)]
pub struct EthMockProvider {
    responses: Arc<Mutex<HashMap<ResponseKey, VecDeque<MockReply>>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl EthMockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, key: ResponseKey, reply: MockReply) {
        self.responses
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(reply);
    }

    /// Answer `method` called with exactly `params`.
    pub fn add_response<P: Serialize, T: Serialize>(
        &self,
        method: &str,
        params: P,
        data: T,
    ) -> Result<(), serde_json::Error> {
        let params = serde_json::to_string(&params)?;
        let data = serde_json::to_value(data)?;
        self.push((method.to_string(), Some(params)), MockReply::Value(data));
        Ok(())
    }

    /// Answer `method` whatever the params are.
    pub fn add_method_response<T: Serialize>(
        &self,
        method: &str,
        data: T,
    ) -> Result<(), serde_json::Error> {
        let data = serde_json::to_value(data)?;
        self.push((method.to_string(), None), MockReply::Value(data));
        Ok(())
    }

    pub fn add_method_error(&self, method: &str, message: &str) {
        self.push(
            (method.to_string(), None),
            MockReply::Error(message.to_string()),
        );
    }

    pub fn requests_for(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    /// Params of the most recent call to `method`.
    pub fn last_params(&self, method: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .and_then(|(_, params)| serde_json::from_str(params).ok())
    }

    /// Every reply is held back by `delay`, to simulate a slow node.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next_reply(&self, method: &str, params: &str) -> Option<MockReply> {
        let mut responses = self.responses.lock().unwrap();
        let exact = (method.to_string(), Some(params.to_string()));
        let any = (method.to_string(), None);
        let key = if responses.contains_key(&exact) {
            exact
        } else {
            any
        };
        let queue = responses.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl JsonRpcClient for EthMockProvider {
    type Error = ProviderError;

    async fn request<P: Serialize + Send + Sync + Debug, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, ProviderError> {
        let params = serde_json::to_string(&params)?;
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_reply(method, &params) {
            Some(MockReply::Value(value)) => Ok(serde_json::from_value(value)?),
            Some(MockReply::Error(message)) => Err(ProviderError::CustomError(message)),
            None => Err(ProviderError::UnsupportedRPC),
        }
    }
}

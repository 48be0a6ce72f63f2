// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::{RecordError, RecordResult};
use crate::types::MessageRecord;
use ethers::abi::{Abi, Event, ParamType, RawLog, Token};
use ethers::types::{Log, TxHash};
use std::collections::HashSet;

/// Name of the event parameter holding the recorded text.
pub const MESSAGE_PARAM: &str = "message";

/// Decodes contract logs that carry a `message` string.
#[derive(Debug, Clone)]
pub struct RecordEventDecoder {
    events: Vec<Event>,
}

impl RecordEventDecoder {
    pub fn new(abi: &Abi) -> RecordResult<Self> {
        let events: Vec<Event> = abi
            .events()
            .filter(|event| !event.anonymous)
            .filter(|event| {
                event
                    .inputs
                    .iter()
                    .any(|p| p.name == MESSAGE_PARAM && p.kind == ParamType::String)
            })
            .cloned()
            .collect();
        if events.is_empty() {
            return Err(RecordError::InvalidAbi(format!(
                "no event with a string `{}` parameter",
                MESSAGE_PARAM
            )));
        }
        Ok(Self { events })
    }

    /// Returns `None` for logs of other events or logs that fail to decode.
    pub fn decode_message(&self, log: &Log) -> Option<String> {
        let topic0 = log.topics.first()?;
        let event = self.events.iter().find(|e| e.signature() == *topic0)?;
        let parsed = event
            .parse_log(RawLog {
                topics: log.topics.clone(),
                data: log.data.to_vec(),
            })
            .map_err(|e| {
                tracing::warn!(
                    "[EventScanner] Failed to decode {} log in tx {:?}: {:?}",
                    event.name,
                    log.transaction_hash,
                    e
                )
            })
            .ok()?;
        parsed
            .params
            .into_iter()
            .find(|p| p.name == MESSAGE_PARAM)
            .and_then(|p| match p.value {
                Token::String(text) => Some(text),
                _ => None,
            })
    }
}

struct DecodedLog {
    tx_hash: TxHash,
    block_number: u64,
    log_index: u64,
    text: String,
}

/// Maps raw logs to confirmed records, most recent first, one per transaction.
pub fn logs_to_records(decoder: &RecordEventDecoder, logs: &[Log]) -> Vec<MessageRecord> {
    let mut decoded: Vec<DecodedLog> = logs
        .iter()
        .filter_map(|log| {
            let Some(tx_hash) = log.transaction_hash else {
                tracing::warn!("[EventScanner] Skipping log without transaction hash");
                return None;
            };
            let Some(text) = decoder.decode_message(log) else {
                tracing::warn!(
                    "[EventScanner] Skipping undecodable log in tx {:?}",
                    tx_hash
                );
                return None;
            };
            Some(DecodedLog {
                tx_hash,
                block_number: log.block_number.map(|b| b.as_u64()).unwrap_or_default(),
                log_index: log.log_index.map(|i| i.as_u64()).unwrap_or_default(),
                text,
            })
        })
        .collect();

    decoded.sort_by(|a, b| {
        (b.block_number, b.log_index).cmp(&(a.block_number, a.log_index))
    });

    let mut seen = HashSet::new();
    decoded
        .into_iter()
        .filter(|d| seen.insert(d.tx_hash))
        .map(|d| MessageRecord::confirmed(d.tx_hash, d.text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{get_test_record_log, test_abi, test_contract_address};
    use crate::types::RecordStatus;
    use ethers::types::H256;

    #[test]
    fn test_decoder_requires_message_event() {
        let abi: Abi = serde_json::from_str("[]").unwrap();
        assert!(RecordEventDecoder::new(&abi).is_err());
        assert!(RecordEventDecoder::new(&test_abi()).is_ok());
    }

    #[test]
    fn test_decode_record_log() {
        let decoder = RecordEventDecoder::new(&test_abi()).unwrap();
        let log = get_test_record_log(test_contract_address(), TxHash::random(), 3, 0, "abc");
        assert_eq!(decoder.decode_message(&log), Some("abc".to_string()));
    }

    #[test]
    fn test_other_events_and_garbage_are_skipped() {
        let decoder = RecordEventDecoder::new(&test_abi()).unwrap();
        let mut foreign = get_test_record_log(test_contract_address(), TxHash::random(), 3, 0, "x");
        foreign.topics = vec![H256::random()];
        assert_eq!(decoder.decode_message(&foreign), None);

        let mut truncated =
            get_test_record_log(test_contract_address(), TxHash::random(), 3, 0, "x");
        truncated.data = vec![0u8; 10].into();
        assert_eq!(decoder.decode_message(&truncated), None);

        let records = logs_to_records(&decoder, &[foreign, truncated]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_records_ordered_most_recent_first_and_deduplicated() {
        let decoder = RecordEventDecoder::new(&test_abi()).unwrap();
        let contract = test_contract_address();
        let (tx_a, tx_b, tx_c) = (TxHash::random(), TxHash::random(), TxHash::random());
        let logs = vec![
            get_test_record_log(contract, tx_a, 10, 0, "a"),
            get_test_record_log(contract, tx_b, 12, 1, "b"),
            get_test_record_log(contract, tx_c, 12, 0, "c"),
            get_test_record_log(contract, tx_a, 10, 1, "a again"),
        ];

        let records = logs_to_records(&decoder, &logs);
        let texts: Vec<_> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c", "a again"]);
        assert!(records.iter().all(|r| r.status == RecordStatus::Confirmed));
        assert_eq!(records[2].source_tx, tx_a);
    }
}

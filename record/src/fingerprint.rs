// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

//! Content fingerprint stored next to each message on chain.
//!
//! The fingerprint is the MD5 digest of the message's UTF-8 bytes read as a
//! big-endian `uint128`, which is the width of the contract's hash argument.
//! Length limits are enforced by callers, not here.

use ethers::types::U256;
use md5::{Digest, Md5};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u128);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        let digest = Md5::digest(text.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest);
        Fingerprint(u128::from_be_bytes(bytes))
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }
}

impl From<Fingerprint> for U256 {
    fn from(fingerprint: Fingerprint) -> Self {
        U256::from(fingerprint.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:032x}", self.0)
    }
}

pub fn fingerprint(text: &str) -> Fingerprint {
    Fingerprint::of(text)
}

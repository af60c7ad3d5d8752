// Copyright (c) 2019-2025 Provable Inc.
// This file is part of the meridian library.

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:

// http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::crypto::{self, Address, Hash};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of state transition a transaction performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionKind {
    /// Moves `value` from the sender to the recipient.
    Transfer = 0,
    /// Registers the sender as a delegate; `data` carries the delegate name.
    RegisterDelegate = 1,
    /// Locks `value` on the sender and adds it to the recipient delegate's vote weight.
    Vote = 2,
    /// Unlocks `value` on the sender and subtracts it from the recipient delegate's vote weight.
    Unvote = 3,
}

/// A state transition, replayed deterministically against the account and
/// delegate overlays during block validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub from: Address,
    pub to: Address,
    pub value: u64,
    pub fee: u64,
    pub nonce: u64,
    pub data: Vec<u8>,
}

impl Transaction {
    /// Returns the content hash of this transaction, over its canonical encoding.
    pub fn hash(&self) -> Hash {
        let mut bytes = Vec::with_capacity(1 + 20 + 20 + 8 + 8 + 8 + 4 + self.data.len());
        bytes.push(self.kind as u8);
        bytes.extend_from_slice(self.from.as_bytes());
        bytes.extend_from_slice(self.to.as_bytes());
        bytes.extend_from_slice(&self.value.to_be_bytes());
        bytes.extend_from_slice(&self.fee.to_be_bytes());
        bytes.extend_from_slice(&self.nonce.to_be_bytes());
        bytes.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.data);
        crypto::sha256(&bytes)
    }
}

/// The reason a transaction was rejected during replay.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("invalid nonce: expected {expected}, found {found}")]
    InvalidNonce { expected: u64, found: u64 },
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },
    #[error("delegate {0} is already registered")]
    DuplicateDelegate(Address),
    #[error("delegate {0} is not registered")]
    UnknownDelegate(Address),
    #[error("insufficient votes: attempted to unvote {attempted}, locked {locked}")]
    InsufficientVotes { attempted: u64, locked: u64 },
    #[error("delegate name must be between 4 and 16 bytes, found {0}")]
    InvalidDelegateName(usize),
}

/// The outcome of replaying a single transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionResult {
    error: Option<TransactionError>,
}

impl TransactionResult {
    /// A successful outcome.
    pub const fn success() -> Self {
        Self { error: None }
    }

    /// A rejected outcome, with the reason.
    pub const fn failure(error: TransactionError) -> Self {
        Self { error: Some(error) }
    }

    /// Returns `true` if the transaction was applied.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the rejection reason, if any.
    pub fn error(&self) -> Option<&TransactionError> {
        self.error.as_ref()
    }
}

impl From<Result<(), TransactionError>> for TransactionResult {
    fn from(result: Result<(), TransactionError>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(error) => Self::failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transfer() -> Transaction {
        Transaction {
            kind: TransactionKind::Transfer,
            from: Address::new([1u8; 20]),
            to: Address::new([2u8; 20]),
            value: 100,
            fee: 1,
            nonce: 0,
            data: Vec::new(),
        }
    }

    #[test]
    fn test_hash_binds_every_field() {
        let transaction = sample_transfer();

        let mut other = transaction.clone();
        other.value = 101;
        assert_ne!(transaction.hash(), other.hash());

        let mut other = transaction.clone();
        other.nonce = 1;
        assert_ne!(transaction.hash(), other.hash());

        let mut other = transaction.clone();
        other.kind = TransactionKind::Vote;
        assert_ne!(transaction.hash(), other.hash());

        let mut other = transaction.clone();
        other.data = vec![0];
        assert_ne!(transaction.hash(), other.hash());
    }

    #[test]
    fn test_result_accessors() {
        let ok = TransactionResult::success();
        assert!(ok.is_success());
        assert!(ok.error().is_none());

        let err = TransactionResult::failure(TransactionError::InvalidNonce { expected: 1, found: 0 });
        assert!(!err.is_success());
        assert_eq!(err.error(), Some(&TransactionError::InvalidNonce { expected: 1, found: 0 }));
    }
}

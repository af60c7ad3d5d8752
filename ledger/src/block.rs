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

use crate::{
    crypto::{self, Address, Hash, Signature, EMPTY_HASH},
    transaction::Transaction,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A block of the canonical chain.
///
/// The `hash` commits to every header field and to the transaction list; the
/// `votes` are precommit signatures over the canonical vote encoding for
/// `(hash, number, view)` and are therefore not part of the hash themselves.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: u64,
    pub prev_hash: Hash,
    pub hash: Hash,
    pub coinbase: Address,
    pub view: u32,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub votes: Vec<Signature>,
}

impl Block {
    /// Initializes a new, unvoted block, computing its content hash.
    pub fn new(
        number: u64,
        prev_hash: Hash,
        coinbase: Address,
        view: u32,
        timestamp: u64,
        transactions: Vec<Transaction>,
    ) -> Self {
        let hash = Self::compute_hash(number, &prev_hash, &coinbase, view, timestamp, &transactions);
        Self { number, prev_hash, hash, coinbase, view, timestamp, transactions, votes: Vec::new() }
    }

    /// Initializes the genesis block.
    pub fn genesis() -> Self {
        Self::new(0, EMPTY_HASH, Address::ZERO, 0, 0, Vec::new())
    }

    /// Computes the content hash over the canonical header encoding.
    fn compute_hash(
        number: u64,
        prev_hash: &Hash,
        coinbase: &Address,
        view: u32,
        timestamp: u64,
        transactions: &[Transaction],
    ) -> Hash {
        let mut bytes = Vec::with_capacity(8 + 32 + 20 + 4 + 8 + 4 + transactions.len() * 32);
        bytes.extend_from_slice(&number.to_be_bytes());
        bytes.extend_from_slice(prev_hash);
        bytes.extend_from_slice(coinbase.as_bytes());
        bytes.extend_from_slice(&view.to_be_bytes());
        bytes.extend_from_slice(&timestamp.to_be_bytes());
        bytes.extend_from_slice(&(transactions.len() as u32).to_be_bytes());
        for transaction in transactions {
            bytes.extend_from_slice(&transaction.hash());
        }
        crypto::sha256(&bytes)
    }

    /// Returns `true` if the stored hash matches the block's contents.
    pub fn is_hash_consistent(&self) -> bool {
        self.hash
            == Self::compute_hash(
                self.number,
                &self.prev_hash,
                &self.coinbase,
                self.view,
                self.timestamp,
                &self.transactions,
            )
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("number", &self.number)
            .field("view", &self.view)
            .field("transactions", &self.transactions.len())
            .field("votes", &self.votes.len())
            .finish()
    }
}

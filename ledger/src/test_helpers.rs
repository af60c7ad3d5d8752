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

//! Deterministic fixtures shared by the ledger and sync-engine tests.

use crate::{
    block::Block,
    chain::{Blockchain, Genesis},
    crypto::{Address, Keypair},
    transaction::{Transaction, TransactionKind},
    vote::Vote,
};

/// The balance every genesis account is funded with.
pub const SAMPLE_FUNDING: u64 = 1_000_000;

/// Returns a keypair derived from the given seed byte.
pub fn sample_keypair(seed: u8) -> Keypair {
    Keypair::from_seed([seed; 32])
}

/// Returns `n` distinct validator keypairs.
pub fn sample_validator_keys(n: usize) -> Vec<Keypair> {
    (0..n).map(|index| sample_keypair(index as u8 + 1)).collect()
}

/// Returns a genesis allocation funding every key and registering it as a delegate.
pub fn sample_genesis(keys: &[Keypair]) -> Genesis {
    Genesis {
        accounts: keys.iter().map(|key| (key.address(), SAMPLE_FUNDING)).collect(),
        delegates: keys
            .iter()
            .enumerate()
            .map(|(index, key)| (key.address(), format!("node-{index}").into_bytes()))
            .collect(),
    }
}

/// Returns a fresh chain with `num_validators` funded, registered validators,
/// along with their keypairs.
pub fn sample_chain(num_validators: usize) -> (Blockchain, Vec<Keypair>) {
    let keys = sample_validator_keys(num_validators);
    (Blockchain::new(sample_genesis(&keys)), keys)
}

/// Builds a block extending `parent`, precommit-voted by every key in `voters`.
pub fn make_block(parent: &Block, transactions: Vec<Transaction>, view: u32, voters: &[Keypair]) -> Block {
    make_block_with_coinbase(parent, transactions, view, Address::ZERO, voters)
}

/// Builds a block extending `parent` with an explicit coinbase.
pub fn make_block_with_coinbase(
    parent: &Block,
    transactions: Vec<Transaction>,
    view: u32,
    coinbase: Address,
    voters: &[Keypair],
) -> Block {
    let mut block =
        Block::new(parent.number + 1, parent.hash, coinbase, view, parent.timestamp + 1, transactions);
    let payload = Vote::precommit_approve(block.hash, block.number, block.view).encode();
    block.votes = voters.iter().map(|key| key.sign(&payload)).collect();
    block
}

/// Builds a transfer from the given key.
pub fn make_transfer(from: &Keypair, to: Address, value: u64, fee: u64, nonce: u64) -> Transaction {
    Transaction { kind: TransactionKind::Transfer, from: from.address(), to, value, fee, nonce, data: Vec::new() }
}

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
    block::Block,
    crypto::Address,
    state::{AccountState, Delegate, DelegateState},
};

use anyhow::{ensure, Result};
use parking_lot::RwLock;

/// The initial allocation of balances and delegates, applied at block 0.
#[derive(Clone, Debug, Default)]
pub struct Genesis {
    pub accounts: Vec<(Address, u64)>,
    pub delegates: Vec<(Address, Vec<u8>)>,
}

/// The in-memory canonical chain and its live state stores.
///
/// The store provides its own locking; callers stage speculative state
/// mutations through [`AccountState::track`] and [`DelegateState::track`]
/// rather than writing to the stores directly.
pub struct Blockchain {
    blocks: RwLock<Vec<Block>>,
    accounts: AccountState,
    delegates: DelegateState,
}

impl Blockchain {
    /// Initializes a chain holding only the genesis block, with the given
    /// initial allocation folded into the state stores.
    pub fn new(genesis: Genesis) -> Self {
        let accounts = AccountState::new();
        let mut overlay = accounts.track();
        for (address, balance) in &genesis.accounts {
            overlay.get_mut(*address).balance = *balance;
        }
        overlay.commit();

        let delegates = DelegateState::new();
        let mut overlay = delegates.track();
        for (address, name) in &genesis.delegates {
            overlay.register(Delegate { address: *address, name: name.clone(), registered_at: 0, votes: 0 });
        }
        overlay.commit();

        Self { blocks: RwLock::new(vec![Block::genesis()]), accounts, delegates }
    }

    /// Returns the height of the chain tip.
    pub fn latest_block_number(&self) -> u64 {
        self.blocks.read().last().map(|block| block.number).unwrap_or(0)
    }

    /// Returns the block at the chain tip.
    pub fn latest_block(&self) -> Block {
        // The chain always holds at least the genesis block.
        self.blocks.read().last().cloned().unwrap_or_else(Block::genesis)
    }

    /// Returns `true` if a block at the given height has been committed.
    pub fn contains(&self, height: u64) -> bool {
        height < self.blocks.read().len() as u64
    }

    /// Returns the block at the given height, if committed.
    pub fn block(&self, height: u64) -> Option<Block> {
        self.blocks.read().get(height as usize).cloned()
    }

    /// Appends the given block to the chain. The block must extend the tip
    /// by exactly one height and link to its hash.
    pub fn add_block(&self, block: Block) -> Result<()> {
        let mut blocks = self.blocks.write();
        // The tip is re-read under the write lock to serialize appends.
        let latest = blocks.last().cloned().unwrap_or_else(Block::genesis);
        ensure!(
            block.number == latest.number + 1,
            "block {} does not extend the chain at height {}",
            block.number,
            latest.number
        );
        ensure!(block.prev_hash == latest.hash, "block {} does not link to the tip hash", block.number);
        blocks.push(block);
        Ok(())
    }

    /// Returns a handle to the live account store.
    pub fn account_state(&self) -> AccountState {
        self.accounts.clone()
    }

    /// Returns a handle to the live delegate store.
    pub fn delegate_state(&self) -> DelegateState {
        self.delegates.clone()
    }
}

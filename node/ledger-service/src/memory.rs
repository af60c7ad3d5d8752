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

use crate::LedgerService;

use meridian_ledger::{AccountState, Block, Blockchain, DelegateState, Genesis};

use anyhow::Result;

/// A ledger service backed by the in-memory [`Blockchain`].
pub struct MemoryLedgerService {
    chain: Blockchain,
}

impl MemoryLedgerService {
    /// Initializes a new in-memory ledger from the given genesis allocation.
    pub fn new(genesis: Genesis) -> Self {
        Self { chain: Blockchain::new(genesis) }
    }

    /// Initializes a new in-memory ledger over an existing chain.
    pub fn from_chain(chain: Blockchain) -> Self {
        Self { chain }
    }
}

impl LedgerService for MemoryLedgerService {
    fn latest_block_number(&self) -> u64 {
        self.chain.latest_block_number()
    }

    fn latest_block(&self) -> Block {
        self.chain.latest_block()
    }

    fn contains_block_height(&self, height: u64) -> bool {
        self.chain.contains(height)
    }

    fn add_block(&self, block: Block) -> Result<()> {
        debug!("Appending block {} to the chain", block.number);
        self.chain.add_block(block)
    }

    fn account_state(&self) -> AccountState {
        self.chain.account_state()
    }

    fn delegate_state(&self) -> DelegateState {
        self.chain.delegate_state()
    }
}

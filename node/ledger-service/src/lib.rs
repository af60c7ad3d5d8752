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

#![forbid(unsafe_code)]

#[macro_use]
extern crate tracing;

mod memory;
pub use memory::MemoryLedgerService;

use meridian_ledger::{AccountState, Block, DelegateState};

use anyhow::Result;

/// Abstract chain store.
///
/// The sync engine reads the tip and appends validated blocks through this
/// trait; speculative state mutations are staged on overlays obtained from
/// the state handles and folded back on commit.
pub trait LedgerService: Send + Sync {
    /// Returns the height of the chain tip.
    fn latest_block_number(&self) -> u64;

    /// Returns the block at the chain tip.
    fn latest_block(&self) -> Block;

    /// Returns `true` if a block at the given height has been committed.
    fn contains_block_height(&self, height: u64) -> bool;

    /// Appends the given block to the chain.
    fn add_block(&self, block: Block) -> Result<()>;

    /// Returns a handle to the live account store.
    fn account_state(&self) -> AccountState;

    /// Returns a handle to the live delegate store.
    fn delegate_state(&self) -> DelegateState;
}

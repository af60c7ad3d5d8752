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

use crate::crypto::Address;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

/// The balance, locked (vote-bonded) amount, and nonce of an account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: u64,
    pub locked: u64,
    pub nonce: u64,
}

/// A delegate registered to produce and vote on blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    pub address: Address,
    pub name: Vec<u8>,
    pub registered_at: u64,
    pub votes: u64,
}

/// A cheaply clonable handle to the live account store.
///
/// All mutations are staged through [`AccountState::track`]; the store itself
/// only changes when an overlay is committed.
#[derive(Clone, Default)]
pub struct AccountState {
    accounts: Arc<RwLock<HashMap<Address, Account>>>,
}

impl AccountState {
    /// Initializes an empty account store.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the account at the given address, or a fresh one if absent.
    pub fn get(&self, address: &Address) -> Account {
        self.accounts.read().get(address).copied().unwrap_or_default()
    }

    /// Returns a new overlay staging mutations on top of this store.
    pub fn track(&self) -> AccountOverlay {
        AccountOverlay { parent: self.clone(), pending: HashMap::new() }
    }

    fn apply(&self, pending: HashMap<Address, Account>) {
        self.accounts.write().extend(pending);
    }
}

/// A staged, uncommitted view of the account store.
///
/// Reads fall through to the parent; writes land in the overlay. Dropping an
/// overlay discards its mutations; [`AccountOverlay::commit`] folds them back
/// into the parent store.
pub struct AccountOverlay {
    parent: AccountState,
    pending: HashMap<Address, Account>,
}

impl AccountOverlay {
    /// Returns the account at the given address, preferring staged mutations.
    pub fn get(&self, address: &Address) -> Account {
        match self.pending.get(address) {
            Some(account) => *account,
            None => self.parent.get(address),
        }
    }

    /// Returns a mutable reference to the account at the given address,
    /// staging it into the overlay on first access.
    pub fn get_mut(&mut self, address: Address) -> &mut Account {
        let parent = &self.parent;
        self.pending.entry(address).or_insert_with(|| parent.get(&address))
    }

    /// Folds the staged mutations into the parent store.
    pub fn commit(self) {
        self.parent.apply(self.pending);
    }
}

/// A cheaply clonable handle to the live delegate store.
#[derive(Clone, Default)]
pub struct DelegateState {
    delegates: Arc<RwLock<HashMap<Address, Delegate>>>,
}

impl DelegateState {
    /// Initializes an empty delegate store.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the delegate at the given address, if registered.
    pub fn get(&self, address: &Address) -> Option<Delegate> {
        self.delegates.read().get(address).cloned()
    }

    /// Returns the current validator set; see [`DelegateOverlay::validators`].
    pub fn validators(&self) -> Vec<Delegate> {
        sorted_validators(self.delegates.read().values().cloned().collect())
    }

    /// Returns a new overlay staging mutations on top of this store.
    pub fn track(&self) -> DelegateOverlay {
        DelegateOverlay { parent: self.clone(), pending: HashMap::new() }
    }

    fn apply(&self, pending: HashMap<Address, Delegate>) {
        self.delegates.write().extend(pending);
    }
}

/// A staged, uncommitted view of the delegate store.
pub struct DelegateOverlay {
    parent: DelegateState,
    pending: HashMap<Address, Delegate>,
}

impl DelegateOverlay {
    /// Returns the delegate at the given address, preferring staged mutations.
    pub fn get(&self, address: &Address) -> Option<Delegate> {
        match self.pending.get(address) {
            Some(delegate) => Some(delegate.clone()),
            None => self.parent.get(address),
        }
    }

    /// Returns `true` if the given address is a registered delegate.
    pub fn contains(&self, address: &Address) -> bool {
        self.pending.contains_key(address) || self.parent.delegates.read().contains_key(address)
    }

    /// Stages the registration of a new delegate.
    pub fn register(&mut self, delegate: Delegate) {
        self.pending.insert(delegate.address, delegate);
    }

    /// Returns a mutable reference to the delegate at the given address,
    /// staging it into the overlay on first access.
    pub fn get_mut(&mut self, address: &Address) -> Option<&mut Delegate> {
        if !self.pending.contains_key(address) {
            let delegate = self.parent.get(address)?;
            self.pending.insert(*address, delegate);
        }
        self.pending.get_mut(address)
    }

    /// Returns the current validator set as seen through this overlay:
    /// every registered delegate, ordered by vote weight descending and
    /// address ascending. The ordering is deterministic so that every node
    /// derives the same set.
    pub fn validators(&self) -> Vec<Delegate> {
        let mut delegates: HashMap<Address, Delegate> = self.parent.delegates.read().clone();
        delegates.extend(self.pending.iter().map(|(address, delegate)| (*address, delegate.clone())));
        sorted_validators(delegates.into_values().collect())
    }

    /// Folds the staged mutations into the parent store.
    pub fn commit(self) {
        self.parent.apply(self.pending);
    }
}

fn sorted_validators(mut delegates: Vec<Delegate>) -> Vec<Delegate> {
    delegates.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.address.cmp(&b.address)));
    delegates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn test_account_overlay_commit() {
        let state = AccountState::new();

        let mut overlay = state.track();
        overlay.get_mut(address(1)).balance = 500;
        // The parent is untouched until commit.
        assert_eq!(state.get(&address(1)).balance, 0);

        overlay.commit();
        assert_eq!(state.get(&address(1)).balance, 500);
    }

    #[test]
    fn test_account_overlay_dropped_mutations_vanish() {
        let state = AccountState::new();

        let mut overlay = state.track();
        overlay.get_mut(address(1)).balance = 500;
        drop(overlay);

        assert_eq!(state.get(&address(1)).balance, 0);
    }

    #[test]
    fn test_account_overlay_reads_fall_through() {
        let state = AccountState::new();

        let mut seed = state.track();
        seed.get_mut(address(1)).balance = 100;
        seed.commit();

        let mut overlay = state.track();
        assert_eq!(overlay.get(&address(1)).balance, 100);
        overlay.get_mut(address(1)).balance += 50;
        assert_eq!(overlay.get(&address(1)).balance, 150);
        assert_eq!(state.get(&address(1)).balance, 100);
    }

    #[test]
    fn test_delegate_overlay_registration_visibility() {
        let state = DelegateState::new();

        let mut overlay = state.track();
        overlay.register(Delegate { address: address(1), name: b"node-1".to_vec(), registered_at: 3, votes: 0 });

        assert!(overlay.contains(&address(1)));
        assert!(state.get(&address(1)).is_none());

        overlay.commit();
        assert_eq!(state.get(&address(1)).unwrap().name, b"node-1");
    }

    #[test]
    fn test_validator_ordering_is_deterministic() {
        let state = DelegateState::new();

        let mut overlay = state.track();
        for (byte, votes) in [(3u8, 10u64), (1, 20), (2, 10)] {
            overlay.register(Delegate { address: address(byte), name: vec![byte], registered_at: 0, votes });
        }

        // Weight descending, address ascending on ties.
        let validators: Vec<Address> = overlay.validators().into_iter().map(|d| d.address).collect();
        assert_eq!(validators, vec![address(1), address(2), address(3)]);

        overlay.commit();
        let validators: Vec<Address> = state.validators().into_iter().map(|d| d.address).collect();
        assert_eq!(validators, vec![address(1), address(2), address(3)]);
    }
}

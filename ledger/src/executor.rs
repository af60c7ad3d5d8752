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
    state::{AccountOverlay, Delegate, DelegateOverlay},
    transaction::{Transaction, TransactionError, TransactionKind, TransactionResult},
};

/// Delegate names must fall within this length range, in bytes.
const MIN_DELEGATE_NAME_LENGTH: usize = 4;
const MAX_DELEGATE_NAME_LENGTH: usize = 16;

/// Replays the given transactions, in order, against the account and delegate
/// overlays. A rejected transaction leaves the overlays untouched; later
/// transactions still execute. Execution is deterministic and never touches
/// the parent stores.
///
/// The `_is_proposing` flag is reserved for the proposer path, which relaxes
/// none of the rules today.
pub fn execute(
    transactions: &[Transaction],
    accounts: &mut AccountOverlay,
    delegates: &mut DelegateOverlay,
    _is_proposing: bool,
) -> Vec<TransactionResult> {
    transactions.iter().map(|transaction| apply(transaction, accounts, delegates).into()).collect()
}

/// Applies a single transaction, mutating the overlays only on success.
fn apply(
    transaction: &Transaction,
    accounts: &mut AccountOverlay,
    delegates: &mut DelegateOverlay,
) -> Result<(), TransactionError> {
    let sender = accounts.get(&transaction.from);

    // Nonce and fee checks are common to every kind.
    if transaction.nonce != sender.nonce {
        return Err(TransactionError::InvalidNonce { expected: sender.nonce, found: transaction.nonce });
    }
    // An unvote returns `value` from the locked pool; only the fee is spent.
    let required = match transaction.kind {
        TransactionKind::Unvote => transaction.fee,
        _ => transaction.value.saturating_add(transaction.fee),
    };
    let available = sender.balance;
    if required > available {
        return Err(TransactionError::InsufficientBalance { required, available });
    }

    // Kind-specific checks, before any mutation.
    match transaction.kind {
        TransactionKind::Transfer => {}
        TransactionKind::RegisterDelegate => {
            let name_length = transaction.data.len();
            if !(MIN_DELEGATE_NAME_LENGTH..=MAX_DELEGATE_NAME_LENGTH).contains(&name_length) {
                return Err(TransactionError::InvalidDelegateName(name_length));
            }
            if delegates.contains(&transaction.from) {
                return Err(TransactionError::DuplicateDelegate(transaction.from));
            }
        }
        TransactionKind::Vote => {
            if !delegates.contains(&transaction.to) {
                return Err(TransactionError::UnknownDelegate(transaction.to));
            }
        }
        TransactionKind::Unvote => {
            let Some(delegate) = delegates.get(&transaction.to) else {
                return Err(TransactionError::UnknownDelegate(transaction.to));
            };
            if transaction.value > delegate.votes {
                return Err(TransactionError::InsufficientVotes {
                    attempted: transaction.value,
                    locked: delegate.votes,
                });
            }
            if transaction.value > sender.locked {
                return Err(TransactionError::InsufficientVotes {
                    attempted: transaction.value,
                    locked: sender.locked,
                });
            }
        }
    }

    // All checks passed; mutate.
    {
        let sender = accounts.get_mut(transaction.from);
        sender.nonce += 1;
        sender.balance -= transaction.fee;
    }

    match transaction.kind {
        TransactionKind::Transfer => {
            accounts.get_mut(transaction.from).balance -= transaction.value;
            accounts.get_mut(transaction.to).balance += transaction.value;
        }
        TransactionKind::RegisterDelegate => {
            delegates.register(Delegate {
                address: transaction.from,
                name: transaction.data.clone(),
                registered_at: transaction.nonce,
                votes: 0,
            });
        }
        TransactionKind::Vote => {
            let sender = accounts.get_mut(transaction.from);
            sender.balance -= transaction.value;
            sender.locked += transaction.value;
            // contains() was checked above.
            if let Some(delegate) = delegates.get_mut(&transaction.to) {
                delegate.votes += transaction.value;
            }
        }
        TransactionKind::Unvote => {
            let sender = accounts.get_mut(transaction.from);
            sender.balance += transaction.value;
            sender.locked -= transaction.value;
            if let Some(delegate) = delegates.get_mut(&transaction.to) {
                delegate.votes -= transaction.value;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::Address,
        state::{AccountState, DelegateState},
    };

    fn address(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    /// Returns overlays over fresh stores, with `balance` funded at address 1.
    fn sample_overlays(balance: u64) -> (AccountOverlay, DelegateOverlay) {
        let accounts = AccountState::new();
        let mut seed = accounts.track();
        seed.get_mut(address(1)).balance = balance;
        seed.commit();
        (accounts.track(), DelegateState::new().track())
    }

    fn transfer(value: u64, fee: u64, nonce: u64) -> Transaction {
        Transaction {
            kind: TransactionKind::Transfer,
            from: address(1),
            to: address(2),
            value,
            fee,
            nonce,
            data: Vec::new(),
        }
    }

    #[test]
    fn test_transfer() {
        let (mut accounts, mut delegates) = sample_overlays(1_000);

        let results = execute(&[transfer(300, 5, 0)], &mut accounts, &mut delegates, false);
        assert!(results[0].is_success());
        assert_eq!(accounts.get(&address(1)).balance, 695);
        assert_eq!(accounts.get(&address(1)).nonce, 1);
        assert_eq!(accounts.get(&address(2)).balance, 300);
    }

    #[test]
    fn test_transfer_rejects_wrong_nonce() {
        let (mut accounts, mut delegates) = sample_overlays(1_000);

        let results = execute(&[transfer(300, 5, 7)], &mut accounts, &mut delegates, false);
        assert_eq!(results[0].error(), Some(&TransactionError::InvalidNonce { expected: 0, found: 7 }));
        // Rejected transactions leave the overlay untouched.
        assert_eq!(accounts.get(&address(1)).balance, 1_000);
    }

    #[test]
    fn test_transfer_rejects_overspend() {
        let (mut accounts, mut delegates) = sample_overlays(100);

        let results = execute(&[transfer(100, 1, 0)], &mut accounts, &mut delegates, false);
        assert_eq!(
            results[0].error(),
            Some(&TransactionError::InsufficientBalance { required: 101, available: 100 })
        );
    }

    #[test]
    fn test_sequential_nonces_within_a_block() {
        let (mut accounts, mut delegates) = sample_overlays(1_000);

        let results = execute(&[transfer(100, 1, 0), transfer(100, 1, 1)], &mut accounts, &mut delegates, false);
        assert!(results.iter().all(TransactionResult::is_success));
        assert_eq!(accounts.get(&address(1)).nonce, 2);
        assert_eq!(accounts.get(&address(2)).balance, 200);
    }

    #[test]
    fn test_failed_transaction_does_not_halt_the_batch() {
        let (mut accounts, mut delegates) = sample_overlays(1_000);

        // The middle transaction reuses nonce 0 and must fail alone.
        let batch = [transfer(100, 1, 0), transfer(100, 1, 0), transfer(100, 1, 1)];
        let results = execute(&batch, &mut accounts, &mut delegates, false);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(results[2].is_success());
        assert_eq!(accounts.get(&address(2)).balance, 200);
    }

    #[test]
    fn test_register_delegate() {
        let (mut accounts, mut delegates) = sample_overlays(1_000);

        let register = Transaction {
            kind: TransactionKind::RegisterDelegate,
            from: address(1),
            to: Address::ZERO,
            value: 0,
            fee: 10,
            nonce: 0,
            data: b"node-1".to_vec(),
        };
        let results = execute(&[register.clone()], &mut accounts, &mut delegates, false);
        assert!(results[0].is_success());
        assert!(delegates.contains(&address(1)));
        assert_eq!(accounts.get(&address(1)).balance, 990);

        // Re-registration fails.
        let mut again = register;
        again.nonce = 1;
        let results = execute(&[again], &mut accounts, &mut delegates, false);
        assert_eq!(results[0].error(), Some(&TransactionError::DuplicateDelegate(address(1))));
    }

    #[test]
    fn test_register_delegate_rejects_bad_name() {
        let (mut accounts, mut delegates) = sample_overlays(1_000);

        let register = Transaction {
            kind: TransactionKind::RegisterDelegate,
            from: address(1),
            to: Address::ZERO,
            value: 0,
            fee: 10,
            nonce: 0,
            data: b"x".to_vec(),
        };
        let results = execute(&[register], &mut accounts, &mut delegates, false);
        assert_eq!(results[0].error(), Some(&TransactionError::InvalidDelegateName(1)));
    }

    #[test]
    fn test_vote_and_unvote() {
        let (mut accounts, mut delegates) = sample_overlays(1_000);
        delegates.register(Delegate { address: address(9), name: b"node-9".to_vec(), registered_at: 0, votes: 0 });

        let vote = Transaction {
            kind: TransactionKind::Vote,
            from: address(1),
            to: address(9),
            value: 400,
            fee: 1,
            nonce: 0,
            data: Vec::new(),
        };
        let results = execute(&[vote], &mut accounts, &mut delegates, false);
        assert!(results[0].is_success());
        assert_eq!(accounts.get(&address(1)).balance, 599);
        assert_eq!(accounts.get(&address(1)).locked, 400);
        assert_eq!(delegates.get(&address(9)).unwrap().votes, 400);

        // Unvoting more than is locked fails; unvoting within bounds succeeds.
        let mut unvote = Transaction {
            kind: TransactionKind::Unvote,
            from: address(1),
            to: address(9),
            value: 500,
            fee: 1,
            nonce: 1,
            data: Vec::new(),
        };
        let results = execute(&[unvote.clone()], &mut accounts, &mut delegates, false);
        assert_eq!(results[0].error(), Some(&TransactionError::InsufficientVotes { attempted: 500, locked: 400 }));

        unvote.value = 400;
        let results = execute(&[unvote], &mut accounts, &mut delegates, false);
        assert!(results[0].is_success());
        assert_eq!(accounts.get(&address(1)).locked, 0);
        assert_eq!(delegates.get(&address(9)).unwrap().votes, 0);
    }

    #[test]
    fn test_vote_rejects_unknown_delegate() {
        let (mut accounts, mut delegates) = sample_overlays(1_000);

        let vote = Transaction {
            kind: TransactionKind::Vote,
            from: address(1),
            to: address(9),
            value: 400,
            fee: 1,
            nonce: 0,
            data: Vec::new(),
        };
        let results = execute(&[vote], &mut accounts, &mut delegates, false);
        assert_eq!(results[0].error(), Some(&TransactionError::UnknownDelegate(address(9))));
    }
}

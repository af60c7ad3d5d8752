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

use crate::crypto::{Hash, HASH_LENGTH};

use serde::{Deserialize, Serialize};

/// The encoded length of a vote: kind, value, block hash, number, view.
pub const VOTE_LENGTH: usize = 1 + 1 + HASH_LENGTH + 8 + 4;

/// The phase of the BFT round a vote belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteKind {
    Validate = 0,
    Precommit = 1,
    Commit = 2,
}

/// A declaration by a validator that a specific block at a specific height
/// and view should (or should not) become final.
///
/// The canonical encoding is what validators actually sign; it must be
/// byte-for-byte identical across nodes or signature checks diverge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub kind: VoteKind,
    pub approve: bool,
    pub block_hash: Hash,
    pub number: u64,
    pub view: u32,
}

impl Vote {
    /// Initializes an approving precommit vote for the given block.
    pub fn precommit_approve(block_hash: Hash, number: u64, view: u32) -> Self {
        Self { kind: VoteKind::Precommit, approve: true, block_hash, number, view }
    }

    /// Returns the canonical fixed-width encoding of this vote:
    /// `[kind][approve][block_hash][number BE][view BE]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(VOTE_LENGTH);
        bytes.push(self.kind as u8);
        bytes.push(self.approve as u8);
        bytes.extend_from_slice(&self.block_hash);
        bytes.extend_from_slice(&self.number.to_be_bytes());
        bytes.extend_from_slice(&self.view.to_be_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_stable() {
        let vote = Vote::precommit_approve([0x11; HASH_LENGTH], 0x0102030405060708, 0x0a0b0c0d);

        let mut expected = vec![1u8, 1u8];
        expected.extend_from_slice(&[0x11; HASH_LENGTH]);
        expected.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        expected.extend_from_slice(&[0x0a, 0x0b, 0x0c, 0x0d]);

        let encoded = vote.encode();
        assert_eq!(encoded.len(), VOTE_LENGTH);
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encoding_binds_every_field() {
        let vote = Vote::precommit_approve([0x11; HASH_LENGTH], 42, 3);

        let mut other = vote.clone();
        other.view = 4;
        assert_ne!(vote.encode(), other.encode());

        let mut other = vote.clone();
        other.number = 43;
        assert_ne!(vote.encode(), other.encode());

        let mut other = vote.clone();
        other.approve = false;
        assert_ne!(vote.encode(), other.encode());
    }
}

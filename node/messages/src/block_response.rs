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

use meridian_ledger::Block;

use serde::{Deserialize, Serialize};

/// The reply to a [`crate::BlockRequest`].
///
/// A peer that does not hold the requested block answers with `block: None`;
/// the receiver drops such replies and lets the request time out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResponse {
    pub block: Option<Box<Block>>,
}

impl BlockResponse {
    /// Initializes a response carrying the given block.
    pub fn some(block: Block) -> Self {
        Self { block: Some(Box::new(block)) }
    }

    /// Initializes an empty response.
    pub fn none() -> Self {
        Self { block: None }
    }
}

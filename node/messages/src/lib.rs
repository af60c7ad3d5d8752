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

mod block_header;
pub use block_header::BlockHeader;

mod block_request;
pub use block_request::BlockRequest;

mod block_response;
pub use block_response::BlockResponse;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A message of the block synchronization protocol. The transport layer owns
/// the wire codec; these are the decoded forms it hands to the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    BlockRequest(BlockRequest),
    BlockResponse(BlockResponse),
    BlockHeader(BlockHeader),
}

impl Message {
    /// Returns the message name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BlockRequest(..) => "BlockRequest",
            Self::BlockResponse(..) => "BlockResponse",
            Self::BlockHeader(..) => "BlockHeader",
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(Message::BlockRequest(BlockRequest { height: 3 }).name(), "BlockRequest");
        assert_eq!(Message::BlockResponse(BlockResponse { block: None }).name(), "BlockResponse");
    }
}

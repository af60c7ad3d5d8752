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

pub mod block;
pub use block::*;

pub mod chain;
pub use chain::*;

pub mod crypto;
pub use crypto::{Address, Hash, Keypair, Signature};

pub mod executor;
pub use executor::*;

pub mod reward;
pub use reward::*;

pub mod state;
pub use state::*;

pub mod transaction;
pub use transaction::*;

pub mod vote;
pub use vote::*;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

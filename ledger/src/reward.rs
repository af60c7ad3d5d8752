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

/// The last block of the first emission era.
const FIRST_ERA_END: u64 = 20_000_000;
/// The last block of the second emission era.
const SECOND_ERA_END: u64 = 40_000_000;

/// Returns the block reward, in base units, credited to the coinbase of the
/// block at the given height. The schedule is fixed and must be identical
/// across nodes.
pub fn block_reward(number: u64) -> u64 {
    match number {
        0 => 0,
        n if n <= FIRST_ERA_END => 50,
        n if n <= SECOND_ERA_END => 25,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule() {
        assert_eq!(block_reward(0), 0);
        assert_eq!(block_reward(1), 50);
        assert_eq!(block_reward(FIRST_ERA_END), 50);
        assert_eq!(block_reward(FIRST_ERA_END + 1), 25);
        assert_eq!(block_reward(SECOND_ERA_END), 25);
        assert_eq!(block_reward(SECOND_ERA_END + 1), 0);
    }
}

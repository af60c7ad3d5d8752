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

use std::{
    collections::{BTreeMap, BTreeSet},
    time::{Duration, Instant},
};

/// The engine's sole mutable state: the three work sets and the sync target.
///
/// # State
/// - A height lives in at most one of `to_download`, `in_flight`, or (keyed
///   by its block) `to_process` at any instant; every mutation below removes
///   the height from the other two sets.
/// - The union of the three sets plus the heights already committed to the
///   chain covers `[tip + 1, target)` for the lifetime of a sync run.
///
/// All operations are guarded by a single mutex in `BlockSync`; none of them
/// block on anything but that mutex.
#[derive(Debug, Default)]
pub(super) struct SyncRegistry {
    /// The heights whose request has not been sent yet, ascending.
    to_download: BTreeSet<u64>,
    /// The heights with an outstanding request, and when it was dispatched.
    in_flight: BTreeMap<u64, Instant>,
    /// The received blocks awaiting validation, keyed by height.
    to_process: BTreeMap<u64, Block>,
    /// The exclusive upper bound of the sync run.
    target: u64,
}

impl SyncRegistry {
    /// Clears all three sets and schedules `[latest + 1, target)` for download.
    pub fn init(&mut self, latest: u64, target: u64) {
        self.to_download.clear();
        self.in_flight.clear();
        self.to_process.clear();
        self.target = target;
        self.to_download.extend(latest + 1..target);
    }

    /// Returns the exclusive upper bound of the sync run.
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Returns the number of heights waiting to be requested.
    pub fn num_pending(&self) -> usize {
        self.to_download.len()
    }

    /// Returns the number of outstanding requests.
    pub fn num_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns the number of received blocks awaiting validation.
    pub fn num_received(&self) -> usize {
        self.to_process.len()
    }

    /// Removes and returns the smallest height waiting to be requested.
    pub fn next_to_request(&mut self) -> Option<u64> {
        self.to_download.pop_first()
    }

    /// Records an outstanding request for the given height, dispatched at `now`.
    pub fn mark_in_flight(&mut self, height: u64, now: Instant) {
        self.to_download.remove(&height);
        self.in_flight.insert(height, now);
    }

    /// Moves every request older than `max_age` back to the download queue,
    /// and returns the reissued heights in ascending order.
    pub fn reap_timeouts(&mut self, now: Instant, max_age: Duration) -> Vec<u64> {
        let expired: Vec<u64> = self
            .in_flight
            .iter()
            .filter(|(_, dispatched)| now.saturating_duration_since(**dispatched) > max_age)
            .map(|(height, _)| *height)
            .collect();
        for height in &expired {
            self.in_flight.remove(height);
            self.to_download.insert(*height);
        }
        expired
    }

    /// Files a received block for validation, settling its outstanding request.
    pub fn receive(&mut self, block: Block) {
        self.in_flight.remove(&block.number);
        self.to_download.remove(&block.number);
        self.to_process.insert(block.number, block);
    }

    /// Discards any received block at or below `latest`, then removes and
    /// returns the block at exactly `latest + 1`, if it has arrived.
    pub fn take_next(&mut self, latest: u64) -> Option<Block> {
        while let Some((&height, _)) = self.to_process.first_key_value() {
            if height > latest {
                break;
            }
            self.to_process.pop_first();
        }
        match self.to_process.first_key_value() {
            Some((&height, _)) if height == latest + 1 => self.to_process.pop_first().map(|(_, block)| block),
            _ => None,
        }
    }

    /// Schedules the given height to be requested again, after a failed commit.
    pub fn reinsert(&mut self, height: u64) {
        self.in_flight.remove(&height);
        self.to_process.remove(&height);
        self.to_download.insert(height);
    }
}

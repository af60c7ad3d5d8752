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

use meridian_ledger::{block_reward, crypto, execute, Address, Block, Vote};
use meridian_node_communication_service::CommunicationService;
use meridian_node_ledger_service::LedgerService;
use meridian_node_messages::Message;

use anyhow::{bail, ensure, Result};
use indexmap::IndexSet;
use parking_lot::Mutex;
use rand::seq::IteratorRandom;
use std::{
    collections::HashSet,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::sync::Notify;

mod helpers;
pub use helpers::rangify_heights;

mod registry;
use registry::SyncRegistry;

/// The maximum number of requests dispatched per downloader tick, and the
/// backpressure threshold on outstanding requests.
pub const MAX_BATCH_SIZE: usize = 32;

/// How long a block request may stay unanswered before it is reissued.
pub const MAX_DOWNLOAD_TIME: Duration = Duration::from_secs(120);

/// The period of the downloader task.
pub const DOWNLOAD_INTERVAL: Duration = Duration::from_millis(500);

/// The period of the processor task.
pub const PROCESS_INTERVAL: Duration = Duration::from_millis(200);

/// Returns the BFT quorum threshold `⌈2n/3⌉` for a validator set of size `n`.
/// The integer form must be bit-identical across nodes.
pub fn quorum_threshold(num_validators: usize) -> usize {
    (2 * num_validators).div_ceil(3)
}

/// The block synchronization engine.
///
/// `BlockSync` brings the local chain from its current tip up to a
/// caller-supplied target height: a downloader task spreads block requests
/// over the idle peers, responses are filed back through [`Self::on_message`],
/// and a processor task validates and commits the received blocks in strict
/// height order.
///
/// # Notes
/// - One instance is created at node startup and passed to whichever
///   component drives catch-up; there is no global engine.
/// - The engine does not talk to the network itself. Requests go out through
///   a [`CommunicationService`], and the host's transport feeds decoded
///   messages into [`Self::on_message`].
pub struct BlockSync {
    /// The ledger.
    ledger: Arc<dyn LedgerService>,
    /// The three work sets and the sync target; the engine's sole mutable state.
    registry: Mutex<SyncRegistry>,
    /// Whether a sync run is in progress.
    running: AtomicBool,
    /// Signals the waiter in [`Self::start`] that the run is over.
    done: Notify,
}

impl BlockSync {
    /// Initializes a new block sync engine over the given ledger.
    pub fn new(ledger: Arc<dyn LedgerService>) -> Self {
        Self { ledger, registry: Default::default(), running: AtomicBool::new(false), done: Notify::new() }
    }

    /// Returns `true` if a sync run is in progress.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns the exclusive target height of the current run.
    pub fn target(&self) -> u64 {
        self.registry.lock().target()
    }

    /// Returns the height of the chain tip.
    pub fn ledger_height(&self) -> u64 {
        self.ledger.latest_block_number()
    }

    /// Returns the number of heights waiting to be requested.
    pub fn num_pending_downloads(&self) -> usize {
        self.registry.lock().num_pending()
    }

    /// Returns the number of outstanding block requests.
    pub fn num_inflight_requests(&self) -> usize {
        self.registry.lock().num_in_flight()
    }

    /// Returns the number of received blocks awaiting validation.
    pub fn num_queued_blocks(&self) -> usize {
        self.registry.lock().num_received()
    }
}

impl BlockSync {
    /// Starts a sync run towards `target` (exclusive) and blocks until the
    /// chain tip reaches `target - 1` or [`Self::stop`] is called.
    ///
    /// The downloader and processor are spawned as periodic tasks. On
    /// completion the downloader is aborted mid-tick if necessary, while the
    /// processor is awaited so that an in-progress commit always finishes
    /// before this function returns.
    pub async fn start<C: CommunicationService + 'static>(
        self: &Arc<Self>,
        communication: Arc<C>,
        target: u64,
    ) -> Result<()> {
        ensure!(
            self.running.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok(),
            "block sync is already running"
        );

        let latest = self.ledger.latest_block_number();
        if latest + 1 >= target {
            debug!("Nothing to sync: current height = {latest}, target = {target}");
            self.running.store(false, Ordering::SeqCst);
            return Ok(());
        }

        self.registry.lock().init(latest, target);
        info!("Block sync started: current height = {latest}, target = {target}");

        let download = tokio::spawn({
            let this = self.clone();
            let communication = communication.clone();
            async move {
                let mut interval = tokio::time::interval(DOWNLOAD_INTERVAL);
                loop {
                    interval.tick().await;
                    if !this.is_running() {
                        break;
                    }
                    this.download(&*communication).await;
                }
            }
        });
        let process = tokio::spawn({
            let this = self.clone();
            async move {
                let mut interval = tokio::time::interval(PROCESS_INTERVAL);
                loop {
                    interval.tick().await;
                    if !this.is_running() {
                        break;
                    }
                    this.process();
                }
            }
        });

        // A stored permit from an earlier run can wake this loop spuriously;
        // re-checking `running` covers that.
        while self.is_running() {
            self.done.notified().await;
        }

        // The downloader may be interrupted mid-tick. The processor is given
        // the time to finish its current tick, so a commit never races a
        // shutdown.
        download.abort();
        let _ = process.await;

        info!("Block sync stopped at height {}", self.ledger.latest_block_number());
        Ok(())
    }

    /// Ends the current sync run, if one is in progress. Idempotent.
    pub fn stop(&self) {
        if self.running.compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
            self.done.notify_one();
        }
    }

    /// Callback for decoded messages arriving from the given peer.
    ///
    /// Returns `true` if the message belongs to the sync protocol and was
    /// consumed here; `false` lets the host dispatch it elsewhere. Blocks are
    /// only filed, never validated, on this path: whatever a peer sends is
    /// queued and judged by `validate_and_commit` in height order.
    pub fn on_message(&self, peer_ip: SocketAddr, message: Message) -> bool {
        if !self.is_running() {
            return false;
        }

        match message {
            Message::BlockResponse(response) => {
                match response.block {
                    Some(block) => {
                        trace!("Received block {} from '{peer_ip}'", block.number);
                        self.registry.lock().receive(*block);
                    }
                    // An empty response is dropped; the request times out.
                    None => trace!("Peer '{peer_ip}' does not have the requested block"),
                }
                true
            }
            // Reserved for header-first sync.
            Message::BlockHeader(..) => true,
            _ => false,
        }
    }
}

impl BlockSync {
    /// One downloader tick: reissue timed-out requests, then hand the
    /// smallest pending heights to a random sample of the idle peers.
    async fn download<C: CommunicationService>(&self, communication: &C) {
        let idle_peers = communication.idle_peers();
        trace!("Idle peers = {}", idle_peers.len());

        // A bounded, uniformly sampled subset spreads the load across peers.
        let peers: IndexSet<SocketAddr> =
            idle_peers.into_iter().choose_multiple(&mut rand::thread_rng(), MAX_BATCH_SIZE).into_iter().collect();

        // Assign heights under the lock; the sends happen after it is
        // released, as a send may block on the peer's outbound queue.
        let mut assignments = Vec::with_capacity(peers.len());
        {
            let mut registry = self.registry.lock();

            // Backpressure: too many unanswered requests already.
            if registry.num_in_flight() > MAX_BATCH_SIZE {
                return;
            }

            let reissued = registry.reap_timeouts(Instant::now(), MAX_DOWNLOAD_TIME);
            if !reissued.is_empty() {
                debug!("Re-queueing timed out block requests {}", rangify_heights(&reissued));
            }

            for peer_ip in peers {
                let Some(height) = registry.next_to_request() else {
                    break;
                };
                registry.mark_in_flight(height, Instant::now());
                assignments.push((peer_ip, height));
            }
        }

        for (peer_ip, height) in assignments {
            trace!("Requesting block {height} from '{peer_ip}'");
            let request = C::prepare_block_request(height);
            match communication.send(peer_ip, request).await {
                Some(receiver) => {
                    // Delivery is best effort: a request lost here is
                    // recovered by the timeout path, not retried in-tick.
                    tokio::spawn(async move {
                        match receiver.await {
                            Ok(Ok(())) => (),
                            Ok(Err(error)) => warn!("Failed to send block request to '{peer_ip}': {error}"),
                            Err(_) => warn!("Failed to send block request to '{peer_ip}': connection dropped"),
                        }
                    });
                }
                None => warn!("Failed to send block request to '{peer_ip}': no such peer"),
            }
        }
    }

    /// One processor tick: commit the next-in-order block, if it has arrived.
    /// A single block per tick keeps validation interleaved with download
    /// progress.
    fn process(&self) {
        let latest = self.ledger.latest_block_number();
        if latest + 1 >= self.target() {
            debug!("Reached the sync target at height {latest}");
            self.stop();
            return;
        }

        let Some(block) = self.registry.lock().take_next(latest) else {
            return;
        };
        let height = block.number;

        match self.validate_and_commit(&block) {
            Ok(()) => trace!("Committed block {height}"),
            Err(error) => {
                // The height goes back to the download queue so another peer
                // can serve a valid block for it.
                warn!("Block {height} failed validation - {error}");
                self.registry.lock().reinsert(height);
            }
        }
    }

    /// Validates the given block against the chain tip and consensus rules,
    /// and commits it together with its state mutations.
    ///
    /// Checks run in order: chain linkage, transaction replay on tracked
    /// overlays, precommit quorum and vote authenticity against the validator
    /// set, then the block reward. The first failure returns an error with
    /// nothing persisted; the overlays only fold back into the live stores
    /// after the block itself is appended.
    fn validate_and_commit(&self, block: &Block) -> Result<()> {
        let latest = self.ledger.latest_block();
        ensure!(
            block.number == latest.number + 1,
            "block {} does not extend the chain at height {}",
            block.number,
            latest.number
        );
        ensure!(block.prev_hash == latest.hash, "block {} does not link to the tip hash", block.number);

        let mut accounts = self.ledger.account_state().track();
        let mut delegates = self.ledger.delegate_state().track();

        let results = execute(&block.transactions, &mut accounts, &mut delegates, false);
        for (index, result) in results.iter().enumerate() {
            if let Some(error) = result.error() {
                bail!("transaction {index} of block {} was rejected - {error}", block.number);
            }
        }

        // The validator set is read through the overlay, after replay.
        let validators = delegates.validators();
        let quorum = quorum_threshold(validators.len());
        ensure!(
            block.votes.len() >= quorum,
            "block {} carries {} votes, quorum is {quorum}",
            block.number,
            block.votes.len()
        );

        let validator_addresses: HashSet<Address> =
            validators.into_iter().map(|delegate| delegate.address).collect();
        let payload = Vote::precommit_approve(block.hash, block.number, block.view).encode();

        // Quorum is counted over distinct voters, so repeating one validator's
        // signature cannot substitute for breadth.
        let mut voters: HashSet<Address> = HashSet::with_capacity(block.votes.len());
        for signature in &block.votes {
            let voter = signature.signer_address();
            ensure!(
                validator_addresses.contains(&voter),
                "block {} carries a vote from non-validator {voter}",
                block.number
            );
            ensure!(
                crypto::verify(&payload, signature),
                "block {} carries an invalid precommit signature from {voter}",
                block.number
            );
            voters.insert(voter);
        }
        ensure!(
            voters.len() >= quorum,
            "block {} has {} distinct voters, quorum is {quorum}",
            block.number,
            voters.len()
        );

        let reward = block_reward(block.number);
        if reward > 0 {
            let coinbase = accounts.get_mut(block.coinbase);
            coinbase.balance = coinbase.balance.saturating_add(reward);
        }

        self.ledger.add_block(block.clone())?;
        accounts.commit();
        delegates.commit();
        Ok(())
    }
}

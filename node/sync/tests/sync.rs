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

//! End-to-end runs of the sync engine against scripted peers, driven under
//! virtual time so that download intervals and timeouts elapse instantly.

use meridian_ledger::{
    test_helpers::{make_block, sample_chain},
    Block, Keypair,
};
use meridian_node_communication_service::test_helpers::DummyCommunicationService;
use meridian_node_ledger_service::MemoryLedgerService;
use meridian_node_messages::{BlockResponse, Message};
use meridian_node_sync::BlockSync;

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tokio::{task::JoinHandle, time::sleep};

/// Returns the peer address with the given id.
fn sample_peer_ip(id: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), id)
}

/// Builds the canonical blocks `1..=count` on top of `genesis`.
fn build_canonical(genesis: &Block, count: u64, keys: &[Keypair]) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(count as usize);
    let mut parent = genesis.clone();
    for _ in 0..count {
        let block = make_block(&parent, Vec::new(), 0, keys);
        parent = block.clone();
        blocks.push(block);
    }
    blocks
}

/// Spawns `start(..)` towards the given target.
fn spawn_start(
    sync: &Arc<BlockSync>,
    communication: &Arc<DummyCommunicationService>,
    target: u64,
) -> JoinHandle<anyhow::Result<()>> {
    let sync = sync.clone();
    let communication = communication.clone();
    tokio::spawn(async move { sync.start(communication, target).await })
}

/// Answers every recorded request from the canonical chain until the run
/// completes.
async fn serve_until_complete(
    sync: &Arc<BlockSync>,
    communication: &Arc<DummyCommunicationService>,
    canonical: &[Block],
    target: u64,
) {
    let handle = spawn_start(sync, communication, target);
    while !handle.is_finished() {
        sleep(Duration::from_millis(100)).await;
        for (peer_ip, height) in communication.drain_requests() {
            let block = canonical[height as usize - 1].clone();
            sync.on_message(peer_ip, Message::BlockResponse(BlockResponse::some(block)));
        }
    }
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_sync_to_completion_and_restart() {
    let (chain, keys) = sample_chain(4);
    let canonical = build_canonical(&chain.latest_block(), 9, &keys);

    let sync = Arc::new(BlockSync::new(Arc::new(MemoryLedgerService::from_chain(chain))));
    let communication = Arc::new(DummyCommunicationService::default());
    communication.set_idle_peers((1..=3).map(sample_peer_ip).collect());

    // First run: sync heights 1..=4.
    serve_until_complete(&sync, &communication, &canonical, 5).await;
    assert_eq!(sync.ledger_height(), 4);
    assert!(!sync.is_running());
    assert_eq!(sync.num_pending_downloads(), 0);
    assert_eq!(sync.num_inflight_requests(), 0);
    assert_eq!(sync.num_queued_blocks(), 0);

    // Second run: the engine restarts cleanly towards a higher target.
    serve_until_complete(&sync, &communication, &canonical, 10).await;
    assert_eq!(sync.ledger_height(), 9);
    assert!(!sync.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_request_is_reissued() {
    let (chain, keys) = sample_chain(4);
    let canonical = build_canonical(&chain.latest_block(), 1, &keys);

    let sync = Arc::new(BlockSync::new(Arc::new(MemoryLedgerService::from_chain(chain))));
    let communication = Arc::new(DummyCommunicationService::default());
    communication.set_idle_peers(vec![sample_peer_ip(1)]);

    let handle = spawn_start(&sync, &communication, 2);

    // The peer drops the first request for height 1 on the floor and only
    // answers re-requests, which arrive after the download timeout.
    let mut num_requests = 0;
    while !handle.is_finished() {
        sleep(Duration::from_secs(1)).await;
        for (peer_ip, height) in communication.drain_requests() {
            assert_eq!(height, 1);
            num_requests += 1;
            if num_requests > 1 {
                let block = canonical[0].clone();
                sync.on_message(peer_ip, Message::BlockResponse(BlockResponse::some(block)));
            }
        }
    }
    handle.await.unwrap().unwrap();

    assert!(num_requests >= 2, "expected a reissued request, saw {num_requests}");
    assert_eq!(sync.ledger_height(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_is_exclusive() {
    let (chain, _) = sample_chain(4);
    let sync = Arc::new(BlockSync::new(Arc::new(MemoryLedgerService::from_chain(chain))));
    let communication = Arc::new(DummyCommunicationService::default());

    // No peers answer, so the first run parks until stopped.
    let handle = spawn_start(&sync, &communication, 5);
    sleep(Duration::from_millis(600)).await;
    assert!(sync.is_running());

    // A concurrent second run is refused.
    assert!(sync.start(communication.clone(), 7).await.is_err());
    assert!(sync.is_running());

    sync.stop();
    handle.await.unwrap().unwrap();
    assert!(!sync.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_start_with_nothing_to_sync_returns_immediately() {
    let (chain, _) = sample_chain(4);
    let sync = Arc::new(BlockSync::new(Arc::new(MemoryLedgerService::from_chain(chain))));
    let communication = Arc::new(DummyCommunicationService::default());

    // The tip is 0; a target of 1 leaves nothing to fetch.
    sync.start(communication, 1).await.unwrap();
    assert!(!sync.is_running());
    assert_eq!(sync.ledger_height(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_late_blocks_after_completion_are_unhandled() {
    let (chain, keys) = sample_chain(4);
    let canonical = build_canonical(&chain.latest_block(), 2, &keys);

    let sync = Arc::new(BlockSync::new(Arc::new(MemoryLedgerService::from_chain(chain))));
    let communication = Arc::new(DummyCommunicationService::default());
    communication.set_idle_peers(vec![sample_peer_ip(1)]);

    serve_until_complete(&sync, &communication, &canonical, 2).await;
    assert_eq!(sync.ledger_height(), 1);

    // A straggling response arrives after the run ended.
    let message = Message::BlockResponse(BlockResponse::some(canonical[1].clone()));
    assert!(!sync.on_message(sample_peer_ip(1), message));
    assert_eq!(sync.num_queued_blocks(), 0);
}

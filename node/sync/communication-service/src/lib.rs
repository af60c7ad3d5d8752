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

#[macro_use]
extern crate async_trait;

use std::{io, net::SocketAddr};
use tokio::sync::oneshot;

/// Abstract communication service.
///
/// Implemented by the peer/channel manager of the host node; the sync engine
/// uses it to discover idle peers and issue block requests to them.
#[async_trait]
pub trait CommunicationService: Send + Sync {
    /// The message type used by this communication service.
    type Message: Clone + Send + 'static;

    /// Generates the service-specific message requesting the block at `height`.
    fn prepare_block_request(height: u64) -> Self::Message;

    /// Returns the peers whose outbound channel is currently idle.
    fn idle_peers(&self) -> Vec<SocketAddr>;

    /// Sends the given message to the specified peer.
    ///
    /// This function returns as soon as the message is queued to be sent,
    /// without waiting for the actual delivery; instead, the caller is provided
    /// with a [`oneshot::Receiver`] which can be used to determine when and
    /// whether the message has been delivered.
    /// If no peer with the given address exists, this function returns None.
    async fn send(&self, peer_ip: SocketAddr, message: Self::Message) -> Option<oneshot::Receiver<io::Result<()>>>;
}

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use super::*;

    use parking_lot::Mutex;

    /// A communication service that records every request instead of sending
    /// it, so tests can script the peer side.
    #[derive(Default)]
    pub struct DummyCommunicationService {
        /// The peers reported as idle.
        idle: Mutex<Vec<SocketAddr>>,
        /// Every (peer, height) request handed to `send`.
        sent: Mutex<Vec<(SocketAddr, u64)>>,
    }

    impl DummyCommunicationService {
        /// Sets the list of idle peers.
        pub fn set_idle_peers(&self, peers: Vec<SocketAddr>) {
            *self.idle.lock() = peers;
        }

        /// Removes and returns the requests recorded so far.
        pub fn drain_requests(&self) -> Vec<(SocketAddr, u64)> {
            std::mem::take(&mut *self.sent.lock())
        }

        /// Returns the number of requests recorded so far.
        pub fn num_requests(&self) -> usize {
            self.sent.lock().len()
        }
    }

    #[async_trait]
    impl CommunicationService for DummyCommunicationService {
        /// The requested height stands in for a full wire message.
        type Message = u64;

        fn prepare_block_request(height: u64) -> Self::Message {
            height
        }

        fn idle_peers(&self) -> Vec<SocketAddr> {
            self.idle.lock().clone()
        }

        async fn send(&self, peer_ip: SocketAddr, message: Self::Message) -> Option<oneshot::Receiver<io::Result<()>>> {
            self.sent.lock().push((peer_ip, message));
            let (sender, receiver) = oneshot::channel();
            // Every queued message is reported as delivered.
            let _ = sender.send(Ok(()));
            Some(receiver)
        }
    }
}

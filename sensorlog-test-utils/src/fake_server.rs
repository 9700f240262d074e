// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Scripted channel server running on the in-memory transport.

use parking_lot::Mutex;
use sensorlog_channel::memory::{self, MemoryAcceptor, MemoryConnector, MemoryPeer};
use sensorlog_channel::message::{
    EVENT_HEARTBEAT, EVENT_JOIN, EVENT_LEAVE, EVENT_REPLY, TOPIC_PHOENIX,
};
use sensorlog_channel::{Message, ProtocolVersion};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// How the server answers `phx_join`.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinPolicy {
    Accept,
    Reject(Value),
    /// Never reply, so the client times out.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct FakeServerConfig {
    pub join: JoinPolicy,
    /// Reply `ok` to ordinary pushes instead of staying silent.
    pub ack_pushes: bool,
    pub version: ProtocolVersion,
}

impl Default for FakeServerConfig {
    fn default() -> Self {
        Self {
            join: JoinPolicy::Accept,
            ack_pushes: false,
            version: ProtocolVersion::V1,
        }
    }
}

/// A client message as seen by the server, stamped with the (possibly paused) tokio clock.
#[derive(Debug, Clone)]
pub struct Received {
    pub message: Message,
    pub at: Instant,
}

/// In-memory stand-in for a channel endpoint.
///
/// Heartbeats are answered and counted but not recorded; every other client
/// message shows up in [`FakeServer::received`].
pub struct FakeServer {
    received: UnboundedReceiverStream<Received>,
    urls: Arc<Mutex<Vec<String>>>,
    heartbeats: Arc<AtomicUsize>,
    broadcasts: mpsc::UnboundedSender<Message>,
    hang_up: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl FakeServer {
    /// Start a server that accepts every join.
    pub fn start() -> (MemoryConnector, Self) {
        Self::start_with(FakeServerConfig::default())
    }

    pub fn start_with(config: FakeServerConfig) -> (MemoryConnector, Self) {
        let (connector, acceptor) = memory::pair();
        let (received_tx, received_rx) = mpsc::unbounded_channel();
        let (broadcasts_tx, broadcasts_rx) = mpsc::unbounded_channel();
        let (hang_up_tx, hang_up_rx) = mpsc::unbounded_channel();
        let urls = Arc::new(Mutex::new(Vec::new()));
        let heartbeats = Arc::new(AtomicUsize::new(0));

        let state = ServerState {
            config,
            received: received_tx,
            urls: urls.clone(),
            heartbeats: heartbeats.clone(),
            broadcasts: broadcasts_rx,
            hang_up: hang_up_rx,
        };
        let task = tokio::spawn(state.serve(acceptor));

        let server = Self {
            received: UnboundedReceiverStream::new(received_rx),
            urls,
            heartbeats,
            broadcasts: broadcasts_tx,
            hang_up: hang_up_tx,
            task,
        };
        (connector, server)
    }

    /// Every client message except heartbeats, in arrival order.
    pub fn received(&mut self) -> &mut UnboundedReceiverStream<Received> {
        &mut self.received
    }

    /// Wait for the next recorded message.
    ///
    /// # Panics
    /// If nothing arrives within `timeout_ms`.
    pub async fn expect_next(&mut self, timeout_ms: u64) -> Received {
        timeout(Duration::from_millis(timeout_ms), self.received.next())
            .await
            .expect("timed out waiting for a client message")
            .expect("fake server stopped")
    }

    /// Wait for the next recorded message with the given event, skipping others.
    ///
    /// # Panics
    /// If no such message arrives within `timeout_ms`.
    pub async fn expect_event(&mut self, event: &str, timeout_ms: u64) -> Received {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let next = tokio::time::timeout_at(deadline, self.received.next())
                .await
                .unwrap_or_else(|_| panic!("timed out waiting for {event}"))
                .expect("fake server stopped");
            if next.message.event == event {
                return next;
            }
        }
    }

    /// URLs clients connected with, in order.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }

    pub fn heartbeats(&self) -> usize {
        self.heartbeats.load(Ordering::SeqCst)
    }

    /// Send a server-initiated message to the connected client.
    pub fn broadcast(&self, topic: &str, event: &str, payload: Value) {
        let _ = self.broadcasts.send(Message::new(topic, event, payload));
    }

    /// Drop the current client connection from the server side.
    pub fn hang_up(&self) {
        let _ = self.hang_up.send(());
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct ServerState {
    config: FakeServerConfig,
    received: mpsc::UnboundedSender<Received>,
    urls: Arc<Mutex<Vec<String>>>,
    heartbeats: Arc<AtomicUsize>,
    broadcasts: mpsc::UnboundedReceiver<Message>,
    hang_up: mpsc::UnboundedReceiver<()>,
}

impl ServerState {
    async fn serve(mut self, mut acceptor: MemoryAcceptor) {
        while let Some(peer) = acceptor.accept().await {
            self.urls.lock().push(peer.url().to_string());
            self.serve_peer(peer).await;
        }
    }

    async fn serve_peer(&mut self, mut peer: MemoryPeer) {
        loop {
            select! {
                frame = peer.recv() => {
                    let Some(frame) = frame else { return };
                    self.handle_frame(&peer, &frame);
                }
                Some(message) = self.broadcasts.recv() => {
                    if let Ok(frame) = self.config.version.encode(&message) {
                        let _ = peer.send(frame);
                    }
                }
                Some(()) = self.hang_up.recv() => {
                    peer.close();
                    return;
                }
            }
        }
    }

    fn handle_frame(&self, peer: &MemoryPeer, frame: &str) {
        let Ok(message) = self.config.version.decode(frame) else {
            return;
        };

        if message.topic == TOPIC_PHOENIX && message.event == EVENT_HEARTBEAT {
            self.heartbeats.fetch_add(1, Ordering::SeqCst);
            self.reply(peer, &message, "ok", json!({}));
            return;
        }

        match message.event.as_str() {
            EVENT_JOIN => match &self.config.join {
                JoinPolicy::Accept => self.reply(peer, &message, "ok", json!({})),
                JoinPolicy::Reject(response) => {
                    self.reply(peer, &message, "error", response.clone());
                }
                JoinPolicy::Ignore => {}
            },
            EVENT_LEAVE => self.reply(peer, &message, "ok", json!({})),
            _ if self.config.ack_pushes => self.reply(peer, &message, "ok", json!({})),
            _ => {}
        }

        let _ = self.received.send(Received {
            message,
            at: Instant::now(),
        });
    }

    fn reply(&self, peer: &MemoryPeer, to: &Message, status: &str, response: Value) {
        let reply = Message {
            topic: to.topic.clone(),
            event: EVENT_REPLY.to_string(),
            payload: json!({ "status": status, "response": response }),
            msg_ref: to.msg_ref.clone(),
            join_ref: to.join_ref.clone(),
        };
        if let Ok(frame) = self.config.version.encode(&reply) {
            let _ = peer.send(frame);
        }
    }
}

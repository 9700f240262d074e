// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! In-process transport.
//!
//! [`pair`] returns a connector for the client side and an acceptor for the
//! server side. Every successful `connect` hands one [`MemoryPeer`] to the
//! acceptor, which then sees the exact text frames the socket writes.
//!
//! ```
//! use sensorlog_channel::memory;
//! use sensorlog_channel::Connector;
//!
//! # #[tokio::main]
//! # async fn main() -> sensorlog_error::Result<()> {
//! let (connector, mut acceptor) = memory::pair();
//! let (_sink, _stream) = connector.connect("memory://logger?id=1").await?;
//!
//! let peer = acceptor.accept().await.expect("peer");
//! assert_eq!(peer.url(), "memory://logger?id=1");
//! # Ok(())
//! # }
//! ```

use crate::transport::{Connector, FrameSink, FrameStream};
use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::{SinkExt, StreamExt};
use sensorlog_error::{Result, SensorLogError};
use tokio::sync::mpsc;

pub fn pair() -> (MemoryConnector, MemoryAcceptor) {
    let (peers_tx, peers_rx) = mpsc::unbounded_channel();
    (
        MemoryConnector { peers: peers_tx },
        MemoryAcceptor { peers: peers_rx },
    )
}

#[derive(Debug, Clone)]
pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<MemoryPeer>,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream)> {
        let (client_tx, server_rx) = unbounded::<String>();
        let (server_tx, client_rx) = unbounded::<String>();

        let peer = MemoryPeer {
            url: url.to_string(),
            incoming: server_rx,
            outgoing: server_tx,
        };
        self.peers
            .send(peer)
            .map_err(|_| SensorLogError::connection(url, "no acceptor is listening"))?;

        let sink = client_tx.sink_map_err(|err| SensorLogError::transport(err.to_string()));
        let stream = client_rx.map(Ok::<String, SensorLogError>);
        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

#[derive(Debug)]
pub struct MemoryAcceptor {
    peers: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryAcceptor {
    /// Wait for the next client connection. `None` once every connector is dropped.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.peers.recv().await
    }
}

/// Server end of one in-process connection.
#[derive(Debug)]
pub struct MemoryPeer {
    url: String,
    incoming: UnboundedReceiver<String>,
    outgoing: UnboundedSender<String>,
}

impl MemoryPeer {
    /// URL the client connected with, including query params.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Next frame written by the client. `None` once the client hangs up.
    pub async fn recv(&mut self) -> Option<String> {
        self.incoming.next().await
    }

    /// Send a frame to the client.
    ///
    /// # Errors
    /// Returns `SensorLogError::ChannelClosed` if the client side is gone.
    pub fn send(&self, frame: impl Into<String>) -> Result<()> {
        self.outgoing
            .unbounded_send(frame.into())
            .map_err(|_| SensorLogError::ChannelClosed)
    }

    /// Close the server side; the client's frame stream ends.
    pub fn close(self) {
        self.outgoing.close_channel();
    }
}

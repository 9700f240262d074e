// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities for the sensorlog workspace.
//!
//! The centerpiece is [`FakeServer`], a scripted channel endpoint running on
//! the in-memory transport. Tests connect a real [`Socket`] to it and then
//! assert on the frames the server received.
//!
//! ```rust
//! use sensorlog_channel::{Socket, SocketOptions};
//! use sensorlog_test_utils::FakeServer;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (connector, mut server) = FakeServer::start();
//! let socket = Socket::new("memory://sockets/logger", SocketOptions::default());
//! socket.connect(&connector).await?;
//!
//! let mut channel = socket.channel("loggers:7", json!({}));
//! assert!(channel.join().await?.is_ok());
//! assert_eq!(server.expect_next(100).await.message.event, "phx_join");
//! # Ok(())
//! # }
//! ```
//!
//! Join behaviour is scripted through [`FakeServerConfig`] and [`JoinPolicy`].
//! Assertion helpers live in [`helpers`].

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

pub mod fake_server;
pub mod helpers;

pub use fake_server::{FakeServer, FakeServerConfig, JoinPolicy, Received};
pub use helpers::{assert_no_element_emitted, unwrap_stream};

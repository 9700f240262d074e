// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # sensorlog-channel
//!
//! Client side of a Phoenix-style real-time channel protocol.
//!
//! A [`Socket`] owns one transport connection. Any number of [`Channel`]s
//! multiplex topics over it. Joining, leaving and pushing each produce a
//! [`Push`], whose [`Push::receive`] resolves to the server's [`Reply`]
//! (or a locally produced timeout).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensorlog_channel::{Socket, SocketOptions, WebSocketConnector};
//! use serde_json::json;
//!
//! # async fn run() -> sensorlog_error::Result<()> {
//! let options = SocketOptions::default()
//!     .with_param("id", "42")
//!     .with_param("password", "secret");
//! let socket = Socket::new("ws://localhost:4000/sockets/logger/websocket", options);
//! socket.connect(&WebSocketConnector).await?;
//!
//! let mut channel = socket.channel("loggers:42", json!({}));
//! channel.join().await?;
//! channel.push("new_log", json!({ "measurements": [] }))?;
//! channel.leave().await?;
//! socket.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod memory;
pub mod message;
pub mod push;
pub mod reply;
pub mod socket;
pub mod transport;
pub mod websocket;

pub use channel::{Channel, ChannelState};
pub use message::{Message, ProtocolVersion};
pub use push::Push;
pub use reply::{Reply, ReplyStatus};
pub use socket::{Socket, SocketOptions};
pub use transport::{Connector, FrameSink, FrameStream};
pub use websocket::WebSocketConnector;

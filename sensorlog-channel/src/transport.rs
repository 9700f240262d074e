// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Transport seam between a [`Socket`](crate::Socket) and the wire.
//!
//! A transport is a pair of text-frame halves. The socket driver owns both
//! halves for the lifetime of the connection, so implementations never need
//! interior locking.

use async_trait::async_trait;
use core::pin::Pin;
use futures::{Sink, Stream};
use sensorlog_error::{Result, SensorLogError};

/// Outgoing half of a transport.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = SensorLogError> + Send>>;

/// Incoming half of a transport. The stream ends when the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Opens transports to a URL.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to `url`, which already carries the socket params.
    ///
    /// # Errors
    /// Returns `SensorLogError::Connection` when the endpoint is unreachable.
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream)>;
}

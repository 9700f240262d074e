// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::reply::Reply;
use sensorlog_error::{Result, SensorLogError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

/// A message already handed to the socket, waiting for its reply.
///
/// Dropping a `Push` without awaiting it is fine: the message is still sent,
/// the reply is simply discarded.
#[derive(Debug)]
pub struct Push {
    event: String,
    reply: oneshot::Receiver<Reply>,
    timeout: Duration,
}

impl Push {
    pub(crate) fn new(event: String, reply: oneshot::Receiver<Reply>, timeout: Duration) -> Self {
        Self {
            event,
            reply,
            timeout,
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Wait for the server's reply.
    ///
    /// Resolves to [`Reply::timeout`] if nothing arrives within the socket
    /// timeout.
    ///
    /// # Errors
    /// Returns `SensorLogError::ChannelClosed` if the socket shut down first.
    pub async fn receive(self) -> Result<Reply> {
        match timeout(self.timeout, self.reply).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(SensorLogError::ChannelClosed),
            Err(_) => Ok(Reply::timeout()),
        }
    }
}

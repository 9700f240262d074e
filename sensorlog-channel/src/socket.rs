// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Socket handle and connection lifecycle.
//!
//! A [`Socket`] is a cheap, cloneable handle. Connecting spawns one driver
//! task that owns the transport; every other operation talks to the driver
//! through an unbounded command queue.

mod driver;

use crate::channel::Channel;
use crate::message::{Message, ProtocolVersion};
use crate::push::Push;
use crate::reply::Reply;
use crate::transport::Connector;
use driver::Driver;
use parking_lot::Mutex;
use sensorlog_error::{Result, SensorLogError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::form_urlencoded;

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection parameters and timing for a [`Socket`].
#[derive(Debug, Clone, PartialEq)]
pub struct SocketOptions {
    /// Sent as URL query parameters when connecting.
    pub params: BTreeMap<String, String>,
    pub heartbeat_interval: Duration,
    /// How long a push waits for its reply.
    pub timeout: Duration,
    pub version: ProtocolVersion,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            params: BTreeMap::new(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            version: ProtocolVersion::default(),
        }
    }
}

impl SocketOptions {
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }
}

pub(crate) enum Command {
    Send {
        message: Message,
        reply: Option<oneshot::Sender<Reply>>,
    },
    Subscribe {
        topic: String,
        inbound: mpsc::UnboundedSender<Message>,
    },
    Unsubscribe {
        topic: String,
    },
}

struct Connection {
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    driver: JoinHandle<()>,
}

struct Inner {
    endpoint: String,
    options: SocketOptions,
    refs: Arc<AtomicU64>,
    connection: Mutex<Option<Connection>>,
}

/// Handle to one real-time connection.
#[derive(Clone)]
pub struct Socket {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("endpoint", &self.inner.endpoint)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Socket {
    pub fn new(endpoint: impl Into<String>, options: SocketOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                endpoint: endpoint.into(),
                options,
                refs: Arc::new(AtomicU64::new(0)),
                connection: Mutex::new(None),
            }),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn options(&self) -> &SocketOptions {
        &self.inner.options
    }

    /// Endpoint with the socket params and serializer version appended as a query string.
    pub fn endpoint_url(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.inner.options.params {
            query.append_pair(key, value);
        }
        query.append_pair("vsn", self.inner.options.version.vsn());

        let separator = if self.inner.endpoint.contains('?') {
            '&'
        } else {
            '?'
        };
        format!("{}{separator}{}", self.inner.endpoint, query.finish())
    }

    /// Open the transport and start the driver task.
    ///
    /// # Errors
    /// Returns `InvalidState` if already connected or the heartbeat interval is
    /// zero, or whatever the connector reports when the endpoint cannot be reached.
    pub async fn connect<C>(&self, connector: &C) -> Result<()>
    where
        C: Connector + ?Sized,
    {
        if self.is_connected() {
            return Err(SensorLogError::invalid_state("socket is already connected"));
        }
        if self.inner.options.heartbeat_interval.is_zero() {
            return Err(SensorLogError::invalid_state("heartbeat interval must be non-zero"));
        }

        let url = self.endpoint_url();
        debug!(kind = "transport", url = %self.inner.endpoint, "connecting");
        let (sink, stream) = connector.connect(&url).await?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let driver = Driver::new(
            self.inner.options.version,
            self.inner.options.heartbeat_interval,
            self.inner.refs.clone(),
            sink,
            stream,
            commands_rx,
        );
        let handle = tokio::spawn(driver.run(cancel.clone()));

        let mut slot = self.inner.connection.lock();
        if slot.is_some() {
            // Lost a race against a concurrent connect.
            cancel.cancel();
            return Err(SensorLogError::invalid_state("socket is already connected"));
        }
        *slot = Some(Connection {
            commands: commands_tx,
            cancel,
            driver: handle,
        });
        info!(endpoint = %self.inner.endpoint, "socket connected");
        Ok(())
    }

    /// True while the driver task is alive.
    pub fn is_connected(&self) -> bool {
        self.inner
            .connection
            .lock()
            .as_ref()
            .is_some_and(|connection| !connection.commands.is_closed())
    }

    /// Stop the driver and close the transport. Idempotent.
    pub async fn disconnect(&self) {
        let connection = self.inner.connection.lock().take();
        if let Some(connection) = connection {
            connection.cancel.cancel();
            let _ = connection.driver.await;
            info!(endpoint = %self.inner.endpoint, "socket disconnected");
        }
    }

    /// Create a channel handle for `topic`. Nothing is sent until [`Channel::join`].
    pub fn channel(&self, topic: impl Into<String>, params: Value) -> Channel {
        Channel::new(self.clone(), topic.into(), params)
    }

    /// Next message reference. Unique per socket.
    pub fn make_ref(&self) -> String {
        next_ref(&self.inner.refs)
    }

    /// Queue a message and return a handle to its reply.
    pub(crate) fn send(&self, message: Message) -> Result<Push> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let event = message.event.clone();
        self.command(Command::Send {
            message,
            reply: Some(reply_tx),
        })?;
        Ok(Push::new(event, reply_rx, self.inner.options.timeout))
    }

    pub(crate) fn subscribe(&self, topic: &str) -> Result<mpsc::UnboundedReceiver<Message>> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        self.command(Command::Subscribe {
            topic: topic.to_string(),
            inbound: inbound_tx,
        })?;
        Ok(inbound_rx)
    }

    pub(crate) fn unsubscribe(&self, topic: &str) {
        let _ = self.command(Command::Unsubscribe {
            topic: topic.to_string(),
        });
    }

    fn command(&self, command: Command) -> Result<()> {
        let slot = self.inner.connection.lock();
        let connection = slot.as_ref().ok_or(SensorLogError::ChannelClosed)?;
        connection
            .commands
            .send(command)
            .map_err(|_| SensorLogError::ChannelClosed)
    }
}

pub(crate) fn next_ref(refs: &AtomicU64) -> String {
    (refs.fetch_add(1, Ordering::Relaxed) + 1).to_string()
}

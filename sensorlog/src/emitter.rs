// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The reading emitter: connect, join, emit on a timer, stop.

mod emission;

use crate::clock::{Clock, MonotonicStamps, SystemClock};
use crate::config::LoggerConfig;
use crate::reading::LogBatch;
use crate::value_source::{RandomValues, ValueSource};
use emission::{BatchBuilder, Emission};
use parking_lot::Mutex;
use sensorlog_channel::{Connector, ReplyStatus, Socket, WebSocketConnector};
use sensorlog_error::{Result, SensorLogError};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

struct Logging {
    emission: Arc<Emission>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Simulated logger that pushes one batch of readings per interval.
///
/// ```rust,no_run
/// use sensorlog::ReadingEmitter;
/// use std::time::Duration;
///
/// # async fn run() -> sensorlog_error::Result<()> {
/// let mut emitter = ReadingEmitter::init("42", ["temp-1", "temp-2"], Some(Duration::from_millis(500)));
/// emitter.connect("secret").await?;
/// emitter.start().await?;
/// tokio::time::sleep(Duration::from_secs(5)).await;
/// emitter.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct ReadingEmitter {
    config: LoggerConfig,
    builder: Arc<Mutex<BatchBuilder>>,
    sent: Arc<AtomicU64>,
    socket: Option<Socket>,
    logging: Option<Logging>,
}

impl ReadingEmitter {
    /// Store identity, sensors and interval. Nothing is validated.
    pub fn init<I, S>(id: impl Into<String>, sensor_ids: I, delay: Option<Duration>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = LoggerConfig::new(id, sensor_ids);
        if let Some(delay) = delay {
            config = config.with_delay(delay);
        }
        Self::from_config(&config)
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        let source = match config.seed {
            Some(seed) => RandomValues::seeded(seed, config.value_max),
            None => RandomValues::new(config.value_max),
        };
        let builder = BatchBuilder {
            sensor_ids: config.sensor_ids.clone(),
            metadata: config.metadata.clone(),
            source: Box::new(source),
            clock: Box::new(SystemClock),
            stamps: MonotonicStamps::default(),
        };
        Self {
            config: config.clone(),
            builder: Arc::new(Mutex::new(builder)),
            sent: Arc::new(AtomicU64::new(0)),
            socket: None,
            logging: None,
        }
    }

    #[must_use]
    pub fn with_value_source(self, source: impl ValueSource + 'static) -> Self {
        self.builder.lock().source = Box::new(source);
        self
    }

    #[must_use]
    pub fn with_clock(self, clock: impl Clock + 'static) -> Self {
        self.builder.lock().clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.socket.as_ref().is_some_and(Socket::is_connected)
    }

    pub fn is_logging(&self) -> bool {
        self.logging
            .as_ref()
            .is_some_and(|logging| !logging.task.is_finished())
    }

    /// Batches pushed since this emitter was created.
    pub fn batches_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Open a WebSocket session to the configured endpoint.
    ///
    /// # Errors
    /// See [`ReadingEmitter::connect_with`].
    pub async fn connect(&mut self, password: &str) -> Result<()> {
        self.connect_with(password, &WebSocketConnector).await
    }

    /// Open a session through `connector`, passing identity and credential as params.
    ///
    /// # Errors
    /// `InvalidState` if already connected, otherwise whatever the transport reports.
    pub async fn connect_with<C>(&mut self, password: &str, connector: &C) -> Result<()>
    where
        C: Connector + ?Sized,
    {
        if self.is_connected() {
            return Err(SensorLogError::invalid_state("logger is already connected"));
        }

        let socket = Socket::new(&self.config.endpoint, self.config.socket_options(password));
        socket.connect(connector).await?;
        info!(id = %self.config.id, endpoint = %self.config.endpoint, "logger connected");
        self.socket = Some(socket);
        Ok(())
    }

    /// Join `loggers:<id>` and, once the server acknowledges, start emitting.
    ///
    /// # Errors
    /// `InvalidState` when not connected or already logging, `JoinRejected`
    /// or `Timeout` when the join is not acknowledged.
    pub async fn start(&mut self) -> Result<()> {
        if self.is_logging() {
            return Err(SensorLogError::invalid_state("logger is already running"));
        }
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| SensorLogError::invalid_state("logger is not connected"))?;

        let topic = self.config.topic();
        let mut channel = socket.channel(topic.clone(), json!({}));
        let reply = channel.join().await?;
        match reply.status {
            ReplyStatus::Ok => {}
            ReplyStatus::Error => {
                return Err(SensorLogError::join_rejected(topic, reply.response.to_string()));
            }
            ReplyStatus::Timeout => {
                return Err(SensorLogError::timeout(
                    format!("join {topic}"),
                    socket.options().timeout,
                ));
            }
        }

        let emission = Arc::new(Emission {
            channel,
            builder: self.builder.clone(),
            sent: self.sent.clone(),
        });
        let cancel = CancellationToken::new();
        let task = tokio::spawn(emission.clone().run(self.config.delay(), cancel.clone()));
        self.logging = Some(Logging {
            emission,
            cancel,
            task,
        });
        info!(topic = %topic, sensors = self.config.sensor_ids.len(), "logging started");
        Ok(())
    }

    /// Build and push one batch right now, outside the timer.
    ///
    /// Returns `None` when the logger is not running.
    ///
    /// # Errors
    /// `ChannelClosed` if the socket went away.
    pub fn emit_once(&self) -> Result<Option<LogBatch>> {
        match &self.logging {
            Some(logging) => logging.emission.emit_once().map(Some),
            None => Ok(None),
        }
    }

    /// Stop the emission loop and leave the topic. A no-op when not running.
    ///
    /// # Errors
    /// `ChannelClosed` if the socket died before the leave was acknowledged, or
    /// `UserError` if the emission task panicked. The topic is left and the
    /// logger is stopped either way.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(logging) = self.logging.take() else {
            return Ok(());
        };

        logging.cancel.cancel();
        let finished = logging.task.await;
        if let Err(err) = &finished {
            warn!(error = %err, "emission task did not finish cleanly");
        }

        let mut emission = Arc::try_unwrap(logging.emission)
            .map_err(|_| SensorLogError::invalid_state("emission still shared after stop"))?;
        let reply = emission.channel.leave().await?;
        if reply.is_ok() {
            info!(topic = %emission.channel.topic(), sent = self.batches_sent(), "logging stopped");
        } else {
            warn!(topic = %emission.channel.topic(), status = reply.status.as_str(), "leave not acknowledged");
        }
        finished.map_err(SensorLogError::user_error)
    }

    /// Stop if running, then close the socket.
    ///
    /// # Errors
    /// Propagates the error from [`ReadingEmitter::stop`]; the socket is closed regardless.
    pub async fn disconnect(&mut self) -> Result<()> {
        let stopped = self.stop().await;
        if let Some(socket) = self.socket.take() {
            socket.disconnect().await;
        }
        stopped
    }
}

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::clock::{Clock, MonotonicStamps};
use crate::reading::{LogBatch, EVENT_NEW_LOG};
use crate::value_source::ValueSource;
use parking_lot::Mutex;
use sensorlog_channel::Channel;
use sensorlog_error::{Result, SensorLogError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

const MIN_DELAY: Duration = Duration::from_millis(1);

/// Produces one batch per call: a single value shared by every sensor, and a
/// timestamp strictly greater than the previous batch's.
pub(crate) struct BatchBuilder {
    pub(crate) sensor_ids: Vec<String>,
    pub(crate) metadata: String,
    pub(crate) source: Box<dyn ValueSource>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) stamps: MonotonicStamps,
}

impl BatchBuilder {
    pub(crate) fn next_batch(&mut self) -> LogBatch {
        let timestamp = self.stamps.next(self.clock.now_millis());
        let value = self.source.next_value();
        LogBatch::build(self.sensor_ids.iter().cloned(), timestamp, value, &self.metadata)
    }
}

/// A joined channel plus what is needed to fill it with readings.
pub(crate) struct Emission {
    pub(crate) channel: Channel,
    pub(crate) builder: Arc<Mutex<BatchBuilder>>,
    pub(crate) sent: Arc<AtomicU64>,
}

impl Emission {
    pub(crate) fn emit_once(&self) -> Result<LogBatch> {
        let batch = self.builder.lock().next_batch();
        let payload = serde_json::to_value(&batch)?;
        // Fire and forget: the endpoint does not acknowledge logs.
        let _push = self.channel.push(EVENT_NEW_LOG, payload)?;
        let total = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(topic = %self.channel.topic(), readings = batch.len(), total, "sent log batch");
        Ok(batch)
    }

    /// Emit immediately, then every `delay`, until cancelled or the socket goes away.
    ///
    /// A zero delay runs at the timer's one millisecond resolution.
    pub(crate) async fn run(self: Arc<Self>, delay: Duration, cancel: CancellationToken) {
        let delay = delay.max(MIN_DELAY);
        let mut ticker = interval(delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(topic = %self.channel.topic(), ?delay, "emission loop started");

        loop {
            select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => match self.emit_once() {
                    Ok(_) => {}
                    Err(SensorLogError::ChannelClosed) => {
                        warn!(topic = %self.channel.topic(), "socket closed, emission loop ending");
                        break;
                    }
                    Err(err) => {
                        warn!(topic = %self.channel.topic(), error = %err, "failed to send log batch");
                    }
                },
            }
        }

        debug!(topic = %self.channel.topic(), "emission loop stopped");
    }
}

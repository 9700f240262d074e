// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # sensorlog
//!
//! A simulated sensor logger. It connects to a real-time channel endpoint,
//! fabricates one reading per configured sensor on a fixed interval, and
//! pushes each tick's readings as a single `new_log` batch.
//!
//! ## Overview
//!
//! - [`ReadingEmitter`] drives the lifecycle: `init`, `connect`, `start`,
//!   `emit_once`, `stop`.
//! - [`LoggerConfig`] holds identity, sensors, interval and socket tuning, and
//!   loads from TOML.
//! - [`ValueSource`] and [`Clock`] are the seams for the simulated value and
//!   the wall-clock timestamp.
//!
//! All readings of one tick share the same value and timestamp; timestamps
//! strictly increase from tick to tick.

pub mod clock;
pub mod config;
pub mod emitter;
pub mod reading;
pub mod value_source;

pub use clock::{Clock, MonotonicStamps, SystemClock};
pub use config::LoggerConfig;
pub use emitter::ReadingEmitter;
pub use reading::{LogBatch, Reading, EVENT_NEW_LOG};
pub use value_source::{RandomValues, ValueSource};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogBatch, LoggerConfig, Reading, ReadingEmitter, ValueSource};
    pub use sensorlog_error::{Result, SensorLogError};
}

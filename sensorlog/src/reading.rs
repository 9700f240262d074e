// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Reading and batch types, in the shape the logger endpoint expects.

use serde::{Deserialize, Serialize};

/// Event name batches are pushed under.
pub const EVENT_NEW_LOG: &str = "new_log";

/// One simulated sensor measurement.
///
/// `timestamp` and `value` travel as strings on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    #[serde(with = "stringified")]
    pub timestamp: i64,
    #[serde(with = "stringified")]
    pub value: f64,
    pub metadata: String,
}

/// All readings produced by one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogBatch {
    pub measurements: Vec<Reading>,
}

impl LogBatch {
    /// One reading per sensor, all sharing `timestamp` and `value`.
    pub fn build<I, S>(sensor_ids: I, timestamp: i64, value: f64, metadata: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let measurements = sensor_ids
            .into_iter()
            .map(|sensor_id| Reading {
                sensor_id: sensor_id.into(),
                timestamp,
                value,
                metadata: metadata.to_string(),
            })
            .collect();
        Self { measurements }
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

mod stringified {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use chrono::Utc;

/// Wall clock in milliseconds since the Unix epoch.
pub trait Clock: Send {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Turns wall-clock samples into strictly increasing tick timestamps.
///
/// A sample that does not move past the previous stamp (same millisecond, or
/// the clock stepped back) is bumped to `previous + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicStamps {
    last: Option<i64>,
}

impl MonotonicStamps {
    pub fn next(&mut self, now: i64) -> i64 {
        let stamp = match self.last {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last = Some(stamp);
        stamp
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Windowing policy applied to every survey ping a session reads.
//!
//! Pings that fall outside the time window or the geographic bounds, that
//! follow the previous ping after too long a gap, or that move too slowly
//! are still delivered; the read status carries an [`Advisory`] the caller
//! may act on or ignore.

use std::fmt;

use serde::Serialize;

use crate::core::{local_distance, GeoBounds, Ping, StatusCode};

/// Non-fatal condition attached to a successfully read ping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "advisory", rename_all = "snake_case")]
pub enum Advisory {
    /// Ping time is before the start or after the end of the window.
    OutOfTime,
    /// Ping position is outside the geographic bounds.
    OutOfBounds,
    /// Time since the previous survey ping exceeds the maximum gap.
    TimeGap { gap_seconds: f64 },
    /// Ping speed (km/h) is below the minimum.
    SpeedTooLow { speed: f64 },
}

impl Advisory {
    pub fn status(&self) -> StatusCode {
        match self {
            Advisory::OutOfTime => StatusCode::OutOfTime,
            Advisory::OutOfBounds => StatusCode::OutOfBounds,
            Advisory::TimeGap { .. } => StatusCode::TimeGap,
            Advisory::SpeedTooLow { .. } => StatusCode::SpeedTooLow,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::OutOfTime => write!(f, "ping outside time window"),
            Advisory::OutOfBounds => write!(f, "ping outside geographic bounds"),
            Advisory::TimeGap { gap_seconds } => write!(f, "time gap of {gap_seconds:.3} s"),
            Advisory::SpeedTooLow { speed } => write!(f, "speed {speed:.3} km/h too low"),
        }
    }
}

/// Validated windowing parameters of an open session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingWindow {
    /// Window start, epoch seconds.
    pub start_d: f64,
    /// Window end, epoch seconds.
    pub end_d: f64,
    pub bounds: GeoBounds,
    /// Minimum speed, km/h.
    pub speed_min: f64,
    /// Maximum gap between consecutive survey pings, seconds.
    pub time_gap: f64,
}

/// The previous survey ping, as the window remembers it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowTracker {
    last: Option<(f64, f64, f64)>,
}

impl WindowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the previous survey ping.
    pub fn last_time_d(&self) -> Option<f64> {
        self.last.map(|(t, _, _)| t)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl PingWindow {
    /// Check a survey ping against the window.
    ///
    /// A zero speed is replaced by the speed derived from the previous
    /// survey ping. The first failing check wins, in the order time window,
    /// time gap, bounds, speed. The tracker always advances to this ping.
    pub fn apply(&self, tracker: &mut WindowTracker, ping: &mut Ping) -> Option<Advisory> {
        let previous = tracker.last.replace((ping.time_d, ping.longitude, ping.latitude));

        if ping.speed == 0.0 {
            if let Some((t0, lon0, lat0)) = previous {
                let dt = ping.time_d - t0;
                if dt > 0.0 {
                    let distance = local_distance(lon0, lat0, ping.longitude, ping.latitude);
                    ping.speed = 3.6 * distance / dt;
                }
            }
        }

        if ping.time_d < self.start_d || ping.time_d > self.end_d {
            return Some(Advisory::OutOfTime);
        }
        if let Some((t0, _, _)) = previous {
            let gap = ping.time_d - t0;
            if gap > self.time_gap {
                return Some(Advisory::TimeGap { gap_seconds: gap });
            }
        }
        if !self.bounds.contains(ping.longitude, ping.latitude) {
            return Some(Advisory::OutOfBounds);
        }
        if ping.speed < self.speed_min {
            return Some(Advisory::SpeedTooLow { speed: ping.speed });
        }
        None
    }
}

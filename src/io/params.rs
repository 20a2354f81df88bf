// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Session open parameters.
//!
//! Every survey tool exposes the same parameter set. Parameters can be
//! built in code, deserialized from TOML, or assembled from the legacy
//! command-line flags by the binary.
//!
//! ```toml
//! format = 71
//! ping_average = 1
//! lonflip = "centered"
//! speed_min = 0.0
//! time_gap = 60.0
//!
//! [bounds]
//! west = -10.0
//! east = 10.0
//! south = -5.0
//! north = 5.0
//!
//! [start]
//! year = 2024
//! month = 1
//! day = 1
//! hour = 0
//! minute = 0
//! second = 0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{CalendarTime, GeoBounds, LonFlip, Result, SwathError};
use crate::nav::DEFAULT_FIX_CAPACITY;

use super::filter::PingWindow;

/// Parameters a session is opened with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionParams {
    /// Format id; 0 infers the format from the file.
    pub format: i32,
    /// Number of consecutive survey pings combined by averaged reads.
    pub ping_average: usize,
    pub lonflip: LonFlip,
    /// Minimum speed, km/h.
    pub speed_min: f64,
    /// Maximum gap between consecutive survey pings, seconds.
    pub time_gap: f64,
    /// Fixes retained per sensor fix store.
    pub fix_capacity: usize,
    // Tables last so the struct serializes as valid TOML.
    pub bounds: GeoBounds,
    pub start: CalendarTime,
    pub end: CalendarTime,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            format: 0,
            ping_average: 1,
            lonflip: LonFlip::Centered,
            speed_min: 0.0,
            time_gap: 60.0,
            fix_capacity: DEFAULT_FIX_CAPACITY,
            bounds: GeoBounds::default(),
            start: CalendarTime::default_start(),
            end: CalendarTime::default_end(),
        }
    }
}

impl SessionParams {
    /// Parse parameters from a TOML document; missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SwathError::bad_parameter("config", e.to_string()))
    }

    /// Load parameters from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| SwathError::bad_parameter("config", e.to_string()))
    }

    /// Check every parameter and derive the read window.
    ///
    /// # Errors
    ///
    /// `BadParameter` when the time window is empty or inverted, the bounds
    /// are malformed, or a numeric limit is out of range.
    pub fn validate(&self) -> Result<PingWindow> {
        if self.format < 0 {
            return Err(SwathError::bad_parameter(
                "format",
                format!("format id {} is negative", self.format),
            ));
        }
        if self.ping_average == 0 {
            return Err(SwathError::bad_parameter("ping_average", "must be at least 1"));
        }
        let start_d = self.start.to_epoch()?;
        let end_d = self.end.to_epoch()?;
        if start_d >= end_d {
            return Err(SwathError::bad_parameter(
                "time window",
                format!("start {} must precede end {}", self.start, self.end),
            ));
        }
        self.bounds.validate()?;
        if !self.speed_min.is_finite() || self.speed_min < 0.0 {
            return Err(SwathError::bad_parameter(
                "speed_min",
                format!("{} is not a non-negative speed", self.speed_min),
            ));
        }
        if self.time_gap.is_nan() || self.time_gap <= 0.0 {
            return Err(SwathError::bad_parameter(
                "time_gap",
                format!("{} is not a positive duration", self.time_gap),
            ));
        }
        if self.fix_capacity == 0 {
            return Err(SwathError::bad_parameter("fix_capacity", "must be at least 1"));
        }
        Ok(PingWindow {
            start_d,
            end_d,
            bounds: self.bounds,
            speed_min: self.speed_min,
            time_gap: self.time_gap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = SessionParams::default();
        let window = params.validate().unwrap();
        assert!(window.start_d < 0.0);
        assert!(window.end_d > 2.0e9);
        assert_eq!(window.time_gap, 60.0);
    }

    #[test]
    fn test_inverted_time_window() {
        let params = SessionParams {
            start: CalendarTime::new(2020, 1, 1, 0, 0, 0, 0),
            end: CalendarTime::new(2019, 1, 1, 0, 0, 0, 0),
            ..SessionParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, SwathError::BadParameter { .. }));

        let equal = SessionParams {
            end: params.start,
            ..params
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn test_bad_bounds_and_limits() {
        let bounds = SessionParams {
            bounds: GeoBounds::new(10.0, -10.0, 0.0, 1.0),
            ..SessionParams::default()
        };
        assert!(bounds.validate().is_err());

        let average = SessionParams {
            ping_average: 0,
            ..SessionParams::default()
        };
        assert!(average.validate().is_err());

        let gap = SessionParams {
            time_gap: 0.0,
            ..SessionParams::default()
        };
        assert!(gap.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let params = SessionParams::from_toml_str(
            r#"
            format = 71
            lonflip = "positive"
            time_gap = 3600.0

            [bounds]
            west = -10.0
            east = 10.0
            south = -5.0
            north = 5.0

            [start]
            year = 2024
            month = 1
            day = 1
            hour = 0
            minute = 0
            second = 0
            "#,
        )
        .unwrap();
        assert_eq!(params.format, 71);
        assert_eq!(params.lonflip, LonFlip::Positive);
        assert_eq!(params.bounds, GeoBounds::new(-10.0, 10.0, -5.0, 5.0));
        assert_eq!(params.start, CalendarTime::new(2024, 1, 1, 0, 0, 0, 0));
        assert_eq!(params.end, CalendarTime::default_end());
        assert_eq!(params.ping_average, 1);
    }

    #[test]
    fn test_toml_unknown_key_rejected() {
        let err = SessionParams::from_toml_str("formatt = 3").unwrap_err();
        assert!(matches!(err, SwathError::BadParameter { .. }));
    }

    #[test]
    fn test_toml_round_trip() {
        let params = SessionParams {
            format: 166,
            speed_min: 2.5,
            ..SessionParams::default()
        };
        let text = params.to_toml_string().unwrap();
        assert_eq!(SessionParams::from_toml_str(&text).unwrap(), params);
    }
}

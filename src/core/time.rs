// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Seven-field calendar time and epoch conversion.
//!
//! Survey tools exchange times as `(year, month, day, hour, minute, second,
//! microsecond)` in UTC, and compare them as floating-point seconds since
//! the Unix epoch. Conversion goes through `chrono`.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::error::{Result, SwathError};

/// UTC calendar time with microsecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    #[serde(default)]
    pub microsecond: u32,
}

impl CalendarTime {
    /// Create a calendar time without validating it.
    ///
    /// Use [`CalendarTime::to_epoch`] to validate.
    pub const fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        microsecond: u32,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            microsecond,
        }
    }

    /// Build from the seven-field array form `[y, mo, d, h, mi, s, us]`.
    pub fn from_fields(fields: [i32; 7]) -> Result<Self> {
        let mut unsigned = [0u32; 6];
        for (slot, value) in unsigned.iter_mut().zip(fields[1..].iter()) {
            *slot = u32::try_from(*value).map_err(|_| {
                SwathError::bad_parameter("time", format!("negative field in {fields:?}"))
            })?;
        }
        let time = Self::new(
            fields[0], unsigned[0], unsigned[1], unsigned[2], unsigned[3], unsigned[4],
            unsigned[5],
        );
        time.to_epoch()?;
        Ok(time)
    }

    /// Seven-field array form.
    pub fn to_fields(&self) -> [i32; 7] {
        [
            self.year,
            self.month as i32,
            self.day as i32,
            self.hour as i32,
            self.minute as i32,
            self.second as i32,
            self.microsecond as i32,
        ]
    }

    /// Seconds since 1970-01-01T00:00:00Z.
    ///
    /// Fails with `BadParameter` if any field is out of range.
    pub fn to_epoch(&self) -> Result<f64> {
        let invalid = || SwathError::bad_parameter("time", format!("invalid calendar time {self}"));
        if self.microsecond >= 1_000_000 {
            return Err(invalid());
        }
        let datetime = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_micro_opt(self.hour, self.minute, self.second, self.microsecond))
            .ok_or_else(invalid)?
            .and_utc();
        let micros = datetime.timestamp() * 1_000_000 + i64::from(datetime.timestamp_subsec_micros());
        Ok(micros as f64 / 1e6)
    }

    /// Convert epoch seconds back into calendar form.
    ///
    /// Microseconds are rounded to the nearest whole value.
    pub fn from_epoch(epoch: f64) -> Result<Self> {
        if !epoch.is_finite() {
            return Err(SwathError::bad_parameter("time", "non-finite epoch seconds"));
        }
        let total_micros = (epoch * 1e6).round() as i64;
        let datetime = DateTime::<Utc>::from_timestamp_micros(total_micros).ok_or_else(|| {
            SwathError::bad_parameter("time", format!("epoch {epoch} out of range"))
        })?;
        Ok(Self {
            year: datetime.year(),
            month: datetime.month(),
            day: datetime.day(),
            hour: datetime.hour(),
            minute: datetime.minute(),
            second: datetime.second(),
            microsecond: datetime.timestamp_subsec_micros(),
        })
    }

    /// Whether `epoch` converts to a calendar time.
    pub fn is_representable(epoch: f64) -> bool {
        Self::from_epoch(epoch).is_ok()
    }

    /// Default start of the read window used by the legacy tool family.
    pub const fn default_start() -> Self {
        Self::new(1962, 2, 21, 0, 0, 0, 0)
    }

    /// Default end of the read window used by the legacy tool family.
    pub const fn default_end() -> Self {
        Self::new(2062, 2, 21, 0, 0, 0, 0)
    }
}

impl Default for CalendarTime {
    fn default() -> Self {
        Self::new(1970, 1, 1, 0, 0, 0, 0)
    }
}

impl fmt::Display for CalendarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}/{:02}/{:02} {:02}:{:02}:{:02}.{:06}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.microsecond
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_origin() {
        let t = CalendarTime::new(1970, 1, 1, 0, 0, 0, 0);
        assert_eq!(t.to_epoch().unwrap(), 0.0);
    }

    #[test]
    fn test_epoch_round_trip_with_micros() {
        let t = CalendarTime::new(2019, 7, 14, 3, 25, 59, 250_000);
        let epoch = t.to_epoch().unwrap();
        assert_eq!(epoch, 1_563_074_759.25);
        assert_eq!(CalendarTime::from_epoch(epoch).unwrap(), t);
    }

    #[test]
    fn test_invalid_fields_rejected() {
        assert!(CalendarTime::new(2021, 2, 30, 0, 0, 0, 0).to_epoch().is_err());
        assert!(CalendarTime::new(2021, 1, 1, 24, 0, 0, 0).to_epoch().is_err());
        assert!(CalendarTime::new(2021, 1, 1, 0, 0, 0, 1_000_000).to_epoch().is_err());
        assert!(CalendarTime::from_fields([2021, -1, 1, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_fields_round_trip() {
        let fields = [2004, 12, 31, 23, 59, 58, 999_999];
        let t = CalendarTime::from_fields(fields).unwrap();
        assert_eq!(t.to_fields(), fields);
    }

    #[test]
    fn test_representable_epochs() {
        assert!(CalendarTime::is_representable(1_563_074_759.25));
        assert!(!CalendarTime::is_representable(f64::NAN));
        assert!(!CalendarTime::is_representable(f64::NEG_INFINITY));
        assert!(!CalendarTime::is_representable(1e300));
    }

    #[test]
    fn test_default_window_ordering() {
        let start = CalendarTime::default_start().to_epoch().unwrap();
        let end = CalendarTime::default_end().to_epoch().unwrap();
        assert!(start < 0.0);
        assert!(end > start);
    }

    #[test]
    fn test_display() {
        let t = CalendarTime::new(2001, 2, 3, 4, 5, 6, 7);
        assert_eq!(t.to_string(), "2001/02/03 04:05:06.000007");
    }
}

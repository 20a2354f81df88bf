// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Normalized ping record and auxiliary record types.
//!
//! A [`Ping`] is the instrument-agnostic view of one record: every codec
//! extracts into it and inserts from it. The session owns exactly one
//! `Ping` whose per-beam and per-pixel buffers are reserved once, at open
//! time, to the format's maximum counts and cleared between records.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{Result, SwathError};
use super::time::CalendarTime;

/// Kind of record a codec decoded or is asked to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Survey ping carrying bathymetry, amplitude and/or sidescan.
    #[default]
    Data,
    /// Free-text comment.
    Comment,
    /// Asynchronous position (and usually heading) fix.
    Navigation,
    /// Asynchronous heading fix.
    Heading,
    /// Asynchronous attitude (roll, pitch, heave) fix.
    Attitude,
    /// Sound velocity profile.
    SoundVelocity,
    /// Instrument parameter or installation record.
    Parameter,
    /// Any other instrument-specific record.
    Other,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Data => "data",
            RecordKind::Comment => "comment",
            RecordKind::Navigation => "navigation",
            RecordKind::Heading => "heading",
            RecordKind::Attitude => "attitude",
            RecordKind::SoundVelocity => "sound_velocity",
            RecordKind::Parameter => "parameter",
            RecordKind::Other => "other",
        }
    }

    pub fn is_survey(&self) -> bool {
        matches!(self, RecordKind::Data)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-beam quality flag.
///
/// Zero means good. Null beams carry no usable value; flagged beams carry a
/// value that was rejected, with optional reason bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeamFlag(pub u8);

impl BeamFlag {
    pub const GOOD: BeamFlag = BeamFlag(0x00);
    pub const FLAGGED: BeamFlag = BeamFlag(0x01);
    pub const MANUAL: BeamFlag = BeamFlag(0x01 | 0x04);
    pub const FILTER: BeamFlag = BeamFlag(0x01 | 0x08);
    pub const SONAR: BeamFlag = BeamFlag(0x01 | 0x10);
    pub const NULL: BeamFlag = BeamFlag(0x80);

    pub fn is_good(&self) -> bool {
        self.0 == 0
    }

    pub fn is_null(&self) -> bool {
        self.0 & Self::NULL.0 != 0
    }

    pub fn is_flagged(&self) -> bool {
        !self.is_null() && self.0 & Self::FLAGGED.0 != 0
    }
}

/// One normalized ping, reused across reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ping {
    pub kind: RecordKind,
    pub time: CalendarTime,
    /// Seconds since the Unix epoch.
    pub time_d: f64,
    pub longitude: f64,
    pub latitude: f64,
    /// km/h
    pub speed: f64,
    /// Degrees clockwise from north.
    pub heading: f64,
    pub beam_flags: Vec<BeamFlag>,
    /// Depths in metres, positive down.
    pub bath: Vec<f64>,
    pub bath_acrosstrack: Vec<f64>,
    pub bath_alongtrack: Vec<f64>,
    pub amp: Vec<f64>,
    pub ss: Vec<f64>,
    pub ss_acrosstrack: Vec<f64>,
    pub ss_alongtrack: Vec<f64>,
    pub comment: String,
}

impl Ping {
    /// Allocate a ping with buffers reserved to the given maxima.
    ///
    /// Fails with `ResourceExhausted` instead of aborting when the
    /// reservation cannot be satisfied.
    pub fn with_capacity(beams_bath: usize, beams_amp: usize, pixels_ss: usize) -> Result<Self> {
        let mut ping = Ping::default();
        ping.beam_flags.try_reserve_exact(beams_bath)?;
        ping.bath.try_reserve_exact(beams_bath)?;
        ping.bath_acrosstrack.try_reserve_exact(beams_bath)?;
        ping.bath_alongtrack.try_reserve_exact(beams_bath)?;
        ping.amp.try_reserve_exact(beams_amp)?;
        ping.ss.try_reserve_exact(pixels_ss)?;
        ping.ss_acrosstrack.try_reserve_exact(pixels_ss)?;
        ping.ss_alongtrack.try_reserve_exact(pixels_ss)?;
        Ok(ping)
    }

    /// Clear all fields, keeping buffer capacity.
    pub fn reset(&mut self) {
        self.kind = RecordKind::Data;
        self.time = CalendarTime::default();
        self.time_d = 0.0;
        self.longitude = 0.0;
        self.latitude = 0.0;
        self.speed = 0.0;
        self.heading = 0.0;
        self.beam_flags.clear();
        self.bath.clear();
        self.bath_acrosstrack.clear();
        self.bath_alongtrack.clear();
        self.amp.clear();
        self.ss.clear();
        self.ss_acrosstrack.clear();
        self.ss_alongtrack.clear();
        self.comment.clear();
    }

    /// Set both time representations from epoch seconds.
    pub fn set_time_d(&mut self, time_d: f64) -> Result<()> {
        self.time = CalendarTime::from_epoch(time_d)?;
        self.time_d = time_d;
        Ok(())
    }

    /// Set both time representations from calendar form.
    pub fn set_time(&mut self, time: CalendarTime) -> Result<()> {
        self.time_d = time.to_epoch()?;
        self.time = time;
        Ok(())
    }

    pub fn beam_count(&self) -> usize {
        self.bath.len()
    }

    pub fn amp_count(&self) -> usize {
        self.amp.len()
    }

    pub fn pixel_count(&self) -> usize {
        self.ss.len()
    }

    /// Append one bathymetry beam.
    pub fn push_beam(&mut self, flag: BeamFlag, depth: f64, acrosstrack: f64, alongtrack: f64) {
        self.beam_flags.push(flag);
        self.bath.push(depth);
        self.bath_acrosstrack.push(acrosstrack);
        self.bath_alongtrack.push(alongtrack);
    }

    /// Append one sidescan pixel.
    pub fn push_pixel(&mut self, intensity: f64, acrosstrack: f64, alongtrack: f64) {
        self.ss.push(intensity);
        self.ss_acrosstrack.push(acrosstrack);
        self.ss_alongtrack.push(alongtrack);
    }

    pub fn good_beam_count(&self) -> usize {
        self.beam_flags.iter().filter(|f| f.is_good()).count()
    }

    /// Check per-beam arrays agree in length and fit the given maxima.
    pub fn check_counts(&self, beams_bath: usize, beams_amp: usize, pixels_ss: usize) -> Result<()> {
        let nbath = self.bath.len();
        if self.beam_flags.len() != nbath
            || self.bath_acrosstrack.len() != nbath
            || self.bath_alongtrack.len() != nbath
        {
            return Err(SwathError::bad_parameter(
                "ping",
                "beam flag, depth and offset arrays differ in length",
            ));
        }
        let nss = self.ss.len();
        if self.ss_acrosstrack.len() != nss || self.ss_alongtrack.len() != nss {
            return Err(SwathError::bad_parameter(
                "ping",
                "sidescan intensity and offset arrays differ in length",
            ));
        }
        if nbath > beams_bath {
            return Err(SwathError::bad_parameter(
                "ping",
                format!("{nbath} beams exceed format maximum {beams_bath}"),
            ));
        }
        if self.amp.len() > beams_amp {
            return Err(SwathError::bad_parameter(
                "ping",
                format!("{} amplitudes exceed format maximum {beams_amp}", self.amp.len()),
            ));
        }
        if nss > pixels_ss {
            return Err(SwathError::bad_parameter(
                "ping",
                format!("{nss} sidescan pixels exceed format maximum {pixels_ss}"),
            ));
        }
        Ok(())
    }
}

/// Navigation extracted from a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NavRecord {
    pub kind: RecordKind,
    pub time_d: f64,
    pub longitude: f64,
    pub latitude: f64,
    /// km/h
    pub speed: f64,
    pub heading: f64,
    /// Sonar depth below the sea surface, metres.
    pub sonar_depth: f64,
    pub roll: f64,
    pub pitch: f64,
    pub heave: f64,
}

/// Attitude samples extracted from a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttitudeRecord {
    pub time_d: Vec<f64>,
    pub roll: Vec<f64>,
    pub pitch: Vec<f64>,
    pub heave: Vec<f64>,
}

impl AttitudeRecord {
    pub fn len(&self) -> usize {
        self.time_d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_d.is_empty()
    }
}

/// Sound velocity profile: depth (m) and velocity (m/s) pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SoundVelocityProfile {
    pub time_d: f64,
    pub depth: Vec<f64>,
    pub velocity: Vec<f64>,
}

/// Sonar depth and altitude above the seafloor, metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Altitude {
    pub sonar_depth: f64,
    pub altitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beam_flags() {
        assert!(BeamFlag::GOOD.is_good());
        assert!(!BeamFlag::GOOD.is_flagged());
        assert!(BeamFlag::MANUAL.is_flagged());
        assert!(!BeamFlag::MANUAL.is_good());
        assert!(BeamFlag::NULL.is_null());
        assert!(!BeamFlag::NULL.is_flagged());
    }

    #[test]
    fn test_ping_capacity_and_reset() {
        let mut ping = Ping::with_capacity(16, 16, 64).unwrap();
        assert!(ping.bath.capacity() >= 16);
        assert!(ping.ss.capacity() >= 64);

        ping.push_beam(BeamFlag::GOOD, 100.0, -5.0, 0.0);
        ping.push_pixel(12.0, -5.0, 0.0);
        ping.comment.push_str("hello");
        ping.reset();

        assert_eq!(ping.beam_count(), 0);
        assert_eq!(ping.pixel_count(), 0);
        assert!(ping.comment.is_empty());
        assert!(ping.bath.capacity() >= 16);
    }

    #[test]
    fn test_ping_capacity_exhausted() {
        let err = Ping::with_capacity(usize::MAX / 2, 0, 0).unwrap_err();
        assert!(matches!(err, SwathError::ResourceExhausted { .. }));
    }

    #[test]
    fn test_check_counts() {
        let mut ping = Ping::default();
        for i in 0..4 {
            ping.push_beam(BeamFlag::GOOD, 10.0 + i as f64, 0.0, 0.0);
        }
        assert!(ping.check_counts(4, 0, 0).is_ok());
        assert!(ping.check_counts(3, 0, 0).is_err());

        ping.bath_alongtrack.pop();
        assert!(ping.check_counts(4, 0, 0).is_err());
    }

    #[test]
    fn test_set_time_keeps_forms_in_sync() {
        let mut ping = Ping::default();
        ping.set_time(CalendarTime::new(2000, 1, 1, 0, 0, 1, 500_000))
            .unwrap();
        assert_eq!(ping.time_d, 946_684_801.5);
        ping.set_time_d(60.0).unwrap();
        assert_eq!(ping.time, CalendarTime::new(1970, 1, 1, 0, 1, 0, 0));
    }
}

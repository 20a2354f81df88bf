// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Position, heading and attitude fix classes and the per-session bundle.

use serde::Serialize;

use crate::core::{coor_scale, local_distance, Result, DTR};

use super::store::{FixStore, Interpolate, Placement, DEFAULT_FIX_CAPACITY};

/// Position fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PositionFix {
    pub longitude: f64,
    pub latitude: f64,
}

impl Interpolate for PositionFix {
    const SIGNAL: &'static str = "position";

    fn lerp(a: &Self, b: &Self, factor: f64) -> Self {
        let mut dlon = b.longitude - a.longitude;
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        PositionFix {
            longitude: a.longitude + factor * dlon,
            latitude: a.latitude + factor * (b.latitude - a.latitude),
        }
    }
}

/// Heading fix in degrees clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HeadingFix(pub f64);

impl Interpolate for HeadingFix {
    const SIGNAL: &'static str = "heading";

    fn lerp(a: &Self, b: &Self, factor: f64) -> Self {
        let mut delta = b.0 - a.0;
        if delta > 180.0 {
            delta -= 360.0;
        } else if delta < -180.0 {
            delta += 360.0;
        }
        HeadingFix((a.0 + factor * delta).rem_euclid(360.0))
    }
}

/// Attitude fix: roll and pitch in degrees, heave in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AttitudeFix {
    pub roll: f64,
    pub pitch: f64,
    pub heave: f64,
}

impl Interpolate for AttitudeFix {
    const SIGNAL: &'static str = "attitude";

    fn lerp(a: &Self, b: &Self, factor: f64) -> Self {
        AttitudeFix {
            roll: a.roll + factor * (b.roll - a.roll),
            pitch: a.pitch + factor * (b.pitch - a.pitch),
            heave: a.heave + factor * (b.heave - a.heave),
        }
    }
}

/// Interpolated or extrapolated position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PositionEstimate {
    pub longitude: f64,
    pub latitude: f64,
    /// km/h
    pub speed: f64,
}

impl FixStore<PositionFix> {
    /// Average speed over all stored fixes in m/s, zero with fewer than two.
    pub fn average_speed(&self) -> f64 {
        let (Some((t0, _)), Some((t1, _))) = (self.earliest(), self.latest()) else {
            return 0.0;
        };
        if self.len() < 2 || t1 <= t0 {
            return 0.0;
        }
        let distance: f64 = self
            .iter()
            .zip(self.iter().skip(1))
            .map(|((_, a), (_, b))| local_distance(a.longitude, a.latitude, b.longitude, b.latitude))
            .sum();
        distance / (t1 - t0)
    }

    /// Position at `time_d`.
    ///
    /// - one fix: that fix, unchanged
    /// - inside the stored span: linear between the bracketing fixes
    /// - outside the span: dead reckoning from the nearest end fix along
    ///   `heading_hint` at `speed_hint` km/h; a negative hint moves against
    ///   the heading, and a hint of zero means "unknown" so the average
    ///   speed of the stored fixes is used
    ///
    /// Fails with `NoFix` when no fixes are stored.
    pub fn interpolate_position(
        &self,
        time_d: f64,
        heading_hint: f64,
        speed_hint: f64,
    ) -> Result<PositionEstimate> {
        let placement = self.placement(time_d)?;
        let (anchor_time, anchor) = match placement {
            Placement::Single => {
                let (_, fix) = self.fixes_at(0);
                return Ok(PositionEstimate {
                    longitude: fix.longitude,
                    latitude: fix.latitude,
                    speed: speed_hint,
                });
            }
            Placement::Within => {
                let (i, j) = self.bracket(time_d);
                let (t0, a) = self.fixes_at(i);
                let (t1, b) = self.fixes_at(j);
                let fix = if time_d == t1 {
                    b
                } else {
                    PositionFix::lerp(&a, &b, (time_d - t0) / (t1 - t0))
                };
                let distance = local_distance(a.longitude, a.latitude, b.longitude, b.latitude);
                return Ok(PositionEstimate {
                    longitude: fix.longitude,
                    latitude: fix.latitude,
                    speed: 3.6 * distance / (t1 - t0),
                });
            }
            Placement::Before => self.fixes_at(0),
            Placement::After => self.fixes_at(self.len() - 1),
        };

        let speed_mps = if speed_hint != 0.0 {
            speed_hint / 3.6
        } else {
            self.average_speed()
        };
        let (mtodeglon, mtodeglat) = coor_scale(anchor.latitude);
        let headingx = (DTR * heading_hint).sin();
        let headingy = (DTR * heading_hint).cos();
        let dd = (time_d - anchor_time) * speed_mps;
        Ok(PositionEstimate {
            longitude: anchor.longitude + headingx * mtodeglon * dd,
            latitude: anchor.latitude + headingy * mtodeglat * dd,
            speed: 3.6 * speed_mps,
        })
    }

    fn fixes_at(&self, index: usize) -> (f64, PositionFix) {
        self.get(index).unwrap_or_default()
    }
}

/// The three independent fix stores a session carries.
///
/// Codecs receive this mutably while decoding; they may only add fixes
/// and interpolate, there is no other mutating access.
#[derive(Debug, Clone)]
pub struct SensorFixes {
    position: FixStore<PositionFix>,
    heading: FixStore<HeadingFix>,
    attitude: FixStore<AttitudeFix>,
}

impl Default for SensorFixes {
    fn default() -> Self {
        Self::new(DEFAULT_FIX_CAPACITY)
    }
}

impl SensorFixes {
    pub fn new(capacity: usize) -> Self {
        Self {
            position: FixStore::new(capacity),
            heading: FixStore::new(capacity),
            attitude: FixStore::new(capacity),
        }
    }

    /// Create the stores with their full capacity reserved.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            position: FixStore::try_with_capacity(capacity)?,
            heading: FixStore::try_with_capacity(capacity)?,
            attitude: FixStore::try_with_capacity(capacity)?,
        })
    }

    pub fn add_position(&mut self, time_d: f64, longitude: f64, latitude: f64) -> bool {
        self.position.add(
            time_d,
            PositionFix {
                longitude,
                latitude,
            },
        )
    }

    pub fn add_heading(&mut self, time_d: f64, heading: f64) -> bool {
        self.heading.add(time_d, HeadingFix(heading.rem_euclid(360.0)))
    }

    pub fn add_attitude(&mut self, time_d: f64, roll: f64, pitch: f64, heave: f64) -> bool {
        self.attitude
            .add(time_d, AttitudeFix { roll, pitch, heave })
    }

    /// See [`FixStore::interpolate_position`].
    pub fn position_at(
        &self,
        time_d: f64,
        heading_hint: f64,
        speed_hint: f64,
    ) -> Result<PositionEstimate> {
        self.position
            .interpolate_position(time_d, heading_hint, speed_hint)
    }

    pub fn heading_at(&self, time_d: f64) -> Result<f64> {
        self.heading.interpolate(time_d).map(|h| h.0)
    }

    pub fn attitude_at(&self, time_d: f64) -> Result<AttitudeFix> {
        self.attitude.interpolate(time_d)
    }

    pub fn position(&self) -> &FixStore<PositionFix> {
        &self.position
    }

    pub fn heading(&self) -> &FixStore<HeadingFix> {
        &self.heading
    }

    pub fn attitude(&self) -> &FixStore<AttitudeFix> {
        &self.attitude
    }
}

/// Codec-facing view of a session's fix stores.
///
/// Codecs may add fixes and interpolate, nothing else.
pub struct FixRecorder<'a> {
    fixes: &'a mut SensorFixes,
}

impl<'a> FixRecorder<'a> {
    pub fn new(fixes: &'a mut SensorFixes) -> Self {
        Self { fixes }
    }

    pub fn add_position(&mut self, time_d: f64, longitude: f64, latitude: f64) -> bool {
        self.fixes.add_position(time_d, longitude, latitude)
    }

    pub fn add_heading(&mut self, time_d: f64, heading: f64) -> bool {
        self.fixes.add_heading(time_d, heading)
    }

    pub fn add_attitude(&mut self, time_d: f64, roll: f64, pitch: f64, heave: f64) -> bool {
        self.fixes.add_attitude(time_d, roll, pitch, heave)
    }

    pub fn position_at(
        &self,
        time_d: f64,
        heading_hint: f64,
        speed_hint: f64,
    ) -> Result<PositionEstimate> {
        self.fixes.position_at(time_d, heading_hint, speed_hint)
    }

    pub fn heading_at(&self, time_d: f64) -> Result<f64> {
        self.fixes.heading_at(time_d)
    }

    pub fn attitude_at(&self, time_d: f64) -> Result<AttitudeFix> {
        self.fixes.attitude_at(time_d)
    }
}

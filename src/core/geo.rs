// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Geographic helpers: longitude wrapping, bounds and local scale factors.

use serde::{Deserialize, Serialize};

use super::error::{Result, SwathError};

/// Degrees to radians.
pub const DTR: f64 = std::f64::consts::PI / 180.0;

/// Longitude-wrap convention applied to every longitude leaving a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LonFlip {
    /// Longitudes in `[-360, 0]`.
    Negative,
    /// Longitudes in `[-180, 180]`.
    #[default]
    Centered,
    /// Longitudes in `[0, 360]`.
    Positive,
}

impl LonFlip {
    /// Map the legacy `-L` flag value (-1, 0, 1).
    pub fn from_flag(flag: i32) -> Result<Self> {
        match flag {
            -1 => Ok(LonFlip::Negative),
            0 => Ok(LonFlip::Centered),
            1 => Ok(LonFlip::Positive),
            other => Err(SwathError::bad_parameter(
                "lonflip",
                format!("expected -1, 0 or 1, got {other}"),
            )),
        }
    }

    /// The legacy flag value.
    pub fn as_flag(&self) -> i32 {
        match self {
            LonFlip::Negative => -1,
            LonFlip::Centered => 0,
            LonFlip::Positive => 1,
        }
    }

    /// Wrap a longitude into this convention's range.
    pub fn apply(&self, lon: f64) -> f64 {
        if !lon.is_finite() {
            return lon;
        }
        let mut lon = lon % 360.0;
        match self {
            LonFlip::Negative => {
                if lon > 0.0 {
                    lon -= 360.0;
                }
            }
            LonFlip::Centered => {
                if lon > 180.0 {
                    lon -= 360.0;
                } else if lon < -180.0 {
                    lon += 360.0;
                }
            }
            LonFlip::Positive => {
                if lon < 0.0 {
                    lon += 360.0;
                }
            }
        }
        lon
    }
}

/// Geographic bounds in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self {
            west: -360.0,
            east: 360.0,
            south: -90.0,
            north: 90.0,
        }
    }
}

impl GeoBounds {
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            west,
            east,
            south,
            north,
        }
    }

    /// Check `west < east`, `south < north` and latitudes within ±90°.
    pub fn validate(&self) -> Result<()> {
        let values = [self.west, self.east, self.south, self.north];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SwathError::bad_parameter("bounds", "non-finite bound"));
        }
        if self.west >= self.east {
            return Err(SwathError::bad_parameter(
                "bounds",
                format!("west {} must be less than east {}", self.west, self.east),
            ));
        }
        if self.south < -90.0 || self.north > 90.0 {
            return Err(SwathError::bad_parameter(
                "bounds",
                format!("latitudes {}..{} exceed ±90", self.south, self.north),
            ));
        }
        if self.south >= self.north {
            return Err(SwathError::bad_parameter(
                "bounds",
                format!("south {} must be less than north {}", self.south, self.north),
            ));
        }
        Ok(())
    }

    /// Whether a position lies inside the bounds.
    ///
    /// The longitude is accepted if it, or it shifted by ±360°, falls in
    /// `[west, east]`, so the test does not depend on the wrap convention.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        [lon, lon - 360.0, lon + 360.0]
            .iter()
            .any(|l| *l >= self.west && *l <= self.east)
    }
}

/// Metres-to-degrees scale factors `(mtodeglon, mtodeglat)` at a latitude.
///
/// Uses the ellipsoidal series expansion for the length of one degree of
/// longitude and latitude.
pub fn coor_scale(lat: f64) -> (f64, f64) {
    const C1: f64 = 111_412.84;
    const C2: f64 = -93.5;
    const C3: f64 = 0.118;
    const C4: f64 = 111_132.92;
    const C5: f64 = -559.82;
    const C6: f64 = 1.175;
    const C7: f64 = 0.0023;

    let radlat = lat * DTR;
    let deg_lon = (C1 * radlat.cos() + C2 * (3.0 * radlat).cos() + C3 * (5.0 * radlat).cos()).abs();
    let deg_lat = (C4
        + C5 * (2.0 * radlat).cos()
        + C6 * (4.0 * radlat).cos()
        + C7 * (6.0 * radlat).cos())
    .abs();
    (1.0 / deg_lon, 1.0 / deg_lat)
}

/// Local flat-earth distance in metres between two positions.
pub fn local_distance(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> f64 {
    let (mtodeglon, mtodeglat) = coor_scale(0.5 * (lat0 + lat1));
    let mut dlon = lon1 - lon0;
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    let dx = dlon / mtodeglon;
    let dy = (lat1 - lat0) / mtodeglat;
    dx.hypot(dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lonflip_ranges() {
        assert_eq!(LonFlip::Centered.apply(190.0), -170.0);
        assert_eq!(LonFlip::Centered.apply(-190.0), 170.0);
        assert_eq!(LonFlip::Negative.apply(10.0), -350.0);
        assert_eq!(LonFlip::Positive.apply(-10.0), 350.0);
        assert_eq!(LonFlip::Positive.apply(370.0), 10.0);
    }

    #[test]
    fn test_lonflip_flags() {
        for flag in [-1, 0, 1] {
            assert_eq!(LonFlip::from_flag(flag).unwrap().as_flag(), flag);
        }
        assert!(LonFlip::from_flag(2).is_err());
    }

    #[test]
    fn test_bounds_validation() {
        assert!(GeoBounds::default().validate().is_ok());
        assert!(GeoBounds::new(10.0, -10.0, -5.0, 5.0).validate().is_err());
        assert!(GeoBounds::new(-10.0, 10.0, -91.0, 5.0).validate().is_err());
        assert!(GeoBounds::new(-10.0, 10.0, -5.0, 95.0).validate().is_err());
        assert!(GeoBounds::new(-10.0, 10.0, 5.0, -5.0).validate().is_err());
    }

    #[test]
    fn test_bounds_contains_across_wrap() {
        let bounds = GeoBounds::new(-10.0, 10.0, -5.0, 5.0);
        assert!(bounds.contains(0.0, 0.0));
        assert!(bounds.contains(355.0, 1.0));
        assert!(!bounds.contains(20.0, 0.0));
        assert!(!bounds.contains(0.0, 6.0));
    }

    #[test]
    fn test_coor_scale_equator() {
        let (mtodeglon, mtodeglat) = coor_scale(0.0);
        // roughly 111.3 km per degree of longitude, 110.6 km per degree of latitude
        assert!((1.0 / mtodeglon - 111_319.5).abs() < 1.0);
        assert!((1.0 / mtodeglat - 110_574.3).abs() < 1.0);
    }

    #[test]
    fn test_local_distance() {
        let d = local_distance(0.0, 0.0, 0.0, 1.0);
        assert!((d - 110_574.0).abs() < 1_000.0);
        assert_eq!(local_distance(5.0, 5.0, 5.0, 5.0), 0.0);
    }
}

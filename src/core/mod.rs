// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout swathcodec.
//!
//! This module provides the foundational types for the library:
//! - [`SwathError`] and [`StatusCode`] - Error taxonomy and boundary status codes
//! - [`CalendarTime`] - Seven-field UTC time with epoch conversion
//! - [`LonFlip`] and [`GeoBounds`] - Longitude wrapping and geographic windows
//! - [`Ping`] - The normalized per-ping record shared by every format

pub mod error;
pub mod geo;
pub mod ping;
pub mod time;

pub use error::{Result, StatusCode, SwathError};
pub use geo::{coor_scale, local_distance, GeoBounds, LonFlip, DTR};
pub use ping::{
    Altitude, AttitudeRecord, BeamFlag, NavRecord, Ping, RecordKind, SoundVelocityProfile,
};
pub use time::CalendarTime;

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Asynchronous sensor fix stores and interpolation.
//!
//! Each session carries one [`SensorFixes`] bundle with independent
//! position, heading and attitude stores. Codecs feed them while decoding
//! and query them to position pings whose records carry no navigation.

pub mod fixes;
pub mod store;

pub use fixes::{
    AttitudeFix, FixRecorder, HeadingFix, PositionEstimate, PositionFix, SensorFixes,
};
pub use store::{FixStore, Interpolate, Placement, DEFAULT_FIX_CAPACITY};

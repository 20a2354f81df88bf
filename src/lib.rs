// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Swathcodec
//!
//! Swath bathymetry and sonar data format library.
//!
//! The library reads and writes multibeam, interferometric and sidescan
//! sonar files through one normalized per-ping record:
//! - **Format registry** in [`io::registry`] describing every supported format
//! - **Codecs** in [`io::formats`], one per format, behind [`io::SwathFormat`]
//! - **Sessions** in [`io::session`] driving a codec over its file streams,
//!   applying time, bounds, gap and speed windowing and optional ping
//!   averaging
//! - **Sensor fix stores** in [`nav`] interpolating asynchronous position,
//!   heading and attitude at ping time
//!
//! ## Architecture
//!
//! - `core/` - Errors, calendar time, geographic helpers, the [`Ping`] record
//! - `nav/` - Bounded fix stores with interpolation and dead reckoning
//! - `io/` - Descriptors, registry, detection, sessions and built-in codecs
//!
//! ## Example: Reading pings
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use swathcodec::io::SessionBuilder;
//! use swathcodec::SwathError;
//!
//! let mut session = SessionBuilder::new().time_gap(120.0).open_read("line0001.swb")?;
//! loop {
//!     match session.read_ping() {
//!         Ok(status) if status.kind.is_survey() => {
//!             let ping = session.ping();
//!             println!("{} beams at {}", ping.beam_count(), ping.time);
//!         }
//!         Ok(_) => {}
//!         Err(SwathError::EndOfFile) => break,
//!         Err(e) if !e.is_fatal_to_stream() => continue,
//!         Err(e) => return Err(e.into()),
//!     }
//! }
//! session.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Converting formats
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use swathcodec::io::SessionBuilder;
//!
//! let mut input = SessionBuilder::new().open_read("line0001.swb")?;
//! let mut output = SessionBuilder::new().format(166).open_write("line0001.txt")?;
//! while let Ok(_) = input.read_ping() {
//!     output.write(input.ping())?;
//! }
//! output.close()?;
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use crate::core::{
    BeamFlag, CalendarTime, GeoBounds, LonFlip, Ping, RecordKind, Result, StatusCode, SwathError,
};

// Sensor fix stores
pub mod nav;

pub use nav::{FixStore, SensorFixes};

// Registry, codecs and sessions
pub mod io;

pub use io::{
    detect_format, register, FormatDescriptor, FormatRegistry, ReadStatus, Session,
    SessionBuilder, SessionParams,
};

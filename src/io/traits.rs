// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Codec contract every swath format implements.
//!
//! A format is split in two:
//! - [`SwathFormat`] is the shared, stateless registry entry: it owns the
//!   [`FormatDescriptor`] and allocates per-session codec state.
//! - [`CodecState`] is the codec-private state of one session. The session
//!   owns it exclusively and releases it with [`CodecState::free`] before
//!   anything else when the session closes.
//!
//! Codecs never hold on to session buffers: streams, the sensor fix store
//! and the normalized [`Ping`] are lent for the duration of one call.
//!
//! # Example
//!
//! ```no_run
//! use swathcodec::io::traits::SwathFormat;
//!
//! fn describe(format: &dyn SwathFormat) {
//!     let d = format.descriptor();
//!     println!("{} ({}): up to {} beams", d.name, d.id, d.beams_bath_max);
//! }
//! ```

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::core::{
    Altitude, AttitudeRecord, LonFlip, NavRecord, Ping, RecordKind, Result,
    SoundVelocityProfile, SwathError,
};
use crate::nav::FixRecorder;

use super::descriptor::FormatDescriptor;

/// Buffered input stream handed to codecs.
pub type InputStream = Box<dyn BufRead + Send>;

/// Output stream handed to codecs.
pub type OutputStream = Box<dyn Write + Send>;

/// Whether a session reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
}

/// Registry entry for one format.
pub trait SwathFormat: Send + Sync {
    /// Static metadata for this format.
    fn descriptor(&self) -> &FormatDescriptor;

    /// Allocate codec-private state for a new session.
    ///
    /// Fails with `ResourceExhausted` when memory cannot be obtained; no
    /// partially built state may outlive the failure.
    fn allocate(&self) -> Result<Box<dyn CodecState>>;
}

/// Everything a codec may touch while decoding one record.
pub struct ReadContext<'a> {
    pub(crate) streams: &'a mut [InputStream],
    /// Sensor fixes of the session; codecs add fixes and interpolate.
    pub fixes: FixRecorder<'a>,
    pub descriptor: &'a FormatDescriptor,
}

impl<'a> ReadContext<'a> {
    pub fn new(
        streams: &'a mut [InputStream],
        fixes: FixRecorder<'a>,
        descriptor: &'a FormatDescriptor,
    ) -> Self {
        Self {
            streams,
            fixes,
            descriptor,
        }
    }

    /// The primary data stream.
    pub fn primary(&mut self) -> Result<&mut InputStream> {
        self.stream(0)
    }

    /// Stream `index` in descriptor order (0 is the primary file).
    pub fn stream(&mut self, index: usize) -> Result<&mut InputStream> {
        let count = self.streams.len();
        self.streams.get_mut(index).ok_or_else(|| {
            SwathError::bad_parameter("streams", format!("stream {index} requested, {count} open"))
        })
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}

/// Everything a codec may touch while encoding one record.
pub struct WriteContext<'a> {
    pub(crate) streams: &'a mut [OutputStream],
    pub descriptor: &'a FormatDescriptor,
}

impl<'a> WriteContext<'a> {
    pub fn new(streams: &'a mut [OutputStream], descriptor: &'a FormatDescriptor) -> Self {
        Self {
            streams,
            descriptor,
        }
    }

    /// The primary data stream.
    pub fn primary(&mut self) -> Result<&mut OutputStream> {
        self.stream(0)
    }

    /// Stream `index` in descriptor order (0 is the primary file).
    pub fn stream(&mut self, index: usize) -> Result<&mut OutputStream> {
        let count = self.streams.len();
        self.streams.get_mut(index).ok_or_else(|| {
            SwathError::bad_parameter("streams", format!("stream {index} requested, {count} open"))
        })
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}

/// Codec-private state of one session.
///
/// Required operations decode, encode and translate records; the optional
/// extractions default to `Unsupported`.
pub trait CodecState: Send {
    /// Decode the next physical record into private storage.
    ///
    /// Returns the record kind. Fails with `EndOfFile` when the stream is
    /// exhausted and with `Unintelligible` when a record is present but
    /// malformed (the record is consumed so the caller may continue).
    /// Asynchronous navigation, heading and attitude samples are added to
    /// `ctx.fixes` whatever the record kind.
    fn read_ping(&mut self, ctx: &mut ReadContext<'_>) -> Result<RecordKind>;

    /// Serialize private storage as a record of `kind`.
    ///
    /// Short or failed writes are `WriteFailed`.
    fn write_ping(&mut self, ctx: &mut WriteContext<'_>, kind: RecordKind) -> Result<()>;

    /// Copy the last decoded record into the normalized ping, applying unit
    /// conversions and the longitude-wrap convention.
    fn extract(&self, ping: &mut Ping, lonflip: LonFlip) -> Result<()>;

    /// Copy a normalized ping into private storage for the next write.
    fn insert(&mut self, ping: &Ping) -> Result<()>;

    fn extract_navigation(&self, _lonflip: LonFlip) -> Result<NavRecord> {
        Err(SwathError::unsupported("extract_navigation"))
    }

    fn insert_navigation(&mut self, _nav: &NavRecord) -> Result<()> {
        Err(SwathError::unsupported("insert_navigation"))
    }

    fn extract_attitude(&self) -> Result<AttitudeRecord> {
        Err(SwathError::unsupported("extract_attitude"))
    }

    fn insert_attitude(&mut self, _attitude: &AttitudeRecord) -> Result<()> {
        Err(SwathError::unsupported("insert_attitude"))
    }

    fn extract_sound_velocity_profile(&self) -> Result<SoundVelocityProfile> {
        Err(SwathError::unsupported("extract_sound_velocity_profile"))
    }

    fn insert_sound_velocity_profile(&mut self, _svp: &SoundVelocityProfile) -> Result<()> {
        Err(SwathError::unsupported("insert_sound_velocity_profile"))
    }

    fn extract_altitude(&self) -> Result<Altitude> {
        Err(SwathError::unsupported("extract_altitude"))
    }

    /// Set sonar depth and altitude on the survey record last inserted.
    fn insert_altitude(&mut self, _altitude: &Altitude) -> Result<()> {
        Err(SwathError::unsupported("insert_altitude"))
    }

    /// Open files for formats whose streams an external library manages.
    fn open_external(&mut self, _paths: &[PathBuf], _mode: AccessMode) -> Result<()> {
        Err(SwathError::unsupported("open_external"))
    }

    /// Release private resources. Called exactly once, at close.
    fn free(&mut self) {}
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The I/O session: one open binding between a caller, a codec and its
//! byte streams.
//!
//! Lifecycle:
//!
//! ```text
//! SessionBuilder ──open_*──▶ Session (Open) ──close──▶ Closed
//!   (Unopened)    (Opening)
//! ```
//!
//! A failed open returns an `OpenFailed` error and leaves the builder
//! untouched; everything allocated during the attempt is released before
//! the error is returned. An open session owns its normalized [`Ping`],
//! its [`SensorFixes`], the codec state and the streams; the codec only
//! borrows them for the duration of a call.
//!
//! # Example
//!
//! ```rust,no_run
//! use swathcodec::io::SessionBuilder;
//!
//! let mut session = SessionBuilder::new().open_read("line0001.mb71")?;
//! loop {
//!     match session.read_ping() {
//!         Ok(status) if status.is_clean() => {
//!             let ping = session.ping();
//!             println!("{} {:.6} {:.6}", ping.time, ping.longitude, ping.latitude);
//!         }
//!         Ok(_) => continue,
//!         Err(e) if !e.is_fatal_to_stream() => continue,
//!         Err(_) => break,
//!     }
//! }
//! session.close()?;
//! # Ok::<(), swathcodec::SwathError>(())
//! ```

mod average;
mod builder;

pub use builder::SessionBuilder;

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn, Span};

use crate::core::{
    Altitude, AttitudeRecord, NavRecord, Ping, RecordKind, Result, SoundVelocityProfile,
    StatusCode, SwathError,
};
use crate::nav::{FixRecorder, SensorFixes};

use super::descriptor::FormatDescriptor;
use super::filter::{Advisory, PingWindow, WindowTracker};
use super::params::SessionParams;
use super::traits::{
    AccessMode, CodecState, InputStream, OutputStream, ReadContext, SwathFormat, WriteContext,
};

use average::PingAverager;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unopened,
    Opening,
    Open,
    Closed,
}

/// Outcome of a successful read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadStatus {
    pub kind: RecordKind,
    /// Windowing advisory raised by a survey ping, if any.
    pub advisory: Option<Advisory>,
}

impl ReadStatus {
    /// Boundary status code: the advisory's, or `Success`.
    pub fn status(&self) -> StatusCode {
        self.advisory
            .map(|a| a.status())
            .unwrap_or(StatusCode::Success)
    }

    /// Whether the read raised no advisory.
    pub fn is_clean(&self) -> bool {
        self.advisory.is_none()
    }
}

/// Record and advisory counters of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub records_read: u64,
    pub records_written: u64,
    /// Records read, by kind name.
    pub read_by_kind: BTreeMap<&'static str, u64>,
    /// Records written, by kind name.
    pub written_by_kind: BTreeMap<&'static str, u64>,
    pub unintelligible: u64,
    pub out_of_time: u64,
    pub out_of_bounds: u64,
    pub time_gap: u64,
    pub speed_too_low: u64,
}

impl SessionStats {
    fn record_read(&mut self, kind: RecordKind, advisory: Option<Advisory>) {
        self.records_read += 1;
        *self.read_by_kind.entry(kind.as_str()).or_default() += 1;
        match advisory {
            Some(Advisory::OutOfTime) => self.out_of_time += 1,
            Some(Advisory::OutOfBounds) => self.out_of_bounds += 1,
            Some(Advisory::TimeGap { .. }) => self.time_gap += 1,
            Some(Advisory::SpeedTooLow { .. }) => self.speed_too_low += 1,
            None => {}
        }
    }

    fn record_written(&mut self, kind: RecordKind) {
        self.records_written += 1;
        *self.written_by_kind.entry(kind.as_str()).or_default() += 1;
    }

    /// Total advisories raised.
    pub fn advisories(&self) -> u64 {
        self.out_of_time + self.out_of_bounds + self.time_gap + self.speed_too_low
    }
}

/// Exclusive owner of codec state; frees it exactly once.
pub(crate) struct CodecSlot {
    state: Option<Box<dyn CodecState>>,
}

impl CodecSlot {
    pub(crate) fn new(state: Box<dyn CodecState>) -> Self {
        Self { state: Some(state) }
    }

    fn get(&self, operation: &str) -> Result<&dyn CodecState> {
        self.state
            .as_deref()
            .ok_or_else(|| SwathError::use_after_close(operation))
    }

    pub(crate) fn get_mut(&mut self, operation: &str) -> Result<&mut (dyn CodecState + 'static)> {
        self.state
            .as_deref_mut()
            .ok_or_else(|| SwathError::use_after_close(operation))
    }

    fn release(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.free();
        }
    }
}

impl Drop for CodecSlot {
    fn drop(&mut self) {
        self.release();
    }
}

/// An open swath data session.
pub struct Session {
    // Declared first so it drops first.
    codec: CodecSlot,
    format: Arc<dyn SwathFormat>,
    params: SessionParams,
    window: PingWindow,
    tracker: WindowTracker,
    mode: AccessMode,
    label: String,
    inputs: Vec<InputStream>,
    outputs: Vec<OutputStream>,
    ping: Ping,
    fixes: SensorFixes,
    averager: Option<PingAverager>,
    state: SessionState,
    poisoned: bool,
    stats: SessionStats,
    span: Span,
}

impl Session {
    /// Read the next record into the session ping.
    ///
    /// Survey pings are checked against the windowing policy; a violation
    /// is reported in [`ReadStatus::advisory`] and the ping is still
    /// delivered.
    ///
    /// # Errors
    ///
    /// - `EndOfFile` when the streams are exhausted
    /// - `Unintelligible` for a malformed record (the caller may continue)
    /// - `Io` on stream failure
    /// - `UseAfterClose` after [`Session::close`]
    pub fn read_ping(&mut self) -> Result<ReadStatus> {
        self.ensure_open("read_ping")?;
        self.ensure_mode(AccessMode::Read, "read_ping")?;
        let _span = self.span.clone().entered();

        self.ping.reset();
        let codec = self.codec.get_mut("read_ping")?;
        let descriptor = self.format.descriptor();
        let mut ctx = ReadContext::new(
            &mut self.inputs,
            FixRecorder::new(&mut self.fixes),
            descriptor,
        );
        // The record is consumed once decoded, so a record that cannot be
        // normalized is as skippable as one that failed to decode.
        let decoded = codec.read_ping(&mut ctx).and_then(|kind| {
            codec
                .extract(&mut self.ping, self.params.lonflip)
                .map(|()| kind)
                .map_err(|e| match e {
                    SwathError::BadParameter { parameter, reason } => SwathError::unintelligible(
                        descriptor.name,
                        format!("{parameter}: {reason}"),
                    ),
                    other => other,
                })
        });
        let kind = match decoded {
            Ok(kind) => kind,
            Err(e) => {
                if let SwathError::Unintelligible { reason, .. } = &e {
                    self.stats.unintelligible += 1;
                    debug!(reason = %reason, "unintelligible record");
                }
                return Err(e);
            }
        };
        self.ping.kind = kind;

        let advisory = if kind.is_survey() {
            self.window.apply(&mut self.tracker, &mut self.ping)
        } else {
            None
        };
        if let Some(advisory) = advisory {
            trace!(time_d = self.ping.time_d, %advisory, "windowing advisory");
        }
        self.stats.record_read(kind, advisory);
        Ok(ReadStatus { kind, advisory })
    }

    /// Write the session ping as a record of `kind`.
    ///
    /// The ping is handed to the codec's `insert` and then written.
    ///
    /// # Errors
    ///
    /// `WriteFailed` on a failed or short write; the session then refuses
    /// all further writes.
    pub fn write_ping(&mut self, kind: RecordKind) -> Result<()> {
        self.ensure_writable("write_ping")?;
        let _span = self.span.clone().entered();
        self.stage(kind)?;
        self.emit(kind)
    }

    /// Copy `ping` into the session buffer and hand it to the codec without
    /// writing it.
    ///
    /// Optional inserts such as `insert_altitude` may then amend the staged
    /// record before `write_record` writes it.
    pub fn insert(&mut self, ping: &Ping) -> Result<()> {
        self.ensure_writable("insert")?;
        self.ping.clone_from(ping);
        self.stage(ping.kind)
    }

    fn stage(&mut self, kind: RecordKind) -> Result<()> {
        self.ping.kind = kind;
        let descriptor = self.format.descriptor();
        self.ping.check_counts(
            descriptor.beams_bath_max,
            descriptor.beams_amp_max,
            descriptor.pixels_ss_max,
        )?;
        self.codec.get_mut("insert")?.insert(&self.ping)
    }

    /// Write the record of `kind` the codec currently holds, without
    /// inserting the session ping first.
    ///
    /// Used after `insert`, `insert_navigation`, `insert_attitude` or
    /// `insert_sound_velocity_profile` to write the inserted record.
    pub fn write_record(&mut self, kind: RecordKind) -> Result<()> {
        self.ensure_writable("write_record")?;
        let _span = self.span.clone().entered();
        self.emit(kind)
    }

    fn emit(&mut self, kind: RecordKind) -> Result<()> {
        let descriptor = self.format.descriptor();
        let codec = self.codec.get_mut("write")?;
        let mut ctx = WriteContext::new(&mut self.outputs, descriptor);
        match codec.write_ping(&mut ctx, kind) {
            Ok(()) => {
                self.stats.record_written(kind);
                Ok(())
            }
            Err(e @ (SwathError::WriteFailed { .. } | SwathError::Io(_))) => {
                self.poisoned = true;
                warn!(error = %e, "write failed, session poisoned");
                Err(match e {
                    SwathError::Io(message) => SwathError::write_failed(message),
                    other => other,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        self.ensure_open(operation)?;
        self.ensure_mode(AccessMode::Write, operation)?;
        if self.poisoned {
            return Err(SwathError::write_failed(
                "stream left inconsistent by an earlier write failure",
            ));
        }
        Ok(())
    }

    /// Copy `ping` into the session buffer and write it as its own kind.
    pub fn write(&mut self, ping: &Ping) -> Result<()> {
        self.ensure_writable("write")?;
        self.ping.clone_from(ping);
        self.write_ping(ping.kind)
    }

    /// The normalized ping of the last read, or the one about to be written.
    pub fn ping(&self) -> &Ping {
        &self.ping
    }

    pub fn ping_mut(&mut self) -> &mut Ping {
        &mut self.ping
    }

    pub fn extract_navigation(&self) -> Result<NavRecord> {
        self.ensure_open("extract_navigation")?;
        self.codec
            .get("extract_navigation")?
            .extract_navigation(self.params.lonflip)
    }

    pub fn insert_navigation(&mut self, nav: &NavRecord) -> Result<()> {
        self.ensure_open("insert_navigation")?;
        self.codec.get_mut("insert_navigation")?.insert_navigation(nav)
    }

    pub fn extract_attitude(&self) -> Result<AttitudeRecord> {
        self.ensure_open("extract_attitude")?;
        self.codec.get("extract_attitude")?.extract_attitude()
    }

    pub fn insert_attitude(&mut self, attitude: &AttitudeRecord) -> Result<()> {
        self.ensure_open("insert_attitude")?;
        self.codec.get_mut("insert_attitude")?.insert_attitude(attitude)
    }

    pub fn extract_sound_velocity_profile(&self) -> Result<SoundVelocityProfile> {
        self.ensure_open("extract_sound_velocity_profile")?;
        self.codec
            .get("extract_sound_velocity_profile")?
            .extract_sound_velocity_profile()
    }

    pub fn insert_sound_velocity_profile(&mut self, svp: &SoundVelocityProfile) -> Result<()> {
        self.ensure_open("insert_sound_velocity_profile")?;
        self.codec
            .get_mut("insert_sound_velocity_profile")?
            .insert_sound_velocity_profile(svp)
    }

    pub fn extract_altitude(&self) -> Result<Altitude> {
        self.ensure_open("extract_altitude")?;
        self.codec.get("extract_altitude")?.extract_altitude()
    }

    pub fn insert_altitude(&mut self, altitude: &Altitude) -> Result<()> {
        self.ensure_open("insert_altitude")?;
        self.codec.get_mut("insert_altitude")?.insert_altitude(altitude)
    }

    /// Sensor fixes gathered so far.
    pub fn fixes(&self) -> &SensorFixes {
        &self.fixes
    }

    pub fn descriptor(&self) -> &FormatDescriptor {
        self.format.descriptor()
    }

    pub fn format_id(&self) -> i32 {
        self.format.descriptor().id
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn window(&self) -> &PingWindow {
        &self.window
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Path (or stream label) the session was opened on.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Whether a write failure has disabled further writes.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Close the session.
    ///
    /// Frees the codec state first, then flushes and drops the streams and
    /// releases the buffers. Resources are released even when flushing
    /// fails; the flush error is returned as `WriteFailed`.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open("close")?;
        let _span = self.span.clone().entered();
        let result = self.release();
        debug!(
            records_read = self.stats.records_read,
            records_written = self.stats.records_written,
            "session closed"
        );
        result
    }

    fn release(&mut self) -> Result<()> {
        self.codec.release();
        let mut result = Ok(());
        for output in self.outputs.iter_mut() {
            if let Err(e) = output.flush() {
                if result.is_ok() {
                    result = Err(SwathError::write_failed(e.to_string()));
                }
            }
        }
        self.outputs = Vec::new();
        self.inputs = Vec::new();
        self.ping = Ping::default();
        self.fixes = SensorFixes::new(1);
        self.averager = None;
        self.state = SessionState::Closed;
        result
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            _ => Err(SwathError::use_after_close(operation)),
        }
    }

    fn ensure_mode(&self, mode: AccessMode, operation: &str) -> Result<()> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(SwathError::bad_parameter(
                "mode",
                format!("{operation} on a session opened for {:?}", self.mode),
            ))
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::Open {
            if let Err(e) = self.release() {
                warn!(label = %self.label, error = %e, "flush failed while dropping session");
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("format", &self.format.descriptor().name)
            .field("label", &self.label)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_status_codes() {
        let clean = ReadStatus {
            kind: RecordKind::Data,
            advisory: None,
        };
        assert!(clean.is_clean());
        assert_eq!(clean.status(), StatusCode::Success);

        let gap = ReadStatus {
            kind: RecordKind::Data,
            advisory: Some(Advisory::TimeGap { gap_seconds: 90.0 }),
        };
        assert!(!gap.is_clean());
        assert_eq!(gap.status(), StatusCode::TimeGap);
    }

    #[test]
    fn test_stats_counters() {
        let mut stats = SessionStats::default();
        stats.record_read(RecordKind::Data, None);
        stats.record_read(RecordKind::Data, Some(Advisory::OutOfBounds));
        stats.record_read(RecordKind::Comment, None);
        stats.record_written(RecordKind::Data);
        assert_eq!(stats.records_read, 3);
        assert_eq!(stats.read_by_kind["data"], 2);
        assert_eq!(stats.read_by_kind["comment"], 1);
        assert_eq!(stats.out_of_bounds, 1);
        assert_eq!(stats.advisories(), 1);
        assert_eq!(stats.written_by_kind["data"], 1);
    }

    struct Counting(Arc<std::sync::atomic::AtomicUsize>);

    impl CodecState for Counting {
        fn read_ping(&mut self, _ctx: &mut ReadContext<'_>) -> Result<RecordKind> {
            Err(SwathError::EndOfFile)
        }

        fn write_ping(&mut self, _ctx: &mut WriteContext<'_>, _kind: RecordKind) -> Result<()> {
            Ok(())
        }

        fn extract(&self, _ping: &mut Ping, _lonflip: crate::core::LonFlip) -> Result<()> {
            Ok(())
        }

        fn insert(&mut self, _ping: &Ping) -> Result<()> {
            Ok(())
        }

        fn free(&mut self) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn test_codec_slot_frees_once() {
        let freed = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut slot = CodecSlot::new(Box::new(Counting(freed.clone())));
        assert!(slot.get("x").is_ok());
        slot.release();
        slot.release();
        drop(slot);
        assert_eq!(freed.load(std::sync::atomic::Ordering::SeqCst), 1);

        let slot = CodecSlot::new(Box::new(Counting(freed.clone())));
        drop(slot);
        assert_eq!(freed.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_released_slot_is_use_after_close() {
        let freed = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut slot = CodecSlot::new(Box::new(Counting(freed)));
        slot.release();
        let err = slot.get_mut("read_ping").err().unwrap();
        assert_eq!(err.status(), StatusCode::UseAfterClose);
    }
}

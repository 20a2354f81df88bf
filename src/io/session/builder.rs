// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Builder for opening sessions.
//!
//! The builder is the `Unopened` state: it holds the parameters and,
//! optionally, an explicit codec, registry or tracing span. Each `open_*`
//! call runs the `Opening` steps in order:
//!
//! 1. validate the parameters
//! 2. resolve the format (explicit codec, format id, or detection)
//! 3. reserve the normalized ping, the fix stores and averaging buffers
//! 4. allocate the codec state
//! 5. open the streams for the descriptor's arity and encoding
//!
//! A failure at any step drops everything acquired so far (the codec state
//! is freed) and returns `OpenFailed` wrapping the cause.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, debug_span, Span};

use crate::core::{CalendarTime, GeoBounds, LonFlip, Ping, Result, SwathError};
use crate::io::descriptor::FileEncoding;
use crate::io::detection::{detect_format_in, sniff};
use crate::io::filter::WindowTracker;
use crate::io::params::SessionParams;
use crate::io::registry::{global_registry, FormatRegistry};
use crate::io::traits::{AccessMode, InputStream, OutputStream, SwathFormat};
use crate::nav::SensorFixes;

use super::average::PingAverager;
use super::{CodecSlot, Session, SessionState, SessionStats};

/// Where a session's bytes come from or go to.
enum Source<'a> {
    Path(&'a Path),
    Readers(Vec<InputStream>),
    Writers(Vec<OutputStream>),
}

/// Builder for [`Session`].
///
/// # Example
///
/// ```rust,no_run
/// use swathcodec::core::GeoBounds;
/// use swathcodec::io::SessionBuilder;
///
/// let session = SessionBuilder::new()
///     .format(71)
///     .bounds(GeoBounds::new(-10.0, 10.0, -5.0, 5.0))
///     .time_gap(3600.0)
///     .open_read("line0001.swb")?;
/// # Ok::<(), swathcodec::SwathError>(())
/// ```
#[derive(Clone, Default)]
pub struct SessionBuilder {
    params: SessionParams,
    codec: Option<Arc<dyn SwathFormat>>,
    registry: Option<FormatRegistry>,
    span: Option<Span>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a full parameter set.
    pub fn params(mut self, params: SessionParams) -> Self {
        self.params = params;
        self
    }

    /// Format id; 0 infers it from the file.
    pub fn format(mut self, format_id: i32) -> Self {
        self.params.format = format_id;
        self
    }

    pub fn ping_average(mut self, pings: usize) -> Self {
        self.params.ping_average = pings;
        self
    }

    pub fn lonflip(mut self, lonflip: LonFlip) -> Self {
        self.params.lonflip = lonflip;
        self
    }

    pub fn bounds(mut self, bounds: GeoBounds) -> Self {
        self.params.bounds = bounds;
        self
    }

    pub fn time_window(mut self, start: CalendarTime, end: CalendarTime) -> Self {
        self.params.start = start;
        self.params.end = end;
        self
    }

    /// Minimum speed, km/h.
    pub fn speed_min(mut self, speed: f64) -> Self {
        self.params.speed_min = speed;
        self
    }

    /// Maximum gap between consecutive survey pings, seconds.
    pub fn time_gap(mut self, seconds: f64) -> Self {
        self.params.time_gap = seconds;
        self
    }

    pub fn fix_capacity(mut self, capacity: usize) -> Self {
        self.params.fix_capacity = capacity;
        self
    }

    /// Use this codec instead of looking one up.
    pub fn codec(mut self, codec: Arc<dyn SwathFormat>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Resolve formats against this registry instead of the built-in one.
    pub fn registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Record session events inside this span.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn get_params(&self) -> &SessionParams {
        &self.params
    }

    /// Open `path` (and its companion files) for reading.
    pub fn open_read<P: AsRef<Path>>(&self, path: P) -> Result<Session> {
        let path = path.as_ref();
        self.open(&path.display().to_string(), AccessMode::Read, Source::Path(path))
    }

    /// Open `path` (and its companion files) for writing, truncating them.
    pub fn open_write<P: AsRef<Path>>(&self, path: P) -> Result<Session> {
        let path = path.as_ref();
        self.open(&path.display().to_string(), AccessMode::Write, Source::Path(path))
    }

    /// Open caller-supplied input streams, primary first.
    pub fn open_read_streams(&self, label: &str, streams: Vec<InputStream>) -> Result<Session> {
        self.open(label, AccessMode::Read, Source::Readers(streams))
    }

    /// Open caller-supplied output streams, primary first.
    pub fn open_write_streams(&self, label: &str, streams: Vec<OutputStream>) -> Result<Session> {
        self.open(label, AccessMode::Write, Source::Writers(streams))
    }

    fn open(&self, label: &str, mode: AccessMode, source: Source<'_>) -> Result<Session> {
        debug!(label, state = ?SessionState::Opening, ?mode, "opening session");
        self.try_open(label, mode, source)
            .map_err(|cause| SwathError::open_failed(label, cause))
    }

    fn try_open(&self, label: &str, mode: AccessMode, mut source: Source<'_>) -> Result<Session> {
        let window = self.params.validate()?;
        let format = self.resolve(&mut source)?;
        let descriptor = format.descriptor();

        let ping = Ping::with_capacity(
            descriptor.beams_bath_max,
            descriptor.beams_amp_max,
            descriptor.pixels_ss_max,
        )?;
        let fixes = SensorFixes::try_with_capacity(self.params.fix_capacity)?;
        let averager = if self.params.ping_average > 1 && mode == AccessMode::Read {
            Some(PingAverager::try_new(descriptor)?)
        } else {
            None
        };

        let mut codec = CodecSlot::new(format.allocate()?);

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        match (source, descriptor.encoding) {
            (Source::Path(path), FileEncoding::External) => {
                codec
                    .get_mut("open_external")?
                    .open_external(&descriptor.file_paths(path), mode)?;
            }
            (_, FileEncoding::External) => {
                return Err(SwathError::bad_parameter(
                    "streams",
                    format!("{} manages its own files", descriptor.name),
                ));
            }
            (Source::Path(path), _) => {
                let paths = descriptor.file_paths(path);
                match mode {
                    AccessMode::Read => inputs = open_inputs(&paths)?,
                    AccessMode::Write => outputs = create_outputs(&paths)?,
                }
            }
            (Source::Readers(streams), _) => {
                check_arity(descriptor.arity(), streams.len())?;
                inputs = streams;
            }
            (Source::Writers(streams), _) => {
                check_arity(descriptor.arity(), streams.len())?;
                outputs = streams;
            }
        }

        let span = self.span.clone().unwrap_or_else(
            || debug_span!("swath_session", format_id = descriptor.id, path = %label),
        );
        debug!(parent: &span, format = descriptor.name, "session open");

        Ok(Session {
            codec,
            format,
            params: self.params.clone(),
            window,
            tracker: WindowTracker::new(),
            mode,
            label: label.to_string(),
            inputs,
            outputs,
            ping,
            fixes,
            averager,
            state: SessionState::Open,
            poisoned: false,
            stats: SessionStats::default(),
            span,
        })
    }

    fn resolve(&self, source: &mut Source<'_>) -> Result<Arc<dyn SwathFormat>> {
        if let Some(codec) = &self.codec {
            return Ok(codec.clone());
        }
        let registry = self.registry.as_ref().unwrap_or_else(|| global_registry());
        let format_id = if self.params.format != 0 {
            self.params.format
        } else {
            match source {
                Source::Path(path) => detect_format_in(registry, path)?,
                Source::Readers(streams) => {
                    let header = match streams.first_mut() {
                        Some(stream) => stream.fill_buf()?,
                        None => &[],
                    };
                    sniff(header).ok_or_else(|| SwathError::unknown_format(0))?
                }
                Source::Writers(_) => return Err(SwathError::unknown_format(0)),
            }
        };
        registry.codec(format_id)
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("params", &self.params)
            .field("codec", &self.codec.as_ref().map(|c| c.descriptor().name))
            .finish()
    }
}

fn check_arity(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SwathError::bad_parameter(
            "streams",
            format!("format uses {expected} streams, {actual} supplied"),
        ))
    }
}

fn open_inputs(paths: &[PathBuf]) -> Result<Vec<InputStream>> {
    let mut inputs: Vec<InputStream> = Vec::new();
    inputs.try_reserve_exact(paths.len())?;
    for path in paths {
        let file = File::open(path)
            .map_err(|e| SwathError::Io(format!("{}: {e}", path.display())))?;
        inputs.push(Box::new(BufReader::new(file)));
    }
    Ok(inputs)
}

fn create_outputs(paths: &[PathBuf]) -> Result<Vec<OutputStream>> {
    let mut outputs: Vec<OutputStream> = Vec::new();
    outputs.try_reserve_exact(paths.len())?;
    for path in paths {
        let file = File::create(path)
            .map_err(|e| SwathError::Io(format!("{}: {e}", path.display())))?;
        outputs.push(Box::new(BufWriter::new(file)));
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_params_fail_before_resolution() {
        let err = SessionBuilder::new()
            .format(71)
            .bounds(GeoBounds::new(5.0, -5.0, 0.0, 1.0))
            .open_read_streams("mem", Vec::new())
            .unwrap_err();
        assert!(matches!(err, SwathError::OpenFailed { .. }));
        assert!(matches!(err.root_cause(), SwathError::BadParameter { .. }));
    }

    #[test]
    fn test_unknown_format_id() {
        let err = SessionBuilder::new()
            .format(4242)
            .open_read_streams("mem", Vec::new())
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            SwathError::UnknownFormat { format_id: 4242 }
        ));
    }

    #[test]
    fn test_stream_arity_checked() {
        let streams: Vec<InputStream> = vec![Box::new(std::io::Cursor::new(Vec::new()))];
        let err = SessionBuilder::new()
            .format(166)
            .open_read_streams("mem", streams)
            .unwrap_err();
        assert!(matches!(err.root_cause(), SwathError::BadParameter { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = SessionBuilder::new()
            .format(71)
            .open_read("/nonexistent/swathcodec/line.swb")
            .unwrap_err();
        assert_eq!(err.status(), crate::core::StatusCode::OpenFailed);
        assert!(matches!(err.root_cause(), SwathError::Io(_)));
    }
}

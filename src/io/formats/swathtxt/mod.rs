// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! SWATHTXT: plain text swath format with a navigation companion file (id 166).
//!
//! The primary file carries comments and survey pings without position.
//! Position lives only in `<file>.nav`; while reading, companion lines are
//! pulled into the position and heading stores until one lies past the
//! current ping, and the ping is positioned by interpolation.

mod lines;

use std::io::{BufRead, Write};

use tracing::{trace, warn};

use crate::core::{LonFlip, NavRecord, Ping, RecordKind, Result, SwathError};
use crate::io::descriptor::{FileEncoding, FormatDescriptor, SystemFamily};
use crate::io::traits::{CodecState, ReadContext, SwathFormat, WriteContext};

pub use lines::HEADER_TAG;
use lines::{classify, comment_line, header_line, Limits, Line, NavLine, TextPing};

pub const FORMAT_ID: i32 = 166;

const NAV_STREAM: usize = 1;

static DESCRIPTOR: FormatDescriptor = FormatDescriptor {
    id: FORMAT_ID,
    name: "SWATHTXT",
    description: "Plain text swath pings with navigation in a .nav companion file",
    family: SystemFamily::Text,
    beams_bath_max: 1024,
    beams_amp_max: 1024,
    pixels_ss_max: 4096,
    companion_suffixes: &[".nav"],
    encoding: FileEncoding::Plain,
    variable_beams: true,
    traveltime: false,
    beam_flagging: false,
    nav_source: Some(RecordKind::Navigation),
    heading_source: Some(RecordKind::Data),
    attitude_source: None,
    svp_source: None,
    beamwidth_along: 2.0,
    beamwidth_across: 2.0,
    extensions: &["txt"],
};

/// Registry entry for SWATHTXT.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwathTextFormat;

impl SwathFormat for SwathTextFormat {
    fn descriptor(&self) -> &FormatDescriptor {
        &DESCRIPTOR
    }

    fn allocate(&self) -> Result<Box<dyn CodecState>> {
        Ok(Box::new(SwathTextState::try_new(&DESCRIPTOR)?))
    }
}

/// Codec-private state of one SWATHTXT session.
#[derive(Debug, Default)]
pub struct SwathTextState {
    header_written: bool,
    kind: RecordKind,
    ping: TextPing,
    nav: NavLine,
    comment: String,
    /// Latest companion fix pulled into the stores.
    nav_horizon: Option<f64>,
    nav_exhausted: bool,
    line: Vec<u8>,
    text: String,
}

impl SwathTextState {
    fn try_new(descriptor: &FormatDescriptor) -> Result<Self> {
        let mut state = Self::default();
        state.ping.beams.try_reserve_exact(descriptor.beams_bath_max)?;
        state.ping.amp.try_reserve_exact(descriptor.beams_amp_max)?;
        state.ping.pixels.try_reserve_exact(descriptor.pixels_ss_max)?;
        Ok(state)
    }

    /// Pull companion fixes until one lies past `time_d` or the file ends.
    fn pull_navigation(&mut self, ctx: &mut ReadContext<'_>, time_d: f64) -> Result<()> {
        while !self.nav_exhausted && self.nav_horizon.map_or(true, |t| t <= time_d) {
            let stream = ctx.stream(NAV_STREAM)?;
            self.line.clear();
            if stream.read_until(b'\n', &mut self.line)? == 0 {
                self.nav_exhausted = true;
                break;
            }
            let text = String::from_utf8_lossy(&self.line);
            match NavLine::parse(&text) {
                Ok(Some(nav)) => {
                    let added = ctx.fixes.add_position(nav.time_d, nav.longitude, nav.latitude);
                    ctx.fixes.add_heading(nav.time_d, nav.heading);
                    if added {
                        self.nav_horizon = Some(nav.time_d);
                    }
                    self.nav = nav;
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "skipping navigation line"),
            }
        }
        Ok(())
    }

    fn position_ping(&mut self, ctx: &ReadContext<'_>) {
        let time_d = self.ping.time_d;
        if let Ok(heading) = ctx.fixes.heading_at(time_d) {
            if self.ping.heading == 0.0 {
                self.ping.heading = heading;
            }
        }
        match ctx.fixes.position_at(time_d, self.ping.heading, self.ping.speed) {
            Ok(estimate) => {
                self.ping.longitude = estimate.longitude;
                self.ping.latitude = estimate.latitude;
                if self.ping.speed <= 0.0 {
                    self.ping.speed = estimate.speed;
                }
            }
            Err(e) => {
                trace!(time_d, error = %e, "ping left unpositioned");
                self.ping.longitude = 0.0;
                self.ping.latitude = 0.0;
            }
        }
    }

    fn limits(descriptor: &FormatDescriptor) -> Limits {
        Limits {
            beams: descriptor.beams_bath_max,
            amp: descriptor.beams_amp_max,
            pixels: descriptor.pixels_ss_max,
        }
    }
}

impl CodecState for SwathTextState {
    fn read_ping(&mut self, ctx: &mut ReadContext<'_>) -> Result<RecordKind> {
        let limits = Self::limits(ctx.descriptor);
        loop {
            self.line.clear();
            if ctx.primary()?.read_until(b'\n', &mut self.line)? == 0 {
                return Err(SwathError::EndOfFile);
            }
            let text = std::str::from_utf8(&self.line)
                .map_err(|_| SwathError::unintelligible(DESCRIPTOR.name, "line is not UTF-8"))?;
            match classify(text)? {
                Line::Blank | Line::Header(_) => continue,
                Line::Comment(comment) => {
                    self.comment.clear();
                    self.comment.push_str(comment);
                    self.kind = RecordKind::Comment;
                }
                Line::Ping => {
                    self.ping.parse(text, limits)?;
                    let time_d = self.ping.time_d;
                    self.pull_navigation(ctx, time_d)?;
                    self.position_ping(ctx);
                    self.kind = RecordKind::Data;
                }
            }
            return Ok(self.kind);
        }
    }

    fn write_ping(&mut self, ctx: &mut WriteContext<'_>, kind: RecordKind) -> Result<()> {
        let write_failed = |e: std::io::Error| SwathError::write_failed(e.to_string());
        if !self.header_written {
            ctx.primary()?
                .write_all(header_line().as_bytes())
                .map_err(write_failed)?;
            self.header_written = true;
        }
        match kind {
            RecordKind::Data => {
                self.ping.format(&mut self.text);
                ctx.primary()?
                    .write_all(self.text.as_bytes())
                    .map_err(write_failed)?;
                NavLine {
                    time_d: self.ping.time_d,
                    longitude: self.ping.longitude,
                    latitude: self.ping.latitude,
                    speed: self.ping.speed,
                    heading: self.ping.heading,
                }
                .format(&mut self.text);
                ctx.stream(NAV_STREAM)?
                    .write_all(self.text.as_bytes())
                    .map_err(write_failed)?;
            }
            RecordKind::Comment => {
                comment_line(&self.comment, &mut self.text);
                ctx.primary()?
                    .write_all(self.text.as_bytes())
                    .map_err(write_failed)?;
            }
            RecordKind::Navigation => {
                self.nav.format(&mut self.text);
                ctx.stream(NAV_STREAM)?
                    .write_all(self.text.as_bytes())
                    .map_err(write_failed)?;
            }
            other => return Err(SwathError::unsupported(format!("write {other} records"))),
        }
        self.kind = kind;
        Ok(())
    }

    fn extract(&self, ping: &mut Ping, lonflip: LonFlip) -> Result<()> {
        match self.kind {
            RecordKind::Data => {
                ping.set_time_d(self.ping.time_d)?;
                ping.longitude = lonflip.apply(self.ping.longitude);
                ping.latitude = self.ping.latitude;
                ping.heading = self.ping.heading;
                ping.speed = self.ping.speed;
                for (flag, depth, across, along) in &self.ping.beams {
                    ping.push_beam(*flag, *depth, *across, *along);
                }
                ping.amp.extend_from_slice(&self.ping.amp);
                for (value, across, along) in &self.ping.pixels {
                    ping.push_pixel(*value, *across, *along);
                }
            }
            RecordKind::Comment => ping.comment.push_str(&self.comment),
            _ => {}
        }
        Ok(())
    }

    fn insert(&mut self, ping: &Ping) -> Result<()> {
        match ping.kind {
            RecordKind::Data => {
                let out = &mut self.ping;
                out.time_d = ping.time_d;
                out.longitude = ping.longitude;
                out.latitude = ping.latitude;
                out.heading = ping.heading;
                out.speed = ping.speed;
                out.beams.clear();
                for i in 0..ping.beam_count() {
                    out.beams.push((
                        ping.beam_flags[i],
                        ping.bath[i],
                        ping.bath_acrosstrack[i],
                        ping.bath_alongtrack[i],
                    ));
                }
                out.amp.clear();
                out.amp.extend_from_slice(&ping.amp);
                out.pixels.clear();
                for i in 0..ping.pixel_count() {
                    out.pixels
                        .push((ping.ss[i], ping.ss_acrosstrack[i], ping.ss_alongtrack[i]));
                }
            }
            RecordKind::Comment => {
                self.comment.clear();
                self.comment.push_str(&ping.comment);
            }
            RecordKind::Navigation => {
                self.nav = NavLine {
                    time_d: ping.time_d,
                    longitude: ping.longitude,
                    latitude: ping.latitude,
                    speed: ping.speed,
                    heading: ping.heading,
                };
            }
            _ => {}
        }
        self.kind = ping.kind;
        Ok(())
    }

    fn extract_navigation(&self, lonflip: LonFlip) -> Result<NavRecord> {
        if self.kind != RecordKind::Data {
            return Err(SwathError::bad_parameter(
                "record",
                format!("no navigation in a {} record", self.kind),
            ));
        }
        Ok(NavRecord {
            kind: RecordKind::Data,
            time_d: self.ping.time_d,
            longitude: lonflip.apply(self.ping.longitude),
            latitude: self.ping.latitude,
            speed: self.ping.speed,
            heading: self.ping.heading,
            ..NavRecord::default()
        })
    }

    fn insert_navigation(&mut self, nav: &NavRecord) -> Result<()> {
        self.nav = NavLine {
            time_d: nav.time_d,
            longitude: nav.longitude,
            latitude: nav.latitude,
            speed: nav.speed,
            heading: nav.heading,
        };
        if self.kind == RecordKind::Data {
            self.ping.longitude = nav.longitude;
            self.ping.latitude = nav.latitude;
            self.ping.speed = nav.speed;
            self.ping.heading = nav.heading;
        }
        Ok(())
    }

    fn free(&mut self) {
        self.ping = TextPing::default();
        self.line = Vec::new();
        self.text = String::new();
    }
}

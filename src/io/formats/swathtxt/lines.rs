// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! SWATHTXT line grammar.
//!
//! Primary file:
//!
//! ```text
//! ##SWATHTXT 1
//! # free text comment
//! P <time_d> <heading> <speed> <nb> <na> <np> {<depth> <across> <along>}*nb {<amp>}*na {<ss> <across> <along>}*np
//! ```
//!
//! Navigation companion (`<file>.nav`), one fix per line:
//!
//! ```text
//! <time_d> <lon> <lat> <speed> <heading>
//! ```
//!
//! Depths of beams that are not good are written as `nan`.

use std::fmt::Write as _;
use std::str::{FromStr, SplitAsciiWhitespace};

use crate::core::{BeamFlag, CalendarTime, Result, SwathError};

pub const HEADER_TAG: &str = "##SWATHTXT";
pub const VERSION: u32 = 1;

const NAME: &str = "SWATHTXT";

fn unintelligible(reason: impl Into<String>) -> SwathError {
    SwathError::unintelligible(NAME, reason)
}

/// One classified primary-file line.
#[derive(Debug, PartialEq)]
pub(crate) enum Line<'a> {
    Blank,
    Header(u32),
    Comment(&'a str),
    Ping,
}

/// Classify a primary-file line; ping lines are parsed by [`TextPing::parse`].
pub(crate) fn classify(line: &str) -> Result<Line<'_>> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.trim().is_empty() {
        Ok(Line::Blank)
    } else if let Some(rest) = trimmed.strip_prefix(HEADER_TAG) {
        let version = rest
            .trim()
            .parse::<u32>()
            .map_err(|_| unintelligible(format!("bad header {trimmed:?}")))?;
        if version == 0 || version > VERSION {
            return Err(unintelligible(format!("unsupported version {version}")));
        }
        Ok(Line::Header(version))
    } else if let Some(text) = trimmed.strip_prefix('#') {
        Ok(Line::Comment(text.strip_prefix(' ').unwrap_or(text)))
    } else if trimmed.starts_with("P ") {
        Ok(Line::Ping)
    } else {
        Err(unintelligible(format!(
            "unrecognised line starting {:?}",
            trimmed.chars().take(16).collect::<String>()
        )))
    }
}

struct Fields<'a> {
    inner: SplitAsciiWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            inner: line.split_ascii_whitespace(),
        }
    }

    fn next<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self
            .inner
            .next()
            .ok_or_else(|| unintelligible(format!("missing {what}")))?;
        token
            .parse()
            .map_err(|_| unintelligible(format!("bad {what} {token:?}")))
    }

    fn time(&mut self) -> Result<f64> {
        let time_d: f64 = self.next("time")?;
        if !CalendarTime::is_representable(time_d) {
            return Err(unintelligible(format!("time {time_d} out of range")));
        }
        Ok(time_d)
    }

    fn finish(mut self) -> Result<()> {
        match self.inner.next() {
            Some(token) => Err(unintelligible(format!("unexpected trailing field {token:?}"))),
            None => Ok(()),
        }
    }
}

/// Limits a ping line is checked against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    pub beams: usize,
    pub amp: usize,
    pub pixels: usize,
}

/// A survey ping as carried by the primary file.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TextPing {
    pub time_d: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub heading: f64,
    /// km/h, zero when unknown
    pub speed: f64,
    pub beams: Vec<(BeamFlag, f64, f64, f64)>,
    pub amp: Vec<f64>,
    pub pixels: Vec<(f64, f64, f64)>,
}

impl TextPing {
    /// Parse a `P` line in place. Position is not carried by the line and
    /// is left untouched.
    pub(crate) fn parse(&mut self, line: &str, limits: Limits) -> Result<()> {
        let mut fields = Fields::new(line);
        let _tag: String = fields.next("record tag")?;
        self.time_d = fields.time()?;
        self.heading = fields.next("heading")?;
        self.speed = fields.next("speed")?;
        let nb: usize = fields.next("beam count")?;
        let na: usize = fields.next("amplitude count")?;
        let np: usize = fields.next("pixel count")?;
        for (what, count, max) in [
            ("beams", nb, limits.beams),
            ("amplitudes", na, limits.amp),
            ("pixels", np, limits.pixels),
        ] {
            if count > max {
                return Err(unintelligible(format!("{count} {what} exceed maximum {max}")));
            }
        }

        self.beams.clear();
        for _ in 0..nb {
            let depth: f64 = fields.next("depth")?;
            let across = fields.next("acrosstrack")?;
            let along = fields.next("alongtrack")?;
            if depth.is_nan() {
                self.beams.push((BeamFlag::NULL, 0.0, across, along));
            } else {
                self.beams.push((BeamFlag::GOOD, depth, across, along));
            }
        }
        self.amp.clear();
        for _ in 0..na {
            self.amp.push(fields.next("amplitude")?);
        }
        self.pixels.clear();
        for _ in 0..np {
            let value = fields.next("sidescan")?;
            let across = fields.next("acrosstrack")?;
            let along = fields.next("alongtrack")?;
            self.pixels.push((value, across, along));
        }
        fields.finish()
    }

    /// Format as a `P` line, newline included.
    pub(crate) fn format(&self, out: &mut String) {
        out.clear();
        let _ = write!(
            out,
            "P {:.6} {:.2} {:.3} {} {} {}",
            self.time_d,
            self.heading,
            self.speed,
            self.beams.len(),
            self.amp.len(),
            self.pixels.len()
        );
        for (flag, depth, across, along) in &self.beams {
            if flag.is_good() {
                let _ = write!(out, " {depth:.3} {across:.3} {along:.3}");
            } else {
                let _ = write!(out, " nan {across:.3} {along:.3}");
            }
        }
        for amp in &self.amp {
            let _ = write!(out, " {amp:.3}");
        }
        for (value, across, along) in &self.pixels {
            let _ = write!(out, " {value:.3} {across:.3} {along:.3}");
        }
        out.push('\n');
    }
}

/// One navigation companion line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct NavLine {
    pub time_d: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub speed: f64,
    pub heading: f64,
}

impl NavLine {
    /// Parse a companion line; `Ok(None)` for blank and `#` lines.
    pub(crate) fn parse(line: &str) -> Result<Option<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        let mut fields = Fields::new(trimmed);
        let nav = Self {
            time_d: fields.time()?,
            longitude: fields.next("longitude")?,
            latitude: fields.next("latitude")?,
            speed: fields.next("speed")?,
            heading: fields.next("heading")?,
        };
        fields.finish()?;
        Ok(Some(nav))
    }

    pub(crate) fn format(&self, out: &mut String) {
        out.clear();
        let _ = writeln!(
            out,
            "{:.6} {:.9} {:.9} {:.3} {:.2}",
            self.time_d, self.longitude, self.latitude, self.speed, self.heading
        );
    }
}

/// Header line, newline included.
pub(crate) fn header_line() -> String {
    format!("{HEADER_TAG} {VERSION}\n")
}

/// Comment line; embedded newlines are flattened to spaces.
pub(crate) fn comment_line(text: &str, out: &mut String) {
    out.clear();
    out.push_str("# ");
    out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: Limits = Limits {
        beams: 4,
        amp: 4,
        pixels: 4,
    };

    #[test]
    fn test_classify() {
        assert_eq!(classify("\n").unwrap(), Line::Blank);
        assert_eq!(classify("##SWATHTXT 1\n").unwrap(), Line::Header(1));
        assert_eq!(classify("# hello\n").unwrap(), Line::Comment("hello"));
        assert_eq!(classify("P 1 0 0 0 0 0").unwrap(), Line::Ping);
        assert!(classify("##SWATHTXT 9").is_err());
        assert!(classify("Q 1 2 3").is_err());
    }

    #[test]
    fn test_parse_ping_line() {
        let mut ping = TextPing::default();
        ping.parse(
            "P 100.5 45.00 12.000 2 1 1 10.0 -5.0 0.5 nan 5.0 0.0 3.5 7.0 1.0 2.0\n",
            LIMITS,
        )
        .unwrap();
        assert_eq!(ping.time_d, 100.5);
        assert_eq!(ping.beams[0], (BeamFlag::GOOD, 10.0, -5.0, 0.5));
        assert_eq!(ping.beams[1].0, BeamFlag::NULL);
        assert_eq!(ping.amp, vec![3.5]);
        assert_eq!(ping.pixels, vec![(7.0, 1.0, 2.0)]);
    }

    #[test]
    fn test_parse_rejects_bad_counts() {
        let mut ping = TextPing::default();
        assert!(ping.parse("P 1 0 0 5 0 0", LIMITS).is_err());
        assert!(ping.parse("P 1 0 0 1 0 0 1.0 2.0", LIMITS).is_err());
        assert!(ping.parse("P 1 0 0 0 0 0 extra", LIMITS).is_err());
    }

    #[test]
    fn test_parse_rejects_unrepresentable_time() {
        let mut ping = TextPing::default();
        for line in ["P nan 0 0 0 0 0", "P inf 0 0 0 0 0", "P 1e300 0 0 0 0 0"] {
            let err = ping.parse(line, LIMITS).unwrap_err();
            assert!(matches!(err, SwathError::Unintelligible { .. }), "{err:?}");
        }
        assert!(NavLine::parse("nan 1.5 -2.5 8.0 270.0").is_err());
    }

    #[test]
    fn test_format_nulls_flagged_beams() {
        let ping = TextPing {
            time_d: 1.0,
            beams: vec![
                (BeamFlag::GOOD, 10.0, 1.0, 0.0),
                (BeamFlag::MANUAL, 11.0, 2.0, 0.0),
            ],
            ..TextPing::default()
        };
        let mut out = String::new();
        ping.format(&mut out);
        assert_eq!(
            out,
            "P 1.000000 0.00 0.000 2 0 0 10.000 1.000 0.000 nan 2.000 0.000\n"
        );

        let mut back = TextPing::default();
        back.parse(&out, LIMITS).unwrap();
        assert_eq!(back.beams[1], (BeamFlag::NULL, 0.0, 2.0, 0.0));
    }

    #[test]
    fn test_nav_line() {
        assert_eq!(NavLine::parse("  \n").unwrap(), None);
        let nav = NavLine::parse("10.0 1.5 -2.5 8.0 270.0").unwrap().unwrap();
        assert_eq!(nav.latitude, -2.5);
        assert!(NavLine::parse("10.0 1.5").is_err());
    }

    #[test]
    fn test_comment_flattened() {
        let mut out = String::new();
        comment_line("two\nlines", &mut out);
        assert_eq!(out, "# two lines\n");
    }
}

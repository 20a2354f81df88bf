// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::io::IsTerminal as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;

use swathcodec::core::{CalendarTime, GeoBounds, LonFlip};
use swathcodec::{ReadStatus, Session, SessionBuilder, SessionParams};

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Session open flags shared by every reading command.
#[derive(Args, Clone, Debug, Default)]
pub struct SessionArgs {
    /// Format id (0 infers it from the file)
    #[arg(short = 'F', long = "format", value_name = "ID")]
    pub format: Option<i32>,

    /// Average this many consecutive survey pings
    #[arg(short = 'P', long = "ping-average", value_name = "N")]
    pub ping_average: Option<usize>,

    /// Longitude convention: -1 [-360,0), 0 [-180,180), 1 [0,360)
    #[arg(short = 'L', long = "lonflip", value_name = "FLAG", allow_negative_numbers = true)]
    pub lonflip: Option<i32>,

    /// Geographic bounds as west/east/south/north
    #[arg(
        short = 'R',
        long = "bounds",
        value_name = "W/E/S/N",
        value_parser = parse_bounds,
        allow_hyphen_values = true
    )]
    pub bounds: Option<GeoBounds>,

    /// Window start as yr/mo/dy/hr/mn/sc[/usec]
    #[arg(short = 'B', long = "begin", value_name = "TIME", value_parser = parse_time)]
    pub begin: Option<CalendarTime>,

    /// Window end as yr/mo/dy/hr/mn/sc[/usec]
    #[arg(short = 'E', long = "end", value_name = "TIME", value_parser = parse_time)]
    pub end: Option<CalendarTime>,

    /// Minimum speed in km/h
    #[arg(short = 'S', long = "speed-min", value_name = "KMH")]
    pub speed_min: Option<f64>,

    /// Maximum gap between pings in seconds
    #[arg(short = 'T', long = "time-gap", value_name = "SECONDS")]
    pub time_gap: Option<f64>,

    /// TOML parameter file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl SessionArgs {
    /// Merge the config file and flags into session parameters.
    pub fn params(&self) -> Result<SessionParams> {
        let mut params = match &self.config {
            Some(path) => SessionParams::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SessionParams::default(),
        };
        if let Some(format) = self.format {
            params.format = format;
        }
        if let Some(n) = self.ping_average {
            params.ping_average = n;
        }
        if let Some(flag) = self.lonflip {
            params.lonflip = LonFlip::from_flag(flag)?;
        }
        if let Some(bounds) = self.bounds {
            params.bounds = bounds;
        }
        if let Some(begin) = self.begin {
            params.start = begin;
        }
        if let Some(end) = self.end {
            params.end = end;
        }
        if let Some(speed) = self.speed_min {
            params.speed_min = speed;
        }
        if let Some(gap) = self.time_gap {
            params.time_gap = gap;
        }
        Ok(params)
    }

    pub fn builder(&self) -> Result<SessionBuilder> {
        Ok(SessionBuilder::new().params(self.params()?))
    }
}

/// Read the next record, averaging when the session asks for it.
pub fn next_record(session: &mut Session) -> swathcodec::Result<ReadStatus> {
    if session.params().ping_average > 1 {
        session.read_averaged()
    } else {
        session.read_ping()
    }
}

/// Parse `west/east/south/north`.
pub fn parse_bounds(s: &str) -> std::result::Result<GeoBounds, String> {
    let values = s
        .split('/')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid bounds {s:?}: {e}"))?;
    match values[..] {
        [west, east, south, north] => Ok(GeoBounds::new(west, east, south, north)),
        _ => Err(format!("bounds need four values as W/E/S/N, got {s:?}")),
    }
}

/// Parse `yr/mo/dy/hr/mn/sc[/usec]`.
pub fn parse_time(s: &str) -> std::result::Result<CalendarTime, String> {
    let values = s
        .split('/')
        .map(|v| v.trim().parse::<i32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid time {s:?}: {e}"))?;
    let mut fields = [0i32; 7];
    match values.len() {
        6 | 7 => fields[..values.len()].copy_from_slice(&values),
        n => return Err(format!("time needs 6 or 7 fields, got {n} in {s:?}")),
    }
    CalendarTime::from_fields(fields).map_err(|e| e.to_string())
}

/// Format epoch seconds as a UTC timestamp.
pub fn format_time(time_d: f64) -> String {
    let secs = time_d.floor();
    let nanos = ((time_d - secs) * 1e9).round().min(999_999_999.0) as u32;
    match chrono::DateTime::<chrono::Utc>::from_timestamp(secs as i64, nanos) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f UTC").to_string(),
        None => format!("{time_d:.6} s"),
    }
}

/// Format a span of seconds.
pub fn format_duration(seconds: f64) -> String {
    let whole = seconds.max(0.0) as u64;
    if whole >= 3600 {
        format!("{}h {}m", whole / 3600, (whole % 3600) / 60)
    } else if whole >= 60 {
        format!("{}m {}s", whole / 60, whole % 60)
    } else {
        format!("{:.3}s", seconds.max(0.0))
    }
}

/// Record counter shown on a terminal.
pub struct Progress {
    inner: Option<indicatif::ProgressBar>,
}

impl Progress {
    pub fn new(prefix: impl Into<String>) -> Self {
        let inner = if std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new_spinner();
            if let Ok(style) = indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {prefix} {pos} records {msg}")
            {
                pb.set_style(style);
            }
            pb.set_prefix(prefix.into());
            Some(pb)
        } else {
            None
        };
        Self { inner }
    }

    pub fn inc(&self) {
        if let Some(pb) = &self.inner {
            pb.inc(1);
        }
    }

    pub fn finish_with_message(&self, msg: String) {
        if let Some(pb) = &self.inner {
            pb.finish_with_message(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds() {
        let b = parse_bounds("-10/10.5/-5/5").unwrap();
        assert_eq!(b, GeoBounds::new(-10.0, 10.5, -5.0, 5.0));
        assert!(parse_bounds("1/2/3").is_err());
        assert!(parse_bounds("a/2/3/4").is_err());
    }

    #[test]
    fn test_parse_time() {
        let t = parse_time("2024/3/1/12/30/15").unwrap();
        assert_eq!(t, CalendarTime::new(2024, 3, 1, 12, 30, 15, 0));
        let t = parse_time("2024/3/1/12/30/15/250000").unwrap();
        assert_eq!(t.microsecond, 250_000);
        assert!(parse_time("2024/13/1/0/0/0").is_err());
        assert!(parse_time("2024/1/1").is_err());
    }

    #[test]
    fn test_flags_override_config_defaults() {
        let args = SessionArgs {
            format: Some(166),
            lonflip: Some(1),
            time_gap: Some(5.0),
            ..SessionArgs::default()
        };
        let params = args.params().unwrap();
        assert_eq!(params.format, 166);
        assert_eq!(params.lonflip, LonFlip::Positive);
        assert_eq!(params.time_gap, 5.0);
        assert_eq!(params.ping_average, 1);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.5), "1970-01-01 00:00:00.500000 UTC");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(1.25), "1.250s");
    }
}

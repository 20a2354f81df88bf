// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! List command - one line per record.

use std::io::Write as _;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::common::{format_time, next_record, Result, SessionArgs};
use swathcodec::io::Advisory;
use swathcodec::{Ping, RecordKind, SwathError};

/// Print one line per record.
#[derive(Args, Clone, Debug)]
pub struct ListCmd {
    /// Input file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    #[command(flatten)]
    session: SessionArgs,

    /// Print JSON lines instead of columns
    #[arg(long)]
    json: bool,

    /// Include comment records
    #[arg(long)]
    comments: bool,

    /// Include pings that raised a windowing advisory
    #[arg(long)]
    keep_advisories: bool,
}

#[derive(Serialize)]
struct Row<'a> {
    kind: RecordKind,
    time_d: f64,
    longitude: f64,
    latitude: f64,
    heading: f64,
    speed: f64,
    beams: usize,
    good_beams: usize,
    center_depth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    advisory: Option<Advisory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

impl<'a> Row<'a> {
    fn new(kind: RecordKind, ping: &'a Ping, advisory: Option<Advisory>) -> Self {
        Self {
            kind,
            time_d: ping.time_d,
            longitude: ping.longitude,
            latitude: ping.latitude,
            heading: ping.heading,
            speed: ping.speed,
            beams: ping.beam_count(),
            good_beams: ping.good_beam_count(),
            center_depth: center_depth(ping),
            advisory,
            comment: (!ping.comment.is_empty()).then_some(ping.comment.as_str()),
        }
    }
}

/// Depth of the good beam closest to nadir.
fn center_depth(ping: &Ping) -> Option<f64> {
    (0..ping.beam_count())
        .filter(|&i| ping.beam_flags[i].is_good())
        .min_by(|&a, &b| {
            ping.bath_acrosstrack[a]
                .abs()
                .total_cmp(&ping.bath_acrosstrack[b].abs())
        })
        .map(|i| ping.bath[i])
}

impl ListCmd {
    pub fn run(self) -> Result<()> {
        let mut session = self.session.builder()?.open_read(&self.input)?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        loop {
            let status = match next_record(&mut session) {
                Ok(status) => status,
                Err(SwathError::EndOfFile) => break,
                Err(e) if !e.is_fatal_to_stream() => {
                    eprintln!("skipped: {e}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let wanted = match status.kind {
                kind if kind.is_survey() => status.is_clean() || self.keep_advisories,
                RecordKind::Comment => self.comments,
                _ => false,
            };
            if !wanted {
                continue;
            }

            let row = Row::new(status.kind, session.ping(), status.advisory);
            if self.json {
                serde_json::to_writer(&mut out, &row)?;
                writeln!(out)?;
            } else if row.kind == RecordKind::Comment {
                writeln!(out, "# {}", row.comment.unwrap_or_default())?;
            } else {
                write!(
                    out,
                    "{} {:12.6} {:11.6} {:6.2} {:6.2} {:4}/{:<4} {}",
                    format_time(row.time_d),
                    row.longitude,
                    row.latitude,
                    row.heading,
                    row.speed,
                    row.good_beams,
                    row.beams,
                    row.center_depth
                        .map_or_else(|| "-".to_string(), |d| format!("{d:.3}")),
                )?;
                match row.advisory {
                    Some(advisory) => writeln!(out, " [{advisory}]")?,
                    None => writeln!(out)?,
                }
            }
        }
        session.close()?;
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Info command - summarize a file.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::common::{format_duration, format_time, next_record, Result, SessionArgs};
use swathcodec::io::SessionStats;
use swathcodec::{Ping, SwathError};

/// Summarize a file.
#[derive(Args, Clone, Debug)]
pub struct InfoCmd {
    /// Input file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    #[command(flatten)]
    session: SessionArgs,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Serialize)]
struct Extent {
    min: f64,
    max: f64,
}

impl Extent {
    fn add(extent: &mut Option<Extent>, value: f64) {
        match extent {
            Some(e) => {
                e.min = e.min.min(value);
                e.max = e.max.max(value);
            }
            None => {
                *extent = Some(Extent {
                    min: value,
                    max: value,
                })
            }
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    file: String,
    format_id: i32,
    format: &'static str,
    pings: u64,
    beams: u64,
    good_beams: u64,
    max_beams: usize,
    first_ping: Option<f64>,
    last_ping: Option<f64>,
    longitude: Option<Extent>,
    latitude: Option<Extent>,
    depth: Option<Extent>,
    navigation_fixes: usize,
    stats: SessionStats,
}

impl Summary {
    fn add_ping(&mut self, ping: &Ping) {
        self.pings += 1;
        self.beams += ping.beam_count() as u64;
        self.good_beams += ping.good_beam_count() as u64;
        self.max_beams = self.max_beams.max(ping.beam_count());
        if self.first_ping.is_none() {
            self.first_ping = Some(ping.time_d);
        }
        self.last_ping = Some(ping.time_d);
        if ping.longitude != 0.0 || ping.latitude != 0.0 {
            Extent::add(&mut self.longitude, ping.longitude);
            Extent::add(&mut self.latitude, ping.latitude);
        }
        for (flag, depth) in ping.beam_flags.iter().zip(&ping.bath) {
            if flag.is_good() {
                Extent::add(&mut self.depth, *depth);
            }
        }
    }
}

impl InfoCmd {
    pub fn run(self) -> Result<()> {
        let mut session = self.session.builder()?.open_read(&self.input)?;
        let descriptor = session.descriptor();
        let mut summary = Summary {
            file: self.input.display().to_string(),
            format_id: descriptor.id,
            format: descriptor.name,
            ..Summary::default()
        };

        loop {
            match next_record(&mut session) {
                Ok(status) if status.kind.is_survey() && status.is_clean() => {
                    summary.add_ping(session.ping());
                }
                Ok(_) => {}
                Err(SwathError::EndOfFile) => break,
                Err(e) if !e.is_fatal_to_stream() => debug!(error = %e, "skipping record"),
                Err(e) => return Err(e.into()),
            }
        }
        summary.navigation_fixes = session.fixes().position().len();
        summary.stats = session.stats().clone();
        session.close()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }
        Ok(())
    }
}

fn print_summary(s: &Summary) {
    println!("=== {} ===", s.file);
    println!("Format: {} ({})", s.format, s.format_id);
    println!("Records read: {}", s.stats.records_read);
    for (kind, count) in &s.stats.read_by_kind {
        println!("  {kind}: {count}");
    }
    println!("Survey pings used: {}", s.pings);
    println!(
        "Beams: {} total, {} good, {} max per ping",
        s.beams, s.good_beams, s.max_beams
    );

    if let (Some(first), Some(last)) = (s.first_ping, s.last_ping) {
        println!("Start: {}", format_time(first));
        println!("End: {}", format_time(last));
        println!("Duration: {}", format_duration(last - first));
    }
    if let (Some(lon), Some(lat)) = (&s.longitude, &s.latitude) {
        println!("Longitude: {:.6} to {:.6}", lon.min, lon.max);
        println!("Latitude: {:.6} to {:.6}", lat.min, lat.max);
    }
    if let Some(depth) = &s.depth {
        println!("Depth: {:.3} to {:.3} m", depth.min, depth.max);
    }
    println!("Navigation fixes retained: {}", s.navigation_fixes);

    println!();
    println!("Advisories:");
    println!("  out of time window: {}", s.stats.out_of_time);
    println!("  out of bounds: {}", s.stats.out_of_bounds);
    println!("  time gap: {}", s.stats.time_gap);
    println!("  speed too low: {}", s.stats.speed_too_low);
    println!("Unintelligible records: {}", s.stats.unintelligible);
}

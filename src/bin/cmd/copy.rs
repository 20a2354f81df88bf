// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Copy command - convert records into another file and format.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use tracing::{debug, warn};

use crate::common::{next_record, Progress, Result, SessionArgs};
use swathcodec::io::{detect_format, Session};
use swathcodec::{RecordKind, SessionBuilder, SwathError};

/// Copy records into another file and format.
#[derive(Args, Clone, Debug)]
pub struct CopyCmd {
    /// Input file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Output format id (inferred from the output name when omitted)
    #[arg(short = 'O', long = "output-format", value_name = "ID")]
    output_format: Option<i32>,

    #[command(flatten)]
    session: SessionArgs,

    /// Also copy pings that raised a windowing advisory
    #[arg(long)]
    keep_advisories: bool,
}

#[derive(Debug, Default)]
struct CopyCounts {
    written: u64,
    advisories: u64,
    unintelligible: u64,
    dropped: u64,
}

impl CopyCmd {
    pub fn run(self) -> Result<()> {
        let output_format = match self.output_format {
            Some(id) => id,
            None => detect_format(&self.output).with_context(|| {
                format!(
                    "cannot infer a format for {}; pass -O",
                    self.output.display()
                )
            })?,
        };

        let mut input = self.session.builder()?.open_read(&self.input)?;
        let mut output = SessionBuilder::new()
            .format(output_format)
            .lonflip(input.params().lonflip)
            .open_write(&self.output)?;

        println!("Copying:");
        println!(
            "  Input:  {} ({})",
            self.input.display(),
            input.descriptor().name
        );
        println!(
            "  Output: {} ({})",
            self.output.display(),
            output.descriptor().name
        );

        let progress = Progress::new("copy");
        let mut counts = CopyCounts::default();
        loop {
            let status = match next_record(&mut input) {
                Ok(status) => status,
                Err(SwathError::EndOfFile) => break,
                Err(e) if !e.is_fatal_to_stream() => {
                    counts.unintelligible += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            progress.inc();
            if !status.is_clean() && !self.keep_advisories {
                counts.advisories += 1;
                continue;
            }
            match copy_record(&input, &mut output, status.kind) {
                Ok(()) => counts.written += 1,
                Err(SwathError::Unsupported { capability }) => {
                    debug!(kind = %status.kind, %capability, "record not copied");
                    counts.dropped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        input.close()?;
        output.close()?;
        if counts.dropped > 0 {
            warn!(dropped = counts.dropped, "records the output format cannot hold were dropped");
        }
        progress.finish_with_message(format!("{} written", counts.written));

        println!("  Records written: {}", counts.written);
        println!("  Skipped for advisories: {}", counts.advisories);
        println!("  Unintelligible: {}", counts.unintelligible);
        println!("  Not representable in output: {}", counts.dropped);
        Ok(())
    }
}

/// Copy the current input record, carrying attitude, sound velocity,
/// sonar depth and altitude through the optional extract/insert path when
/// both codecs support it.
fn copy_record(input: &Session, output: &mut Session, kind: RecordKind) -> swathcodec::Result<()> {
    let carried = match kind {
        RecordKind::Data => return copy_survey(input, output),
        RecordKind::Attitude => input
            .extract_attitude()
            .and_then(|attitude| output.insert_attitude(&attitude)),
        RecordKind::SoundVelocity => input
            .extract_sound_velocity_profile()
            .and_then(|svp| output.insert_sound_velocity_profile(&svp)),
        _ => return output.write(input.ping()),
    };
    match carried {
        Ok(()) => output.write_record(kind),
        Err(SwathError::Unsupported { .. }) => output.write(input.ping()),
        Err(e) => Err(e),
    }
}

fn copy_survey(input: &Session, output: &mut Session) -> swathcodec::Result<()> {
    output.insert(input.ping())?;
    match input
        .extract_altitude()
        .and_then(|altitude| output.insert_altitude(&altitude))
    {
        Ok(()) | Err(SwathError::Unsupported { .. }) => {}
        Err(e) => return Err(e),
    }
    output.write_record(RecordKind::Data)
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Formats command - list registered formats.

use clap::Args;

use crate::common::Result;
use swathcodec::io::{global_registry, SystemFamily};

/// List registered formats.
#[derive(Args, Clone, Debug)]
pub struct FormatsCmd {
    /// Print descriptors as JSON
    #[arg(long)]
    json: bool,
}

impl FormatsCmd {
    pub fn run(self) -> Result<()> {
        let registry = global_registry();
        if self.json {
            let descriptors: Vec<_> = registry.descriptors().collect();
            println!("{}", serde_json::to_string_pretty(&descriptors)?);
            return Ok(());
        }

        println!("=== Supported formats ===");
        for d in registry.descriptors() {
            let family = match d.family {
                SystemFamily::Interchange => "interchange".to_string(),
                SystemFamily::Text => "text".to_string(),
                SystemFamily::Vendor(code) => format!("vendor {code}"),
            };
            println!("[{}] {} ({family})", d.id, d.name);
            println!("  {}", d.description);
            println!(
                "  Beams: {} bath, {} amp, {} sidescan pixels",
                d.beams_bath_max, d.beams_amp_max, d.pixels_ss_max
            );
            println!(
                "  Files: {} | extensions: {}",
                d.arity(),
                d.extensions.join(", ")
            );
            println!(
                "  Flagging: {} | variable beams: {}",
                yes_no(d.beam_flagging),
                yes_no(d.variable_beams)
            );
        }
        Ok(())
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Static per-format metadata.
//!
//! A [`FormatDescriptor`] is looked up once when a session opens and sizes
//! everything the session allocates. Descriptors live inside their codec
//! implementation and are referenced, never copied, by sessions.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::RecordKind;

/// Instrument family a format belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemFamily {
    /// Instrument-neutral binary interchange.
    Interchange,
    /// Plain text listings.
    Text,
    /// Third-party or vendor-specific family.
    Vendor(u16),
}

/// How the physical files of a format are accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEncoding {
    /// Plain byte stream (text or untagged binary).
    Plain,
    /// Binary stream of self-delimiting tagged records.
    TaggedBinary,
    /// Stream managed by an external library; the session opens nothing.
    External,
}

/// Immutable description of one swath data format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatDescriptor {
    /// Numeric format identifier.
    pub id: i32,
    /// Short format name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    pub family: SystemFamily,
    /// Maximum bathymetry beams per ping.
    pub beams_bath_max: usize,
    /// Maximum amplitude values per ping.
    pub beams_amp_max: usize,
    /// Maximum sidescan pixels per ping.
    pub pixels_ss_max: usize,
    /// Suffixes appended to the primary path for companion files.
    ///
    /// File arity is one plus the number of suffixes.
    pub companion_suffixes: &'static [&'static str],
    pub encoding: FileEncoding,
    /// Whether the beam count may differ from ping to ping.
    pub variable_beams: bool,
    /// Whether travel times are reported.
    pub traveltime: bool,
    /// Whether individual beams can be flagged bad.
    pub beam_flagging: bool,
    /// Record kind navigation is taken from by default.
    pub nav_source: Option<RecordKind>,
    pub heading_source: Option<RecordKind>,
    pub attitude_source: Option<RecordKind>,
    pub svp_source: Option<RecordKind>,
    /// Along-track beam width, degrees.
    pub beamwidth_along: f64,
    /// Across-track beam width, degrees.
    pub beamwidth_across: f64,
    /// File extensions (without dot) recognized for this format.
    pub extensions: &'static [&'static str],
}

impl FormatDescriptor {
    /// Number of physical files a session of this format uses.
    pub fn arity(&self) -> usize {
        1 + self.companion_suffixes.len()
    }

    /// All file paths for a primary path, primary first.
    pub fn file_paths(&self, primary: &Path) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(self.arity());
        paths.push(primary.to_path_buf());
        for suffix in self.companion_suffixes {
            let mut name = primary.as_os_str().to_os_string();
            name.push(suffix);
            paths.push(PathBuf::from(name));
        }
        paths
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format inference for sessions opened with format id 0.
//!
//! Detection tries, in order:
//! - magic bytes at the start of the primary file
//! - the `.mbNN` filename suffix convention (`line0001.mb71` is format 71)
//! - the file extensions declared by registered descriptors
//!
//! # Example
//!
//! ```rust,no_run
//! use swathcodec::io::detection::detect_format;
//!
//! let id = detect_format("survey/line0001.swb")?;
//! assert_eq!(id, 71);
//! # Ok::<(), swathcodec::SwathError>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::{Result, SwathError};

use super::formats::{swathb, swathtxt};
use super::registry::{global_registry, FormatRegistry};

/// Detect the format id of `path` against the built-in registry.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<i32> {
    detect_format_in(global_registry(), path.as_ref())
}

/// Detect the format id of `path` against `registry`.
///
/// # Errors
///
/// `UnknownFormat { format_id: 0 }` when nothing matches.
pub fn detect_format_in(registry: &FormatRegistry, path: &Path) -> Result<i32> {
    // An unreadable file may still be named well enough to identify.
    if let Ok(Some(id)) = detect_from_magic(path) {
        if registry.contains(id) {
            return Ok(id);
        }
    }
    if let Some(id) = detect_from_suffix(path) {
        if registry.contains(id) {
            return Ok(id);
        }
    }
    detect_from_extension(registry, path).ok_or_else(|| SwathError::unknown_format(0))
}

fn detect_from_magic(path: &Path) -> Result<Option<i32>> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 64];
    let mut n = 0;
    while n < header.len() {
        let read = file.read(&mut header[n..])?;
        if read == 0 {
            break;
        }
        n += read;
    }
    Ok(sniff(&header[..n]))
}

/// Identify a format from the leading bytes of a file.
pub fn sniff(header: &[u8]) -> Option<i32> {
    if header.starts_with(&swathb::MAGIC) {
        return Some(swathb::FORMAT_ID);
    }
    if header.starts_with(swathtxt::HEADER_TAG.as_bytes()) {
        return Some(swathtxt::FORMAT_ID);
    }
    None
}

/// Parse the `.mbNN` suffix convention.
fn detect_from_suffix(path: &Path) -> Option<i32> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let digits = ext.strip_prefix("mb")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn detect_from_extension(registry: &FormatRegistry, path: &Path) -> Option<i32> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    registry
        .descriptors()
        .find(|d| d.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
        .map(|d| d.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_temp_file(name: &str, data: &[u8]) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "swathcodec_test_detect_{}_{}",
            std::process::id(),
            name
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(data).unwrap();
        path
    }

    #[test]
    fn test_detect_from_magic_overrides_extension() {
        let mut data = swathb::MAGIC.to_vec();
        data.extend_from_slice(&[1, 0, 0, 0]);
        let path = create_temp_file("magic.txt", &data);
        assert_eq!(detect_format(&path).unwrap(), 71);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_detect_text_header() {
        let path = create_temp_file("header.dat", b"##SWATHTXT 1\n");
        assert_eq!(detect_format(&path).unwrap(), 166);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_detect_from_mb_suffix() {
        assert_eq!(detect_format("/nonexistent/line0001.mb166").unwrap(), 166);
        assert_eq!(detect_format("/nonexistent/line0001.MB71").unwrap(), 71);
        assert_eq!(detect_from_suffix(Path::new("x.mb")), None);
        assert_eq!(detect_from_suffix(Path::new("x.mbx1")), None);
    }

    #[test]
    fn test_detect_from_extension() {
        assert_eq!(detect_format("/nonexistent/a.swb").unwrap(), 71);
        assert_eq!(detect_format("/nonexistent/a.TXT").unwrap(), 166);
    }

    #[test]
    fn test_unknown() {
        let err = detect_format("/nonexistent/a.xyz").unwrap_err();
        assert!(matches!(err, SwathError::UnknownFormat { format_id: 0 }));
        // registered suffix id only
        assert!(detect_format("/nonexistent/a.mb999").is_err());
    }
}

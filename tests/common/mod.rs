// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use swathcodec::io::{OutputStream, ReadStatus};
use swathcodec::{BeamFlag, Ping, RecordKind, SessionBuilder, SwathError};

// ============================================================================
// Temporary files
// ============================================================================

/// Fresh temporary directory for one test.
pub fn temp_dir(tag: &str) -> PathBuf {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    std::env::temp_dir().join(format!(
        "swathcodec_{}_{}_{}",
        tag,
        std::process::id(),
        random
    ))
}

/// Temporary file path whose directory is removed when the guard drops.
pub fn temp_path(tag: &str, name: &str) -> (PathBuf, CleanupGuard) {
    let dir = temp_dir(tag);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    (path, CleanupGuard(dir))
}

/// Cleanup guard for test temporary files.
pub struct CleanupGuard(pub PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

// ============================================================================
// In-memory streams
// ============================================================================

/// Output stream whose bytes stay readable after the session drops it.
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    pub fn stream(&self) -> OutputStream {
        Box::new(self.clone())
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Output stream that fails every write after `budget` bytes.
pub struct FailingWriter {
    pub budget: usize,
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.budget == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "device full",
            ));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Pings
// ============================================================================

/// Survey ping with `beams` beams fanned across track.
pub fn survey_ping(time_d: f64, longitude: f64, latitude: f64, beams: usize) -> Ping {
    let mut ping = Ping {
        kind: RecordKind::Data,
        longitude,
        latitude,
        heading: 45.0,
        speed: 10.0,
        ..Ping::default()
    };
    ping.set_time_d(time_d).unwrap();
    for i in 0..beams {
        let across = (i as f64 - beams as f64 / 2.0) * 2.5;
        let flag = if i % 5 == 4 {
            BeamFlag::MANUAL
        } else {
            BeamFlag::GOOD
        };
        ping.push_beam(flag, 100.0 + i as f64 * 0.25, across, 0.125);
        ping.amp.push(20.0 + i as f64);
    }
    for i in 0..beams * 2 {
        ping.push_pixel(0.5 * i as f64, i as f64 - beams as f64, 0.0);
    }
    ping
}

pub fn comment(text: &str) -> Ping {
    Ping {
        kind: RecordKind::Comment,
        comment: text.to_string(),
        ..Ping::default()
    }
}

/// Write `records` to `path` in `format` and close the session.
pub fn write_file(path: &Path, format: i32, records: &[Ping]) {
    let mut session = SessionBuilder::new()
        .format(format)
        .open_write(path)
        .unwrap();
    for ping in records {
        session.write(ping).unwrap();
    }
    session.close().unwrap();
}

/// Outcome of one read call.
#[derive(Debug)]
pub enum Read {
    Record(ReadStatus, Ping),
    Error(SwathError),
}

/// Read until `EndOfFile`, keeping recoverable errors in sequence.
pub fn read_all(builder: &SessionBuilder, path: &Path) -> Vec<Read> {
    let mut session = builder.open_read(path).unwrap();
    let mut out = Vec::new();
    loop {
        match session.read_ping() {
            Ok(status) => out.push(Read::Record(status, session.ping().clone())),
            Err(SwathError::EndOfFile) => break,
            Err(e) if !e.is_fatal_to_stream() => out.push(Read::Error(e)),
            Err(e) => panic!("fatal read error: {e}"),
        }
    }
    session.close().unwrap();
    out
}

/// Only the successfully read records.
pub fn records(reads: Vec<Read>) -> Vec<(ReadStatus, Ping)> {
    reads
        .into_iter()
        .filter_map(|r| match r {
            Read::Record(status, ping) => Some((status, ping)),
            Read::Error(_) => None,
        })
        .collect()
}

pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected} +/- {tol}, got {actual}"
    );
}

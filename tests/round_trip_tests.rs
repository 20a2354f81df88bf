// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Round-trip integration tests.
//!
//! Tests cover:
//! - Writing pings to SWATHB files and reading them back
//! - Writing pings to SWATHTXT files (with the `.nav` companion) and reading them back
//! - Field equality within each format's stored precision
//! - Format detection from the written files
//! - Converting between the two formats through sessions

mod common;

use common::{assert_close, comment, read_all, records, survey_ping, temp_path, write_file};
use swathcodec::io::detect_format;
use swathcodec::{BeamFlag, Ping, RecordKind, SessionBuilder};

const BASE_TIME: f64 = 1_709_251_200.0;

fn pings() -> Vec<Ping> {
    let mut out = vec![comment("line 0042 start")];
    for i in 0..5 {
        let t = BASE_TIME + i as f64 * 0.75;
        let mut ping = survey_ping(t, -70.123456789 + i as f64 * 1e-5, 41.5 + i as f64 * 1e-5, 12);
        ping.heading = 12.5 + i as f64;
        ping.speed = 11.25;
        out.push(ping);
    }
    out
}

fn assert_same_survey(actual: &Ping, expected: &Ping, tol: f64, flags_kept: bool) {
    assert_eq!(actual.kind, RecordKind::Data);
    assert_close(actual.time_d, expected.time_d, 1e-6);
    assert_close(actual.longitude, expected.longitude, 1e-9);
    assert_close(actual.latitude, expected.latitude, 1e-9);
    assert_close(actual.heading, expected.heading, 0.005);
    assert_close(actual.speed, expected.speed, 1e-3);
    assert_eq!(actual.beam_count(), expected.beam_count());
    for i in 0..expected.beam_count() {
        let good = expected.beam_flags[i].is_good();
        if flags_kept {
            assert_eq!(actual.beam_flags[i], expected.beam_flags[i]);
        } else if !good {
            assert!(actual.beam_flags[i].is_null(), "beam {i} should be null");
        }
        if good || flags_kept {
            assert_close(actual.bath[i], expected.bath[i], tol);
        }
        assert_close(actual.bath_acrosstrack[i], expected.bath_acrosstrack[i], tol);
        assert_close(actual.bath_alongtrack[i], expected.bath_alongtrack[i], tol);
    }
    assert_eq!(actual.amp_count(), expected.amp_count());
    for (a, e) in actual.amp.iter().zip(&expected.amp) {
        assert_close(*a, *e, tol);
    }
    assert_eq!(actual.pixel_count(), expected.pixel_count());
    for i in 0..expected.pixel_count() {
        assert_close(actual.ss[i], expected.ss[i], tol);
        assert_close(actual.ss_acrosstrack[i], expected.ss_acrosstrack[i], tol);
    }
}

#[test]
fn test_swathb_round_trip() {
    let (path, _guard) = temp_path("roundtrip", "line0042.swb");
    let written = pings();
    write_file(&path, 71, &written);
    assert_eq!(detect_format(&path).unwrap(), 71);

    let read = records(read_all(&SessionBuilder::new(), &path));
    assert_eq!(read.len(), written.len());
    assert_eq!(read[0].0.kind, RecordKind::Comment);
    assert_eq!(read[0].1.comment, "line 0042 start");
    for ((status, actual), expected) in read.iter().zip(&written).skip(1) {
        assert!(status.is_clean());
        assert_same_survey(actual, expected, 1e-3, true);
    }
    assert!(read[1].1.beam_flags[4] == BeamFlag::MANUAL);
}

#[test]
fn test_swathtxt_round_trip() {
    let (path, _guard) = temp_path("roundtrip", "line0042.txt");
    let written = pings();
    write_file(&path, 166, &written);

    let mut nav = path.clone().into_os_string();
    nav.push(".nav");
    assert!(std::path::Path::new(&nav).exists());
    assert_eq!(detect_format(&path).unwrap(), 166);

    let read = records(read_all(&SessionBuilder::new(), &path));
    assert_eq!(read.len(), written.len());
    assert_eq!(read[0].1.comment, "line 0042 start");
    for ((_, actual), expected) in read.iter().zip(&written).skip(1) {
        assert_same_survey(actual, expected, 1e-3, false);
    }
}

#[test]
fn test_convert_binary_to_text() {
    let (src, _guard) = temp_path("convert", "line.swb");
    let dst = src.with_extension("txt");
    let written = pings();
    write_file(&src, 71, &written);

    let mut input = SessionBuilder::new().open_read(&src).unwrap();
    let mut output = SessionBuilder::new().format(166).open_write(&dst).unwrap();
    while let Ok(status) = input.read_ping() {
        assert!(status.is_clean());
        output.write(input.ping()).unwrap();
    }
    input.close().unwrap();
    output.close().unwrap();
    assert_eq!(output.stats().records_written, written.len() as u64);

    let read = records(read_all(&SessionBuilder::new(), &dst));
    assert_eq!(read.len(), written.len());
    assert_same_survey(&read[3].1, &written[3], 1e-3, false);
}

#[test]
fn test_lonflip_applied_on_read() {
    let (path, _guard) = temp_path("lonflip", "east.swb");
    write_file(&path, 71, &[survey_ping(BASE_TIME, -70.0, 41.0, 1)]);

    let builder = SessionBuilder::new().lonflip(swathcodec::LonFlip::Positive);
    let read = records(read_all(&builder, &path));
    assert_close(read[0].1.longitude, 290.0, 1e-9);
}

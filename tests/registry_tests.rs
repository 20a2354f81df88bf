// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format registry and detection tests.

mod common;

use std::sync::Arc;

use common::{survey_ping, temp_path, write_file};
use swathcodec::io::{
    detect_format_in, global_registry, FileEncoding, SwathBinaryFormat, SwathTextFormat,
};
use swathcodec::{detect_format, register, FormatRegistry, RecordKind, SwathError};

#[test]
fn test_register_builtin_descriptors() {
    let swathb = register(71).unwrap();
    assert_eq!(swathb.name, "SWATHB");
    assert_eq!(swathb.arity(), 1);
    assert_eq!(swathb.encoding, FileEncoding::TaggedBinary);
    assert!(swathb.beam_flagging);
    assert_eq!(swathb.svp_source, Some(RecordKind::SoundVelocity));

    let swathtxt = register(166).unwrap();
    assert_eq!(swathtxt.name, "SWATHTXT");
    assert_eq!(swathtxt.arity(), 2);
    assert_eq!(swathtxt.nav_source, Some(RecordKind::Navigation));
    assert!(!swathtxt.beam_flagging);
}

#[test]
fn test_register_is_pure_lookup() {
    let first = register(71).unwrap();
    let second = register(71).unwrap();
    assert!(std::ptr::eq(first, second));
    assert_eq!(global_registry().ids(), vec![71, 166]);
}

#[test]
fn test_register_unknown_format() {
    for id in [0, -1, 72, 9999] {
        let err = register(id).unwrap_err();
        assert!(matches!(err, SwathError::UnknownFormat { format_id } if format_id == id));
    }
}

#[test]
fn test_detect_by_content_over_name() {
    let (path, _guard) = temp_path("registry_detect", "misnamed.txt");
    write_file(&path, 71, &[survey_ping(0.0, 1.0, 2.0, 3)]);
    assert_eq!(detect_format(&path).unwrap(), 71);
}

#[test]
fn test_detect_by_name() {
    assert_eq!(detect_format("/nonexistent/line.swb").unwrap(), 71);
    assert_eq!(detect_format("/nonexistent/LINE.TXT").unwrap(), 166);
    assert_eq!(detect_format("/nonexistent/line.mb166").unwrap(), 166);
    assert!(matches!(
        detect_format("/nonexistent/line.dat"),
        Err(SwathError::UnknownFormat { format_id: 0 })
    ));
}

#[test]
fn test_custom_registry() {
    let registry = FormatRegistry::new().with_format(Arc::new(SwathTextFormat));
    assert_eq!(registry.ids(), vec![166]);
    assert!(registry.lookup(71).is_err());

    // `.mb71` names a format this registry does not hold.
    let path = std::path::Path::new("/nonexistent/line.mb71");
    assert!(detect_format_in(&registry, path).is_err());

    let mut registry = registry;
    assert!(registry.insert(Arc::new(SwathBinaryFormat)).is_none());
    assert!(registry.insert(Arc::new(SwathBinaryFormat)).is_some());
    assert_eq!(registry.ids(), vec![71, 166]);
    assert_eq!(detect_format_in(&registry, path).unwrap(), 71);
}

// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the snapshot writer

use chrono::{NaiveDate, NaiveDateTime};
use dayafterday::pipelines::photo::{SnapshotName, SnapshotWriter};
use dayafterday::{Frame, PhotoError};
use std::collections::HashSet;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn test_frame() -> Frame {
    let data: Vec<u8> = (0..(8 * 6 * 3)).map(|i| (i % 256) as u8).collect();
    Frame::from_rgb(8, 6, data).unwrap()
}

#[test]
fn test_names_are_distinct_within_a_second() {
    let dir = tempfile::tempdir().unwrap();
    let writer = SnapshotWriter::new(dir.path(), 100);
    let frame = test_frame();

    let records: Vec<_> = (0..5)
        .map(|_| writer.save_at(Some(&frame), at(12, 0, 0)).unwrap())
        .collect();

    let increments: Vec<u32> = records.iter().map(|r| r.increment.unwrap()).collect();
    assert_eq!(increments, vec![1, 2, 3, 4, 5]);

    let names: HashSet<String> = records.iter().map(|r| r.file_name().into_owned()).collect();
    assert_eq!(names.len(), 5);
    for name in &names {
        assert!(SnapshotName::parse(name).is_some(), "{} should follow the pattern", name);
    }
}

#[test]
fn test_increment_restarts_for_new_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let writer = SnapshotWriter::new(dir.path(), 100);
    let frame = test_frame();

    writer.save_at(Some(&frame), at(12, 0, 0)).unwrap();
    writer.save_at(Some(&frame), at(12, 0, 0)).unwrap();
    let record = writer.save_at(Some(&frame), at(12, 0, 1)).unwrap();

    assert_eq!(record.file_name(), "DayAfterDay-2024-01-01-120001-1.png");
}

#[test]
fn test_existing_file_gets_next_increment() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("DayAfterDay-2024-01-01-120000-1.png");
    std::fs::write(&existing, b"previous picture").unwrap();

    let writer = SnapshotWriter::new(dir.path(), 100);
    let record = writer.save_at(Some(&test_frame()), at(12, 0, 0)).unwrap();

    assert_eq!(record.file_name(), "DayAfterDay-2024-01-01-120000-2.png");
    assert_eq!(std::fs::read(&existing).unwrap(), b"previous picture");
}

#[test]
fn test_saved_file_is_the_frame() {
    let dir = tempfile::tempdir().unwrap();
    let writer = SnapshotWriter::new(dir.path(), 100);
    let frame = test_frame();

    let record = writer.save_at(Some(&frame), at(8, 30, 0)).unwrap();
    let decoded = image::open(&record.path).unwrap().to_rgb8();

    assert_eq!(decoded, frame.to_image());
}

#[test]
fn test_no_frame_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let writer = SnapshotWriter::new(dir.path(), 100);

    let err = writer.save_at(None, at(12, 0, 0)).unwrap_err();
    assert_eq!(err, PhotoError::NoFrameAvailable);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_name_space_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    for n in 1..=3 {
        let name = format!("DayAfterDay-2024-01-01-120000-{}.png", n);
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }

    let writer = SnapshotWriter::new(dir.path(), 3);
    let err = writer.save_at(Some(&test_frame()), at(12, 0, 0)).unwrap_err();

    assert_eq!(err, PhotoError::NameSpaceExhausted { attempts: 3 });
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
}

#[test]
fn test_unwritable_target_is_write_failed() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the directory should be
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let writer = SnapshotWriter::new(&blocker, 100);
    let err = writer.save_at(Some(&test_frame()), at(12, 0, 0)).unwrap_err();

    assert!(matches!(err, PhotoError::WriteFailed(_)), "got {:?}", err);
}

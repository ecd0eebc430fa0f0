// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot file names
//!
//! `DayAfterDay-YYYY-MM-DD-HHMMSS-N.png`, where `N` is the smallest positive
//! integer that was free in the directory when the picture was taken. This
//! format is shared with existing picture histories and must not change.

use crate::constants::naming;
use chrono::{NaiveDateTime, Timelike};

/// Parsed components of a snapshot file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotName {
    /// Capture time, second precision
    pub timestamp: NaiveDateTime,
    /// Disambiguator, starting at 1
    pub increment: u32,
}

impl SnapshotName {
    pub fn new(timestamp: NaiveDateTime, increment: u32) -> Self {
        Self {
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            increment,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}.{}",
            naming::PREFIX,
            self.timestamp.format(naming::TIMESTAMP_FORMAT),
            self.increment,
            naming::EXTENSION
        )
    }

    /// Same timestamp, next increment
    pub fn next(&self) -> Self {
        Self {
            timestamp: self.timestamp,
            increment: self.increment.saturating_add(1),
        }
    }

    /// Parse a file name produced by [`SnapshotName::file_name`]
    pub fn parse(file_name: &str) -> Option<Self> {
        let rest = file_name
            .strip_prefix(naming::PREFIX)?
            .strip_prefix('-')?
            .strip_suffix(naming::EXTENSION)?
            .strip_suffix('.')?;

        let (stamp, increment) = rest.rsplit_once('-')?;
        if !increment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let increment: u32 = increment.parse().ok()?;
        if increment == 0 {
            return None;
        }

        let timestamp = NaiveDateTime::parse_from_str(stamp, naming::TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            timestamp,
            increment,
        })
    }
}

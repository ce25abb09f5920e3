//! Readers for external schedule and time-clock exports.
//!
//! Turns raw tabular exports into normalized, grouped rows ready for the
//! import pipelines. Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use shiftwork_import::{ImportLimits, read_schedule};
//!
//! let csv = std::fs::read("schedule.csv").unwrap();
//! let sheet = read_schedule(&csv, &ImportLimits::default()).unwrap();
//! println!("{} shift groups, {} rejected rows", sheet.groups.len(), sheet.rejected.len());
//! ```

pub mod error;
pub mod normalize;
mod schedule;
mod sheet;
mod timeclock;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use schedule::{AvailabilityOverride, ScheduleSheet, ShiftGroup, ShiftGroupKey, Site, read_schedule};
pub use timeclock::{TimeClockRow, TimeClockSheet, read_timeclock};

// ─── Public types ────────────────────────────────────────────────────────────

/// File-level limits; exceeding either fails the whole import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportLimits {
  pub max_rows:  usize,
  pub max_bytes: usize,
}

impl Default for ImportLimits {
  fn default() -> Self { Self { max_rows: 20_000, max_bytes: 8 * 1024 * 1024 } }
}

/// A row excluded from processing. Never fatal; surfaced in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
  /// 1-based line number in the source file (the header is line 1).
  pub line:   usize,
  pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RejectReason {
  InvalidDate(String),
  InvalidTime(String),
  MissingName,
  /// Dated outside the import's selection range.
  OutOfRange(String),
}

impl fmt::Display for RejectReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidDate(v) => write!(f, "invalid date {v:?}"),
      Self::InvalidTime(v) => write!(f, "invalid time {v:?}"),
      Self::MissingName => f.write_str("missing employee name"),
      Self::OutOfRange(v) => write!(f, "date {v} outside the import range"),
    }
  }
}

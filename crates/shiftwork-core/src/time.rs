//! Time-range arithmetic shared by the conflict detector and the coverage
//! engine.
//!
//! Shift times are same-day wall-clock ranges. They are represented as
//! half-open intervals of minutes since midnight so that adjacency
//! (`end_a == start_b`) never counts as an overlap.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

// ─── Same-day ranges ─────────────────────────────────────────────────────────

/// A half-open `[start, end)` interval of minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
  start: u16,
  end:   u16,
}

impl TimeRange {
  /// Build a range from minute offsets.
  ///
  /// An inverted or empty range (`end <= start`) runs from `start` to
  /// midnight. Values past midnight are clamped to the end of the day.
  pub fn new(start: u16, end: u16) -> Self {
    let start = start.min(MINUTES_PER_DAY);
    let end = end.min(MINUTES_PER_DAY);
    if end <= start {
      Self { start, end: MINUTES_PER_DAY }
    } else {
      Self { start, end }
    }
  }

  /// Build a range from optional wall-clock bounds. A missing bound is the
  /// "All Day" sentinel and extends to the start or end of the day.
  pub fn from_bounds(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Self {
    let start = start.map(minute_of_day).unwrap_or(0);
    let end = end.map(minute_of_day).unwrap_or(MINUTES_PER_DAY);
    Self::new(start, end)
  }

  /// The whole day.
  pub fn all_day() -> Self { Self { start: 0, end: MINUTES_PER_DAY } }

  pub fn start(&self) -> u16 { self.start }

  pub fn end(&self) -> u16 { self.end }

  pub fn minutes(&self) -> u16 { self.end - self.start }

  pub fn overlaps(&self, other: &TimeRange) -> bool {
    overlaps(*self, *other)
  }
}

/// Standard half-open interval overlap: `a.start < b.end && b.start < a.end`.
pub fn overlaps(a: TimeRange, b: TimeRange) -> bool {
  a.start < b.end && b.start < a.end
}

/// `true` when both bounds are present and the end does not come after the
/// start. Such ranges are accepted but surfaced as a warning.
pub fn is_inverted(start: Option<NaiveTime>, end: Option<NaiveTime>) -> bool {
  matches!((start, end), (Some(s), Some(e)) if e <= s)
}

fn minute_of_day(t: NaiveTime) -> u16 {
  // hour() < 24 and minute() < 60, so this always fits.
  (t.hour() * 60 + t.minute()) as u16
}

// ─── Dated ranges ────────────────────────────────────────────────────────────

/// A same-day range pinned to a calendar date. Ranges on different dates
/// never overlap, whatever their times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatedRange {
  pub date:  NaiveDate,
  pub range: TimeRange,
}

impl DatedRange {
  pub fn new(date: NaiveDate, range: TimeRange) -> Self { Self { date, range } }

  pub fn overlaps(&self, other: &DatedRange) -> bool {
    self.date == other.date && self.range.overlaps(&other.range)
  }
}

// ─── Absolute intervals ──────────────────────────────────────────────────────

/// Overlap test for attendance intervals. A missing end means the session is
/// still open and extends indefinitely.
pub fn sessions_overlap(
  a_start: NaiveDateTime,
  a_end:   Option<NaiveDateTime>,
  b_start: NaiveDateTime,
  b_end:   Option<NaiveDateTime>,
) -> bool {
  let a_before_b_ends = b_end.is_none_or(|end| a_start < end);
  let b_before_a_ends = a_end.is_none_or(|end| b_start < end);
  a_before_b_ends && b_before_a_ends
}

// ─── Date spans ──────────────────────────────────────────────────────────────

/// An inclusive `[from, to]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpan {
  from: NaiveDate,
  to:   NaiveDate,
}

impl DateSpan {
  pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
    if from > to {
      return Err(Error::InvertedSpan { from, to });
    }
    Ok(Self { from, to })
  }

  /// A span covering a single day.
  pub fn day(date: NaiveDate) -> Self { Self { from: date, to: date } }

  pub fn from(&self) -> NaiveDate { self.from }

  pub fn to(&self) -> NaiveDate { self.to }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.from <= date && date <= self.to
  }
}

//! Pure normalizers turning raw export cells into canonical values.
//!
//! Nothing here touches the store or fails loudly: every function either
//! returns a canonical value or signals "unparseable" with `None`.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use shiftwork_core::people::name_key;

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([ap]m)$").expect("static regex")
});

static US_DATE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})(?:\s+([A-Za-z]{3,9})\.?)?$").expect("static regex")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:[T ].*)?$").expect("static regex")
});

static WEEKDAY_SUFFIXED: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^\d{1,2}/\d{1,2}/\d{4}\s+(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?$")
    .expect("static regex")
});

static SITE_CODE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\s*\d+\s*-\s*(\S.*?)\s*$").expect("static regex")
});

// ─── Clock times ─────────────────────────────────────────────────────────────

/// A parsed clock cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ClockTime {
  At(NaiveTime),
  /// The "All Day" sentinel: no fixed time.
  AllDay,
}

impl ClockTime {
  /// The fixed time, or `None` for [`ClockTime::AllDay`].
  pub fn time(self) -> Option<NaiveTime> {
    match self {
      Self::At(t) => Some(t),
      Self::AllDay => None,
    }
  }
}

/// Parse a 12-hour clock cell (`"5:30am"`, `"11:30 PM"`) or the `"All Day"`
/// sentinel. Anything else is rejected.
pub fn parse_clock_time(raw: &str) -> Option<ClockTime> {
  let s = raw.trim();
  if name_key(s) == "all day" {
    return Some(ClockTime::AllDay);
  }

  let caps = CLOCK_TIME.captures(s)?;
  let hour: u32 = caps[1].parse().ok()?;
  let minute: u32 = caps[2].parse().ok()?;
  if !(1..=12).contains(&hour) {
    return None;
  }
  let pm = caps[3].eq_ignore_ascii_case("pm");
  let hour = match (hour, pm) {
    (12, false) => 0,
    (12, true) => 12,
    (h, false) => h,
    (h, true) => h + 12,
  };
  NaiveTime::from_hms_opt(hour, minute, 0).map(ClockTime::At)
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse `MM/DD/YYYY` (optionally followed by a weekday, `"02/18/2026 Wed"`)
/// or ISO `YYYY-MM-DD` (optionally the date part of an ISO datetime).
pub fn parse_export_date(raw: &str) -> Option<NaiveDate> {
  let s = raw.trim();
  if let Some(caps) = US_DATE.captures(s) {
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    return NaiveDate::from_ymd_opt(year, month, day);
  }
  if let Some(caps) = ISO_DATE.captures(s) {
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    return NaiveDate::from_ymd_opt(year, month, day);
  }
  None
}

/// Time-clock exports carry several columns all named e.g. `Start Date`;
/// only one of them holds the session date, written with a weekday suffix.
///
/// Given the values of every same-named column, pick the weekday-suffixed
/// one. Falls back to the first value that parses as a date at all.
pub fn pick_weekday_suffixed<'a>(candidates: &[&'a str]) -> Option<&'a str> {
  candidates
    .iter()
    .find(|c| WEEKDAY_SUFFIXED.is_match(c.trim()))
    .or_else(|| candidates.iter().find(|c| parse_export_date(c).is_some()))
    .copied()
}

// ─── Names ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
  pub first: String,
  /// Every token after the first, single-spaced. Empty for one-word names.
  pub last:  String,
}

/// Split a free-text person name on whitespace: the first token is the first
/// name, the rest is the last name.
pub fn parse_person_name(raw: &str) -> Option<PersonName> {
  let mut tokens = raw.split_whitespace();
  let first = tokens.next()?.to_string();
  let last = tokens.collect::<Vec<_>>().join(" ");
  Some(PersonName { first, last })
}

/// Strip a leading site code: `"02 - ELY PRODUCCION"` → `"ELY PRODUCCION"`.
/// Labels without a code are returned trimmed.
pub fn strip_site_code(label: &str) -> &str {
  match SITE_CODE.captures(label).and_then(|c| c.get(1)) {
    Some(m) => m.as_str(),
    None => label.trim(),
  }
}

// ─── Numbers ─────────────────────────────────────────────────────────────────

/// Parse a money cell (`"$1,234.50"`). Never fails; garbage reads as `0.0`.
pub fn parse_currency(raw: &str) -> f64 { lenient_number(raw) }

/// Parse an hours cell (`"7.5"`, `"1,200"`). Never fails; garbage reads as
/// `0.0`.
pub fn parse_hours(raw: &str) -> f64 { lenient_number(raw) }

fn lenient_number(raw: &str) -> f64 {
  let cleaned: String = raw.chars().filter(|c| !matches!(c, '$' | ',')).collect();
  match cleaned.trim().parse::<f64>() {
    Ok(n) if n.is_finite() => n,
    _ => 0.0,
  }
}

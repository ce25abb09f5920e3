//! Time-clock export reader. One row per clock session.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
  ImportLimits, RejectReason, RejectedRow,
  error::{Error, Result},
  normalize::{ClockTime, parse_clock_time, parse_export_date, parse_hours, pick_weekday_suffixed},
  sheet::{Sheet, cell, opt_cell},
};

pub(crate) const COLUMNS: [&str; 10] = [
  "First name",
  "Last name",
  "Type",
  "Sub item",
  "Start Date",
  "In",
  "End Date",
  "Out",
  "Shift hours",
  "Scheduled shift title",
];

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeClockRow {
  pub line:         usize,
  pub first_name:   String,
  pub last_name:    String,
  /// Raw `Type` cell; resolved to a client by the pipeline.
  pub client_label: Option<String>,
  pub sub_item:     Option<String>,
  pub clock_in:     NaiveDateTime,
  /// `None` when the export has no usable clock-out (still clocked in).
  pub clock_out:    Option<NaiveDateTime>,
  /// Paid hours reported by the clock, net of breaks.
  pub shift_hours:  f64,
  /// `Scheduled shift title`; correlates with a shift's external code.
  pub shift_code:   Option<String>,
}

impl TimeClockRow {
  pub fn employee_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name).trim().to_string()
  }

  pub fn date(&self) -> NaiveDate { self.clock_in.date() }

  /// Unpaid time inside the session: the clocked span minus the reported
  /// paid hours, when that difference is positive.
  pub fn break_minutes(&self) -> u32 {
    let Some(out) = self.clock_out else { return 0 };
    if self.shift_hours <= 0.0 {
      return 0;
    }
    let span = (out - self.clock_in).num_minutes();
    let paid = (self.shift_hours * 60.0).round() as i64;
    u32::try_from(span - paid).unwrap_or(0)
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeClockSheet {
  pub rows:       Vec<TimeClockRow>,
  pub rejected:   Vec<RejectedRow>,
  pub total_rows: usize,
}

impl TimeClockSheet {
  /// Every distinct employee name, first-seen order.
  pub fn employee_names(&self) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in self.rows.iter().map(TimeClockRow::employee_name) {
      if !out.iter().any(|o| o.eq_ignore_ascii_case(&name)) {
        out.push(name);
      }
    }
    out
  }

  /// Every distinct non-empty `Type` label, first-seen order.
  pub fn client_labels(&self) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for label in self.rows.iter().filter_map(|r| r.client_label.as_deref()) {
      if !out.iter().any(|o| o.eq_ignore_ascii_case(label)) {
        out.push(label);
      }
    }
    out
  }

  /// Drop rows whose clock-in date falls outside `keep`, recording them as
  /// [`RejectReason::OutOfRange`].
  pub fn retain_dates(&mut self, keep: impl Fn(NaiveDate) -> bool) {
    let mut dropped = Vec::new();
    self.rows.retain(|r| {
      let kept = keep(r.date());
      if !kept {
        dropped.push(RejectedRow {
          line:   r.line,
          reason: RejectReason::OutOfRange(r.date().to_string()),
        });
      }
      kept
    });
    self.rejected.extend(dropped);
    self.rejected.sort_by_key(|r| r.line);
  }
}

// ─── Reader ──────────────────────────────────────────────────────────────────

struct Columns {
  first_name:  usize,
  last_name:   usize,
  kind:        usize,
  sub_item:    usize,
  start_dates: Vec<usize>,
  clock_in:    usize,
  end_dates:   Vec<usize>,
  clock_out:   usize,
  hours:       usize,
  shift_title: usize,
}

impl Columns {
  fn locate(sheet: &Sheet) -> Result<Self> {
    sheet.require(&COLUMNS)?;
    let start_dates = sheet.columns("Start Date");
    let end_dates = sheet.columns("End Date");
    if start_dates.is_empty() {
      return Err(Error::MissingColumn("Start Date".into()));
    }
    Ok(Self {
      first_name: sheet.column("First name")?,
      last_name: sheet.column("Last name")?,
      kind: sheet.column("Type")?,
      sub_item: sheet.column("Sub item")?,
      start_dates,
      clock_in: sheet.column("In")?,
      end_dates,
      clock_out: sheet.column("Out")?,
      hours: sheet.column("Shift hours")?,
      shift_title: sheet.column("Scheduled shift title")?,
    })
  }
}

/// Read a time-clock export.
///
/// Rows without a resolvable clock-in (bad date, bad or "All Day" time) or
/// without a name are excluded and listed in [`TimeClockSheet::rejected`].
pub fn read_timeclock(input: &[u8], limits: &ImportLimits) -> Result<TimeClockSheet> {
  let sheet = Sheet::read(input, limits)?;
  let cols = Columns::locate(&sheet)?;

  let mut out = TimeClockSheet { total_rows: sheet.len(), ..Default::default() };

  for (line, record) in sheet.records() {
    let first_name = cell(record, cols.first_name).trim().to_string();
    let last_name = cell(record, cols.last_name).trim().to_string();
    if first_name.is_empty() && last_name.is_empty() {
      out.rejected.push(RejectedRow { line, reason: RejectReason::MissingName });
      continue;
    }

    let start_values: Vec<&str> = cols.start_dates.iter().map(|&i| cell(record, i)).collect();
    let Some(start_date) = pick_weekday_suffixed(&start_values).and_then(parse_export_date)
    else {
      let raw = start_values.first().copied().unwrap_or_default();
      out.rejected.push(RejectedRow { line, reason: RejectReason::InvalidDate(raw.into()) });
      continue;
    };

    let raw_in = cell(record, cols.clock_in);
    let Some(ClockTime::At(in_time)) = parse_clock_time(raw_in) else {
      out.rejected.push(RejectedRow { line, reason: RejectReason::InvalidTime(raw_in.into()) });
      continue;
    };
    let clock_in = start_date.and_time(in_time);

    let end_values: Vec<&str> = cols.end_dates.iter().map(|&i| cell(record, i)).collect();
    let end_date = pick_weekday_suffixed(&end_values)
      .and_then(parse_export_date)
      .unwrap_or(start_date);
    let clock_out = match parse_clock_time(cell(record, cols.clock_out)) {
      Some(ClockTime::At(out_time)) => {
        let mut at = end_date.and_time(out_time);
        if at < clock_in {
          at += Duration::days(1);
        }
        Some(at)
      }
      _ => None,
    };

    out.rows.push(TimeClockRow {
      line,
      first_name,
      last_name,
      client_label: opt_cell(record, cols.kind),
      sub_item: opt_cell(record, cols.sub_item),
      clock_in,
      clock_out,
      shift_hours: parse_hours(cell(record, cols.hours)),
      shift_code: opt_cell(record, cols.shift_title),
    });
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  const HEADER: &str =
    "First name,Last name,Type,Sub item,Start Date,Start Date,In,End Date,End Date,Out,Shift hours,Scheduled shift title\n";

  fn read(rows: &str) -> TimeClockSheet {
    read_timeclock(format!("{HEADER}{rows}").as_bytes(), &ImportLimits::default()).unwrap()
  }

  fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, d).unwrap().and_hms_opt(h, m, 0).unwrap()
  }

  #[test]
  fn weekday_suffixed_date_column_used() {
    let sheet = read(
      "Juan,Perez,Acme,Line 2,02/01/2026,02/18/2026 Wed,08:00am,02/01/2026,02/18/2026 Wed,05:00pm,8.5,0042\n",
    );
    assert_eq!(sheet.rows.len(), 1);
    let row = &sheet.rows[0];
    assert_eq!(row.employee_name(), "Juan Perez");
    assert_eq!(row.clock_in, at(18, 8, 0));
    assert_eq!(row.clock_out, Some(at(18, 17, 0)));
    assert_eq!(row.shift_code.as_deref(), Some("0042"));
    assert_eq!(row.client_label.as_deref(), Some("Acme"));
    assert_eq!(row.break_minutes(), 30);
  }

  #[test]
  fn overnight_session_rolls_forward() {
    let sheet = read("Ana,Lopez,Acme,,,02/18/2026 Wed,10:00pm,,,06:00am,8,\n");
    let row = &sheet.rows[0];
    assert_eq!(row.clock_in, at(18, 22, 0));
    assert_eq!(row.clock_out, Some(at(19, 6, 0)));
    assert_eq!(row.break_minutes(), 0);
    assert_eq!(row.shift_code, None);
  }

  #[test]
  fn missing_clock_out_leaves_session_open() {
    let sheet = read("Ana,Lopez,,,,02/18/2026 Wed,10:00am,,,,,\n");
    assert_eq!(sheet.rows[0].clock_out, None);
    assert_eq!(sheet.rows[0].break_minutes(), 0);
    assert_eq!(sheet.rows[0].client_label, None);
  }

  #[test]
  fn rows_without_clock_in_are_dropped() {
    let sheet = read(concat!(
      "Ana,Lopez,,,,02/18/2026 Wed,All Day,,,,,\n",
      "Ana,Lopez,,,,,10:00am,,,,,\n",
      ",,,,,02/18/2026 Wed,10:00am,,,,,\n",
      "Juan,Perez,,,,02/18/2026 Wed,10:00am,,,11:00am,1,\n",
    ));
    assert_eq!(sheet.total_rows, 4);
    assert_eq!(sheet.rows.len(), 1);
    let reasons: Vec<_> = sheet.rejected.iter().map(|r| r.reason.clone()).collect();
    assert_eq!(reasons, vec![
      RejectReason::InvalidTime("All Day".into()),
      RejectReason::InvalidDate(String::new()),
      RejectReason::MissingName,
    ]);
  }

  #[test]
  fn out_of_range_rows_rejected() {
    let mut sheet = read(concat!(
      "Ana,Lopez,,,,02/18/2026 Wed,10:00am,,,11:00am,1,\n",
      "Ana,Lopez,,,,02/23/2026 Mon,10:00am,,,11:00am,1,\n",
    ));
    sheet.retain_dates(|d| d <= NaiveDate::from_ymd_opt(2026, 2, 22).unwrap());
    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(sheet.rejected, vec![RejectedRow {
      line:   3,
      reason: RejectReason::OutOfRange("2026-02-23".into()),
    }]);
  }

  #[test]
  fn distinct_names_and_labels() {
    let sheet = read(concat!(
      "Ana,Lopez,Acme,,,02/18/2026 Wed,10:00am,,,11:00am,1,\n",
      "ana,lopez,ACME,,,02/19/2026 Thu,10:00am,,,11:00am,1,\n",
      "Cher,,Globex,,,02/19/2026 Thu,10:00am,,,11:00am,1,\n",
    ));
    assert_eq!(sheet.employee_names(), vec!["Ana Lopez".to_string(), "Cher".to_string()]);
    assert_eq!(sheet.client_labels(), vec!["Acme", "Globex"]);
  }
}

//! Schedule export reader.
//!
//! One row per (shift occurrence × assigned employee). Rows are grouped into
//! [`ShiftGroup`]s so that each distinct occurrence becomes one shift with
//! one candidate assignment per listed employee.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{
  ImportLimits, RejectReason, RejectedRow,
  error::Result,
  normalize::{parse_clock_time, parse_export_date},
  sheet::{Sheet, cell, opt_cell},
};

pub(crate) const COLUMNS: [&str; 12] = [
  "Date",
  "Start",
  "End",
  "Shift title",
  "Job",
  "Sub item",
  "Address",
  "Users",
  "Availability status",
  "Shift tags",
  "Note",
  "Last Status",
];

// ─── Types ───────────────────────────────────────────────────────────────────

/// What makes two rows the same shift occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftGroupKey {
  pub title:        String,
  pub date:         NaiveDate,
  pub start_time:   Option<NaiveTime>,
  pub end_time:     Option<NaiveTime>,
  /// Raw `Job` cell; resolved to a client by the pipeline.
  pub client_label: String,
}

/// A work site taken from the `Sub item` / `Address` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
  pub name:    String,
  pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftGroup {
  pub key:       ShiftGroupKey,
  pub site:      Option<Site>,
  pub notes:     Option<String>,
  /// Distinct employee names, in first-seen order.
  pub employees: Vec<String>,
  /// Source lines that contributed to the group.
  pub lines:     Vec<usize>,
}

/// An "unavailable" row: the employee blocked out time instead of being
/// scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityOverride {
  pub line:          usize,
  pub employee_name: String,
  pub date:          NaiveDate,
  pub start_time:    Option<NaiveTime>,
  pub end_time:      Option<NaiveTime>,
  pub note:          Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSheet {
  /// Shift groups in first-seen order.
  pub groups:                 Vec<ShiftGroup>,
  pub availability_overrides: Vec<AvailabilityOverride>,
  pub rejected:               Vec<RejectedRow>,
  pub total_rows:             usize,
}

impl ScheduleSheet {
  /// Every distinct `Job` label referenced by a group, first-seen order.
  pub fn client_labels(&self) -> Vec<&str> {
    distinct(self.groups.iter().map(|g| g.key.client_label.as_str()))
  }

  /// Every distinct employee name referenced by a group, first-seen order.
  pub fn employee_names(&self) -> Vec<&str> {
    distinct(self.groups.iter().flat_map(|g| g.employees.iter().map(String::as_str)))
  }

  /// Every distinct site referenced by a group, first-seen order.
  pub fn sites(&self) -> Vec<&Site> {
    let mut seen = Vec::<&Site>::new();
    for site in self.groups.iter().filter_map(|g| g.site.as_ref()) {
      if !seen.iter().any(|s| s.name.eq_ignore_ascii_case(&site.name)) {
        seen.push(site);
      }
    }
    seen
  }

  /// Drop groups and availability rows dated outside `keep`, recording
  /// every source line they came from as [`RejectReason::OutOfRange`].
  pub fn retain_dates(&mut self, keep: impl Fn(NaiveDate) -> bool) {
    let mut dropped = Vec::new();
    self.groups.retain(|g| {
      let kept = keep(g.key.date);
      if !kept {
        dropped.extend(g.lines.iter().map(|&line| (line, g.key.date)));
      }
      kept
    });
    self.availability_overrides.retain(|o| {
      let kept = keep(o.date);
      if !kept {
        dropped.push((o.line, o.date));
      }
      kept
    });
    self.rejected.extend(dropped.into_iter().map(|(line, date)| RejectedRow {
      line,
      reason: RejectReason::OutOfRange(date.to_string()),
    }));
    self.rejected.sort_by_key(|r| r.line);
  }
}

/// Non-empty values, deduplicated case-insensitively, order preserved.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
  let mut out: Vec<&str> = Vec::new();
  for v in values {
    if !v.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(v)) {
      out.push(v);
    }
  }
  out
}

// ─── Reader ──────────────────────────────────────────────────────────────────

struct Columns {
  date:         usize,
  start:        usize,
  end:          usize,
  title:        usize,
  job:          usize,
  sub_item:     usize,
  address:      usize,
  users:        usize,
  availability: usize,
  note:         usize,
}

impl Columns {
  fn locate(sheet: &Sheet) -> Result<Self> {
    sheet.require(&COLUMNS)?;
    Ok(Self {
      date:         sheet.column("Date")?,
      start:        sheet.column("Start")?,
      end:          sheet.column("End")?,
      title:        sheet.column("Shift title")?,
      job:          sheet.column("Job")?,
      sub_item:     sheet.column("Sub item")?,
      address:      sheet.column("Address")?,
      users:        sheet.column("Users")?,
      availability: sheet.column("Availability status")?,
      note:         sheet.column("Note")?,
    })
  }
}

/// Read and group a schedule export.
///
/// Fails only on file-level problems (size, empty sheet, missing column,
/// unreadable CSV). Rows with an unparseable date or time are excluded and
/// listed in [`ScheduleSheet::rejected`].
pub fn read_schedule(input: &[u8], limits: &ImportLimits) -> Result<ScheduleSheet> {
  let sheet = Sheet::read(input, limits)?;
  let cols = Columns::locate(&sheet)?;

  let mut out = ScheduleSheet { total_rows: sheet.len(), ..Default::default() };
  let mut index: HashMap<ShiftGroupKey, usize> = HashMap::new();

  for (line, record) in sheet.records() {
    let raw_date = cell(record, cols.date);
    let Some(date) = parse_export_date(raw_date) else {
      out.rejected.push(RejectedRow { line, reason: RejectReason::InvalidDate(raw_date.into()) });
      continue;
    };
    let raw_start = cell(record, cols.start);
    let Some(start) = parse_clock_time(raw_start) else {
      out.rejected.push(RejectedRow { line, reason: RejectReason::InvalidTime(raw_start.into()) });
      continue;
    };
    let raw_end = cell(record, cols.end);
    let Some(end) = parse_clock_time(raw_end) else {
      out.rejected.push(RejectedRow { line, reason: RejectReason::InvalidTime(raw_end.into()) });
      continue;
    };

    let user = cell(record, cols.users).split_whitespace().collect::<Vec<_>>().join(" ");
    let note = opt_cell(record, cols.note);

    if cell(record, cols.availability).to_lowercase().contains("unavailable") {
      if user.is_empty() {
        out.rejected.push(RejectedRow { line, reason: RejectReason::MissingName });
      } else {
        out.availability_overrides.push(AvailabilityOverride {
          line,
          employee_name: user,
          date,
          start_time: start.time(),
          end_time: end.time(),
          note,
        });
      }
      continue;
    }

    let job = cell(record, cols.job).to_string();
    let title = match opt_cell(record, cols.title) {
      Some(t) => t,
      None if !job.is_empty() => job.clone(),
      None => "Shift".to_string(),
    };
    let key = ShiftGroupKey {
      title,
      date,
      start_time: start.time(),
      end_time: end.time(),
      client_label: job,
    };

    let pos = *index.entry(key.clone()).or_insert_with(|| {
      out.groups.push(ShiftGroup {
        key,
        site: None,
        notes: None,
        employees: Vec::new(),
        lines: Vec::new(),
      });
      out.groups.len() - 1
    });
    let group = &mut out.groups[pos];
    group.lines.push(line);

    if group.site.is_none()
      && let Some(name) = opt_cell(record, cols.sub_item)
    {
      group.site = Some(Site { name, address: opt_cell(record, cols.address) });
    }
    if group.notes.is_none() {
      group.notes = note;
    }
    if !user.is_empty() && !group.employees.iter().any(|e| e.eq_ignore_ascii_case(&user)) {
      group.employees.push(user);
    }
  }

  Ok(out)
}

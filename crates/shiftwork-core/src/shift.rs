//! Shifts — planned, dated work occurrences — and field-level diffs between
//! two versions of a shift.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::time::{self, DatedRange, TimeRange};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Shift lifecycle: drafts are invisible to employees until published.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShiftStatus {
  #[default]
  Draft,
  Published,
}

// ─── Shift ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
  pub shift_id:    Uuid,
  pub tenant_id:   Uuid,
  pub title:       String,
  pub date:        NaiveDate,
  /// `None` is the "All Day" sentinel: the range starts at midnight.
  pub start_time:  Option<NaiveTime>,
  /// `None` is the "All Day" sentinel: the range ends at midnight.
  pub end_time:    Option<NaiveTime>,
  pub client_id:   Option<Uuid>,
  pub location_id: Option<Uuid>,
  /// Capacity: how many employees the shift needs.
  pub slots:       u32,
  pub claimable:   bool,
  pub status:      ShiftStatus,
  /// External code correlating the shift with time-clock exports.
  pub shift_code:  Option<String>,
  pub notes:       Option<String>,
  /// Set on rows written by an import run; see the engine's import key.
  pub import_tag:  Option<String>,
  pub created_at:  DateTime<Utc>,
}

impl Shift {
  pub fn range(&self) -> TimeRange { TimeRange::from_bounds(self.start_time, self.end_time) }

  pub fn dated_range(&self) -> DatedRange { DatedRange::new(self.date, self.range()) }

  /// The planned `[start, end)` window as wall-clock instants. A range
  /// running to midnight ends at the start of the next day.
  pub fn window(&self) -> (NaiveDateTime, NaiveDateTime) {
    let midnight = self.date.and_time(NaiveTime::MIN);
    let range = self.range();
    (
      midnight + Duration::minutes(i64::from(range.start())),
      midnight + Duration::minutes(i64::from(range.end())),
    )
  }

  pub fn has_inverted_range(&self) -> bool {
    time::is_inverted(self.start_time, self.end_time)
  }
}

/// Input for [`ScheduleStore::add_shift`](crate::store::ScheduleStore::add_shift).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShift {
  pub tenant_id:   Uuid,
  pub title:       String,
  pub date:        NaiveDate,
  pub start_time:  Option<NaiveTime>,
  pub end_time:    Option<NaiveTime>,
  pub client_id:   Option<Uuid>,
  pub location_id: Option<Uuid>,
  pub slots:       u32,
  pub claimable:   bool,
  pub status:      ShiftStatus,
  pub shift_code:  Option<String>,
  pub notes:       Option<String>,
  pub import_tag:  Option<String>,
}

impl NewShift {
  /// A single-slot, non-claimable draft with no fixed times.
  pub fn new(tenant_id: Uuid, title: impl Into<String>, date: NaiveDate) -> Self {
    Self {
      tenant_id,
      title: title.into(),
      date,
      start_time: None,
      end_time: None,
      client_id: None,
      location_id: None,
      slots: 1,
      claimable: false,
      status: ShiftStatus::Draft,
      shift_code: None,
      notes: None,
      import_tag: None,
    }
  }

  pub fn with_times(mut self, start: Option<NaiveTime>, end: Option<NaiveTime>) -> Self {
    self.start_time = start;
    self.end_time = end;
    self
  }

  pub fn range(&self) -> TimeRange { TimeRange::from_bounds(self.start_time, self.end_time) }
}

// ─── Field diffs ─────────────────────────────────────────────────────────────

/// The editable fields of a shift, in declaration (and diff) order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShiftField {
  Title,
  Date,
  StartTime,
  EndTime,
  Location,
  Client,
  Slots,
  Claimable,
  Status,
  ShiftCode,
  Notes,
}

impl ShiftField {
  /// Changes to these fields reschedule the shift; every assignee must be
  /// told.
  pub fn is_broadcast(self) -> bool {
    matches!(
      self,
      Self::Date | Self::StartTime | Self::EndTime | Self::Location | Self::Client
    )
  }
}

/// One changed field with human-readable before/after values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
  pub field:  ShiftField,
  pub before: Option<String>,
  pub after:  Option<String>,
}

/// Compute the ordered list of fields that differ between two versions of
/// the same shift.
pub fn diff_shifts(before: &Shift, after: &Shift) -> Vec<FieldChange> {
  let mut changes = Vec::new();
  let mut push = |field, b: Option<String>, a: Option<String>| {
    if b != a {
      changes.push(FieldChange { field, before: b, after: a });
    }
  };

  push(ShiftField::Title, Some(before.title.clone()), Some(after.title.clone()));
  push(ShiftField::Date, Some(before.date.to_string()), Some(after.date.to_string()));
  push(ShiftField::StartTime, before.start_time.map(fmt_time), after.start_time.map(fmt_time));
  push(ShiftField::EndTime, before.end_time.map(fmt_time), after.end_time.map(fmt_time));
  push(
    ShiftField::Location,
    before.location_id.map(|id| id.to_string()),
    after.location_id.map(|id| id.to_string()),
  );
  push(
    ShiftField::Client,
    before.client_id.map(|id| id.to_string()),
    after.client_id.map(|id| id.to_string()),
  );
  push(ShiftField::Slots, Some(before.slots.to_string()), Some(after.slots.to_string()));
  push(
    ShiftField::Claimable,
    Some(before.claimable.to_string()),
    Some(after.claimable.to_string()),
  );
  push(ShiftField::Status, Some(before.status.to_string()), Some(after.status.to_string()));
  push(ShiftField::ShiftCode, before.shift_code.clone(), after.shift_code.clone());
  push(ShiftField::Notes, before.notes.clone(), after.notes.clone());

  changes
}

fn fmt_time(t: NaiveTime) -> String { t.format("%H:%M").to_string() }

//! Time entries — actual attendance, as opposed to planned shifts.
//!
//! Clock timestamps are wall-clock times in the tenant's local zone; zone
//! handling belongs to the caller.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Review status of a time entry.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
  pub entry_id:      Uuid,
  pub tenant_id:     Uuid,
  pub employee_id:   Uuid,
  pub shift_id:      Option<Uuid>,
  pub client_id:     Option<Uuid>,
  pub clock_in:      NaiveDateTime,
  /// `None` while the employee is still clocked in.
  pub clock_out:     Option<NaiveDateTime>,
  pub break_minutes: u32,
  pub status:        EntryStatus,
  pub notes:         Option<String>,
  pub import_tag:    Option<String>,
  pub created_at:    DateTime<Utc>,
}

impl TimeEntry {
  pub fn is_open(&self) -> bool { self.clock_out.is_none() }

  /// Minutes between clock-in and clock-out, net of breaks. `None` while
  /// open.
  pub fn worked_minutes(&self) -> Option<i64> {
    let out = self.clock_out?;
    let span = (out - self.clock_in).num_minutes();
    Some((span - i64::from(self.break_minutes)).max(0))
  }
}

/// Input for [`ScheduleStore::add_time_entry`](crate::store::ScheduleStore::add_time_entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeEntry {
  pub tenant_id:     Uuid,
  pub employee_id:   Uuid,
  pub shift_id:      Option<Uuid>,
  pub client_id:     Option<Uuid>,
  pub clock_in:      NaiveDateTime,
  pub clock_out:     Option<NaiveDateTime>,
  pub break_minutes: u32,
  pub status:        EntryStatus,
  pub notes:         Option<String>,
  pub import_tag:    Option<String>,
}

impl NewTimeEntry {
  /// An open, pending entry with no shift reference.
  pub fn clock_in(tenant_id: Uuid, employee_id: Uuid, at: NaiveDateTime) -> Self {
    Self {
      tenant_id,
      employee_id,
      shift_id: None,
      client_id: None,
      clock_in: at,
      clock_out: None,
      break_minutes: 0,
      status: EntryStatus::Pending,
      notes: None,
      import_tag: None,
    }
  }
}

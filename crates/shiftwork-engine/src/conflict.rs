//! Double-booking detection against the store.
//!
//! The interval arithmetic lives in [`shiftwork_core::time`]; this module
//! only fetches the candidates.

use chrono::{NaiveDate, NaiveDateTime};
use shiftwork_core::{
  attendance::TimeEntry,
  shift::Shift,
  store::ScheduleStore,
  time::{TimeRange, sessions_overlap},
};
use uuid::Uuid;

use crate::{Error, Result};

/// The first shift the employee is assigned to on `date` whose range
/// overlaps `range`. Rejected assignments and `exclude_shift_id` (the shift
/// being edited) are ignored.
pub async fn has_conflict<S: ScheduleStore>(
  store: &S,
  tenant_id: Uuid,
  employee_id: Uuid,
  date: NaiveDate,
  range: TimeRange,
  exclude_shift_id: Option<Uuid>,
) -> Result<Option<Shift>> {
  let booked = store
    .list_employee_shifts(tenant_id, employee_id, date)
    .await
    .map_err(Error::store)?;

  Ok(
    booked
      .into_iter()
      .filter(|a| a.assignment.status.is_active())
      .filter(|a| Some(a.shift.shift_id) != exclude_shift_id)
      .map(|a| a.shift)
      .find(|s| s.range().overlaps(&range)),
  )
}

/// The first recorded session of the employee that overlaps
/// `[clock_in, clock_out)`. Open sessions on either side extend
/// indefinitely. `exclude_entry_id` skips the entry being corrected.
pub async fn has_attendance_overlap<S: ScheduleStore>(
  store: &S,
  tenant_id: Uuid,
  employee_id: Uuid,
  clock_in: NaiveDateTime,
  clock_out: Option<NaiveDateTime>,
  exclude_entry_id: Option<Uuid>,
) -> Result<Option<TimeEntry>> {
  let window_end = clock_out.unwrap_or_else(open_ended);
  let entries = store
    .list_employee_entries(tenant_id, employee_id, clock_in, window_end)
    .await
    .map_err(Error::store)?;

  Ok(
    entries
      .into_iter()
      .filter(|e| Some(e.entry_id) != exclude_entry_id)
      .find(|e| sessions_overlap(e.clock_in, e.clock_out, clock_in, clock_out)),
  )
}

/// Upper bound used for the store window of an open session.
fn open_ended() -> NaiveDateTime {
  NaiveDate::from_ymd_opt(9999, 12, 31)
    .and_then(|d| d.and_hms_opt(23, 59, 59))
    .unwrap_or(NaiveDateTime::MAX)
}

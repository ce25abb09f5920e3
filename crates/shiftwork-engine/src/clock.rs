//! Clock actions and administrative time-entry corrections.
//!
//! The store's one-open-entry constraint is authoritative: the pre-check
//! here only produces a friendlier error, a lost race still surfaces as
//! [`Error::AlreadyClockedIn`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use shiftwork_core::{
  StoreError as _,
  attendance::{EntryStatus, NewTimeEntry, TimeEntry},
  events::{ChangeOp, EntityKind},
  store::ScheduleStore,
};
use tracing::info;
use uuid::Uuid;

use crate::{Engine, Error, Result, conflict::has_attendance_overlap};

/// Replacement values for a closed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeCorrection {
  pub clock_in:      NaiveDateTime,
  pub clock_out:     NaiveDateTime,
  #[serde(default)]
  pub break_minutes: u32,
  #[serde(default)]
  pub notes:         Option<String>,
}

impl<S: ScheduleStore> Engine<S> {
  async fn load_entry(&self, tenant_id: Uuid, entry_id: Uuid) -> Result<TimeEntry> {
    self
      .store
      .get_time_entry(tenant_id, entry_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::EntryNotFound(entry_id))
  }

  async fn save_entry(&self, entry: &TimeEntry) -> Result<()> {
    if !self.store.update_time_entry(entry.clone()).await.map_err(Error::store)? {
      return Err(Error::EntryNotFound(entry.entry_id));
    }
    self.emit(entry.tenant_id, EntityKind::TimeEntry, entry.entry_id, ChangeOp::Updated);
    Ok(())
  }

  /// Open a session for the employee, optionally against a shift.
  pub async fn clock_in(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    at: NaiveDateTime,
    shift_id: Option<Uuid>,
  ) -> Result<TimeEntry> {
    if self
      .store
      .get_employee(tenant_id, employee_id)
      .await
      .map_err(Error::store)?
      .is_none()
    {
      return Err(Error::EmployeeNotFound(employee_id));
    }
    if self
      .store
      .open_time_entry(tenant_id, employee_id)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::AlreadyClockedIn(employee_id));
    }
    if let Some(shift_id) = shift_id {
      self.load_shift(tenant_id, shift_id).await?;
    }
    if let Some(other) =
      has_attendance_overlap(self.store(), tenant_id, employee_id, at, None, None).await?
    {
      return Err(Error::AttendanceOverlap(other.entry_id));
    }

    let mut input = NewTimeEntry::clock_in(tenant_id, employee_id, at);
    input.shift_id = shift_id;
    let entry = match self.store.add_time_entry(input).await {
      Ok(entry) => entry,
      Err(e) if e.is_constraint_violation() => {
        return Err(self.explain_rejected_clock_in(tenant_id, employee_id, at, e).await);
      }
      Err(e) => return Err(Error::store(e)),
    };
    self.emit(tenant_id, EntityKind::TimeEntry, entry.entry_id, ChangeOp::Created);
    info!(%employee_id, entry_id = %entry.entry_id, "clocked in");
    Ok(entry)
  }

  /// Name the session a concurrent writer slipped in ahead of a clock-in.
  async fn explain_rejected_clock_in(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    at: NaiveDateTime,
    cause: S::Error,
  ) -> Error {
    match self.store.open_time_entry(tenant_id, employee_id).await {
      Ok(Some(_)) => return Error::AlreadyClockedIn(employee_id),
      Ok(None) => {}
      Err(e) => return Error::store(e),
    }
    match has_attendance_overlap(self.store(), tenant_id, employee_id, at, None, None).await {
      Ok(Some(other)) => Error::AttendanceOverlap(other.entry_id),
      Ok(None) => Error::store(cause),
      Err(e) => e,
    }
  }

  /// Close the employee's open session.
  pub async fn clock_out(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    at: NaiveDateTime,
    break_minutes: u32,
  ) -> Result<TimeEntry> {
    let mut entry = self
      .store
      .open_time_entry(tenant_id, employee_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotClockedIn(employee_id))?;
    if at <= entry.clock_in {
      return Err(Error::InvertedSession);
    }

    entry.clock_out = Some(at);
    entry.break_minutes = break_minutes;
    self.save_entry(&entry).await?;
    info!(%employee_id, entry_id = %entry.entry_id, "clocked out");
    Ok(entry)
  }

  /// Overwrite the times of a closed entry. The corrected session may not
  /// overlap any other session of the same employee.
  pub async fn correct_time_entry(
    &self,
    tenant_id: Uuid,
    entry_id: Uuid,
    correction: TimeCorrection,
  ) -> Result<TimeEntry> {
    let mut entry = self.load_entry(tenant_id, entry_id).await?;
    if entry.is_open() {
      return Err(Error::EntryStillOpen(entry_id));
    }
    if correction.clock_out <= correction.clock_in {
      return Err(Error::InvertedSession);
    }
    if let Some(other) = has_attendance_overlap(
      self.store(),
      tenant_id,
      entry.employee_id,
      correction.clock_in,
      Some(correction.clock_out),
      Some(entry_id),
    )
    .await?
    {
      return Err(Error::AttendanceOverlap(other.entry_id));
    }

    entry.clock_in = correction.clock_in;
    entry.clock_out = Some(correction.clock_out);
    entry.break_minutes = correction.break_minutes;
    if correction.notes.is_some() {
      entry.notes = correction.notes;
    }
    self.save_entry(&entry).await?;
    Ok(entry)
  }

  /// Approve or reject a closed entry.
  pub async fn review_time_entry(
    &self,
    tenant_id: Uuid,
    entry_id: Uuid,
    status: EntryStatus,
  ) -> Result<TimeEntry> {
    let mut entry = self.load_entry(tenant_id, entry_id).await?;
    if entry.is_open() {
      return Err(Error::EntryStillOpen(entry_id));
    }
    entry.status = status;
    self.save_entry(&entry).await?;
    Ok(entry)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use shiftwork_core::{people::NewEmployee, shift::NewShift};

  use super::*;
  use crate::testing::engine;

  fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
  }

  #[tokio::test]
  async fn one_open_session_at_a_time() {
    let (engine, sink) = engine().await;
    let tenant = Uuid::new_v4();
    let ana = engine.store().add_employee(tenant, NewEmployee::new("Ana", "Lopez")).await.unwrap();
    let id = ana.employee_id;

    let open = engine.clock_in(tenant, id, at(18, 8), None).await.unwrap();
    assert!(open.is_open());
    let err = engine.clock_in(tenant, id, at(18, 9), None).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyClockedIn(e) if e == id));

    let err = engine.clock_out(tenant, id, at(18, 7), 0).await.unwrap_err();
    assert!(matches!(err, Error::InvertedSession));
    let closed = engine.clock_out(tenant, id, at(18, 17), 30).await.unwrap();
    assert_eq!(closed.entry_id, open.entry_id);
    assert_eq!(closed.worked_minutes(), Some(9 * 60 - 30));

    let err = engine.clock_out(tenant, id, at(18, 18), 0).await.unwrap_err();
    assert!(matches!(err, Error::NotClockedIn(_)));
    // Clocking in inside the closed session overlaps it.
    let err = engine.clock_in(tenant, id, at(18, 12), None).await.unwrap_err();
    assert!(matches!(err, Error::AttendanceOverlap(e) if e == open.entry_id));
    engine.clock_in(tenant, id, at(19, 8), None).await.unwrap();

    assert_eq!(sink.0.lock().unwrap().len(), 3);
  }

  #[tokio::test]
  async fn unknown_employee_cannot_clock_in() {
    let (engine, _) = engine().await;
    let err = engine.clock_in(Uuid::new_v4(), Uuid::new_v4(), at(18, 8), None).await.unwrap_err();
    assert!(matches!(err, Error::EmployeeNotFound(_)));
  }

  #[tokio::test]
  async fn clock_in_shift_must_belong_to_the_tenant() {
    let (engine, sink) = engine().await;
    let (tenant, other) = (Uuid::new_v4(), Uuid::new_v4());
    let store = engine.store();
    let ana = store.add_employee(tenant, NewEmployee::new("Ana", "Lopez")).await.unwrap();
    let day = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
    let theirs = store.add_shift(NewShift::new(other, "Morning", day)).await.unwrap();
    let ours = store.add_shift(NewShift::new(tenant, "Morning", day)).await.unwrap();

    for shift_id in [theirs.shift_id, Uuid::new_v4()] {
      let err = engine
        .clock_in(tenant, ana.employee_id, at(18, 8), Some(shift_id))
        .await
        .unwrap_err();
      assert!(matches!(err, Error::ShiftNotFound(id) if id == shift_id));
    }
    assert!(store.open_time_entry(tenant, ana.employee_id).await.unwrap().is_none());
    assert!(sink.0.lock().unwrap().is_empty());

    let entry = engine
      .clock_in(tenant, ana.employee_id, at(18, 8), Some(ours.shift_id))
      .await
      .unwrap();
    assert_eq!(entry.shift_id, Some(ours.shift_id));
  }

  #[tokio::test]
  async fn entries_are_invisible_to_other_tenants() {
    let (engine, _) = engine().await;
    let (tenant, other) = (Uuid::new_v4(), Uuid::new_v4());
    let ana = engine.store().add_employee(tenant, NewEmployee::new("Ana", "Lopez")).await.unwrap();
    engine.clock_in(tenant, ana.employee_id, at(18, 8), None).await.unwrap();

    let err = engine.clock_out(other, ana.employee_id, at(18, 12), 0).await.unwrap_err();
    assert!(matches!(err, Error::NotClockedIn(_)));
    let entry = engine.clock_out(tenant, ana.employee_id, at(18, 12), 0).await.unwrap();

    let correction = TimeCorrection {
      clock_in:      at(18, 7),
      clock_out:     at(18, 12),
      break_minutes: 0,
      notes:         None,
    };
    let err = engine.correct_time_entry(other, entry.entry_id, correction).await.unwrap_err();
    assert!(matches!(err, Error::EntryNotFound(_)));
    let err = engine
      .review_time_entry(other, entry.entry_id, EntryStatus::Rejected)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::EntryNotFound(_)));

    let stored = engine.store().get_time_entry(tenant, entry.entry_id).await.unwrap().unwrap();
    assert_eq!(stored.clock_in, at(18, 8));
    assert_eq!(stored.status, entry.status);
  }

  #[tokio::test]
  async fn corrections_and_reviews() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let ana = engine.store().add_employee(tenant, NewEmployee::new("Ana", "Lopez")).await.unwrap();
    let id = ana.employee_id;

    let first = engine.clock_in(tenant, id, at(18, 8), None).await.unwrap();
    let err = engine
      .review_time_entry(tenant, first.entry_id, EntryStatus::Approved)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::EntryStillOpen(_)));
    engine.clock_out(tenant, id, at(18, 12), 0).await.unwrap();
    engine.clock_in(tenant, id, at(18, 13), None).await.unwrap();
    engine.clock_out(tenant, id, at(18, 17), 0).await.unwrap();

    let overlapping = TimeCorrection {
      clock_in:      at(18, 8),
      clock_out:     at(18, 14),
      break_minutes: 0,
      notes:         None,
    };
    let err = engine.correct_time_entry(tenant, first.entry_id, overlapping).await.unwrap_err();
    assert!(matches!(err, Error::AttendanceOverlap(_)));

    let fixed = TimeCorrection {
      clock_in:      at(18, 7),
      clock_out:     at(18, 13),
      break_minutes: 15,
      notes:         Some("forgot to clock in".into()),
    };
    let entry = engine.correct_time_entry(tenant, first.entry_id, fixed).await.unwrap();
    assert_eq!(entry.clock_in, at(18, 7));
    assert_eq!(entry.notes.as_deref(), Some("forgot to clock in"));

    let approved = engine
      .review_time_entry(tenant, first.entry_id, EntryStatus::Approved)
      .await
      .unwrap();
    assert_eq!(approved.status, EntryStatus::Approved);
    let stored = engine.store().get_time_entry(tenant, first.entry_id).await.unwrap().unwrap();
    assert_eq!(stored.status, EntryStatus::Approved);
    assert_eq!(stored.break_minutes, 15);
  }
}

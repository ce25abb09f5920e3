//! Interactive shift editing: create, update, publish, assign, claim.
//!
//! Create and update run in advisory mode: problems are returned as
//! [`ShiftWarning`]s and nothing is written until the caller confirms.
//! Assigning, claiming and accepting are hard-blocked by overlaps.

use std::collections::HashSet;

use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use shiftwork_core::{
  StoreError as _,
  assignment::{Assignment, AssignmentStatus, NewAssignment},
  events::{ChangeOp, EntityKind},
  people::Employee,
  shift::{NewShift, Shift, ShiftStatus, diff_shifts},
  store::ScheduleStore,
  time,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Engine, Error, Result,
  conflict::has_conflict,
  notify::{plan_assignment_removed, plan_claim_requested, plan_published, plan_shift_edit},
};

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShiftWarning {
  /// End time is not after start time; the shift runs to midnight.
  InvertedRange,
  NoAssignments,
  OverCapacity { assigned: usize, slots: u32 },
  PastDate,
  #[serde(rename_all = "camelCase")]
  Conflict { employee_id: Uuid, shift_id: Uuid },
}

/// Result of an advisory-mode edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum EditOutcome<T> {
  /// Nothing was written; repeat with `confirm` to proceed anyway.
  NeedsConfirmation(Vec<ShiftWarning>),
  Done(T),
}

/// A shift together with every assignment on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDetail {
  pub shift:       Shift,
  pub assignments: Vec<Assignment>,
}

/// Partial update. Absent fields are left alone; for nullable fields an
/// explicit `null` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShiftPatch {
  pub title:       Option<String>,
  pub date:        Option<NaiveDate>,
  #[serde(deserialize_with = "present")]
  pub start_time:  Option<Option<NaiveTime>>,
  #[serde(deserialize_with = "present")]
  pub end_time:    Option<Option<NaiveTime>>,
  #[serde(deserialize_with = "present")]
  pub client_id:   Option<Option<Uuid>>,
  #[serde(deserialize_with = "present")]
  pub location_id: Option<Option<Uuid>>,
  pub slots:       Option<u32>,
  pub claimable:   Option<bool>,
  #[serde(deserialize_with = "present")]
  pub shift_code:  Option<Option<String>>,
  #[serde(deserialize_with = "present")]
  pub notes:       Option<Option<String>>,
}

/// Distinguishes a present `null` from an absent field.
fn present<'de, D, T>(d: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(d).map(Some)
}

impl ShiftPatch {
  pub fn apply(&self, shift: &mut Shift) {
    if let Some(v) = &self.title {
      shift.title = v.clone();
    }
    if let Some(v) = self.date {
      shift.date = v;
    }
    if let Some(v) = self.start_time {
      shift.start_time = v;
    }
    if let Some(v) = self.end_time {
      shift.end_time = v;
    }
    if let Some(v) = self.client_id {
      shift.client_id = v;
    }
    if let Some(v) = self.location_id {
      shift.location_id = v;
    }
    if let Some(v) = self.slots {
      shift.slots = v;
    }
    if let Some(v) = self.claimable {
      shift.claimable = v;
    }
    if let Some(v) = &self.shift_code {
      shift.shift_code = v.clone();
    }
    if let Some(v) = &self.notes {
      shift.notes = v.clone();
    }
  }
}

/// Claimable and visible to employees.
fn is_open(shift: &Shift) -> bool { shift.claimable && shift.status == ShiftStatus::Published }

// ─── Operations ──────────────────────────────────────────────────────────────

impl<S: ScheduleStore> Engine<S> {
  pub async fn shift_detail(&self, tenant_id: Uuid, shift_id: Uuid) -> Result<ShiftDetail> {
    let shift = self.load_shift(tenant_id, shift_id).await?;
    let assignments = self
      .store
      .list_shift_assignments(tenant_id, shift_id)
      .await
      .map_err(Error::store)?;
    Ok(ShiftDetail { shift, assignments })
  }

  pub(crate) async fn load_shift(&self, tenant_id: Uuid, shift_id: Uuid) -> Result<Shift> {
    self
      .store
      .get_shift(tenant_id, shift_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ShiftNotFound(shift_id))
  }

  async fn load_employee(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Employee> {
    self
      .store
      .get_employee(tenant_id, employee_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::EmployeeNotFound(employee_id))
  }

  async fn load_assignment(&self, tenant_id: Uuid, assignment_id: Uuid) -> Result<Assignment> {
    self
      .store
      .get_assignment(tenant_id, assignment_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AssignmentNotFound(assignment_id))
  }

  /// Advisory checks shared by create and update. `exclude` is the shift
  /// being edited, so it never conflicts with itself.
  async fn warnings(
    &self,
    shift: &NewShift,
    assignees: &[Uuid],
    exclude: Option<Uuid>,
  ) -> Result<Vec<ShiftWarning>> {
    let mut warnings = Vec::new();
    if time::is_inverted(shift.start_time, shift.end_time) {
      warnings.push(ShiftWarning::InvertedRange);
    }
    if assignees.len() > shift.slots as usize {
      warnings.push(ShiftWarning::OverCapacity { assigned: assignees.len(), slots: shift.slots });
    }
    if shift.date < Local::now().date_naive() {
      warnings.push(ShiftWarning::PastDate);
    }
    for &employee_id in assignees {
      let hit = has_conflict(
        self.store(),
        shift.tenant_id,
        employee_id,
        shift.date,
        shift.range(),
        exclude,
      )
      .await?;
      if let Some(other) = hit {
        warnings.push(ShiftWarning::Conflict { employee_id, shift_id: other.shift_id });
      }
    }
    Ok(warnings)
  }

  /// Create a shift and assign `assignees` to it (pending).
  ///
  /// With warnings and without `confirm`, nothing is written. Confirmed
  /// conflicting assignments are written anyway.
  pub async fn create_shift(
    &self,
    tenant_id: Uuid,
    mut draft: NewShift,
    assignees: Vec<Uuid>,
    confirm: bool,
  ) -> Result<EditOutcome<ShiftDetail>> {
    draft.tenant_id = tenant_id;
    let mut seen = HashSet::new();
    let mut assignees = assignees;
    assignees.retain(|id| seen.insert(*id));
    // Every assignee must belong to this tenant before anything is written.
    for &employee_id in &assignees {
      self.load_employee(tenant_id, employee_id).await?;
    }

    let mut warnings = self.warnings(&draft, &assignees, None).await?;
    if assignees.is_empty() {
      warnings.insert(0, ShiftWarning::NoAssignments);
    }
    if !warnings.is_empty() && !confirm {
      return Ok(EditOutcome::NeedsConfirmation(warnings));
    }

    let shift = self.store.add_shift(draft).await.map_err(Error::store)?;
    self.emit(tenant_id, EntityKind::Shift, shift.shift_id, ChangeOp::Created);

    let mut assignments = Vec::with_capacity(assignees.len());
    for employee_id in assignees {
      let input =
        NewAssignment::new(tenant_id, shift.shift_id, employee_id, AssignmentStatus::Pending);
      match self.store.add_assignment(input).await {
        Ok(a) => {
          self.emit(tenant_id, EntityKind::Assignment, a.assignment_id, ChangeOp::Created);
          assignments.push(a);
        }
        Err(e) if e.is_constraint_violation() => {
          debug!(%employee_id, "duplicate assignee ignored");
        }
        Err(e) => return Err(Error::store(e)),
      }
    }

    if shift.status == ShiftStatus::Published {
      let ids: Vec<Uuid> = assignments.iter().map(|a| a.employee_id).collect();
      self.dispatch(plan_published(&shift, &ids)).await;
    }
    if is_open(&shift) {
      self.announce_open_shift(&shift).await?;
    }

    info!(shift_id = %shift.shift_id, warnings = warnings.len(), "shift created");
    Ok(EditOutcome::Done(ShiftDetail { shift, assignments }))
  }

  /// Apply `patch` to a shift. Same warning model as [`Self::create_shift`];
  /// the write is a full-row, last-write-wins update.
  pub async fn update_shift(
    &self,
    tenant_id: Uuid,
    shift_id: Uuid,
    patch: ShiftPatch,
    confirm: bool,
  ) -> Result<EditOutcome<ShiftDetail>> {
    let before = self.load_shift(tenant_id, shift_id).await?;
    let mut after = before.clone();
    patch.apply(&mut after);

    let changes = diff_shifts(&before, &after);
    if changes.is_empty() {
      return Ok(EditOutcome::Done(self.shift_detail(tenant_id, shift_id).await?));
    }

    let assignees = self.assignees(tenant_id, shift_id).await?;
    let draft = NewShift {
      tenant_id,
      title: after.title.clone(),
      date: after.date,
      start_time: after.start_time,
      end_time: after.end_time,
      client_id: after.client_id,
      location_id: after.location_id,
      slots: after.slots,
      claimable: after.claimable,
      status: after.status,
      shift_code: after.shift_code.clone(),
      notes: after.notes.clone(),
      import_tag: after.import_tag.clone(),
    };
    let mut warnings = self.warnings(&draft, &assignees, Some(shift_id)).await?;
    // A shift already in the past may still be corrected.
    if before.date == after.date {
      warnings.retain(|w| *w != ShiftWarning::PastDate);
    }
    if !warnings.is_empty() && !confirm {
      return Ok(EditOutcome::NeedsConfirmation(warnings));
    }

    if !self.store.update_shift(after.clone()).await.map_err(Error::store)? {
      return Err(Error::ShiftNotFound(shift_id));
    }
    self.emit(tenant_id, EntityKind::Shift, shift_id, ChangeOp::Updated);

    self.dispatch(plan_shift_edit(&after, &changes, &assignees)).await;
    if is_open(&after) && !is_open(&before) {
      self.announce_open_shift(&after).await?;
    }

    info!(%shift_id, changed = changes.len(), "shift updated");
    Ok(EditOutcome::Done(self.shift_detail(tenant_id, shift_id).await?))
  }

  /// Publish a draft and tell its assignees. Publishing an already
  /// published shift is a no-op.
  pub async fn publish_shift(&self, tenant_id: Uuid, shift_id: Uuid) -> Result<Shift> {
    let mut shift = self.load_shift(tenant_id, shift_id).await?;
    if shift.status == ShiftStatus::Published {
      return Ok(shift);
    }
    shift.status = ShiftStatus::Published;
    if !self.store.update_shift(shift.clone()).await.map_err(Error::store)? {
      return Err(Error::ShiftNotFound(shift_id));
    }
    self.emit(tenant_id, EntityKind::Shift, shift_id, ChangeOp::Updated);

    let assignees = self.assignees(tenant_id, shift_id).await?;
    self.dispatch(plan_published(&shift, &assignees)).await;
    if is_open(&shift) {
      self.announce_open_shift(&shift).await?;
    }
    Ok(shift)
  }

  /// Assign an employee (pending). Refused if it would double-book them.
  pub async fn assign_employee(
    &self,
    tenant_id: Uuid,
    shift_id: Uuid,
    employee_id: Uuid,
  ) -> Result<Assignment> {
    let shift = self.load_shift(tenant_id, shift_id).await?;
    self.book(&shift, employee_id).await
  }

  /// Request a claimable shift. The assignment stays pending until the
  /// company responds.
  pub async fn claim_shift(
    &self,
    tenant_id: Uuid,
    shift_id: Uuid,
    employee_id: Uuid,
  ) -> Result<Assignment> {
    let shift = self.load_shift(tenant_id, shift_id).await?;
    if !is_open(&shift) {
      return Err(Error::NotClaimable(shift_id));
    }
    let assignees = self.assignees(tenant_id, shift_id).await?;
    if assignees.contains(&employee_id) {
      return Err(Error::AlreadyAssigned { employee_id, shift_id });
    }
    if assignees.len() >= shift.slots as usize {
      return Err(Error::ShiftFull(shift_id));
    }

    let assignment = self.book(&shift, employee_id).await?;
    if let Some(employee) = self
      .store
      .get_employee(tenant_id, employee_id)
      .await
      .map_err(Error::store)?
    {
      self.dispatch(vec![plan_claim_requested(&shift, &employee)]).await;
    }
    Ok(assignment)
  }

  /// Insert a pending assignment behind the hard conflict block.
  async fn book(&self, shift: &Shift, employee_id: Uuid) -> Result<Assignment> {
    let tenant_id = shift.tenant_id;
    let shift_id = shift.shift_id;
    self.load_employee(tenant_id, employee_id).await?;

    let hit =
      has_conflict(self.store(), tenant_id, employee_id, shift.date, shift.range(), Some(shift_id))
        .await?;
    if let Some(other) = hit {
      return Err(Error::Conflict { employee_id, shift_id: other.shift_id });
    }

    let input = NewAssignment::new(tenant_id, shift_id, employee_id, AssignmentStatus::Pending);
    let assignment = match self.store.add_assignment(input).await {
      Ok(a) => a,
      Err(e) if e.is_constraint_violation() => {
        return Err(Error::AlreadyAssigned { employee_id, shift_id });
      }
      Err(e) => return Err(Error::store(e)),
    };
    self.emit(tenant_id, EntityKind::Assignment, assignment.assignment_id, ChangeOp::Created);
    Ok(assignment)
  }

  /// Accept or reject an assignment. Accepting re-checks for overlaps,
  /// since other bookings may have landed since it was offered.
  pub async fn respond_to_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
    accept: bool,
  ) -> Result<Assignment> {
    let mut assignment = self.load_assignment(tenant_id, assignment_id).await?;
    let status = if accept { AssignmentStatus::Accepted } else { AssignmentStatus::Rejected };

    if accept {
      let shift = self.load_shift(tenant_id, assignment.shift_id).await?;
      let hit = has_conflict(
        self.store(),
        tenant_id,
        assignment.employee_id,
        shift.date,
        shift.range(),
        Some(shift.shift_id),
      )
      .await?;
      if let Some(other) = hit {
        return Err(Error::Conflict {
          employee_id: assignment.employee_id,
          shift_id:    other.shift_id,
        });
      }
    }

    if !self
      .store
      .set_assignment_status(tenant_id, assignment_id, status)
      .await
      .map_err(Error::store)?
    {
      return Err(Error::AssignmentNotFound(assignment_id));
    }
    assignment.status = status;
    self.emit(tenant_id, EntityKind::Assignment, assignment_id, ChangeOp::Updated);
    Ok(assignment)
  }

  /// Delete an assignment and tell only that employee.
  pub async fn remove_assignment(&self, tenant_id: Uuid, assignment_id: Uuid) -> Result<Assignment> {
    let removed = self
      .store
      .delete_assignment(tenant_id, assignment_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AssignmentNotFound(assignment_id))?;
    self.emit(tenant_id, EntityKind::Assignment, assignment_id, ChangeOp::Deleted);

    if let Some(shift) = self
      .store
      .get_shift(tenant_id, removed.shift_id)
      .await
      .map_err(Error::store)?
    {
      self.dispatch(vec![plan_assignment_removed(&shift, removed.employee_id)]).await;
    }
    Ok(removed)
  }
}

#[cfg(test)]
mod tests {
  use shiftwork_core::{
    events::ChangeEvent,
    notification::{NotificationType, RecipientType},
    people::NewEmployee,
  };

  use super::*;
  use crate::testing::engine;

  // Far enough ahead that `PastDate` never fires.
  fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2099, 3, 4).unwrap() }

  fn hm(h: u32) -> Option<NaiveTime> { NaiveTime::from_hms_opt(h, 0, 0) }

  fn draft(tenant: Uuid, start: u32, end: u32) -> NewShift {
    NewShift::new(tenant, "Morning", day()).with_times(hm(start), hm(end))
  }

  async fn hire<S: ScheduleStore>(engine: &Engine<S>, tenant: Uuid, first: &str) -> Employee {
    engine.store().add_employee(tenant, NewEmployee::new(first, "Lopez")).await.unwrap()
  }

  fn done<T>(outcome: EditOutcome<T>) -> T {
    match outcome {
      EditOutcome::Done(v) => v,
      EditOutcome::NeedsConfirmation(w) => panic!("unexpected warnings: {w:?}"),
    }
  }

  #[tokio::test]
  async fn warnings_require_confirmation() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();

    let outcome = engine.create_shift(tenant, draft(tenant, 17, 8), vec![], false).await.unwrap();
    assert_eq!(
      outcome,
      EditOutcome::NeedsConfirmation(vec![ShiftWarning::NoAssignments, ShiftWarning::InvertedRange])
    );
    let span = shiftwork_core::time::DateSpan::day(day());
    assert!(engine.store().list_shifts(tenant, span).await.unwrap().is_empty());

    let detail = done(engine.create_shift(tenant, draft(tenant, 17, 8), vec![], true).await.unwrap());
    assert!(detail.assignments.is_empty());
    assert_eq!(engine.store().list_shifts(tenant, span).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn past_date_and_capacity_warnings() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let (ana, juan) = (hire(&engine, tenant, "Ana").await, hire(&engine, tenant, "Juan").await);

    let mut past = draft(tenant, 8, 12);
    past.date = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
    let outcome = engine
      .create_shift(tenant, past, vec![ana.employee_id, juan.employee_id], false)
      .await
      .unwrap();
    assert_eq!(
      outcome,
      EditOutcome::NeedsConfirmation(vec![
        ShiftWarning::OverCapacity { assigned: 2, slots: 1 },
        ShiftWarning::PastDate,
      ])
    );
  }

  #[tokio::test]
  async fn confirmed_conflicts_are_still_written() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let ana = hire(&engine, tenant, "Ana").await;
    let first = engine
      .create_shift(tenant, draft(tenant, 8, 12), vec![ana.employee_id], false)
      .await
      .map(done)
      .unwrap();

    let outcome = engine
      .create_shift(tenant, draft(tenant, 11, 15), vec![ana.employee_id], false)
      .await
      .unwrap();
    let conflict = ShiftWarning::Conflict {
      employee_id: ana.employee_id,
      shift_id:    first.shift.shift_id,
    };
    assert_eq!(outcome, EditOutcome::NeedsConfirmation(vec![conflict]));

    let second = engine
      .create_shift(tenant, draft(tenant, 11, 15), vec![ana.employee_id], true)
      .await
      .map(done)
      .unwrap();
    assert_eq!(second.assignments.len(), 1);
    assert_eq!(second.assignments[0].status, AssignmentStatus::Pending);
  }

  #[tokio::test]
  async fn broadcast_edit_notifies_assignees() {
    let (engine, sink) = engine().await;
    let tenant = Uuid::new_v4();
    let ana = hire(&engine, tenant, "Ana").await;
    let shift = engine
      .create_shift(tenant, draft(tenant, 8, 12), vec![ana.employee_id], false)
      .await
      .map(done)
      .unwrap()
      .shift;

    let patch = ShiftPatch { start_time: Some(hm(9)), ..Default::default() };
    let detail = done(engine.update_shift(tenant, shift.shift_id, patch, false).await.unwrap());
    assert_eq!(detail.shift.start_time, hm(9));

    let notes = engine.store().list_notifications(tenant, ana.employee_id).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationType::ShiftChanged);
    assert!(notes[0].body.contains("start_time: 08:00 → 09:00"));

    let patch = ShiftPatch { notes: Some(Some("gate B".into())), ..Default::default() };
    done(engine.update_shift(tenant, shift.shift_id, patch, false).await.unwrap());
    let notes = engine.store().list_notifications(tenant, ana.employee_id).await.unwrap();
    assert_eq!(notes[0].kind, NotificationType::ShiftUpdated);

    let events = sink.0.lock().unwrap();
    let shift_updates = events
      .iter()
      .filter(|e: &&ChangeEvent| e.entity == EntityKind::Shift && e.op == ChangeOp::Updated)
      .count();
    assert_eq!(shift_updates, 2);
  }

  #[tokio::test]
  async fn update_missing_shift_fails() {
    let (engine, _) = engine().await;
    let err = engine
      .update_shift(Uuid::new_v4(), Uuid::new_v4(), ShiftPatch::default(), true)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::ShiftNotFound(_)));
  }

  #[tokio::test]
  async fn publish_notifies_and_opens_claims() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let (ana, juan) = (hire(&engine, tenant, "Ana").await, hire(&engine, tenant, "Juan").await);

    let mut d = draft(tenant, 8, 12);
    d.claimable = true;
    d.slots = 2;
    let shift = done(engine.create_shift(tenant, d, vec![ana.employee_id], false).await.unwrap()).shift;
    // Drafts are invisible: nobody hears about them yet.
    assert!(engine.store().list_notifications(tenant, juan.employee_id).await.unwrap().is_empty());

    let published = engine.publish_shift(tenant, shift.shift_id).await.unwrap();
    assert_eq!(published.status, ShiftStatus::Published);

    let ana_notes = engine.store().list_notifications(tenant, ana.employee_id).await.unwrap();
    assert_eq!(ana_notes[0].kind, NotificationType::ShiftPublished);
    let juan_notes = engine.store().list_notifications(tenant, juan.employee_id).await.unwrap();
    assert_eq!(juan_notes.len(), 1);
    assert_eq!(juan_notes[0].kind, NotificationType::OpenShiftAvailable);

    // Claim, then the shift is full.
    let claim = engine.claim_shift(tenant, shift.shift_id, juan.employee_id).await.unwrap();
    assert_eq!(claim.status, AssignmentStatus::Pending);
    let company = engine.store().list_notifications(tenant, tenant).await.unwrap();
    assert_eq!(company[0].kind, NotificationType::ShiftClaimRequested);
    assert_eq!(company[0].recipient_type, RecipientType::Company);

    let eve = hire(&engine, tenant, "Eve").await;
    let err = engine.claim_shift(tenant, shift.shift_id, eve.employee_id).await.unwrap_err();
    assert!(matches!(err, Error::ShiftFull(_)));
    let err = engine.claim_shift(tenant, shift.shift_id, juan.employee_id).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyAssigned { .. }));
  }

  #[tokio::test]
  async fn claims_need_an_open_shift() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let ana = hire(&engine, tenant, "Ana").await;
    let shift = engine.store().add_shift(draft(tenant, 8, 12)).await.unwrap();
    let err = engine.claim_shift(tenant, shift.shift_id, ana.employee_id).await.unwrap_err();
    assert!(matches!(err, Error::NotClaimable(_)));
  }

  #[tokio::test]
  async fn assignment_is_hard_blocked_by_overlap() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let ana = hire(&engine, tenant, "Ana").await;
    let morning = engine.store().add_shift(draft(tenant, 8, 12)).await.unwrap();
    let midday = engine.store().add_shift(draft(tenant, 11, 15)).await.unwrap();
    let afternoon = engine.store().add_shift(draft(tenant, 12, 16)).await.unwrap();

    engine.assign_employee(tenant, morning.shift_id, ana.employee_id).await.unwrap();
    let err = engine.assign_employee(tenant, midday.shift_id, ana.employee_id).await.unwrap_err();
    assert!(
      matches!(err, Error::Conflict { shift_id, .. } if shift_id == morning.shift_id)
    );
    engine.assign_employee(tenant, afternoon.shift_id, ana.employee_id).await.unwrap();

    let err = engine.assign_employee(tenant, morning.shift_id, ana.employee_id).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyAssigned { .. }));
    let err = engine.assign_employee(tenant, morning.shift_id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::EmployeeNotFound(_)));
  }

  #[tokio::test]
  async fn accept_rechecks_conflicts_and_reject_frees_time() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let ana = hire(&engine, tenant, "Ana").await;
    let store = engine.store();
    let morning = store.add_shift(draft(tenant, 8, 12)).await.unwrap();
    let midday = store.add_shift(draft(tenant, 11, 15)).await.unwrap();

    // Two overlapping offers, as a confirmed advisory create would leave.
    let offer = |shift_id| {
      NewAssignment::new(tenant, shift_id, ana.employee_id, AssignmentStatus::Pending)
    };
    let first = store.add_assignment(offer(morning.shift_id)).await.unwrap();
    let second = store.add_assignment(offer(midday.shift_id)).await.unwrap();

    let err = engine.respond_to_assignment(tenant, second.assignment_id, true).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));

    let rejected = engine.respond_to_assignment(tenant, first.assignment_id, false).await.unwrap();
    assert_eq!(rejected.status, AssignmentStatus::Rejected);
    let accepted = engine.respond_to_assignment(tenant, second.assignment_id, true).await.unwrap();
    assert_eq!(accepted.status, AssignmentStatus::Accepted);
  }

  #[tokio::test]
  async fn removal_notifies_only_that_employee() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let (ana, juan) = (hire(&engine, tenant, "Ana").await, hire(&engine, tenant, "Juan").await);
    let mut d = draft(tenant, 8, 12);
    d.slots = 2;
    let detail = engine
      .create_shift(tenant, d, vec![ana.employee_id, juan.employee_id], false)
      .await
      .map(done)
      .unwrap();

    let target = detail.assignments.iter().find(|a| a.employee_id == ana.employee_id).unwrap();
    let removed = engine.remove_assignment(tenant, target.assignment_id).await.unwrap();
    assert_eq!(removed.employee_id, ana.employee_id);

    let ana_notes = engine.store().list_notifications(tenant, ana.employee_id).await.unwrap();
    assert_eq!(ana_notes.len(), 1);
    assert_eq!(ana_notes[0].kind, NotificationType::AssignmentRemoved);
    assert!(engine.store().list_notifications(tenant, juan.employee_id).await.unwrap().is_empty());

    let err = engine.remove_assignment(tenant, target.assignment_id).await.unwrap_err();
    assert!(matches!(err, Error::AssignmentNotFound(_)));
  }

  #[tokio::test]
  async fn assignees_must_belong_to_the_tenant() {
    let (engine, sink) = engine().await;
    let (tenant, other) = (Uuid::new_v4(), Uuid::new_v4());
    let outsider = hire(&engine, other, "Ana").await;

    for stranger in [outsider.employee_id, Uuid::new_v4()] {
      for confirm in [false, true] {
        let err = engine
          .create_shift(tenant, draft(tenant, 8, 12), vec![stranger], confirm)
          .await
          .unwrap_err();
        assert!(matches!(err, Error::EmployeeNotFound(id) if id == stranger));
      }
    }

    let span = shiftwork_core::time::DateSpan::day(day());
    assert!(engine.store().list_shifts(tenant, span).await.unwrap().is_empty());
    let booked = engine.store().list_employee_shifts(other, outsider.employee_id, day()).await;
    assert!(booked.unwrap().is_empty());
    assert!(sink.0.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn shifts_are_invisible_to_other_tenants() {
    let (engine, _) = engine().await;
    let (tenant, other) = (Uuid::new_v4(), Uuid::new_v4());
    let ana = hire(&engine, tenant, "Ana").await;
    let intruder = hire(&engine, other, "Juan").await;
    let shift = engine.store().add_shift(draft(tenant, 8, 12)).await.unwrap();

    let err = engine.shift_detail(other, shift.shift_id).await.unwrap_err();
    assert!(matches!(err, Error::ShiftNotFound(_)));
    let err = engine
      .update_shift(other, shift.shift_id, ShiftPatch { slots: Some(4), ..Default::default() }, true)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::ShiftNotFound(_)));
    let err = engine.publish_shift(other, shift.shift_id).await.unwrap_err();
    assert!(matches!(err, Error::ShiftNotFound(_)));
    let err = engine
      .assign_employee(other, shift.shift_id, intruder.employee_id)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::ShiftNotFound(_)));
    // The shift's own tenant cannot book a foreign employee either.
    let err = engine
      .assign_employee(tenant, shift.shift_id, intruder.employee_id)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::EmployeeNotFound(_)));

    let booked = engine.assign_employee(tenant, shift.shift_id, ana.employee_id).await.unwrap();
    let err = engine.respond_to_assignment(other, booked.assignment_id, true).await.unwrap_err();
    assert!(matches!(err, Error::AssignmentNotFound(_)));
    let err = engine.remove_assignment(other, booked.assignment_id).await.unwrap_err();
    assert!(matches!(err, Error::AssignmentNotFound(_)));

    let unchanged = engine.store().get_shift(tenant, shift.shift_id).await.unwrap().unwrap();
    assert_eq!(unchanged.slots, shift.slots);
    assert_eq!(unchanged.status, shift.status);
  }

  #[test]
  fn patch_distinguishes_null_from_absent() {
    let patch: ShiftPatch = serde_json::from_str(r#"{"notes": null, "slots": 3}"#).unwrap();
    assert_eq!(patch.notes, Some(None));
    assert_eq!(patch.start_time, None);
    assert_eq!(patch.slots, Some(3));
  }
}

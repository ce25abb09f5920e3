//! Notification planning and dispatch.
//!
//! The `plan_*` functions are pure: given a shift mutation and its audience
//! they return the notifications to record. [`Engine`] resolves audiences
//! and writes the plans through the store.

use serde_json::json;
use shiftwork_core::{
  events::{ChangeOp, EntityKind},
  notification::{NewNotification, NotificationType, RecipientType},
  people::Employee,
  shift::{FieldChange, Shift},
  store::ScheduleStore,
};
use tracing::warn;
use uuid::Uuid;

use crate::{Engine, Error, Result};

fn label(shift: &Shift) -> String { format!("{} on {}", shift.title, shift.date) }

fn to_employee(
  shift: &Shift,
  recipient_id: Uuid,
  kind: NotificationType,
  title: String,
  body: String,
  metadata: serde_json::Value,
) -> NewNotification {
  NewNotification {
    tenant_id: shift.tenant_id,
    recipient_id,
    recipient_type: RecipientType::Employee,
    kind,
    title,
    body,
    metadata,
  }
}

/// One `field: before → after` line per change.
pub fn describe_changes(changes: &[FieldChange]) -> String {
  changes
    .iter()
    .map(|c| {
      format!(
        "{}: {} → {}",
        c.field,
        c.before.as_deref().unwrap_or("(none)"),
        c.after.as_deref().unwrap_or("(none)"),
      )
    })
    .collect::<Vec<_>>()
    .join("\n")
}

/// Tell every assignee about an edit. A change to any broadcast field is a
/// `shift_changed`; anything else is a `shift_updated`. No changes, no
/// notifications.
pub fn plan_shift_edit(
  shift: &Shift,
  changes: &[FieldChange],
  assignees: &[Uuid],
) -> Vec<NewNotification> {
  if changes.is_empty() {
    return Vec::new();
  }
  let (kind, title) = if changes.iter().any(|c| c.field.is_broadcast()) {
    (NotificationType::ShiftChanged, format!("Shift changed: {}", label(shift)))
  } else {
    (NotificationType::ShiftUpdated, format!("Shift updated: {}", label(shift)))
  };
  let body = describe_changes(changes);
  let metadata = json!({ "shiftId": shift.shift_id, "changes": changes });

  assignees
    .iter()
    .map(|&id| to_employee(shift, id, kind, title.clone(), body.clone(), metadata.clone()))
    .collect()
}

/// Offer a newly claimable shift to every active employee who is not
/// already on it.
pub fn plan_open_shift(
  shift: &Shift,
  employees: &[Employee],
  assignees: &[Uuid],
) -> Vec<NewNotification> {
  let title = format!("Open shift: {}", label(shift));
  let body = format!("{} slot(s) available. Claim it from the shift board.", shift.slots);
  employees
    .iter()
    .filter(|e| e.active && !assignees.contains(&e.employee_id))
    .map(|e| {
      to_employee(
        shift,
        e.employee_id,
        NotificationType::OpenShiftAvailable,
        title.clone(),
        body.clone(),
        json!({ "shiftId": shift.shift_id }),
      )
    })
    .collect()
}

pub fn plan_published(shift: &Shift, assignees: &[Uuid]) -> Vec<NewNotification> {
  let title = format!("Shift published: {}", label(shift));
  assignees
    .iter()
    .map(|&id| {
      to_employee(
        shift,
        id,
        NotificationType::ShiftPublished,
        title.clone(),
        "You are scheduled for this shift.".into(),
        json!({ "shiftId": shift.shift_id }),
      )
    })
    .collect()
}

pub fn plan_assignment_removed(shift: &Shift, employee_id: Uuid) -> NewNotification {
  to_employee(
    shift,
    employee_id,
    NotificationType::AssignmentRemoved,
    format!("Removed from shift: {}", label(shift)),
    "You are no longer scheduled for this shift.".into(),
    json!({ "shiftId": shift.shift_id }),
  )
}

/// Addressed to the company, not to a person.
pub fn plan_claim_requested(shift: &Shift, employee: &Employee) -> NewNotification {
  NewNotification {
    tenant_id:      shift.tenant_id,
    recipient_id:   shift.tenant_id,
    recipient_type: RecipientType::Company,
    kind:           NotificationType::ShiftClaimRequested,
    title:          format!("Claim request: {}", label(shift)),
    body:           format!("{} asked to work this shift.", employee.full_name()),
    metadata:       json!({ "shiftId": shift.shift_id, "employeeId": employee.employee_id }),
  }
}

impl<S: ScheduleStore> Engine<S> {
  /// Employees holding a pending or accepted assignment on the shift.
  pub(crate) async fn assignees(&self, tenant_id: Uuid, shift_id: Uuid) -> Result<Vec<Uuid>> {
    let assignments = self
      .store
      .list_shift_assignments(tenant_id, shift_id)
      .await
      .map_err(Error::store)?;
    Ok(
      assignments
        .into_iter()
        .filter(|a| a.status.is_active())
        .map(|a| a.employee_id)
        .collect(),
    )
  }

  /// Offer the shift to everyone else.
  pub(crate) async fn announce_open_shift(&self, shift: &Shift) -> Result<usize> {
    let employees = self
      .store
      .list_employees(shift.tenant_id, true)
      .await
      .map_err(Error::store)?;
    let assignees = self.assignees(shift.tenant_id, shift.shift_id).await?;
    Ok(self.dispatch(plan_open_shift(shift, &employees, &assignees)).await)
  }

  /// Record planned notifications. A failed write is logged and skipped;
  /// returns how many were recorded.
  pub(crate) async fn dispatch(&self, planned: Vec<NewNotification>) -> usize {
    let mut recorded = 0;
    for note in planned {
      let kind = note.kind;
      match self.store.add_notification(note).await {
        Ok(n) => {
          recorded += 1;
          self.emit(n.tenant_id, EntityKind::Notification, n.notification_id, ChangeOp::Created);
        }
        Err(e) => warn!(%kind, error = %e, "notification write failed"),
      }
    }
    recorded
  }
}

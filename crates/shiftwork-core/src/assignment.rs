//! Assignments link one employee to one shift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::shift::Shift;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus {
  #[default]
  Pending,
  Accepted,
  Rejected,
}

impl AssignmentStatus {
  /// Pending and accepted assignments occupy the employee's time and count
  /// towards planned coverage; rejected ones do neither.
  pub fn is_active(self) -> bool { !matches!(self, Self::Rejected) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub assignment_id: Uuid,
  pub tenant_id:     Uuid,
  pub shift_id:      Uuid,
  pub employee_id:   Uuid,
  pub status:        AssignmentStatus,
  pub import_tag:    Option<String>,
  pub created_at:    DateTime<Utc>,
}

/// Input for [`ScheduleStore::add_assignment`](crate::store::ScheduleStore::add_assignment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
  pub tenant_id:   Uuid,
  pub shift_id:    Uuid,
  pub employee_id: Uuid,
  pub status:      AssignmentStatus,
  pub import_tag:  Option<String>,
}

impl NewAssignment {
  pub fn new(tenant_id: Uuid, shift_id: Uuid, employee_id: Uuid, status: AssignmentStatus) -> Self {
    Self { tenant_id, shift_id, employee_id, status, import_tag: None }
  }
}

/// An assignment joined with the shift it points to; what the conflict
/// detector scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedShift {
  pub assignment: Assignment,
  pub shift:      Shift,
}

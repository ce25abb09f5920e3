//! Discrepancy tickets flag a mismatch between planned and actual
//! attendance. They are generated by coverage reconciliation only; what
//! happens to them afterwards is the ticketing workflow's business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketKind {
  /// Assigned to the shift but never clocked against it.
  MissingAttendance,
  /// Clocked against the shift without being assigned to it.
  UnassignedAttendance,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketStatus {
  #[default]
  New,
  InProgress,
  Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscrepancyTicket {
  pub ticket_id:   Uuid,
  pub tenant_id:   Uuid,
  pub shift_id:    Uuid,
  pub employee_id: Uuid,
  pub kind:        TicketKind,
  pub description: String,
  pub status:      TicketStatus,
  pub created_at:  DateTime<Utc>,
}

/// Input for [`ScheduleStore::add_ticket`](crate::store::ScheduleStore::add_ticket).
/// Tickets always start as [`TicketStatus::New`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
  pub tenant_id:   Uuid,
  pub shift_id:    Uuid,
  pub employee_id: Uuid,
  pub kind:        TicketKind,
  pub description: String,
}

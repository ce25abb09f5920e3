//! The `ScheduleStore` trait — the Entity Store abstraction.
//!
//! The trait is implemented by storage backends (e.g.
//! `shiftwork-store-sqlite`). The engine, the import pipelines and the API
//! depend on this abstraction, not on any concrete backend.
//!
//! Every method takes the tenant id explicitly. Rows belonging to another
//! tenant are never returned, updated or deleted.

use std::future::Future;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  StoreError,
  assignment::{AssignedShift, Assignment, AssignmentStatus, NewAssignment},
  attendance::{NewTimeEntry, TimeEntry},
  notification::{NewNotification, Notification},
  people::{Client, Employee, Location, NewEmployee},
  shift::{NewShift, Shift},
  ticket::{DiscrepancyTicket, NewTicket},
  time::DateSpan,
};

/// Row counts removed by [`ScheduleStore::purge_import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
  pub shifts:       usize,
  pub assignments:  usize,
  pub time_entries: usize,
}

impl PurgeReport {
  pub fn total(&self) -> usize { self.shifts + self.assignments + self.time_entries }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a schedule store backend.
///
/// Uniqueness rules are enforced at write time and reported through
/// [`StoreError::is_constraint_violation`]:
///
/// - one employee per case-insensitive full name, per tenant;
/// - one live (not soft-deleted) client, and one live location, per
///   case-insensitive name, per tenant;
/// - one assignment per (shift, employee);
/// - one open time entry per employee, and one entry per (employee,
///   clock-in);
/// - one discrepancy ticket per (shift, employee, kind) — duplicates are
///   silently ignored rather than reported.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ScheduleStore: Send + Sync {
  type Error: StoreError;

  // ── Employees ─────────────────────────────────────────────────────────

  fn add_employee(
    &self,
    tenant_id: Uuid,
    input: NewEmployee,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  /// List employees ordered by name, optionally only active ones.
  fn list_employees(
    &self,
    tenant_id: Uuid,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;

  /// Soft-(de)activate an employee. Returns `false` if not found.
  fn set_employee_active(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Clients & locations ───────────────────────────────────────────────

  fn add_client(
    &self,
    tenant_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  /// List clients that are not soft-deleted, ordered by name.
  fn list_clients(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Client>, Self::Error>> + Send + '_;

  /// Soft-delete a client. Returns `false` if not found.
  fn delete_client(
    &self,
    tenant_id: Uuid,
    client_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn add_location(
    &self,
    tenant_id: Uuid,
    name: String,
    address: Option<String>,
  ) -> impl Future<Output = Result<Location, Self::Error>> + Send + '_;

  /// List locations that are not soft-deleted, ordered by name.
  fn list_locations(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + '_;

  /// Soft-delete a location. Returns `false` if not found.
  fn delete_location(
    &self,
    tenant_id: Uuid,
    location_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Shifts ────────────────────────────────────────────────────────────

  fn add_shift(
    &self,
    input: NewShift,
  ) -> impl Future<Output = Result<Shift, Self::Error>> + Send + '_;

  fn get_shift(
    &self,
    tenant_id: Uuid,
    shift_id: Uuid,
  ) -> impl Future<Output = Result<Option<Shift>, Self::Error>> + Send + '_;

  /// Full-row, last-write-wins update. Returns `false` if not found.
  fn update_shift(
    &self,
    shift: Shift,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Shifts dated within `span`, ordered by date then start time.
  fn list_shifts(
    &self,
    tenant_id: Uuid,
    span: DateSpan,
  ) -> impl Future<Output = Result<Vec<Shift>, Self::Error>> + Send + '_;

  /// Every shift carrying external code `code` on `date`, ordered by
  /// start time then creation.
  fn find_shifts_by_code(
    &self,
    tenant_id: Uuid,
    code: String,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Shift>, Self::Error>> + Send + '_;

  // ── Assignments ───────────────────────────────────────────────────────

  fn add_assignment(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  fn get_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Assignment>, Self::Error>> + Send + '_;

  /// Returns `false` if not found.
  fn set_assignment_status(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
    status: AssignmentStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Hard-delete an assignment and return it, or `None` if not found.
  fn delete_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Assignment>, Self::Error>> + Send + '_;

  fn list_shift_assignments(
    &self,
    tenant_id: Uuid,
    shift_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  /// Every assignment of `employee_id` on a shift dated `date`, joined with
  /// its shift, ordered by start time.
  fn list_employee_shifts(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<AssignedShift>, Self::Error>> + Send + '_;

  /// Every assignment on a shift dated within `span`.
  fn list_assignments(
    &self,
    tenant_id: Uuid,
    span: DateSpan,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  // ── Time entries ──────────────────────────────────────────────────────

  fn add_time_entry(
    &self,
    input: NewTimeEntry,
  ) -> impl Future<Output = Result<TimeEntry, Self::Error>> + Send + '_;

  fn get_time_entry(
    &self,
    tenant_id: Uuid,
    entry_id: Uuid,
  ) -> impl Future<Output = Result<Option<TimeEntry>, Self::Error>> + Send + '_;

  /// Full-row update. Returns `false` if not found.
  fn update_time_entry(
    &self,
    entry: TimeEntry,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The employee's open entry (`clock_out` is null), if any.
  fn open_time_entry(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Option<TimeEntry>, Self::Error>> + Send + '_;

  /// The employee's entries that intersect `[from, to)`, open entries
  /// included.
  fn list_employee_entries(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    from: NaiveDateTime,
    to: NaiveDateTime,
  ) -> impl Future<Output = Result<Vec<TimeEntry>, Self::Error>> + Send + '_;

  /// Entries that reference a shift dated within `span`.
  fn list_shift_entries(
    &self,
    tenant_id: Uuid,
    span: DateSpan,
  ) -> impl Future<Output = Result<Vec<TimeEntry>, Self::Error>> + Send + '_;

  // ── Tickets ───────────────────────────────────────────────────────────

  /// Insert a ticket unless one already exists for the same (shift,
  /// employee, kind). Returns `None` for such a duplicate.
  fn add_ticket(
    &self,
    input: NewTicket,
  ) -> impl Future<Output = Result<Option<DiscrepancyTicket>, Self::Error>> + Send + '_;

  /// Tickets, optionally restricted to shifts dated within `span`.
  fn list_tickets(
    &self,
    tenant_id: Uuid,
    span: Option<DateSpan>,
  ) -> impl Future<Output = Result<Vec<DiscrepancyTicket>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn add_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Notifications for one recipient, newest first.
  fn list_notifications(
    &self,
    tenant_id: Uuid,
    recipient_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  // ── Imports ───────────────────────────────────────────────────────────

  /// Shifts stamped with `tag`, ordered by date then start time.
  fn list_import_shifts(
    &self,
    tenant_id: Uuid,
    tag: String,
  ) -> impl Future<Output = Result<Vec<Shift>, Self::Error>> + Send + '_;

  /// Delete every assignment and time entry stamped with `tag`, and every
  /// shift stamped with `tag` except those in `keep_shifts`.
  ///
  /// Kept shifts retain their untagged assignments, tickets and linked
  /// time entries. Deleting a shift also removes its assignments and
  /// tickets; time entries that referenced it lose their shift reference.
  /// Runs in one transaction.
  fn purge_import(
    &self,
    tenant_id: Uuid,
    tag: String,
    keep_shifts: Vec<Uuid>,
  ) -> impl Future<Output = Result<PurgeReport, Self::Error>> + Send + '_;
}

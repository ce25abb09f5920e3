//! Error type for `shiftwork-engine`.

use shiftwork_core::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("import failed: {0}")]
  Import(#[from] shiftwork_import::Error),

  #[error(transparent)]
  Core(#[from] shiftwork_core::Error),

  #[error("invalid provision denylist pattern: {0}")]
  Denylist(#[from] regex::Error),

  #[error("shift not found: {0}")]
  ShiftNotFound(Uuid),

  #[error("assignment not found: {0}")]
  AssignmentNotFound(Uuid),

  #[error("employee not found: {0}")]
  EmployeeNotFound(Uuid),

  #[error("time entry not found: {0}")]
  EntryNotFound(Uuid),

  /// A hard-blocked write: the employee is already booked on `shift_id`.
  #[error("employee {employee_id} is already booked on overlapping shift {shift_id}")]
  Conflict { employee_id: Uuid, shift_id: Uuid },

  /// The corrected session overlaps another recorded session.
  #[error("time entry overlaps entry {0}")]
  AttendanceOverlap(Uuid),

  #[error("employee {0} is already clocked in")]
  AlreadyClockedIn(Uuid),

  #[error("employee {0} is not clocked in")]
  NotClockedIn(Uuid),

  #[error("shift {0} is not open for claims")]
  NotClaimable(Uuid),

  #[error("shift {0} has no free slots")]
  ShiftFull(Uuid),

  #[error("employee {employee_id} is already assigned to shift {shift_id}")]
  AlreadyAssigned { employee_id: Uuid, shift_id: Uuid },

  #[error("time entry {0} is still open")]
  EntryStillOpen(Uuid),

  #[error("clock-out must come after clock-in")]
  InvertedSession,

  #[error("an employee named {0:?} already exists")]
  DuplicateEmployee(String),

  #[error("employee name is empty")]
  EmptyName,
}

impl Error {
  pub fn store<E: StoreError>(err: E) -> Self { Self::Store(Box::new(err)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

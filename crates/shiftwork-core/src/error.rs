//! Error types for `shiftwork-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("date span is inverted: {from} is after {to}")]
  InvertedSpan { from: NaiveDate, to: NaiveDate },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by every storage backend's error type.
///
/// The engine performs optimistic concurrency: uniqueness rules (one open
/// time entry per employee, one assignment per employee and shift, one
/// ticket per discrepancy) are enforced by the store at write time. A write
/// that loses such a race is reported as a skip, not as a failure, so the
/// engine needs to tell the two apart without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when the write was rejected by a uniqueness or integrity
  /// constraint rather than by an I/O or decoding failure.
  fn is_constraint_violation(&self) -> bool;
}

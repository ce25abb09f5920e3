//! File-level errors for the export readers.
//!
//! Anything wrong with a single row is not an error: the row is excluded and
//! reported as a [`RejectedRow`](crate::RejectedRow).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("input is {size} bytes, over the {limit}-byte limit")]
  TooLarge { size: usize, limit: usize },

  #[error("sheet has no data rows")]
  EmptySheet,

  #[error("sheet has more than {limit} data rows")]
  TooManyRows { limit: usize },

  #[error("missing required column {0:?}")]
  MissingColumn(String),

  #[error("unreadable sheet: {0}")]
  Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

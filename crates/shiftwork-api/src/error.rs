//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use shiftwork_engine::Error as EngineError;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<EngineError> for ApiError {
  fn from(e: EngineError) -> Self {
    let message = e.to_string();
    match e {
      EngineError::ShiftNotFound(_)
      | EngineError::AssignmentNotFound(_)
      | EngineError::EmployeeNotFound(_)
      | EngineError::EntryNotFound(_) => Self::NotFound(message),

      EngineError::Core(_) | EngineError::EmptyName => Self::BadRequest(message),

      EngineError::Conflict { .. }
      | EngineError::AttendanceOverlap(_)
      | EngineError::AlreadyClockedIn(_)
      | EngineError::NotClockedIn(_)
      | EngineError::NotClaimable(_)
      | EngineError::ShiftFull(_)
      | EngineError::AlreadyAssigned { .. }
      | EngineError::EntryStillOpen(_)
      | EngineError::DuplicateEmployee(_) => Self::Conflict(message),

      EngineError::Import(_) | EngineError::InvertedSession => Self::Unprocessable(message),

      other @ (EngineError::Store(_) | EngineError::Denylist(_)) => Self::Internal(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Internal(e) => {
        error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

//! Handlers for `/imports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/imports/schedule`  | `?from&to[&auto_create][&preview]`, body is the CSV export |
//! | `POST` | `/imports/timeclock` | Same parameters |
//!
//! Re-posting the same file for the same span replaces the earlier run.
//! File-level problems (missing header, size limits) answer 422.

use std::sync::Arc;

use axum::{
  Json,
  body::Bytes,
  extract::{Path, Query, State},
  response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shiftwork_core::{store::ScheduleStore, time::DateSpan};
use shiftwork_engine::{Engine, pipeline::ImportOptions};
use uuid::Uuid;

use crate::{SpanParams, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ImportParams {
  pub from:        NaiveDate,
  pub to:          NaiveDate,
  #[serde(default)]
  pub auto_create: bool,
  /// Resolve and count without writing anything.
  #[serde(default)]
  pub preview:     bool,
}

impl ImportParams {
  fn span(&self) -> Result<DateSpan, ApiError> {
    SpanParams { from: self.from, to: self.to }.span()
  }

  fn options(&self) -> ImportOptions { ImportOptions { auto_create: self.auto_create } }
}

/// `POST /imports/schedule`
pub async fn schedule<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<ImportParams>,
  body: Bytes,
) -> Result<Response, ApiError>
where
  S: ScheduleStore + 'static,
{
  let span = params.span()?;
  if params.preview {
    let preview = engine.preview_schedule(tenant_id, span, &body).await?;
    return Ok(Json(preview).into_response());
  }
  let summary = engine
    .import_schedule(tenant_id, span, &body, params.options())
    .await?;
  Ok(Json(summary).into_response())
}

/// `POST /imports/timeclock`
pub async fn timeclock<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<ImportParams>,
  body: Bytes,
) -> Result<Response, ApiError>
where
  S: ScheduleStore + 'static,
{
  let span = params.span()?;
  if params.preview {
    let preview = engine.preview_timeclock(tenant_id, span, &body).await?;
    return Ok(Json(preview).into_response());
  }
  let summary = engine
    .import_timeclock(tenant_id, span, &body, params.options())
    .await?;
  Ok(Json(summary).into_response())
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use crate::testing::{engine, read, send};

  const SCHEDULE: &str = concat!(
    "Date,Start,End,Shift title,Job,Sub item,Address,Users,Availability status,Shift tags,Note,Last Status\n",
    "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
    "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Juan Perez,,,,\n",
  );

  #[tokio::test]
  async fn schedule_import_then_replay() {
    let engine = engine().await;
    let tenant = uuid::Uuid::new_v4();
    let uri = format!(
      "/tenants/{tenant}/imports/schedule?from=2026-02-16&to=2026-02-22&auto_create=true"
    );

    let (status, body) = read(send(&engine, "POST", &uri, "text/csv", SCHEDULE).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["createdShifts"], 1);
    assert_eq!(body["createdAssignments"], 2);
    assert_eq!(body["createdEmployees"], 2);
    assert_eq!(body["tag"], "schedule:2026-02-16..2026-02-22");

    let (_, again) = read(send(&engine, "POST", &uri, "text/csv", SCHEDULE).await).await;
    assert_eq!(again["createdShifts"], 0);
    assert_eq!(again["reusedShifts"], 1);
    assert_eq!(again["replacedRows"], 2);
  }

  #[tokio::test]
  async fn preview_counts_without_writing() {
    let engine = engine().await;
    let tenant = uuid::Uuid::new_v4();
    let uri =
      format!("/tenants/{tenant}/imports/schedule?from=2026-02-16&to=2026-02-22&preview=true");

    let (status, body) = read(send(&engine, "POST", &uri, "text/csv", SCHEDULE).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["candidates"], 1);
    assert_eq!(body["links"], 2);
    assert_eq!(body["unmatchedEmployees"].as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn bad_span_and_bad_file() {
    let engine = engine().await;
    let tenant = uuid::Uuid::new_v4();

    let inverted = format!("/tenants/{tenant}/imports/schedule?from=2026-02-22&to=2026-02-16");
    let resp = send(&engine, "POST", &inverted, "text/csv", SCHEDULE).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/tenants/{tenant}/imports/timeclock?from=2026-02-16&to=2026-02-22");
    let resp = send(&engine, "POST", &uri, "text/csv", "Nothing,Useful\n1,2\n").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }
}

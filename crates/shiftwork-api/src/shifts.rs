//! Handlers for shift and assignment endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/shifts` | `?from&to` |
//! | `POST`   | `/shifts` | `?confirm`; 200 with warnings, or 201 when written |
//! | `GET`    | `/shifts/:id` | Shift plus its assignments |
//! | `PATCH`  | `/shifts/:id` | `?confirm`; `null` clears a nullable field |
//! | `POST`   | `/shifts/:id/publish` | Idempotent |
//! | `POST`   | `/shifts/:id/claim` | Body: `{"employeeId":"…"}` |
//! | `POST`   | `/shifts/:id/assignments` | Body: `{"employeeId":"…"}` |
//! | `DELETE` | `/assignments/:id` | |
//! | `POST`   | `/assignments/:id/respond` | Body: `{"accept":true}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use shiftwork_core::{
  assignment::Assignment,
  shift::{NewShift, Shift, ShiftStatus},
  store::ScheduleStore,
};
use shiftwork_engine::{
  Engine, Error,
  editor::{EditOutcome, ShiftDetail, ShiftPatch},
};
use uuid::Uuid;

use crate::{SpanParams, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmParams {
  #[serde(default)]
  pub confirm: bool,
}

fn outcome_status<T>(outcome: &EditOutcome<T>, written: StatusCode) -> StatusCode {
  match outcome {
    EditOutcome::NeedsConfirmation(_) => StatusCode::OK,
    EditOutcome::Done(_) => written,
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /shifts?from&to`
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<SpanParams>,
) -> Result<Json<Vec<Shift>>, ApiError>
where
  S: ScheduleStore + 'static,
{
  let shifts = engine
    .store()
    .list_shifts(tenant_id, params.span()?)
    .await
    .map_err(Error::store)?;
  Ok(Json(shifts))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub title:       String,
  pub date:        NaiveDate,
  #[serde(default)]
  pub start_time:  Option<NaiveTime>,
  #[serde(default)]
  pub end_time:    Option<NaiveTime>,
  #[serde(default)]
  pub client_id:   Option<Uuid>,
  #[serde(default)]
  pub location_id: Option<Uuid>,
  #[serde(default = "one")]
  pub slots:       u32,
  #[serde(default)]
  pub claimable:   bool,
  #[serde(default)]
  pub status:      ShiftStatus,
  #[serde(default)]
  pub shift_code:  Option<String>,
  #[serde(default)]
  pub notes:       Option<String>,
  #[serde(default)]
  pub assignees:   Vec<Uuid>,
}

fn one() -> u32 { 1 }

impl CreateBody {
  fn into_parts(self, tenant_id: Uuid) -> (NewShift, Vec<Uuid>) {
    let mut draft = NewShift::new(tenant_id, self.title, self.date);
    draft.start_time = self.start_time;
    draft.end_time = self.end_time;
    draft.client_id = self.client_id;
    draft.location_id = self.location_id;
    draft.slots = self.slots;
    draft.claimable = self.claimable;
    draft.status = self.status;
    draft.shift_code = self.shift_code;
    draft.notes = self.notes;
    (draft, self.assignees)
  }
}

/// `POST /shifts[?confirm=true]`
pub async fn create<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<ConfirmParams>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore + 'static,
{
  let (draft, assignees) = body.into_parts(tenant_id);
  let outcome = engine
    .create_shift(tenant_id, draft, assignees, params.confirm)
    .await?;
  Ok((outcome_status(&outcome, StatusCode::CREATED), Json(outcome)))
}

// ─── Get one / update ─────────────────────────────────────────────────────────

/// `GET /shifts/:id`
pub async fn get_one<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ShiftDetail>, ApiError>
where
  S: ScheduleStore + 'static,
{
  Ok(Json(engine.shift_detail(tenant_id, id).await?))
}

/// `PATCH /shifts/:id[?confirm=true]`
pub async fn update<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
  Query(params): Query<ConfirmParams>,
  Json(patch): Json<ShiftPatch>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore + 'static,
{
  let outcome = engine.update_shift(tenant_id, id, patch, params.confirm).await?;
  Ok((outcome_status(&outcome, StatusCode::OK), Json(outcome)))
}

/// `POST /shifts/:id/publish`
pub async fn publish<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Shift>, ApiError>
where
  S: ScheduleStore + 'static,
{
  Ok(Json(engine.publish_shift(tenant_id, id).await?))
}

// ─── Assignments ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBody {
  pub employee_id: Uuid,
}

/// `POST /shifts/:id/claim` — body: `{"employeeId":"…"}`
pub async fn claim<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
  Json(body): Json<EmployeeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore + 'static,
{
  let assignment = engine.claim_shift(tenant_id, id, body.employee_id).await?;
  Ok((StatusCode::CREATED, Json(assignment)))
}

/// `POST /shifts/:id/assignments` — body: `{"employeeId":"…"}`
pub async fn assign<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
  Json(body): Json<EmployeeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore + 'static,
{
  let assignment = engine.assign_employee(tenant_id, id, body.employee_id).await?;
  Ok((StatusCode::CREATED, Json(assignment)))
}

/// `DELETE /assignments/:id`
pub async fn remove_assignment<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Assignment>, ApiError>
where
  S: ScheduleStore + 'static,
{
  Ok(Json(engine.remove_assignment(tenant_id, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RespondBody {
  pub accept: bool,
}

/// `POST /assignments/:id/respond` — body: `{"accept":true}`
pub async fn respond<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
  Json(body): Json<RespondBody>,
) -> Result<Json<Assignment>, ApiError>
where
  S: ScheduleStore + 'static,
{
  Ok(Json(engine.respond_to_assignment(tenant_id, id, body.accept).await?))
}

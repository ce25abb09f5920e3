//! Handlers for employees, clock actions and time-entry administration.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/employees` | Optional `?active_only=true` |
//! | `POST` | `/employees` | Body: `{"firstName":"Ana","lastName":"Lopez"}` |
//! | `PUT`  | `/employees/:id/active` | Body: `{"active":false}` |
//! | `POST` | `/employees/:id/clock-in` | Body: `{"at":"…","shiftId":null}` |
//! | `POST` | `/employees/:id/clock-out` | Body: `{"at":"…","breakMinutes":30}` |
//! | `PUT`  | `/time-entries/:id` | Correction of a closed entry |
//! | `POST` | `/time-entries/:id/review` | Body: `{"status":"approved"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use shiftwork_core::{
  attendance::{EntryStatus, TimeEntry},
  people::{Employee, NewEmployee},
  store::ScheduleStore,
};
use shiftwork_engine::{Engine, Error, clock::TimeCorrection};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Employees ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub active_only: bool,
}

/// `GET /employees[?active_only=true]`
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Employee>>, ApiError>
where
  S: ScheduleStore + 'static,
{
  let employees = engine
    .store()
    .list_employees(tenant_id, params.active_only)
    .await
    .map_err(Error::store)?;
  Ok(Json(employees))
}

/// `POST /employees`
pub async fn create<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Json(body): Json<NewEmployee>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore + 'static,
{
  let employee = engine.add_employee(tenant_id, body).await?;
  Ok((StatusCode::CREATED, Json(employee)))
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub active: bool,
}

/// `PUT /employees/:id/active`
pub async fn set_active<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
  Json(body): Json<ActiveBody>,
) -> Result<StatusCode, ApiError>
where
  S: ScheduleStore + 'static,
{
  engine.set_employee_active(tenant_id, id, body.active).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Clock ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockInBody {
  pub at:       NaiveDateTime,
  #[serde(default)]
  pub shift_id: Option<Uuid>,
}

/// `POST /employees/:id/clock-in`
pub async fn clock_in<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
  Json(body): Json<ClockInBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore + 'static,
{
  let entry = engine.clock_in(tenant_id, id, body.at, body.shift_id).await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockOutBody {
  pub at:            NaiveDateTime,
  #[serde(default)]
  pub break_minutes: u32,
}

/// `POST /employees/:id/clock-out`
pub async fn clock_out<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
  Json(body): Json<ClockOutBody>,
) -> Result<Json<TimeEntry>, ApiError>
where
  S: ScheduleStore + 'static,
{
  Ok(Json(engine.clock_out(tenant_id, id, body.at, body.break_minutes).await?))
}

// ─── Time entries ─────────────────────────────────────────────────────────────

/// `PUT /time-entries/:id`
pub async fn correct<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
  Json(body): Json<TimeCorrection>,
) -> Result<Json<TimeEntry>, ApiError>
where
  S: ScheduleStore + 'static,
{
  Ok(Json(engine.correct_time_entry(tenant_id, id, body).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status: EntryStatus,
}

/// `POST /time-entries/:id/review`
pub async fn review<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((tenant_id, id)): Path<(Uuid, Uuid)>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<TimeEntry>, ApiError>
where
  S: ScheduleStore + 'static,
{
  Ok(Json(engine.review_time_entry(tenant_id, id, body.status).await?))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;
  use serde_json::json;
  use uuid::Uuid;

  use crate::testing::{engine, json};

  #[tokio::test]
  async fn employee_lifecycle() {
    let engine = engine().await;
    let tenant = Uuid::new_v4();
    let uri = format!("/tenants/{tenant}/employees");

    let ana = json!({ "firstName": "Ana", "lastName": "Lopez" });
    let (status, body) = json(&engine, "POST", &uri, ana.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["employeeId"].as_str().unwrap().to_string();

    let (status, _) = json(&engine, "POST", &uri, ana).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = json(&engine, "POST", &uri, json!({ "firstName": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let active = format!("{uri}/{id}/active");
    let (status, _) = json(&engine, "PUT", &active, json!({ "active": false })).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, all) = json(&engine, "GET", &uri, json!(null)).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    let (_, active_only) = json(&engine, "GET", &format!("{uri}?active_only=true"), json!(null)).await;
    assert!(active_only.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn clock_in_out_and_review() {
    let engine = engine().await;
    let tenant = Uuid::new_v4();
    let (_, ana) = json(
      &engine,
      "POST",
      &format!("/tenants/{tenant}/employees"),
      json!({ "firstName": "Ana", "lastName": "Lopez" }),
    )
    .await;
    let base = format!("/tenants/{tenant}/employees/{}", ana["employeeId"].as_str().unwrap());

    let start = json!({ "at": "2026-02-18T08:00:00" });
    let (status, entry) = json(&engine, "POST", &format!("{base}/clock-in"), start.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = json(&engine, "POST", &format!("{base}/clock-in"), start).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let stop = json!({ "at": "2026-02-18T16:30:00", "breakMinutes": 30 });
    let (status, closed) = json(&engine, "POST", &format!("{base}/clock-out"), stop).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["breakMinutes"], 30);

    let review = format!("/tenants/{tenant}/time-entries/{}/review", entry["entryId"].as_str().unwrap());
    let (status, reviewed) = json(&engine, "POST", &review, json!({ "status": "approved" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "approved");
  }

  #[tokio::test]
  async fn inverted_correction_is_unprocessable() {
    let engine = engine().await;
    let tenant = Uuid::new_v4();
    let (_, ana) = json(
      &engine,
      "POST",
      &format!("/tenants/{tenant}/employees"),
      json!({ "firstName": "Ana" }),
    )
    .await;
    let base = format!("/tenants/{tenant}/employees/{}", ana["employeeId"].as_str().unwrap());
    let (_, entry) =
      json(&engine, "POST", &format!("{base}/clock-in"), json!({ "at": "2026-02-18T08:00:00" })).await;
    json(&engine, "POST", &format!("{base}/clock-out"), json!({ "at": "2026-02-18T12:00:00" })).await;

    let uri = format!("/tenants/{tenant}/time-entries/{}", entry["entryId"].as_str().unwrap());
    let body = json!({ "clockIn": "2026-02-18T12:00:00", "clockOut": "2026-02-18T08:00:00" });
    let (status, _) = json(&engine, "PUT", &uri, body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  }
}

//! Handlers for read-side reports.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/coverage` | `?from&to[&ticket_extra]`; raises tickets, safe to repeat |
//! | `GET`  | `/conflicts` | `?employee_id&date[&start][&end][&exclude_shift_id]` |
//! | `GET`  | `/tickets` | Optional `?from&to` on the shift date |
//! | `GET`  | `/notifications` | `?recipient_id`, newest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use shiftwork_core::{
  notification::Notification,
  shift::Shift,
  store::ScheduleStore,
  ticket::DiscrepancyTicket,
  time::TimeRange,
};
use shiftwork_engine::{
  Engine, Error,
  conflict::has_conflict,
  coverage::{CoverageReport, ReconcileOptions},
};
use uuid::Uuid;

use crate::{SpanParams, error::ApiError};

// ─── Coverage ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CoverageParams {
  pub from:         NaiveDate,
  pub to:           NaiveDate,
  #[serde(default)]
  pub ticket_extra: bool,
}

/// `POST /coverage?from&to[&ticket_extra=true]`
pub async fn coverage<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<CoverageParams>,
) -> Result<Json<CoverageReport>, ApiError>
where
  S: ScheduleStore + 'static,
{
  let span = SpanParams { from: params.from, to: params.to }.span()?;
  let options = ReconcileOptions { ticket_extra: params.ticket_extra };
  Ok(Json(engine.reconcile(tenant_id, span, options).await?))
}

// ─── Conflicts ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConflictParams {
  pub employee_id:      Uuid,
  pub date:             NaiveDate,
  pub start:            Option<NaiveTime>,
  pub end:              Option<NaiveTime>,
  pub exclude_shift_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ConflictReply {
  /// The first overlapping shift, if any.
  pub conflict: Option<Shift>,
}

/// `GET /conflicts`
pub async fn conflicts<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<ConflictParams>,
) -> Result<Json<ConflictReply>, ApiError>
where
  S: ScheduleStore + 'static,
{
  let conflict = has_conflict(
    engine.store(),
    tenant_id,
    params.employee_id,
    params.date,
    TimeRange::from_bounds(params.start, params.end),
    params.exclude_shift_id,
  )
  .await?;
  Ok(Json(ConflictReply { conflict }))
}

// ─── Tickets & notifications ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TicketParams {
  pub from: Option<NaiveDate>,
  pub to:   Option<NaiveDate>,
}

/// `GET /tickets[?from&to]`
pub async fn tickets<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<TicketParams>,
) -> Result<Json<Vec<DiscrepancyTicket>>, ApiError>
where
  S: ScheduleStore + 'static,
{
  let span = match (params.from, params.to) {
    (Some(from), Some(to)) => Some(SpanParams { from, to }.span()?),
    (None, None) => None,
    _ => return Err(ApiError::BadRequest("`from` and `to` go together".into())),
  };
  let tickets = engine
    .store()
    .list_tickets(tenant_id, span)
    .await
    .map_err(Error::store)?;
  Ok(Json(tickets))
}

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
  pub recipient_id: Uuid,
}

/// `GET /notifications?recipient_id`
pub async fn notifications<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<NotificationParams>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: ScheduleStore + 'static,
{
  let notes = engine
    .store()
    .list_notifications(tenant_id, params.recipient_id)
    .await
    .map_err(Error::store)?;
  Ok(Json(notes))
}

//! JSON REST API for the shift scheduling engine.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`ScheduleStore`]. Every path is scoped to a tenant:
//! `/tenants/{tenant_id}/...`. Auth, TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", shiftwork_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod imports;
pub mod people;
pub mod reports;
pub mod shifts;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shiftwork_core::{store::ScheduleStore, time::DateSpan};
use shiftwork_engine::Engine;

pub use error::ApiError;

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`, both inclusive.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SpanParams {
  pub from: NaiveDate,
  pub to:   NaiveDate,
}

impl SpanParams {
  pub fn span(&self) -> Result<DateSpan, ApiError> {
    DateSpan::new(self.from, self.to).map_err(|e| ApiError::BadRequest(e.to_string()))
  }
}

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: ScheduleStore + 'static,
{
  let body_limit = engine.limits().max_bytes.saturating_add(64 * 1024);

  let tenant = Router::new()
    // Imports
    .route("/imports/schedule", post(imports::schedule::<S>))
    .route("/imports/timeclock", post(imports::timeclock::<S>))
    // Reports
    .route("/coverage", post(reports::coverage::<S>))
    .route("/conflicts", get(reports::conflicts::<S>))
    .route("/tickets", get(reports::tickets::<S>))
    .route("/notifications", get(reports::notifications::<S>))
    // Shifts & assignments
    .route("/shifts", get(shifts::list::<S>).post(shifts::create::<S>))
    .route("/shifts/{id}", get(shifts::get_one::<S>).patch(shifts::update::<S>))
    .route("/shifts/{id}/publish", post(shifts::publish::<S>))
    .route("/shifts/{id}/claim", post(shifts::claim::<S>))
    .route("/shifts/{id}/assignments", post(shifts::assign::<S>))
    .route("/assignments/{id}", delete(shifts::remove_assignment::<S>))
    .route("/assignments/{id}/respond", post(shifts::respond::<S>))
    // People & attendance
    .route("/employees", get(people::list::<S>).post(people::create::<S>))
    .route("/employees/{id}/active", put(people::set_active::<S>))
    .route("/employees/{id}/clock-in", post(people::clock_in::<S>))
    .route("/employees/{id}/clock-out", post(people::clock_out::<S>))
    .route("/time-entries/{id}", put(people::correct::<S>))
    .route("/time-entries/{id}/review", post(people::review::<S>));

  Router::new()
    .nest("/tenants/{tenant_id}", tenant)
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(engine)
}

//! HTTP server for the shift scheduling engine.
//!
//! Mounts the JSON API under `/api` and the live-update stream at
//! `/events`. The binary in `main.rs` adds configuration loading and the
//! one-shot operator commands.

pub mod events;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use serde::Deserialize;
use shiftwork_core::store::ScheduleStore;
use shiftwork_engine::{Engine, EngineConfig};
use tower_http::trace::TraceLayer;

pub use events::Broadcaster;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SHIFTWORK_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Import limits and the provision denylist.
  pub import:     EngineConfig,
  pub events:     EventsConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".into(),
      port:       8080,
      store_path: PathBuf::from("~/.local/share/shiftwork/shiftwork.db"),
      import:     EngineConfig::default(),
      events:     EventsConfig::default(),
    }
  }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct EventsConfig {
  /// Events buffered per subscriber before a slow one starts skipping.
  pub capacity: usize,
}

impl Default for EventsConfig {
  fn default() -> Self { Self { capacity: 256 } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(engine: Arc<Engine<S>>, events: Broadcaster) -> Router
where
  S: ScheduleStore + 'static,
{
  Router::new()
    .route("/events", get(events::stream))
    .with_state(events)
    .nest("/api", shiftwork_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use shiftwork_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  async fn app() -> (Router, Broadcaster) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let events = Broadcaster::new(16);
    let engine =
      Engine::new(Arc::new(store), Arc::new(events.clone()), &EngineConfig::default()).unwrap();
    (router(Arc::new(engine), events.clone()), events)
  }

  #[tokio::test]
  async fn api_is_nested_and_mutations_are_broadcast() {
    let (app, events) = app().await;
    let tenant = Uuid::new_v4();
    let mut feed = Box::pin(events.subscribe(Some(tenant)));

    let req = Request::builder()
      .method("POST")
      .uri(format!("/api/tenants/{tenant}/employees"))
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"firstName":"Ana","lastName":"Lopez"}"#))
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let event = futures::StreamExt::next(&mut feed).await.unwrap();
    assert_eq!(event.tenant_id, tenant);
  }

  #[tokio::test]
  async fn events_endpoint_streams() {
    let (app, _) = app().await;
    let req = Request::builder().uri("/events").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
  }

  #[test]
  fn config_defaults_fill_missing_sections() {
    let cfg: ServerConfig = serde_json::from_str(r#"{ "port": 9000, "import": { "max_rows": 5 } }"#)
      .unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.import.limits.max_rows, 5);
    assert_eq!(cfg.import.provision_denylist, vec![r"^system\s".to_string()]);
    assert_eq!(cfg.events.capacity, 256);
  }
}

//! Scheduling engine: import pipelines, conflict detection, coverage
//! reconciliation, notification dispatch and the interactive shift and
//! clock operations.
//!
//! Everything runs against an abstract [`ScheduleStore`]; the engine holds
//! no state of its own beyond configuration. Every mutation is reported to
//! a [`ChangeSink`].
//!
//! # Quick start
//!
//! ```rust,ignore
//! let engine = Engine::new(Arc::new(store), Arc::new(NoopSink), &EngineConfig::default())?;
//! let summary = engine
//!   .import_schedule(tenant_id, span, &csv, ImportOptions { auto_create: true })
//!   .await?;
//! let report = engine.reconcile(tenant_id, span, ReconcileOptions::default()).await?;
//! ```

pub mod clock;
pub mod config;
pub mod conflict;
pub mod coverage;
pub mod editor;
pub mod error;
pub mod notify;
pub mod people;
pub mod pipeline;
pub mod resolver;

use std::sync::Arc;

use shiftwork_core::{
  events::{ChangeEvent, ChangeOp, ChangeSink, EntityKind},
  store::ScheduleStore,
};
use shiftwork_import::ImportLimits;
use uuid::Uuid;

pub use config::EngineConfig;
pub use error::{Error, Result};

use config::Denylist;

/// The engine, generic over its store backend. Cheap to share behind an
/// [`Arc`].
pub struct Engine<S> {
  store:    Arc<S>,
  sink:     Arc<dyn ChangeSink>,
  limits:   ImportLimits,
  denylist: Denylist,
}

impl<S: ScheduleStore> Engine<S> {
  /// Fails only if a denylist pattern does not compile.
  pub fn new(store: Arc<S>, sink: Arc<dyn ChangeSink>, config: &EngineConfig) -> Result<Self> {
    Ok(Self {
      store,
      sink,
      limits: config.limits,
      denylist: Denylist::compile(&config.provision_denylist)?,
    })
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn limits(&self) -> &ImportLimits { &self.limits }

  fn emit(&self, tenant_id: Uuid, entity: EntityKind, entity_id: Uuid, op: ChangeOp) {
    self.sink.emit(ChangeEvent::new(tenant_id, entity, entity_id, op));
  }

  fn emit_bulk(&self, tenant_id: Uuid, entity: EntityKind, op: ChangeOp) {
    self.sink.emit(ChangeEvent::bulk(tenant_id, entity, op));
  }
}

#[cfg(test)]
pub(crate) mod testing {
  use std::sync::{Arc, Mutex};

  use shiftwork_core::events::{ChangeEvent, ChangeSink};
  use shiftwork_store_sqlite::SqliteStore;

  use crate::{Engine, EngineConfig};

  /// Sink that keeps every event for assertions.
  #[derive(Default)]
  pub struct RecordingSink(pub Mutex<Vec<ChangeEvent>>);

  impl ChangeSink for RecordingSink {
    fn emit(&self, event: ChangeEvent) { self.0.lock().unwrap().push(event); }
  }

  pub async fn engine() -> (Engine<SqliteStore>, Arc<RecordingSink>) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let sink = Arc::new(RecordingSink::default());
    let engine = Engine::new(Arc::new(store), sink.clone(), &EngineConfig::default()).unwrap();
    (engine, sink)
  }
}

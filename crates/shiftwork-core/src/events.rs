//! Entity-changed events.
//!
//! The engine reports every mutation through a [`ChangeSink`]. A thin adapter
//! bridges the sink to whatever publish/subscribe transport keeps shift
//! boards fresh. Events are notifications only; the store stays the source of
//! truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  Employee,
  Client,
  Location,
  Shift,
  Assignment,
  TimeEntry,
  Ticket,
  Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
  Created,
  Updated,
  Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
  pub tenant_id: Uuid,
  pub entity:    EntityKind,
  /// `None` when many rows of `entity` changed at once (an import replace).
  pub entity_id: Option<Uuid>,
  pub op:        ChangeOp,
  pub at:        DateTime<Utc>,
}

impl ChangeEvent {
  pub fn new(tenant_id: Uuid, entity: EntityKind, entity_id: Uuid, op: ChangeOp) -> Self {
    Self { tenant_id, entity, entity_id: Some(entity_id), op, at: Utc::now() }
  }

  pub fn bulk(tenant_id: Uuid, entity: EntityKind, op: ChangeOp) -> Self {
    Self { tenant_id, entity, entity_id: None, op, at: Utc::now() }
  }
}

/// Receiver of change events. Implementations must not block.
pub trait ChangeSink: Send + Sync {
  fn emit(&self, event: ChangeEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ChangeSink for NoopSink {
  fn emit(&self, _event: ChangeEvent) {}
}

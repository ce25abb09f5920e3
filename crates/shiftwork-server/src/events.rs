//! Live-update bridge: engine change events out as Server-Sent Events.
//!
//! Delivery is best effort. A slow subscriber that falls behind the channel
//! capacity skips the missed events and should refetch what it displays.

use std::{convert::Infallible, time::Duration};

use axum::{
  extract::{Query, State},
  response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use shiftwork_core::events::{ChangeEvent, ChangeSink};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

/// Fans every [`ChangeEvent`] out to the connected subscribers.
#[derive(Clone)]
pub struct Broadcaster {
  tx: broadcast::Sender<ChangeEvent>,
}

impl Broadcaster {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  pub fn subscriber_count(&self) -> usize { self.tx.receiver_count() }

  /// Events from now on, optionally only those of one tenant.
  pub fn subscribe(&self, tenant_id: Option<Uuid>) -> impl Stream<Item = ChangeEvent> + use<> {
    BroadcastStream::new(self.tx.subscribe()).filter_map(move |result| async move {
      match result {
        Ok(event) if tenant_id.is_none_or(|t| t == event.tenant_id) => Some(event),
        Ok(_) => None,
        Err(e) => {
          warn!(error = %e, "event subscriber lagged");
          None
        }
      }
    })
  }
}

impl ChangeSink for Broadcaster {
  fn emit(&self, event: ChangeEvent) {
    // No subscribers is not an error.
    let _ = self.tx.send(event);
  }
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
  pub tenant_id: Option<Uuid>,
}

/// `GET /events[?tenant_id]`
pub async fn stream(
  State(events): State<Broadcaster>,
  Query(params): Query<StreamParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
  debug!(tenant_id = ?params.tenant_id, "event subscriber connected");
  let stream = events.subscribe(params.tenant_id).filter_map(|event| async move {
    let name = format!("{}.{}", kind_str(&event), op_str(&event));
    match Event::default().event(name).json_data(&event) {
      Ok(e) => Some(Ok(e)),
      Err(e) => {
        warn!(error = %e, "failed to encode change event");
        None
      }
    }
  });
  Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keep-alive"))
}

fn kind_str(event: &ChangeEvent) -> String {
  serde_json::to_value(event.entity)
    .ok()
    .and_then(|v| v.as_str().map(str::to_string))
    .unwrap_or_default()
}

fn op_str(event: &ChangeEvent) -> String {
  serde_json::to_value(event.op)
    .ok()
    .and_then(|v| v.as_str().map(str::to_string))
    .unwrap_or_default()
}

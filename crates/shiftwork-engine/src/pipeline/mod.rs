//! Import pipelines: parse an export, resolve its entities, write shifts,
//! assignments and time entries, and report what happened.
//!
//! Every run is keyed by an [`ImportKey`]. The key's tag is stamped on each
//! row the run creates; a later run under the same key first purges those
//! rows, so re-importing the same export converges on the same state.
//! Schedule runs keep the shifts the new export still describes, so
//! attendance and tickets attached to them are not lost.

mod schedule;
mod timeclock;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shiftwork_core::{people::name_key, store::ScheduleStore, time::DateSpan};
use shiftwork_import::{AvailabilityOverride, RejectedRow};
use strum::{AsRefStr, Display, EnumString};
use tracing::warn;
use uuid::Uuid;

use crate::resolver::Resolver;

// ─── Keys & options ──────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImportKind {
  Schedule,
  Timeclock,
}

/// Identifies one import run: what kind of export, covering which dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportKey {
  pub kind: ImportKind,
  pub span: DateSpan,
}

impl ImportKey {
  pub fn new(kind: ImportKind, span: DateSpan) -> Self { Self { kind, span } }

  /// Deterministic tag, e.g. `"schedule:2026-02-16..2026-02-22"`.
  pub fn tag(&self) -> String {
    format!("{}:{}..{}", self.kind, self.span.from(), self.span.to())
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
  /// Provision employees, clients and locations that do not resolve.
  pub auto_create: bool,
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
  pub tag:                    String,
  pub total_rows:             usize,
  pub created_shifts:         usize,
  /// Shifts from an earlier run under the same key, updated in place.
  pub reused_shifts:          usize,
  pub created_assignments:    usize,
  pub created_time_entries:   usize,
  pub linked_to_shift:        usize,
  pub created_employees:      usize,
  pub created_clients:        usize,
  pub created_locations:      usize,
  pub unmatched_employees:    Vec<String>,
  pub unmatched_clients:      Vec<String>,
  /// Names that matched the provision denylist and were left unresolved.
  pub denylisted_employees:   Vec<String>,
  pub skipped_overlap:        usize,
  pub rejected_rows:          usize,
  pub rejections:             Vec<RejectedRow>,
  /// Single-row store failures; logged and skipped.
  pub failed_writes:          usize,
  /// Rows removed from a previous run under the same key.
  pub replaced_rows:          usize,
  pub availability_overrides: Vec<AvailabilityOverride>,
}

impl ImportSummary {
  fn new(key: &ImportKey, total_rows: usize, rejected: Vec<RejectedRow>) -> Self {
    Self {
      tag: key.tag(),
      total_rows,
      rejected_rows: rejected.len(),
      rejections: rejected,
      ..Default::default()
    }
  }
}

/// What an import would do, computed without provisioning or writing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
  pub tag:                    String,
  pub total_rows:             usize,
  /// Shift groups (schedule) or sessions (time clock) that would be written.
  pub candidates:             usize,
  /// Candidate assignments (schedule) or sessions matching a shift code
  /// (time clock).
  pub links:                  usize,
  pub rejected_rows:          usize,
  pub rejections:             Vec<RejectedRow>,
  pub unmatched_employees:    Vec<String>,
  pub unmatched_clients:      Vec<String>,
  pub denylisted_employees:   Vec<String>,
  pub availability_overrides: Vec<AvailabilityOverride>,
}

impl From<ImportSummary> for ImportPreview {
  fn from(s: ImportSummary) -> Self {
    Self {
      tag: s.tag,
      total_rows: s.total_rows,
      rejected_rows: s.rejected_rows,
      rejections: s.rejections,
      unmatched_employees: s.unmatched_employees,
      unmatched_clients: s.unmatched_clients,
      denylisted_employees: s.denylisted_employees,
      availability_overrides: s.availability_overrides,
      ..Default::default()
    }
  }
}

// ─── Shared resolution steps ─────────────────────────────────────────────────

/// Resolve every distinct client label, provisioning misses when asked.
/// Returns `name_key(label)` → client id for the labels that resolved.
async fn resolve_clients<S: ScheduleStore>(
  resolver: &mut Resolver<'_, S>,
  labels: &[&str],
  provision: bool,
  summary: &mut ImportSummary,
) -> HashMap<String, Uuid> {
  let mut out = HashMap::new();
  for &label in labels {
    let id = match resolver.resolve_client(label) {
      Some(id) => Some(id),
      None if provision => match resolver.provision_client(label).await {
        Ok(p) => {
          if p.is_some_and(|p| p.is_created()) {
            summary.created_clients += 1;
          }
          p.map(|p| p.id())
        }
        Err(e) => {
          warn!(label, error = %e, "client provisioning failed");
          summary.failed_writes += 1;
          None
        }
      },
      None => None,
    };
    match id {
      Some(id) => {
        out.insert(name_key(label), id);
      }
      None => summary.unmatched_clients.push(label.to_string()),
    }
  }
  out
}

/// Resolve every distinct employee name. Denylisted names are never
/// provisioned and are reported separately from plain misses.
async fn resolve_employees<S: ScheduleStore>(
  resolver: &mut Resolver<'_, S>,
  names: &[&str],
  provision: bool,
  summary: &mut ImportSummary,
) -> HashMap<String, Uuid> {
  let mut out = HashMap::new();
  for &name in names {
    if let Some(id) = resolver.resolve_employee(name) {
      out.insert(name_key(name), id);
      continue;
    }
    if resolver.is_denylisted(name) {
      summary.denylisted_employees.push(name.to_string());
      continue;
    }
    if !provision {
      summary.unmatched_employees.push(name.to_string());
      continue;
    }
    match resolver.provision_employee(name).await {
      Ok(Some(p)) => {
        if p.is_created() {
          summary.created_employees += 1;
        }
        out.insert(name_key(name), p.id());
      }
      Ok(None) => summary.unmatched_employees.push(name.to_string()),
      Err(e) => {
        warn!(name, error = %e, "employee provisioning failed");
        summary.failed_writes += 1;
        summary.unmatched_employees.push(name.to_string());
      }
    }
  }
  out
}

//! Employees and the named reference entities (clients, locations) a shift
//! may point to.
//!
//! None of these rows are ever hard-deleted: employees are deactivated,
//! clients and locations are soft-deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical comparison key for a person or site name: lower-cased, with
/// runs of whitespace collapsed to a single space and the ends trimmed.
///
/// Used both by the resolver and by the store's uniqueness index, so two
/// spellings that differ only in case or spacing are the same entity.
pub fn name_key(raw: &str) -> String {
  raw
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

// ─── Employee ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  pub employee_id: Uuid,
  pub tenant_id:   Uuid,
  pub first_name:  String,
  pub last_name:   String,
  pub active:      bool,
  pub created_at:  DateTime<Utc>,
}

impl Employee {
  /// `first + " " + last`, without a trailing space for single-token names.
  pub fn full_name(&self) -> String { full_name(&self.first_name, &self.last_name) }

  pub fn name_key(&self) -> String { name_key(&self.full_name()) }
}

/// Input for [`ScheduleStore::add_employee`](crate::store::ScheduleStore::add_employee).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
}

impl NewEmployee {
  pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    Self { first_name: first_name.into(), last_name: last_name.into() }
  }

  pub fn full_name(&self) -> String { full_name(&self.first_name, &self.last_name) }
}

fn full_name(first: &str, last: &str) -> String {
  if last.is_empty() {
    first.to_string()
  } else {
    format!("{first} {last}")
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
  pub client_id:  Uuid,
  pub tenant_id:  Uuid,
  pub name:       String,
  pub deleted:    bool,
  pub created_at: DateTime<Utc>,
}

// ─── Location ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
  pub location_id: Uuid,
  pub tenant_id:   Uuid,
  pub name:        String,
  pub address:     Option<String>,
  pub deleted:     bool,
  pub created_at:  DateTime<Utc>,
}

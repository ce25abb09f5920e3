//! Notification records produced by the dispatcher. Delivery (push, e-mail,
//! in-app feed) is an external concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecipientType {
  Employee,
  Company,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
  /// A broadcast change: date, time, location or client moved.
  ShiftChanged,
  /// A metadata-only edit.
  ShiftUpdated,
  ShiftPublished,
  OpenShiftAvailable,
  AssignmentRemoved,
  ShiftClaimRequested,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub notification_id: Uuid,
  pub tenant_id:       Uuid,
  pub recipient_id:    Uuid,
  pub recipient_type:  RecipientType,
  #[serde(rename = "type")]
  pub kind:            NotificationType,
  pub title:           String,
  pub body:            String,
  pub metadata:        serde_json::Value,
  pub created_at:      DateTime<Utc>,
}

/// Input for [`ScheduleStore::add_notification`](crate::store::ScheduleStore::add_notification).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
  pub tenant_id:      Uuid,
  pub recipient_id:   Uuid,
  pub recipient_type: RecipientType,
  #[serde(rename = "type")]
  pub kind:           NotificationType,
  pub title:          String,
  pub body:           String,
  pub metadata:       serde_json::Value,
}

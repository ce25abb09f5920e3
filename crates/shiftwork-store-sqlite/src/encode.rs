//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Instants are RFC 3339 strings; calendar dates, wall-clock times and local
//! datetimes use fixed-width ISO formats. Status and kind enums are stored
//! as their snake_case names. UUIDs are hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::Row;
use shiftwork_core::{
  assignment::Assignment,
  attendance::TimeEntry,
  notification::Notification,
  people::{Client, Employee, Location},
  shift::Shift,
  ticket::DiscrepancyTicket,
};
use uuid::Uuid;

use crate::{Error, Result};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const LOCAL_DT_FMT: &str = "%Y-%m-%dT%H:%M:%S";

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Calendar values ─────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FMT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FMT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FMT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FMT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_local(dt: NaiveDateTime) -> String { dt.format(LOCAL_DT_FMT).to_string() }

pub fn decode_local(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, LOCAL_DT_FMT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownValue { column, value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const EMPLOYEE_COLUMNS: &str =
  "employee_id, tenant_id, first_name, last_name, active, created_at";

/// Raw values read directly from an `employees` row.
pub struct RawEmployee {
  pub employee_id: String,
  pub tenant_id:   String,
  pub first_name:  String,
  pub last_name:   String,
  pub active:      bool,
  pub created_at:  String,
}

impl RawEmployee {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id: row.get(0)?,
      tenant_id:   row.get(1)?,
      first_name:  row.get(2)?,
      last_name:   row.get(3)?,
      active:      row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      employee_id: decode_uuid(&self.employee_id)?,
      tenant_id:   decode_uuid(&self.tenant_id)?,
      first_name:  self.first_name,
      last_name:   self.last_name,
      active:      self.active,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const CLIENT_COLUMNS: &str = "client_id, tenant_id, name, deleted, created_at";

pub struct RawClient {
  pub client_id:  String,
  pub tenant_id:  String,
  pub name:       String,
  pub deleted:    bool,
  pub created_at: String,
}

impl RawClient {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      client_id:  row.get(0)?,
      tenant_id:  row.get(1)?,
      name:       row.get(2)?,
      deleted:    row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_client(self) -> Result<Client> {
    Ok(Client {
      client_id:  decode_uuid(&self.client_id)?,
      tenant_id:  decode_uuid(&self.tenant_id)?,
      name:       self.name,
      deleted:    self.deleted,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const LOCATION_COLUMNS: &str =
  "location_id, tenant_id, name, address, deleted, created_at";

pub struct RawLocation {
  pub location_id: String,
  pub tenant_id:   String,
  pub name:        String,
  pub address:     Option<String>,
  pub deleted:     bool,
  pub created_at:  String,
}

impl RawLocation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      location_id: row.get(0)?,
      tenant_id:   row.get(1)?,
      name:        row.get(2)?,
      address:     row.get(3)?,
      deleted:     row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_location(self) -> Result<Location> {
    Ok(Location {
      location_id: decode_uuid(&self.location_id)?,
      tenant_id:   decode_uuid(&self.tenant_id)?,
      name:        self.name,
      address:     self.address,
      deleted:     self.deleted,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Columns of `shifts`, prefixed with the `s.` alias so the list can be used
/// in joins.
pub const SHIFT_COLUMNS: &str = "s.shift_id, s.tenant_id, s.title, s.date, s.start_time, \
   s.end_time, s.client_id, s.location_id, s.slots, s.claimable, s.status, s.shift_code, \
   s.notes, s.import_tag, s.created_at";

pub struct RawShift {
  pub shift_id:    String,
  pub tenant_id:   String,
  pub title:       String,
  pub date:        String,
  pub start_time:  Option<String>,
  pub end_time:    Option<String>,
  pub client_id:   Option<String>,
  pub location_id: Option<String>,
  pub slots:       u32,
  pub claimable:   bool,
  pub status:      String,
  pub shift_code:  Option<String>,
  pub notes:       Option<String>,
  pub import_tag:  Option<String>,
  pub created_at:  String,
}

impl RawShift {
  /// Read the shift columns starting at index `at`.
  pub fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      shift_id:    row.get(at)?,
      tenant_id:   row.get(at + 1)?,
      title:       row.get(at + 2)?,
      date:        row.get(at + 3)?,
      start_time:  row.get(at + 4)?,
      end_time:    row.get(at + 5)?,
      client_id:   row.get(at + 6)?,
      location_id: row.get(at + 7)?,
      slots:       row.get(at + 8)?,
      claimable:   row.get(at + 9)?,
      status:      row.get(at + 10)?,
      shift_code:  row.get(at + 11)?,
      notes:       row.get(at + 12)?,
      import_tag:  row.get(at + 13)?,
      created_at:  row.get(at + 14)?,
    })
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> { Self::from_row_at(row, 0) }

  pub fn into_shift(self) -> Result<Shift> {
    Ok(Shift {
      shift_id:    decode_uuid(&self.shift_id)?,
      tenant_id:   decode_uuid(&self.tenant_id)?,
      title:       self.title,
      date:        decode_date(&self.date)?,
      start_time:  self.start_time.as_deref().map(decode_time).transpose()?,
      end_time:    self.end_time.as_deref().map(decode_time).transpose()?,
      client_id:   decode_opt_uuid(self.client_id)?,
      location_id: decode_opt_uuid(self.location_id)?,
      slots:       self.slots,
      claimable:   self.claimable,
      status:      decode_enum("shifts.status", &self.status)?,
      shift_code:  self.shift_code,
      notes:       self.notes,
      import_tag:  self.import_tag,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const ASSIGNMENT_COLUMNS: &str = "a.assignment_id, a.tenant_id, a.shift_id, a.employee_id, \
   a.status, a.import_tag, a.created_at";

pub const ASSIGNMENT_COLUMN_COUNT: usize = 7;

pub struct RawAssignment {
  pub assignment_id: String,
  pub tenant_id:     String,
  pub shift_id:      String,
  pub employee_id:   String,
  pub status:        String,
  pub import_tag:    Option<String>,
  pub created_at:    String,
}

impl RawAssignment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id: row.get(0)?,
      tenant_id:     row.get(1)?,
      shift_id:      row.get(2)?,
      employee_id:   row.get(3)?,
      status:        row.get(4)?,
      import_tag:    row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id: decode_uuid(&self.assignment_id)?,
      tenant_id:     decode_uuid(&self.tenant_id)?,
      shift_id:      decode_uuid(&self.shift_id)?,
      employee_id:   decode_uuid(&self.employee_id)?,
      status:        decode_enum("assignments.status", &self.status)?,
      import_tag:    self.import_tag,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const ENTRY_COLUMNS: &str = "e.entry_id, e.tenant_id, e.employee_id, e.shift_id, \
   e.client_id, e.clock_in, e.clock_out, e.break_minutes, e.status, e.notes, e.import_tag, \
   e.created_at";

pub struct RawTimeEntry {
  pub entry_id:      String,
  pub tenant_id:     String,
  pub employee_id:   String,
  pub shift_id:      Option<String>,
  pub client_id:     Option<String>,
  pub clock_in:      String,
  pub clock_out:     Option<String>,
  pub break_minutes: u32,
  pub status:        String,
  pub notes:         Option<String>,
  pub import_tag:    Option<String>,
  pub created_at:    String,
}

impl RawTimeEntry {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:      row.get(0)?,
      tenant_id:     row.get(1)?,
      employee_id:   row.get(2)?,
      shift_id:      row.get(3)?,
      client_id:     row.get(4)?,
      clock_in:      row.get(5)?,
      clock_out:     row.get(6)?,
      break_minutes: row.get(7)?,
      status:        row.get(8)?,
      notes:         row.get(9)?,
      import_tag:    row.get(10)?,
      created_at:    row.get(11)?,
    })
  }

  pub fn into_entry(self) -> Result<TimeEntry> {
    Ok(TimeEntry {
      entry_id:      decode_uuid(&self.entry_id)?,
      tenant_id:     decode_uuid(&self.tenant_id)?,
      employee_id:   decode_uuid(&self.employee_id)?,
      shift_id:      decode_opt_uuid(self.shift_id)?,
      client_id:     decode_opt_uuid(self.client_id)?,
      clock_in:      decode_local(&self.clock_in)?,
      clock_out:     self.clock_out.as_deref().map(decode_local).transpose()?,
      break_minutes: self.break_minutes,
      status:        decode_enum("time_entries.status", &self.status)?,
      notes:         self.notes,
      import_tag:    self.import_tag,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const TICKET_COLUMNS: &str = "t.ticket_id, t.tenant_id, t.shift_id, t.employee_id, t.kind, \
   t.description, t.status, t.created_at";

pub struct RawTicket {
  pub ticket_id:   String,
  pub tenant_id:   String,
  pub shift_id:    String,
  pub employee_id: String,
  pub kind:        String,
  pub description: String,
  pub status:      String,
  pub created_at:  String,
}

impl RawTicket {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ticket_id:   row.get(0)?,
      tenant_id:   row.get(1)?,
      shift_id:    row.get(2)?,
      employee_id: row.get(3)?,
      kind:        row.get(4)?,
      description: row.get(5)?,
      status:      row.get(6)?,
      created_at:  row.get(7)?,
    })
  }

  pub fn into_ticket(self) -> Result<DiscrepancyTicket> {
    Ok(DiscrepancyTicket {
      ticket_id:   decode_uuid(&self.ticket_id)?,
      tenant_id:   decode_uuid(&self.tenant_id)?,
      shift_id:    decode_uuid(&self.shift_id)?,
      employee_id: decode_uuid(&self.employee_id)?,
      kind:        decode_enum("tickets.kind", &self.kind)?,
      description: self.description,
      status:      decode_enum("tickets.status", &self.status)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str = "notification_id, tenant_id, recipient_id, \
   recipient_type, kind, title, body, metadata, created_at";

pub struct RawNotification {
  pub notification_id: String,
  pub tenant_id:       String,
  pub recipient_id:    String,
  pub recipient_type:  String,
  pub kind:            String,
  pub title:           String,
  pub body:            String,
  pub metadata:        String,
  pub created_at:      String,
}

impl RawNotification {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      tenant_id:       row.get(1)?,
      recipient_id:    row.get(2)?,
      recipient_type:  row.get(3)?,
      kind:            row.get(4)?,
      title:           row.get(5)?,
      body:            row.get(6)?,
      metadata:        row.get(7)?,
      created_at:      row.get(8)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      tenant_id:       decode_uuid(&self.tenant_id)?,
      recipient_id:    decode_uuid(&self.recipient_id)?,
      recipient_type:  decode_enum("notifications.recipient_type", &self.recipient_type)?,
      kind:            decode_enum("notifications.kind", &self.kind)?,
      title:           self.title,
      body:            self.body,
      metadata:        serde_json::from_str(&self.metadata)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn calendar_encodings_sort_chronologically() {
    let a = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap().and_hms_opt(9, 5, 0).unwrap();
    let b = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap().and_hms_opt(8, 0, 0).unwrap();
    assert!(encode_local(a) < encode_local(b));
    assert!(encode_date(a.date()) < encode_date(b.date()));
    assert!(encode_time(b.time()) < encode_time(a.time()));
  }

  #[test]
  fn calendar_encodings_decode() {
    let dt = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap().and_hms_opt(22, 30, 0).unwrap();
    assert_eq!(decode_local(&encode_local(dt)).unwrap(), dt);
    assert_eq!(decode_date("2026-02-18").unwrap(), dt.date());
    assert_eq!(decode_time("22:30:00").unwrap(), dt.time());
    assert!(matches!(decode_date("02/18/2026"), Err(Error::DateParse(_))));
  }

  #[test]
  fn unknown_enum_value_is_reported() {
    let err = decode_enum::<shiftwork_core::shift::ShiftStatus>("shifts.status", "archived")
      .unwrap_err();
    assert!(matches!(err, Error::UnknownValue { column: "shifts.status", .. }));
  }
}

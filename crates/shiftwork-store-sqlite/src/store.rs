//! [`SqliteStore`] — the SQLite implementation of [`ScheduleStore`].

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{OptionalExtension as _, Row};
use uuid::Uuid;

use shiftwork_core::{
  assignment::{AssignedShift, Assignment, AssignmentStatus, NewAssignment},
  attendance::{NewTimeEntry, TimeEntry},
  notification::{NewNotification, Notification},
  people::{Client, Employee, Location, NewEmployee, name_key},
  shift::{NewShift, Shift},
  store::{PurgeReport, ScheduleStore},
  ticket::{DiscrepancyTicket, NewTicket, TicketStatus},
  time::DateSpan,
};

use crate::{
  Result,
  encode::{
    ASSIGNMENT_COLUMN_COUNT, ASSIGNMENT_COLUMNS, CLIENT_COLUMNS, EMPLOYEE_COLUMNS, ENTRY_COLUMNS,
    LOCATION_COLUMNS, NOTIFICATION_COLUMNS, RawAssignment, RawClient, RawEmployee,
    RawLocation, RawNotification, RawShift, RawTicket, RawTimeEntry, SHIFT_COLUMNS,
    TICKET_COLUMNS, encode_date, encode_dt, encode_local, encode_time, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A schedule store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a read query whose parameters are all text and map every row.
  async fn fetch_all<R, F>(&self, sql: String, params: Vec<String>, map: F) -> Result<Vec<R>>
  where
    R: Send + 'static,
    F: Fn(&Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), map)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Like [`Self::fetch_all`] for queries yielding at most one row.
  async fn fetch_one<R, F>(&self, sql: String, params: Vec<String>, map: F) -> Result<Option<R>>
  where
    R: Send + 'static,
    F: Fn(&Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let row = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, rusqlite::params_from_iter(params), map).optional()?))
      .await?;
    Ok(row)
  }

  /// Run a write whose parameters are all text; returns the changed row count.
  async fn execute(&self, sql: &'static str, params: Vec<String>) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params_from_iter(params))?))
      .await?;
    Ok(changed)
  }

  async fn insert_shift(&self, shift: &Shift) -> Result<()> {
    let id_str          = encode_uuid(shift.shift_id);
    let tenant_str      = encode_uuid(shift.tenant_id);
    let title           = shift.title.clone();
    let date_str        = encode_date(shift.date);
    let start_str       = shift.start_time.map(encode_time);
    let end_str         = shift.end_time.map(encode_time);
    let client_str      = shift.client_id.map(encode_uuid);
    let location_str    = shift.location_id.map(encode_uuid);
    let slots           = shift.slots;
    let claimable       = shift.claimable;
    let status_str      = shift.status.to_string();
    let shift_code      = shift.shift_code.clone();
    let notes           = shift.notes.clone();
    let import_tag      = shift.import_tag.clone();
    let created_str     = encode_dt(shift.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO shifts (
             shift_id, tenant_id, title, date, start_time, end_time,
             client_id, location_id, slots, claimable, status,
             shift_code, notes, import_tag, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
          rusqlite::params![
            id_str,
            tenant_str,
            title,
            date_str,
            start_str,
            end_str,
            client_str,
            location_str,
            slots,
            claimable,
            status_str,
            shift_code,
            notes,
            import_tag,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_time_entry(&self, entry: &TimeEntry) -> Result<()> {
    let id_str       = encode_uuid(entry.entry_id);
    let tenant_str   = encode_uuid(entry.tenant_id);
    let employee_str = encode_uuid(entry.employee_id);
    let shift_str    = entry.shift_id.map(encode_uuid);
    let client_str   = entry.client_id.map(encode_uuid);
    let in_str       = encode_local(entry.clock_in);
    let out_str      = entry.clock_out.map(encode_local);
    let break_mins   = entry.break_minutes;
    let status_str   = entry.status.to_string();
    let notes        = entry.notes.clone();
    let import_tag   = entry.import_tag.clone();
    let created_str  = encode_dt(entry.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO time_entries (
             entry_id, tenant_id, employee_id, shift_id, client_id,
             clock_in, clock_out, break_minutes, status, notes,
             import_tag, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str,
            tenant_str,
            employee_str,
            shift_str,
            client_str,
            in_str,
            out_str,
            break_mins,
            status_str,
            notes,
            import_tag,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ScheduleStore impl ──────────────────────────────────────────────────────

impl ScheduleStore for SqliteStore {
  type Error = crate::Error;

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn add_employee(&self, tenant_id: Uuid, input: NewEmployee) -> Result<Employee> {
    let employee = Employee {
      employee_id: Uuid::new_v4(),
      tenant_id,
      first_name: input.first_name.trim().to_owned(),
      last_name: input.last_name.trim().to_owned(),
      active: true,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(employee.employee_id);
    let tenant_str = encode_uuid(tenant_id);
    let first      = employee.first_name.clone();
    let last       = employee.last_name.clone();
    let key        = employee.name_key();
    let at_str     = encode_dt(employee.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO employees (employee_id, tenant_id, first_name, last_name, name_key, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, tenant_str, first, last, key, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(employee)
  }

  async fn get_employee(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Option<Employee>> {
    let raw = self
      .fetch_one(
        format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE tenant_id = ?1 AND employee_id = ?2"),
        vec![encode_uuid(tenant_id), encode_uuid(employee_id)],
        RawEmployee::from_row,
      )
      .await?;
    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn list_employees(&self, tenant_id: Uuid, active_only: bool) -> Result<Vec<Employee>> {
    let filter = if active_only { "AND active = 1" } else { "" };
    let raws = self
      .fetch_all(
        format!(
          "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE tenant_id = ?1 {filter}
           ORDER BY first_name COLLATE NOCASE, last_name COLLATE NOCASE"
        ),
        vec![encode_uuid(tenant_id)],
        RawEmployee::from_row,
      )
      .await?;
    raws.into_iter().map(RawEmployee::into_employee).collect()
  }

  async fn set_employee_active(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    active: bool,
  ) -> Result<bool> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str     = encode_uuid(employee_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE employees SET active = ?3 WHERE tenant_id = ?1 AND employee_id = ?2",
          rusqlite::params![tenant_str, id_str, active],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Clients & locations ───────────────────────────────────────────────────

  async fn add_client(&self, tenant_id: Uuid, name: String) -> Result<Client> {
    let client = Client {
      client_id: Uuid::new_v4(),
      tenant_id,
      name: name.trim().to_owned(),
      deleted: false,
      created_at: Utc::now(),
    };

    self
      .execute(
        "INSERT INTO clients (client_id, tenant_id, name, name_key, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          encode_uuid(client.client_id),
          encode_uuid(tenant_id),
          client.name.clone(),
          name_key(&client.name),
          encode_dt(client.created_at),
        ],
      )
      .await?;
    Ok(client)
  }

  async fn list_clients(&self, tenant_id: Uuid) -> Result<Vec<Client>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {CLIENT_COLUMNS} FROM clients WHERE tenant_id = ?1 AND deleted = 0
           ORDER BY name COLLATE NOCASE"
        ),
        vec![encode_uuid(tenant_id)],
        RawClient::from_row,
      )
      .await?;
    raws.into_iter().map(RawClient::into_client).collect()
  }

  async fn delete_client(&self, tenant_id: Uuid, client_id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "UPDATE clients SET deleted = 1 WHERE tenant_id = ?1 AND client_id = ?2",
        vec![encode_uuid(tenant_id), encode_uuid(client_id)],
      )
      .await?;
    Ok(changed > 0)
  }

  async fn add_location(
    &self,
    tenant_id: Uuid,
    name: String,
    address: Option<String>,
  ) -> Result<Location> {
    let location = Location {
      location_id: Uuid::new_v4(),
      tenant_id,
      name: name.trim().to_owned(),
      address: address.map(|a| a.trim().to_owned()).filter(|a| !a.is_empty()),
      deleted: false,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(location.location_id);
    let tenant_str = encode_uuid(tenant_id);
    let name_str   = location.name.clone();
    let key        = name_key(&location.name);
    let address    = location.address.clone();
    let at_str     = encode_dt(location.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO locations (location_id, tenant_id, name, name_key, address, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, tenant_str, name_str, key, address, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(location)
  }

  async fn list_locations(&self, tenant_id: Uuid) -> Result<Vec<Location>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {LOCATION_COLUMNS} FROM locations WHERE tenant_id = ?1 AND deleted = 0
           ORDER BY name COLLATE NOCASE"
        ),
        vec![encode_uuid(tenant_id)],
        RawLocation::from_row,
      )
      .await?;
    raws.into_iter().map(RawLocation::into_location).collect()
  }

  async fn delete_location(&self, tenant_id: Uuid, location_id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "UPDATE locations SET deleted = 1 WHERE tenant_id = ?1 AND location_id = ?2",
        vec![encode_uuid(tenant_id), encode_uuid(location_id)],
      )
      .await?;
    Ok(changed > 0)
  }

  // ── Shifts ────────────────────────────────────────────────────────────────

  async fn add_shift(&self, input: NewShift) -> Result<Shift> {
    let shift = Shift {
      shift_id:    Uuid::new_v4(),
      tenant_id:   input.tenant_id,
      title:       input.title,
      date:        input.date,
      start_time:  input.start_time,
      end_time:    input.end_time,
      client_id:   input.client_id,
      location_id: input.location_id,
      slots:       input.slots,
      claimable:   input.claimable,
      status:      input.status,
      shift_code:  input.shift_code,
      notes:       input.notes,
      import_tag:  input.import_tag,
      created_at:  Utc::now(),
    };

    self.insert_shift(&shift).await?;
    Ok(shift)
  }

  async fn get_shift(&self, tenant_id: Uuid, shift_id: Uuid) -> Result<Option<Shift>> {
    let raw = self
      .fetch_one(
        format!("SELECT {SHIFT_COLUMNS} FROM shifts s WHERE s.tenant_id = ?1 AND s.shift_id = ?2"),
        vec![encode_uuid(tenant_id), encode_uuid(shift_id)],
        RawShift::from_row,
      )
      .await?;
    raw.map(RawShift::into_shift).transpose()
  }

  async fn update_shift(&self, shift: Shift) -> Result<bool> {
    let id_str       = encode_uuid(shift.shift_id);
    let tenant_str   = encode_uuid(shift.tenant_id);
    let date_str     = encode_date(shift.date);
    let start_str    = shift.start_time.map(encode_time);
    let end_str      = shift.end_time.map(encode_time);
    let client_str   = shift.client_id.map(encode_uuid);
    let location_str = shift.location_id.map(encode_uuid);
    let status_str   = shift.status.to_string();
    let Shift { title, slots, claimable, shift_code, notes, .. } = shift;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE shifts SET
             title = ?3, date = ?4, start_time = ?5, end_time = ?6,
             client_id = ?7, location_id = ?8, slots = ?9, claimable = ?10,
             status = ?11, shift_code = ?12, notes = ?13
           WHERE tenant_id = ?1 AND shift_id = ?2",
          rusqlite::params![
            tenant_str,
            id_str,
            title,
            date_str,
            start_str,
            end_str,
            client_str,
            location_str,
            slots,
            claimable,
            status_str,
            shift_code,
            notes,
          ],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn list_shifts(&self, tenant_id: Uuid, span: DateSpan) -> Result<Vec<Shift>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {SHIFT_COLUMNS} FROM shifts s
           WHERE s.tenant_id = ?1 AND s.date BETWEEN ?2 AND ?3
           ORDER BY s.date, s.start_time, s.created_at"
        ),
        vec![encode_uuid(tenant_id), encode_date(span.from()), encode_date(span.to())],
        RawShift::from_row,
      )
      .await?;
    raws.into_iter().map(RawShift::into_shift).collect()
  }

  async fn find_shifts_by_code(
    &self,
    tenant_id: Uuid,
    code: String,
    date: NaiveDate,
  ) -> Result<Vec<Shift>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {SHIFT_COLUMNS} FROM shifts s
           WHERE s.tenant_id = ?1 AND s.shift_code = ?2 AND s.date = ?3
           ORDER BY s.start_time, s.created_at"
        ),
        vec![encode_uuid(tenant_id), code, encode_date(date)],
        RawShift::from_row,
      )
      .await?;
    raws.into_iter().map(RawShift::into_shift).collect()
  }

  async fn list_import_shifts(&self, tenant_id: Uuid, tag: String) -> Result<Vec<Shift>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {SHIFT_COLUMNS} FROM shifts s
           WHERE s.tenant_id = ?1 AND s.import_tag = ?2
           ORDER BY s.date, s.start_time, s.created_at"
        ),
        vec![encode_uuid(tenant_id), tag],
        RawShift::from_row,
      )
      .await?;
    raws.into_iter().map(RawShift::into_shift).collect()
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn add_assignment(&self, input: NewAssignment) -> Result<Assignment> {
    let assignment = Assignment {
      assignment_id: Uuid::new_v4(),
      tenant_id:     input.tenant_id,
      shift_id:      input.shift_id,
      employee_id:   input.employee_id,
      status:        input.status,
      import_tag:    input.import_tag,
      created_at:    Utc::now(),
    };

    let id_str       = encode_uuid(assignment.assignment_id);
    let tenant_str   = encode_uuid(assignment.tenant_id);
    let shift_str    = encode_uuid(assignment.shift_id);
    let employee_str = encode_uuid(assignment.employee_id);
    let status_str   = assignment.status.to_string();
    let import_tag   = assignment.import_tag.clone();
    let at_str       = encode_dt(assignment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assignments (
             assignment_id, tenant_id, shift_id, employee_id, status, import_tag, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            tenant_str,
            shift_str,
            employee_str,
            status_str,
            import_tag,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(assignment)
  }

  async fn get_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
  ) -> Result<Option<Assignment>> {
    let raw = self
      .fetch_one(
        format!(
          "SELECT {ASSIGNMENT_COLUMNS} FROM assignments a
           WHERE a.tenant_id = ?1 AND a.assignment_id = ?2"
        ),
        vec![encode_uuid(tenant_id), encode_uuid(assignment_id)],
        RawAssignment::from_row,
      )
      .await?;
    raw.map(RawAssignment::into_assignment).transpose()
  }

  async fn set_assignment_status(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
    status: AssignmentStatus,
  ) -> Result<bool> {
    let changed = self
      .execute(
        "UPDATE assignments SET status = ?3 WHERE tenant_id = ?1 AND assignment_id = ?2",
        vec![encode_uuid(tenant_id), encode_uuid(assignment_id), status.to_string()],
      )
      .await?;
    Ok(changed > 0)
  }

  async fn delete_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
  ) -> Result<Option<Assignment>> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str     = encode_uuid(assignment_id);

    let raw: Option<RawAssignment> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(
            &format!(
              "SELECT {ASSIGNMENT_COLUMNS} FROM assignments a
               WHERE a.tenant_id = ?1 AND a.assignment_id = ?2"
            ),
            rusqlite::params![tenant_str, id_str],
            RawAssignment::from_row,
          )
          .optional()?;
        if raw.is_some() {
          tx.execute(
            "DELETE FROM assignments WHERE tenant_id = ?1 AND assignment_id = ?2",
            rusqlite::params![tenant_str, id_str],
          )?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawAssignment::into_assignment).transpose()
  }

  async fn list_shift_assignments(
    &self,
    tenant_id: Uuid,
    shift_id: Uuid,
  ) -> Result<Vec<Assignment>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {ASSIGNMENT_COLUMNS} FROM assignments a
           WHERE a.tenant_id = ?1 AND a.shift_id = ?2
           ORDER BY a.created_at"
        ),
        vec![encode_uuid(tenant_id), encode_uuid(shift_id)],
        RawAssignment::from_row,
      )
      .await?;
    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }

  async fn list_employee_shifts(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    date: NaiveDate,
  ) -> Result<Vec<AssignedShift>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {ASSIGNMENT_COLUMNS}, {SHIFT_COLUMNS}
           FROM assignments a JOIN shifts s ON s.shift_id = a.shift_id
           WHERE a.tenant_id = ?1 AND a.employee_id = ?2 AND s.date = ?3
           ORDER BY s.start_time"
        ),
        vec![encode_uuid(tenant_id), encode_uuid(employee_id), encode_date(date)],
        |row| {
          Ok((RawAssignment::from_row(row)?, RawShift::from_row_at(row, ASSIGNMENT_COLUMN_COUNT)?))
        },
      )
      .await?;

    raws
      .into_iter()
      .map(|(a, s)| {
        Ok(AssignedShift { assignment: a.into_assignment()?, shift: s.into_shift()? })
      })
      .collect()
  }

  async fn list_assignments(&self, tenant_id: Uuid, span: DateSpan) -> Result<Vec<Assignment>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {ASSIGNMENT_COLUMNS}
           FROM assignments a JOIN shifts s ON s.shift_id = a.shift_id
           WHERE a.tenant_id = ?1 AND s.date BETWEEN ?2 AND ?3
           ORDER BY s.date, s.start_time, a.created_at"
        ),
        vec![encode_uuid(tenant_id), encode_date(span.from()), encode_date(span.to())],
        RawAssignment::from_row,
      )
      .await?;
    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }

  // ── Time entries ──────────────────────────────────────────────────────────

  async fn add_time_entry(&self, input: NewTimeEntry) -> Result<TimeEntry> {
    let entry = TimeEntry {
      entry_id:      Uuid::new_v4(),
      tenant_id:     input.tenant_id,
      employee_id:   input.employee_id,
      shift_id:      input.shift_id,
      client_id:     input.client_id,
      clock_in:      input.clock_in,
      clock_out:     input.clock_out,
      break_minutes: input.break_minutes,
      status:        input.status,
      notes:         input.notes,
      import_tag:    input.import_tag,
      created_at:    Utc::now(),
    };

    self.insert_time_entry(&entry).await?;
    Ok(entry)
  }

  async fn get_time_entry(&self, tenant_id: Uuid, entry_id: Uuid) -> Result<Option<TimeEntry>> {
    let raw = self
      .fetch_one(
        format!(
          "SELECT {ENTRY_COLUMNS} FROM time_entries e WHERE e.tenant_id = ?1 AND e.entry_id = ?2"
        ),
        vec![encode_uuid(tenant_id), encode_uuid(entry_id)],
        RawTimeEntry::from_row,
      )
      .await?;
    raw.map(RawTimeEntry::into_entry).transpose()
  }

  async fn update_time_entry(&self, entry: TimeEntry) -> Result<bool> {
    let tenant_str = encode_uuid(entry.tenant_id);
    let id_str     = encode_uuid(entry.entry_id);
    let shift_str  = entry.shift_id.map(encode_uuid);
    let client_str = entry.client_id.map(encode_uuid);
    let in_str     = encode_local(entry.clock_in);
    let out_str    = entry.clock_out.map(encode_local);
    let status_str = entry.status.to_string();
    let TimeEntry { break_minutes, notes, .. } = entry;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE time_entries SET
             shift_id = ?3, client_id = ?4, clock_in = ?5, clock_out = ?6,
             break_minutes = ?7, status = ?8, notes = ?9
           WHERE tenant_id = ?1 AND entry_id = ?2",
          rusqlite::params![
            tenant_str,
            id_str,
            shift_str,
            client_str,
            in_str,
            out_str,
            break_minutes,
            status_str,
            notes,
          ],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn open_time_entry(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
  ) -> Result<Option<TimeEntry>> {
    let raw = self
      .fetch_one(
        format!(
          "SELECT {ENTRY_COLUMNS} FROM time_entries e
           WHERE e.tenant_id = ?1 AND e.employee_id = ?2 AND e.clock_out IS NULL"
        ),
        vec![encode_uuid(tenant_id), encode_uuid(employee_id)],
        RawTimeEntry::from_row,
      )
      .await?;
    raw.map(RawTimeEntry::into_entry).transpose()
  }

  async fn list_employee_entries(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    from: NaiveDateTime,
    to: NaiveDateTime,
  ) -> Result<Vec<TimeEntry>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {ENTRY_COLUMNS} FROM time_entries e
           WHERE e.tenant_id = ?1 AND e.employee_id = ?2
             AND e.clock_in < ?4 AND (e.clock_out IS NULL OR e.clock_out > ?3)
           ORDER BY e.clock_in"
        ),
        vec![encode_uuid(tenant_id), encode_uuid(employee_id), encode_local(from), encode_local(to)],
        RawTimeEntry::from_row,
      )
      .await?;
    raws.into_iter().map(RawTimeEntry::into_entry).collect()
  }

  async fn list_shift_entries(&self, tenant_id: Uuid, span: DateSpan) -> Result<Vec<TimeEntry>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {ENTRY_COLUMNS}
           FROM time_entries e JOIN shifts s ON s.shift_id = e.shift_id
           WHERE e.tenant_id = ?1 AND s.date BETWEEN ?2 AND ?3
           ORDER BY e.clock_in"
        ),
        vec![encode_uuid(tenant_id), encode_date(span.from()), encode_date(span.to())],
        RawTimeEntry::from_row,
      )
      .await?;
    raws.into_iter().map(RawTimeEntry::into_entry).collect()
  }

  // ── Tickets ───────────────────────────────────────────────────────────────

  async fn add_ticket(&self, input: NewTicket) -> Result<Option<DiscrepancyTicket>> {
    let ticket = DiscrepancyTicket {
      ticket_id:   Uuid::new_v4(),
      tenant_id:   input.tenant_id,
      shift_id:    input.shift_id,
      employee_id: input.employee_id,
      kind:        input.kind,
      description: input.description,
      status:      TicketStatus::New,
      created_at:  Utc::now(),
    };

    let inserted = self
      .execute(
        "INSERT INTO tickets (
           ticket_id, tenant_id, shift_id, employee_id, kind, description, status, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT (shift_id, employee_id, kind) DO NOTHING",
        vec![
          encode_uuid(ticket.ticket_id),
          encode_uuid(ticket.tenant_id),
          encode_uuid(ticket.shift_id),
          encode_uuid(ticket.employee_id),
          ticket.kind.to_string(),
          ticket.description.clone(),
          ticket.status.to_string(),
          encode_dt(ticket.created_at),
        ],
      )
      .await?;

    Ok((inserted > 0).then_some(ticket))
  }

  async fn list_tickets(
    &self,
    tenant_id: Uuid,
    span: Option<DateSpan>,
  ) -> Result<Vec<DiscrepancyTicket>> {
    let mut params = vec![encode_uuid(tenant_id)];
    let filter = match span {
      Some(span) => {
        params.push(encode_date(span.from()));
        params.push(encode_date(span.to()));
        "AND s.date BETWEEN ?2 AND ?3"
      }
      None => "",
    };

    let raws = self
      .fetch_all(
        format!(
          "SELECT {TICKET_COLUMNS}
           FROM tickets t JOIN shifts s ON s.shift_id = t.shift_id
           WHERE t.tenant_id = ?1 {filter}
           ORDER BY s.date, s.start_time, t.created_at"
        ),
        params,
        RawTicket::from_row,
      )
      .await?;
    raws.into_iter().map(RawTicket::into_ticket).collect()
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn add_notification(&self, input: NewNotification) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      tenant_id:       input.tenant_id,
      recipient_id:    input.recipient_id,
      recipient_type:  input.recipient_type,
      kind:            input.kind,
      title:           input.title,
      body:            input.body,
      metadata:        input.metadata,
      created_at:      Utc::now(),
    };

    self
      .execute(
        "INSERT INTO notifications (
           notification_id, tenant_id, recipient_id, recipient_type, kind,
           title, body, metadata, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        vec![
          encode_uuid(notification.notification_id),
          encode_uuid(notification.tenant_id),
          encode_uuid(notification.recipient_id),
          notification.recipient_type.to_string(),
          notification.kind.to_string(),
          notification.title.clone(),
          notification.body.clone(),
          serde_json::to_string(&notification.metadata)?,
          encode_dt(notification.created_at),
        ],
      )
      .await?;
    Ok(notification)
  }

  async fn list_notifications(
    &self,
    tenant_id: Uuid,
    recipient_id: Uuid,
  ) -> Result<Vec<Notification>> {
    let raws = self
      .fetch_all(
        format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications
           WHERE tenant_id = ?1 AND recipient_id = ?2
           ORDER BY created_at DESC, rowid DESC"
        ),
        vec![encode_uuid(tenant_id), encode_uuid(recipient_id)],
        RawNotification::from_row,
      )
      .await?;
    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  // ── Imports ───────────────────────────────────────────────────────────────

  async fn purge_import(
    &self,
    tenant_id: Uuid,
    tag: String,
    keep_shifts: Vec<Uuid>,
  ) -> Result<PurgeReport> {
    let tenant_str = encode_uuid(tenant_id);
    let keep: Vec<String> = keep_shifts.into_iter().map(encode_uuid).collect();

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let doomed: Vec<String> = {
          let mut stmt =
            tx.prepare("SELECT shift_id FROM shifts WHERE tenant_id = ?1 AND import_tag = ?2")?;
          let ids = stmt
            .query_map(rusqlite::params![tenant_str, tag], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          ids.into_iter().filter(|id| !keep.contains(id)).collect()
        };

        let mut assignments = tx.execute(
          "DELETE FROM assignments WHERE tenant_id = ?1 AND import_tag = ?2",
          rusqlite::params![tenant_str, tag],
        )?;
        let time_entries = tx.execute(
          "DELETE FROM time_entries WHERE tenant_id = ?1 AND import_tag = ?2",
          rusqlite::params![tenant_str, tag],
        )?;
        let mut shifts = 0;
        for shift_id in &doomed {
          assignments += tx.execute(
            "DELETE FROM assignments WHERE tenant_id = ?1 AND shift_id = ?2",
            rusqlite::params![tenant_str, shift_id],
          )?;
          shifts += tx.execute(
            "DELETE FROM shifts WHERE tenant_id = ?1 AND shift_id = ?2",
            rusqlite::params![tenant_str, shift_id],
          )?;
        }
        tx.commit()?;
        Ok(PurgeReport { shifts, assignments, time_entries })
      })
      .await?;
    Ok(report)
  }
}

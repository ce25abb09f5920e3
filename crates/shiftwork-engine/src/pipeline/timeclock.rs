//! Time-clock import: one time entry per session row, linked to the shift
//! whose external code and date match.

use std::collections::HashMap;

use shiftwork_core::{
  StoreError as _,
  attendance::{EntryStatus, NewTimeEntry},
  people::name_key,
  store::ScheduleStore,
  time::{DateSpan, sessions_overlap},
};
use shiftwork_import::{TimeClockRow, TimeClockSheet, read_timeclock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
  ImportKey, ImportKind, ImportOptions, ImportPreview, ImportSummary, resolve_clients,
  resolve_employees,
};
use crate::{Engine, Error, Result, conflict::has_attendance_overlap, resolver::Resolver};

impl<S: ScheduleStore> Engine<S> {
  /// Import a time-clock export covering `span`, replacing any earlier run
  /// over the same span.
  pub async fn import_timeclock(
    &self,
    tenant_id: Uuid,
    span: DateSpan,
    input: &[u8],
    options: ImportOptions,
  ) -> Result<ImportSummary> {
    let (key, sheet) = self.read_timeclock_sheet(span, input)?;
    let tag = key.tag();
    let mut summary = ImportSummary::new(&key, sheet.total_rows, sheet.rejected.clone());

    let purged = self
      .store
      .purge_import(tenant_id, tag.clone(), Vec::new())
      .await
      .map_err(Error::store)?;
    summary.replaced_rows = purged.total();

    let mut resolver = Resolver::load(self.store(), tenant_id, &self.denylist).await?;
    let names = sheet.employee_names();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let clients =
      resolve_clients(&mut resolver, &sheet.client_labels(), options.auto_create, &mut summary)
        .await;
    let employees =
      resolve_employees(&mut resolver, &names, options.auto_create, &mut summary).await;

    for row in &sheet.rows {
      let Some(&employee_id) = employees.get(&name_key(&row.employee_name())) else {
        continue;
      };
      self.import_session(tenant_id, &tag, row, employee_id, &clients, &mut summary).await;
    }

    self.emit_import_events(tenant_id, &summary);
    info!(
      %tag,
      entries = summary.created_time_entries,
      linked = summary.linked_to_shift,
      skipped_overlap = summary.skipped_overlap,
      rejected = summary.rejected_rows,
      failed = summary.failed_writes,
      "time-clock import finished"
    );
    Ok(summary)
  }

  /// Parse and resolve a time-clock export without provisioning or writing.
  /// `links` counts sessions whose shift code matches an existing shift.
  pub async fn preview_timeclock(
    &self,
    tenant_id: Uuid,
    span: DateSpan,
    input: &[u8],
  ) -> Result<ImportPreview> {
    let (key, sheet) = self.read_timeclock_sheet(span, input)?;
    let mut summary = ImportSummary::new(&key, sheet.total_rows, sheet.rejected.clone());

    let mut resolver = Resolver::load(self.store(), tenant_id, &self.denylist).await?;
    let names = sheet.employee_names();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    resolve_clients(&mut resolver, &sheet.client_labels(), false, &mut summary).await;
    resolve_employees(&mut resolver, &names, false, &mut summary).await;

    let mut links = 0;
    for row in &sheet.rows {
      if self.linked_shift(tenant_id, row, None).await?.is_some() {
        links += 1;
      }
    }

    Ok(ImportPreview { candidates: sheet.rows.len(), links, ..summary.into() })
  }

  fn read_timeclock_sheet(
    &self,
    span: DateSpan,
    input: &[u8],
  ) -> Result<(ImportKey, TimeClockSheet)> {
    let mut sheet = read_timeclock(input, &self.limits)?;
    sheet.retain_dates(|d| span.contains(d));
    Ok((ImportKey::new(ImportKind::Timeclock, span), sheet))
  }

  /// The shift whose code and date match the session's scheduled title.
  ///
  /// When several shifts share the code on that date, prefer one the
  /// employee is actively assigned to, then one whose planned window
  /// overlaps the session, then the earliest.
  async fn linked_shift(
    &self,
    tenant_id: Uuid,
    row: &TimeClockRow,
    employee_id: Option<Uuid>,
  ) -> Result<Option<Uuid>> {
    let Some(code) = row.shift_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
      return Ok(None);
    };
    let candidates = self
      .store
      .find_shifts_by_code(tenant_id, code.to_string(), row.date())
      .await
      .map_err(Error::store)?;
    if candidates.len() < 2 {
      return Ok(candidates.first().map(|s| s.shift_id));
    }

    if let Some(employee_id) = employee_id {
      let booked = self
        .store
        .list_employee_shifts(tenant_id, employee_id, row.date())
        .await
        .map_err(Error::store)?;
      let assigned = candidates.iter().find(|c| {
        booked
          .iter()
          .any(|b| b.shift.shift_id == c.shift_id && b.assignment.status.is_active())
      });
      if let Some(shift) = assigned {
        return Ok(Some(shift.shift_id));
      }
    }

    let overlapping = candidates.iter().find(|c| {
      let (start, end) = c.window();
      sessions_overlap(start, Some(end), row.clock_in, row.clock_out)
    });
    Ok(overlapping.or(candidates.first()).map(|s| s.shift_id))
  }

  async fn import_session(
    &self,
    tenant_id: Uuid,
    tag: &str,
    row: &TimeClockRow,
    employee_id: Uuid,
    clients: &HashMap<String, Uuid>,
    summary: &mut ImportSummary,
  ) {
    let shift_id = match self.linked_shift(tenant_id, row, Some(employee_id)).await {
      Ok(id) => id,
      Err(e) => {
        warn!(line = row.line, error = %e, "shift lookup failed");
        None
      }
    };

    match has_attendance_overlap(self.store(), tenant_id, employee_id, row.clock_in, row.clock_out, None)
      .await
    {
      Ok(Some(other)) => {
        debug!(line = row.line, entry_id = %other.entry_id, "session overlaps recorded attendance");
        summary.skipped_overlap += 1;
        return;
      }
      Ok(None) => {}
      Err(e) => {
        warn!(line = row.line, error = %e, "attendance overlap check failed");
        summary.failed_writes += 1;
        return;
      }
    }

    let input = NewTimeEntry {
      tenant_id,
      employee_id,
      shift_id,
      client_id: row.client_label.as_deref().and_then(|l| clients.get(&name_key(l)).copied()),
      clock_in: row.clock_in,
      clock_out: row.clock_out,
      break_minutes: row.break_minutes(),
      status: EntryStatus::Pending,
      notes: row.sub_item.clone(),
      import_tag: Some(tag.to_string()),
    };
    match self.store.add_time_entry(input).await {
      Ok(_) => {
        summary.created_time_entries += 1;
        if shift_id.is_some() {
          summary.linked_to_shift += 1;
        }
      }
      Err(e) if e.is_constraint_violation() => summary.skipped_overlap += 1,
      Err(e) => {
        warn!(line = row.line, error = %e, "time entry insert failed");
        summary.failed_writes += 1;
      }
    }
  }
}

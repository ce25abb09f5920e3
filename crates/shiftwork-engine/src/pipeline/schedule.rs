//! Schedule import: one shift per group, one accepted assignment per listed
//! employee, guarded against double-booking.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use shiftwork_core::{
  StoreError as _,
  assignment::{AssignmentStatus, NewAssignment},
  events::{ChangeOp, EntityKind},
  people::name_key,
  shift::{NewShift, Shift, ShiftStatus},
  store::ScheduleStore,
  time::DateSpan,
};
use shiftwork_import::{ScheduleSheet, ShiftGroup, read_schedule};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
  ImportKey, ImportKind, ImportOptions, ImportPreview, ImportSummary, resolve_clients,
  resolve_employees,
};
use crate::{Engine, Error, Result, conflict::has_conflict, resolver::Resolver};

impl<S: ScheduleStore> Engine<S> {
  /// Import a schedule export covering `span`, replacing any earlier run
  /// over the same span.
  ///
  /// A shift from the earlier run with the same title, date, times and
  /// client is reused in place, so attendance linked to it and tickets
  /// raised against it survive the re-import. Only its imported
  /// assignments are rewritten.
  ///
  /// Only file-level problems fail the run; everything else is counted in
  /// the returned summary.
  pub async fn import_schedule(
    &self,
    tenant_id: Uuid,
    span: DateSpan,
    input: &[u8],
    options: ImportOptions,
  ) -> Result<ImportSummary> {
    let (key, sheet) = self.read_schedule_sheet(span, input)?;
    let tag = key.tag();
    let mut summary = ImportSummary::new(&key, sheet.total_rows, sheet.rejected.clone());
    summary.availability_overrides = sheet.availability_overrides.clone();

    let mut resolver = Resolver::load(self.store(), tenant_id, &self.denylist).await?;
    let provision = options.auto_create;

    let clients =
      resolve_clients(&mut resolver, &sheet.client_labels(), provision, &mut summary).await;
    let locations = self.resolve_sites(&mut resolver, &sheet, provision, &mut summary).await;
    let employees =
      resolve_employees(&mut resolver, &sheet.employee_names(), provision, &mut summary).await;

    let drafts: Vec<NewShift> = sheet
      .groups
      .iter()
      .map(|group| group_shift(tenant_id, &tag, group, &clients, &locations))
      .collect();

    let mut previous: HashMap<ShiftIdentity, Vec<Shift>> = HashMap::new();
    for shift in self
      .store
      .list_import_shifts(tenant_id, tag.clone())
      .await
      .map_err(Error::store)?
    {
      previous.entry(ShiftIdentity::of_shift(&shift)).or_default().push(shift);
    }
    let reused: Vec<Option<Shift>> = drafts
      .iter()
      .map(|draft| {
        let candidates = previous.get_mut(&ShiftIdentity::of_draft(draft))?;
        (!candidates.is_empty()).then(|| candidates.remove(0))
      })
      .collect();
    let keep = reused.iter().flatten().map(|s| s.shift_id).collect();

    let purged = self
      .store
      .purge_import(tenant_id, tag.clone(), keep)
      .await
      .map_err(Error::store)?;
    summary.replaced_rows = purged.total();
    if purged.total() > 0 {
      debug!(%tag, shifts = purged.shifts, assignments = purged.assignments, "replaced previous run");
    }

    for ((group, draft), existing) in sheet.groups.iter().zip(drafts).zip(reused) {
      self
        .import_group(tenant_id, &tag, group, draft, existing, &employees, &mut summary)
        .await;
    }

    self.emit_import_events(tenant_id, &summary);
    info!(
      %tag,
      shifts = summary.created_shifts,
      reused = summary.reused_shifts,
      assignments = summary.created_assignments,
      skipped_overlap = summary.skipped_overlap,
      rejected = summary.rejected_rows,
      failed = summary.failed_writes,
      "schedule import finished"
    );
    Ok(summary)
  }

  /// Parse and resolve a schedule export without provisioning or writing.
  pub async fn preview_schedule(
    &self,
    tenant_id: Uuid,
    span: DateSpan,
    input: &[u8],
  ) -> Result<ImportPreview> {
    let (key, sheet) = self.read_schedule_sheet(span, input)?;
    let mut summary = ImportSummary::new(&key, sheet.total_rows, sheet.rejected.clone());
    summary.availability_overrides = sheet.availability_overrides.clone();

    let mut resolver = Resolver::load(self.store(), tenant_id, &self.denylist).await?;
    resolve_clients(&mut resolver, &sheet.client_labels(), false, &mut summary).await;
    resolve_employees(&mut resolver, &sheet.employee_names(), false, &mut summary).await;

    Ok(ImportPreview {
      candidates: sheet.groups.len(),
      links: sheet.groups.iter().map(|g| g.employees.len()).sum(),
      ..summary.into()
    })
  }

  fn read_schedule_sheet(&self, span: DateSpan, input: &[u8]) -> Result<(ImportKey, ScheduleSheet)> {
    let mut sheet = read_schedule(input, &self.limits)?;
    sheet.retain_dates(|d| span.contains(d));
    Ok((ImportKey::new(ImportKind::Schedule, span), sheet))
  }

  async fn resolve_sites(
    &self,
    resolver: &mut Resolver<'_, S>,
    sheet: &ScheduleSheet,
    provision: bool,
    summary: &mut ImportSummary,
  ) -> HashMap<String, Uuid> {
    let mut out = HashMap::new();
    for site in sheet.sites() {
      let id = match resolver.resolve_location(&site.name) {
        Some(id) => Some(id),
        None if provision => {
          match resolver.provision_location(&site.name, site.address.as_deref()).await {
            Ok(p) => {
              if p.is_some_and(|p| p.is_created()) {
                summary.created_locations += 1;
              }
              p.map(|p| p.id())
            }
            Err(e) => {
              warn!(site = %site.name, error = %e, "location provisioning failed");
              summary.failed_writes += 1;
              None
            }
          }
        }
        None => None,
      };
      if let Some(id) = id {
        out.insert(name_key(&site.name), id);
      }
    }
    out
  }

  #[allow(clippy::too_many_arguments)]
  async fn import_group(
    &self,
    tenant_id: Uuid,
    tag: &str,
    group: &ShiftGroup,
    draft: NewShift,
    existing: Option<Shift>,
    employees: &HashMap<String, Uuid>,
    summary: &mut ImportSummary,
  ) {
    let key = &group.key;
    let shift = match existing {
      Some(previous) => {
        let shift = refresh(previous, draft);
        match self.store.update_shift(shift.clone()).await {
          Ok(true) => summary.reused_shifts += 1,
          Ok(false) => {
            warn!(title = %key.title, date = %key.date, "reused shift vanished");
            summary.failed_writes += 1;
            return;
          }
          Err(e) => {
            warn!(title = %key.title, date = %key.date, error = %e, "shift refresh failed");
            summary.failed_writes += 1;
            return;
          }
        }
        shift
      }
      None => match self.store.add_shift(draft).await {
        Ok(shift) => {
          summary.created_shifts += 1;
          shift
        }
        Err(e) => {
          warn!(title = %key.title, date = %key.date, error = %e, "shift insert failed");
          summary.failed_writes += 1;
          return;
        }
      },
    };

    let range = shift.range();
    for name in &group.employees {
      let Some(&employee_id) = employees.get(&name_key(name)) else {
        continue;
      };

      match has_conflict(self.store(), tenant_id, employee_id, shift.date, range, Some(shift.shift_id))
        .await
      {
        Ok(Some(other)) => {
          debug!(employee = %name, shift_id = %other.shift_id, "assignment blocked by overlap");
          summary.skipped_overlap += 1;
          continue;
        }
        Ok(None) => {}
        Err(e) => {
          warn!(employee = %name, error = %e, "conflict check failed");
          summary.failed_writes += 1;
          continue;
        }
      }

      let mut assignment =
        NewAssignment::new(tenant_id, shift.shift_id, employee_id, AssignmentStatus::Accepted);
      assignment.import_tag = Some(tag.to_string());
      match self.store.add_assignment(assignment).await {
        Ok(_) => summary.created_assignments += 1,
        Err(e) if e.is_constraint_violation() => summary.skipped_overlap += 1,
        Err(e) => {
          warn!(employee = %name, error = %e, "assignment insert failed");
          summary.failed_writes += 1;
        }
      }
    }
  }

  /// One bulk event per entity kind the run touched.
  pub(super) fn emit_import_events(&self, tenant_id: Uuid, summary: &ImportSummary) {
    let touched = [
      (EntityKind::Employee, summary.created_employees),
      (EntityKind::Client, summary.created_clients),
      (EntityKind::Location, summary.created_locations),
      (EntityKind::Shift, summary.created_shifts + summary.reused_shifts + summary.replaced_rows),
      (EntityKind::Assignment, summary.created_assignments + summary.replaced_rows),
      (EntityKind::TimeEntry, summary.created_time_entries + summary.replaced_rows),
    ];
    for (entity, count) in touched {
      if count > 0 {
        self.emit_bulk(tenant_id, entity, ChangeOp::Updated);
      }
    }
  }
}

/// What makes a re-imported group the same shift as one from an earlier
/// run under the same tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShiftIdentity {
  title:      String,
  date:       NaiveDate,
  start_time: Option<NaiveTime>,
  end_time:   Option<NaiveTime>,
  client_id:  Option<Uuid>,
}

impl ShiftIdentity {
  fn of_shift(shift: &Shift) -> Self {
    Self {
      title:      shift.title.clone(),
      date:       shift.date,
      start_time: shift.start_time,
      end_time:   shift.end_time,
      client_id:  shift.client_id,
    }
  }

  fn of_draft(draft: &NewShift) -> Self {
    Self {
      title:      draft.title.clone(),
      date:       draft.date,
      start_time: draft.start_time,
      end_time:   draft.end_time,
      client_id:  draft.client_id,
    }
  }
}

/// The shift a group describes, before it is written.
fn group_shift(
  tenant_id: Uuid,
  tag: &str,
  group: &ShiftGroup,
  clients: &HashMap<String, Uuid>,
  locations: &HashMap<String, Uuid>,
) -> NewShift {
  let key = &group.key;
  NewShift {
    tenant_id,
    title: key.title.clone(),
    date: key.date,
    start_time: key.start_time,
    end_time: key.end_time,
    client_id: clients.get(&name_key(&key.client_label)).copied(),
    location_id: group.site.as_ref().and_then(|s| locations.get(&name_key(&s.name)).copied()),
    slots: u32::try_from(group.employees.len()).unwrap_or(u32::MAX).max(1),
    claimable: false,
    status: ShiftStatus::Published,
    shift_code: Some(key.title.clone()),
    notes: group.notes.clone(),
    import_tag: Some(tag.to_string()),
  }
}

/// Overwrite a reused shift with the values the new export carries.
fn refresh(previous: Shift, draft: NewShift) -> Shift {
  Shift {
    title: draft.title,
    date: draft.date,
    start_time: draft.start_time,
    end_time: draft.end_time,
    client_id: draft.client_id,
    location_id: draft.location_id,
    slots: draft.slots,
    claimable: draft.claimable,
    status: draft.status,
    shift_code: draft.shift_code,
    notes: draft.notes,
    import_tag: draft.import_tag,
    ..previous
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use shiftwork_core::people::NewEmployee;

  use super::*;
  use crate::testing::engine;

  const HEADER: &str =
    "Date,Start,End,Shift title,Job,Sub item,Address,Users,Availability status,Shift tags,Note,Last Status\n";

  fn csv(rows: &str) -> Vec<u8> { format!("{HEADER}{rows}").into_bytes() }

  fn week() -> DateSpan {
    DateSpan::new(
      NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
      NaiveDate::from_ymd_opt(2026, 2, 22).unwrap(),
    )
    .unwrap()
  }

  const AUTO: ImportOptions = ImportOptions { auto_create: true };

  #[tokio::test]
  async fn new_client_provisioned_for_known_employee() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let juan = engine
      .store()
      .add_employee(tenant, NewEmployee::new("Juan", "Perez"))
      .await
      .unwrap();

    let input =
      csv("02/18/2026 Wed,08:00am,05:00pm,Morning,02 - ELY PRODUCCION,,,Juan Perez,,,,\n");
    let summary = engine.import_schedule(tenant, week(), &input, AUTO).await.unwrap();

    assert_eq!(summary.created_clients, 1);
    assert_eq!(summary.created_shifts, 1);
    assert_eq!(summary.created_assignments, 1);
    assert!(summary.unmatched_employees.is_empty());
    assert_eq!(summary.created_employees, 0);

    let shifts = engine.store().list_shifts(tenant, week()).await.unwrap();
    let shift = &shifts[0];
    assert_eq!(shift.status, ShiftStatus::Published);
    assert_eq!(shift.shift_code.as_deref(), Some("Morning"));
    assert_eq!(shift.slots, 1);
    let clients = engine.store().list_clients(tenant).await.unwrap();
    assert_eq!(clients[0].name, "ELY PRODUCCION");
    assert_eq!(shift.client_id, Some(clients[0].client_id));

    let assignments = engine.store().list_shift_assignments(tenant, shift.shift_id).await.unwrap();
    assert_eq!(assignments[0].employee_id, juan.employee_id);
    assert_eq!(assignments[0].status, AssignmentStatus::Accepted);
  }

  #[tokio::test]
  async fn overlapping_rows_for_one_employee_assign_once() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let input = csv(concat!(
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
      "02/18/2026,11:00am,03:00pm,Midday,Acme,,,Ana Lopez,,,,\n",
    ));

    let summary = engine.import_schedule(tenant, week(), &input, AUTO).await.unwrap();
    assert_eq!(summary.created_shifts, 2);
    assert_eq!(summary.created_assignments, 1);
    assert_eq!(summary.skipped_overlap, 1);
    assert_eq!(summary.created_employees, 1);
  }

  #[tokio::test]
  async fn rerun_converges_on_same_rows() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let input = csv(concat!(
      "02/18/2026,08:00am,12:00pm,Morning,Acme,Line 2,,Ana Lopez,,,,\n",
      "02/18/2026,08:00am,12:00pm,Morning,Acme,Line 2,,Juan Perez,,,,\n",
      "02/19/2026,All Day,All Day,Inventory,Acme,,,Juan Perez,,,,\n",
    ));

    let first = engine.import_schedule(tenant, week(), &input, AUTO).await.unwrap();
    let second = engine.import_schedule(tenant, week(), &input, AUTO).await.unwrap();

    assert_eq!(first.created_shifts, 2);
    assert_eq!(first.created_assignments, 3);
    assert_eq!(first.created_locations, 1);
    assert_eq!(second.created_shifts, 0);
    assert_eq!(second.reused_shifts, 2);
    assert_eq!(second.created_assignments, first.created_assignments);
    assert_eq!(second.created_employees, 0);
    assert_eq!(second.created_clients, 0);
    assert_eq!(second.created_locations, 0);
    assert_eq!(second.replaced_rows, 3);
    assert_eq!(second.skipped_overlap, 0);

    let store = engine.store();
    assert_eq!(store.list_import_shifts(tenant, first.tag.clone()).await.unwrap().len(), 2);
    assert_eq!(store.list_shifts(tenant, week()).await.unwrap().len(), 2);
    assert_eq!(store.list_assignments(tenant, week()).await.unwrap().len(), 3);
    assert_eq!(store.list_employees(tenant, false).await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn changed_rows_replace_only_their_shift() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let first = csv(concat!(
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
      "02/19/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
    ));
    let moved = csv(concat!(
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,Bring gloves,\n",
      "02/19/2026,09:00am,01:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
    ));
    engine.import_schedule(tenant, week(), &first, AUTO).await.unwrap();
    let before = engine.store().list_shifts(tenant, week()).await.unwrap();

    let summary = engine.import_schedule(tenant, week(), &moved, AUTO).await.unwrap();
    assert_eq!(summary.reused_shifts, 1);
    assert_eq!(summary.created_shifts, 1);
    assert_eq!(summary.replaced_rows, 2 + 1);

    let after = engine.store().list_shifts(tenant, week()).await.unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(after[0].shift_id, before[0].shift_id);
    assert_eq!(after[0].notes.as_deref(), Some("Bring gloves"));
    assert_ne!(after[1].shift_id, before[1].shift_id);
    assert_eq!(after[1].start_time, chrono::NaiveTime::from_hms_opt(9, 0, 0));
  }

  #[tokio::test]
  async fn reimport_keeps_attendance_links_and_tickets() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let schedule = csv(concat!(
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Juan Perez,,,,\n",
    ));
    let timeclock = concat!(
      "First name,Last name,Type,Sub item,Start Date,In,End Date,Out,Shift hours,Scheduled shift title\n",
      "Ana,Lopez,Acme,,02/18/2026 Wed,08:00am,,12:00pm,4,Morning\n",
    );
    let options = crate::coverage::ReconcileOptions::default();

    engine.import_schedule(tenant, week(), &schedule, AUTO).await.unwrap();
    let clocked = engine
      .import_timeclock(tenant, week(), timeclock.as_bytes(), AUTO)
      .await
      .unwrap();
    assert_eq!(clocked.linked_to_shift, 1);

    let report = engine.reconcile(tenant, week(), options).await.unwrap();
    assert_eq!(report.overall_percent, 50.0);
    assert_eq!(report.tickets_created, 1);

    let again = engine.import_schedule(tenant, week(), &schedule, AUTO).await.unwrap();
    assert_eq!(again.reused_shifts, 1);
    assert_eq!(again.created_shifts, 0);

    let report = engine.reconcile(tenant, week(), options).await.unwrap();
    assert_eq!(report.overall_percent, 50.0);
    assert_eq!(report.partially_covered, 1);
    assert_eq!(report.tickets_created, 0);
    assert_eq!(engine.store().list_tickets(tenant, None).await.unwrap().len(), 1);

    let entries = engine.store().list_shift_entries(tenant, week()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].shift_id, Some(report.items[0].shift_id));
  }

  #[tokio::test]
  async fn without_auto_create_names_are_unmatched() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let input = csv(concat!(
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,System Administrator,,,,\n",
    ));

    let summary = engine
      .import_schedule(tenant, week(), &input, ImportOptions::default())
      .await
      .unwrap();
    assert_eq!(summary.created_shifts, 1);
    assert_eq!(summary.created_assignments, 0);
    assert_eq!(summary.unmatched_employees, vec!["Ana Lopez"]);
    assert_eq!(summary.denylisted_employees, vec!["System Administrator"]);
    assert_eq!(summary.unmatched_clients, vec!["Acme"]);

    let shift = &engine.store().list_shifts(tenant, week()).await.unwrap()[0];
    assert_eq!(shift.client_id, None);
    assert_eq!(shift.slots, 2);
  }

  #[tokio::test]
  async fn denylisted_names_never_provisioned() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let input = csv("02/18/2026,08:00am,12:00pm,Morning,Acme,,,System Bot,,,,\n");

    let summary = engine.import_schedule(tenant, week(), &input, AUTO).await.unwrap();
    assert_eq!(summary.created_employees, 0);
    assert_eq!(summary.denylisted_employees, vec!["System Bot"]);
    assert!(engine.store().list_employees(tenant, false).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn out_of_range_rows_and_overrides_reported() {
    let (engine, sink) = engine().await;
    let tenant = Uuid::new_v4();
    let input = csv(concat!(
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
      "03/02/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
      "02/19/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,Unavailable,,,\n",
      "bad,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
    ));

    let summary = engine.import_schedule(tenant, week(), &input, AUTO).await.unwrap();
    assert_eq!(summary.total_rows, 4);
    assert_eq!(summary.created_shifts, 1);
    assert_eq!(summary.rejected_rows, 2);
    assert_eq!(summary.availability_overrides.len(), 1);
    assert!(!sink.0.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn preview_writes_nothing() {
    let (engine, sink) = engine().await;
    let tenant = Uuid::new_v4();
    let input = csv(concat!(
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Ana Lopez,,,,\n",
      "02/18/2026,08:00am,12:00pm,Morning,Acme,,,Juan Perez,,,,\n",
    ));

    let preview = engine.preview_schedule(tenant, week(), &input).await.unwrap();
    assert_eq!(preview.candidates, 1);
    assert_eq!(preview.links, 2);
    assert_eq!(preview.unmatched_employees, vec!["Ana Lopez", "Juan Perez"]);
    assert_eq!(preview.tag, "schedule:2026-02-16..2026-02-22");

    let store = engine.store();
    assert!(store.list_shifts(tenant, week()).await.unwrap().is_empty());
    assert!(store.list_employees(tenant, false).await.unwrap().is_empty());
    assert!(store.list_clients(tenant).await.unwrap().is_empty());
    assert!(sink.0.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn fatal_file_errors_propagate() {
    let (engine, _) = engine().await;
    let err = engine
      .import_schedule(Uuid::new_v4(), week(), b"Date,Start\n02/18/2026,08:00am\n", AUTO)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Import(shiftwork_import::Error::MissingColumn(_))));
  }
}

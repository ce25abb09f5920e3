//! Coverage reconciliation: planned assignments against actual attendance.
//!
//! [`compute_coverage`] is pure; [`Engine::reconcile`] loads the inputs,
//! runs it and raises discrepancy tickets for the gaps.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shiftwork_core::{
  assignment::Assignment,
  attendance::{EntryStatus, TimeEntry},
  events::{ChangeOp, EntityKind},
  shift::Shift,
  store::ScheduleStore,
  ticket::{NewTicket, TicketKind},
  time::DateSpan,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Engine, Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcileOptions {
  /// Also raise `unassigned_attendance` tickets for clocked employees who
  /// were never assigned.
  pub ticket_extra: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageItem {
  pub shift_id:           Uuid,
  pub date:               NaiveDate,
  pub title:              String,
  pub assigned_employees: Vec<Uuid>,
  pub clocked_employees:  Vec<Uuid>,
  pub missing_employees:  Vec<Uuid>,
  pub extra_employees:    Vec<Uuid>,
  pub coverage_percent:   f64,
}

impl CoverageItem {
  fn covered(&self) -> usize { self.clocked_employees.len().min(self.assigned_employees.len()) }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
  pub total_shifts:      usize,
  pub fully_covered:     usize,
  pub partially_covered: usize,
  pub uncovered:         usize,
  pub overall_percent:   f64,
  pub items:             Vec<CoverageItem>,
  /// Tickets newly raised by this run; duplicates of existing tickets are
  /// not counted.
  pub tickets_created:   usize,
}

fn percent(covered: usize, assigned: usize) -> f64 {
  if assigned == 0 {
    100.0
  } else {
    covered as f64 / assigned as f64 * 100.0
  }
}

/// Compute per-shift coverage.
///
/// `assigned` counts pending and accepted assignments; `clocked` counts
/// employees with a non-rejected entry referencing the shift. Assignments
/// and entries for shifts not in `shifts` are ignored.
pub fn compute_coverage(
  shifts: &[Shift],
  assignments: &[Assignment],
  entries: &[TimeEntry],
) -> CoverageReport {
  let mut assigned: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
  for a in assignments.iter().filter(|a| a.status.is_active()) {
    assigned.entry(a.shift_id).or_default().insert(a.employee_id);
  }
  let mut clocked: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
  for e in entries.iter().filter(|e| e.status != EntryStatus::Rejected) {
    if let Some(shift_id) = e.shift_id {
      clocked.entry(shift_id).or_default().insert(e.employee_id);
    }
  }

  let empty = BTreeSet::new();
  let mut report = CoverageReport { total_shifts: shifts.len(), ..Default::default() };
  let (mut covered_sum, mut assigned_sum) = (0, 0);

  for shift in shifts {
    let a = assigned.get(&shift.shift_id).unwrap_or(&empty);
    let c = clocked.get(&shift.shift_id).unwrap_or(&empty);

    let mut item = CoverageItem {
      shift_id:           shift.shift_id,
      date:               shift.date,
      title:              shift.title.clone(),
      assigned_employees: a.iter().copied().collect(),
      clocked_employees:  c.iter().copied().collect(),
      missing_employees:  a.difference(c).copied().collect(),
      extra_employees:    c.difference(a).copied().collect(),
      coverage_percent:   0.0,
    };
    item.coverage_percent = percent(item.covered(), a.len());

    match item.coverage_percent {
      p if p >= 100.0 => report.fully_covered += 1,
      p if p <= 0.0 => report.uncovered += 1,
      _ => report.partially_covered += 1,
    }
    covered_sum += item.covered();
    assigned_sum += a.len();
    report.items.push(item);
  }

  report.overall_percent = percent(covered_sum, assigned_sum);
  report
}

impl<S: ScheduleStore> Engine<S> {
  /// Reconcile every shift dated within `span` and raise a ticket per gap.
  /// Safe to re-run: existing tickets are never duplicated.
  pub async fn reconcile(
    &self,
    tenant_id: Uuid,
    span: DateSpan,
    options: ReconcileOptions,
  ) -> Result<CoverageReport> {
    let shifts = self.store.list_shifts(tenant_id, span).await.map_err(Error::store)?;
    let assignments = self
      .store
      .list_assignments(tenant_id, span)
      .await
      .map_err(Error::store)?;
    let entries = self
      .store
      .list_shift_entries(tenant_id, span)
      .await
      .map_err(Error::store)?;

    let mut report = compute_coverage(&shifts, &assignments, &entries);

    let names: HashMap<Uuid, String> = self
      .store
      .list_employees(tenant_id, false)
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|e| (e.employee_id, e.full_name()))
      .collect();
    let name = |id: &Uuid| names.get(id).cloned().unwrap_or_else(|| id.to_string());

    let mut tickets = Vec::new();
    for item in &report.items {
      for employee_id in &item.missing_employees {
        tickets.push(NewTicket {
          tenant_id,
          shift_id: item.shift_id,
          employee_id: *employee_id,
          kind: TicketKind::MissingAttendance,
          description: format!(
            "{} was assigned to \"{}\" on {} but has no attendance recorded",
            name(employee_id),
            item.title,
            item.date
          ),
        });
      }
      if options.ticket_extra {
        for employee_id in &item.extra_employees {
          tickets.push(NewTicket {
            tenant_id,
            shift_id: item.shift_id,
            employee_id: *employee_id,
            kind: TicketKind::UnassignedAttendance,
            description: format!(
              "{} clocked in against \"{}\" on {} without an assignment",
              name(employee_id),
              item.title,
              item.date
            ),
          });
        }
      }
    }

    for ticket in tickets {
      match self.store.add_ticket(ticket).await {
        Ok(Some(created)) => {
          report.tickets_created += 1;
          self.emit(tenant_id, EntityKind::Ticket, created.ticket_id, ChangeOp::Created);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "ticket insert failed"),
      }
    }

    info!(
      from = %span.from(),
      to = %span.to(),
      shifts = report.total_shifts,
      overall = report.overall_percent,
      tickets = report.tickets_created,
      "coverage reconciled"
    );
    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveTime, Utc};
  use shiftwork_core::{
    assignment::{AssignmentStatus, NewAssignment},
    attendance::NewTimeEntry,
    people::NewEmployee,
    shift::{NewShift, ShiftStatus},
    ticket::TicketStatus,
  };

  use super::*;
  use crate::testing::engine;

  fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 2, 18).unwrap() }

  fn shift(id: Uuid) -> Shift {
    Shift {
      shift_id:    id,
      tenant_id:   Uuid::nil(),
      title:       "Morning".into(),
      date:        day(),
      start_time:  NaiveTime::from_hms_opt(8, 0, 0),
      end_time:    NaiveTime::from_hms_opt(12, 0, 0),
      client_id:   None,
      location_id: None,
      slots:       2,
      claimable:   false,
      status:      ShiftStatus::Published,
      shift_code:  None,
      notes:       None,
      import_tag:  None,
      created_at:  Utc::now(),
    }
  }

  fn assignment(shift_id: Uuid, employee_id: Uuid, status: AssignmentStatus) -> Assignment {
    Assignment {
      assignment_id: Uuid::new_v4(),
      tenant_id: Uuid::nil(),
      shift_id,
      employee_id,
      status,
      import_tag: None,
      created_at: Utc::now(),
    }
  }

  fn entry(shift_id: Uuid, employee_id: Uuid, status: EntryStatus) -> TimeEntry {
    TimeEntry {
      entry_id: Uuid::new_v4(),
      tenant_id: Uuid::nil(),
      employee_id,
      shift_id: Some(shift_id),
      client_id: None,
      clock_in: day().and_hms_opt(8, 0, 0).unwrap(),
      clock_out: day().and_hms_opt(12, 0, 0),
      break_minutes: 0,
      status,
      notes: None,
      import_tag: None,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn classification_and_aggregate() {
    let (full, partial, none, empty) =
      (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let (ana, juan, eve) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let shifts = [shift(full), shift(partial), shift(none), shift(empty)];
    let assignments = [
      assignment(full, ana, AssignmentStatus::Accepted),
      assignment(partial, ana, AssignmentStatus::Accepted),
      assignment(partial, juan, AssignmentStatus::Pending),
      assignment(partial, eve, AssignmentStatus::Rejected),
      assignment(none, juan, AssignmentStatus::Accepted),
    ];
    let entries = [
      entry(full, ana, EntryStatus::Approved),
      entry(partial, ana, EntryStatus::Pending),
      entry(partial, eve, EntryStatus::Pending),
      entry(none, juan, EntryStatus::Rejected),
    ];

    let report = compute_coverage(&shifts, &assignments, &entries);
    assert_eq!(report.total_shifts, 4);
    // Extra attendance fills the count, and an empty shift is covered.
    assert_eq!(report.fully_covered, 3);
    assert_eq!(report.partially_covered, 0);
    assert_eq!(report.uncovered, 1);

    let p = &report.items[1];
    assert_eq!(p.assigned_employees.len(), 2);
    assert_eq!(p.missing_employees, vec![juan]);
    assert_eq!(p.extra_employees, vec![eve]);
    assert_eq!(p.coverage_percent, 100.0);

    assert_eq!(report.items[2].coverage_percent, 0.0);
    assert_eq!(report.items[3].coverage_percent, 100.0);
    assert_eq!(report.overall_percent, 3.0 / 4.0 * 100.0);
  }

  #[test]
  fn partially_covered_shift() {
    let id = Uuid::new_v4();
    let (ana, juan) = (Uuid::new_v4(), Uuid::new_v4());
    let report = compute_coverage(
      &[shift(id)],
      &[
        assignment(id, ana, AssignmentStatus::Accepted),
        assignment(id, juan, AssignmentStatus::Accepted),
      ],
      &[entry(id, ana, EntryStatus::Pending)],
    );
    assert_eq!(report.partially_covered, 1);
    assert_eq!(report.items[0].coverage_percent, 50.0);
  }

  #[test]
  fn coverage_is_a_partition() {
    let id = Uuid::new_v4();
    let people: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
    let assignments: Vec<_> = people[..4]
      .iter()
      .map(|&e| assignment(id, e, AssignmentStatus::Accepted))
      .collect();
    let entries: Vec<_> = people[2..]
      .iter()
      .map(|&e| entry(id, e, EntryStatus::Pending))
      .collect();

    let item = &compute_coverage(&[shift(id)], &assignments, &entries).items[0];
    let assigned: BTreeSet<_> = item.assigned_employees.iter().collect();
    let clocked: BTreeSet<_> = item.clocked_employees.iter().collect();
    let missing: BTreeSet<_> = item.missing_employees.iter().collect();

    let rebuilt: BTreeSet<_> =
      assigned.intersection(&clocked).chain(missing.iter()).copied().collect();
    assert_eq!(rebuilt, assigned);
    assert!(missing.is_disjoint(&clocked));
  }

  #[tokio::test]
  async fn no_attendance_raises_one_ticket_once() {
    let (engine, sink) = engine().await;
    let tenant = Uuid::new_v4();
    let store = engine.store();
    let juan = store.add_employee(tenant, NewEmployee::new("Juan", "Perez")).await.unwrap();
    let shift = store.add_shift(NewShift::new(tenant, "Morning", day())).await.unwrap();
    store
      .add_assignment(NewAssignment::new(
        tenant,
        shift.shift_id,
        juan.employee_id,
        AssignmentStatus::Accepted,
      ))
      .await
      .unwrap();

    let span = DateSpan::day(day());
    let report = engine.reconcile(tenant, span, ReconcileOptions::default()).await.unwrap();
    assert_eq!(report.items[0].coverage_percent, 0.0);
    assert_eq!(report.items[0].missing_employees, vec![juan.employee_id]);
    assert_eq!(report.uncovered, 1);
    assert_eq!(report.tickets_created, 1);

    let again = engine.reconcile(tenant, span, ReconcileOptions::default()).await.unwrap();
    assert_eq!(again.tickets_created, 0);

    let tickets = store.list_tickets(tenant, Some(span)).await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].kind, TicketKind::MissingAttendance);
    assert_eq!(tickets[0].status, TicketStatus::New);
    assert!(tickets[0].description.contains("Juan Perez"));
    assert_eq!(sink.0.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn extra_attendance_ticketed_only_when_asked() {
    let (engine, _) = engine().await;
    let tenant = Uuid::new_v4();
    let store = engine.store();
    let ana = store.add_employee(tenant, NewEmployee::new("Ana", "Lopez")).await.unwrap();
    let shift = store.add_shift(NewShift::new(tenant, "Morning", day())).await.unwrap();
    let at = day().and_hms_opt(8, 0, 0).unwrap();
    let mut clocked = NewTimeEntry::clock_in(tenant, ana.employee_id, at);
    clocked.shift_id = Some(shift.shift_id);
    clocked.clock_out = day().and_hms_opt(12, 0, 0);
    store.add_time_entry(clocked).await.unwrap();

    let span = DateSpan::day(day());
    let report = engine.reconcile(tenant, span, ReconcileOptions::default()).await.unwrap();
    assert_eq!(report.items[0].extra_employees, vec![ana.employee_id]);
    assert_eq!(report.fully_covered, 1);
    assert_eq!(report.tickets_created, 0);

    let report = engine
      .reconcile(tenant, span, ReconcileOptions { ticket_extra: true })
      .await
      .unwrap();
    assert_eq!(report.tickets_created, 1);
    let tickets = store.list_tickets(tenant, None).await.unwrap();
    assert_eq!(tickets[0].kind, TicketKind::UnassignedAttendance);
  }
}

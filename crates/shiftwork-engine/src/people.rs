//! Employee directory writes that go through the engine so they are
//! announced like every other mutation.

use shiftwork_core::{
  StoreError as _,
  events::{ChangeOp, EntityKind},
  people::{Employee, NewEmployee},
  store::ScheduleStore,
};
use uuid::Uuid;

use crate::{Engine, Error, Result};

impl<S: ScheduleStore> Engine<S> {
  /// Add an employee. Names are unique per tenant, ignoring case and
  /// spacing.
  pub async fn add_employee(&self, tenant_id: Uuid, input: NewEmployee) -> Result<Employee> {
    if input.first_name.trim().is_empty() {
      return Err(Error::EmptyName);
    }
    let name = input.full_name();
    let employee = match self.store.add_employee(tenant_id, input).await {
      Ok(e) => e,
      Err(e) if e.is_constraint_violation() => return Err(Error::DuplicateEmployee(name)),
      Err(e) => return Err(Error::store(e)),
    };
    self.emit(tenant_id, EntityKind::Employee, employee.employee_id, ChangeOp::Created);
    Ok(employee)
  }

  /// Inactive employees keep their history but are no longer offered open
  /// shifts.
  pub async fn set_employee_active(
    &self,
    tenant_id: Uuid,
    employee_id: Uuid,
    active: bool,
  ) -> Result<()> {
    if !self
      .store
      .set_employee_active(tenant_id, employee_id, active)
      .await
      .map_err(Error::store)?
    {
      return Err(Error::EmployeeNotFound(employee_id));
    }
    self.emit(tenant_id, EntityKind::Employee, employee_id, ChangeOp::Updated);
    Ok(())
  }
}

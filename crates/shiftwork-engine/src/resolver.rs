//! Entity resolution: raw export labels to store ids.
//!
//! A [`Resolver`] lives for one import run. It preloads the tenant's
//! employees, clients and locations, resolves labels against that cache and
//! keeps the cache current as it provisions new records, so resolving the
//! same label twice always yields the same id.

use std::collections::HashMap;

use shiftwork_core::{
  StoreError as _,
  people::{NewEmployee, name_key},
  store::ScheduleStore,
};
use shiftwork_import::normalize::{parse_person_name, strip_site_code};
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result, config::Denylist};

/// Outcome of a provision call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provision {
  /// A new record was inserted by this call.
  Created(Uuid),
  /// A record already existed (in the cache, or inserted concurrently).
  Existing(Uuid),
}

impl Provision {
  pub fn id(self) -> Uuid {
    match self {
      Self::Created(id) | Self::Existing(id) => id,
    }
  }

  pub fn is_created(self) -> bool { matches!(self, Self::Created(_)) }
}

pub struct Resolver<'a, S> {
  store:     &'a S,
  tenant_id: Uuid,
  denylist:  &'a Denylist,
  /// `name_key(full name)` → id
  employees: HashMap<String, Uuid>,
  /// `(name_key(name), id)` in name order, for containment matching.
  clients:   Vec<(String, Uuid)>,
  /// Raw labels already resolved or provisioned in this run.
  aliases:   HashMap<String, Uuid>,
  locations: HashMap<String, Uuid>,
}

impl<'a, S: ScheduleStore> Resolver<'a, S> {
  pub async fn load(store: &'a S, tenant_id: Uuid, denylist: &'a Denylist) -> Result<Self> {
    let mut resolver = Self {
      store,
      tenant_id,
      denylist,
      employees: HashMap::new(),
      clients: Vec::new(),
      aliases: HashMap::new(),
      locations: HashMap::new(),
    };
    resolver.reload_employees().await?;
    resolver.reload_clients().await?;
    resolver.reload_locations().await?;
    Ok(resolver)
  }

  async fn reload_employees(&mut self) -> Result<()> {
    let employees = self
      .store
      .list_employees(self.tenant_id, false)
      .await
      .map_err(Error::store)?;
    self.employees = employees.iter().map(|e| (e.name_key(), e.employee_id)).collect();
    Ok(())
  }

  async fn reload_clients(&mut self) -> Result<()> {
    let clients = self.store.list_clients(self.tenant_id).await.map_err(Error::store)?;
    self.clients = clients.into_iter().map(|c| (name_key(&c.name), c.client_id)).collect();
    Ok(())
  }

  async fn reload_locations(&mut self) -> Result<()> {
    let locations = self.store.list_locations(self.tenant_id).await.map_err(Error::store)?;
    self.locations = locations.into_iter().map(|l| (name_key(&l.name), l.location_id)).collect();
    Ok(())
  }

  // ── Resolution ────────────────────────────────────────────────────────────

  /// Case-insensitive exact match on the full name. No fuzzy matching.
  pub fn resolve_employee(&self, name: &str) -> Option<Uuid> {
    self.employees.get(&name_key(name)).copied()
  }

  /// Resolve a raw client label: exact match, then the label with its site
  /// code stripped, then substring containment in either direction. Among
  /// several containment candidates the shortest name wins, ties broken by
  /// name order.
  pub fn resolve_client(&self, label: &str) -> Option<Uuid> {
    let raw = name_key(label);
    if raw.is_empty() {
      return None;
    }
    if let Some(id) = self.aliases.get(&raw) {
      return Some(*id);
    }
    if let Some(id) = self.exact_client(&raw) {
      return Some(id);
    }

    let stripped = name_key(strip_site_code(label));
    if let Some(id) = self.exact_client(&stripped) {
      return Some(id);
    }
    if stripped.is_empty() {
      return None;
    }

    let found = self
      .clients
      .iter()
      .filter(|(name, _)| !name.is_empty())
      .filter(|(name, _)| name.contains(stripped.as_str()) || stripped.contains(name.as_str()))
      .min_by_key(|(name, _)| name.len())
      .map(|(_, id)| *id);
    if let Some(id) = found {
      debug!(label, client_id = %id, "client resolved by containment");
    }
    found
  }

  fn exact_client(&self, key: &str) -> Option<Uuid> {
    self.clients.iter().find(|(name, _)| name == key).map(|(_, id)| *id)
  }

  /// Case-insensitive exact match on the location name.
  pub fn resolve_location(&self, name: &str) -> Option<Uuid> {
    self.locations.get(&name_key(name)).copied()
  }

  /// `true` when `name` must never be auto-provisioned.
  pub fn is_denylisted(&self, name: &str) -> bool { self.denylist.is_match(name) }

  // ── Provisioning ──────────────────────────────────────────────────────────

  /// Insert a minimal employee for `name`. Returns `None` for an empty name.
  ///
  /// If a concurrent writer inserted the same name first, the cache is
  /// reloaded and the winner's id is returned.
  pub async fn provision_employee(&mut self, name: &str) -> Result<Option<Provision>> {
    if let Some(id) = self.resolve_employee(name) {
      return Ok(Some(Provision::Existing(id)));
    }
    let Some(parsed) = parse_person_name(name) else {
      return Ok(None);
    };

    let input = NewEmployee::new(parsed.first, parsed.last);
    match self.store.add_employee(self.tenant_id, input).await {
      Ok(employee) => {
        debug!(name, employee_id = %employee.employee_id, "employee provisioned");
        self.employees.insert(employee.name_key(), employee.employee_id);
        Ok(Some(Provision::Created(employee.employee_id)))
      }
      Err(e) if e.is_constraint_violation() => {
        self.reload_employees().await?;
        Ok(self.resolve_employee(name).map(Provision::Existing))
      }
      Err(e) => Err(Error::store(e)),
    }
  }

  /// Insert a client named after `label` with its site code stripped, and
  /// remember `label` as an alias. A name inserted concurrently resolves to
  /// the winner, as for employees.
  pub async fn provision_client(&mut self, label: &str) -> Result<Option<Provision>> {
    if let Some(id) = self.resolve_client(label) {
      return Ok(Some(Provision::Existing(id)));
    }
    let name = strip_site_code(label);
    if name.is_empty() {
      return Ok(None);
    }

    let client = match self.store.add_client(self.tenant_id, name.to_string()).await {
      Ok(client) => client,
      Err(e) if e.is_constraint_violation() => {
        self.reload_clients().await?;
        let winner = self.exact_client(&name_key(name));
        if let Some(id) = winner {
          self.aliases.insert(name_key(label), id);
        }
        return Ok(winner.map(Provision::Existing));
      }
      Err(e) => return Err(Error::store(e)),
    };
    debug!(label, client_id = %client.client_id, "client provisioned");

    let key = name_key(&client.name);
    let pos = self.clients.partition_point(|(n, _)| n.as_str() < key.as_str());
    self.clients.insert(pos, (key, client.client_id));
    self.aliases.insert(name_key(label), client.client_id);
    Ok(Some(Provision::Created(client.client_id)))
  }

  pub async fn provision_location(
    &mut self,
    name: &str,
    address: Option<&str>,
  ) -> Result<Option<Provision>> {
    if let Some(id) = self.resolve_location(name) {
      return Ok(Some(Provision::Existing(id)));
    }
    if name.trim().is_empty() {
      return Ok(None);
    }

    let added =
      self.store.add_location(self.tenant_id, name.to_string(), address.map(str::to_string)).await;
    let location = match added {
      Ok(location) => location,
      Err(e) if e.is_constraint_violation() => {
        self.reload_locations().await?;
        return Ok(self.resolve_location(name).map(Provision::Existing));
      }
      Err(e) => return Err(Error::store(e)),
    };
    debug!(name, location_id = %location.location_id, "location provisioned");
    self.locations.insert(name_key(&location.name), location.location_id);
    Ok(Some(Provision::Created(location.location_id)))
  }
}

#[cfg(test)]
mod tests {
  use shiftwork_store_sqlite::SqliteStore;

  use super::*;

  async fn setup() -> (SqliteStore, Uuid) {
    (SqliteStore::open_in_memory().await.unwrap(), Uuid::new_v4())
  }

  #[tokio::test]
  async fn employees_match_exactly_ignoring_case() {
    let (store, tenant) = setup().await;
    let juan = store.add_employee(tenant, NewEmployee::new("Juan", "Perez")).await.unwrap();
    let denylist = Denylist::default();
    let r = Resolver::load(&store, tenant, &denylist).await.unwrap();

    assert_eq!(r.resolve_employee("juan  PEREZ"), Some(juan.employee_id));
    assert_eq!(r.resolve_employee("Juan Pere"), None);
    assert_eq!(r.resolve_employee("Juan"), None);
  }

  #[tokio::test]
  async fn client_match_ladder() {
    let (store, tenant) = setup().await;
    let ely = store.add_client(tenant, "ELY Produccion".into()).await.unwrap();
    let acme = store.add_client(tenant, "Acme".into()).await.unwrap();
    store.add_client(tenant, "Acme Logistics".into()).await.unwrap();
    let denylist = Denylist::default();
    let r = Resolver::load(&store, tenant, &denylist).await.unwrap();

    assert_eq!(r.resolve_client("ely produccion"), Some(ely.client_id));
    assert_eq!(r.resolve_client("02 - ELY PRODUCCION"), Some(ely.client_id));
    // Both "Acme" and "Acme Logistics" contain "acme": the shortest wins.
    assert_eq!(r.resolve_client("7 - Acme"), Some(acme.client_id));
    assert_eq!(r.resolve_client("Acme Warehouse North"), Some(acme.client_id));
    assert_eq!(r.resolve_client("Globex"), None);
    assert_eq!(r.resolve_client("  "), None);
  }

  #[tokio::test]
  async fn provisioning_is_idempotent_within_a_run() {
    let (store, tenant) = setup().await;
    let denylist = Denylist::default();
    let mut r = Resolver::load(&store, tenant, &denylist).await.unwrap();

    let first = r.provision_client("02 - ELY PRODUCCION").await.unwrap().unwrap();
    assert!(first.is_created());
    let again = r.provision_client("02 - ELY PRODUCCION").await.unwrap().unwrap();
    assert_eq!(again, Provision::Existing(first.id()));
    assert_eq!(r.resolve_client("ELY PRODUCCION"), Some(first.id()));

    let clients = store.list_clients(tenant).await.unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].name, "ELY PRODUCCION");

    let ana = r.provision_employee("Ana  Lopez").await.unwrap().unwrap();
    assert!(ana.is_created());
    assert_eq!(r.resolve_employee("ana lopez"), Some(ana.id()));
    assert_eq!(
      r.provision_employee("ANA LOPEZ").await.unwrap(),
      Some(Provision::Existing(ana.id()))
    );
    assert_eq!(r.provision_employee("   ").await.unwrap(), None);
  }

  #[tokio::test]
  async fn provisioning_race_returns_winner() {
    let (store, tenant) = setup().await;
    let denylist = Denylist::default();
    let mut r = Resolver::load(&store, tenant, &denylist).await.unwrap();

    // Inserted after the cache was loaded, as a concurrent import would.
    let winner = store.add_employee(tenant, NewEmployee::new("Ana", "Lopez")).await.unwrap();
    let got = r.provision_employee("Ana Lopez").await.unwrap();
    assert_eq!(got, Some(Provision::Existing(winner.employee_id)));
  }

  #[tokio::test]
  async fn client_and_location_races_return_winner() {
    let (store, tenant) = setup().await;
    let denylist = Denylist::default();
    let mut r = Resolver::load(&store, tenant, &denylist).await.unwrap();

    let client = store.add_client(tenant, "ELY PRODUCCION".into()).await.unwrap();
    let site = store.add_location(tenant, "Line 2".into(), None).await.unwrap();

    let got = r.provision_client("02 - ely produccion").await.unwrap();
    assert_eq!(got, Some(Provision::Existing(client.client_id)));
    assert_eq!(r.resolve_client("02 - ely produccion"), Some(client.client_id));
    let got = r.provision_location("LINE  2", Some("1 Main St")).await.unwrap();
    assert_eq!(got, Some(Provision::Existing(site.location_id)));

    assert_eq!(store.list_clients(tenant).await.unwrap().len(), 1);
    assert_eq!(store.list_locations(tenant).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn locations_resolved_and_provisioned() {
    let (store, tenant) = setup().await;
    let denylist = Denylist::default();
    let mut r = Resolver::load(&store, tenant, &denylist).await.unwrap();

    assert_eq!(r.resolve_location("Line 2"), None);
    let p = r.provision_location("Line 2", Some("1 Main St")).await.unwrap().unwrap();
    assert!(p.is_created());
    assert_eq!(r.resolve_location("LINE 2"), Some(p.id()));
    let stored = store.list_locations(tenant).await.unwrap();
    assert_eq!(stored[0].address.as_deref(), Some("1 Main St"));
  }
}

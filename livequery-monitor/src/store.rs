//! The monitoring core: owner of the live entity collections.
//!
//! All collections sit behind one `RwLock`. Queries hold the read guard for
//! a whole pass and every mutation takes the write guard, so a reader sees
//! each entity either before or after a change, never half of one.

use crate::entities::{
    Comment, Contact, ContactGroup, Downtime, Host, HostCheck, Service, ServiceCheck, ServiceKey,
};
use livequery_core::{Identity, LiveQueryError, LiveQueryResult, StoreError};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// ============================================================================
// STATE
// ============================================================================

/// Live collections. Reachable only through [`MonitoringCore::read`].
#[derive(Debug, Default)]
pub struct CoreState {
    hosts: Vec<Arc<Host>>,
    host_index: HashMap<String, usize>,
    services: Vec<Arc<Service>>,
    service_index: HashMap<ServiceKey, usize>,
    comments: BTreeMap<i64, Arc<Comment>>,
    downtimes: BTreeMap<i64, Arc<Downtime>>,
    contacts: BTreeMap<String, Arc<Contact>>,
    contact_groups: BTreeMap<String, ContactGroup>,
}

impl CoreState {
    /// Hosts in registration order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.iter().map(|host| host.as_ref())
    }

    pub fn host(&self, name: &str) -> Option<&Arc<Host>> {
        self.host_index.get(name).map(|&position| &self.hosts[position])
    }

    /// Services in registration order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.iter().map(|service| service.as_ref())
    }

    pub fn service(&self, key: &ServiceKey) -> Option<&Arc<Service>> {
        self.service_index
            .get(key)
            .map(|&position| &self.services[position])
    }

    /// Comments by ascending id.
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.values().map(|comment| comment.as_ref())
    }

    pub fn comment(&self, id: i64) -> Option<&Arc<Comment>> {
        self.comments.get(&id)
    }

    /// Downtimes by ascending id.
    pub fn downtimes(&self) -> impl Iterator<Item = &Downtime> {
        self.downtimes.values().map(|downtime| downtime.as_ref())
    }

    pub fn downtime(&self, id: i64) -> Option<&Arc<Downtime>> {
        self.downtimes.get(&id)
    }

    /// Contacts by name.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values().map(|contact| contact.as_ref())
    }

    pub fn contact(&self, name: &str) -> Option<&Arc<Contact>> {
        self.contacts.get(name)
    }

    pub fn contact_groups(&self) -> impl Iterator<Item = &ContactGroup> {
        self.contact_groups.values()
    }

    /// Names of the groups `contact` belongs to.
    pub fn groups_of<'s>(&'s self, contact: &'s str) -> impl Iterator<Item = &'s str> {
        self.contact_groups
            .values()
            .filter(move |group| group.has_member(contact))
            .map(|group| group.name.as_str())
    }

    /// Smallest id above every registered comment id, or `None` once
    /// `i64::MAX` is taken.
    pub fn next_comment_id(&self) -> Option<i64> {
        next_id(self.comments.keys().next_back())
    }

    pub fn next_downtime_id(&self) -> Option<i64> {
        next_id(self.downtimes.keys().next_back())
    }

    fn reindex(&mut self) {
        self.host_index = self
            .hosts
            .iter()
            .enumerate()
            .map(|(position, host)| (host.name.clone(), position))
            .collect();
        self.service_index = self
            .services
            .iter()
            .enumerate()
            .map(|(position, service)| (service.key(), position))
            .collect();
    }

    fn registered_host(&self, kind: &'static str, key: &str, host: &Host) -> LiveQueryResult<Arc<Host>> {
        self.host(&host.name).cloned().ok_or_else(|| {
            tracing::warn!(kind, key, host = %host.name, "rejected: host is not registered");
            dangling(kind, key)
        })
    }

    fn registered_service(
        &self,
        kind: &'static str,
        key: &str,
        service: Option<&Service>,
    ) -> LiveQueryResult<Option<Arc<Service>>> {
        let Some(service) = service else {
            return Ok(None);
        };
        let service_key = service.key();
        match self.service(&service_key) {
            Some(registered) => Ok(Some(Arc::clone(registered))),
            None => {
                tracing::warn!(kind, key, service = %service_key, "rejected: service is not registered");
                Err(dangling(kind, key))
            }
        }
    }

    /// Point every service, comment and downtime of `host` at the current
    /// host and service records.
    fn rewire_host(&mut self, host: &Arc<Host>) {
        for service in self.services.iter_mut() {
            if service.host.name == host.name {
                Arc::make_mut(service).host = Arc::clone(host);
            }
        }
        let current: HashMap<String, Arc<Service>> = self
            .services
            .iter()
            .filter(|service| service.host.name == host.name)
            .map(|service| (service.description.clone(), Arc::clone(service)))
            .collect();
        let rebind = |service: &mut Option<Arc<Service>>| {
            if let Some(existing) = service {
                if let Some(fresh) = current.get(&existing.description) {
                    *existing = Arc::clone(fresh);
                }
            }
        };
        for comment in self.comments.values_mut() {
            if comment.host.name == host.name {
                let comment = Arc::make_mut(comment);
                comment.host = Arc::clone(host);
                rebind(&mut comment.service);
            }
        }
        for downtime in self.downtimes.values_mut() {
            if downtime.host.name == host.name {
                let downtime = Arc::make_mut(downtime);
                downtime.host = Arc::clone(host);
                rebind(&mut downtime.service);
            }
        }
    }

    /// Point every comment and downtime of `service` at the current record.
    fn rewire_service(&mut self, service: &Arc<Service>) {
        let key = service.key();
        for comment in self.comments.values_mut() {
            if comment.service.as_ref().is_some_and(|s| s.key() == key) {
                Arc::make_mut(comment).service = Some(Arc::clone(service));
            }
        }
        for downtime in self.downtimes.values_mut() {
            if downtime.service.as_ref().is_some_and(|s| s.key() == key) {
                Arc::make_mut(downtime).service = Some(Arc::clone(service));
            }
        }
    }
}

fn next_id(highest: Option<&i64>) -> Option<i64> {
    match highest {
        Some(id) => id.checked_add(1),
        None => Some(1),
    }
}

fn dangling(kind: &'static str, key: &str) -> LiveQueryError {
    StoreError::DanglingReference {
        kind,
        key: key.to_string(),
    }
    .into()
}

fn duplicate(kind: &'static str, key: impl Into<String>) -> LiveQueryError {
    StoreError::DuplicateEntity {
        kind,
        key: key.into(),
    }
    .into()
}

fn not_found(kind: &'static str, key: impl Into<String>) -> LiveQueryError {
    StoreError::NotFound {
        kind,
        key: key.into(),
    }
    .into()
}

// ============================================================================
// MONITORING CORE
// ============================================================================

/// Owner of all live monitoring entities.
///
/// Shared between the tables and whatever drives check results, usually as
/// `Arc<MonitoringCore>`.
#[derive(Debug, Default)]
pub struct MonitoringCore {
    state: RwLock<CoreState>,
}

impl MonitoringCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the read guard. Rows handed to a query borrow from it.
    pub fn read(&self) -> LiveQueryResult<RwLockReadGuard<'_, CoreState>> {
        self.state
            .read()
            .map_err(|_| LiveQueryError::from(StoreError::LockPoisoned))
    }

    fn write(&self) -> LiveQueryResult<RwLockWriteGuard<'_, CoreState>> {
        self.state
            .write()
            .map_err(|_| LiveQueryError::from(StoreError::LockPoisoned))
    }

    // === Hosts ===

    pub fn add_host(&self, host: Host) -> LiveQueryResult<Arc<Host>> {
        let mut state = self.write()?;
        if state.host_index.contains_key(&host.name) {
            return Err(duplicate("host", host.name));
        }
        let host = Arc::new(host);
        let position = state.hosts.len();
        state.host_index.insert(host.name.clone(), position);
        state.hosts.push(Arc::clone(&host));
        Ok(host)
    }

    /// Remove a host together with its services, comments and downtimes.
    pub fn remove_host(&self, name: &str) -> LiveQueryResult<Arc<Host>> {
        let mut state = self.write()?;
        let position = *state
            .host_index
            .get(name)
            .ok_or_else(|| not_found("host", name))?;
        let host = state.hosts.remove(position);
        state.services.retain(|service| service.host.name != name);
        state.comments.retain(|_, comment| comment.host.name != name);
        state.downtimes.retain(|_, downtime| downtime.host.name != name);
        state.reindex();
        tracing::debug!(host = name, "removed host");
        Ok(host)
    }

    /// Apply a check result. Services, comments and downtimes of the host
    /// see the new state immediately.
    pub fn record_host_check(&self, name: &str, check: HostCheck) -> LiveQueryResult<Arc<Host>> {
        let mut state = self.write()?;
        let position = *state
            .host_index
            .get(name)
            .ok_or_else(|| not_found("host", name))?;
        let mut host = Host::clone(&state.hosts[position]);
        host.state = check.state;
        host.plugin_output = check.plugin_output;
        host.latency = check.latency;
        host.last_check = check.checked_at;
        host.has_been_checked = true;
        let host = Arc::new(host);
        state.hosts[position] = Arc::clone(&host);
        state.rewire_host(&host);
        Ok(host)
    }

    // === Services ===

    /// Register a service. Its host must already be registered.
    pub fn add_service(&self, mut service: Service) -> LiveQueryResult<Arc<Service>> {
        let mut state = self.write()?;
        let key = service.key();
        service.host = state.registered_host("service", &key.to_string(), &service.host)?;
        if state.service_index.contains_key(&key) {
            return Err(duplicate("service", key.to_string()));
        }
        let service = Arc::new(service);
        let position = state.services.len();
        state.service_index.insert(key, position);
        state.services.push(Arc::clone(&service));
        Ok(service)
    }

    /// Remove a service together with its comments and downtimes.
    pub fn remove_service(&self, key: &ServiceKey) -> LiveQueryResult<Arc<Service>> {
        let mut state = self.write()?;
        let position = *state
            .service_index
            .get(key)
            .ok_or_else(|| not_found("service", key.to_string()))?;
        let service = state.services.remove(position);
        let on_service = |target: &Option<Arc<Service>>| {
            target.as_ref().is_some_and(|s| s.key() == *key)
        };
        state.comments.retain(|_, comment| !on_service(&comment.service));
        state.downtimes.retain(|_, downtime| !on_service(&downtime.service));
        state.reindex();
        tracing::debug!(service = %key, "removed service");
        Ok(service)
    }

    pub fn record_service_check(
        &self,
        key: &ServiceKey,
        check: ServiceCheck,
    ) -> LiveQueryResult<Arc<Service>> {
        let mut state = self.write()?;
        let position = *state
            .service_index
            .get(key)
            .ok_or_else(|| not_found("service", key.to_string()))?;
        let mut service = Service::clone(&state.services[position]);
        service.state = check.state;
        service.plugin_output = check.plugin_output;
        service.execution_time = check.execution_time;
        service.last_check = check.checked_at;
        service.has_been_checked = true;
        let service = Arc::new(service);
        state.services[position] = Arc::clone(&service);
        state.rewire_service(&service);
        Ok(service)
    }

    // === Comments ===

    /// Register a comment. Its host, and its service if any, must already
    /// be registered.
    pub fn add_comment(&self, mut comment: Comment) -> LiveQueryResult<Arc<Comment>> {
        let mut state = self.write()?;
        let key = comment.id.to_string();
        if state.comments.contains_key(&comment.id) {
            return Err(duplicate("comment", key));
        }
        comment.host = state.registered_host("comment", &key, &comment.host)?;
        comment.service = state.registered_service("comment", &key, comment.service.as_deref())?;
        let comment = Arc::new(comment);
        state.comments.insert(comment.id, Arc::clone(&comment));
        Ok(comment)
    }

    pub fn remove_comment(&self, id: i64) -> LiveQueryResult<Arc<Comment>> {
        let mut state = self.write()?;
        state
            .comments
            .remove(&id)
            .ok_or_else(|| not_found("comment", id.to_string()))
    }

    // === Downtimes ===

    pub fn add_downtime(&self, mut downtime: Downtime) -> LiveQueryResult<Arc<Downtime>> {
        let mut state = self.write()?;
        let key = downtime.id.to_string();
        if state.downtimes.contains_key(&downtime.id) {
            return Err(duplicate("downtime", key));
        }
        downtime.host = state.registered_host("downtime", &key, &downtime.host)?;
        downtime.service =
            state.registered_service("downtime", &key, downtime.service.as_deref())?;
        let downtime = Arc::new(downtime);
        state.downtimes.insert(downtime.id, Arc::clone(&downtime));
        Ok(downtime)
    }

    pub fn remove_downtime(&self, id: i64) -> LiveQueryResult<Arc<Downtime>> {
        let mut state = self.write()?;
        state
            .downtimes
            .remove(&id)
            .ok_or_else(|| not_found("downtime", id.to_string()))
    }

    // === Contacts ===

    pub fn add_contact(&self, contact: Contact) -> LiveQueryResult<Arc<Contact>> {
        let mut state = self.write()?;
        if state.contacts.contains_key(&contact.name) {
            return Err(duplicate("contact", contact.name));
        }
        let contact = Arc::new(contact);
        state
            .contacts
            .insert(contact.name.clone(), Arc::clone(&contact));
        Ok(contact)
    }

    pub fn remove_contact(&self, name: &str) -> LiveQueryResult<Arc<Contact>> {
        let mut state = self.write()?;
        state
            .contacts
            .remove(name)
            .ok_or_else(|| not_found("contact", name))
    }

    /// Register a contact group. Every member must be a registered contact.
    pub fn add_contact_group(&self, group: ContactGroup) -> LiveQueryResult<()> {
        let mut state = self.write()?;
        if state.contact_groups.contains_key(&group.name) {
            return Err(duplicate("contact group", group.name));
        }
        if let Some(missing) = group
            .members
            .iter()
            .find(|member| !state.contacts.contains_key(member.as_str()))
        {
            tracing::warn!(group = %group.name, contact = %missing, "rejected: contact is not registered");
            return Err(dangling("contact group", &group.name));
        }
        state.contact_groups.insert(group.name.clone(), group);
        Ok(())
    }

    // === Identity ===

    /// Resolve the user a query runs as.
    ///
    /// `None` means no user was supplied and everything is visible. A name
    /// that matches no contact sees nothing.
    pub fn resolve_identity(&self, user: Option<&str>) -> LiveQueryResult<Identity> {
        let Some(name) = user else {
            return Ok(Identity::Unrestricted);
        };
        let state = self.read()?;
        if state.contact(name).is_none() {
            return Ok(Identity::unknown(name));
        }
        Ok(Identity::contact(name, state.groups_of(name)))
    }
}

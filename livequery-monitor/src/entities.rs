//! Monitoring entity records.
//!
//! Related entities are held by `Arc`, so a comment keeps its host and
//! service alive for as long as any reader can reach it.

use livequery_core::{Timestamp, EPOCH};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// STATES
// ============================================================================

/// Current host state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostState {
    #[default]
    Up,
    Down,
    Unreachable,
}

impl HostState {
    /// Numeric code as reported by the `state` column.
    pub fn code(&self) -> i64 {
        match self {
            HostState::Up => 0,
            HostState::Down => 1,
            HostState::Unreachable => 2,
        }
    }
}

/// Current service state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    #[default]
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    pub fn code(&self) -> i64 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }
}

/// Why a comment exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentEntryType {
    #[default]
    User,
    Downtime,
    Flapping,
    Acknowledgement,
}

impl CommentEntryType {
    pub fn code(&self) -> i64 {
        match self {
            CommentEntryType::User => 1,
            CommentEntryType::Downtime => 2,
            CommentEntryType::Flapping => 3,
            CommentEntryType::Acknowledgement => 4,
        }
    }
}

/// Who created a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentSource {
    #[default]
    Internal,
    External,
}

impl CommentSource {
    pub fn code(&self) -> i64 {
        match self {
            CommentSource::Internal => 0,
            CommentSource::External => 1,
        }
    }
}

// ============================================================================
// HOSTS AND SERVICES
// ============================================================================

/// A monitored host.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    pub name: String,
    pub display_name: String,
    pub alias: String,
    pub address: String,
    pub state: HostState,
    pub has_been_checked: bool,
    pub last_check: Timestamp,
    pub plugin_output: String,
    /// Check latency in seconds.
    pub latency: f64,
    pub contacts: Vec<String>,
    pub contact_groups: Vec<String>,
}

impl Host {
    /// New unchecked host. Display name and alias default to the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            alias: name.clone(),
            name,
            address: String::new(),
            state: HostState::Up,
            has_been_checked: false,
            last_check: EPOCH,
            plugin_output: String::new(),
            latency: 0.0,
            contacts: Vec::new(),
            contact_groups: Vec::new(),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contacts.push(contact.into());
        self
    }

    pub fn with_contact_group(mut self, group: impl Into<String>) -> Self {
        self.contact_groups.push(group.into());
        self
    }
}

/// A service on a host.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub host: Arc<Host>,
    pub description: String,
    pub display_name: String,
    pub state: ServiceState,
    pub has_been_checked: bool,
    pub last_check: Timestamp,
    pub plugin_output: String,
    /// Duration of the last check in seconds.
    pub execution_time: f64,
    pub contacts: Vec<String>,
    pub contact_groups: Vec<String>,
}

impl Service {
    pub fn new(host: &Arc<Host>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            host: Arc::clone(host),
            display_name: description.clone(),
            description,
            state: ServiceState::Ok,
            has_been_checked: false,
            last_check: EPOCH,
            plugin_output: String::new(),
            execution_time: 0.0,
            contacts: Vec::new(),
            contact_groups: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contacts.push(contact.into());
        self
    }

    pub fn with_contact_group(mut self, group: impl Into<String>) -> Self {
        self.contact_groups.push(group.into());
        self
    }

    /// `(host name, service description)`, unique per core.
    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(&self.host.name, &self.description)
    }
}

/// Identifies a service within a core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey {
    pub host_name: String,
    pub description: String,
}

impl ServiceKey {
    pub fn new(host_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            description: description.into(),
        }
    }
}

impl std::fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{};{}", self.host_name, self.description)
    }
}

/// Result of a host check, applied with `MonitoringCore::record_host_check`.
#[derive(Debug, Clone, PartialEq)]
pub struct HostCheck {
    pub state: HostState,
    pub plugin_output: String,
    pub latency: f64,
    pub checked_at: Timestamp,
}

/// Result of a service check.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCheck {
    pub state: ServiceState,
    pub plugin_output: String,
    pub execution_time: f64,
    pub checked_at: Timestamp,
}

// ============================================================================
// COMMENTS AND DOWNTIMES
// ============================================================================

/// An operator or system comment on a host or a service.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub entry_time: Timestamp,
    pub entry_type: CommentEntryType,
    pub source: CommentSource,
    pub persistent: bool,
    pub expires: bool,
    pub expire_time: Timestamp,
    pub host: Arc<Host>,
    pub service: Option<Arc<Service>>,
}

impl Comment {
    /// Comment on a host.
    pub fn for_host(id: i64, host: &Arc<Host>, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            author: author.into(),
            text: text.into(),
            entry_time: EPOCH,
            entry_type: CommentEntryType::User,
            source: CommentSource::Internal,
            persistent: false,
            expires: false,
            expire_time: EPOCH,
            host: Arc::clone(host),
            service: None,
        }
    }

    /// Comment on a service. The host is the service's host.
    pub fn for_service(
        id: i64,
        service: &Arc<Service>,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            service: Some(Arc::clone(service)),
            ..Self::for_host(id, &service.host, author, text)
        }
    }

    pub fn with_entry_time(mut self, entry_time: Timestamp) -> Self {
        self.entry_time = entry_time;
        self
    }

    pub fn with_entry_type(mut self, entry_type: CommentEntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    pub fn with_source(mut self, source: CommentSource) -> Self {
        self.source = source;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn expiring_at(mut self, expire_time: Timestamp) -> Self {
        self.expires = true;
        self.expire_time = expire_time;
        self
    }

    pub fn is_service(&self) -> bool {
        self.service.is_some()
    }

    /// `host_service` reference used in log and error messages.
    pub fn target(&self) -> String {
        target_of(&self.host, self.service.as_deref())
    }
}

/// Scheduled downtime for a host or a service.
#[derive(Debug, Clone, PartialEq)]
pub struct Downtime {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub entry_time: Timestamp,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Fixed downtimes span exactly `start_time..end_time`. Flexible ones
    /// last `duration` seconds from whenever they are triggered.
    pub fixed: bool,
    pub duration: i64,
    /// Id of the downtime that triggered this one.
    pub triggered_by: Option<i64>,
    pub host: Arc<Host>,
    pub service: Option<Arc<Service>>,
}

impl Downtime {
    /// Fixed downtime for a host.
    pub fn for_host(
        id: i64,
        host: &Arc<Host>,
        author: impl Into<String>,
        text: impl Into<String>,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Self {
        Self {
            id,
            author: author.into(),
            text: text.into(),
            entry_time: EPOCH,
            start_time,
            end_time,
            fixed: true,
            duration: (end_time - start_time).num_seconds(),
            triggered_by: None,
            host: Arc::clone(host),
            service: None,
        }
    }

    /// Fixed downtime for a service.
    pub fn for_service(
        id: i64,
        service: &Arc<Service>,
        author: impl Into<String>,
        text: impl Into<String>,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Self {
        Self {
            service: Some(Arc::clone(service)),
            ..Self::for_host(id, &service.host, author, text, start_time, end_time)
        }
    }

    /// Make this a flexible downtime of `duration` seconds.
    pub fn flexible(mut self, duration: i64) -> Self {
        self.fixed = false;
        self.duration = duration;
        self
    }

    pub fn with_entry_time(mut self, entry_time: Timestamp) -> Self {
        self.entry_time = entry_time;
        self
    }

    pub fn triggered_by(mut self, id: i64) -> Self {
        self.triggered_by = Some(id);
        self
    }

    pub fn is_service(&self) -> bool {
        self.service.is_some()
    }

    pub fn target(&self) -> String {
        target_of(&self.host, self.service.as_deref())
    }
}

fn target_of(host: &Host, service: Option<&Service>) -> String {
    match service {
        Some(service) => format!("{};{}", host.name, service.description),
        None => host.name.clone(),
    }
}

// ============================================================================
// CONTACTS
// ============================================================================

/// A person who may be notified and who may query the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub alias: String,
    pub email: String,
    pub pager: String,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_pager(mut self, pager: impl Into<String>) -> Self {
        self.pager = pager.into();
        self
    }
}

/// A named set of contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactGroup {
    pub name: String,
    pub alias: String,
    pub members: Vec<String>,
}

impl ContactGroup {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_member(&self, contact: &str) -> bool {
        self.members.iter().any(|member| member == contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_host_defaults() {
        let host = Host::new("web01").with_address("10.0.0.1");
        assert_eq!(host.display_name, "web01");
        assert_eq!(host.alias, "web01");
        assert_eq!(host.address, "10.0.0.1");
        assert!(!host.has_been_checked);
        assert_eq!(host.last_check, EPOCH);
    }

    #[test]
    fn test_service_comment_points_at_service_host() {
        let host = Arc::new(Host::new("db01"));
        let service = Arc::new(Service::new(&host, "Disk /"));
        let comment = Comment::for_service(3, &service, "bob", "cleaning up");
        assert!(comment.is_service());
        assert!(Arc::ptr_eq(&comment.host, &host));
        assert_eq!(comment.target(), "db01;Disk /");
        assert_eq!(service.key().to_string(), "db01;Disk /");
    }

    #[test]
    fn test_downtime_duration() {
        let host = Arc::new(Host::new("db01"));
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let downtime = Downtime::for_host(1, &host, "ops", "patching", start, start + Duration::hours(2));
        assert!(downtime.fixed);
        assert_eq!(downtime.duration, 7200);
        assert_eq!(downtime.target(), "db01");

        let flexible = downtime.flexible(600);
        assert!(!flexible.fixed);
        assert_eq!(flexible.duration, 600);
    }

    #[test]
    fn test_state_codes() {
        assert_eq!(HostState::Unreachable.code(), 2);
        assert_eq!(ServiceState::Unknown.code(), 3);
        assert_eq!(CommentEntryType::Acknowledgement.code(), 4);
        assert_eq!(CommentSource::External.code(), 1);
    }

    #[test]
    fn test_contact_group_membership() {
        let group = ContactGroup::new("admins", ["alice", "carol"]);
        assert!(group.has_member("alice"));
        assert!(!group.has_member("bob"));
    }
}

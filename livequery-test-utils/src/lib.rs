//! LiveQuery Test Utilities
//!
//! Shared test infrastructure for the LiveQuery workspace:
//! - Tracing setup that writes through the test harness
//! - Proptest generators for monitoring entities and populated cores
//! - Fixtures for common scenarios
//! - Assertions for LiveQuery error kinds

pub use livequery_core::{
    Collect, Count, Flow, Identity, Inspect, Limit, LiveQueryError, LiveQueryResult, Query, Row,
    SchemaError, StoreError, Value,
};
pub use livequery_monitor::{
    Comment, CommentEntryType, CommentSource, Contact, ContactGroup, Downtime, Host, HostState,
    MonitoringCore, Service, ServiceKey, ServiceState,
};

use chrono::DateTime;
use livequery_core::Timestamp;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// TRACING
// ============================================================================

/// Install a subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`, defaulting to debug for the livequery crates. Safe to call from
/// every test; only the first call installs anything.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("livequery_core=debug,livequery_tables=debug,warn"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Contact names known to generated cores.
pub static CONTACTS: [&str; 4] = ["alice", "bob", "carol", "dave"];

/// Contact groups known to generated cores, with their members.
pub static GROUPS: [(&str, &[&str]); 3] = [
    ("admins", &["alice"]),
    ("web", &["bob", "carol"]),
    ("dba", &["dave"]),
];

fn at(secs: i64) -> Timestamp {
    DateTime::from_timestamp(secs, 0).unwrap_or(livequery_core::EPOCH)
}

// ============================================================================
// CORE PLANS
// ============================================================================

/// Host to register, with its services.
#[derive(Debug, Clone, PartialEq)]
pub struct HostPlan {
    pub name: String,
    pub contacts: Vec<String>,
    pub contact_groups: Vec<String>,
    pub services: Vec<ServicePlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServicePlan {
    pub description: String,
    pub contacts: Vec<String>,
    pub contact_groups: Vec<String>,
}

/// Comment or downtime to register against `hosts[host]`, optionally on
/// one of its services (taken modulo the host's service count).
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationPlan {
    pub author: String,
    pub host: usize,
    pub service: Option<usize>,
}

/// Declarative description of a populated monitoring core.
///
/// Plans are plain data, so proptest can generate and shrink them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorePlan {
    pub hosts: Vec<HostPlan>,
    pub comments: Vec<AnnotationPlan>,
    pub downtimes: Vec<AnnotationPlan>,
}

impl CorePlan {
    /// Register every planned entity in a fresh core.
    ///
    /// Comments and downtimes get ids `1..` in plan order. Annotations that
    /// point at a missing host are skipped.
    pub fn build(&self) -> LiveQueryResult<Arc<MonitoringCore>> {
        let core = Arc::new(MonitoringCore::new());
        for name in CONTACTS {
            core.add_contact(Contact::new(name).with_email(format!("{name}@example.com")))?;
        }
        for (group, members) in GROUPS {
            core.add_contact_group(ContactGroup::new(group, members.iter().copied()))?;
        }

        let mut registered = Vec::with_capacity(self.hosts.len());
        for plan in &self.hosts {
            let mut host = Host::new(plan.name.clone());
            host.contacts = plan.contacts.clone();
            host.contact_groups = plan.contact_groups.clone();
            let host = core.add_host(host)?;
            let mut services = Vec::with_capacity(plan.services.len());
            for service_plan in &plan.services {
                let mut service = Service::new(&host, service_plan.description.clone());
                service.contacts = service_plan.contacts.clone();
                service.contact_groups = service_plan.contact_groups.clone();
                services.push(core.add_service(service)?);
            }
            registered.push((host, services));
        }

        let target = |plan: &AnnotationPlan| {
            let (host, services) = registered.get(plan.host)?;
            let service = match plan.service {
                Some(index) if !services.is_empty() => Some(&services[index % services.len()]),
                _ => None,
            };
            Some((host, service))
        };

        for (id, plan) in (1i64..).zip(&self.comments) {
            let Some((host, service)) = target(plan) else {
                continue;
            };
            let comment = match service {
                Some(service) => Comment::for_service(id, service, plan.author.clone(), "generated"),
                None => Comment::for_host(id, host, plan.author.clone(), "generated"),
            };
            core.add_comment(comment.with_entry_time(at(1_600_000_000 + id)))?;
        }
        for (id, plan) in (1i64..).zip(&self.downtimes) {
            let Some((host, service)) = target(plan) else {
                continue;
            };
            let (start, end) = (at(1_700_000_000), at(1_700_003_600));
            let downtime = match service {
                Some(service) => Downtime::for_service(id, service, plan.author.clone(), "generated", start, end),
                None => Downtime::for_host(id, host, plan.author.clone(), "generated", start, end),
            };
            core.add_downtime(downtime)?;
        }
        Ok(core)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for monitoring entities.

    use super::*;
    use proptest::prelude::*;

    /// Timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1_577_836_800i64..1_893_456_000i64).prop_map(at)
    }

    pub fn arb_host_state() -> impl Strategy<Value = HostState> {
        prop_oneof![
            Just(HostState::Up),
            Just(HostState::Down),
            Just(HostState::Unreachable),
        ]
    }

    pub fn arb_service_state() -> impl Strategy<Value = ServiceState> {
        prop_oneof![
            Just(ServiceState::Ok),
            Just(ServiceState::Warning),
            Just(ServiceState::Critical),
            Just(ServiceState::Unknown),
        ]
    }

    pub fn arb_comment_entry_type() -> impl Strategy<Value = CommentEntryType> {
        prop_oneof![
            Just(CommentEntryType::User),
            Just(CommentEntryType::Downtime),
            Just(CommentEntryType::Flapping),
            Just(CommentEntryType::Acknowledgement),
        ]
    }

    /// Any subset of the known contacts.
    pub fn arb_contacts() -> impl Strategy<Value = Vec<String>> {
        proptest::sample::subsequence(CONTACTS.to_vec(), 0..=CONTACTS.len())
            .prop_map(|names| names.into_iter().map(str::to_string).collect())
    }

    /// Any subset of the known contact groups.
    pub fn arb_contact_groups() -> impl Strategy<Value = Vec<String>> {
        let names: Vec<&'static str> = GROUPS.iter().map(|(name, _)| *name).collect();
        let len = names.len();
        proptest::sample::subsequence(names, 0..=len)
            .prop_map(|names| names.into_iter().map(str::to_string).collect())
    }

    /// Identity as resolved for one of the known contacts, an unknown user,
    /// or no user at all.
    pub fn arb_identity() -> impl Strategy<Value = Identity> {
        prop_oneof![
            Just(Identity::Unrestricted),
            Just(Identity::unknown("mallory")),
            proptest::sample::select(CONTACTS.to_vec()).prop_map(|name| {
                let groups = GROUPS
                    .iter()
                    .filter(|(_, members)| members.contains(&name))
                    .map(|(group, _)| *group);
                Identity::contact(name, groups)
            }),
        ]
    }

    pub fn arb_host_plan(index: usize) -> impl Strategy<Value = HostPlan> {
        (
            arb_contacts(),
            arb_contact_groups(),
            proptest::collection::vec((arb_contacts(), arb_contact_groups()), 0..4),
        )
            .prop_map(move |(contacts, contact_groups, services)| HostPlan {
                name: format!("host{index}"),
                contacts,
                contact_groups,
                services: services
                    .into_iter()
                    .enumerate()
                    .map(|(position, (contacts, contact_groups))| ServicePlan {
                        description: format!("svc{position}"),
                        contacts,
                        contact_groups,
                    })
                    .collect(),
            })
    }

    pub fn arb_annotation_plan(hosts: usize) -> impl Strategy<Value = AnnotationPlan> {
        (
            proptest::sample::select(CONTACTS.to_vec()),
            0..hosts.max(1),
            proptest::option::of(0usize..4),
        )
            .prop_map(|(author, host, service)| AnnotationPlan {
                author: author.to_string(),
                host,
                service,
            })
    }

    /// A populated core plan: 1 to 5 hosts with up to 3 services each, up to
    /// 20 comments and up to 8 downtimes.
    pub fn arb_core_plan() -> impl Strategy<Value = CorePlan> {
        (1usize..=5)
            .prop_flat_map(|host_count| {
                let hosts = (0..host_count).map(arb_host_plan).collect::<Vec<_>>();
                (
                    hosts,
                    proptest::collection::vec(arb_annotation_plan(host_count), 0..20),
                    proptest::collection::vec(arb_annotation_plan(host_count), 0..8),
                )
            })
            .prop_map(|(hosts, comments, downtimes)| CorePlan {
                hosts,
                comments,
                downtimes,
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built monitoring cores for common scenarios.

    use super::*;

    /// One host `web01` with one comment: author `alice`, id 7, no service.
    pub fn single_host_comment() -> LiveQueryResult<Arc<MonitoringCore>> {
        let core = Arc::new(MonitoringCore::new());
        let host = core.add_host(
            Host::new("web01")
                .with_address("192.0.2.10")
                .with_contact("alice"),
        )?;
        core.add_contact(Contact::new("alice"))?;
        core.add_comment(
            Comment::for_host(7, &host, "alice", "disk replaced").with_entry_time(at(1_700_000_000)),
        )?;
        Ok(core)
    }

    /// Two hosts, three services, contacts, groups, comments and downtimes.
    ///
    /// - `web01` is alice's host; its `HTTP` service is bob's, its `HTTPS`
    ///   service belongs to the `web` group.
    /// - `db01` belongs to the `dba` group; its `MySQL` service has no
    ///   contacts of its own.
    /// - Comments 1..=4 and downtimes 1..=2 are spread across all of them.
    pub fn sample_core() -> LiveQueryResult<Arc<MonitoringCore>> {
        let core = Arc::new(MonitoringCore::new());
        for name in CONTACTS {
            core.add_contact(Contact::new(name).with_email(format!("{name}@example.com")))?;
        }
        for (group, members) in GROUPS {
            core.add_contact_group(ContactGroup::new(group, members.iter().copied()))?;
        }

        let web = core.add_host(Host::new("web01").with_address("192.0.2.10").with_contact("alice"))?;
        let db = core.add_host(Host::new("db01").with_address("192.0.2.20").with_contact_group("dba"))?;
        let http = core.add_service(Service::new(&web, "HTTP").with_contact("bob"))?;
        let https = core.add_service(Service::new(&web, "HTTPS").with_contact_group("web"))?;
        let mysql = core.add_service(Service::new(&db, "MySQL"))?;

        core.add_comment(Comment::for_host(1, &web, "alice", "rebooted").with_entry_time(at(1_700_000_000)))?;
        core.add_comment(Comment::for_service(2, &http, "bob", "slow responses").with_entry_time(at(1_700_000_100)))?;
        core.add_comment(
            Comment::for_service(3, &https, "carol", "certificate renewed")
                .with_entry_type(CommentEntryType::Acknowledgement)
                .persistent(),
        )?;
        core.add_comment(Comment::for_service(4, &mysql, "dave", "replication lag"))?;

        core.add_downtime(Downtime::for_host(1, &db, "dave", "kernel update", at(1_700_010_000), at(1_700_013_600)))?;
        core.add_downtime(
            Downtime::for_service(2, &https, "carol", "proxy swap", at(1_700_020_000), at(1_700_021_800))
                .flexible(600),
        )?;
        Ok(core)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for LiveQuery-specific results.

    use super::*;

    pub fn assert_schema_error<T: std::fmt::Debug>(result: &LiveQueryResult<T>) {
        assert!(
            matches!(result, Err(LiveQueryError::Schema(_))),
            "Expected schema error, got: {:?}",
            result
        );
    }

    pub fn assert_store_error<T: std::fmt::Debug>(result: &LiveQueryResult<T>) {
        assert!(
            matches!(result, Err(LiveQueryError::Store(_))),
            "Expected store error, got: {:?}",
            result
        );
    }

    /// Every value is its column type's empty value.
    pub fn assert_all_empty(values: &[Value<'_>]) {
        for value in values {
            assert!(value.is_empty_value(), "Expected empty value, got: {:?}", value);
        }
    }
}

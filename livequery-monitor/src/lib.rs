//! LiveQuery Monitor - Live Entities and Their Owner
//!
//! The monitoring core owns hosts, services, comments, downtimes and
//! contacts. Tables read them under the core's read lock; check results and
//! operator actions change them under its write lock.

pub mod auth;
pub mod entities;
pub mod store;

pub use auth::Authorizer;
pub use entities::{
    Comment, CommentEntryType, CommentSource, Contact, ContactGroup, Downtime, Host, HostCheck,
    HostState, Service, ServiceCheck, ServiceKey, ServiceState,
};
pub use store::{CoreState, MonitoringCore};

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

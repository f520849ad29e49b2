//! LiveQuery Tables - Monitoring Tables
//!
//! Table instantiations over the monitoring core and the default wiring
//! that registers them all.

pub mod comments;
pub mod contacts;
pub mod downtimes;
pub mod hosts;
pub mod services;

pub use comments::CommentsTable;
pub use contacts::ContactsTable;
pub use downtimes::DowntimesTable;
pub use hosts::HostsTable;
pub use services::ServicesTable;

use livequery_core::{EngineConfig, LiveQueryResult, Query, TableRegistry};
use livequery_monitor::{Authorizer, MonitoringCore};
use std::sync::Arc;

/// Register every monitoring table over `core`. The `columns` table is
/// appended last.
pub fn default_registry(
    core: Arc<MonitoringCore>,
    config: &EngineConfig,
) -> LiveQueryResult<TableRegistry> {
    let authorizer = Authorizer::from_config(config);
    TableRegistry::builder()
        .register(Arc::new(HostsTable::new(Arc::clone(&core), authorizer)?))
        .register(Arc::new(ServicesTable::new(Arc::clone(&core), authorizer)?))
        .register(Arc::new(CommentsTable::new(Arc::clone(&core), authorizer)?))
        .register(Arc::new(DowntimesTable::new(Arc::clone(&core), authorizer)?))
        .register(Arc::new(ContactsTable::new(core)?))
        .build()
}

/// A monitoring core together with the tables wired over it.
#[derive(Debug)]
pub struct Engine {
    core: Arc<MonitoringCore>,
    registry: TableRegistry,
}

impl Engine {
    pub fn new(core: Arc<MonitoringCore>, config: &EngineConfig) -> LiveQueryResult<Self> {
        let registry = default_registry(Arc::clone(&core), config)?;
        Ok(Self { core, registry })
    }

    pub fn core(&self) -> &Arc<MonitoringCore> {
        &self.core
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Answer a query against `table` as `user`.
    ///
    /// The user is resolved to an identity before the first row is visited.
    /// Without a user every row is visible. Returns the number of rows
    /// withheld by authorization.
    pub fn answer_query(
        &self,
        table: &str,
        user: Option<&str>,
        query: &mut dyn Query,
    ) -> LiveQueryResult<usize> {
        let identity = self.core.resolve_identity(user)?;
        self.registry.answer_query(table, &identity, query)
    }
}

//! The `services` table.

use crate::hosts::HostsTable;
use livequery_core::{
    borrow_all, push_rows, BoolColumn, Column, ColumnOffsets, ColumnRegistry, DoubleColumn,
    Identity, IntColumn, ListColumn, LiveQueryResult, Query, Row, StringColumn, Table, TimeColumn,
};
use livequery_monitor::{Authorizer, MonitoringCore, Service};
use std::borrow::Cow;
use std::sync::Arc;

pub const TABLE: &str = "services";

/// One row per registered service, in registration order.
pub struct ServicesTable {
    core: Arc<MonitoringCore>,
    authorizer: Authorizer,
    columns: ColumnRegistry<Service>,
}

impl ServicesTable {
    pub fn new(core: Arc<MonitoringCore>, authorizer: Authorizer) -> LiveQueryResult<Self> {
        let columns = Self::column_set(true)?;
        tracing::debug!(table = TABLE, columns = columns.len(), "wired table");
        Ok(Self {
            core,
            authorizer,
            columns,
        })
    }

    /// Service columns. With `with_host`, the service's host columns are
    /// embedded under `host_`. Tables that embed services next to their own
    /// host columns pass `false`.
    pub fn column_set(with_host: bool) -> LiveQueryResult<ColumnRegistry<Service>> {
        let offsets = ColumnOffsets::<Service>::new();
        let mut columns = ColumnRegistry::new(TABLE);
        columns.add_column(StringColumn::new(
            "description",
            "Service description",
            &offsets,
            |s: &Service| Cow::Borrowed(s.description.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "display_name",
            "An optional display name",
            &offsets,
            |s: &Service| Cow::Borrowed(s.display_name.as_str()),
        ))?;
        columns.add_column(IntColumn::new(
            "state",
            "The current state of the service (0: OK, 1: WARN, 2: CRITICAL, 3: UNKNOWN)",
            &offsets,
            |s: &Service| s.state.code(),
        ))?;
        columns.add_column(BoolColumn::new(
            "has_been_checked",
            "Whether the service already has been checked (0/1)",
            &offsets,
            |s: &Service| s.has_been_checked,
        ))?;
        columns.add_column(TimeColumn::new(
            "last_check",
            "The time of the last check (Unix timestamp)",
            &offsets,
            |s: &Service| s.last_check,
        ))?;
        columns.add_column(StringColumn::new(
            "plugin_output",
            "Output of the last check",
            &offsets,
            |s: &Service| Cow::Borrowed(s.plugin_output.as_str()),
        ))?;
        columns.add_column(DoubleColumn::new(
            "execution_time",
            "Time the service check needed for execution",
            &offsets,
            |s: &Service| s.execution_time,
        ))?;
        columns.add_column(ListColumn::new(
            "contacts",
            "A list of all contacts of the service, either direct or via a contact group",
            &offsets,
            |s: &Service| borrow_all(&s.contacts),
        ))?;
        columns.add_column(ListColumn::new(
            "contact_groups",
            "A list of all contact groups this service is in",
            &offsets,
            |s: &Service| borrow_all(&s.contact_groups),
        ))?;
        if with_host {
            columns.add_columns(
                &HostsTable::column_set()?,
                "host_",
                &offsets.add(|s: &Service| Some(&*s.host)),
            )?;
        }
        Ok(columns)
    }
}

impl Table for ServicesTable {
    fn name(&self) -> &str {
        TABLE
    }

    fn name_prefix(&self) -> &str {
        "service_"
    }

    fn columns(&self) -> &[Arc<dyn Column>] {
        self.columns.as_slice()
    }

    fn find_column(&self, name: &str) -> Option<&Arc<dyn Column>> {
        self.columns.get(name)
    }

    fn answer_query(&self, query: &mut dyn Query) -> LiveQueryResult<()> {
        let state = self.core.read()?;
        push_rows(TABLE, state.services(), query);
        Ok(())
    }

    fn is_authorized(&self, row: Row<'_>, identity: &Identity) -> bool {
        row.raw_data::<Service>()
            .is_some_and(|service| self.authorizer.service_visible(identity, service))
    }
}

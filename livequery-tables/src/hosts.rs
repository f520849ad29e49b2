//! The `hosts` table.

use livequery_core::{
    borrow_all, BoolColumn, Column, ColumnOffsets, ColumnRegistry, DoubleColumn, Identity,
    IntColumn, ListColumn, LiveQueryResult, Query, Row, StringColumn, Table, TimeColumn,
    push_rows,
};
use livequery_monitor::{Authorizer, Host, MonitoringCore};
use std::borrow::Cow;
use std::sync::Arc;

pub const TABLE: &str = "hosts";

/// One row per registered host, in registration order.
pub struct HostsTable {
    core: Arc<MonitoringCore>,
    authorizer: Authorizer,
    columns: ColumnRegistry<Host>,
}

impl HostsTable {
    pub fn new(core: Arc<MonitoringCore>, authorizer: Authorizer) -> LiveQueryResult<Self> {
        let columns = Self::column_set()?;
        tracing::debug!(table = TABLE, columns = columns.len(), "wired table");
        Ok(Self {
            core,
            authorizer,
            columns,
        })
    }

    /// Host columns, for this table and for embedding under `host_`.
    pub fn column_set() -> LiveQueryResult<ColumnRegistry<Host>> {
        let offsets = ColumnOffsets::<Host>::new();
        let mut columns = ColumnRegistry::new(TABLE);
        columns.add_column(StringColumn::new(
            "name",
            "Host name",
            &offsets,
            |h: &Host| Cow::Borrowed(h.name.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "display_name",
            "Optional display name of the host",
            &offsets,
            |h: &Host| Cow::Borrowed(h.display_name.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "alias",
            "An alias name for the host",
            &offsets,
            |h: &Host| Cow::Borrowed(h.alias.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "address",
            "IP address",
            &offsets,
            |h: &Host| Cow::Borrowed(h.address.as_str()),
        ))?;
        columns.add_column(IntColumn::new(
            "state",
            "The current state of the host (0: up, 1: down, 2: unreachable)",
            &offsets,
            |h: &Host| h.state.code(),
        ))?;
        columns.add_column(BoolColumn::new(
            "has_been_checked",
            "Whether the host has already been checked (0/1)",
            &offsets,
            |h: &Host| h.has_been_checked,
        ))?;
        columns.add_column(TimeColumn::new(
            "last_check",
            "Time of the last check (Unix timestamp)",
            &offsets,
            |h: &Host| h.last_check,
        ))?;
        columns.add_column(StringColumn::new(
            "plugin_output",
            "Output of the last host check",
            &offsets,
            |h: &Host| Cow::Borrowed(h.plugin_output.as_str()),
        ))?;
        columns.add_column(DoubleColumn::new(
            "latency",
            "Time difference between scheduled check time and actual check time",
            &offsets,
            |h: &Host| h.latency,
        ))?;
        columns.add_column(ListColumn::new(
            "contacts",
            "A list of all contacts of this host, either direct or via a contact group",
            &offsets,
            |h: &Host| borrow_all(&h.contacts),
        ))?;
        columns.add_column(ListColumn::new(
            "contact_groups",
            "A list of all contact groups this host is in",
            &offsets,
            |h: &Host| borrow_all(&h.contact_groups),
        ))?;
        Ok(columns)
    }
}

impl Table for HostsTable {
    fn name(&self) -> &str {
        TABLE
    }

    fn name_prefix(&self) -> &str {
        "host_"
    }

    fn columns(&self) -> &[Arc<dyn Column>] {
        self.columns.as_slice()
    }

    fn find_column(&self, name: &str) -> Option<&Arc<dyn Column>> {
        self.columns.get(name)
    }

    fn answer_query(&self, query: &mut dyn Query) -> LiveQueryResult<()> {
        let state = self.core.read()?;
        push_rows(TABLE, state.hosts(), query);
        Ok(())
    }

    fn is_authorized(&self, row: Row<'_>, identity: &Identity) -> bool {
        row.raw_data::<Host>()
            .is_some_and(|host| self.authorizer.host_visible(identity, host))
    }
}

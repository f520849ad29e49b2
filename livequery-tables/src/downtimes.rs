//! The `downtimes` table.

use crate::hosts::HostsTable;
use crate::services::ServicesTable;
use livequery_core::{
    push_rows, BoolColumn, Column, ColumnOffsets, ColumnRegistry, Identity, IntColumn,
    LiveQueryResult, Query, Row, StringColumn, Table, TimeColumn,
};
use livequery_monitor::{Authorizer, Downtime, MonitoringCore};
use std::borrow::Cow;
use std::sync::Arc;

pub const TABLE: &str = "downtimes";

/// One row per scheduled downtime, by ascending id.
pub struct DowntimesTable {
    core: Arc<MonitoringCore>,
    authorizer: Authorizer,
    columns: ColumnRegistry<Downtime>,
}

impl DowntimesTable {
    pub fn new(core: Arc<MonitoringCore>, authorizer: Authorizer) -> LiveQueryResult<Self> {
        let columns = Self::column_set()?;
        tracing::debug!(table = TABLE, columns = columns.len(), "wired table");
        Ok(Self {
            core,
            authorizer,
            columns,
        })
    }

    pub fn column_set() -> LiveQueryResult<ColumnRegistry<Downtime>> {
        let offsets = ColumnOffsets::<Downtime>::new();
        let mut columns = ColumnRegistry::new(TABLE);
        columns.add_column(IntColumn::new(
            "id",
            "The id of the downtime",
            &offsets,
            |d: &Downtime| d.id,
        ))?;
        columns.add_column(StringColumn::new(
            "author",
            "The contact that scheduled the downtime",
            &offsets,
            |d: &Downtime| Cow::Borrowed(d.author.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "comment",
            "A comment text",
            &offsets,
            |d: &Downtime| Cow::Borrowed(d.text.as_str()),
        ))?;
        columns.add_column(TimeColumn::new(
            "entry_time",
            "The time the entry was made as UNIX timestamp",
            &offsets,
            |d: &Downtime| d.entry_time,
        ))?;
        columns.add_column(TimeColumn::new(
            "start_time",
            "The start time of the downtime as UNIX timestamp",
            &offsets,
            |d: &Downtime| d.start_time,
        ))?;
        columns.add_column(TimeColumn::new(
            "end_time",
            "The end time of the downtime as UNIX timestamp",
            &offsets,
            |d: &Downtime| d.end_time,
        ))?;
        columns.add_column(IntColumn::new(
            "fixed",
            "A 1 if the downtime is fixed, a 0 if it is flexible",
            &offsets,
            |d: &Downtime| i64::from(d.fixed),
        ))?;
        columns.add_column(IntColumn::new(
            "duration",
            "The duration of the downtime in seconds",
            &offsets,
            |d: &Downtime| d.duration,
        ))?;
        columns.add_column(IntColumn::new(
            "triggered_by",
            "The id of the downtime this downtime was triggered by or 0 if it was not triggered by another downtime",
            &offsets,
            |d: &Downtime| d.triggered_by.unwrap_or(0),
        ))?;
        columns.add_column(IntColumn::new(
            "type",
            "The type of the downtime: 1 is host, 2 is service",
            &offsets,
            |d: &Downtime| if d.is_service() { 2 } else { 1 },
        ))?;
        columns.add_column(BoolColumn::new(
            "is_service",
            "0, if this entry is for a host, 1 if it is for a service",
            &offsets,
            |d: &Downtime| d.is_service(),
        ))?;
        columns.add_columns(
            &HostsTable::column_set()?,
            "host_",
            &offsets.add(|d: &Downtime| Some(&*d.host)),
        )?;
        columns.add_columns(
            &ServicesTable::column_set(false)?,
            "service_",
            &offsets.add(|d: &Downtime| d.service.as_deref()),
        )?;
        Ok(columns)
    }
}

impl Table for DowntimesTable {
    fn name(&self) -> &str {
        TABLE
    }

    fn name_prefix(&self) -> &str {
        "downtime_"
    }

    fn columns(&self) -> &[Arc<dyn Column>] {
        self.columns.as_slice()
    }

    fn find_column(&self, name: &str) -> Option<&Arc<dyn Column>> {
        self.columns.get(name)
    }

    fn answer_query(&self, query: &mut dyn Query) -> LiveQueryResult<()> {
        let state = self.core.read()?;
        push_rows(TABLE, state.downtimes(), query);
        Ok(())
    }

    fn is_authorized(&self, row: Row<'_>, identity: &Identity) -> bool {
        row.raw_data::<Downtime>().is_some_and(|downtime| {
            self.authorizer
                .attached_visible(identity, &downtime.host, downtime.service.as_deref())
        })
    }
}

//! The `comments` table.
//!
//! A comment row exposes the comment's own fields, its host under `host_`
//! and its service under `service_`. Host-only comments read every
//! `service_*` column as that column's empty value.

use crate::hosts::HostsTable;
use crate::services::ServicesTable;
use livequery_core::{
    push_rows, BoolColumn, Column, ColumnOffsets, ColumnRegistry, Identity, IntColumn,
    LiveQueryResult, Query, Row, StringColumn, Table, TimeColumn,
};
use livequery_monitor::{Authorizer, Comment, MonitoringCore};
use std::borrow::Cow;
use std::sync::Arc;

pub const TABLE: &str = "comments";

/// One row per comment, by ascending id.
pub struct CommentsTable {
    core: Arc<MonitoringCore>,
    authorizer: Authorizer,
    columns: ColumnRegistry<Comment>,
}

impl CommentsTable {
    pub fn new(core: Arc<MonitoringCore>, authorizer: Authorizer) -> LiveQueryResult<Self> {
        let columns = Self::column_set()?;
        tracing::debug!(table = TABLE, columns = columns.len(), "wired table");
        Ok(Self {
            core,
            authorizer,
            columns,
        })
    }

    pub fn column_set() -> LiveQueryResult<ColumnRegistry<Comment>> {
        let offsets = ColumnOffsets::<Comment>::new();
        let mut columns = ColumnRegistry::new(TABLE);
        columns.add_column(StringColumn::new(
            "author",
            "The contact that entered the comment",
            &offsets,
            |c: &Comment| Cow::Borrowed(c.author.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "comment",
            "A comment text",
            &offsets,
            |c: &Comment| Cow::Borrowed(c.text.as_str()),
        ))?;
        columns.add_column(IntColumn::new(
            "id",
            "The id of the comment",
            &offsets,
            |c: &Comment| c.id,
        ))?;
        columns.add_column(TimeColumn::new(
            "entry_time",
            "The time the entry was made as UNIX timestamp",
            &offsets,
            |c: &Comment| c.entry_time,
        ))?;
        columns.add_column(IntColumn::new(
            "type",
            "The type of the comment: 1 is host, 2 is service",
            &offsets,
            |c: &Comment| if c.is_service() { 2 } else { 1 },
        ))?;
        columns.add_column(BoolColumn::new(
            "is_service",
            "0, if this entry is for a host, 1 if it is for a service",
            &offsets,
            |c: &Comment| c.is_service(),
        ))?;
        columns.add_column(IntColumn::new(
            "persistent",
            "Whether this comment is persistent (0/1)",
            &offsets,
            |c: &Comment| i64::from(c.persistent),
        ))?;
        columns.add_column(IntColumn::new(
            "source",
            "The source of the comment (0 is internal and 1 is external)",
            &offsets,
            |c: &Comment| c.source.code(),
        ))?;
        columns.add_column(IntColumn::new(
            "entry_type",
            "The type of the comment: 1 is user, 2 is downtime, 3 is flapping and 4 is acknowledgement",
            &offsets,
            |c: &Comment| c.entry_type.code(),
        ))?;
        columns.add_column(IntColumn::new(
            "expires",
            "Whether this comment expires",
            &offsets,
            |c: &Comment| i64::from(c.expires),
        ))?;
        columns.add_column(TimeColumn::new(
            "expire_time",
            "The time of expiry of this comment as a UNIX timestamp",
            &offsets,
            |c: &Comment| c.expire_time,
        ))?;
        columns.add_columns(
            &HostsTable::column_set()?,
            "host_",
            &offsets.add(|c: &Comment| Some(&*c.host)),
        )?;
        columns.add_columns(
            &ServicesTable::column_set(false)?,
            "service_",
            &offsets.add(|c: &Comment| c.service.as_deref()),
        )?;
        Ok(columns)
    }
}

impl Table for CommentsTable {
    fn name(&self) -> &str {
        TABLE
    }

    fn name_prefix(&self) -> &str {
        "comment_"
    }

    fn columns(&self) -> &[Arc<dyn Column>] {
        self.columns.as_slice()
    }

    fn find_column(&self, name: &str) -> Option<&Arc<dyn Column>> {
        self.columns.get(name)
    }

    fn answer_query(&self, query: &mut dyn Query) -> LiveQueryResult<()> {
        let state = self.core.read()?;
        push_rows(TABLE, state.comments(), query);
        Ok(())
    }

    /// A service comment is visible to whoever sees the service; a host
    /// comment to whoever sees the host.
    fn is_authorized(&self, row: Row<'_>, identity: &Identity) -> bool {
        row.raw_data::<Comment>().is_some_and(|comment| {
            self.authorizer
                .attached_visible(identity, &comment.host, comment.service.as_deref())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livequery_core::{Collect, Value};
    use livequery_monitor::{CommentEntryType, Host, Service};

    #[test]
    fn test_comment_columns() {
        let core = Arc::new(MonitoringCore::new());
        let host = core.add_host(Host::new("web01")).unwrap();
        let service = core.add_service(Service::new(&host, "HTTP")).unwrap();
        core.add_comment(
            Comment::for_service(12, &service, "bob", "acknowledged")
                .with_entry_type(CommentEntryType::Acknowledgement)
                .persistent(),
        )
        .unwrap();
        let table = CommentsTable::new(core, Authorizer::default()).unwrap();

        let mut collect = Collect::new(
            &table,
            &[
                "id",
                "type",
                "is_service",
                "entry_type",
                "persistent",
                "host_name",
                "service_description",
            ],
        )
        .unwrap();
        table.answer_query(&mut collect).unwrap();
        assert_eq!(
            collect.rows(),
            &[vec![
                Value::Int(12),
                Value::Int(2),
                Value::Bool(true),
                Value::Int(4),
                Value::Int(1),
                Value::String("web01".into()),
                Value::String("HTTP".into()),
            ]]
        );
    }

    #[test]
    fn test_large_ids_render_distinctly() {
        let core = Arc::new(MonitoringCore::new());
        let host = core.add_host(Host::new("web01")).unwrap();
        for id in [i64::MAX - 1, i64::MAX] {
            core.add_comment(Comment::for_host(id, &host, "alice", "edge"))
                .unwrap();
        }
        let table = CommentsTable::new(core, Authorizer::default()).unwrap();

        let mut collect = Collect::new(&table, &["id", "persistent", "expires"]).unwrap();
        table.answer_query(&mut collect).unwrap();
        assert_eq!(
            collect.rows(),
            &[
                vec![Value::Int(i64::MAX - 1), Value::Int(0), Value::Int(0)],
                vec![Value::Int(i64::MAX), Value::Int(0), Value::Int(0)],
            ]
        );
    }

    #[test]
    fn test_service_host_columns_are_suppressed() {
        let columns = CommentsTable::column_set().unwrap();
        assert!(columns.get("host_name").is_some());
        assert!(columns.get("service_description").is_some());
        assert!(columns.get("service_host_name").is_none());
    }

    #[test]
    fn test_comment_prefix_is_stripped_on_lookup() {
        let table = CommentsTable::new(Arc::new(MonitoringCore::new()), Authorizer::default()).unwrap();
        assert_eq!(table.column("comment_author").map(|c| c.name()), Some("author"));
        assert_eq!(table.column("host_name").map(|c| c.name()), Some("host_name"));
    }
}

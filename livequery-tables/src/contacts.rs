//! The `contacts` table.

use livequery_core::{
    push_rows, Column, ColumnOffsets, ColumnRegistry, Identity, LiveQueryResult, Query, Row,
    StringColumn, Table,
};
use livequery_monitor::{Contact, MonitoringCore};
use std::borrow::Cow;
use std::sync::Arc;

pub const TABLE: &str = "contacts";

/// One row per contact, by name. Visible to everyone.
pub struct ContactsTable {
    core: Arc<MonitoringCore>,
    columns: ColumnRegistry<Contact>,
}

impl ContactsTable {
    pub fn new(core: Arc<MonitoringCore>) -> LiveQueryResult<Self> {
        let columns = Self::column_set()?;
        tracing::debug!(table = TABLE, columns = columns.len(), "wired table");
        Ok(Self { core, columns })
    }

    pub fn column_set() -> LiveQueryResult<ColumnRegistry<Contact>> {
        let offsets = ColumnOffsets::<Contact>::new();
        let mut columns = ColumnRegistry::new(TABLE);
        columns.add_column(StringColumn::new(
            "name",
            "The login name of the contact person",
            &offsets,
            |c: &Contact| Cow::Borrowed(c.name.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "alias",
            "The full name of the contact",
            &offsets,
            |c: &Contact| Cow::Borrowed(c.alias.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "email",
            "The email address of the contact",
            &offsets,
            |c: &Contact| Cow::Borrowed(c.email.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "pager",
            "The pager address of the contact",
            &offsets,
            |c: &Contact| Cow::Borrowed(c.pager.as_str()),
        ))?;
        Ok(columns)
    }
}

impl Table for ContactsTable {
    fn name(&self) -> &str {
        TABLE
    }

    fn name_prefix(&self) -> &str {
        "contact_"
    }

    fn columns(&self) -> &[Arc<dyn Column>] {
        self.columns.as_slice()
    }

    fn find_column(&self, name: &str) -> Option<&Arc<dyn Column>> {
        self.columns.get(name)
    }

    fn answer_query(&self, query: &mut dyn Query) -> LiveQueryResult<()> {
        let state = self.core.read()?;
        push_rows(TABLE, state.contacts(), query);
        Ok(())
    }

    fn is_authorized(&self, _row: Row<'_>, _identity: &Identity) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livequery_core::{Collect, Value};

    #[test]
    fn test_contacts_by_name() {
        let core = Arc::new(MonitoringCore::new());
        core.add_contact(Contact::new("zoe").with_email("zoe@example.com")).unwrap();
        core.add_contact(Contact::new("adam").with_pager("555-0100")).unwrap();
        let table = ContactsTable::new(core).unwrap();

        let mut collect = Collect::all(&table);
        table.answer_query(&mut collect).unwrap();
        assert_eq!(collect.header(), vec!["name", "alias", "email", "pager"]);
        assert_eq!(
            collect.rows(),
            &[
                vec![
                    Value::String("adam".into()),
                    Value::String("adam".into()),
                    Value::String("".into()),
                    Value::String("555-0100".into()),
                ],
                vec![
                    Value::String("zoe".into()),
                    Value::String("zoe".into()),
                    Value::String("zoe@example.com".into()),
                    Value::String("".into()),
                ],
            ]
        );
    }
}

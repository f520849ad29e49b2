//! Table registry and the `columns` introspection table.

use crate::column::{Column, StringColumn};
use crate::column_registry::ColumnRegistry;
use crate::error::{LiveQueryResult, SchemaError};
use crate::identity::Identity;
use crate::offsets::ColumnOffsets;
use crate::query::{Authorized, Query};
use crate::row::Row;
use crate::table::{push_rows, Table};
use crate::value::ColumnType;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the introspection table appended by [`TableRegistryBuilder::build`].
pub const COLUMNS_TABLE: &str = "columns";

// ============================================================================
// COLUMNS TABLE
// ============================================================================

/// One row of the `columns` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub table: String,
    pub name: String,
    pub description: String,
    pub column_type: ColumnType,
}

impl ColumnInfo {
    fn describe(table: &str, column: &dyn Column) -> Self {
        Self {
            table: table.to_string(),
            name: column.name().to_string(),
            description: column.description().to_string(),
            column_type: column.column_type(),
        }
    }
}

/// Lists every column of every registered table, itself included.
///
/// The rows are a snapshot taken when the registry is built. Tables never
/// change after wiring, so the snapshot never goes stale.
pub struct ColumnsTable {
    columns: ColumnRegistry<ColumnInfo>,
    rows: Vec<ColumnInfo>,
}

impl ColumnsTable {
    pub fn column_set() -> LiveQueryResult<ColumnRegistry<ColumnInfo>> {
        let offsets = ColumnOffsets::<ColumnInfo>::new();
        let mut columns = ColumnRegistry::new(COLUMNS_TABLE);
        columns.add_column(StringColumn::new(
            "table",
            "The name of the table",
            &offsets,
            |c: &ColumnInfo| Cow::Borrowed(c.table.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "name",
            "The name of the column within the table",
            &offsets,
            |c: &ColumnInfo| Cow::Borrowed(c.name.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "description",
            "A description of the column",
            &offsets,
            |c: &ColumnInfo| Cow::Borrowed(c.description.as_str()),
        ))?;
        columns.add_column(StringColumn::new(
            "type",
            "The data type of the column (int, double, string, list, time, bool)",
            &offsets,
            |c: &ColumnInfo| Cow::Borrowed(c.column_type.as_str()),
        ))?;
        Ok(columns)
    }

    fn new(tables: &[Arc<dyn Table>]) -> LiveQueryResult<Self> {
        let columns = Self::column_set()?;
        let mut rows: Vec<ColumnInfo> = tables
            .iter()
            .flat_map(|table| {
                table
                    .columns()
                    .iter()
                    .map(move |column| ColumnInfo::describe(table.name(), column.as_ref()))
            })
            .collect();
        rows.extend(
            columns
                .iter()
                .map(|column| ColumnInfo::describe(COLUMNS_TABLE, column.as_ref())),
        );
        Ok(Self { columns, rows })
    }

    pub fn rows(&self) -> &[ColumnInfo] {
        &self.rows
    }
}

impl Table for ColumnsTable {
    fn name(&self) -> &str {
        COLUMNS_TABLE
    }

    fn name_prefix(&self) -> &str {
        "column_"
    }

    fn columns(&self) -> &[Arc<dyn Column>] {
        self.columns.as_slice()
    }

    fn find_column(&self, name: &str) -> Option<&Arc<dyn Column>> {
        self.columns.get(name)
    }

    fn answer_query(&self, query: &mut dyn Query) -> LiveQueryResult<()> {
        push_rows(COLUMNS_TABLE, &self.rows, query);
        Ok(())
    }

    fn is_authorized(&self, _row: Row<'_>, _identity: &Identity) -> bool {
        true
    }
}

impl fmt::Debug for ColumnsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnsTable")
            .field("rows", &self.rows.len())
            .finish()
    }
}

// ============================================================================
// TABLE REGISTRY
// ============================================================================

/// Name-indexed set of tables, frozen after [`TableRegistryBuilder::build`].
pub struct TableRegistry {
    tables: Vec<Arc<dyn Table>>,
    index: HashMap<String, usize>,
}

impl TableRegistry {
    pub fn builder() -> TableRegistryBuilder {
        TableRegistryBuilder::default()
    }

    pub fn table(&self, name: &str) -> Option<&Arc<dyn Table>> {
        self.index.get(name).map(|&position| &self.tables[position])
    }

    /// Like [`TableRegistry::table`], but a missing table is an error.
    pub fn require(&self, name: &str) -> LiveQueryResult<&Arc<dyn Table>> {
        self.table(name).ok_or_else(|| {
            SchemaError::UnknownTable {
                table: name.to_string(),
            }
            .into()
        })
    }

    /// Tables in registration order, `columns` last.
    pub fn tables(&self) -> impl Iterator<Item = &Arc<dyn Table>> {
        self.tables.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|table| table.name())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Answer a query against `table` on behalf of `identity`.
    ///
    /// Only rows the identity may see reach `query`. Returns the number of
    /// rows withheld.
    pub fn answer_query(
        &self,
        table: &str,
        identity: &Identity,
        query: &mut dyn Query,
    ) -> LiveQueryResult<usize> {
        let table = self.require(table)?;
        let mut authorized = Authorized::new(table.as_ref(), identity, query);
        table.answer_query(&mut authorized)?;
        Ok(authorized.denied())
    }
}

impl fmt::Debug for TableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRegistry")
            .field("tables", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects tables for a [`TableRegistry`].
#[derive(Default)]
pub struct TableRegistryBuilder {
    tables: Vec<Arc<dyn Table>>,
}

impl TableRegistryBuilder {
    pub fn register(mut self, table: Arc<dyn Table>) -> Self {
        self.tables.push(table);
        self
    }

    /// Freeze the registry and append the `columns` table.
    ///
    /// Fails if two tables share a name or a table claims the name `columns`.
    pub fn build(self) -> LiveQueryResult<TableRegistry> {
        let mut tables = self.tables;
        let mut index = HashMap::with_capacity(tables.len() + 1);
        for (position, table) in tables.iter().enumerate() {
            let name = table.name();
            if name == COLUMNS_TABLE || index.insert(name.to_string(), position).is_some() {
                return Err(SchemaError::DuplicateTable {
                    table: name.to_string(),
                }
                .into());
            }
        }

        let columns = ColumnsTable::new(&tables)?;
        index.insert(COLUMNS_TABLE.to_string(), tables.len());
        tables.push(Arc::new(columns));

        tracing::debug!(tables = tables.len(), "built table registry");
        Ok(TableRegistry { tables, index })
    }
}

impl fmt::Debug for TableRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRegistryBuilder")
            .field("tables", &self.tables.len())
            .finish()
    }
}

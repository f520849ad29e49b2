//! Ordered, name-unique column registry for one table, and the composition
//! primitive that embeds another table's columns under a name prefix.

use crate::column::Column;
use crate::error::{LiveQueryResult, SchemaError};
use crate::offsets::ColumnOffsets;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Columns of a table whose rows address entities of type `R`.
///
/// Insertion order is declaration order and is the default output order.
/// Column names are unique, including columns embedded under a prefix.
pub struct ColumnRegistry<R> {
    table: String,
    columns: Vec<Arc<dyn Column>>,
    index: HashMap<String, usize>,
    _marker: PhantomData<fn(R)>,
}

impl<R: Any> ColumnRegistry<R> {
    /// Create an empty registry. `table` is used in error messages only.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            index: HashMap::new(),
            _marker: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Register a column.
    ///
    /// Fails if the column's offset chain starts from a different entity
    /// kind than `R`, if its name is empty, or if the name is taken.
    pub fn add_column<C: Column + 'static>(&mut self, column: C) -> LiveQueryResult<()> {
        self.insert(Arc::new(column))
    }

    /// Embed every column of `other` under `prefix`, reached through `offsets`.
    pub fn add_columns<B: Any>(
        &mut self,
        other: &ColumnRegistry<B>,
        prefix: &str,
        offsets: &ColumnOffsets<R, B>,
    ) -> LiveQueryResult<()> {
        self.add_columns_where(other, prefix, offsets, |_| true)
    }

    /// Embed the columns of `other` accepted by `keep` under `prefix`.
    pub fn add_columns_where<B, P>(
        &mut self,
        other: &ColumnRegistry<B>,
        prefix: &str,
        offsets: &ColumnOffsets<R, B>,
        keep: P,
    ) -> LiveQueryResult<()>
    where
        B: Any,
        P: Fn(&dyn Column) -> bool,
    {
        for column in other.iter() {
            if !keep(column.as_ref()) {
                continue;
            }
            let rebased = column.rebase(prefix, offsets.chain())?;
            self.insert(rebased)?;
        }
        Ok(())
    }

    fn insert(&mut self, column: Arc<dyn Column>) -> LiveQueryResult<()> {
        if column.row_type() != TypeId::of::<R>() {
            return Err(SchemaError::RowTypeMismatch {
                column: column.name().to_string(),
                expected: type_name::<R>(),
                found: column.offsets().root_name(),
            }
            .into());
        }
        if column.name().is_empty() {
            return Err(SchemaError::EmptyName {
                table: self.table.clone(),
            }
            .into());
        }
        if self.index.contains_key(column.name()) {
            return Err(SchemaError::DuplicateColumn {
                table: self.table.clone(),
                column: column.name().to_string(),
            }
            .into());
        }
        self.index.insert(column.name().to_string(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Look up a column by exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Column>> {
        self.index.get(name).map(|&position| &self.columns[position])
    }

    /// Columns in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Column>> {
        self.columns.iter()
    }

    pub fn as_slice(&self) -> &[Arc<dyn Column>] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<R> fmt::Debug for ColumnRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnRegistry")
            .field("table", &self.table)
            .field("columns", &self.columns.len())
            .finish()
    }
}

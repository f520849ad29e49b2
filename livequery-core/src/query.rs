//! Query consumer interface and stock consumers.
//!
//! A table pushes rows into a [`Query`] one at a time. The consumer decides
//! whether iteration continues. Filtering, limiting and aggregation all
//! live on this side of the interface.

use crate::column::Column;
use crate::error::{LiveQueryResult, SchemaError};
use crate::identity::Identity;
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Whether a table should keep pushing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Continue,
    /// Stop before visiting further entities. Not an error.
    Stop,
}

/// Per-row consumer.
///
/// The row is only valid for the duration of the call; the signature does
/// not allow keeping it.
pub trait Query {
    fn process_dataset(&mut self, row: Row<'_>) -> Flow;
}

impl<Q: Query + ?Sized> Query for &mut Q {
    fn process_dataset(&mut self, row: Row<'_>) -> Flow {
        (**self).process_dataset(row)
    }
}

// ============================================================================
// COUNT
// ============================================================================

/// Counts pushed rows, optionally stopping after a fixed number.
#[derive(Debug, Clone, Default)]
pub struct Count {
    rows: usize,
    stop_after: Option<usize>,
}

impl Count {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal stop once `limit` rows have been seen. With a limit of 0 no
    /// row is counted.
    pub fn stop_after(limit: usize) -> Self {
        Self {
            rows: 0,
            stop_after: Some(limit),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl Query for Count {
    fn process_dataset(&mut self, _row: Row<'_>) -> Flow {
        if self.stop_after.is_some_and(|limit| self.rows >= limit) {
            return Flow::Stop;
        }
        self.rows += 1;
        match self.stop_after {
            Some(limit) if self.rows >= limit => Flow::Stop,
            _ => Flow::Continue,
        }
    }
}

// ============================================================================
// LIMIT
// ============================================================================

/// Forwards at most `limit` rows to the wrapped consumer.
#[derive(Debug)]
pub struct Limit<Q> {
    inner: Q,
    remaining: usize,
}

impl<Q: Query> Limit<Q> {
    pub fn new(inner: Q, limit: usize) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }

    pub fn into_inner(self) -> Q {
        self.inner
    }
}

impl<Q: Query> Query for Limit<Q> {
    fn process_dataset(&mut self, row: Row<'_>) -> Flow {
        if self.remaining == 0 {
            return Flow::Stop;
        }
        self.remaining -= 1;
        let flow = self.inner.process_dataset(row);
        if self.remaining == 0 {
            Flow::Stop
        } else {
            flow
        }
    }
}

// ============================================================================
// AUTHORIZED
// ============================================================================

/// Forwards only the rows `identity` may see.
///
/// Denied rows are dropped here, so a limit further down the chain counts
/// visible rows only.
pub struct Authorized<'t, Q> {
    table: &'t dyn Table,
    identity: &'t Identity,
    inner: Q,
    denied: usize,
}

impl<'t, Q: Query> Authorized<'t, Q> {
    pub fn new(table: &'t dyn Table, identity: &'t Identity, inner: Q) -> Self {
        Self {
            table,
            identity,
            inner,
            denied: 0,
        }
    }

    /// Number of rows withheld so far.
    pub fn denied(&self) -> usize {
        self.denied
    }

    pub fn into_inner(self) -> Q {
        self.inner
    }
}

impl<Q: Query> Query for Authorized<'_, Q> {
    fn process_dataset(&mut self, row: Row<'_>) -> Flow {
        if self.table.is_authorized(row, self.identity) {
            self.inner.process_dataset(row)
        } else {
            self.denied += 1;
            Flow::Continue
        }
    }
}

impl<Q: fmt::Debug> fmt::Debug for Authorized<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorized")
            .field("table", &self.table.name())
            .field("identity", self.identity)
            .field("inner", &self.inner)
            .field("denied", &self.denied)
            .finish()
    }
}

// ============================================================================
// COLLECT
// ============================================================================

/// Renders selected columns of every row into owned values.
#[derive(Debug)]
pub struct Collect {
    columns: Vec<Arc<dyn Column>>,
    rows: Vec<Vec<Value<'static>>>,
}

impl Collect {
    /// Collect the named columns of `table`, in the given order.
    pub fn new(table: &dyn Table, names: &[&str]) -> LiveQueryResult<Self> {
        let columns = names
            .iter()
            .map(|name| {
                table
                    .column(name)
                    .cloned()
                    .ok_or_else(|| SchemaError::UnknownColumn {
                        table: table.name().to_string(),
                        column: (*name).to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Collect every column of `table` in declaration order.
    pub fn all(table: &dyn Table) -> Self {
        Self {
            columns: table.columns().to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value<'static>>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value<'static>>> {
        self.rows
    }
}

impl Query for Collect {
    fn process_dataset(&mut self, row: Row<'_>) -> Flow {
        let values = self
            .columns
            .iter()
            .map(|column| column.value(row).into_owned())
            .collect();
        self.rows.push(values);
        Flow::Continue
    }
}

// ============================================================================
// INSPECT
// ============================================================================

/// Calls a closure for every row and never stops.
pub struct Inspect<F> {
    visit: F,
}

impl<F> Inspect<F>
where
    F: FnMut(Row<'_>),
{
    pub fn new(visit: F) -> Self {
        Self { visit }
    }
}

impl<F> Query for Inspect<F>
where
    F: FnMut(Row<'_>),
{
    fn process_dataset(&mut self, row: Row<'_>) -> Flow {
        (self.visit)(row);
        Flow::Continue
    }
}

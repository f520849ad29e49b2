//! LiveQuery Core - Row, Column and Table Abstractions
//!
//! One query engine over many unrelated in-memory record types. A [`Row`]
//! is a type-erased, borrowed view of one entity. A [`Column`] reads a typed
//! value from a row through an [`OffsetChain`] of projection steps. A
//! [`Table`] pushes rows into a [`Query`] consumer and decides per row
//! whether an [`Identity`] may see it.
//!
//! This crate knows nothing about concrete entity kinds.

pub mod column;
pub mod column_registry;
pub mod config;
pub mod error;
pub mod identity;
pub mod offsets;
pub mod query;
pub mod registry;
pub mod row;
pub mod table;
pub mod value;

pub use column::{
    borrow_all, BoolColumn, Column, DoubleColumn, IntColumn, ListColumn, StringColumn, TimeColumn,
};
pub use column_registry::ColumnRegistry;
pub use config::{EngineConfig, ServiceAuthorization, SERVICE_AUTHORIZATION_ENV};
pub use error::{ConfigError, LiveQueryError, LiveQueryResult, SchemaError, StoreError};
pub use identity::Identity;
pub use offsets::{ColumnOffsets, OffsetChain};
pub use query::{Authorized, Collect, Count, Flow, Inspect, Limit, Query};
pub use registry::{ColumnInfo, ColumnsTable, TableRegistry, TableRegistryBuilder, COLUMNS_TABLE};
pub use row::Row;
pub use table::{push_rows, Table};
pub use value::{ColumnType, Timestamp, Value, EPOCH};

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

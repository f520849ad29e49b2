//! Columns: named, typed, pure accessors from a row to a value.
//!
//! Every typed column pairs an [`OffsetChain`] with an extraction function
//! over the chain's target entity. Evaluation projects the row through the
//! chain; an absent projection yields the column type's empty value,
//! otherwise the extraction function's result is returned unchanged.

use crate::error::SchemaError;
use crate::offsets::{ColumnOffsets, OffsetChain};
use crate::row::Row;
use crate::value::{ColumnType, Timestamp, Value, EPOCH};
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// COLUMN TRAIT
// ============================================================================

/// Type-erased column interface used by tables and consumers.
pub trait Column: Send + Sync + fmt::Debug {
    /// Column name, including any composition prefix.
    fn name(&self) -> &str;

    /// Human-readable description, exposed verbatim for introspection.
    fn description(&self) -> &str;

    fn column_type(&self) -> ColumnType;

    /// Offset chain from the owning table's row type to the extracted entity.
    fn offsets(&self) -> &OffsetChain;

    /// Read this column from a row.
    fn value<'a>(&self, row: Row<'a>) -> Value<'a>;

    /// Copy of this column renamed to `prefix + name` whose chain starts
    /// with `outer`.
    fn rebase(&self, prefix: &str, outer: &OffsetChain) -> Result<Arc<dyn Column>, SchemaError>;

    /// Type of the entity this column expects rows to address.
    fn row_type(&self) -> TypeId {
        self.offsets().root_type()
    }
}

// ============================================================================
// SHARED STATE
// ============================================================================

#[derive(Clone)]
struct ColumnCore {
    name: String,
    description: String,
    offsets: OffsetChain,
}

impl ColumnCore {
    fn new(name: impl Into<String>, description: impl Into<String>, offsets: OffsetChain) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            offsets,
        }
    }

    fn project<'a, T: Any>(&self, row: Row<'a>) -> Option<&'a T> {
        self.offsets.apply(row)?.downcast_ref::<T>()
    }

    fn rebase(&self, prefix: &str, outer: &OffsetChain) -> Result<Self, SchemaError> {
        let name = format!("{prefix}{}", self.name);
        let offsets = self.offsets.prepend(outer, &name)?;
        Ok(Self {
            name,
            description: self.description.clone(),
            offsets,
        })
    }
}

/// Implements [`Column`] and `Debug` for a typed column struct with
/// `core` and `extract` fields and an inherent `get` accessor.
macro_rules! impl_column {
    ($column:ident, $variant:ident) => {
        impl<T: Any> Column for $column<T> {
            fn name(&self) -> &str {
                &self.core.name
            }

            fn description(&self) -> &str {
                &self.core.description
            }

            fn column_type(&self) -> ColumnType {
                ColumnType::$variant
            }

            fn offsets(&self) -> &OffsetChain {
                &self.core.offsets
            }

            fn value<'a>(&self, row: Row<'a>) -> Value<'a> {
                Value::$variant(self.get(row))
            }

            fn rebase(
                &self,
                prefix: &str,
                outer: &OffsetChain,
            ) -> Result<Arc<dyn Column>, SchemaError> {
                Ok(Arc::new(Self {
                    core: self.core.rebase(prefix, outer)?,
                    extract: Arc::clone(&self.extract),
                }))
            }
        }

        impl<T> fmt::Debug for $column<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($column))
                    .field("name", &self.core.name)
                    .field("offsets", &self.core.offsets)
                    .finish()
            }
        }
    };
}

// ============================================================================
// TYPED COLUMNS
// ============================================================================

/// String column. Empty value: `""`.
pub struct StringColumn<T> {
    core: ColumnCore,
    extract: Arc<dyn for<'a> Fn(&'a T) -> Cow<'a, str> + Send + Sync>,
}

impl<T: Any> StringColumn<T> {
    pub fn new<R: Any, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        offsets: &ColumnOffsets<R, T>,
        extract: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a T) -> Cow<'a, str> + Send + Sync + 'static,
    {
        Self {
            core: ColumnCore::new(name, description, offsets.chain().clone()),
            extract: Arc::new(extract),
        }
    }

    pub fn get<'a>(&self, row: Row<'a>) -> Cow<'a, str> {
        match self.core.project::<T>(row) {
            Some(entity) => (self.extract)(entity),
            None => Cow::Borrowed(""),
        }
    }
}

impl_column!(StringColumn, String);

/// 64-bit integer column. Empty value: `0`.
pub struct IntColumn<T> {
    core: ColumnCore,
    extract: Arc<dyn Fn(&T) -> i64 + Send + Sync>,
}

impl<T: Any> IntColumn<T> {
    pub fn new<R: Any, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        offsets: &ColumnOffsets<R, T>,
        extract: F,
    ) -> Self
    where
        F: Fn(&T) -> i64 + Send + Sync + 'static,
    {
        Self {
            core: ColumnCore::new(name, description, offsets.chain().clone()),
            extract: Arc::new(extract),
        }
    }

    pub fn get(&self, row: Row<'_>) -> i64 {
        self.core.project::<T>(row).map_or(0, |entity| (self.extract)(entity))
    }
}

impl_column!(IntColumn, Int);

/// Floating point column. Empty value: `0.0`.
pub struct DoubleColumn<T> {
    core: ColumnCore,
    extract: Arc<dyn Fn(&T) -> f64 + Send + Sync>,
}

impl<T: Any> DoubleColumn<T> {
    pub fn new<R: Any, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        offsets: &ColumnOffsets<R, T>,
        extract: F,
    ) -> Self
    where
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        Self {
            core: ColumnCore::new(name, description, offsets.chain().clone()),
            extract: Arc::new(extract),
        }
    }

    pub fn get(&self, row: Row<'_>) -> f64 {
        self.core.project::<T>(row).map_or(0.0, |entity| (self.extract)(entity))
    }
}

impl_column!(DoubleColumn, Double);

/// Boolean column. Empty value: `false`.
pub struct BoolColumn<T> {
    core: ColumnCore,
    extract: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: Any> BoolColumn<T> {
    pub fn new<R: Any, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        offsets: &ColumnOffsets<R, T>,
        extract: F,
    ) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            core: ColumnCore::new(name, description, offsets.chain().clone()),
            extract: Arc::new(extract),
        }
    }

    pub fn get(&self, row: Row<'_>) -> bool {
        self.core.project::<T>(row).is_some_and(|entity| (self.extract)(entity))
    }
}

impl_column!(BoolColumn, Bool);

/// Timestamp column. Empty value: the Unix epoch.
pub struct TimeColumn<T> {
    core: ColumnCore,
    extract: Arc<dyn Fn(&T) -> Timestamp + Send + Sync>,
}

impl<T: Any> TimeColumn<T> {
    pub fn new<R: Any, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        offsets: &ColumnOffsets<R, T>,
        extract: F,
    ) -> Self
    where
        F: Fn(&T) -> Timestamp + Send + Sync + 'static,
    {
        Self {
            core: ColumnCore::new(name, description, offsets.chain().clone()),
            extract: Arc::new(extract),
        }
    }

    pub fn get(&self, row: Row<'_>) -> Timestamp {
        self.core.project::<T>(row).map_or(EPOCH, |entity| (self.extract)(entity))
    }
}

impl_column!(TimeColumn, Time);

/// List-of-strings column. Empty value: an empty list.
pub struct ListColumn<T> {
    core: ColumnCore,
    extract: Arc<dyn for<'a> Fn(&'a T) -> Vec<Cow<'a, str>> + Send + Sync>,
}

impl<T: Any> ListColumn<T> {
    pub fn new<R: Any, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        offsets: &ColumnOffsets<R, T>,
        extract: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a T) -> Vec<Cow<'a, str>> + Send + Sync + 'static,
    {
        Self {
            core: ColumnCore::new(name, description, offsets.chain().clone()),
            extract: Arc::new(extract),
        }
    }

    pub fn get<'a>(&self, row: Row<'a>) -> Vec<Cow<'a, str>> {
        match self.core.project::<T>(row) {
            Some(entity) => (self.extract)(entity),
            None => Vec::new(),
        }
    }
}

impl_column!(ListColumn, List);

/// Borrow every string of a slice, for list column extractors.
pub fn borrow_all(items: &[String]) -> Vec<Cow<'_, str>> {
    items.iter().map(|item| Cow::Borrowed(item.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct Owner {
        name: String,
        tags: Vec<String>,
    }

    struct Ticket {
        id: u32,
        title: String,
        urgent: bool,
        weight: f64,
        opened: Timestamp,
        owner: Option<Owner>,
    }

    fn ticket(owner: Option<&str>) -> Ticket {
        Ticket {
            id: 7,
            title: "disk full".to_string(),
            urgent: true,
            weight: 0.5,
            opened: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
            owner: owner.map(|name| Owner {
                name: name.to_string(),
                tags: vec!["ops".to_string(), "oncall".to_string()],
            }),
        }
    }

    #[test]
    fn test_typed_columns_read_fields() {
        let offsets = ColumnOffsets::<Ticket>::new();
        let id = IntColumn::new("id", "Ticket id", &offsets, |t: &Ticket| i64::from(t.id));
        let title = StringColumn::new("title", "Ticket title", &offsets, |t: &Ticket| {
            Cow::Borrowed(t.title.as_str())
        });
        let urgent = BoolColumn::new("urgent", "Urgent flag", &offsets, |t: &Ticket| t.urgent);
        let weight = DoubleColumn::new("weight", "Weight", &offsets, |t: &Ticket| t.weight);
        let opened = TimeColumn::new("opened", "Opened at", &offsets, |t: &Ticket| t.opened);

        let entity = ticket(None);
        let row = Row::new(&entity);
        assert_eq!(id.get(row), 7);
        assert_eq!(title.get(row), "disk full");
        assert!(urgent.get(row));
        assert_eq!(weight.get(row), 0.5);
        assert_eq!(opened.get(row).timestamp(), 1_600_000_000);
        assert_eq!(id.value(row), Value::Int(7));
        assert_eq!(title.column_type(), ColumnType::String);
    }

    #[test]
    fn test_absent_relation_yields_empty_values() {
        let to_owner = ColumnOffsets::<Ticket>::new().add(|t: &Ticket| t.owner.as_ref());
        let name = StringColumn::new("owner_name", "Owner", &to_owner, |o: &Owner| {
            Cow::Borrowed(o.name.as_str())
        });
        let tags = ListColumn::new("owner_tags", "Tags", &to_owner, |o: &Owner| borrow_all(&o.tags));

        let entity = ticket(None);
        let row = Row::new(&entity);
        assert_eq!(name.get(row), "");
        assert!(tags.get(row).is_empty());
        assert!(name.value(row).is_empty_value());

        let entity = ticket(Some("bob"));
        let row = Row::new(&entity);
        assert_eq!(name.get(row), "bob");
        assert_eq!(tags.get(row), vec!["ops", "oncall"]);
    }

    #[test]
    fn test_null_row_yields_empty_values() {
        let offsets = ColumnOffsets::<Ticket>::new();
        let id = IntColumn::new("id", "Ticket id", &offsets, |t: &Ticket| i64::from(t.id));
        let opened = TimeColumn::new("opened", "Opened at", &offsets, |t: &Ticket| t.opened);
        assert_eq!(id.get(Row::null()), 0);
        assert_eq!(opened.get(Row::null()), EPOCH);
    }

    #[test]
    fn test_rebase_prefixes_and_extends_chain() {
        let owner_offsets = ColumnOffsets::<Owner>::new();
        let name = StringColumn::new("name", "Owner name", &owner_offsets, |o: &Owner| {
            Cow::Borrowed(o.name.as_str())
        });
        let to_owner = ColumnOffsets::<Ticket>::new().add(|t: &Ticket| t.owner.as_ref());

        let rebased = name.rebase("owner_", to_owner.chain()).unwrap();
        assert_eq!(rebased.name(), "owner_name");
        assert_eq!(rebased.description(), "Owner name");
        assert_eq!(rebased.row_type(), TypeId::of::<Ticket>());

        let entity = ticket(Some("carol"));
        assert_eq!(rebased.value(Row::new(&entity)), Value::String("carol".into()));
        assert_eq!(name.name(), "name");
    }

    #[test]
    fn test_rebase_rejects_mismatched_chain() {
        let owner_offsets = ColumnOffsets::<Owner>::new();
        let name = StringColumn::new("name", "Owner name", &owner_offsets, |o: &Owner| {
            Cow::Borrowed(o.name.as_str())
        });
        let wrong = ColumnOffsets::<Ticket>::new();
        let err = name.rebase("owner_", wrong.chain()).unwrap_err();
        assert!(matches!(err, SchemaError::RowTypeMismatch { .. }));
    }
}

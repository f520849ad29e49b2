//! Column types and the values columns produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// The empty timestamp: the Unix epoch.
pub const EPOCH: Timestamp = DateTime::<Utc>::UNIX_EPOCH;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Double,
    String,
    /// List of strings
    List,
    /// Seconds since the Unix epoch
    Time,
    Bool,
}

impl ColumnType {
    /// Lowercase name used in introspection output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Double => "double",
            ColumnType::String => "string",
            ColumnType::List => "list",
            ColumnType::Time => "time",
            ColumnType::Bool => "bool",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value read from a row.
///
/// String and list values may borrow from the row's entity; use
/// [`Value::into_owned`] to keep a value after the row is gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value<'a> {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(Cow<'a, str>),
    #[serde(serialize_with = "chrono::serde::ts_seconds::serialize")]
    Time(Timestamp),
    List(Vec<Cow<'a, str>>),
}

impl Value<'_> {
    /// The defined empty value of a column type.
    pub fn empty(column_type: ColumnType) -> Value<'static> {
        match column_type {
            ColumnType::Int => Value::Int(0),
            ColumnType::Double => Value::Double(0.0),
            ColumnType::Bool => Value::Bool(false),
            ColumnType::String => Value::String(Cow::Borrowed("")),
            ColumnType::Time => Value::Time(EPOCH),
            ColumnType::List => Value::List(Vec::new()),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Int(_) => ColumnType::Int,
            Value::Double(_) => ColumnType::Double,
            Value::Bool(_) => ColumnType::Bool,
            Value::String(_) => ColumnType::String,
            Value::Time(_) => ColumnType::Time,
            Value::List(_) => ColumnType::List,
        }
    }

    /// Whether this is the empty value of its type.
    pub fn is_empty_value(&self) -> bool {
        *self == Value::empty(self.column_type())
    }

    /// Detach the value from the row it was read from.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Int(v) => Value::Int(v),
            Value::Double(v) => Value::Double(v),
            Value::Bool(v) => Value::Bool(v),
            Value::String(v) => Value::String(Cow::Owned(v.into_owned())),
            Value::Time(v) => Value::Time(v),
            Value::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| Cow::Owned(item.into_owned()))
                    .collect(),
            ),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<Timestamp> {
        match self {
            Value::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Cow<'_, str>]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

//! The table abstraction: named columns plus iteration and authorization
//! for one entity kind.

use crate::column::Column;
use crate::error::LiveQueryResult;
use crate::identity::Identity;
use crate::query::{Flow, Query};
use crate::row::Row;
use std::any::Any;
use std::sync::Arc;

/// A queryable table over one entity kind.
///
/// Tables are wired once at startup and never change afterwards.
pub trait Table: Send + Sync {
    /// Table name, e.g. `comments`.
    fn name(&self) -> &str;

    /// Prefix used for this table's columns when it is embedded in another
    /// table, e.g. `comment_`.
    fn name_prefix(&self) -> &str;

    /// Columns in declaration order.
    fn columns(&self) -> &[Arc<dyn Column>];

    /// Look up a column by exact name.
    fn find_column(&self, name: &str) -> Option<&Arc<dyn Column>>;

    /// Look up a column, retrying once with this table's own name prefix
    /// stripped (`comment_author` resolves to `author` on `comments`).
    fn column(&self, name: &str) -> Option<&Arc<dyn Column>> {
        self.find_column(name).or_else(|| {
            name.strip_prefix(self.name_prefix())
                .and_then(|stripped| self.find_column(stripped))
        })
    }

    /// Push every entity of the live collection to `query`, in the
    /// collection's natural order, until the query signals [`Flow::Stop`].
    fn answer_query(&self, query: &mut dyn Query) -> LiveQueryResult<()>;

    /// Whether `identity` may see `row`.
    fn is_authorized(&self, row: Row<'_>, identity: &Identity) -> bool;
}

/// Wrap each entity in a [`Row`] and push it to `query`.
///
/// Stops before visiting further entities the first time the query returns
/// [`Flow::Stop`].
pub fn push_rows<'a, E, I>(table: &str, entities: I, query: &mut dyn Query)
where
    E: Any,
    I: IntoIterator<Item = &'a E>,
{
    let mut visited = 0usize;
    let mut stopped = false;
    for entity in entities {
        visited += 1;
        if query.process_dataset(Row::new(entity)) == Flow::Stop {
            stopped = true;
            break;
        }
    }
    tracing::trace!(table, visited, stopped, "answered query");
}

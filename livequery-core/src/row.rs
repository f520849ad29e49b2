//! Type-erased, non-owning row handle.

use std::any::{type_name, Any};
use std::fmt;

/// A view onto one entity for the duration of one query pass.
///
/// A `Row` holds a borrowed reference to an entity owned elsewhere, tagged
/// with the entity's concrete type so extraction can be checked on access.
/// The lifetime `'a` ties the row to whatever guard keeps the entity alive;
/// rows cannot outlive the pass that produced them.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    data: Option<&'a dyn Any>,
    kind: &'static str,
}

impl<'a> Row<'a> {
    /// Wrap a reference to an entity.
    pub fn new<E: Any>(entity: &'a E) -> Self {
        Self {
            data: Some(entity),
            kind: type_name::<E>(),
        }
    }

    /// A row that addresses nothing. Every column evaluates to its empty value.
    pub const fn null() -> Self {
        Self {
            data: None,
            kind: "()",
        }
    }

    /// Whether this row addresses no entity.
    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    /// The erased base reference.
    pub fn data(&self) -> Option<&'a dyn Any> {
        self.data
    }

    /// Type name of the addressed entity, for diagnostics.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Typed access to the addressed entity.
    ///
    /// Returns `None` for a null row or when `E` is not the addressed type.
    pub fn raw_data<E: Any>(&self) -> Option<&'a E> {
        self.data?.downcast_ref::<E>()
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("kind", &self.kind)
            .field("null", &self.is_null())
            .finish()
    }
}

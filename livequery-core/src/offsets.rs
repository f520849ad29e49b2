//! Offset chains: composable projections from a row's base entity to a
//! nested or related sub-entity.
//!
//! A chain is a sequence of steps. Step `i` receives the reference produced
//! by step `i - 1` (or the row's base reference for the first step) and
//! returns a reference to a nested object, or `None` for an absent relation.
//! Evaluation short-circuits on the first `None`.
//!
//! [`ColumnOffsets`] is the typed builder: its type parameters record the
//! entity kind the chain starts from and the kind it ends at, so a column
//! extraction function can only ever be attached to a chain that yields the
//! type it reads. [`OffsetChain`] is the erased form stored inside columns.

use crate::error::SchemaError;
use crate::row::Row;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type Step = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

/// Pins a closure to the higher-ranked step signature.
fn step_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    f
}

// ============================================================================
// ERASED CHAIN
// ============================================================================

/// Erased offset chain, as stored inside a column.
///
/// Records the root and target entity types so that composition can be
/// checked when tables are wired together.
#[derive(Clone)]
pub struct OffsetChain {
    root: TypeId,
    root_name: &'static str,
    target: TypeId,
    target_name: &'static str,
    steps: Vec<Step>,
}

impl OffsetChain {
    /// The empty chain: the row's base reference is the target.
    pub fn identity<R: Any>() -> Self {
        Self {
            root: TypeId::of::<R>(),
            root_name: type_name::<R>(),
            target: TypeId::of::<R>(),
            target_name: type_name::<R>(),
            steps: Vec::new(),
        }
    }

    pub fn root_type(&self) -> TypeId {
        self.root
    }

    pub fn root_name(&self) -> &'static str {
        self.root_name
    }

    pub fn target_type(&self) -> TypeId {
        self.target
    }

    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    /// Number of projection steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step left to right against the row's base reference.
    pub fn apply<'a>(&self, row: Row<'a>) -> Option<&'a dyn Any> {
        let mut current = row.data()?;
        for step in &self.steps {
            current = step(current)?;
        }
        Some(current)
    }

    /// Prepend `outer` to this chain.
    ///
    /// The result starts at `outer`'s root and ends at this chain's target.
    /// `outer` must end at the entity kind this chain starts from.
    pub fn prepend(&self, outer: &OffsetChain, column: &str) -> Result<Self, SchemaError> {
        if outer.target != self.root {
            return Err(SchemaError::RowTypeMismatch {
                column: column.to_string(),
                expected: self.root_name,
                found: outer.target_name,
            });
        }
        let mut steps = Vec::with_capacity(outer.steps.len() + self.steps.len());
        steps.extend(outer.steps.iter().cloned());
        steps.extend(self.steps.iter().cloned());
        Ok(Self {
            root: outer.root,
            root_name: outer.root_name,
            target: self.target,
            target_name: self.target_name,
            steps,
        })
    }

    fn push<T: Any, U: Any, F>(&self, step: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        let erased = step_fn(move |data| {
            data.downcast_ref::<T>()
                .and_then(|nested| step(nested))
                .map(|projected| projected as &dyn Any)
        });
        let mut steps = self.steps.clone();
        steps.push(Arc::new(erased));
        Self {
            root: self.root,
            root_name: self.root_name,
            target: TypeId::of::<U>(),
            target_name: type_name::<U>(),
            steps,
        }
    }
}

impl fmt::Debug for OffsetChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffsetChain")
            .field("root", &self.root_name)
            .field("target", &self.target_name)
            .field("steps", &self.steps.len())
            .finish()
    }
}

// ============================================================================
// TYPED CHAIN
// ============================================================================

/// Typed offset chain from entity kind `R` to entity kind `T`.
///
/// `add` never mutates the receiver; it returns a longer chain.
///
/// ```ignore
/// let offsets = ColumnOffsets::<Comment>::new();
/// let to_service = offsets.add(|comment: &Comment| comment.service.as_deref());
/// ```
pub struct ColumnOffsets<R, T = R> {
    chain: OffsetChain,
    _marker: PhantomData<fn(R) -> T>,
}

impl<R: Any> ColumnOffsets<R> {
    /// The empty chain rooted at `R`.
    pub fn new() -> Self {
        Self {
            chain: OffsetChain::identity::<R>(),
            _marker: PhantomData,
        }
    }
}

impl<R: Any> Default for ColumnOffsets<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Any, T: Any> ColumnOffsets<R, T> {
    /// Append a projection step.
    pub fn add<U: Any, F>(&self, step: F) -> ColumnOffsets<R, U>
    where
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        ColumnOffsets {
            chain: self.chain.push(step),
            _marker: PhantomData,
        }
    }

    /// Append every step of `inner` after this chain.
    pub fn then<U: Any>(&self, inner: &ColumnOffsets<T, U>) -> ColumnOffsets<R, U> {
        let mut steps = self.chain.steps.clone();
        steps.extend(inner.chain.steps.iter().cloned());
        ColumnOffsets {
            chain: OffsetChain {
                root: self.chain.root,
                root_name: self.chain.root_name,
                target: inner.chain.target,
                target_name: inner.chain.target_name,
                steps,
            },
            _marker: PhantomData,
        }
    }

    /// Project a row to the target entity.
    pub fn apply<'a>(&self, row: Row<'a>) -> Option<&'a T> {
        self.chain.apply(row)?.downcast_ref::<T>()
    }

    /// The erased chain.
    pub fn chain(&self) -> &OffsetChain {
        &self.chain
    }
}

impl<R, T> Clone for ColumnOffsets<R, T> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R, T> fmt::Debug for ColumnOffsets<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chain.fmt(f)
    }
}

//! The per-request context handed to every handler.
//!
//! A [`Context`] is an immutable chain of values. Deriving a new context with
//! [`Context::with_value`] never touches the original: the new context holds
//! the added value and points back at its parent, so a context that was handed
//! out stays valid and unchanged for as long as anyone holds it.
//!
//! Values are keyed by type. Declare a key type for each value you want to
//! carry and implement [`ContextKey`] for it:
//!
//! ```rust
//! use ctxmux::{Context, ContextKey};
//!
//! struct RequestId;
//!
//! impl ContextKey for RequestId {
//!     type Value = u64;
//! }
//!
//! let ctx = Context::empty().with_value::<RequestId>(7);
//! assert_eq!(ctx.value::<RequestId>(), Some(&7));
//! ```
//!
//! Two key types never collide, even if they carry the same value type. Keeping
//! a key type private to a module means nothing outside of it can read or
//! shadow that binding; the mux stores path parameters this way.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A type used to look up a value in a [`Context`].
pub trait ContextKey: 'static {
    /// The type of value stored under this key.
    type Value: Send + Sync + 'static;
}

struct Entry {
    key: TypeId,
    name: &'static str,
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<Entry>>,
}

/// An immutable, cheaply cloneable chain of request-scoped values.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Entry>>,
}

impl Context {
    /// Returns a context holding no values.
    pub fn empty() -> Self {
        Self { head: None }
    }

    /// Returns a new context in which `K` maps to `value`. Every other key
    /// resolves exactly as it does in `self`.
    pub fn with_value<K: ContextKey>(&self, value: K::Value) -> Context {
        Context {
            head: Some(Arc::new(Entry {
                key: TypeId::of::<K>(),
                name: std::any::type_name::<K>(),
                value: Box::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// Returns the most recently bound value for `K`, if any.
    pub fn value<K: ContextKey>(&self) -> Option<&K::Value> {
        let key = TypeId::of::<K>();
        self.entries()
            .find(|entry| entry.key == key)
            .and_then(|entry| entry.value.downcast_ref())
    }

    /// Returns `true` if the context holds no values at all.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn entries(&self) -> Entries<'_> {
        Entries {
            next: self.head.as_deref(),
        }
    }
}

struct Entries<'c> {
    next: Option<&'c Entry>,
}

impl<'c> Iterator for Entries<'c> {
    type Item = &'c Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.next?;
        self.next = entry.parent.as_deref();
        Some(entry)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries().map(|entry| entry.name))
            .finish()
    }
}

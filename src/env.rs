//! [`Env`]: keyed, typed, lexically-scoped auxiliary state threaded through
//! cursors alongside [`crate::context::Context`].
//!
//! An `Env` is how a `Mapping` stashes interpreter-private state (a paging
//! cursor, a per-request cache handle) onto the cursor tree without widening
//! the `Cursor` trait itself. Grounded in the same `Arc`-chain shape as
//! `Context` — each `Env` either is empty or wraps a parent, so extending it
//! at a `Component` boundary is O(1) and a lookup by name climbs outward
//! through enclosing scopes rather than requiring a single flat map.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::problem::{Outcome, Problem, ProblemKind};

type BoxedValue = Arc<dyn Any + Send + Sync>;

/// A lexically-scoped, typed key/value store.
///
/// `Clone` is cheap (an `Arc` bump); values are never mutated in place, only
/// shadowed by a narrower scope built with [`Env::bind`]/[`Env::add`].
#[derive(Clone, Default)]
pub struct Env {
    bindings: Option<Arc<Bindings>>,
}

struct Bindings {
    values: IndexMap<ArcStr, BoxedValue>,
    parent: Option<Arc<Bindings>>,
}

/// Appends `tail` at the end of `chain`'s parent links.
fn splice(chain: Option<Arc<Bindings>>, tail: Option<Arc<Bindings>>) -> Option<Arc<Bindings>> {
    match chain {
        None => tail,
        Some(node) => Some(Arc::new(Bindings {
            values: node.values.clone(),
            parent: splice(node.parent.clone(), tail),
        })),
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("keys", &self.keys())
            .finish()
    }
}

impl Env {
    /// The empty environment, with no enclosing scope.
    pub fn empty() -> Self {
        Self { bindings: None }
    }

    /// Binds a single `name` to `value` in a new innermost scope, shadowing
    /// any same-named binding from an enclosing scope.
    #[must_use]
    pub fn bind<T: Any + Send + Sync>(&self, name: impl Into<ArcStr>, value: T) -> Self {
        let mut values = IndexMap::with_capacity(1);
        values.insert(name.into(), Arc::new(value) as BoxedValue);
        Self {
            bindings: Some(Arc::new(Bindings {
                values,
                parent: self.bindings.clone(),
            })),
        }
    }

    /// `add`: layers `other`'s scope chain in front of `self`'s — a
    /// right-biased merge, so a name bound in both resolves to `other`'s
    /// value, while a name only `self` has is still reachable by
    /// climbing past `other`'s frames.
    #[must_use]
    pub fn add(&self, other: &Env) -> Self {
        Self {
            bindings: splice(other.bindings.clone(), self.bindings.clone()),
        }
    }

    /// Typed lookup by name, climbing outward through enclosing scopes.
    ///
    /// Fails with [`ProblemKind::EnvLookupFailed`] both when `name` is
    /// unbound anywhere in the chain and when it's bound to a value of a
    /// different type than `T` — both are the same failure mode from the
    /// caller's point of view.
    pub fn get<T: Any + Send + Sync + Clone>(&self, name: &str) -> Outcome<T> {
        let mut node = self.bindings.as_deref();
        while let Some(b) = node {
            if let Some(v) = b.values.get(name) {
                return match v.downcast_ref::<T>() {
                    Some(t) => Outcome::ok(t.clone()),
                    None => Outcome::err(Problem::new(
                        ProblemKind::EnvLookupFailed,
                        format!("environment key '{name}' has the wrong type"),
                    )),
                };
            }
            node = b.parent.as_deref();
        }
        Outcome::err(Problem::new(
            ProblemKind::EnvLookupFailed,
            format!("no environment binding named '{name}'"),
        ))
    }

    /// Whether `name` is bound anywhere in this scope chain, regardless of type.
    pub fn contains(&self, name: &str) -> bool {
        let mut node = self.bindings.as_deref();
        while let Some(b) = node {
            if b.values.contains_key(name) {
                return true;
            }
            node = b.parent.as_deref();
        }
        false
    }

    fn keys(&self) -> Vec<ArcStr> {
        let mut out = Vec::new();
        let mut node = self.bindings.as_deref();
        while let Some(b) = node {
            out.extend(b.values.keys().cloned());
            node = b.parent.as_deref();
        }
        out
    }
}

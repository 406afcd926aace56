//! The query algebra: a tagged sum of query operations,
//! closed under the `~` merge operator, whose normalization determines
//! correctness when siblings reference the same field.
//!
//! Modeled as a tagged sum with exhaustive matching and structural equality,
//! in the spirit of `juniper::Selection`/`juniper::ast::Definition` — a
//! closed enum walked by the interpreter rather than an open trait-object
//! tree.

pub mod normalize;

use std::fmt;
use std::ops::Add;
use std::sync::Arc;

use arcstr::ArcStr;

pub use crate::argument::{bindings, ArgumentValue, Binding, Bindings};
use crate::cursor::CursorRef;
use crate::env::Env;
use crate::problem::Outcome;
use crate::schema::Type;
use crate::value::Json;

/// `Filter`'s predicate: evaluates a single element cursor to a boolean,
/// fallibly (a predicate may itself need to project a field that can fail).
pub type Predicate = Arc<dyn Fn(&CursorRef) -> Outcome<bool> + Send + Sync>;

/// `OrderBy`'s per-selection sort key extractor.
pub type OrderTerm = Arc<dyn Fn(&CursorRef) -> Outcome<Json> + Send + Sync>;

/// `Component`/`Defer`'s join: rewrites the subquery handed to the next
/// interpreter stage, given the cursor at the boundary. The default `join`
/// returns the subquery unchanged.
pub type Join = Arc<dyn Fn(&CursorRef, Query) -> Outcome<Query> + Send + Sync>;

pub fn default_join() -> Join {
    Arc::new(|_cursor, query| Outcome::ok(query))
}

/// One `OrderBy` selection: a sort term, direction, and nulls-ordering.
#[derive(Clone)]
pub struct OrderSelection {
    pub term: OrderTerm,
    pub ascending: bool,
    /// Missing values sort as if `nulls_first` were compared last by
    /// default; set `true` to sort nulls first instead.
    pub nulls_first: bool,
}

impl fmt::Debug for OrderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderSelection")
            .field("ascending", &self.ascending)
            .field("nulls_first", &self.nulls_first)
            .finish_non_exhaustive()
    }
}

/// The query algebra: a closed sum of the operations a normalized query
/// tree is built from.
#[derive(Clone)]
pub enum Query {
    Select {
        name: ArcStr,
        args: Bindings,
        child: Box<Query>,
    },
    Group(Vec<Query>),
    GroupList(Vec<Query>),
    Unique(Box<Query>),
    Filter(Predicate, Box<Query>),
    OrderBy(Vec<OrderSelection>, Box<Query>),
    Limit(i64, Box<Query>),
    Offset(i64, Box<Query>),
    Narrow(Type, Box<Query>),
    UntypedNarrow(ArcStr, Box<Query>),
    Skip {
        /// `true` for `@skip` semantics (skip when `cond`), `false` for
        /// `@include` semantics (skip when `!cond`).
        sense: bool,
        cond: bool,
        child: Box<Query>,
    },
    Wrap(ArcStr, Box<Query>),
    Rename(ArcStr, Box<Query>),
    Count(ArcStr, Box<Query>),
    Introspect(Box<Query>),
    Defer {
        join: Join,
        child: Box<Query>,
        root_tpe: Type,
    },
    Component {
        mapping: ArcStr,
        join: Join,
        child: Box<Query>,
    },
    Environment(Env, Box<Query>),
    Empty,
    Skipped,
}

impl Query {
    pub fn select(name: impl Into<ArcStr>, args: Bindings, child: Query) -> Self {
        Self::Select {
            name: name.into(),
            args,
            child: Box::new(child),
        }
    }

    /// A leaf `Select` with no further selection (`child = Empty`).
    pub fn leaf(name: impl Into<ArcStr>) -> Self {
        Self::select(name, Bindings::new(), Query::Empty)
    }

    pub fn rename(name: impl Into<ArcStr>, child: Query) -> Self {
        Self::Rename(name.into(), Box::new(child))
    }

    pub fn skip_if(cond: bool, child: Query) -> Self {
        Self::Skip {
            sense: true,
            cond,
            child: Box::new(child),
        }
    }

    pub fn include_if(cond: bool, child: Query) -> Self {
        Self::Skip {
            sense: false,
            cond,
            child: Box::new(child),
        }
    }

    /// Whether `Skip`'s condition eliminates this node's emission.
    pub fn is_eliminated(sense: bool, cond: bool) -> bool {
        if sense {
            cond
        } else {
            !cond
        }
    }

    /// The field name this node would emit under, for `Select`/`Rename`
    /// nodes (the canonical "possibly-renamed select" pattern).
    pub fn result_name(&self) -> Option<&ArcStr> {
        match self {
            Self::Select { name, .. } => Some(name),
            Self::Rename(name, _) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select { name, args, child } => f
                .debug_struct("Select")
                .field("name", name)
                .field("args", args)
                .field("child", child)
                .finish(),
            Self::Group(qs) => f.debug_tuple("Group").field(qs).finish(),
            Self::GroupList(qs) => f.debug_tuple("GroupList").field(qs).finish(),
            Self::Unique(q) => f.debug_tuple("Unique").field(q).finish(),
            Self::Filter(_, q) => f.debug_tuple("Filter").field(&"<predicate>").field(q).finish(),
            Self::OrderBy(sels, q) => f.debug_tuple("OrderBy").field(sels).field(q).finish(),
            Self::Limit(n, q) => f.debug_tuple("Limit").field(n).field(q).finish(),
            Self::Offset(n, q) => f.debug_tuple("Offset").field(n).field(q).finish(),
            Self::Narrow(t, q) => f.debug_tuple("Narrow").field(t).field(q).finish(),
            Self::UntypedNarrow(n, q) => f.debug_tuple("UntypedNarrow").field(n).field(q).finish(),
            Self::Skip { sense, cond, child } => f
                .debug_struct("Skip")
                .field("sense", sense)
                .field("cond", cond)
                .field("child", child)
                .finish(),
            Self::Wrap(n, q) => f.debug_tuple("Wrap").field(n).field(q).finish(),
            Self::Rename(n, q) => f.debug_tuple("Rename").field(n).field(q).finish(),
            Self::Count(n, q) => f.debug_tuple("Count").field(n).field(q).finish(),
            Self::Introspect(q) => f.debug_tuple("Introspect").field(q).finish(),
            Self::Defer { child, root_tpe, .. } => f
                .debug_struct("Defer")
                .field("join", &"<join>")
                .field("child", child)
                .field("root_tpe", root_tpe)
                .finish(),
            Self::Component { mapping, child, .. } => f
                .debug_struct("Component")
                .field("mapping", mapping)
                .field("join", &"<join>")
                .field("child", child)
                .finish(),
            Self::Environment(_, q) => f.debug_tuple("Environment").field(&"<env>").field(q).finish(),
            Self::Empty => write!(f, "Empty"),
            Self::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Structural equality for law tests and normalization fixed-point checks.
///
/// Opaque callable fields (`Predicate`/`Join`/`OrderTerm`) and `Env` have no
/// meaningful value equality, so they compare by `Arc` identity (closures
/// built by the same call site, e.g. `default_join()` cloned, compare
/// equal; two independently-built closures do not, even if behaviorally
/// identical) — sufficient for the fixed-point/law checks this crate's test
/// suite runs, which never need to tell two *different* closures apart by
/// behavior.
impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Select { name: n1, args: a1, child: c1 }, Self::Select { name: n2, args: a2, child: c2 }) => {
                n1 == n2 && a1 == a2 && c1 == c2
            }
            (Self::Group(a), Self::Group(b)) | (Self::GroupList(a), Self::GroupList(b)) => a == b,
            (Self::Unique(a), Self::Unique(b)) => a == b,
            (Self::Filter(p1, a), Self::Filter(p2, b)) => Arc::ptr_eq(p1, p2) && a == b,
            (Self::OrderBy(s1, a), Self::OrderBy(s2, b)) => s1.len() == s2.len() && a == b,
            (Self::Limit(n1, a), Self::Limit(n2, b)) => n1 == n2 && a == b,
            (Self::Offset(n1, a), Self::Offset(n2, b)) => n1 == n2 && a == b,
            (Self::Narrow(t1, a), Self::Narrow(t2, b)) => t1 == t2 && a == b,
            (Self::UntypedNarrow(n1, a), Self::UntypedNarrow(n2, b)) => n1 == n2 && a == b,
            (
                Self::Skip { sense: s1, cond: c1, child: a },
                Self::Skip { sense: s2, cond: c2, child: b },
            ) => s1 == s2 && c1 == c2 && a == b,
            (Self::Wrap(n1, a), Self::Wrap(n2, b)) => n1 == n2 && a == b,
            (Self::Rename(n1, a), Self::Rename(n2, b)) => n1 == n2 && a == b,
            (Self::Count(n1, a), Self::Count(n2, b)) => n1 == n2 && a == b,
            (Self::Introspect(a), Self::Introspect(b)) => a == b,
            (
                Self::Defer { join: j1, child: a, root_tpe: t1 },
                Self::Defer { join: j2, child: b, root_tpe: t2 },
            ) => Arc::ptr_eq(j1, j2) && a == b && t1 == t2,
            (
                Self::Component { mapping: m1, join: j1, child: a },
                Self::Component { mapping: m2, join: j2, child: b },
            ) => m1 == m2 && Arc::ptr_eq(j1, j2) && a == b,
            (Self::Environment(_, a), Self::Environment(_, b)) => a == b,
            (Self::Empty, Self::Empty) | (Self::Skipped, Self::Skipped) => true,
            _ => false,
        }
    }
}

/// `~`: associative merge with identity `Empty`, flattening one level of
/// `Group` nesting (`Group(Group(xs), ys) ≡ Group(xs ++ ys)`). Does *not*
/// merge same-named `Select` siblings — that deeper rule lives in
/// [`normalize::merge_queries`], since it requires recursing into children,
/// which a binary operator on two opaque `Query` values can't do without
/// allocating unboundedly.
impl Add for Query {
    type Output = Query;

    fn add(self, rhs: Query) -> Query {
        match (self, rhs) {
            (Query::Empty, q) | (q, Query::Empty) => q,
            (Query::Group(mut a), Query::Group(b)) => {
                a.extend(b);
                Query::Group(a)
            }
            (Query::Group(mut a), q) => {
                a.push(q);
                Query::Group(a)
            }
            (q, Query::Group(mut b)) => {
                let mut v = vec![q];
                v.append(&mut b);
                Query::Group(v)
            }
            (a, b) => Query::Group(vec![a, b]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_associative() {
        let q1 = Query::leaf("a");
        let q2 = Query::leaf("b");
        let q3 = Query::leaf("c");

        let left = (q1.clone() + q2.clone()) + q3.clone();
        let right = q1 + (q2 + q3);
        assert_eq!(left, right);
    }

    #[test]
    fn empty_is_identity() {
        let q = Query::leaf("a");
        assert_eq!(Query::Empty.clone().add(q.clone()), q.clone());
        assert_eq!(q.clone().add(Query::Empty), q);
    }

    #[test]
    fn group_boundaries_flatten() {
        let merged = Query::Group(vec![Query::leaf("a")]) + Query::Group(vec![Query::leaf("b")]);
        assert_eq!(merged, Query::Group(vec![Query::leaf("a"), Query::leaf("b")]));
    }
}

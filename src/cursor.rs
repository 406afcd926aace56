//! The [`Cursor`] protocol: a polymorphic view over whatever data model a
//! `Mapping` backs a field with.
//!
//! A `Cursor` is a trait object (`CursorRef = Arc<dyn Cursor>`) rather than a
//! generic parameter, mirroring how `juniper::Executor` treats resolved
//! values polymorphically through `GraphQLValue` rather than monomorphizing
//! the whole tree over one backing type — a single query can walk cursors
//! backed by a SQL row, an HTTP JSON blob, and an in-memory struct in the
//! same traversal. `narrow`/`as_leaf`/etc. are kept as trait methods (the
//! primitives only a concrete cursor implementation can know); the derived
//! path combinators (`path`, `nullable_field`, `list_path`, ...) are free
//! functions over `&CursorRef`, since they need to build new `Arc`s and a
//! trait method can't materialize an `Arc<Self>` from `&self`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::argument::Bindings;
use crate::context::Context;
use crate::env::Env;
use crate::problem::{combine_siblings, Outcome, Problem, ProblemKind};
use crate::schema::Type;
use crate::value::Json;

/// A shared handle to a cursor. Cheap to clone (an `Arc` bump); cursors are
/// immutable values once constructed.
pub type CursorRef = Arc<dyn Cursor>;

/// The operations a data-model adapter implements to expose its values to
/// the interpreter
pub trait Cursor: Send + Sync + fmt::Debug {
    /// The `(path, resultPath, tpe)` this cursor is positioned at.
    fn context(&self) -> &Context;

    /// Auxiliary, lexically-scoped state visible at this position.
    fn env(&self) -> &Env;

    /// The cursor this one was projected from, if any.
    fn parent(&self) -> Option<CursorRef>;

    /// Escape hatch for a `Mapping` to recover its own concrete cursor type
    /// from a `CursorRef`, e.g. to pull a backend-specific handle back out
    /// at a `Component` boundary.
    fn as_any(&self) -> &dyn Any;

    /// Is this cursor, at a nullable type, representing an absent value?
    /// Leaf/object/list cursors that aren't themselves nullable answer `false`.
    fn is_null(&self) -> bool {
        false
    }

    /// Resolve a leaf (`Scalar`/`Enum`) cursor to its `Json` value.
    fn as_leaf(&self) -> Outcome<Json>;

    /// Resolve a `List`-typed cursor to its element cursors.
    fn as_list(&self) -> Outcome<Vec<CursorRef>>;

    /// Resolve a `Nullable`-typed cursor to `None` or the wrapped cursor.
    fn as_nullable(&self) -> Outcome<Option<CursorRef>>;

    /// Does this cursor's underlying value carry a field named `name`?
    /// Distinct from `Schema::field`: this is about what the *data* has,
    /// not what the *type* declares — they usually but not always agree
    /// (an attribute-only mapping field has no backing schema entry).
    fn has_field(&self, name: &str) -> bool;

    /// Project onto a child field, giving the child cursor its own
    /// `result_name` when `alias` is set, and making `args` (a `Select`'s
    /// bound arguments) available to whatever backend resolves the field.
    fn field(&self, name: &str, alias: Option<&str>, args: &Bindings) -> Outcome<CursorRef>;

    /// Does this cursor's concrete runtime type narrow `tpe` (an
    /// interface/union member check)?
    fn narrows_to(&self, tpe: &Type) -> bool;
}

impl dyn Cursor {
    pub fn tpe(&self) -> &Type {
        self.context().tpe()
    }

    pub fn is_leaf(&self) -> bool {
        self.tpe().is_leaf()
    }

    pub fn is_list(&self) -> bool {
        self.tpe().is_list()
    }

    pub fn is_nullable(&self) -> bool {
        self.tpe().is_nullable()
    }

    /// Typed downcast to a concrete cursor implementation, via [`Cursor::as_any`].
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

fn narrowing_failed(cursor: &CursorRef, tpe: &Type) -> Problem {
    Problem::new(
        ProblemKind::NarrowingFailed,
        format!("cursor at {:?} does not narrow to {tpe:?}", cursor.tpe()),
    )
    .with_path_if_absent(|| cursor.context().problem_path())
}

/// `narrow`: asserts `cursor.narrows_to(tpe)`, yielding the same cursor
/// re-windowed at `tpe` or a [`ProblemKind::NarrowingFailed`] problem.
pub fn narrow(cursor: &CursorRef, tpe: &Type) -> Outcome<CursorRef> {
    if cursor.narrows_to(tpe) {
        Outcome::ok(Arc::clone(cursor))
    } else {
        Outcome::err(narrowing_failed(cursor, tpe))
    }
}

/// `path`: follows a sequence of field projections, short-circuiting on the
/// first failure.
pub fn path(cursor: &CursorRef, names: &[&str]) -> Outcome<CursorRef> {
    let mut current = Outcome::ok(Arc::clone(cursor));
    for name in names {
        current = current.and_then(|c: CursorRef| c.field(name, None, &Bindings::new()));
    }
    current
}

/// `has_path`: whether [`path`] would succeed, discarding any carried value.
pub fn has_path(cursor: &CursorRef, names: &[&str]) -> bool {
    !path(cursor, names).is_failure()
}

/// `nullable_has_field`: `has_field` that looks through one layer of
/// `Nullable`, answering `false` on a null rather than failing.
pub fn nullable_has_field(cursor: &CursorRef, name: &str) -> bool {
    if cursor.is_nullable() {
        matches!(cursor.as_nullable().value(), Some(Some(inner)) if inner.has_field(name))
    } else {
        cursor.has_field(name)
    }
}

/// `nullable_field`: `field` that looks through one layer of `Nullable`,
/// short-circuiting to `Outcome::ok(None)` on a null rather than attempting
/// to project a field off of nothing.
pub fn nullable_field(
    cursor: &CursorRef,
    name: &str,
    alias: Option<&str>,
    args: &Bindings,
) -> Outcome<Option<CursorRef>> {
    if cursor.is_nullable() {
        cursor.as_nullable().and_then(|maybe_inner| match maybe_inner {
            Some(inner) => inner.field(name, alias, args).map(Some),
            None => Outcome::ok(None),
        })
    } else {
        cursor.field(name, alias, args).map(Some)
    }
}

/// `list_path`: follows `names` through any intervening `List` layers,
/// flattening as it goes — so a path through a field that's itself a list
/// of lists yields one flat `Vec` of cursors at the terminal position
/// rather than a nested structure the caller would have to flatten by hand.
/// A terminal cursor that is itself a list is returned as-is, unflattened.
pub fn list_path(cursor: &CursorRef, names: &[&str]) -> Outcome<Vec<CursorRef>> {
    list_path_rec(cursor, names)
}

/// Like [`list_path`], but additionally flattens a terminal list: if the
/// cursor reached after walking `names` is itself a list, its elements are
/// returned in place of it rather than the list cursor itself.
pub fn flat_list_path(cursor: &CursorRef, names: &[&str]) -> Outcome<Vec<CursorRef>> {
    list_path_rec(cursor, names).and_then(flatten_terminal_lists)
}

fn flatten_terminal_lists(cursors: Vec<CursorRef>) -> Outcome<Vec<CursorRef>> {
    combine_siblings(
        cursors
            .iter()
            .map(|c| {
                if c.is_list() {
                    c.as_list()
                } else {
                    Outcome::ok(vec![Arc::clone(c)])
                }
            })
            .collect(),
    )
    .map(|vs: Vec<Vec<CursorRef>>| vs.into_iter().flatten().collect())
}

/// `has_list_path`: whether [`list_path`] would succeed.
pub fn has_list_path(cursor: &CursorRef, names: &[&str]) -> bool {
    !list_path_rec(cursor, names).is_failure()
}

/// A cursor that delegates every operation to `inner` except `env`, which it
/// widens by layering a new scope in front of `inner`'s own. Backs
/// `with_env`, the projection `Query::Environment` needs to extend visible
/// bindings without the `Cursor` trait growing a "extend my own env" method.
#[derive(Debug)]
struct EnvOverlay {
    inner: CursorRef,
    env: Env,
}

impl Cursor for EnvOverlay {
    fn context(&self) -> &Context {
        self.inner.context()
    }

    fn env(&self) -> &Env {
        &self.env
    }

    fn parent(&self) -> Option<CursorRef> {
        self.inner.parent()
    }

    fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }

    fn is_null(&self) -> bool {
        self.inner.is_null()
    }

    fn as_leaf(&self) -> Outcome<Json> {
        self.inner.as_leaf()
    }

    fn as_list(&self) -> Outcome<Vec<CursorRef>> {
        self.inner.as_list()
    }

    fn as_nullable(&self) -> Outcome<Option<CursorRef>> {
        self.inner.as_nullable()
    }

    fn has_field(&self, name: &str) -> bool {
        self.inner.has_field(name)
    }

    fn field(&self, name: &str, alias: Option<&str>, args: &Bindings) -> Outcome<CursorRef> {
        self.inner.field(name, alias, args)
    }

    fn narrows_to(&self, tpe: &Type) -> bool {
        self.inner.narrows_to(tpe)
    }
}

/// `Query::Environment(env, child)`'s cursor-side effect: widen the
/// bindings visible to `child`'s traversal without disturbing `cursor`'s
/// own type/path/data.
pub fn with_env(cursor: &CursorRef, env: Env) -> CursorRef {
    Arc::new(EnvOverlay {
        env: cursor.env().add(&env),
        inner: Arc::clone(cursor),
    })
}

/// `env<T>(name)`: tries `cursor.env()`, then climbs `cursor.parent()` until
/// a binding is found or the chain is exhausted.
pub fn env<T: Any + Send + Sync + Clone>(cursor: &CursorRef, name: &str) -> Outcome<T> {
    let mut current = Some(Arc::clone(cursor));
    while let Some(c) = current {
        if c.env().contains(name) {
            return c.env().get(name);
        }
        current = c.parent();
    }
    Outcome::err(Problem::new(
        ProblemKind::EnvLookupFailed,
        format!("no environment binding named '{name}' on the cursor chain"),
    ))
}

fn list_path_rec(cursor: &CursorRef, names: &[&str]) -> Outcome<Vec<CursorRef>> {
    let Some((name, rest)) = names.split_first() else {
        return Outcome::ok(vec![Arc::clone(cursor)]);
    };
    if cursor.is_list() {
        let outcome = cursor.as_list();
        return outcome.and_then(|elems| {
            combine_siblings(elems.iter().map(|e| list_path_rec(e, names)).collect())
                .map(|vs: Vec<Vec<CursorRef>>| vs.into_iter().flatten().collect())
        });
    }
    cursor
        .field(name, None, &Bindings::new())
        .and_then(|next| list_path_rec(&next, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal in-memory cursor over a `serde_json`-shaped tree, used only
    /// to exercise the path combinators above independent of any `Mapping`.
    #[derive(Debug)]
    struct JsonCursor {
        context: Context,
        env: Env,
        value: Json,
    }

    impl JsonCursor {
        fn root(tpe: Type, value: Json) -> CursorRef {
            Arc::new(Self {
                context: Context::root(tpe),
                env: Env::empty(),
                value,
            })
        }
    }

    impl Cursor for JsonCursor {
        fn context(&self) -> &Context {
            &self.context
        }

        fn env(&self) -> &Env {
            &self.env
        }

        fn parent(&self) -> Option<CursorRef> {
            None
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn is_null(&self) -> bool {
            self.value.is_null()
        }

        fn as_leaf(&self) -> Outcome<Json> {
            Outcome::ok(self.value.clone())
        }

        fn as_list(&self) -> Outcome<Vec<CursorRef>> {
            let Some(arr) = self.value.as_array() else {
                return Outcome::err(Problem::new(ProblemKind::TypeMismatch, "not a list"));
            };
            let elem_type = match self.context.tpe() {
                Type::List(t) => (**t).clone(),
                other => other.clone(),
            };
            Outcome::ok(
                arr.iter()
                    .map(|v| {
                        Arc::new(JsonCursor {
                            context: self.context.as_type(elem_type.clone()),
                            env: self.env.clone(),
                            value: v.clone(),
                        }) as CursorRef
                    })
                    .collect(),
            )
        }

        fn as_nullable(&self) -> Outcome<Option<CursorRef>> {
            if self.value.is_null() {
                Outcome::ok(None)
            } else {
                let inner_type = match self.context.tpe() {
                    Type::Nullable(t) => (**t).clone(),
                    other => other.clone(),
                };
                Outcome::ok(Some(Arc::new(JsonCursor {
                    context: self.context.as_type(inner_type),
                    env: self.env.clone(),
                    value: self.value.clone(),
                }) as CursorRef))
            }
        }

        fn has_field(&self, name: &str) -> bool {
            self.value.as_object().is_some_and(|o| o.contains_key(name))
        }

        fn field(&self, name: &str, alias: Option<&str>, _args: &Bindings) -> Outcome<CursorRef> {
            let Some(obj) = self.value.as_object() else {
                return Outcome::err(Problem::new(ProblemKind::TypeMismatch, "not an object"));
            };
            let Some(v) = obj.get(name) else {
                return Outcome::err(Problem::new(
                    ProblemKind::FieldNotFound,
                    format!("no field '{name}'"),
                ));
            };
            Outcome::ok(Arc::new(JsonCursor {
                context: self.context.for_field(name, alias, Type::Scalar("String".into())),
                env: self.env.clone(),
                value: v.clone(),
            }))
        }

        fn narrows_to(&self, _tpe: &Type) -> bool {
            false
        }
    }

    fn fixture() -> CursorRef {
        let value = serde_json::json!({
            "title": "Arrival",
            "cast": ["Amy Adams", "Jeremy Renner"],
        });
        JsonCursor::root(Type::Object("Movie".into()), value)
    }

    #[test]
    fn field_projects_to_leaf() {
        let movie = fixture();
        let title = movie.field("title", None, &Bindings::new()).value().unwrap();
        assert_eq!(title.as_leaf().value().unwrap(), Json::from("Arrival"));
    }

    #[test]
    fn path_chains_through_missing_field_fails() {
        let movie = fixture();
        assert!(path(&movie, &["nope"]).is_failure());
    }

    #[test]
    fn has_path_true_for_known_field() {
        let movie = fixture();
        assert!(has_path(&movie, &["title"]));
    }

    #[test]
    fn list_path_does_not_flatten_a_terminal_list() {
        let movie = fixture();
        let cast = movie.field("cast", None, &Bindings::new()).value().unwrap();
        let names = list_path(&cast, &[]).value().unwrap();
        assert_eq!(names.len(), 1);
        assert!(names[0].is_list());
    }

    #[test]
    fn flat_list_path_flattens_a_terminal_list() {
        let movie = fixture();
        let cast = movie.field("cast", None, &Bindings::new()).value().unwrap();
        let names = flat_list_path(&cast, &[]).value().unwrap();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn with_env_widens_bindings_without_touching_data() {
        let movie = fixture();
        let widened = with_env(&movie, Env::empty().bind("limit", 10i32));
        assert_eq!(widened.env().get::<i32>("limit").value(), Some(10));
        assert_eq!(widened.tpe(), movie.tpe());

        let title = widened.field("title", None, &Bindings::new()).value().unwrap();
        assert_eq!(title.as_leaf().value().unwrap(), Json::from("Arrival"));
    }
}

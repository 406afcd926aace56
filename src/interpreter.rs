//! The two-phase interpreter: `run_root` / `run_fields` / `run_value` walk a
//! [`Query`] against a [`CursorRef`], producing a [`ProtoJson`] tree that a
//! [`Mapping`] then completes to the final [`Json`] response value.
//!
//! `Interpreter` is one required method (`run_root_value`) plus three
//! provided default methods implementing the generic traversal — the same
//! shape `juniper::Executor` uses: the executor carries the generic
//! field-resolution loop, a `GraphQLValue` impl only supplies the per-type
//! value production.

use std::cmp::Ordering;
use std::sync::Arc;

use arcstr::ArcStr;
use async_trait::async_trait;

use crate::argument::Bindings;
use crate::config::{Options, UnknownFieldPolicy};
use crate::cursor::{self, CursorRef};
use crate::mapping::Mapping;
use crate::problem::{Outcome, Problem, ProblemKind};
use crate::proto::{self, from_fields, from_values, ProtoJson};
use crate::query::normalize::extract_filter_order_by_limit;
use crate::query::{OrderSelection, Query};
use crate::schema::{self, Schema, Type};
use crate::value::Json;

/// Drives a [`Query`] against a root [`CursorRef`] to a [`ProtoJson`], and
/// completes that proto via a [`Mapping`] to the final response [`Json`].
///
/// The one required method is `run_root_value`: most implementations simply
/// delegate it to [`Interpreter::run_value`] against their own query root
/// type, but a backend that compiles whole sub-trees into one operation (a
/// SQL mapping translating `Filter`/`OrderBy`/`Limit` into a single query,
/// say) is free to intercept before the generic traversal ever runs.
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Produces the top-level `data` object's `ProtoJson` for `query` rooted
    /// at `cursor` — already keyed by result name (`{ fieldName: value, ... }`),
    /// since a query can select more than one root field at once. May itself
    /// contain further `Deferred` nodes handed off to another interpreter by
    /// the `Mapping` that eventually completes the result. Most
    /// implementations simply delegate to `run_fields` against their own
    /// query root type: `self.run_value(query, &self.schema().query_type(), cursor)`.
    async fn run_root_value(&self, cursor: &CursorRef, query: &Query) -> Outcome<ProtoJson>;

    /// The schema this interpreter resolves `TypeRef`s and introspection
    /// against.
    fn schema(&self) -> &dyn Schema;

    /// Crate-wide policy knobs this interpreter runs under; override to pick
    /// something other than [`Options::default`].
    fn options(&self) -> Options {
        Options::default()
    }

    /// `runRoot`: delegates to `run_root_value` and completes the result
    /// through `mapping`. `run_root_value` already produces the fully-keyed
    /// top-level object, so the completed value *is* the response's `data`.
    async fn run_root(&self, cursor: &CursorRef, query: &Query, mapping: &dyn Mapping) -> Outcome<Json> {
        #[cfg(feature = "tracing")]
        tracing::trace!("run_root_value");

        let (mut problems, proto) = match self.run_root_value(cursor, query).await {
            Outcome::Success(p) => (Vec::new(), p),
            Outcome::Warnings(ps, p) => (ps, p),
            Outcome::Failure(ps) => return Outcome::Failure(ps),
        };

        #[cfg(feature = "tracing")]
        tracing::trace!("complete");

        let value = match proto::complete(proto, mapping).await {
            Outcome::Success(v) => v,
            Outcome::Warnings(mut ps, v) => {
                problems.append(&mut ps);
                v
            }
            Outcome::Failure(mut ps) => {
                problems.append(&mut ps);
                return Outcome::Failure(problems);
            }
        };

        if problems.is_empty() {
            Outcome::Success(value)
        } else {
            Outcome::Warnings(problems, value)
        }
    }

    /// `runFields`: dispatches on the shape of `query`, enumerating the
    /// `(resultName, ProtoJson)` pairs it contributes to the enclosing
    /// object at `tpe`/`cursor`.
    async fn run_fields(&self, query: &Query, tpe: &Type, cursor: &CursorRef) -> Outcome<Vec<(ArcStr, ProtoJson)>> {
        match query {
            Query::Environment(env, inner) => {
                let extended = cursor::with_env(cursor, env.clone());
                self.run_fields(inner, tpe, &extended).await
            }

            Query::Group(qs) => {
                let mut problems = Vec::new();
                let mut fields = Vec::new();
                for q in qs {
                    match self.run_fields(q, tpe, cursor).await {
                        Outcome::Success(fs) => fields.extend(fs),
                        Outcome::Warnings(mut ps, fs) => {
                            problems.append(&mut ps);
                            fields.extend(fs);
                        }
                        Outcome::Failure(mut ps) => problems.append(&mut ps),
                    }
                }
                if problems.is_empty() {
                    Outcome::Success(fields)
                } else if fields.is_empty() {
                    Outcome::Failure(problems)
                } else {
                    Outcome::Warnings(problems, fields)
                }
            }

            Query::Rename(result_name, inner) => match inner.as_ref() {
                Query::Select { name, args, child } => {
                    self.run_select(result_name.clone(), name, args, child, tpe, cursor).await
                }
                other => self.run_fields(other, tpe, cursor).await.map(|fs| rename_single(result_name.clone(), fs)),
            },

            Query::Select { name, args, child } => {
                self.run_select(name.clone(), name, args, child, tpe, cursor).await
            }

            Query::Narrow(sub, child) => {
                if !cursor.narrows_to(sub) {
                    return Outcome::Success(Vec::new());
                }
                match cursor::narrow(cursor, sub) {
                    Outcome::Success(narrowed) => self.run_fields(child, sub, &narrowed).await,
                    Outcome::Warnings(ps, narrowed) => prepend_problems(ps, self.run_fields(child, sub, &narrowed).await),
                    Outcome::Failure(ps) => Outcome::Failure(ps),
                }
            }

            Query::Skip { sense, cond, child } => {
                if Query::is_eliminated(*sense, *cond) {
                    Outcome::Success(Vec::new())
                } else {
                    self.run_fields(child, tpe, cursor).await
                }
            }

            Query::Wrap(name, child) => match self.run_fields(child, tpe, cursor).await {
                Outcome::Success(fs) => Outcome::Success(vec![(name.clone(), from_fields(fs))]),
                Outcome::Warnings(ps, fs) => Outcome::Warnings(ps, vec![(name.clone(), from_fields(fs))]),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            },

            Query::Empty | Query::Skipped => Outcome::Success(Vec::new()),

            other => Outcome::err(Problem::new(
                ProblemKind::BadQuery,
                format!("{other:?} cannot appear where a field selection was expected"),
            )),
        }
    }

    /// The logic shared by `Select` and `Rename(Select)`: nullable
    /// short-circuit, `Component` hand-off, unknown-field policy, and
    /// ordinary field projection into `run_value`.
    async fn run_select(
        &self,
        result_name: ArcStr,
        field_name: &ArcStr,
        args: &Bindings,
        child: &Query,
        tpe: &Type,
        cursor: &CursorRef,
    ) -> Outcome<Vec<(ArcStr, ProtoJson)>> {
        if let Type::Nullable(inner) = tpe {
            return match cursor.as_nullable() {
                Outcome::Success(None) => Outcome::Success(vec![(result_name, ProtoJson::PureJson(Json::Null))]),
                Outcome::Success(Some(inner_cursor)) => {
                    self.run_select(result_name, field_name, args, child, inner, &inner_cursor).await
                }
                Outcome::Warnings(ps, None) => Outcome::Warnings(ps, vec![(result_name, ProtoJson::PureJson(Json::Null))]),
                Outcome::Warnings(ps, Some(inner_cursor)) => prepend_problems(
                    ps,
                    self.run_select(result_name, field_name, args, child, inner, &inner_cursor).await,
                ),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            };
        }

        if let Query::Component { join, child: inner_child, .. } = child {
            return match (join)(cursor, (**inner_child).clone()) {
                Outcome::Success(joined) => Outcome::Success(vec![(
                    result_name,
                    ProtoJson::Deferred {
                        cursor: Arc::clone(cursor),
                        tpe: tpe.clone(),
                        name: field_name.clone(),
                        query: Box::new(joined),
                    },
                )]),
                Outcome::Warnings(ps, joined) => Outcome::Warnings(
                    ps,
                    vec![(
                        result_name,
                        ProtoJson::Deferred {
                            cursor: Arc::clone(cursor),
                            tpe: tpe.clone(),
                            name: field_name.clone(),
                            query: Box::new(joined),
                        },
                    )],
                ),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            };
        }

        if !cursor.has_field(field_name) {
            return match self.options().unknown_field_policy {
                UnknownFieldPolicy::DeferThenError => Outcome::Success(vec![(
                    result_name,
                    ProtoJson::Deferred {
                        cursor: Arc::clone(cursor),
                        tpe: tpe.clone(),
                        name: field_name.clone(),
                        query: Box::new(child.clone()),
                    },
                )]),
                UnknownFieldPolicy::ErrorImmediately => Outcome::err(
                    Problem::new(ProblemKind::FieldNotFound, format!("no field '{field_name}'"))
                        .with_path_if_absent(|| cursor.context().problem_path()),
                ),
            };
        }

        let alias = if result_name.as_str() == field_name.as_str() {
            None
        } else {
            Some(result_name.as_str())
        };

        match cursor.field(field_name, alias, args) {
            Outcome::Success(field_cursor) => {
                let field_type = field_cursor.tpe().clone();
                #[cfg(feature = "tracing")]
                tracing::trace!(path = ?field_cursor.context().problem_path(), "run_value");
                match self.run_value(child, &field_type, &field_cursor).await {
                    Outcome::Success(v) => Outcome::Success(vec![(result_name, v)]),
                    Outcome::Warnings(ps, v) => Outcome::Warnings(ps, vec![(result_name, v)]),
                    Outcome::Failure(ps) => Outcome::Failure(ps),
                }
            }
            Outcome::Warnings(ps, field_cursor) => {
                let field_type = field_cursor.tpe().clone();
                let wrapped = match self.run_value(child, &field_type, &field_cursor).await {
                    Outcome::Success(v) => Outcome::Success(vec![(result_name, v)]),
                    Outcome::Warnings(ps2, v) => Outcome::Warnings(ps2, vec![(result_name, v)]),
                    Outcome::Failure(ps2) => Outcome::Failure(ps2),
                };
                prepend_problems(ps, wrapped)
            }
            Outcome::Failure(ps) => Outcome::Failure(ps),
        }
    }

    /// `runValue`: wrapper/transform query shapes are recognized first
    /// (independent of `tpe`), falling through to the `tpe`-keyed dispatch
    /// table for plain field values.
    async fn run_value(&self, query: &Query, tpe: &Type, cursor: &CursorRef) -> Outcome<ProtoJson> {
        match query {
            Query::Environment(env, inner) => {
                let extended = cursor::with_env(cursor, env.clone());
                self.run_value(inner, tpe, &extended).await
            }

            Query::Defer { join, child, root_tpe } => match (join)(cursor, (**child).clone()) {
                Outcome::Success(joined) => self.run_value(&joined, root_tpe, cursor).await,
                Outcome::Warnings(ps, joined) => prepend_problems(ps, self.run_value(&joined, root_tpe, cursor).await),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            },

            Query::Introspect(child) => {
                let (introspection_cursor, meta_tpe) = schema::introspection::root(self.schema(), cursor);
                self.run_value(child, &meta_tpe, &introspection_cursor).await
            }

            Query::GroupList(qs) => {
                let mut problems = Vec::new();
                let mut values = Vec::new();
                for q in qs {
                    match self.run_value(q, tpe, cursor).await {
                        Outcome::Success(v) => values.push(v),
                        Outcome::Warnings(mut ps, v) => {
                            problems.append(&mut ps);
                            values.push(v);
                        }
                        Outcome::Failure(mut ps) => problems.append(&mut ps),
                    }
                }
                let proto = from_values(values);
                if problems.is_empty() {
                    Outcome::Success(proto)
                } else {
                    Outcome::Warnings(problems, proto)
                }
            }

            Query::Unique(child) => match cursor.as_list() {
                Outcome::Success(elems) => self.finish_unique(child, tpe, elems).await,
                Outcome::Warnings(ps, elems) => prepend_problems(ps, self.finish_unique(child, tpe, elems).await),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            },

            Query::Count(name, child) => match cursor.as_list() {
                Outcome::Success(elems) => self.finish_count(name.clone(), child, elems),
                Outcome::Warnings(ps, elems) => prepend_problems(ps, self.finish_count(name.clone(), child, elems)),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            },

            Query::Filter(..) | Query::OrderBy(..) | Query::Limit(..) | Query::Offset(..) => match cursor.as_list() {
                Outcome::Success(elems) => self.finish_list_transform(query, tpe, elems).await,
                Outcome::Warnings(ps, elems) => prepend_problems(ps, self.finish_list_transform(query, tpe, elems).await),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            },

            Query::Component { .. } => Outcome::err(Problem::new(
                ProblemKind::BadQuery,
                "Component may only appear directly as a Select's child",
            )),

            _ => self.run_value_by_type(query, tpe, cursor).await,
        }
    }

    /// The `tpe`-keyed half of `runValue`, reached once wrapper/transform
    /// nodes have been peeled off by `run_value` above.
    async fn run_value_by_type(&self, query: &Query, tpe: &Type, cursor: &CursorRef) -> Outcome<ProtoJson> {
        match tpe {
            Type::Nullable(inner) => match cursor.as_nullable() {
                Outcome::Success(None) => Outcome::Success(ProtoJson::PureJson(Json::Null)),
                Outcome::Success(Some(inner_cursor)) => self.run_value(query, inner, &inner_cursor).await,
                Outcome::Warnings(ps, None) => Outcome::Warnings(ps, ProtoJson::PureJson(Json::Null)),
                Outcome::Warnings(ps, Some(inner_cursor)) => {
                    prepend_problems(ps, self.run_value(query, inner, &inner_cursor).await)
                }
                Outcome::Failure(ps) => Outcome::Failure(ps),
            },

            Type::List(elem_t) => match cursor.as_list() {
                Outcome::Success(elems) => self.run_value_over_elements(query, elem_t, elems).await,
                Outcome::Warnings(ps, elems) => prepend_problems(ps, self.run_value_over_elements(query, elem_t, elems).await),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            },

            Type::TypeRef(name) => match self.schema().resolve_type_ref(name) {
                Some(resolved) => self.run_value(query, &resolved, cursor).await,
                None => Outcome::err(
                    Problem::new(ProblemKind::UnknownType, format!("unresolved type reference '{name}'"))
                        .with_path_if_absent(|| cursor.context().problem_path()),
                ),
            },

            Type::Scalar(_) | Type::Enum(_) => match cursor.as_leaf() {
                Outcome::Success(j) => Outcome::Success(ProtoJson::PureJson(j)),
                Outcome::Warnings(ps, j) => Outcome::Warnings(ps, ProtoJson::PureJson(j)),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            },

            Type::Object(_) | Type::Interface(_) | Type::Union(_) => match self.run_fields(query, tpe, cursor).await {
                Outcome::Success(fs) => Outcome::Success(from_fields(fs)),
                Outcome::Warnings(ps, fs) => Outcome::Warnings(ps, from_fields(fs)),
                Outcome::Failure(ps) => Outcome::Failure(ps),
            },

            Type::Input(_) => Outcome::err(Problem::new(
                ProblemKind::UnsupportedType,
                "Input types are not a valid runValue dispatch target",
            )),
        }
    }

    async fn run_value_over_elements(&self, query: &Query, elem_t: &Type, elems: Vec<CursorRef>) -> Outcome<ProtoJson> {
        let mut problems = Vec::new();
        let mut values = Vec::with_capacity(elems.len());
        for elem in elems {
            match self.run_value(query, elem_t, &elem).await {
                Outcome::Success(v) => values.push(v),
                Outcome::Warnings(mut ps, v) => {
                    problems.append(&mut ps);
                    values.push(v);
                }
                Outcome::Failure(mut ps) => problems.append(&mut ps),
            }
        }
        let proto = from_values(values);
        if problems.is_empty() {
            Outcome::Success(proto)
        } else {
            Outcome::Warnings(problems, proto)
        }
    }

    /// `Unique(child)`: 0 elements yield `null`, exactly 1 recurses `child`
    /// against it (typed by the element cursor's own position, since `tpe`
    /// here is the post-`Unique` target, not the list's element type), more
    /// than 1 is `TooManyResults`.
    async fn finish_unique(&self, child: &Query, _tpe: &Type, mut elems: Vec<CursorRef>) -> Outcome<ProtoJson> {
        match elems.len() {
            0 => Outcome::Success(ProtoJson::PureJson(Json::Null)),
            1 => {
                let elem = elems.remove(0);
                let elem_type = elem.tpe().clone();
                self.run_value(child, &elem_type, &elem).await
            }
            n => Outcome::err(Problem::new(ProblemKind::TooManyResults, format!("expected at most one element, got {n}"))),
        }
    }

    /// `Count(name, child)`: counts elements passing `child`'s `Filter`
    /// layer (if any), ignoring the rest of `child` — the ordering/limit
    /// layers a count doesn't care about, and the leaf selection underneath
    /// them, since only the surviving count matters here.
    fn finish_count(&self, name: ArcStr, child: &Query, elems: Vec<CursorRef>) -> Outcome<ProtoJson> {
        let extracted = extract_filter_order_by_limit(child.clone());
        let mut problems = Vec::new();
        let mut count: i64 = 0;
        for elem in &elems {
            let keep = match &extracted.filter {
                Some(pred) => match pred(elem) {
                    Outcome::Success(b) => b,
                    Outcome::Warnings(mut ps, b) => {
                        problems.append(&mut ps);
                        b
                    }
                    Outcome::Failure(mut ps) => {
                        problems.append(&mut ps);
                        false
                    }
                },
                None => true,
            };
            if keep {
                count += 1;
            }
        }
        let proto = from_fields(vec![(name, ProtoJson::PureJson(Json::from(count)))]);
        if problems.is_empty() {
            Outcome::Success(proto)
        } else {
            Outcome::Warnings(problems, proto)
        }
    }

    /// `Filter`/`OrderBy`/`Limit`/`Offset`, any subset nested in that fixed
    /// order: filters `elems`, sorts the survivors, slices by offset then
    /// limit, and maps what's left through the innermost `base` query.
    async fn finish_list_transform(&self, query: &Query, tpe: &Type, elems: Vec<CursorRef>) -> Outcome<ProtoJson> {
        let extracted = extract_filter_order_by_limit(query.clone());
        let elem_t = match tpe {
            Type::List(t) => t.as_ref().clone(),
            other => other.clone(),
        };
        let mut problems = Vec::new();

        let mut kept = Vec::with_capacity(elems.len());
        for elem in elems {
            let pass = match &extracted.filter {
                Some(pred) => match pred(&elem) {
                    Outcome::Success(b) => b,
                    Outcome::Warnings(mut ps, b) => {
                        problems.append(&mut ps);
                        b
                    }
                    Outcome::Failure(mut ps) => {
                        problems.append(&mut ps);
                        false
                    }
                },
                None => true,
            };
            if pass {
                kept.push(elem);
            }
        }

        if let Some(sels) = &extracted.order_by {
            let mut keyed = Vec::with_capacity(kept.len());
            for elem in kept {
                let mut keys = Vec::with_capacity(sels.len());
                for sel in sels {
                    match (sel.term)(&elem) {
                        Outcome::Success(j) => keys.push(j),
                        Outcome::Warnings(mut ps, j) => {
                            problems.append(&mut ps);
                            keys.push(j);
                        }
                        Outcome::Failure(mut ps) => {
                            problems.append(&mut ps);
                            keys.push(Json::Null);
                        }
                    }
                }
                keyed.push((keys, elem));
            }
            keyed.sort_by(|(a, _), (b, _)| compare_sort_keys(a, b, sels));
            kept = keyed.into_iter().map(|(_, e)| e).collect();
        }

        if let Some(n) = extracted.offset {
            if n < 0 {
                return Outcome::err(Problem::new(ProblemKind::BadQuery, "Offset must be non-negative"));
            }
            kept = kept.into_iter().skip(n as usize).collect();
        }

        if let Some(n) = extracted.limit {
            if n < 0 {
                return Outcome::err(Problem::new(ProblemKind::BadQuery, "Limit must be non-negative"));
            }
            kept.truncate(n as usize);
        }

        prepend_problems(problems, self.run_value_over_elements(&extracted.base, &elem_t, kept).await)
    }
}

fn rename_single(name: ArcStr, fields: Vec<(ArcStr, ProtoJson)>) -> Vec<(ArcStr, ProtoJson)> {
    match fields.into_iter().next() {
        Some((_, proto)) => vec![(name, proto)],
        None => Vec::new(),
    }
}

fn prepend_problems<T>(mut ps: Vec<Problem>, outcome: Outcome<T>) -> Outcome<T> {
    match outcome {
        Outcome::Success(v) => Outcome::Warnings(ps, v),
        Outcome::Warnings(mut ps2, v) => {
            ps.append(&mut ps2);
            Outcome::Warnings(ps, v)
        }
        Outcome::Failure(mut ps2) => {
            ps.append(&mut ps2);
            Outcome::Failure(ps)
        }
    }
}

fn compare_sort_keys(a: &[Json], b: &[Json], sels: &[OrderSelection]) -> Ordering {
    for (i, sel) in sels.iter().enumerate() {
        let ord = compare_json(&a[i], &b[i], sel.nulls_first);
        let ord = if sel.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_json(a: &Json, b: &Json, nulls_first: bool) -> Ordering {
    match (a, b) {
        (Json::Null, Json::Null) => Ordering::Equal,
        (Json::Null, _) => {
            if nulls_first {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (_, Json::Null) => {
            if nulls_first {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Json::Number(x), Json::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal),
        (Json::String(x), Json::String(y)) => x.cmp(y),
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

//! [`ProtoJson`]: a partially-materialized response tree, possibly holding
//! deferred holes awaiting resolution by another component.

use futures::future::{BoxFuture, FutureExt};

use crate::cursor::CursorRef;
use crate::mapping::Mapping;
use crate::problem::{Outcome, Problem, ProblemKind};
use crate::query::Query;
use crate::schema::Type;
use crate::value::{Json, JsonObject};

/// A response tree that may still contain [`ProtoJson::Deferred`] holes.
#[derive(Clone, Debug)]
pub enum ProtoJson {
    PureJson(Json),
    /// A field the owning interpreter couldn't resolve itself — carries
    /// enough to hand off to whichever [`Mapping`] claims it: the cursor at
    /// the boundary, the field's declared type, its result name, and the
    /// (possibly rewritten-by-`join`) subquery to run against it.
    Deferred {
        cursor: CursorRef,
        tpe: Type,
        name: arcstr::ArcStr,
        query: Box<Query>,
    },
    ProtoObject(Vec<(arcstr::ArcStr, ProtoJson)>),
    ProtoArray(Vec<ProtoJson>),
}

impl ProtoJson {
    pub fn is_pure(&self) -> bool {
        matches!(self, Self::PureJson(_))
    }
}

/// `fromFields`: builds a `ProtoObject`, collapsing to `PureJson` when every
/// field is already pure.
pub fn from_fields(fields: Vec<(arcstr::ArcStr, ProtoJson)>) -> ProtoJson {
    if fields.iter().all(|(_, p)| p.is_pure()) {
        let mut obj = JsonObject::new();
        for (name, p) in fields {
            let ProtoJson::PureJson(j) = p else { unreachable!("checked all-pure above") };
            obj.insert(name.to_string(), j);
        }
        ProtoJson::PureJson(Json::Object(obj))
    } else {
        ProtoJson::ProtoObject(fields)
    }
}

/// `fromValues`: builds a `ProtoArray`, collapsing to `PureJson` when every
/// element is already pure.
pub fn from_values(values: Vec<ProtoJson>) -> ProtoJson {
    if values.iter().all(ProtoJson::is_pure) {
        let values = values
            .into_iter()
            .map(|p| {
                let ProtoJson::PureJson(j) = p else { unreachable!("checked all-pure above") };
                j
            })
            .collect();
        ProtoJson::PureJson(Json::Array(values))
    } else {
        ProtoJson::ProtoArray(values)
    }
}

/// `complete(proto, mapping)`: resolves every `Deferred` hole by handing it
/// to the component mapping that claims it, recursively completing the
/// proto the sub-interpreter returns, and reassembling pure `Json`.
/// Boxed/recursive-async since a `Deferred` can itself complete to a proto
/// containing further `Deferred` nodes (a chain of component hand-offs).
pub fn complete<'a>(proto: ProtoJson, mapping: &'a dyn Mapping) -> BoxFuture<'a, Outcome<Json>> {
    async move {
        match proto {
            ProtoJson::PureJson(j) => Outcome::ok(j),
            ProtoJson::ProtoObject(fields) => {
                let mut out = JsonObject::new();
                let mut problems = Vec::new();
                for (name, p) in fields {
                    match complete(p, mapping).await {
                        Outcome::Success(v) => {
                            out.insert(name.to_string(), v);
                        }
                        Outcome::Warnings(mut ps, v) => {
                            problems.append(&mut ps);
                            out.insert(name.to_string(), v);
                        }
                        Outcome::Failure(mut ps) => {
                            problems.append(&mut ps);
                            out.insert(name.to_string(), Json::Null);
                        }
                    }
                }
                if problems.is_empty() {
                    Outcome::ok(Json::Object(out))
                } else {
                    Outcome::Warnings(problems, Json::Object(out))
                }
            }
            ProtoJson::ProtoArray(elems) => {
                let mut out = Vec::with_capacity(elems.len());
                let mut problems = Vec::new();
                for p in elems {
                    match complete(p, mapping).await {
                        Outcome::Success(v) => out.push(v),
                        Outcome::Warnings(mut ps, v) => {
                            problems.append(&mut ps);
                            out.push(v);
                        }
                        Outcome::Failure(mut ps) => {
                            problems.append(&mut ps);
                            out.push(Json::Null);
                        }
                    }
                }
                if problems.is_empty() {
                    Outcome::ok(Json::Array(out))
                } else {
                    Outcome::Warnings(problems, Json::Array(out))
                }
            }
            ProtoJson::Deferred { cursor, tpe, name, query } => {
                complete_deferred(cursor, tpe, name, *query, mapping).await
            }
        }
    }
    .boxed()
}

async fn complete_deferred(
    cursor: CursorRef,
    tpe: Type,
    name: arcstr::ArcStr,
    query: Query,
    mapping: &dyn Mapping,
) -> Outcome<Json> {
    let path = || cursor.context().problem_path();

    let Some(sub) = mapping.subobject(&tpe, &name) else {
        return Outcome::err(
            Problem::new(ProblemKind::Deferral, format!("no mapping claims deferred field '{name}'"))
                .with_path_if_absent(path),
        );
    };

    let Some(interpreter) = mapping.interpreter_for(&sub.mapping_id) else {
        return Outcome::err(
            Problem::new(ProblemKind::Deferral, format!("unknown sub-mapping '{}'", sub.mapping_id))
                .with_path_if_absent(path),
        );
    };

    let (mut problems, subquery) = match (sub.join)(&cursor, query) {
        Outcome::Success(q) => (Vec::new(), q),
        Outcome::Warnings(ps, q) => (ps, q),
        Outcome::Failure(ps) => return Outcome::Failure(ps),
    };

    let sub_proto = match interpreter.run_root_value(&cursor, &subquery).await {
        Outcome::Success(p) => p,
        Outcome::Warnings(mut ps, p) => {
            problems.append(&mut ps);
            p
        }
        Outcome::Failure(mut ps) => {
            problems.append(&mut ps);
            return Outcome::Failure(problems);
        }
    };

    match complete(sub_proto, mapping).await {
        Outcome::Success(v) if problems.is_empty() => Outcome::Success(v),
        Outcome::Success(v) => Outcome::Warnings(problems, v),
        Outcome::Warnings(mut ps, v) => {
            problems.append(&mut ps);
            Outcome::Warnings(problems, v)
        }
        Outcome::Failure(mut ps) => {
            problems.append(&mut ps);
            Outcome::Failure(problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fields_collapses_when_all_pure() {
        let proto = from_fields(vec![
            ("a".into(), ProtoJson::PureJson(Json::from(1))),
            ("b".into(), ProtoJson::PureJson(Json::from(2))),
        ]);
        assert!(matches!(proto, ProtoJson::PureJson(Json::Object(_))));
    }

    #[test]
    fn from_values_stays_proto_array_with_a_deferred_element() {
        let deferred = ProtoJson::Deferred {
            cursor: crate::test_support::dummy_cursor(),
            tpe: Type::Scalar("Int".into()),
            name: "x".into(),
            query: Box::new(Query::Empty),
        };
        let proto = from_values(vec![ProtoJson::PureJson(Json::from(1)), deferred]);
        assert!(matches!(proto, ProtoJson::ProtoArray(_)));
    }
}

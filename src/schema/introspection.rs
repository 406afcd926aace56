//! `Query::Introspect`'s pseudo-cursor: presents a [`Schema`]'s own
//! `types`/`query_type` as ordinary cursor data, so `__schema`/`__type`
//! selections resolve through the exact same `run_fields`/`run_value`
//! traversal as any other field rather than a parallel code path.
//!
//! Deliberately minimal — `__Schema { types, queryType }` and
//! `__Type { name, kind }` only, no `fields`/`interfaces`/`ofType`. A
//! complete `__Type` (matching `graphql-js`'s full introspection shape)
//! would walk `ObjectType::fields` recursively and is a straightforward
//! extension of `field` below, left out here since nothing in this crate's
//! scope exercises it yet.

use std::any::Any;
use std::sync::Arc;

use arcstr::ArcStr;

use crate::argument::Bindings;
use crate::context::Context;
use crate::cursor::{Cursor, CursorRef};
use crate::env::Env;
use crate::problem::{Outcome, Problem, ProblemKind};
use crate::value::Json;

use super::{Schema, Type};

/// `__Schema`'s meta-type.
pub fn schema_type() -> Type {
    Type::Object(ArcStr::from("__Schema"))
}

/// `__Type`'s meta-type.
pub fn type_type() -> Type {
    Type::Object(ArcStr::from("__Type"))
}

#[derive(Clone, Debug)]
enum Focus {
    Root { types: Vec<Type>, query_type: Type },
    TypesList(Vec<Type>),
    TypeEntry(Type),
    Scalar(Json),
}

#[derive(Clone, Debug)]
struct SchemaCursor {
    context: Context,
    env: Env,
    parent: Option<CursorRef>,
    focus: Focus,
}

impl SchemaCursor {
    fn child(&self, name: &str, alias: Option<&str>, field_type: Type, focus: Focus) -> CursorRef {
        Arc::new(SchemaCursor {
            context: self.context.for_field(name, alias, field_type),
            env: self.env.clone(),
            parent: Some(Arc::new(self.clone())),
            focus,
        })
    }
}

impl Cursor for SchemaCursor {
    fn context(&self) -> &Context {
        &self.context
    }

    fn env(&self) -> &Env {
        &self.env
    }

    fn parent(&self) -> Option<CursorRef> {
        self.parent.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_leaf(&self) -> Outcome<Json> {
        match &self.focus {
            Focus::Scalar(j) => Outcome::ok(j.clone()),
            _ => Outcome::err(Problem::new(ProblemKind::TypeMismatch, "not a leaf position in schema introspection")),
        }
    }

    fn as_list(&self) -> Outcome<Vec<CursorRef>> {
        match &self.focus {
            Focus::TypesList(types) => Outcome::ok(
                types
                    .iter()
                    .map(|t| {
                        Arc::new(SchemaCursor {
                            context: self.context.as_type(type_type()),
                            env: self.env.clone(),
                            parent: Some(Arc::new(self.clone())),
                            focus: Focus::TypeEntry(t.clone()),
                        }) as CursorRef
                    })
                    .collect(),
            ),
            _ => Outcome::err(Problem::new(ProblemKind::TypeMismatch, "not a list position in schema introspection")),
        }
    }

    fn as_nullable(&self) -> Outcome<Option<CursorRef>> {
        Outcome::err(Problem::new(
            ProblemKind::TypeMismatch,
            "schema introspection has no nullable positions",
        ))
    }

    fn has_field(&self, name: &str) -> bool {
        match &self.focus {
            Focus::Root { .. } => matches!(name, "types" | "queryType"),
            Focus::TypeEntry(_) => matches!(name, "name" | "kind"),
            _ => false,
        }
    }

    fn field(&self, name: &str, alias: Option<&str>, _args: &Bindings) -> Outcome<CursorRef> {
        match &self.focus {
            Focus::Root { types, query_type } => match name {
                "types" => Outcome::ok(self.child(
                    name,
                    alias,
                    Type::List(Box::new(type_type())),
                    Focus::TypesList(types.clone()),
                )),
                "queryType" => Outcome::ok(self.child(name, alias, type_type(), Focus::TypeEntry(query_type.clone()))),
                _ => Outcome::err(Problem::new(ProblemKind::FieldNotFound, format!("__Schema has no field '{name}'"))),
            },
            Focus::TypeEntry(t) => match name {
                "name" => Outcome::ok(self.child(
                    name,
                    alias,
                    Type::Scalar(ArcStr::from("String")),
                    Focus::Scalar(Json::String(t.name().map(ToString::to_string).unwrap_or_default())),
                )),
                "kind" => Outcome::ok(self.child(
                    name,
                    alias,
                    Type::Scalar(ArcStr::from("String")),
                    Focus::Scalar(Json::String(kind_name(t).to_string())),
                )),
                _ => Outcome::err(Problem::new(ProblemKind::FieldNotFound, format!("__Type has no field '{name}'"))),
            },
            _ => Outcome::err(Problem::new(
                ProblemKind::FieldNotFound,
                format!("no field '{name}' at this introspection position"),
            )),
        }
    }

    fn narrows_to(&self, _tpe: &Type) -> bool {
        false
    }
}

fn kind_name(t: &Type) -> &'static str {
    match t {
        Type::Scalar(_) => "SCALAR",
        Type::Enum(_) => "ENUM",
        Type::Object(_) => "OBJECT",
        Type::Interface(_) => "INTERFACE",
        Type::Union(_) => "UNION",
        Type::Input(_) => "INPUT_OBJECT",
        Type::List(_) => "LIST",
        Type::Nullable(inner) => kind_name(inner),
        Type::TypeRef(_) => "OBJECT",
    }
}

/// Builds the `(cursor, tpe)` pair `run_value` hands `Introspect`'s child
/// query: a cursor over `schema`'s `types`/`query_type`, typed `__Schema`,
/// parented on `at` so `cursor::env`'s upward search still finds whatever
/// the surrounding traversal had bound.
pub fn root(schema: &dyn Schema, at: &CursorRef) -> (CursorRef, Type) {
    let cursor: CursorRef = Arc::new(SchemaCursor {
        context: at.context().as_type(schema_type()),
        env: at.env().clone(),
        parent: Some(Arc::clone(at)),
        focus: Focus::Root {
            types: schema.types().to_vec(),
            query_type: schema.query_type(),
        },
    });
    (cursor, schema_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StaticSchema;

    fn schema() -> StaticSchema {
        StaticSchema::builder("Query").scalar("String").build()
    }

    #[test]
    fn root_lists_declared_types() {
        let schema = schema();
        let parent = crate::test_support::dummy_cursor();
        let (cursor, tpe) = root(&schema, &parent);
        assert_eq!(tpe, schema_type());

        let types_field = cursor.field("types", None, &Bindings::new()).value().unwrap();
        let entries = types_field.as_list().value().unwrap();
        assert_eq!(entries.len(), 1);

        let name = entries[0].field("name", None, &Bindings::new()).value().unwrap();
        assert_eq!(name.as_leaf().value().unwrap(), Json::from("String"));
        let kind = entries[0].field("kind", None, &Bindings::new()).value().unwrap();
        assert_eq!(kind.as_leaf().value().unwrap(), Json::from("SCALAR"));
    }

    #[test]
    fn root_reports_query_type_name() {
        let schema = schema();
        let parent = crate::test_support::dummy_cursor();
        let (cursor, _) = root(&schema, &parent);
        let query_type = cursor.field("queryType", None, &Bindings::new()).value().unwrap();
        let name = query_type.field("name", None, &Bindings::new()).value().unwrap();
        assert_eq!(name.as_leaf().value().unwrap(), Json::from("Query"));
    }
}

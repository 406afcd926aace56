//! Shared fixtures for this crate's own unit tests — not part of the public
//! API. Mirrors `juniper`'s `#[cfg(test)] mod tests` schema-fixture module:
//! a handful of small, reusable building blocks rather than one fixture per
//! test file.

#![cfg(test)]

use std::any::Any;
use std::sync::Arc;

use crate::context::Context;
use crate::cursor::{Cursor, CursorRef};
use crate::env::Env;
use crate::problem::Outcome;
use crate::schema::Type;
use crate::value::Json;

/// A cursor with no data of its own, useful where only its `Context`/`Env`
/// identity matters to the test (e.g. building a `ProtoJson::Deferred`).
#[derive(Debug)]
pub struct DummyCursor {
    context: Context,
    env: Env,
}

impl Cursor for DummyCursor {
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

    fn as_leaf(&self) -> Outcome<Json> {
        Outcome::ok(Json::Null)
    }

    fn as_list(&self) -> Outcome<Vec<CursorRef>> {
        Outcome::ok(Vec::new())
    }

    fn as_nullable(&self) -> Outcome<Option<CursorRef>> {
        Outcome::ok(None)
    }

    fn has_field(&self, _name: &str) -> bool {
        false
    }

    fn field(&self, name: &str, _alias: Option<&str>, _args: &crate::argument::Bindings) -> Outcome<CursorRef> {
        Outcome::err(crate::problem::Problem::new(
            crate::problem::ProblemKind::FieldNotFound,
            format!("DummyCursor has no field '{name}'"),
        ))
    }

    fn narrows_to(&self, _tpe: &Type) -> bool {
        false
    }
}

pub fn dummy_cursor() -> CursorRef {
    Arc::new(DummyCursor {
        context: Context::root(Type::Object("Query".into())),
        env: Env::empty(),
    })
}

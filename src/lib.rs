//! `grackle-core`: the core of a GraphQL query execution engine that lets a
//! single query span several back-end sub-engines (in-memory values, remote
//! services, relational mappings) by carrying component boundaries inside
//! the query algebra itself.
//!
//! This crate is the interpreter core only. The GraphQL source parser, the
//! schema validator (only the schema surface the core consumes is modeled
//! here, in [`schema`]), and back-end specific mappings (SQL, HTTP,
//! in-memory) are collaborators supplied by an embedder. The core consumes a
//! validated [`schema::Schema`], an elaborated [`query::Query`], and a
//! [`mapping::Mapping`] implementation supplying component interpreters.
//!
//! # Shape of the crate
//!
//! - [`query`] — the tagged query algebra and its normalization
//!   (`mergeQueries`, `mkPathQuery`).
//! - [`cursor`] — the polymorphic [`cursor::Cursor`] protocol a data-model
//!   adapter implements, plus the derived path combinators.
//! - [`context`] and [`env`] — the `(path, resultPath, tpe)` triple and the
//!   lexically-scoped typed environment every cursor carries.
//! - [`interpreter`] — the two-phase `run_root`/`run_fields`/`run_value`
//!   driver.
//! - [`proto`] — the partially-materialized [`proto::ProtoJson`] response
//!   tree and its completion pass.
//! - [`mapping`] — the [`mapping::Mapping`]/`Component` boundary between
//!   sub-engines.
//! - [`problem`] — the [`problem::Problem`] error taxonomy and the
//!   three-valued [`problem::Outcome`] result type threaded throughout.
//! - [`response`] — assembles a completed outcome into the GraphQL-standard
//!   `{ "data": ..., "errors": [...] }` envelope.
//! - [`schema`] — the read-only schema surface the core consumes, plus the
//!   `__schema`/`__type` introspection pseudo-cursor.
//! - [`config`] — crate-wide policy knobs resolving this engine's open
//!   design questions (unknown-field handling, sibling-argument merging)
//!   explicitly rather than hard-coding a single answer.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions, reason = "CursorRef/ProtoJson naming mirrors their module")]

pub mod argument;
pub mod config;
pub mod context;
pub mod cursor;
pub mod env;
pub mod interpreter;
pub mod mapping;
pub mod problem;
pub mod proto;
pub mod query;
pub mod response;
pub mod schema;
#[cfg(test)]
mod test_support;
pub mod value;

pub use crate::argument::{ArgumentValue, Binding, Bindings};
pub use crate::config::{ArgumentMergePolicy, Options, UnknownFieldPolicy};
pub use crate::context::Context;
pub use crate::cursor::{Cursor, CursorRef};
pub use crate::env::Env;
pub use crate::interpreter::Interpreter;
pub use crate::mapping::{FieldMapping, Mapping, ObjectMapping, Subobject};
pub use crate::problem::{Outcome, Problem, ProblemKind};
pub use crate::proto::ProtoJson;
pub use crate::query::Query;
pub use crate::response::{execute, Response};
pub use crate::schema::{Field, ObjectType, Schema, StaticSchema, Type};
pub use crate::value::Json;

//! Argument values bound to a `Select`, and to
//! the `Cursor::field` projection they parameterize.
//!
//! Lives in its own module, below both [`crate::cursor`] and
//! [`crate::query`], since both need it: a `Select`'s `args` and a
//! `Cursor::field` call carry the same shape.

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::value::Json;

/// A single argument value: scalar, enum, list, or input-object shaped,
/// matching the value shapes a parsed/elaborated GraphQL argument can take.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgumentValue {
    Scalar(Json),
    Enum(ArcStr),
    List(Vec<ArgumentValue>),
    Object(IndexMap<ArcStr, ArgumentValue>),
    Null,
}

/// `name → value` bindings accompanying a `Select` or a `Cursor::field` call.
pub type Bindings = IndexMap<ArcStr, ArgumentValue>;

/// A single `name → value` binding, for building `Bindings` one entry at a time.
pub type Binding = (ArcStr, ArgumentValue);

pub fn bindings(entries: impl IntoIterator<Item = Binding>) -> Bindings {
    entries.into_iter().collect()
}

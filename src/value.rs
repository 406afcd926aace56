//! The `Json` type produced by leaf resolution and assembled into the final
//! GraphQL response.
//!
//! Scalars and enums are handed to us already-resolved by a [`Cursor`]
//! (`Cursor::as_leaf`), so unlike `juniper::Value` this crate has no need for
//! a generic `ScalarValue` abstraction over wire-format scalar literals —
//! that concern belongs to the (out of scope) query parser. We reuse
//! `serde_json::Value` directly, with the `preserve_order` feature enabled so
//! that object field order matches insertion order, which is what lets
//! [`crate::proto::ProtoJson`] assembly preserve normalized query order
//! without a hand-rolled ordered map.
//!
//! [`Cursor`]: crate::cursor::Cursor

use serde_json::Map;

/// A fully resolved JSON value: the type of scalar leaves, and of the
/// completed GraphQL response body.
pub type Json = serde_json::Value;

/// An ordered `name -> Json` map, used both for `Json::Object` construction
/// and for `Problem`'s `extensions`-style auxiliary data.
pub type JsonObject = Map<String, Json>;

/// Builds a `Json::Object` from an iterator of `(name, value)` pairs,
/// preserving iteration order.
pub fn object<I, K>(fields: I) -> Json
where
    I: IntoIterator<Item = (K, Json)>,
    K: Into<String>,
{
    let mut map = JsonObject::new();
    for (k, v) in fields {
        map.insert(k.into(), v);
    }
    Json::Object(map)
}

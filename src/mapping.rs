//! [`Mapping`] / [`Component`](crate::query::Query::Component): the boundary
//! between sub-engines.
//!
//! A `Mapping` is a declarative table — `ObjectMapping` per type, each
//! carrying either plain field mappings or `Subobject` cross-component
//! joins — rather than a single monolithic resolver function, mirroring how
//! `juniper::Registry` accumulates one `MetaType` per Rust type instead of a
//! single global dispatch table.

use std::sync::Arc;

use arcstr::ArcStr;

use crate::interpreter::Interpreter;
use crate::query::Join;
use crate::schema::Type;

/// A cross-component join: the field is backed by a different
/// [`Interpreter`] than the one serving its parent object.
#[derive(Clone)]
pub struct Subobject {
    pub field_name: ArcStr,
    /// Identity of the sub-mapping to hand off to, looked up via
    /// [`Mapping::interpreter_for`].
    pub mapping_id: ArcStr,
    pub join: Join,
}

impl Subobject {
    pub fn new(field_name: impl Into<ArcStr>, mapping_id: impl Into<ArcStr>, join: Join) -> Self {
        Self {
            field_name: field_name.into(),
            mapping_id: mapping_id.into(),
            join,
        }
    }
}

/// One field entry of an [`ObjectMapping`]: either an ordinary
/// attribute/field the owning interpreter resolves directly, or a
/// cross-component [`Subobject`].
#[derive(Clone)]
pub enum FieldMapping {
    Attribute(ArcStr),
    Subobject(Subobject),
}

/// The field mappings declared for one named type.
#[derive(Clone, Default)]
pub struct ObjectMapping {
    pub tpe: Option<Type>,
    pub fields: Vec<FieldMapping>,
}

impl ObjectMapping {
    pub fn new(tpe: Type) -> Self {
        Self {
            tpe: Some(tpe),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, field_name: impl Into<ArcStr>) -> Self {
        self.fields.push(FieldMapping::Attribute(field_name.into()));
        self
    }

    #[must_use]
    pub fn with_subobject(mut self, subobject: Subobject) -> Self {
        self.fields.push(FieldMapping::Subobject(subobject));
        self
    }

    fn subobject(&self, field_name: &str) -> Option<&Subobject> {
        self.fields.iter().find_map(|f| match f {
            FieldMapping::Subobject(s) if s.field_name.as_str() == field_name => Some(s),
            _ => None,
        })
    }
}

/// The boundary table a `Component` query node hands off to.
///
/// `object_mappings` is declaration-ordered: the first matching
/// `ObjectMapping` for a type wins, implemented by [`Mapping::subobject`]'s
/// linear scan, so implementors must preserve the order they declared
/// mappings in.
pub trait Mapping: Send + Sync {
    fn object_mappings(&self) -> &[ObjectMapping];

    /// Resolves the [`Interpreter`] identified by `mapping_id`, as named by
    /// a [`Subobject::mapping_id`].
    fn interpreter_for(&self, mapping_id: &str) -> Option<Arc<dyn Interpreter>>;

    /// `subobject(tpe, fieldName)`: `Some` iff the first `ObjectMapping`
    /// matching `tpe` has a `Subobject` entry for `fieldName`.
    fn subobject(&self, tpe: &Type, field_name: &str) -> Option<&Subobject> {
        self.object_mappings()
            .iter()
            .find(|om| om.tpe.as_ref() == Some(tpe))
            .and_then(|om| om.subobject(field_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::cursor::CursorRef;
    use crate::problem::Outcome;
    use crate::proto::ProtoJson;
    use crate::query::{default_join, Query};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct NoopInterpreter(crate::schema::StaticSchema);

    #[async_trait]
    impl Interpreter for NoopInterpreter {
        async fn run_root_value(&self, _cursor: &CursorRef, _query: &Query) -> Outcome<ProtoJson> {
            Outcome::ok(ProtoJson::PureJson(serde_json::Value::Null))
        }

        fn schema(&self) -> &dyn crate::schema::Schema {
            &self.0
        }
    }

    struct FixtureMapping {
        objects: Vec<ObjectMapping>,
    }

    impl Mapping for FixtureMapping {
        fn object_mappings(&self) -> &[ObjectMapping] {
            &self.objects
        }

        fn interpreter_for(&self, mapping_id: &str) -> Option<Arc<dyn Interpreter>> {
            (mapping_id == "sub")
                .then(|| Arc::new(NoopInterpreter(crate::schema::StaticSchema::builder("Query").build())) as Arc<dyn Interpreter>)
        }
    }

    #[test]
    fn subobject_lookup_finds_declared_field() {
        let mapping = FixtureMapping {
            objects: vec![ObjectMapping::new(Type::Object("Query".into()))
                .with_subobject(Subobject::new("foo", "sub", default_join()))],
        };

        let sub = mapping.subobject(&Type::Object("Query".into()), "foo");
        assert!(sub.is_some());
        assert_eq!(sub.unwrap().mapping_id, "sub");
    }

    #[test]
    fn subobject_lookup_misses_unknown_field() {
        let mapping = FixtureMapping {
            objects: vec![ObjectMapping::new(Type::Object("Query".into()))],
        };
        assert!(mapping.subobject(&Type::Object("Query".into()), "foo").is_none());
    }

    #[test]
    fn first_matching_object_mapping_wins() {
        let mapping = FixtureMapping {
            objects: vec![
                ObjectMapping::new(Type::Object("Query".into())),
                ObjectMapping::new(Type::Object("Query".into()))
                    .with_subobject(Subobject::new("foo", "sub", default_join())),
            ],
        };
        // The first (fieldless) ObjectMapping for Query wins, so "foo" is not found
        // even though a later entry for the same type declares it.
        assert!(mapping.subobject(&Type::Object("Query".into()), "foo").is_none());
    }
}

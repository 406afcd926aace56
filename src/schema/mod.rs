//! The read-only schema surface the core consumes.
//!
//! This is deliberately thin: building, parsing or validating a `Schema` is
//! an out-of-scope collaborator. What's modeled here is exactly the
//! navigation surface the interpreter needs: a closed sum type of type kinds
//! (grounded in `juniper::schema::meta::MetaType`, generalized from its
//! macro-populated `ObjectMeta`/`InterfaceMeta`/etc. to a plain data enum
//! since nothing here is built via `#[derive(GraphQLObject)]` codegen), plus
//! the handful of navigation operations `runFields`/`runValue` and `Context`
//! need.

pub mod introspection;

use arcstr::ArcStr;
use fnv::FnvHashMap;

/// A GraphQL type, as a closed sum type — mirrors
/// `juniper::schema::model::TypeType` generalized to the full kind list a
/// core query engine needs to dispatch on (`Scalar`, `Enum`, `Object`,
/// `Interface`, `Union`, `Input`, `List`, `Nullable`, `TypeRef`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Scalar(ArcStr),
    Enum(ArcStr),
    Object(ArcStr),
    Interface(ArcStr),
    Union(ArcStr),
    Input(ArcStr),
    List(Box<Type>),
    Nullable(Box<Type>),
    /// An as-yet-unresolved reference by name, resolved against
    /// `Schema::types` by the interpreter's value-resolution pass.
    TypeRef(ArcStr),
}

impl Type {
    /// The type's own name, for named (non-`List`/`Nullable`) types.
    pub fn name(&self) -> Option<&ArcStr> {
        match self {
            Self::Scalar(n)
            | Self::Enum(n)
            | Self::Object(n)
            | Self::Interface(n)
            | Self::Union(n)
            | Self::Input(n)
            | Self::TypeRef(n) => Some(n),
            Self::List(_) | Self::Nullable(_) => None,
        }
    }

    /// Leaf types are `Scalar` and `Enum`.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// Peels `List`/`Nullable` wrappers down to the innermost named type.
    pub fn innermost(&self) -> &Type {
        match self {
            Self::List(t) | Self::Nullable(t) => t.innermost(),
            other => other,
        }
    }
}

/// Field metadata, including `@deprecated` recognition.
/// Grounded in `juniper::schema::meta::Field`/`DeprecationStatus`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: ArcStr,
    pub field_type: Type,
    pub description: Option<ArcStr>,
    pub deprecation_reason: Option<ArcStr>,
}

impl Field {
    pub fn new(name: impl Into<ArcStr>, field_type: Type) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
            deprecation_reason: None,
        }
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<ArcStr>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation_reason.is_some()
    }
}

/// One named type's full field set and, for interfaces/unions, its
/// narrowing relationships — the data a [`Schema`] implementation needs to
/// answer `field`, `underlying_field`, and `narrows_to`.
#[derive(Clone, Debug, Default)]
pub struct ObjectType {
    pub fields: Vec<Field>,
    /// Interfaces this object type implements (for `Object` kinds) or
    /// member type names (for `Union` kinds).
    pub implements_or_members: Vec<ArcStr>,
}

impl ObjectType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.as_str() == name)
    }
}

/// The schema surface consumed by the interpreter.
///
/// An in-memory implementation, [`StaticSchema`], is provided below and used
/// throughout the test suite; a real embedder plugs in a schema built (and
/// validated) by its own compiler instead.
pub trait Schema {
    /// All named types known to this schema.
    fn types(&self) -> &[Type];

    /// The distinguished root query type.
    fn query_type(&self) -> Type;

    /// `underlyingField(name)`: the declared type of `name` on `tpe`,
    /// without regard to whether `tpe` itself is nullable/list-wrapped.
    fn underlying_field(&self, tpe: &Type, name: &str) -> Option<Type>;

    /// `underlyingObject`: peels `List`/`Nullable`/`TypeRef` wrappers down to
    /// the concrete `Object`/`Interface`/`Union` type, resolving `TypeRef`s
    /// against `types()`.
    fn underlying_object(&self, tpe: &Type) -> Option<Type> {
        match tpe {
            Type::List(t) | Type::Nullable(t) => self.underlying_object(t),
            Type::TypeRef(name) => {
                let resolved = self.types().iter().find(|t| t.name().map(|n| n.as_str()) == Some(name.as_str()))?;
                self.underlying_object(resolved)
            }
            Type::Object(_) | Type::Interface(_) | Type::Union(_) => Some(tpe.clone()),
            _ => None,
        }
    }

    /// Field metadata for `name` on `tpe`, for the kinds that carry fields
    /// (`Object`/`Interface`). Returns `None` rather than panicking when
    /// `name` is unknown — callers (`Cursor::has_field`) check this first.
    fn field(&self, tpe: &Type, name: &str) -> Option<Field>;

    /// Resolves a dotted field path against `tpe`, short-circuiting to
    /// `None` at the first unknown step.
    fn path(&self, tpe: &Type, names: &[&str]) -> Option<Type> {
        let mut current = tpe.clone();
        for name in names {
            current = self.underlying_field(&current, name)?;
        }
        Some(current)
    }

    /// Interface/union membership: does `sub` narrow `abstract_tpe`?
    fn narrows_to(&self, abstract_tpe: &Type, sub: &Type) -> bool;

    /// Resolves a `TypeRef` by name against `types()`.
    fn resolve_type_ref(&self, name: &str) -> Option<Type> {
        self.types()
            .iter()
            .find(|t| t.name().map(|n| n.as_str()) == Some(name))
            .cloned()
    }
}

/// A plain in-memory [`Schema`] built up by name, sufficient for tests and
/// for embedders that don't need a richer schema model of their own.
#[derive(Clone, Debug, Default)]
pub struct StaticSchema {
    objects: FnvHashMap<ArcStr, ObjectType>,
    types: Vec<Type>,
    query_type_name: ArcStr,
}

impl StaticSchema {
    pub fn builder(query_type_name: impl Into<ArcStr>) -> StaticSchemaBuilder {
        StaticSchemaBuilder {
            schema: Self {
                objects: FnvHashMap::default(),
                types: Vec::new(),
                query_type_name: query_type_name.into(),
            },
        }
    }
}

pub struct StaticSchemaBuilder {
    schema: StaticSchema,
}

impl StaticSchemaBuilder {
    #[must_use]
    pub fn object(mut self, name: impl Into<ArcStr>, object_type: ObjectType) -> Self {
        let name = name.into();
        self.schema.types.push(Type::Object(name.clone()));
        self.schema.objects.insert(name, object_type);
        self
    }

    #[must_use]
    pub fn interface(mut self, name: impl Into<ArcStr>, object_type: ObjectType) -> Self {
        let name = name.into();
        self.schema.types.push(Type::Interface(name.clone()));
        self.schema.objects.insert(name, object_type);
        self
    }

    #[must_use]
    pub fn union(mut self, name: impl Into<ArcStr>, members: Vec<ArcStr>) -> Self {
        let name = name.into();
        self.schema.types.push(Type::Union(name.clone()));
        self.schema.objects.insert(
            name,
            ObjectType {
                fields: Vec::new(),
                implements_or_members: members,
            },
        );
        self
    }

    #[must_use]
    pub fn scalar(mut self, name: impl Into<ArcStr>) -> Self {
        self.schema.types.push(Type::Scalar(name.into()));
        self
    }

    pub fn build(self) -> StaticSchema {
        self.schema
    }
}

impl Schema for StaticSchema {
    fn types(&self) -> &[Type] {
        &self.types
    }

    fn query_type(&self) -> Type {
        Type::Object(self.query_type_name.clone())
    }

    fn underlying_field(&self, tpe: &Type, name: &str) -> Option<Type> {
        let obj = self.underlying_object(tpe)?;
        let obj_name = obj.name()?;
        self.objects
            .get(obj_name.as_str())
            .and_then(|o| o.field(name))
            .map(|f| f.field_type.clone())
    }

    fn field(&self, tpe: &Type, name: &str) -> Option<Field> {
        let obj = self.underlying_object(tpe)?;
        let obj_name = obj.name()?;
        self.objects.get(obj_name.as_str()).and_then(|o| o.field(name)).cloned()
    }

    fn narrows_to(&self, abstract_tpe: &Type, sub: &Type) -> bool {
        let Some(sub_name) = sub.name() else { return false };
        match abstract_tpe {
            Type::Interface(iface_name) | Type::Union(iface_name) => self
                .objects
                .get(sub_name.as_str())
                .is_some_and(|o| o.implements_or_members.iter().any(|n| n == iface_name)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_schema() -> StaticSchema {
        StaticSchema::builder("Query")
            .object(
                "Query",
                ObjectType {
                    fields: vec![Field::new("movie", Type::Nullable(Box::new(Type::Object("Movie".into()))))],
                    implements_or_members: Vec::new(),
                },
            )
            .object(
                "Movie",
                ObjectType {
                    fields: vec![
                        Field::new("title", Type::Scalar("String".into())),
                        Field::new("rating", Type::Scalar("String".into())).deprecated("use certification"),
                    ],
                    implements_or_members: Vec::new(),
                },
            )
            .interface(
                "Entity",
                ObjectType {
                    fields: vec![Field::new("id", Type::Scalar("ID".into()))],
                    implements_or_members: Vec::new(),
                },
            )
            .build()
    }

    #[test]
    fn underlying_field_peels_nullable_wrapper() {
        let schema = movie_schema();
        let query = schema.query_type();
        let movie_field = schema.underlying_field(&query, "movie").unwrap();
        assert_eq!(movie_field, Type::Nullable(Box::new(Type::Object("Movie".into()))));

        let movie = schema.underlying_object(&movie_field).unwrap();
        assert_eq!(schema.underlying_field(&movie, "title"), Some(Type::Scalar("String".into())));
    }

    #[test]
    fn field_reports_deprecation() {
        let schema = movie_schema();
        let movie = Type::Object("Movie".into());
        let rating = schema.field(&movie, "rating").unwrap();
        assert!(rating.is_deprecated());
        assert_eq!(rating.deprecation_reason.as_deref(), Some("use certification"));
    }

    #[test]
    fn unknown_field_is_none_not_a_panic() {
        let schema = movie_schema();
        let movie = Type::Object("Movie".into());
        assert_eq!(schema.field(&movie, "nope"), None);
    }

    #[test]
    fn path_resolves_multi_step() {
        let schema = movie_schema();
        let query = schema.query_type();
        let resolved = schema.path(&query, &["movie", "title"]);
        assert_eq!(resolved, Some(Type::Scalar("String".into())));
    }
}

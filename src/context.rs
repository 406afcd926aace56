//! `Context`: the immutable `(path, resultPath, tpe)` triple carried by every
//! [`Cursor`](crate::cursor::Cursor).
//!
//! Grounded in `juniper::Executor`'s `field_path`/`current_type` pair (see
//! `FieldPath` in the teacher's `executor` module), but made into a
//! standalone, cloneable value rather than a borrowed, executor-owned
//! structure — this crate's `Cursor`s are values that outlive any single
//! `Executor`-equivalent borrow, "cursors are values"
//! note.

use arcstr::ArcStr;
use std::sync::Arc;

use crate::schema::{Schema, Type};

/// A single step in a [`Context`]'s path: the schema field name, and the
/// alias (if any) applied by the query.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Step {
    field_name: ArcStr,
    result_name: ArcStr,
}

/// The `(path, resultPath, tpe)` triple of
///
/// `path` and `result_path` are stored as a single reverse-linked list of
/// [`Step`]s (innermost first, matching the spec's "schema field names from
/// the root to the current position, innermost first") so that `for_field`
/// is O(1) instead of copying a growing `Vec` at every level — the same
/// `Arc<FieldPath>` trick `juniper::Executor` uses for its field stack.
#[derive(Clone, Debug)]
pub struct Context {
    steps: Option<Arc<ContextNode>>,
    tpe: Type,
}

#[derive(Debug)]
struct ContextNode {
    step: Step,
    parent: Option<Arc<ContextNode>>,
}

impl Context {
    /// A root context positioned at `tpe` with an empty path — the context
    /// of the root cursor before any `field` projection.
    pub fn root(tpe: Type) -> Self {
        Self { steps: None, tpe }
    }

    /// The GraphQL type at this position.
    pub fn tpe(&self) -> &Type {
        &self.tpe
    }

    /// Returns a copy of this context with `tpe` replaced, path unchanged.
    ///
    /// Used when unwrapping `Nullable`/`List` layers, which advance the type
    /// without taking a field step.
    #[must_use]
    pub fn as_type(&self, tpe: Type) -> Self {
        Self {
            steps: self.steps.clone(),
            tpe,
        }
    }

    /// Schema field names from the root to here, innermost (most recent) first.
    pub fn path(&self) -> Vec<ArcStr> {
        self.collect(|s| s.field_name.clone())
    }

    /// Query-aliased field names from the root to here, innermost first.
    pub fn result_path(&self) -> Vec<ArcStr> {
        self.collect(|s| s.result_name.clone())
    }

    /// `result_path`, outermost first, converted to `String` — the shape
    /// `Problem::path` expects
    pub fn problem_path(&self) -> Vec<String> {
        let mut p = self.result_path();
        p.reverse();
        p.into_iter().map(|s| s.to_string()).collect()
    }

    fn collect(&self, f: impl Fn(&Step) -> ArcStr) -> Vec<ArcStr> {
        let mut out = Vec::new();
        let mut node = self.steps.as_ref();
        while let Some(n) = node {
            out.push(f(&n.step));
            node = n.parent.as_ref();
        }
        out
    }

    /// `forField`: project onto a child field, given its declared type.
    ///
    /// The caller (`Cursor::field`) is responsible for resolving `name` to
    /// `field_type` via the schema and failing with `FieldNotFound` first;
    /// this constructor cannot fail, it only extends the path.
    #[must_use]
    pub fn for_field(&self, name: &str, alias: Option<&str>, field_type: Type) -> Self {
        let step = Step {
            field_name: ArcStr::from(name),
            result_name: alias.map(ArcStr::from).unwrap_or_else(|| ArcStr::from(name)),
        };
        Self {
            steps: Some(Arc::new(ContextNode {
                step,
                parent: self.steps.clone(),
            })),
            tpe: field_type,
        }
    }

    /// `forPath`: project through a sequence of field names with no
    /// aliasing, resolving each step's type along the way. Returns `None` if
    /// any step names a field absent from the schema surface `resolve`
    /// reports.
    pub fn for_path(
        &self,
        names: &[&str],
        resolve: impl Fn(&Type, &str) -> Option<Type>,
    ) -> Option<Self> {
        let mut ctx = self.clone();
        for name in names {
            let next_type = resolve(ctx.tpe(), name)?;
            ctx = ctx.for_field(name, None, next_type);
        }
        Some(ctx)
    }

    /// `forFieldOrAttribute`: like `for_field`, but for mapping-level
    /// pseudo-fields that have no schema entry — falls back to a synthetic
    /// `Scalar("Attribute")` type rather than failing when the field is
    /// unknown.
    #[must_use]
    pub fn for_field_or_attribute(&self, schema: &dyn Schema, name: &str, alias: Option<&str>) -> Self {
        let field_type = schema
            .underlying_field(&self.tpe, name)
            .unwrap_or_else(|| Type::Scalar(ArcStr::from("Attribute")));
        self.for_field(name, alias, field_type)
    }

    /// The length invariant `|path| == |resultPath|`. Holds structurally
    /// here, since both are read off the same step list, but is exposed so
    /// callers that want to assert it explicitly can.
    pub fn check_path_invariant(&self) -> bool {
        self.path().len() == self.result_path().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Type;

    #[test]
    fn root_context_has_empty_path() {
        let ctx = Context::root(Type::Scalar("String".into()));
        assert!(ctx.path().is_empty());
        assert!(ctx.result_path().is_empty());
    }

    #[test]
    fn for_field_extends_path_innermost_first() {
        let root = Context::root(Type::Object("Query".into()));
        let movie = root.for_field("movie", None, Type::Object("Movie".into()));
        let title = movie.for_field("title", Some("t"), Type::Scalar("String".into()));

        assert_eq!(title.path(), vec![ArcStr::from("title"), ArcStr::from("movie")]);
        assert_eq!(
            title.result_path(),
            vec![ArcStr::from("t"), ArcStr::from("movie")]
        );
        assert_eq!(title.problem_path(), vec!["movie".to_string(), "t".to_string()]);
    }

    #[test]
    fn path_length_invariant_holds() {
        let root = Context::root(Type::Object("Query".into()));
        let movie = root.for_field("movie", None, Type::Object("Movie".into()));
        assert!(movie.check_path_invariant());
    }

    #[test]
    fn for_field_or_attribute_falls_back_to_synthetic_scalar() {
        use crate::schema::StaticSchema;

        let schema = StaticSchema::builder("Query").build();
        let root = Context::root(Type::Object("Query".into()));
        let attr = root.for_field_or_attribute(&schema, "__rowCount", None);
        assert_eq!(attr.tpe(), &Type::Scalar("Attribute".into()));
    }
}

//! User-visible error taxonomy and the three-valued [`Outcome`] result type
//! threaded through cursor and interpreter operations.
//!
//! Modeled after `juniper`'s `FieldError`/`ExecutionError` split (a short
//! human message plus structured location/path context) and its
//! `ResultExt`/`jtry!` ergonomics, but widened from a binary `Result` to the
//! three-valued `Success`/`Warnings`/`Failure` shape calls for: a
//! `Group` sibling can fail while its neighbors still contribute data, so the
//! interpreter needs a result type that can carry *both* a value and
//! non-fatal problems.

use std::fmt;

use derive_more::{Display, Error};
use serde::Serialize;

/// The kind of a [`Problem`], independent of its message text.
///
/// These are the error *kinds* named in, not concrete Rust
/// error types — every one of them is carried as a `Problem` with a
/// `ProblemKind` discriminant so a caller can match on kind without parsing
/// `message`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemKind {
    /// Malformed top-level query shape (`runRoot` did not match `Select`/`Rename(Select)`).
    BadQuery,
    /// A selection names a field unknown on the current type.
    FieldNotFound,
    /// A cursor operation was invoked on an incompatible type (e.g. `as_leaf` on an object).
    TypeMismatch,
    /// A `TypeRef` failed to resolve against the schema's type list.
    UnknownType,
    /// A type kind the interpreter has no dispatch rule for.
    UnsupportedType,
    /// `narrow` was invoked where `narrows_to` does not hold.
    NarrowingFailed,
    /// A non-null field yielded an absent value.
    NullabilityViolation,
    /// `Unique` saw more than one element.
    TooManyResults,
    /// `Unique` saw zero elements where one was required by context.
    EmptyResult,
    /// A `Deferred` proto node could not be resolved by any component mapping.
    Deferral,
    /// `Env::get` missed: no such key, or a type mismatch on lookup.
    EnvLookupFailed,
    /// Raised only for schema surface issues (undefined type references, etc.).
    SchemaValidation,
}

/// A source location in the original query text, `(line, col)`, 1-based —
/// mirrors `juniper::SourcePosition`'s role in `ExecutionError`, minus the
/// byte-offset bookkeeping a parser would need (out of scope here).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

/// A single user-visible error entry.
///
/// Serializes directly into the `<problem>` shape of:
/// `message` first, then `locations`, then `path`, with absent optional
/// fields omitted — field declaration order plus `skip_serializing_if`
/// gives us that for free rather than hand-writing `Serialize`.
#[derive(Clone, Debug, Display, Error, Serialize)]
#[display("{message}")]
pub struct Problem {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(skip)]
    pub kind: ProblemKind,
}

impl Problem {
    /// Construct a problem with no location/path context yet attached.
    pub fn new(kind: ProblemKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
            kind,
        }
    }

    /// Returns a copy of this problem with `path` set, if not already set.
    ///
    /// Used by the interpreter to attach `context.result_path` the first time
    /// a `Problem` bubbles past a point that knows its path
    #[must_use]
    pub fn with_path_if_absent(mut self, path: impl FnOnce() -> Vec<String>) -> Self {
        if self.path.is_none() {
            self.path = Some(path());
        }
        self
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BadQuery => "bad query",
            Self::FieldNotFound => "field not found",
            Self::TypeMismatch => "type mismatch",
            Self::UnknownType => "unknown type",
            Self::UnsupportedType => "unsupported type",
            Self::NarrowingFailed => "narrowing failed",
            Self::NullabilityViolation => "nullability violation",
            Self::TooManyResults => "too many results",
            Self::EmptyResult => "empty result",
            Self::Deferral => "deferral",
            Self::EnvLookupFailed => "environment lookup failed",
            Self::SchemaValidation => "schema validation",
        })
    }
}

/// The three-valued result threaded through cursor and interpreter
/// operations: a plain success, a success carrying non-fatal problems, or an
/// outright failure. Isomorphic to `These<NonEmpty<Problem>, T>`, implemented
/// here as an explicit tagged enum rather than pulling in a
/// `these`/`validated` crate — the combine rule is a handful of lines and
/// the crate has no other use for the abstraction.
#[derive(Clone, Debug)]
pub enum Outcome<T> {
    Success(T),
    Warnings(Vec<Problem>, T),
    Failure(Vec<Problem>),
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self::Success(value)
    }

    pub fn err(problem: Problem) -> Self {
        Self::Failure(vec![problem])
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The problems collected so far, if any.
    pub fn problems(&self) -> &[Problem] {
        match self {
            Self::Success(_) => &[],
            Self::Warnings(ps, _) | Self::Failure(ps) => ps,
        }
    }

    /// Attach `path` to every carried problem that doesn't already have one.
    #[must_use]
    pub fn with_path(self, path: impl Fn() -> Vec<String>) -> Self {
        match self {
            Self::Success(v) => Self::Success(v),
            Self::Warnings(ps, v) => Self::Warnings(
                ps.into_iter()
                    .map(|p| p.with_path_if_absent(&path))
                    .collect(),
                v,
            ),
            Self::Failure(ps) => {
                Self::Failure(ps.into_iter().map(|p| p.with_path_if_absent(&path)).collect())
            }
        }
    }

    /// The value, if one was produced (`Success` or `Warnings`).
    pub fn value(self) -> Option<T> {
        match self {
            Self::Success(v) | Self::Warnings(_, v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(v) => Outcome::Success(f(v)),
            Self::Warnings(ps, v) => Outcome::Warnings(ps, f(v)),
            Self::Failure(ps) => Outcome::Failure(ps),
        }
    }

    /// Monadic bind: short-circuits on `Failure`, additively combines
    /// problems when both sides carry warnings — this is the "Failure
    /// short-circuits only within the same sibling" rule of
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Success(v) => f(v),
            Self::Warnings(mut ps, v) => match f(v) {
                Outcome::Success(u) => Outcome::Warnings(ps, u),
                Outcome::Warnings(mut ps2, u) => {
                    ps.append(&mut ps2);
                    Outcome::Warnings(ps, u)
                }
                Outcome::Failure(mut ps2) => {
                    ps.append(&mut ps2);
                    Outcome::Failure(ps)
                }
            },
            Self::Failure(ps) => Outcome::Failure(ps),
        }
    }
}

/// Combine a list of sibling outcomes into one outcome of the list of
/// values, "within a `Group`, a failure in one sibling
/// yields a `Both` result — the remaining siblings still contribute their
/// data when possible": a sibling that failed outright contributes no value
/// but its problems are still collected, and the whole combination is only a
/// hard `Failure` if *every* sibling failed.
pub fn combine_siblings<T>(outcomes: Vec<Outcome<T>>) -> Outcome<Vec<T>> {
    let mut problems = Vec::new();
    let mut values = Vec::new();
    let mut any_value = false;

    for outcome in outcomes {
        match outcome {
            Outcome::Success(v) => {
                any_value = true;
                values.push(v);
            }
            Outcome::Warnings(mut ps, v) => {
                any_value = true;
                problems.append(&mut ps);
                values.push(v);
            }
            Outcome::Failure(mut ps) => {
                problems.append(&mut ps);
            }
        }
    }

    if problems.is_empty() {
        Outcome::Success(values)
    } else if any_value {
        Outcome::Warnings(problems, values)
    } else {
        Outcome::Failure(problems)
    }
}

/// Extension trait converting any `Display`-able error into a [`Problem`],
/// mirroring `juniper::ResultExt::to_field_result` for the common "just
/// stringify it" case.
pub trait ResultExt<T, E> {
    fn problem(self, kind: ProblemKind) -> Result<T, Problem>;
}

impl<T, E: fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn problem(self, kind: ProblemKind) -> Result<T, Problem> {
        self.map_err(|e| Problem::new(kind, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_then_short_circuits_on_failure() {
        let o: Outcome<i32> = Outcome::err(Problem::new(ProblemKind::BadQuery, "nope"));
        let r = o.and_then(|v| Outcome::Success(v + 1));
        assert!(r.is_failure());
    }

    #[test]
    fn combine_siblings_partial_success_is_warnings() {
        let outcomes = vec![
            Outcome::Success(1),
            Outcome::Failure(vec![Problem::new(ProblemKind::FieldNotFound, "nope")]),
            Outcome::Success(3),
        ];
        match combine_siblings(outcomes) {
            Outcome::Warnings(ps, vs) => {
                assert_eq!(ps.len(), 1);
                assert_eq!(vs, vec![1, 3]);
            }
            other => panic!("expected Warnings, got {other:?}"),
        }
    }

    #[test]
    fn combine_siblings_all_failed_is_failure() {
        let outcomes: Vec<Outcome<i32>> = vec![
            Outcome::Failure(vec![Problem::new(ProblemKind::BadQuery, "a")]),
            Outcome::Failure(vec![Problem::new(ProblemKind::BadQuery, "b")]),
        ];
        assert!(combine_siblings(outcomes).is_failure());
    }

    #[test]
    fn problem_serializes_message_locations_path_in_order() {
        let p = Problem::new(ProblemKind::FieldNotFound, "nope")
            .with_path_if_absent(|| vec!["movie".into(), "nope".into()]);
        let json = serde_json::to_string(&p).unwrap();
        let message_idx = json.find("\"message\"").unwrap();
        let path_idx = json.find("\"path\"").unwrap();
        assert!(message_idx < path_idx);
    }
}

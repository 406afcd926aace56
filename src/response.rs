//! The response assembler (§2, §6): combines a completed `data` value and
//! whatever [`Problem`]s were collected along the way into the
//! GraphQL-standard envelope `{ "data": ..., "errors": [...] }`.
//!
//! Grounded in how `juniper`'s `http` module turns an `(Value, Vec<ExecutionError>)`
//! pair into its own wire response — generalized here to the three-valued
//! [`Outcome`] this crate threads through interpretation instead of a plain
//! `Result` plus a separate error `Vec`.

use serde::Serialize;

use crate::cursor::CursorRef;
use crate::interpreter::Interpreter;
use crate::mapping::Mapping;
use crate::problem::{Outcome, Problem};
use crate::query::Query;
use crate::value::Json;

/// `data` is present iff a proto completed to a value at all (`Success` or
/// `Warnings`); `errors` is present iff any problem was collected. Both can
/// be set at once — partial success — matching §6's response format.
#[derive(Clone, Debug, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Json>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Problem>>,
}

impl Response {
    fn from_outcome(outcome: Outcome<Json>) -> Self {
        match outcome {
            Outcome::Success(v) => Self {
                data: Some(v),
                errors: None,
            },
            Outcome::Warnings(ps, v) => Self {
                data: Some(v),
                errors: Some(ps),
            },
            Outcome::Failure(ps) => Self {
                data: None,
                errors: Some(ps),
            },
        }
    }

    /// Renders this response as the `{ "data": ..., "errors": [...] }` JSON
    /// envelope, in that field order.
    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).expect("Response fields are all directly serializable")
    }
}

/// Drives `query` against `root` through `interpreter` (`runRoot`),
/// completes the resulting proto via `mapping`, and assembles the outcome
/// into a [`Response`] envelope.
pub async fn execute(
    interpreter: &dyn Interpreter,
    root: &CursorRef,
    query: &Query,
    mapping: &dyn Mapping,
) -> Response {
    Response::from_outcome(interpreter.run_root(root, query, mapping).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ProblemKind;

    #[test]
    fn success_serializes_data_only() {
        let r = Response::from_outcome(Outcome::Success(Json::from(1)));
        let j = r.to_json();
        assert!(j.get("data").is_some());
        assert!(j.get("errors").is_none());
    }

    #[test]
    fn failure_serializes_errors_only() {
        let r: Response = Response::from_outcome(Outcome::Failure(vec![Problem::new(ProblemKind::BadQuery, "nope")]));
        let j = r.to_json();
        assert!(j.get("data").is_none());
        assert!(j.get("errors").is_some());
    }

    #[test]
    fn warnings_serializes_both() {
        let r = Response::from_outcome(Outcome::Warnings(
            vec![Problem::new(ProblemKind::FieldNotFound, "nope")],
            Json::from(1),
        ));
        let j = r.to_json();
        assert!(j.get("data").is_some());
        assert!(j.get("errors").is_some());
    }
}

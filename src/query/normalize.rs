//! Query normalization: `mergeQueries`, `mkPathQuery`, and
//! the pattern matchers back-ends use to recognize canonical shapes.

use std::collections::HashMap;

use arcstr::ArcStr;

use crate::config::ArgumentMergePolicy;
use crate::problem::{Problem, ProblemKind};

use super::{Bindings, OrderSelection, Predicate, Query};

/// `mergeQueries` under the default (permissive) argument-merge policy.
/// Never fails: see [`merge_queries_with`] for the fallible, policy-general form.
pub fn merge_queries(qs: Vec<Query>) -> Query {
    merge_queries_with(qs, ArgumentMergePolicy::PreferFirstNonEmpty)
        .expect("PreferFirstNonEmpty never rejects a merge")
}

/// `mergeQueries(qs)`, steps 1-5:
/// 1. Drop `Empty`.
/// 2. Flatten nested `Group`s one level.
/// 3. Partition into possibly-renamed `Select`s and other nodes.
/// 4. Group the selects by `(fieldName, resultName)`; merge each group's
///    children recursively, preserving the outermost `Rename`.
/// 5. Emit `Group(others ++ merged-selects)` — unwrapped to a bare node
///    when there's exactly one, so `mergeQueries([q]) ≡ q` holds without a
///    special case.
pub fn merge_queries_with(qs: Vec<Query>, policy: ArgumentMergePolicy) -> Result<Query, Problem> {
    let mut flat = Vec::with_capacity(qs.len());
    for q in qs {
        match q {
            Query::Empty => {}
            Query::Group(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut others = Vec::new();
    let mut order: Vec<(ArcStr, ArcStr)> = Vec::new();
    let mut groups: HashMap<(ArcStr, ArcStr), (Bindings, Query)> = HashMap::new();

    for q in flat {
        match as_possibly_renamed_select(q) {
            Ok((field_name, result_name, args, child)) => {
                let key = (field_name, result_name);
                match groups.get_mut(&key) {
                    Some((existing_args, existing_child)) => {
                        let merged_args =
                            merge_args(std::mem::take(existing_args), args, policy)?;
                        let merged_child = merge_queries_with(
                            vec![std::mem::replace(existing_child, Query::Empty), child],
                            policy,
                        )?;
                        *existing_args = merged_args;
                        *existing_child = merged_child;
                    }
                    None => {
                        order.push(key.clone());
                        groups.insert(key, (args, child));
                    }
                }
            }
            Err(other) => others.push(other),
        }
    }

    for (field_name, result_name) in order {
        let (args, child) = groups
            .remove(&(field_name.clone(), result_name.clone()))
            .expect("every ordered key was inserted into groups");
        let select = Query::select(field_name.clone(), args, child);
        let node = if result_name == field_name {
            select
        } else {
            Query::rename(result_name, select)
        };
        others.push(node);
    }

    Ok(match others.len() {
        0 => Query::Empty,
        1 => others.into_iter().next().unwrap(),
        _ => Query::Group(others),
    })
}

fn merge_args(a: Bindings, b: Bindings, policy: ArgumentMergePolicy) -> Result<Bindings, Problem> {
    match policy {
        ArgumentMergePolicy::PreferFirstNonEmpty => Ok(if a.is_empty() { b } else { a }),
        ArgumentMergePolicy::Reject => {
            if !a.is_empty() && !b.is_empty() && a != b {
                Err(Problem::new(
                    ProblemKind::BadQuery,
                    "sibling selects on the same field carry conflicting arguments",
                ))
            } else {
                Ok(if a.is_empty() { b } else { a })
            }
        }
    }
}

/// Deconstructs a `Query` into `(fieldName, resultName, args, child)` if it
/// matches `PossiblyRenamedSelect`, handing the original node back unchanged
/// in `Err` otherwise.
fn as_possibly_renamed_select(q: Query) -> Result<(ArcStr, ArcStr, Bindings, Query), Query> {
    match q {
        Query::Select { name, args, child } => Ok((name.clone(), name, args, *child)),
        Query::Rename(result_name, inner) => match *inner {
            Query::Select { name, args, child } => Ok((name, result_name, args, *child)),
            other => Err(Query::Rename(result_name, Box::new(other))),
        },
        other => Err(other),
    }
}

/// `PossiblyRenamedSelect`: the borrowing counterpart of
/// [`as_possibly_renamed_select`], for back-ends that just need to *read*
/// `(fieldName, resultName, child)` off a normalized node.
pub fn possibly_renamed_select(q: &Query) -> Option<(&ArcStr, &ArcStr, &Query)> {
    match q {
        Query::Select { name, child, .. } => Some((name, name, child)),
        Query::Rename(result_name, inner) => match inner.as_ref() {
            Query::Select { name, child, .. } => Some((name, result_name, child)),
            _ => None,
        },
        _ => None,
    }
}

/// `mkPathQuery(paths)`: the union of field-selection trees each path in
/// `paths` describes, one-element paths becoming leaf selects and
/// multi-element paths grouped by head and recursed on their tails.
pub fn mk_path_query(paths: &[Vec<ArcStr>]) -> Query {
    let mut order: Vec<ArcStr> = Vec::new();
    let mut tails_by_head: HashMap<ArcStr, Vec<Vec<ArcStr>>> = HashMap::new();

    for path in paths {
        let Some((head, tail)) = path.split_first() else {
            continue;
        };
        tails_by_head
            .entry(head.clone())
            .or_insert_with(|| {
                order.push(head.clone());
                Vec::new()
            })
            .push(tail.to_vec());
    }

    let selects: Vec<Query> = order
        .into_iter()
        .map(|head| {
            let tails = tails_by_head.remove(&head).unwrap_or_default();
            let non_empty: Vec<_> = tails.into_iter().filter(|t| !t.is_empty()).collect();
            let child = if non_empty.is_empty() {
                Query::Empty
            } else {
                mk_path_query(&non_empty)
            };
            Query::select(head, Bindings::new(), child)
        })
        .collect();

    match selects.len() {
        0 => Query::Empty,
        1 => selects.into_iter().next().unwrap(),
        _ => Query::Group(selects),
    }
}

/// `Limit(Offset(OrderBy(Filter(pred, q))))`, any layer optional, unpacked
/// so a back-end (e.g. a SQL mapping) can recognize a slice-plus-predicate
/// shape directly instead of pattern-matching nested `Query` variants.
pub struct FilterOrderByLimit {
    pub filter: Option<Predicate>,
    pub order_by: Option<Vec<OrderSelection>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub base: Query,
}

pub fn extract_filter_order_by_limit(query: Query) -> FilterOrderByLimit {
    let (limit, query) = match query {
        Query::Limit(n, q) => (Some(n), *q),
        q => (None, q),
    };
    let (offset, query) = match query {
        Query::Offset(n, q) => (Some(n), *q),
        q => (None, q),
    };
    let (order_by, query) = match query {
        Query::OrderBy(s, q) => (Some(s), *q),
        q => (None, q),
    };
    let (filter, base) = match query {
        Query::Filter(p, q) => (Some(p), *q),
        q => (None, q),
    };
    FilterOrderByLimit {
        filter,
        order_by,
        limit,
        offset,
        base,
    }
}

/// Recursively normalizes `query`, applying [`merge_queries_with`] at every
/// `Group` boundary it contains, not just the outermost one.
pub fn normalize(query: Query) -> Result<Query, Problem> {
    normalize_with(query, ArgumentMergePolicy::PreferFirstNonEmpty)
}

pub fn normalize_with(query: Query, policy: ArgumentMergePolicy) -> Result<Query, Problem> {
    let recurse = |q: Query| normalize_with(q, policy);
    Ok(match query {
        Query::Group(qs) => {
            let normalized = qs.into_iter().map(recurse).collect::<Result<Vec<_>, _>>()?;
            merge_queries_with(normalized, policy)?
        }
        Query::GroupList(qs) => {
            Query::GroupList(qs.into_iter().map(recurse).collect::<Result<Vec<_>, _>>()?)
        }
        Query::Select { name, args, child } => Query::select(name, args, recurse(*child)?),
        Query::Unique(q) => Query::Unique(Box::new(recurse(*q)?)),
        Query::Filter(p, q) => Query::Filter(p, Box::new(recurse(*q)?)),
        Query::OrderBy(s, q) => Query::OrderBy(s, Box::new(recurse(*q)?)),
        Query::Limit(n, q) => Query::Limit(n, Box::new(recurse(*q)?)),
        Query::Offset(n, q) => Query::Offset(n, Box::new(recurse(*q)?)),
        Query::Narrow(t, q) => Query::Narrow(t, Box::new(recurse(*q)?)),
        Query::UntypedNarrow(n, q) => Query::UntypedNarrow(n, Box::new(recurse(*q)?)),
        Query::Skip { sense, cond, child } => Query::Skip {
            sense,
            cond,
            child: Box::new(recurse(*child)?),
        },
        Query::Wrap(n, q) => Query::Wrap(n, Box::new(recurse(*q)?)),
        Query::Rename(n, q) => Query::Rename(n, Box::new(recurse(*q)?)),
        Query::Count(n, q) => Query::Count(n, Box::new(recurse(*q)?)),
        Query::Introspect(q) => Query::Introspect(Box::new(recurse(*q)?)),
        Query::Defer { join, child, root_tpe } => Query::Defer {
            join,
            child: Box::new(recurse(*child)?),
            root_tpe,
        },
        Query::Component { mapping, join, child } => Query::Component {
            mapping,
            join,
            child: Box::new(recurse(*child)?),
        },
        Query::Environment(env, q) => Query::Environment(env, Box::new(recurse(*q)?)),
        other @ (Query::Empty | Query::Skipped) => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::bindings;

    #[test]
    fn merge_queries_singleton_is_identity() {
        let q = Query::leaf("title");
        assert_eq!(merge_queries(vec![q.clone()]), q);
    }

    #[test]
    fn merge_queries_drops_empty() {
        let q = Query::leaf("title");
        assert_eq!(merge_queries(vec![Query::Empty, q.clone()]), q);
    }

    #[test]
    fn merge_queries_combines_same_named_siblings() {
        let a = Query::select("movie", Bindings::new(), Query::leaf("title"));
        let b = Query::select("movie", Bindings::new(), Query::leaf("year"));
        let merged = merge_queries(vec![a, b]);

        match merged {
            Query::Select { name, child, .. } => {
                assert_eq!(name, "movie");
                assert_eq!(*child, Query::Group(vec![Query::leaf("title"), Query::leaf("year")]));
            }
            other => panic!("expected a merged Select, got {other:?}"),
        }
    }

    #[test]
    fn merge_queries_preserves_outermost_rename() {
        // Same (fieldName, resultName) pair: both aliased to "m", so these
        // merge into one node despite the field itself being named "movie".
        let a = Query::rename("m", Query::select("movie", Bindings::new(), Query::leaf("title")));
        let b = Query::rename("m", Query::select("movie", Bindings::new(), Query::leaf("year")));
        let merged = merge_queries(vec![a, b]);
        match merged {
            Query::Rename(name, inner) => {
                assert_eq!(name, "m");
                match *inner {
                    Query::Select { child, .. } => {
                        assert_eq!(*child, Query::Group(vec![Query::leaf("title"), Query::leaf("year")]));
                    }
                    other => panic!("expected the renamed node to wrap a Select, got {other:?}"),
                }
            }
            other => panic!("expected Rename to survive merge, got {other:?}"),
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let a = Query::select("movie", Bindings::new(), Query::leaf("title"));
        let b = Query::select("movie", Bindings::new(), Query::leaf("year"));
        let once = merge_queries(vec![a, b]);
        let twice = merge_queries(vec![once.clone()]);
        assert_eq!(once, twice);
    }

    #[test]
    fn reject_policy_errors_on_conflicting_args() {
        let a = Query::select("movie", bindings([(ArcStr::from("id"), super::super::ArgumentValue::Null)]), Query::Empty);
        let b = Query::select(
            "movie",
            bindings([(ArcStr::from("id"), super::super::ArgumentValue::Scalar(serde_json::json!(1)))]),
            Query::Empty,
        );
        let result = merge_queries_with(vec![a, b], ArgumentMergePolicy::Reject);
        assert!(result.is_err());
    }

    #[test]
    fn mk_path_query_groups_by_head() {
        let paths = vec![
            vec![ArcStr::from("movie"), ArcStr::from("title")],
            vec![ArcStr::from("movie"), ArcStr::from("year")],
            vec![ArcStr::from("foo")],
        ];
        let q = mk_path_query(&paths);
        match q {
            Query::Group(qs) => assert_eq!(qs.len(), 2),
            other => panic!("expected a top-level Group, got {other:?}"),
        }
    }

    #[test]
    fn possibly_renamed_select_matches_plain_and_renamed() {
        let plain = Query::leaf("title");
        let (field, result, _) = possibly_renamed_select(&plain).unwrap();
        assert_eq!(field, result);

        let renamed = Query::rename("t", Query::leaf("title"));
        let (field, result, _) = possibly_renamed_select(&renamed).unwrap();
        assert_eq!(field, "title");
        assert_eq!(result, "t");
    }
}

//! Crate-wide policy configuration.
//!
//! Two interpreter behaviors are left as open policy choices for an
//! embedder to decide and document explicitly. Rather than hard-coding a
//! single answer, `Options`
//! exposes both as explicit, named policies — in the spirit of `juniper`'s
//! `RootNode::introspection_disabled`/`max_depth` knobs, which are likewise
//! `SchemaType`-independent execution-policy settings rather than schema
//! data.

/// How `runFields` should treat a `Select` whose field the cursor doesn't
/// (yet) have.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// Emit a `Deferred` node and let completion resolve it against some
    /// component mapping; only a `Deferral` problem if nothing claims
    /// it by the time completion runs. This is the natural
    /// behavior, and what makes cross-component field resolution possible.
    #[default]
    DeferThenError,
    /// Fail immediately with `FieldNotFound`, never giving a later mapping
    /// the chance to claim the field.
    ErrorImmediately,
}

/// How `mergeQueries` should resolve two sibling `Select`s on the same
/// `(fieldName, resultName)` that carry differing, non-empty argument lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArgumentMergePolicy {
    /// Keep whichever side's argument list is non-empty, preferring the
    /// first one encountered when both are — the permissive choice.
    #[default]
    PreferFirstNonEmpty,
    /// Fail the merge with `BadQuery` when both sides carry differing,
    /// non-empty argument lists — the conservative choice.
    Reject,
}

/// Crate-wide interpreter policy. Constructed with [`Options::default`] and
/// overridden field-by-field; there is deliberately no builder, since two
/// booleans-in-disguise don't need one.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    pub unknown_field_policy: UnknownFieldPolicy,
    pub argument_merge_policy: ArgumentMergePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_canonical_behavior() {
        let opts = Options::default();
        assert_eq!(opts.unknown_field_policy, UnknownFieldPolicy::DeferThenError);
        assert_eq!(opts.argument_merge_policy, ArgumentMergePolicy::PreferFirstNonEmpty);
    }
}

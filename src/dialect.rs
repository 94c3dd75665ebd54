//! Language version selection
//!
//! Two grammar generations share most of the surface syntax but differ in
//! pattern semantics, literal lowering and available clauses. The selector
//! is fixed for the duration of a parse call; version-dependent behavior is
//! driven by the [`Features`] table rather than scattered version checks, so
//! a new generation composes by adding a table entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grammar generation a query is parsed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CypherVersion {
    V1_9,
    V2_0,
}

impl CypherVersion {
    /// Resolves the version token of a leading `cypher <version>` directive.
    /// Accepts `1.9`, `v1_9`, `2.0`, `v2_0` and the `default` alias,
    /// case-insensitively.
    pub fn from_directive(token: &str) -> Option<CypherVersion> {
        match token.to_ascii_lowercase().as_str() {
            "1.9" | "v1_9" => Some(CypherVersion::V1_9),
            "2.0" | "v2_0" => Some(CypherVersion::V2_0),
            "default" => Some(CypherVersion::default()),
            _ => None,
        }
    }

    /// Static feature table for this version.
    pub fn features(self) -> &'static Features {
        match self {
            CypherVersion::V1_9 => &V1_9_FEATURES,
            CypherVersion::V2_0 => &V2_0_FEATURES,
        }
    }
}

impl Default for CypherVersion {
    fn default() -> Self {
        CypherVersion::V2_0
    }
}

impl fmt::Display for CypherVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CypherVersion::V1_9 => write!(f, "1.9"),
            CypherVersion::V2_0 => write!(f, "2.0"),
        }
    }
}

/// Per-version grammar switches.
///
/// `true` means the construct is accepted. Fields that select between two
/// behaviors (rather than gating one) are named for the older behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Features {
    /// Node labels in patterns, `HasLabel` predicates, label update actions.
    pub labels: bool,
    /// `UNION [ALL]` between queries.
    pub union_queries: bool,
    /// `CREATE INDEX`, `DROP INDEX`, `CREATE CONSTRAINT`.
    pub schema_commands: bool,
    /// `USING INDEX` / `USING SCAN` planner hints.
    pub index_hints: bool,
    /// `CASE … END` expressions.
    pub case_expressions: bool,
    /// `reduce(acc = init, x IN coll | expr)`.
    pub reduce_function: bool,
    /// `[x IN coll WHERE pred | expr]` comprehension syntax.
    pub list_comprehensions: bool,
    /// Patterns in predicate position lower to `PatternPredicate`; when
    /// false they lower to `NonEmpty(PathExpression(..))`.
    pub pattern_predicates: bool,
    /// `expr.prop?` / `expr.prop!` nullable property access.
    pub nullable_properties: bool,
    /// Relationship type lists separate with `|:`; when false with `|`.
    pub colon_type_separator: bool,
    /// `:` accepted as the iteration separator in `filter`/`extract` and as
    /// the `FOREACH` body separator.
    pub colon_iteration_separator: bool,
    /// `true`/`false` parse to plain boolean literals; when false they lower
    /// to `True` / `Not(True)`.
    pub boolean_literals: bool,
    /// Optional relationships mark their unbound endpoints optional.
    pub optional_propagation: bool,
    /// The head query segment must carry a `START` clause.
    pub start_required: bool,
    /// `DELETE n.prop` removes a property; when false properties are removed
    /// with `REMOVE`.
    pub delete_property: bool,
    /// The `REMOVE` clause.
    pub remove_clause: bool,
}

static V1_9_FEATURES: Features = Features {
    labels: false,
    union_queries: false,
    schema_commands: false,
    index_hints: false,
    case_expressions: false,
    reduce_function: false,
    list_comprehensions: false,
    pattern_predicates: false,
    nullable_properties: true,
    colon_type_separator: false,
    colon_iteration_separator: true,
    boolean_literals: true,
    optional_propagation: false,
    start_required: true,
    delete_property: true,
    remove_clause: false,
};

static V2_0_FEATURES: Features = Features {
    labels: true,
    union_queries: true,
    schema_commands: true,
    index_hints: true,
    case_expressions: true,
    reduce_function: true,
    list_comprehensions: true,
    pattern_predicates: true,
    nullable_properties: false,
    colon_type_separator: true,
    colon_iteration_separator: false,
    boolean_literals: false,
    optional_propagation: true,
    start_required: false,
    delete_property: false,
    remove_clause: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_tokens() {
        assert_eq!(
            CypherVersion::from_directive("1.9"),
            Some(CypherVersion::V1_9)
        );
        assert_eq!(
            CypherVersion::from_directive("V1_9"),
            Some(CypherVersion::V1_9)
        );
        assert_eq!(
            CypherVersion::from_directive("2.0"),
            Some(CypherVersion::V2_0)
        );
        assert_eq!(
            CypherVersion::from_directive("default"),
            Some(CypherVersion::V2_0)
        );
        assert_eq!(CypherVersion::from_directive("3.5"), None);
    }

    #[test]
    fn test_feature_table_switches() {
        assert!(!CypherVersion::V1_9.features().labels);
        assert!(CypherVersion::V2_0.features().labels);
        assert!(CypherVersion::V1_9.features().nullable_properties);
        assert!(!CypherVersion::V2_0.features().nullable_properties);
    }

    #[test]
    fn test_display() {
        assert_eq!(CypherVersion::V1_9.to_string(), "1.9");
        assert_eq!(CypherVersion::V2_0.to_string(), "2.0");
    }
}

//! Expression tree
//!
//! The closed set of expression variants handed to the planner. Several
//! surface forms never appear here because the parser lowers them at
//! construction time: `<>` becomes `Not(Eq(..))`, `x IN coll` becomes an
//! `Any` quantification over the reserved iterator name, and from 2.0 the
//! boolean literals become `True` / `Not(True)`.

use crate::ast::pattern::Pattern;
use serde::{Deserialize, Serialize};

/// Iterator name reserved by the `IN <collection>` desugaring. Observable
/// in the produced tree; downstream stages rely on the exact spelling.
pub const INNER_VARIABLE: &str = "-_-INNER-_-";

/// Literal values as written in the query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Neg,
}

/// Collection predicate kind: `all`/`any`/`none`/`single`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantifier {
    All,
    Any,
    None,
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    /// Canonical boolean truth from 2.0 on; `false` is `Not(True)`.
    True,
    Collection(Vec<Expression>),
    Map(Vec<(String, Expression)>),
    Identifier(String),
    Parameter(String),
    Property(Box<Expression>, String),
    /// `expr.prop?` / `expr.prop!` (pre-2.0 only). `default_true`
    /// distinguishes the two markers for predicate wrapping.
    Nullable {
        expression: Box<Expression>,
        default_true: bool,
    },
    BinaryOp(Box<Expression>, BinaryOperator, Box<Expression>),
    UnaryOp(UnaryOperator, Box<Expression>),
    IsNull(Box<Expression>),
    /// `lhs =~ rhs` with a computed right-hand side.
    Regex {
        expression: Box<Expression>,
        pattern: Box<Expression>,
    },
    /// `lhs =~ "literal"`; kept apart so the pattern can be compiled once.
    LiteralRegex {
        expression: Box<Expression>,
        pattern: String,
    },
    /// Plain function invocation, aggregates included. The name is kept as
    /// written; recognition is case-insensitive.
    Function {
        name: String,
        arguments: Vec<Expression>,
    },
    /// `count(*)`
    CountStar,
    /// `DISTINCT` applied to an aggregate's argument list.
    Distinct(Box<Expression>),
    CollectionIndex(Box<Expression>, Box<Expression>),
    /// `all|any|none|single(x IN coll WHERE pred)`, and the `IN` desugaring.
    Quantified {
        quantifier: Quantifier,
        variable: String,
        collection: Box<Expression>,
        predicate: Box<Expression>,
    },
    Filter {
        collection: Box<Expression>,
        variable: String,
        predicate: Box<Expression>,
    },
    Extract {
        collection: Box<Expression>,
        variable: String,
        expression: Box<Expression>,
    },
    Reduce {
        collection: Box<Expression>,
        variable: String,
        expression: Box<Expression>,
        accumulator: String,
        init: Box<Expression>,
    },
    /// A pattern in predicate position, 2.0 lowering.
    PatternPredicate(Vec<Pattern>),
    /// A pattern as a value: the matched paths.
    PathExpression(Vec<Pattern>),
    /// Pre-2.0 lowering of a pattern in predicate position.
    NonEmpty(Box<Expression>),
    ShortestPathExpression(Box<Pattern>),
    HasLabel(Box<Expression>, String),
    /// Pre-2.0 wrapper for comparisons over `?`/`!` properties: when any
    /// listed expression is missing, the predicate takes its default.
    NullablePredicate {
        predicate: Box<Expression>,
        defaults: Vec<(Expression, bool)>,
    },
    /// `CASE expr WHEN v THEN r .. [ELSE d] END`
    SimpleCase {
        expression: Box<Expression>,
        alternatives: Vec<(Expression, Expression)>,
        default: Option<Box<Expression>>,
    },
    /// `CASE WHEN pred THEN r .. [ELSE d] END`
    GenericCase {
        alternatives: Vec<(Expression, Expression)>,
        default: Option<Box<Expression>>,
    },
}

/// Aggregate function names, compared case-insensitively.
const AGGREGATE_NAMES: &[&str] = &[
    "count",
    "sum",
    "avg",
    "min",
    "max",
    "collect",
    "percentilecont",
    "percentiledisc",
    "stdev",
    "stdevp",
];

pub fn is_aggregate_name(name: &str) -> bool {
    AGGREGATE_NAMES
        .iter()
        .any(|candidate| name.eq_ignore_ascii_case(candidate))
}

impl Expression {
    pub fn ident(name: impl Into<String>) -> Expression {
        Expression::Identifier(name.into())
    }

    pub fn int(value: i64) -> Expression {
        Expression::Literal(Literal::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Expression {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn property(base: Expression, key: impl Into<String>) -> Expression {
        Expression::Property(Box::new(base), key.into())
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
        Expression::BinaryOp(Box::new(left), op, Box::new(right))
    }

    pub fn eq(left: Expression, right: Expression) -> Expression {
        Expression::binary(left, BinaryOperator::Eq, right)
    }

    pub fn and(left: Expression, right: Expression) -> Expression {
        Expression::binary(left, BinaryOperator::And, right)
    }

    pub fn not(inner: Expression) -> Expression {
        Expression::UnaryOp(UnaryOperator::Not, Box::new(inner))
    }

    pub fn function(name: impl Into<String>, arguments: Vec<Expression>) -> Expression {
        Expression::Function {
            name: name.into(),
            arguments,
        }
    }

    /// Whether this node itself is an aggregate invocation.
    pub fn is_aggregate(&self) -> bool {
        match self {
            Expression::CountStar => true,
            Expression::Distinct(_) => true,
            Expression::Function { name, .. } => is_aggregate_name(name),
            _ => false,
        }
    }

    /// Direct sub-expressions, in lexical order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal(_)
            | Expression::True
            | Expression::Identifier(_)
            | Expression::Parameter(_)
            | Expression::CountStar
            | Expression::PatternPredicate(_)
            | Expression::PathExpression(_)
            | Expression::ShortestPathExpression(_) => Vec::new(),
            Expression::Collection(items) => items.iter().collect(),
            Expression::Map(entries) => entries.iter().map(|(_, v)| v).collect(),
            Expression::Property(base, _) => vec![&**base],
            Expression::Nullable { expression, .. } => vec![&**expression],
            Expression::BinaryOp(left, _, right) => vec![&**left, &**right],
            Expression::UnaryOp(_, inner)
            | Expression::IsNull(inner)
            | Expression::Distinct(inner)
            | Expression::NonEmpty(inner) => vec![&**inner],
            Expression::Regex {
                expression,
                pattern,
            } => vec![&**expression, &**pattern],
            Expression::LiteralRegex { expression, .. } => vec![&**expression],
            Expression::Function { arguments, .. } => arguments.iter().collect(),
            Expression::CollectionIndex(base, index) => vec![&**base, &**index],
            Expression::Quantified {
                collection,
                predicate,
                ..
            } => vec![&**collection, &**predicate],
            Expression::Filter {
                collection,
                predicate,
                ..
            } => vec![&**collection, &**predicate],
            Expression::Extract {
                collection,
                expression,
                ..
            } => vec![&**collection, &**expression],
            Expression::Reduce {
                collection,
                expression,
                init,
                ..
            } => vec![&**collection, &**expression, &**init],
            Expression::HasLabel(base, _) => vec![&**base],
            Expression::NullablePredicate { predicate, .. } => vec![&**predicate],
            Expression::SimpleCase {
                expression,
                alternatives,
                default,
            } => {
                let mut out: Vec<&Expression> = vec![&**expression];
                for (when, then) in alternatives {
                    out.push(when);
                    out.push(then);
                }
                if let Some(d) = default {
                    out.push(&**d);
                }
                out
            }
            Expression::GenericCase {
                alternatives,
                default,
            } => {
                let mut out: Vec<&Expression> = Vec::new();
                for (when, then) in alternatives {
                    out.push(when);
                    out.push(then);
                }
                if let Some(d) = default {
                    out.push(&**d);
                }
                out
            }
        }
    }

    /// Collects every aggregate invocation in this tree, outermost first,
    /// without descending into aggregates.
    pub fn collect_aggregates(&self, out: &mut Vec<Expression>) {
        if self.is_aggregate() {
            out.push(self.clone());
            return;
        }
        for child in self.children() {
            child.collect_aggregates(out);
        }
    }

    pub fn contains_aggregate(&self) -> bool {
        if self.is_aggregate() {
            return true;
        }
        self.children().iter().any(|c| c.contains_aggregate())
    }

    /// Collects `(inner, default)` pairs for every nullable marker in this
    /// tree; used by the pre-2.0 predicate wrapping.
    pub fn collect_nullables(&self, out: &mut Vec<(Expression, bool)>) {
        if let Expression::Nullable {
            expression,
            default_true,
        } = self
        {
            out.push(((**expression).clone(), *default_true));
        }
        for child in self.children() {
            child.collect_nullables(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_names_case_insensitive() {
        assert!(is_aggregate_name("COUNT"));
        assert!(is_aggregate_name("percentileCont"));
        assert!(!is_aggregate_name("length"));
    }

    #[test]
    fn test_contains_aggregate_nested() {
        let expr = Expression::binary(
            Expression::function("count", vec![Expression::ident("a")]),
            BinaryOperator::Add,
            Expression::int(1),
        );
        assert!(expr.contains_aggregate());
        assert!(!Expression::ident("a").contains_aggregate());
    }

    #[test]
    fn test_collect_aggregates_stops_at_aggregate() {
        let inner = Expression::function("max", vec![Expression::ident("a")]);
        let expr = Expression::function("count", vec![inner]);
        let mut found = Vec::new();
        expr.collect_aggregates(&mut found);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0],
            Expression::function(
                "count",
                vec![Expression::function("max", vec![Expression::ident("a")])]
            )
        );
    }

    #[test]
    fn test_collect_nullables() {
        let nullable = Expression::Nullable {
            expression: Box::new(Expression::property(Expression::ident("a"), "p")),
            default_true: true,
        };
        let expr = Expression::eq(nullable, Expression::int(1));
        let mut found = Vec::new();
        expr.collect_nullables(&mut found);
        assert_eq!(
            found,
            vec![(Expression::property(Expression::ident("a"), "p"), true)]
        );
    }
}

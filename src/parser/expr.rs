//! Expression parsing
//!
//! Precedence-climbing over the cursor, lowest binding first:
//! `OR < XOR < AND < NOT < comparison < + - < * / % < ^ < unary minus`,
//! then property access, indexing and calls as postfix. Several surface
//! forms are lowered while the source position is still at hand: `<>`,
//! `IN`, regular expressions, boolean literals and the pre-2.0 nullable
//! property markers.

use super::pattern::{ParsedPath, PatternContext};
use super::CypherParser;
use crate::ast::{
    BinaryOperator, Expression, Literal, PropertyMap, Quantifier, UnaryOperator, INNER_VARIABLE,
};
use crate::error::{Result, SyntaxError};

impl CypherParser<'_> {
    pub(crate) fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_xor_expression()?;
        while self.try_keyword("OR") {
            let right = self.parse_xor_expression()?;
            left = Expression::binary(left, BinaryOperator::Or, right);
        }
        Ok(left)
    }

    fn parse_xor_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_and_expression()?;
        while self.try_keyword("XOR") {
            let right = self.parse_and_expression()?;
            left = Expression::binary(left, BinaryOperator::Xor, right);
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_not_expression()?;
        while self.try_keyword("AND") {
            let right = self.parse_not_expression()?;
            left = Expression::binary(left, BinaryOperator::And, right);
        }
        Ok(left)
    }

    fn parse_not_expression(&mut self) -> Result<Expression> {
        if self.try_keyword("NOT") {
            let inner = self.parse_not_expression()?;
            Ok(Expression::not(inner))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_additive()?;
        self.skip_whitespace();

        if self.try_keyword("IS") {
            let negated = self.try_keyword("NOT");
            self.expect_keyword("NULL")?;
            let mut predicate = Expression::IsNull(Box::new(left));
            if negated {
                predicate = Expression::not(predicate);
            }
            return Ok(self.wrap_nullable_predicate(predicate));
        }

        if self.try_keyword("IN") {
            let collection = self.parse_additive()?;
            let predicate = Expression::Quantified {
                quantifier: Quantifier::Any,
                variable: INNER_VARIABLE.to_string(),
                collection: Box::new(collection),
                predicate: Box::new(Expression::eq(left, Expression::ident(INNER_VARIABLE))),
            };
            return Ok(self.wrap_nullable_predicate(predicate));
        }

        if self.try_str("=~") {
            let pattern = self.parse_additive()?;
            let regex = match pattern {
                Expression::Literal(Literal::String(pattern)) => Expression::LiteralRegex {
                    expression: Box::new(left),
                    pattern,
                },
                dynamic => Expression::Regex {
                    expression: Box::new(left),
                    pattern: Box::new(dynamic),
                },
            };
            return Ok(self.wrap_nullable_predicate(regex));
        }

        enum Cmp {
            Op(BinaryOperator),
            Ne,
        }
        let op = if self.try_str("<=") {
            Some(Cmp::Op(BinaryOperator::Le))
        } else if self.try_str(">=") {
            Some(Cmp::Op(BinaryOperator::Ge))
        } else if self.try_str("<>") || self.try_str("!=") {
            Some(Cmp::Ne)
        } else if self.try_char('<') {
            Some(Cmp::Op(BinaryOperator::Lt))
        } else if self.try_char('>') {
            Some(Cmp::Op(BinaryOperator::Gt))
        } else if self.try_char('=') {
            Some(Cmp::Op(BinaryOperator::Eq))
        } else {
            None
        };
        if let Some(op) = op {
            let right = self.parse_additive()?;
            let comparison = match op {
                Cmp::Op(op) => Expression::binary(left, op, right),
                // `<>` and `!=` have no tree node of their own
                Cmp::Ne => Expression::not(Expression::eq(left, right)),
            };
            return Ok(self.wrap_nullable_predicate(comparison));
        }

        // label predicate: `n:Person`, 2.0 on; only identifiers take labels
        if self.features.labels
            && matches!(left, Expression::Identifier(_))
            && self.peek_char_is(':')
        {
            let mut predicate: Option<Expression> = None;
            while self.try_char(':') {
                let label = self.parse_identifier_name()?;
                let check = Expression::HasLabel(Box::new(left.clone()), label);
                predicate = Some(match predicate {
                    None => check,
                    Some(previous) => Expression::and(previous, check),
                });
            }
            if let Some(predicate) = predicate {
                return Ok(predicate);
            }
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            if self.try_char('+') {
                let right = self.parse_multiplicative()?;
                left = Expression::binary(left, BinaryOperator::Add, right);
            } else if self.try_char('-') {
                let right = self.parse_multiplicative()?;
                left = Expression::binary(left, BinaryOperator::Sub, right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_power()?;
        loop {
            if self.try_char('*') {
                let right = self.parse_power()?;
                left = Expression::binary(left, BinaryOperator::Mul, right);
            } else if self.try_char('/') {
                let right = self.parse_power()?;
                left = Expression::binary(left, BinaryOperator::Div, right);
            } else if self.try_char('%') {
                let right = self.parse_power()?;
                left = Expression::binary(left, BinaryOperator::Mod, right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expression> {
        let left = self.parse_unary()?;
        if self.try_char('^') {
            // right-associative
            let right = self.parse_power()?;
            Ok(Expression::binary(left, BinaryOperator::Pow, right))
        } else {
            Ok(left)
        }
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        self.skip_whitespace();
        if self.peek_char_is('-') {
            let next = self.rest()[1..].chars().next();
            if matches!(next, Some(c) if c.is_ascii_digit() || c == '.') {
                // unambiguous: the minus is part of the literal
                self.pos += 1;
                return Ok(Expression::Literal(self.parse_number_literal(true)?));
            }
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Expression::UnaryOp(UnaryOperator::Neg, Box::new(inner)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.try_char('.') {
                let property = self.parse_identifier_name()?;
                expr = Expression::Property(Box::new(expr), property);
                if self.peek_char_is('?') || (self.peek_char_is('!') && !self.rest().starts_with("!="))
                {
                    let marker_offset = self.pos;
                    let default_true = self.peek_char_is('?');
                    self.pos += 1;
                    self.require_feature(
                        self.features.nullable_properties,
                        "nullable property access",
                        marker_offset,
                    )?;
                    expr = Expression::Nullable {
                        expression: Box::new(expr),
                        default_true,
                    };
                }
            } else if self.try_char('[') {
                let index = self.parse_expression()?;
                self.expect_char(']')?;
                expr = Expression::CollectionIndex(Box::new(expr), Box::new(index));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        self.skip_whitespace();
        if let Some(pattern) = self.try_parse_pattern_expression()? {
            return Ok(pattern);
        }
        match self.peek_char() {
            None => Err(self.unexpected(&["expression"])),
            Some('(') => {
                self.pos += 1;
                let expr = self.parse_expression()?;
                self.expect_char(')')?;
                Ok(expr)
            }
            Some('[') => self.parse_collection_or_comprehension(),
            Some('{') => self.parse_map_or_parameter(),
            Some('"') | Some('\'') => Ok(Expression::Literal(Literal::String(
                self.parse_string_literal()?,
            ))),
            Some(c) if c.is_ascii_digit() => {
                Ok(Expression::Literal(self.parse_number_literal(false)?))
            }
            Some('.')
                if matches!(self.rest()[1..].chars().next(), Some(d) if d.is_ascii_digit()) =>
            {
                Ok(Expression::Literal(self.parse_number_literal(false)?))
            }
            Some(c) if c.is_alphabetic() || c == '_' || c == '`' => {
                self.parse_identifier_expression()
            }
            _ => Err(self.unexpected(&["expression"])),
        }
    }

    fn parse_identifier_expression(&mut self) -> Result<Expression> {
        self.skip_whitespace();
        let offset = self.pos;
        if self.try_keyword("TRUE") {
            return Ok(self.boolean_literal(true));
        }
        if self.try_keyword("FALSE") {
            return Ok(self.boolean_literal(false));
        }
        if self.try_keyword("NULL") {
            return Ok(Expression::Literal(Literal::Null));
        }
        if self.peek_keyword_is("CASE") {
            self.require_feature(self.features.case_expressions, "CASE expressions", offset)?;
            self.try_keyword("CASE");
            return self.parse_case_expression();
        }
        let name = self.parse_identifier_name()?;
        self.skip_whitespace();
        if self.peek_char_is('(') {
            self.parse_function_call(name, offset)
        } else {
            Ok(Expression::Identifier(name))
        }
    }

    fn boolean_literal(&self, value: bool) -> Expression {
        if self.features.boolean_literals {
            Expression::Literal(Literal::Boolean(value))
        } else if value {
            Expression::True
        } else {
            Expression::not(Expression::True)
        }
    }

    fn parse_function_call(&mut self, name: String, name_offset: usize) -> Result<Expression> {
        self.expect_char('(')?;
        if name.eq_ignore_ascii_case("filter") {
            return self.parse_filter_body();
        }
        if name.eq_ignore_ascii_case("extract") {
            return self.parse_extract_body();
        }
        if name.eq_ignore_ascii_case("reduce") {
            self.require_feature(self.features.reduce_function, "reduce(..)", name_offset)?;
            return self.parse_reduce_body();
        }
        let quantifier = if name.eq_ignore_ascii_case("all") {
            Some(Quantifier::All)
        } else if name.eq_ignore_ascii_case("any") {
            Some(Quantifier::Any)
        } else if name.eq_ignore_ascii_case("none") {
            Some(Quantifier::None)
        } else if name.eq_ignore_ascii_case("single") {
            Some(Quantifier::Single)
        } else {
            None
        };
        if let Some(quantifier) = quantifier {
            return self.parse_quantified_body(quantifier);
        }
        if name.eq_ignore_ascii_case("count") {
            self.skip_whitespace();
            if self.try_char('*') {
                self.expect_char(')')?;
                return Ok(Expression::CountStar);
            }
        }
        let distinct = self.try_keyword("DISTINCT");
        let mut arguments = Vec::new();
        self.skip_whitespace();
        if !self.peek_char_is(')') {
            loop {
                arguments.push(self.parse_expression()?);
                if !self.try_char(',') {
                    break;
                }
            }
        }
        self.expect_char(')')?;
        let call = Expression::Function { name, arguments };
        Ok(if distinct {
            Expression::Distinct(Box::new(call))
        } else {
            call
        })
    }

    /// `x IN coll WHERE pred` (also `x IN coll : pred` pre-2.0), closing
    /// paren included.
    fn parse_quantified_body(&mut self, quantifier: Quantifier) -> Result<Expression> {
        let variable = self.parse_identifier_name()?;
        self.expect_keyword("IN")?;
        let collection = self.parse_expression()?;
        let predicate = self.parse_iteration_predicate()?;
        self.expect_char(')')?;
        Ok(Expression::Quantified {
            quantifier,
            variable,
            collection: Box::new(collection),
            predicate: Box::new(predicate),
        })
    }

    fn parse_filter_body(&mut self) -> Result<Expression> {
        let variable = self.parse_identifier_name()?;
        self.expect_keyword("IN")?;
        let collection = self.parse_expression()?;
        let predicate = self.parse_iteration_predicate()?;
        self.expect_char(')')?;
        Ok(Expression::Filter {
            collection: Box::new(collection),
            variable,
            predicate: Box::new(predicate),
        })
    }

    fn parse_extract_body(&mut self) -> Result<Expression> {
        let variable = self.parse_identifier_name()?;
        self.expect_keyword("IN")?;
        let collection = self.parse_expression()?;
        self.skip_whitespace();
        let offset = self.pos;
        if !self.try_char('|') {
            if !self.peek_char_is(':') {
                return Err(self.unexpected(&["|"]));
            }
            self.require_feature(
                self.features.colon_iteration_separator,
                "the ':' iteration separator",
                offset,
            )?;
            self.pos += 1;
        }
        let expression = self.parse_expression()?;
        self.expect_char(')')?;
        Ok(Expression::Extract {
            collection: Box::new(collection),
            variable,
            expression: Box::new(expression),
        })
    }

    fn parse_reduce_body(&mut self) -> Result<Expression> {
        let accumulator = self.parse_identifier_name()?;
        self.expect_char('=')?;
        let init = self.parse_expression()?;
        self.expect_char(',')?;
        let variable = self.parse_identifier_name()?;
        self.expect_keyword("IN")?;
        let collection = self.parse_expression()?;
        self.expect_char('|')?;
        let expression = self.parse_expression()?;
        self.expect_char(')')?;
        Ok(Expression::Reduce {
            collection: Box::new(collection),
            variable,
            expression: Box::new(expression),
            accumulator,
            init: Box::new(init),
        })
    }

    fn parse_iteration_predicate(&mut self) -> Result<Expression> {
        self.skip_whitespace();
        let offset = self.pos;
        if self.try_keyword("WHERE") {
            return self.parse_expression();
        }
        if self.peek_char_is(':') {
            self.require_feature(
                self.features.colon_iteration_separator,
                "the ':' iteration separator",
                offset,
            )?;
            self.pos += 1;
            return self.parse_expression();
        }
        Err(self.unexpected(&["WHERE"]))
    }

    fn parse_case_expression(&mut self) -> Result<Expression> {
        self.skip_whitespace();
        let operand = if self.peek_keyword_is("WHEN") {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        let mut alternatives = Vec::new();
        while self.try_keyword("WHEN") {
            let when = self.parse_expression()?;
            self.expect_keyword("THEN")?;
            let then = self.parse_expression()?;
            alternatives.push((when, then));
        }
        if alternatives.is_empty() {
            return Err(self.unexpected(&["WHEN"]));
        }
        let default = if self.try_keyword("ELSE") {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect_keyword("END")?;
        Ok(match operand {
            Some(expression) => Expression::SimpleCase {
                expression,
                alternatives,
                default,
            },
            None => Expression::GenericCase {
                alternatives,
                default,
            },
        })
    }

    fn parse_collection_or_comprehension(&mut self) -> Result<Expression> {
        self.skip_whitespace();
        let offset = self.pos;
        self.pos += 1; // '['
        if let Some(comprehension) = self.try_parse_comprehension()? {
            self.require_feature(
                self.features.list_comprehensions,
                "list comprehensions",
                offset,
            )?;
            return Ok(comprehension);
        }
        let mut items = Vec::new();
        self.skip_whitespace();
        if !self.peek_char_is(']') {
            loop {
                items.push(self.parse_expression()?);
                if !self.try_char(',') {
                    break;
                }
            }
        }
        self.expect_char(']')?;
        Ok(Expression::Collection(items))
    }

    /// `x IN coll [WHERE pred] [| expr]` after the opening bracket. With
    /// neither a filter nor an extract part this is not a comprehension
    /// (`[x IN coll]` is a one-element literal containing a membership
    /// test), so the cursor is restored.
    fn try_parse_comprehension(&mut self) -> Result<Option<Expression>> {
        let snapshot = self.pos;
        self.skip_whitespace();
        if !self.peek_identifier_start() {
            return Ok(None);
        }
        let variable = match self.parse_identifier_name() {
            Ok(variable) => variable,
            Err(_) => {
                self.pos = snapshot;
                return Ok(None);
            }
        };
        if !self.try_keyword("IN") {
            self.pos = snapshot;
            return Ok(None);
        }
        let collection = self.parse_expression()?;
        let predicate = if self.try_keyword("WHERE") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let extracted = if self.try_char('|') {
            Some(self.parse_expression()?)
        } else {
            None
        };
        if predicate.is_none() && extracted.is_none() {
            self.pos = snapshot;
            return Ok(None);
        }
        self.expect_char(']')?;
        let base = match predicate {
            Some(predicate) => Expression::Filter {
                collection: Box::new(collection),
                variable: variable.clone(),
                predicate: Box::new(predicate),
            },
            None => collection,
        };
        Ok(Some(match extracted {
            Some(expression) => Expression::Extract {
                collection: Box::new(base),
                variable,
                expression: Box::new(expression),
            },
            None => base,
        }))
    }

    fn parse_map_or_parameter(&mut self) -> Result<Expression> {
        match self.parse_property_map()? {
            PropertyMap::Parameter(name) => Ok(Expression::Parameter(name)),
            PropertyMap::Map(entries) => Ok(Expression::Map(entries)),
        }
    }

    /// Pre-2.0: a predicate over `?`/`!` properties carries the default
    /// verdicts for the rows where the property is missing.
    fn wrap_nullable_predicate(&self, predicate: Expression) -> Expression {
        if !self.features.nullable_properties {
            return predicate;
        }
        let mut defaults = Vec::new();
        predicate.collect_nullables(&mut defaults);
        if defaults.is_empty() {
            predicate
        } else {
            Expression::NullablePredicate {
                predicate: Box::new(predicate),
                defaults,
            }
        }
    }

    /// A path pattern in expression position: a predicate under 2.0, a
    /// non-empty path check before that. Shortest-path calls become path
    /// values of their own. Returns `None` (cursor restored) when the
    /// input does not continue as a pattern.
    fn try_parse_pattern_expression(&mut self) -> Result<Option<Expression>> {
        self.skip_whitespace();
        if self.peek_keyword_is("SHORTESTPATH") || self.peek_keyword_is("ALLSHORTESTPATHS") {
            let offset = self.pos;
            let single = self.try_keyword("SHORTESTPATH");
            if !single {
                self.try_keyword("ALLSHORTESTPATHS");
            }
            let path =
                self.parse_shortest_path_tail(None, single, offset, PatternContext::Expression)?;
            let mut patterns = self.lower_single_path(&path)?;
            if patterns.len() != 1 {
                return Err(SyntaxError::Internal {
                    offset,
                    message: "shortest path lowered to multiple records".into(),
                });
            }
            return Ok(Some(Expression::ShortestPathExpression(Box::new(
                patterns.remove(0),
            ))));
        }
        match self.peek_char() {
            Some(c) if c == '(' || c.is_alphabetic() || c == '_' || c == '`' => {}
            _ => return Ok(None),
        }
        let snapshot = self.pos;
        match self.parse_expression_pattern_path() {
            Ok(Some(path)) => {
                let (patterns, _) =
                    self.lower_match_paths(vec![path], &std::collections::HashSet::new())?;
                Ok(Some(if self.features.pattern_predicates {
                    Expression::PatternPredicate(patterns)
                } else {
                    Expression::NonEmpty(Box::new(Expression::PathExpression(patterns)))
                }))
            }
            Ok(None) => {
                self.pos = snapshot;
                Ok(None)
            }
            // gating diagnostics keep their precision through the backtrack
            Err(err @ SyntaxError::DialectFeature { .. }) => Err(err),
            Err(_) => {
                self.pos = snapshot;
                Ok(None)
            }
        }
    }

    /// A node followed by at least one relationship; anything shorter is
    /// not a pattern in expression position.
    fn parse_expression_pattern_path(&mut self) -> Result<Option<ParsedPath>> {
        let first = self.parse_pattern_node(PatternContext::Expression)?;
        let mut nodes = vec![first];
        let mut rels = Vec::new();
        while let Some(rel) = self.parse_pattern_relationship(PatternContext::Expression)? {
            rels.push(rel);
            nodes.push(self.parse_pattern_node(PatternContext::Expression)?);
        }
        if rels.is_empty() {
            return Ok(None);
        }
        Ok(Some(ParsedPath {
            name: None,
            nodes,
            rels,
            shortest: None,
        }))
    }
}

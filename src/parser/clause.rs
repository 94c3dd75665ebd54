//! Clause parsing
//!
//! One query segment is a fixed clause order: `START`, then `MATCH`/`USING`
//! clauses, `WHERE`, update clauses, and finally `WITH` (which recurses into
//! a tail segment) or `RETURN` with its modifiers. Identifier scope is
//! threaded through the segment so pattern lowering knows which names are
//! already bound.

use super::pattern::PatternContext;
use super::CypherParser;
use crate::ast::{
    CreateIndex, CreateUniqueConstraint, DropIndex, Expression, Hint, IdReference, LabelOp,
    Literal, Query, ReturnItem, ReturnSpec, SortItem, StartItem, UpdateAction,
};
use crate::error::{Result, SyntaxError};
use log::trace;
use std::collections::HashSet;

impl CypherParser<'_> {
    /// Parses one head/tail segment. `inherited` is `None` for the head of
    /// a query and the projected name scope for a `WITH` tail.
    pub(crate) fn parse_query_part(
        &mut self,
        inherited: Option<HashSet<String>>,
    ) -> Result<Query> {
        let is_head = inherited.is_none();
        let mut scope = inherited.unwrap_or_default();
        let mut query = Query::new();
        let segment_offset = self.offset();

        if self.try_keyword("START") {
            query = self.parse_start_clause(query, &mut scope)?;
        }
        loop {
            let offset = self.offset();
            if self.try_keyword("MATCH") {
                query = self.parse_match_clause(query, &mut scope)?;
            } else if self.try_keyword("USING") {
                query = self.parse_using_clause(query, offset)?;
            } else {
                break;
            }
        }
        if self.try_keyword("WHERE") {
            query = query.with_where(self.parse_expression()?);
        }
        loop {
            let offset = self.offset();
            if self.try_keyword("CREATE") {
                query = self.parse_create_clause(query, &mut scope)?;
            } else if self.try_keyword("SET") {
                let mut actions = Vec::new();
                self.parse_set_clause(&mut actions)?;
                for action in actions {
                    query = query.with_update(action);
                }
            } else if self.try_keyword("REMOVE") {
                self.require_feature(self.features.remove_clause, "the REMOVE clause", offset)?;
                let mut actions = Vec::new();
                self.parse_remove_clause(&mut actions)?;
                for action in actions {
                    query = query.with_update(action);
                }
            } else if self.try_keyword("DELETE") {
                let mut actions = Vec::new();
                self.parse_delete_clause(&mut actions)?;
                for action in actions {
                    query = query.with_update(action);
                }
            } else if self.try_keyword("FOREACH") {
                let action = self.parse_foreach()?;
                query = query.with_update(action);
            } else {
                break;
            }
        }

        if is_head
            && self.features.start_required
            && !query.matches.is_empty()
            && !query.start.iter().any(|item| item.is_reading())
        {
            return Err(SyntaxError::DialectFeature {
                offset: segment_offset,
                feature: "MATCH without START".into(),
                version: self.version,
            });
        }

        self.skip_whitespace();
        if self.try_keyword("WITH") {
            query = self.parse_with_clause(query, scope)?;
        } else if self.try_keyword("RETURN") {
            if is_head
                && self.features.start_required
                && query.start.is_empty()
                && query.matches.is_empty()
                && query.updates.is_empty()
            {
                return Err(SyntaxError::DialectFeature {
                    offset: segment_offset,
                    feature: "a query without START".into(),
                    version: self.version,
                });
            }
            query = self.parse_return_clause(query)?;
        } else {
            // terminal update query
            if !query.is_updating() {
                return Err(self.unexpected(&["RETURN", "WITH"]));
            }
            query = query.with_returns(ReturnSpec::Empty);
        }
        Ok(query)
    }

    fn parse_start_clause(
        &mut self,
        mut query: Query,
        scope: &mut HashSet<String>,
    ) -> Result<Query> {
        loop {
            self.skip_whitespace();
            let name = self.parse_identifier_name()?;
            self.expect_char('=')?;
            self.skip_whitespace();
            let is_node = if self.try_keyword("NODE") {
                true
            } else if self.try_keyword("RELATIONSHIP") || self.try_keyword("REL") {
                false
            } else {
                return Err(self.unexpected(&["NODE", "RELATIONSHIP"]));
            };
            let item = if self.try_char('(') {
                self.skip_whitespace();
                if self.try_char('*') {
                    self.expect_char(')')?;
                    if is_node {
                        StartItem::AllNodes { name: name.clone() }
                    } else {
                        StartItem::AllRelationships { name: name.clone() }
                    }
                } else if self.peek_char_is('{') {
                    let param = self.parse_parameter_name()?;
                    self.expect_char(')')?;
                    let ids = IdReference::Parameter(param);
                    if is_node {
                        StartItem::NodeById {
                            name: name.clone(),
                            ids,
                        }
                    } else {
                        StartItem::RelationshipById {
                            name: name.clone(),
                            ids,
                        }
                    }
                } else {
                    let mut ids = vec![self.parse_signed_integer()?];
                    while self.try_char(',') {
                        ids.push(self.parse_signed_integer()?);
                    }
                    self.expect_char(')')?;
                    let ids = IdReference::Literal(ids);
                    if is_node {
                        StartItem::NodeById {
                            name: name.clone(),
                            ids,
                        }
                    } else {
                        StartItem::RelationshipById {
                            name: name.clone(),
                            ids,
                        }
                    }
                }
            } else if self.try_char(':') {
                let index = self.parse_identifier_name()?;
                self.parse_index_lookup(name.clone(), index, is_node)?
            } else {
                return Err(self.unexpected(&["(", ":"]));
            };
            scope.insert(name);
            query = query.with_start(item);
            if !self.try_char(',') {
                break;
            }
        }
        Ok(query)
    }

    /// `:index(key = value)` and `:index("query")` lookups.
    fn parse_index_lookup(
        &mut self,
        name: String,
        index: String,
        is_node: bool,
    ) -> Result<StartItem> {
        self.expect_char('(')?;
        self.skip_whitespace();
        let snapshot = self.pos;
        if self.peek_identifier_start() || self.peek_char_is('"') || self.peek_char_is('\'') {
            let key = if self.peek_identifier_start() {
                self.parse_identifier_name()
            } else {
                self.parse_string_literal()
            };
            if let Ok(key) = key {
                self.skip_whitespace();
                if self.peek_char_is('=') && !self.rest().starts_with("=~") {
                    self.pos += 1;
                    let value = self.parse_expression()?;
                    self.expect_char(')')?;
                    let key = Expression::string(key);
                    return Ok(if is_node {
                        StartItem::NodeByIndex {
                            name,
                            index,
                            key,
                            value,
                        }
                    } else {
                        StartItem::RelationshipByIndex {
                            name,
                            index,
                            key,
                            value,
                        }
                    });
                }
            }
            self.pos = snapshot;
        }
        let query_expr = if self.peek_char_is('{') {
            Expression::Parameter(self.parse_parameter_name()?)
        } else {
            Expression::Literal(Literal::String(self.parse_string_literal()?))
        };
        self.expect_char(')')?;
        Ok(if is_node {
            StartItem::NodeByIndexQuery {
                name,
                index,
                query: query_expr,
            }
        } else {
            StartItem::RelationshipByIndexQuery {
                name,
                index,
                query: query_expr,
            }
        })
    }

    fn parse_match_clause(
        &mut self,
        mut query: Query,
        scope: &mut HashSet<String>,
    ) -> Result<Query> {
        let bound = scope.clone();
        let paths = self.parse_pattern_paths(PatternContext::Match)?;
        let (patterns, named) = self.lower_match_paths(paths, &bound)?;
        for pattern in &patterns {
            for identifier in pattern.identifiers() {
                scope.insert(identifier.to_string());
            }
        }
        for path in &named {
            scope.insert(path.name.clone());
        }
        for pattern in patterns {
            query = query.with_match(pattern);
        }
        for path in named {
            query = query.with_named_path(path);
        }
        Ok(query)
    }

    fn parse_using_clause(&mut self, query: Query, offset: usize) -> Result<Query> {
        self.require_feature(self.features.index_hints, "planner hints", offset)?;
        let hint = if self.try_keyword("INDEX") {
            let identifier = self.parse_identifier_name()?;
            self.expect_char(':')?;
            let label = self.parse_identifier_name()?;
            self.expect_char('(')?;
            let property = self.parse_identifier_name()?;
            self.expect_char(')')?;
            Hint::SchemaIndex {
                identifier,
                label,
                property,
                value: None,
            }
        } else if self.try_keyword("SCAN") {
            let identifier = self.parse_identifier_name()?;
            self.expect_char(':')?;
            let label = self.parse_identifier_name()?;
            Hint::NodeByLabel { identifier, label }
        } else {
            return Err(self.unexpected(&["INDEX", "SCAN"]));
        };
        Ok(query.with_hint(hint))
    }

    /// A `CREATE [UNIQUE]` clause; the created elements are hoisted into
    /// the segment's start items.
    fn parse_create_clause(
        &mut self,
        mut query: Query,
        scope: &mut HashSet<String>,
    ) -> Result<Query> {
        if self.try_keyword("UNIQUE") {
            let paths = self.parse_pattern_paths(PatternContext::CreateUnique)?;
            let links = self.lower_unique_paths(paths)?;
            for link in &links {
                scope.insert(link.left.name.clone());
                scope.insert(link.right.name.clone());
                scope.insert(link.relationship.name.clone());
            }
            return Ok(query.with_start(StartItem::CreateUnique(links)));
        }
        let paths = self.parse_pattern_paths(PatternContext::Create)?;
        let (actions, named) = self.lower_create_paths(paths)?;
        for action in actions {
            match action {
                UpdateAction::CreateNode(node) => {
                    scope.insert(node.name.clone());
                    query = query.with_start(StartItem::CreateNode(node));
                }
                UpdateAction::CreateRelationship(rel) => {
                    scope.insert(rel.name.clone());
                    scope.insert(rel.from.name.clone());
                    scope.insert(rel.to.name.clone());
                    query = query.with_start(StartItem::CreateRelationship(rel));
                }
                other => {
                    return Err(SyntaxError::Internal {
                        offset: self.pos,
                        message: format!("CREATE lowering produced {other:?}"),
                    });
                }
            }
        }
        for path in named {
            scope.insert(path.name.clone());
            query = query.with_named_path(path);
        }
        Ok(query)
    }

    fn parse_set_clause(&mut self, actions: &mut Vec<UpdateAction>) -> Result<()> {
        loop {
            self.skip_whitespace();
            let entity = Expression::Identifier(self.parse_identifier_name()?);
            self.skip_whitespace();
            if self.peek_char_is(':') {
                let offset = self.pos;
                self.require_feature(self.features.labels, "label modification", offset)?;
                let mut labels = Vec::new();
                while self.try_char(':') {
                    labels.push(self.parse_identifier_name()?);
                }
                actions.push(UpdateAction::Labels {
                    entity,
                    op: LabelOp::Set,
                    labels,
                });
            } else if self.try_char('.') {
                let property = self.parse_identifier_name()?;
                self.expect_char('=')?;
                let value = self.parse_expression()?;
                actions.push(UpdateAction::PropertySet {
                    property: Expression::Property(Box::new(entity), property),
                    value,
                });
            } else if self.try_char('=') {
                let map = self.parse_expression()?;
                actions.push(UpdateAction::MapPropertySet { entity, map });
            } else {
                return Err(self.unexpected(&[":", ".", "="]));
            }
            if !self.try_char(',') {
                break;
            }
        }
        Ok(())
    }

    fn parse_remove_clause(&mut self, actions: &mut Vec<UpdateAction>) -> Result<()> {
        loop {
            self.skip_whitespace();
            let entity = Expression::Identifier(self.parse_identifier_name()?);
            self.skip_whitespace();
            if self.peek_char_is(':') {
                let mut labels = Vec::new();
                while self.try_char(':') {
                    labels.push(self.parse_identifier_name()?);
                }
                actions.push(UpdateAction::Labels {
                    entity,
                    op: LabelOp::Remove,
                    labels,
                });
            } else if self.try_char('.') {
                let property = self.parse_identifier_name()?;
                actions.push(UpdateAction::DeleteProperty { entity, property });
            } else {
                return Err(self.unexpected(&[":", "."]));
            }
            if !self.try_char(',') {
                break;
            }
        }
        Ok(())
    }

    fn parse_delete_clause(&mut self, actions: &mut Vec<UpdateAction>) -> Result<()> {
        loop {
            self.skip_whitespace();
            let offset = self.pos;
            let expr = self.parse_expression()?;
            match expr {
                Expression::Property(entity, property) => {
                    self.require_feature(
                        self.features.delete_property,
                        "DELETE of a property (use REMOVE)",
                        offset,
                    )?;
                    actions.push(UpdateAction::DeleteProperty {
                        entity: *entity,
                        property,
                    });
                }
                other => actions.push(UpdateAction::DeleteEntity(other)),
            }
            if !self.try_char(',') {
                break;
            }
        }
        Ok(())
    }

    fn parse_foreach(&mut self) -> Result<UpdateAction> {
        self.expect_char('(')?;
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
                "the ':' FOREACH separator",
                offset,
            )?;
            self.pos += 1;
        }
        let mut actions = Vec::new();
        loop {
            self.skip_whitespace();
            let clause_offset = self.pos;
            if self.try_keyword("CREATE") {
                if self.try_keyword("UNIQUE") {
                    return Err(self.unexpected(&["an update clause"]));
                }
                let paths = self.parse_pattern_paths(PatternContext::Create)?;
                let (create_actions, _named) = self.lower_create_paths(paths)?;
                actions.extend(create_actions);
            } else if self.try_keyword("SET") {
                self.parse_set_clause(&mut actions)?;
            } else if self.try_keyword("REMOVE") {
                self.require_feature(
                    self.features.remove_clause,
                    "the REMOVE clause",
                    clause_offset,
                )?;
                self.parse_remove_clause(&mut actions)?;
            } else if self.try_keyword("DELETE") {
                self.parse_delete_clause(&mut actions)?;
            } else if self.try_keyword("FOREACH") {
                actions.push(self.parse_foreach()?);
            } else {
                break;
            }
        }
        if actions.is_empty() {
            return Err(self.unexpected(&["an update clause"]));
        }
        self.expect_char(')')?;
        Ok(UpdateAction::Foreach {
            collection,
            variable,
            actions,
        })
    }

    fn parse_return_clause(&mut self, mut query: Query) -> Result<Query> {
        let distinct = self.try_keyword("DISTINCT");
        self.skip_whitespace();
        if self.try_char('*') {
            query = query.with_returns(ReturnSpec::All);
            if distinct {
                query = query.with_aggregation(Vec::new());
            }
        } else {
            let items = self.parse_return_items()?;
            let mut aggregates = Vec::new();
            for item in &items {
                item.expression.collect_aggregates(&mut aggregates);
            }
            if distinct || !aggregates.is_empty() {
                query = query.with_aggregation(aggregates);
            }
            query = query.with_return_items(items);
        }
        self.parse_projection_modifiers(query)
    }

    /// `WITH ..` ends this segment: the projection and its modifiers stay
    /// on the head query, everything after becomes the tail, scoped to the
    /// projected names. A `WHERE` directly after the projection belongs to
    /// the tail.
    fn parse_with_clause(&mut self, mut query: Query, scope: HashSet<String>) -> Result<Query> {
        let distinct = self.try_keyword("DISTINCT");
        self.skip_whitespace();
        let mut tail_scope: HashSet<String> = HashSet::new();
        if self.try_char('*') {
            query = query.with_returns(ReturnSpec::All);
            if distinct {
                query = query.with_aggregation(Vec::new());
            }
            tail_scope = scope;
        } else {
            let items = self.parse_return_items()?;
            let mut aggregates = Vec::new();
            for item in &items {
                item.expression.collect_aggregates(&mut aggregates);
            }
            if distinct || !aggregates.is_empty() {
                query = query.with_aggregation(aggregates);
            }
            for item in &items {
                tail_scope.insert(item.name.clone());
            }
            query = query.with_return_items(items);
        }
        query = self.parse_projection_modifiers(query)?;
        let pending_where = if self.try_keyword("WHERE") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        trace!("splitting pipeline at WITH");
        let mut tail = self.parse_query_part(Some(tail_scope))?;
        if let Some(predicate) = pending_where {
            let merged = match tail.where_clause.take() {
                None => predicate,
                Some(existing) => Expression::and(predicate, existing),
            };
            tail = tail.with_where(merged);
        }
        Ok(query.with_tail(tail))
    }

    fn parse_return_items(&mut self) -> Result<Vec<ReturnItem>> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let expression = self.parse_expression()?;
            let end = self.pos;
            let name = if self.try_keyword("AS") {
                self.parse_identifier_name()?
            } else {
                self.input[start..end].trim_end().to_string()
            };
            items.push(ReturnItem::new(expression, name));
            if !self.try_char(',') {
                break;
            }
        }
        Ok(items)
    }

    fn parse_projection_modifiers(&mut self, mut query: Query) -> Result<Query> {
        if self.try_keyword("ORDER") {
            self.expect_keyword("BY")?;
            loop {
                let expression = self.parse_expression()?;
                let ascending = if self.try_keyword("DESCENDING") || self.try_keyword("DESC") {
                    false
                } else {
                    // ASC is the default and may be spelled out
                    let _ = self.try_keyword("ASCENDING") || self.try_keyword("ASC");
                    true
                };
                query = query.with_order_by(SortItem {
                    expression,
                    ascending,
                });
                if !self.try_char(',') {
                    break;
                }
            }
        }
        if self.try_keyword("SKIP") {
            let skip = self.parse_skip_limit_value()?;
            query = query.with_skip(skip);
        }
        if self.try_keyword("LIMIT") {
            let limit = self.parse_skip_limit_value()?;
            query = query.with_limit(limit);
        }
        Ok(query)
    }

    /// A literal integer or a parameter.
    fn parse_skip_limit_value(&mut self) -> Result<Expression> {
        self.skip_whitespace();
        if self.peek_char_is('{') {
            Ok(Expression::Parameter(self.parse_parameter_name()?))
        } else {
            Ok(Expression::int(self.parse_signed_integer()?))
        }
    }

    /// `CREATE INDEX ON :Label(prop)`, after `CREATE INDEX`.
    pub(crate) fn parse_create_index(&mut self) -> Result<CreateIndex> {
        let (label, properties) = self.parse_index_signature()?;
        Ok(CreateIndex { label, properties })
    }

    /// `DROP INDEX ON :Label(prop)`, after `DROP INDEX`.
    pub(crate) fn parse_drop_index(&mut self) -> Result<DropIndex> {
        let (label, properties) = self.parse_index_signature()?;
        Ok(DropIndex { label, properties })
    }

    fn parse_index_signature(&mut self) -> Result<(String, Vec<String>)> {
        self.expect_keyword("ON")?;
        self.expect_char(':')?;
        let label = self.parse_identifier_name()?;
        self.skip_whitespace();
        let offset = self.pos;
        if !self.peek_char_is('(') {
            return Err(SyntaxError::SemanticArity {
                offset,
                message: "an index must name a property".into(),
            });
        }
        self.pos += 1;
        let mut properties = vec![self.parse_identifier_name()?];
        while self.try_char(',') {
            properties.push(self.parse_identifier_name()?);
        }
        self.expect_char(')')?;
        if properties.len() != 1 {
            return Err(SyntaxError::SemanticArity {
                offset,
                message: "composite indexes are not supported".into(),
            });
        }
        Ok((label, properties))
    }

    /// `CREATE CONSTRAINT ON (n:Label) ASSERT n.prop IS UNIQUE`, after
    /// `CREATE CONSTRAINT`.
    pub(crate) fn parse_create_constraint(&mut self) -> Result<CreateUniqueConstraint> {
        self.expect_keyword("ON")?;
        self.expect_char('(')?;
        let identifier = self.parse_identifier_name()?;
        self.expect_char(':')?;
        let label = self.parse_identifier_name()?;
        self.expect_char(')')?;
        self.expect_keyword("ASSERT")?;
        let property_identifier = self.parse_identifier_name()?;
        self.expect_char('.')?;
        let property = self.parse_identifier_name()?;
        self.expect_keyword("IS")?;
        self.expect_keyword("UNIQUE")?;
        Ok(CreateUniqueConstraint {
            identifier,
            label,
            property_identifier,
            property,
        })
    }
}

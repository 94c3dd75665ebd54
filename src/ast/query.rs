//! Query tree
//!
//! The root values handed to the planner. A [`Query`] is a linear pipeline:
//! a head of reading clauses, optional updates, a projection, and an
//! optional tail query introduced by `WITH` whose identifier scope is the
//! projection. `UNION` chains wrap the whole pipeline in a [`Union`];
//! schema commands are standalone [`Statement`] values of their own.

use crate::ast::expr::Expression;
use crate::ast::pattern::{NamedPath, Pattern};
use crate::ast::update::{CreateNodeAction, CreateRelationshipAction, UniqueLink, UpdateAction};
use serde::{Deserialize, Serialize};

/// Node or relationship ids in a `START` item: written literally or taken
/// from a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IdReference {
    Literal(Vec<i64>),
    Parameter(String),
}

/// One comma-separated item of a `START` clause, or a creation record
/// hoisted from a `CREATE` / `CREATE UNIQUE` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StartItem {
    NodeById {
        name: String,
        ids: IdReference,
    },
    RelationshipById {
        name: String,
        ids: IdReference,
    },
    NodeByIndex {
        name: String,
        index: String,
        key: Expression,
        value: Expression,
    },
    NodeByIndexQuery {
        name: String,
        index: String,
        query: Expression,
    },
    RelationshipByIndex {
        name: String,
        index: String,
        key: Expression,
        value: Expression,
    },
    RelationshipByIndexQuery {
        name: String,
        index: String,
        query: Expression,
    },
    AllNodes {
        name: String,
    },
    AllRelationships {
        name: String,
    },
    CreateNode(CreateNodeAction),
    CreateRelationship(CreateRelationshipAction),
    CreateUnique(Vec<UniqueLink>),
}

impl StartItem {
    pub fn node_by_id(name: impl Into<String>, ids: &[i64]) -> StartItem {
        StartItem::NodeById {
            name: name.into(),
            ids: IdReference::Literal(ids.to_vec()),
        }
    }

    pub fn rel_by_id(name: impl Into<String>, ids: &[i64]) -> StartItem {
        StartItem::RelationshipById {
            name: name.into(),
            ids: IdReference::Literal(ids.to_vec()),
        }
    }

    /// The identifier this item binds, if it binds one by itself.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            StartItem::NodeById { name, .. }
            | StartItem::RelationshipById { name, .. }
            | StartItem::NodeByIndex { name, .. }
            | StartItem::NodeByIndexQuery { name, .. }
            | StartItem::RelationshipByIndex { name, .. }
            | StartItem::RelationshipByIndexQuery { name, .. }
            | StartItem::AllNodes { name }
            | StartItem::AllRelationships { name } => Some(name),
            StartItem::CreateNode(action) => Some(&action.name),
            StartItem::CreateRelationship(action) => Some(&action.name),
            StartItem::CreateUnique(_) => None,
        }
    }

    /// Whether this is a reading start point rather than a hoisted create.
    pub fn is_reading(&self) -> bool {
        !matches!(
            self,
            StartItem::CreateNode(_) | StartItem::CreateRelationship(_) | StartItem::CreateUnique(_)
        )
    }
}

/// One projected column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub expression: Expression,
    /// Alias when written with `AS`, otherwise the expression's source text.
    pub name: String,
}

impl ReturnItem {
    pub fn new(expression: Expression, name: impl Into<String>) -> ReturnItem {
        ReturnItem {
            expression,
            name: name.into(),
        }
    }
}

/// The projection of a query segment. Exactly one of the three shapes:
/// explicit items, `*`, or nothing (terminal update query).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnSpec {
    Items(Vec<ReturnItem>),
    All,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortItem {
    pub expression: Expression,
    pub ascending: bool,
}

/// Planner hint attached to the nearest enclosing query segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Hint {
    /// `USING INDEX n:Label(prop)`. `value` is reserved for hosts that
    /// pre-bind the sought value; the parser always leaves it `None`.
    SchemaIndex {
        identifier: String,
        label: String,
        property: String,
        value: Option<Expression>,
    },
    /// `USING SCAN n:Label`
    NodeByLabel { identifier: String, label: String },
}

/// `CREATE INDEX ON :Label(prop)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndex {
    pub label: String,
    pub properties: Vec<String>,
}

/// `DROP INDEX ON :Label(prop)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndex {
    pub label: String,
    pub properties: Vec<String>,
}

/// `CREATE CONSTRAINT ON (n:Label) ASSERT n.prop IS UNIQUE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUniqueConstraint {
    pub identifier: String,
    pub label: String,
    pub property_identifier: String,
    pub property: String,
}

/// A parsed query segment. `tail` holds the rest of the pipeline when the
/// segment ends in `WITH`; the tail's identifier scope is this segment's
/// projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub start: Vec<StartItem>,
    pub hints: Vec<Hint>,
    pub matches: Vec<Pattern>,
    pub named_paths: Vec<NamedPath>,
    pub where_clause: Option<Expression>,
    /// `Some` when the projection aggregates (or is `DISTINCT`); holds the
    /// aggregate sub-expressions, empty for grouping-only projections.
    pub aggregation: Option<Vec<Expression>>,
    pub order_by: Vec<SortItem>,
    pub skip: Option<Expression>,
    pub limit: Option<Expression>,
    pub updates: Vec<UpdateAction>,
    pub returns: ReturnSpec,
    pub tail: Option<Box<Query>>,
}

impl Query {
    pub fn new() -> Query {
        Query {
            start: Vec::new(),
            hints: Vec::new(),
            matches: Vec::new(),
            named_paths: Vec::new(),
            where_clause: None,
            aggregation: None,
            order_by: Vec::new(),
            skip: None,
            limit: None,
            updates: Vec::new(),
            returns: ReturnSpec::Empty,
            tail: None,
        }
    }

    pub fn with_start(mut self, item: StartItem) -> Self {
        self.start.push(item);
        self
    }

    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn with_match(mut self, pattern: Pattern) -> Self {
        self.matches.push(pattern);
        self
    }

    pub fn with_named_path(mut self, path: NamedPath) -> Self {
        self.named_paths.push(path);
        self
    }

    pub fn with_where(mut self, predicate: Expression) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    pub fn with_aggregation(mut self, aggregates: Vec<Expression>) -> Self {
        self.aggregation = Some(aggregates);
        self
    }

    pub fn with_order_by(mut self, item: SortItem) -> Self {
        self.order_by.push(item);
        self
    }

    pub fn with_skip(mut self, skip: Expression) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_limit(mut self, limit: Expression) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_update(mut self, action: UpdateAction) -> Self {
        self.updates.push(action);
        self
    }

    pub fn with_returns(mut self, returns: ReturnSpec) -> Self {
        self.returns = returns;
        self
    }

    pub fn with_return_items(mut self, items: Vec<ReturnItem>) -> Self {
        self.returns = ReturnSpec::Items(items);
        self
    }

    pub fn with_tail(mut self, tail: Query) -> Self {
        self.tail = Some(Box::new(tail));
        self
    }

    /// Whether the segment performs writes (directly or via hoisted
    /// creates).
    pub fn is_updating(&self) -> bool {
        !self.updates.is_empty() || self.start.iter().any(|item| !item.is_reading())
    }
}

impl Default for Query {
    fn default() -> Self {
        Query::new()
    }
}

/// `A UNION B [UNION C ..]`. `distinct` is a property of the whole chain;
/// mixing `UNION` and `UNION ALL` in one chain is rejected at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Union {
    pub queries: Vec<Query>,
    pub distinct: bool,
}

/// Top-level parse result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Query(Query),
    Union(Union),
    CreateIndex(CreateIndex),
    DropIndex(DropIndex),
    CreateUniqueConstraint(CreateUniqueConstraint),
}

impl Statement {
    pub fn as_query(&self) -> Option<&Query> {
        match self {
            Statement::Query(query) => Some(query),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&Union> {
        match self {
            Statement::Union(union) => Some(union),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::Expression;

    #[test]
    fn test_query_builder_chain() {
        let query = Query::new()
            .with_start(StartItem::node_by_id("a", &[1]))
            .with_limit(Expression::int(10))
            .with_return_items(vec![ReturnItem::new(Expression::ident("a"), "a")]);
        assert_eq!(query.start.len(), 1);
        assert_eq!(query.limit, Some(Expression::int(10)));
        assert!(matches!(query.returns, ReturnSpec::Items(ref items) if items.len() == 1));
    }

    #[test]
    fn test_is_updating() {
        let read = Query::new().with_start(StartItem::node_by_id("a", &[1]));
        assert!(!read.is_updating());

        let write = Query::new().with_start(StartItem::CreateNode(
            crate::ast::update::CreateNodeAction {
                name: "a".into(),
                properties: crate::ast::update::PropertyMap::empty(),
                labels: Vec::new(),
                bare: false,
            },
        ));
        assert!(write.is_updating());
    }

    #[test]
    fn test_start_item_identifier() {
        assert_eq!(StartItem::node_by_id("a", &[1]).identifier(), Some("a"));
        assert_eq!(StartItem::CreateUnique(Vec::new()).identifier(), None);
    }
}

//! Query parser
//!
//! A single-pass, scannerless parser: one cursor over the input with
//! byte-offset tracking, no token stream. Keywords are matched
//! case-insensitively in the positions where they are keywords, which keeps
//! words like `where` or `on` usable as identifiers and relationship types.
//!
//! The parse is a pure function of `(text, version)`. Anonymous pattern
//! elements are named from the cursor state at the point of recognition, so
//! trees are reproducible across runs on the same input.

mod clause;
mod cursor;
mod expr;
mod lexical;
mod pattern;

use crate::ast::{Statement, Union};
use crate::dialect::{CypherVersion, Features};
use crate::error::{Result, SyntaxError};
use log::{debug, trace};

/// Parses `query` under the version named by a leading `cypher <version>`
/// directive, or the default version when there is none.
pub fn parse(query: &str) -> Result<Statement> {
    CypherParser::new(query).parse()
}

/// Parses `query` under `version`. A `cypher <version>` directive in the
/// text still takes precedence.
pub fn parse_as(query: &str, version: CypherVersion) -> Result<Statement> {
    CypherParser::with_version(query, version).parse()
}

/// Scannerless recursive-descent parser over a query string.
pub struct CypherParser<'a> {
    input: &'a str,
    pos: usize,
    version: CypherVersion,
    features: &'static Features,
    /// Anonymous-name counter, used by the 1.9 naming scheme.
    anon_counter: u32,
}

impl<'a> CypherParser<'a> {
    pub fn new(input: &'a str) -> CypherParser<'a> {
        CypherParser::with_version(input, CypherVersion::default())
    }

    pub fn with_version(input: &'a str, version: CypherVersion) -> CypherParser<'a> {
        CypherParser {
            input,
            pos: 0,
            version,
            features: version.features(),
            anon_counter: 0,
        }
    }

    /// The version this parse runs under, after directive resolution.
    pub fn version(&self) -> CypherVersion {
        self.version
    }

    /// Runs the parse to completion. Consumes the parser: one parser, one
    /// pass, one tree.
    pub fn parse(mut self) -> Result<Statement> {
        self.consume_directive()?;
        debug!(
            "parsing {} byte query as cypher {}",
            self.input.len(),
            self.version
        );
        let statement = self.parse_statement()?;
        self.skip_whitespace();
        if !self.at_end() {
            return Err(self.unexpected(&["end of query"]));
        }
        Ok(statement)
    }

    /// Consumes a leading `cypher <version>` directive if present.
    fn consume_directive(&mut self) -> Result<()> {
        if !self.try_keyword("CYPHER") {
            return Ok(());
        }
        self.skip_whitespace();
        let offset = self.pos;
        let token: String = self
            .rest()
            .chars()
            .take_while(|c| !c.is_whitespace())
            .collect();
        self.pos += token.len();
        match CypherVersion::from_directive(&token) {
            Some(version) => {
                self.version = version;
                self.features = version.features();
                Ok(())
            }
            None => Err(SyntaxError::UnexpectedToken {
                offset,
                expected: vec!["1.9".into(), "2.0".into(), "default".into()],
                found: format!("'{token}'"),
            }),
        }
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let offset = self.offset();
        if self.try_keyword("CREATE") {
            if self.peek_keyword_is("INDEX") {
                self.require_feature(self.features.schema_commands, "schema commands", offset)?;
                self.try_keyword("INDEX");
                return Ok(Statement::CreateIndex(self.parse_create_index()?));
            }
            if self.peek_keyword_is("CONSTRAINT") {
                self.require_feature(self.features.schema_commands, "schema commands", offset)?;
                self.try_keyword("CONSTRAINT");
                return Ok(Statement::CreateUniqueConstraint(
                    self.parse_create_constraint()?,
                ));
            }
            // a plain CREATE clause; hand the whole thing to the query parser
            self.pos = offset;
        } else if self.try_keyword("DROP") {
            self.require_feature(self.features.schema_commands, "schema commands", offset)?;
            self.expect_keyword("INDEX")?;
            return Ok(Statement::DropIndex(self.parse_drop_index()?));
        }
        self.parse_union_query()
    }

    fn parse_union_query(&mut self) -> Result<Statement> {
        let first = self.parse_query_part(None)?;
        let mut queries = vec![first];
        let mut distinct: Option<bool> = None;
        loop {
            let offset = self.offset();
            if !self.try_keyword("UNION") {
                break;
            }
            self.require_feature(self.features.union_queries, "UNION", offset)?;
            let all = self.try_keyword("ALL");
            match distinct {
                None => distinct = Some(!all),
                Some(existing) if existing == !all => {}
                Some(_) => {
                    return Err(SyntaxError::DialectFeature {
                        offset,
                        feature: "mixing UNION and UNION ALL".into(),
                        version: self.version,
                    });
                }
            }
            trace!("parsing UNION branch {}", queries.len() + 1);
            queries.push(self.parse_query_part(None)?);
        }
        if queries.len() == 1 {
            Ok(Statement::Query(queries.remove(0)))
        } else {
            Ok(Statement::Union(Union {
                queries,
                distinct: distinct.unwrap_or(true),
            }))
        }
    }

    pub(crate) fn require_feature(
        &self,
        enabled: bool,
        feature: &str,
        offset: usize,
    ) -> Result<()> {
        if enabled {
            Ok(())
        } else {
            Err(SyntaxError::DialectFeature {
                offset,
                feature: feature.into(),
                version: self.version,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        BinaryOperator, CreateNodeAction, Direction, Expression, Hint, IdReference, LabelOp,
        Literal, Pattern, PatternNode, PropertyMap, Query, ReturnItem, ReturnSpec, SortItem,
        StartItem, UpdateAction,
    };
    use indoc::indoc;

    fn parse_query(input: &str, version: CypherVersion) -> Query {
        match parse_as(input, version) {
            Ok(Statement::Query(query)) => query,
            other => panic!("expected a query for {input:?}, got {other:?}"),
        }
    }

    fn parse_err(input: &str, version: CypherVersion) -> SyntaxError {
        match parse_as(input, version) {
            Err(err) => err,
            Ok(statement) => panic!("expected an error for {input:?}, got {statement:?}"),
        }
    }

    #[test]
    fn test_start_node_by_id_and_return() {
        let expected = Query::new()
            .with_start(StartItem::node_by_id("s", &[1]))
            .with_return_items(vec![ReturnItem::new(Expression::ident("s"), "s")]);
        for version in [CypherVersion::V1_9, CypherVersion::V2_0] {
            assert_eq!(
                parse_query("start s = NODE(1) return s", version),
                expected,
                "version {version}"
            );
        }
    }

    #[test]
    fn test_anonymous_relationship_name_is_offset_based_in_2_0() {
        let query = parse_query(
            "start a = NODE(1) match a -[:KNOWS]-> (b) return a, b",
            CypherVersion::V2_0,
        );
        // the relationship pattern starts at byte 26
        assert_eq!(
            query.matches,
            vec![Pattern::RelatedTo {
                left: PatternNode::single("a"),
                right: PatternNode::single("b"),
                relationship: "  UNNAMED26".into(),
                types: vec!["KNOWS".into()],
                direction: Direction::Outgoing,
                optional: false,
            }]
        );
    }

    #[test]
    fn test_anonymous_relationship_name_is_counter_based_in_1_9() {
        let query = parse_query(
            "start a = NODE(1) match a -[:KNOWS]-> (b) return a, b",
            CypherVersion::V1_9,
        );
        match &query.matches[0] {
            Pattern::RelatedTo { relationship, .. } => assert_eq!(relationship, "  UNNAMED3"),
            other => panic!("expected RelatedTo, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_var_length_propagates_to_unbound_endpoint_in_2_0() {
        let query = parse_query(
            "start a=node(0) match a -[r?*1..3]-> x return x",
            CypherVersion::V2_0,
        );
        assert_eq!(
            query.matches,
            vec![Pattern::VarLengthRelatedTo {
                path: "  UNNAMED24".into(),
                left: PatternNode::single("a"),
                right: PatternNode::single_optional("x"),
                min_hops: Some(1),
                max_hops: Some(3),
                types: vec![],
                direction: Direction::Outgoing,
                iterator: Some("r".into()),
                optional: true,
            }]
        );
    }

    #[test]
    fn test_optional_var_length_keeps_plain_nodes_in_1_9() {
        let query = parse_query(
            "start a=node(0) match a -[r?*1..3]-> x return x",
            CypherVersion::V1_9,
        );
        match &query.matches[0] {
            Pattern::VarLengthRelatedTo {
                left,
                right,
                optional,
                ..
            } => {
                assert_eq!(left, &PatternNode::single("a"));
                assert_eq!(right, &PatternNode::single("x"));
                assert!(*optional);
            }
            other => panic!("expected VarLengthRelatedTo, got {other:?}"),
        }
    }

    #[test]
    fn test_with_splits_pipeline_and_keeps_modifiers_on_the_head() {
        let query = parse_query(
            "start n=node(0,1,2) with n order by ID(n) desc limit 2 where ID(n) = 1 return n",
            CypherVersion::V2_0,
        );
        let id_of_n = Expression::function("ID", vec![Expression::ident("n")]);
        assert_eq!(query.start, vec![StartItem::node_by_id("n", &[0, 1, 2])]);
        assert_eq!(
            query.returns,
            ReturnSpec::Items(vec![ReturnItem::new(Expression::ident("n"), "n")])
        );
        assert_eq!(
            query.order_by,
            vec![SortItem {
                expression: id_of_n.clone(),
                ascending: false,
            }]
        );
        assert_eq!(query.limit, Some(Expression::int(2)));
        let tail = query.tail.expect("tail query");
        assert_eq!(
            tail.where_clause,
            Some(Expression::eq(id_of_n, Expression::int(1)))
        );
        assert_eq!(
            tail.returns,
            ReturnSpec::Items(vec![ReturnItem::new(Expression::ident("n"), "n")])
        );
        assert!(tail.tail.is_none());
    }

    #[test]
    fn test_boolean_literal_lowering_per_version() {
        let query = parse_query(
            "start a = NODE(1) return true = false",
            CypherVersion::V2_0,
        );
        assert_eq!(
            query.returns,
            ReturnSpec::Items(vec![ReturnItem::new(
                Expression::eq(Expression::True, Expression::not(Expression::True)),
                "true = false",
            )])
        );
        let query = parse_query(
            "start a = NODE(1) return true = false",
            CypherVersion::V1_9,
        );
        assert_eq!(
            query.returns,
            ReturnSpec::Items(vec![ReturnItem::new(
                Expression::eq(
                    Expression::Literal(Literal::Boolean(true)),
                    Expression::Literal(Literal::Boolean(false)),
                ),
                "true = false",
            )])
        );
    }

    #[test]
    fn test_union_all_vs_union() {
        let statement =
            parse_as(
                "start s=NODE(1) return s UNION all start t=NODE(1) return t",
                CypherVersion::V2_0,
            )
            .unwrap();
        let union = statement.as_union().expect("union");
        assert_eq!(union.queries.len(), 2);
        assert!(!union.distinct);

        let statement = parse_as(
            "start s=NODE(1) return s UNION start t=NODE(1) return t",
            CypherVersion::V2_0,
        )
        .unwrap();
        assert!(statement.as_union().expect("union").distinct);
    }

    #[test]
    fn test_union_chain_is_flat_and_mixing_is_rejected() {
        let statement = parse_as(
            "start a=node(1) return a union start b=node(1) return b union start c=node(1) return c",
            CypherVersion::V2_0,
        )
        .unwrap();
        let union = statement.as_union().expect("union");
        assert_eq!(union.queries.len(), 3);
        assert!(union.distinct);

        let err = parse_err(
            "start a=node(1) return a union start b=node(1) return b union all start c=node(1) return c",
            CypherVersion::V2_0,
        );
        assert!(matches!(err, SyntaxError::DialectFeature { .. }));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = "start a=node(1) match p = a -[r?:X*..2]-> (b), (c) where a.age > 30 return a, count(*) order by a.age skip 1 limit {l}";
        let first = parse_as(input, CypherVersion::V2_0).unwrap();
        let second = parse_as(input, CypherVersion::V2_0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dialect_gating_matrix() {
        let cases: &[(&str, CypherVersion, CypherVersion)] = &[
            // (query, accepted version, rejected version)
            (
                "start a=node(1) match (a:Person)-->(b) return b",
                CypherVersion::V2_0,
                CypherVersion::V1_9,
            ),
            (
                "start s=node(1) return s union start t=node(1) return t",
                CypherVersion::V2_0,
                CypherVersion::V1_9,
            ),
            (
                "create index on :Person(name)",
                CypherVersion::V2_0,
                CypherVersion::V1_9,
            ),
            (
                "start n=node(1) match n-->(m) using scan n:Person return n",
                CypherVersion::V2_0,
                CypherVersion::V1_9,
            ),
            (
                "start a=node(1) set a:Person return a",
                CypherVersion::V2_0,
                CypherVersion::V1_9,
            ),
            (
                "start a=node(1) remove a.name",
                CypherVersion::V2_0,
                CypherVersion::V1_9,
            ),
            (
                "start a=node(1) delete a.name",
                CypherVersion::V1_9,
                CypherVersion::V2_0,
            ),
            ("match a return a", CypherVersion::V2_0, CypherVersion::V1_9),
            ("return 1", CypherVersion::V2_0, CypherVersion::V1_9),
            (
                "start a=node(1) foreach(x in [1] : set a.p = x)",
                CypherVersion::V1_9,
                CypherVersion::V2_0,
            ),
            (
                "start a=node(1) where a.p? = 1 return a",
                CypherVersion::V1_9,
                CypherVersion::V2_0,
            ),
        ];
        for (input, accepted, rejected) in cases {
            parse_as(input, *accepted)
                .unwrap_or_else(|err| panic!("{input:?} should parse under {accepted}: {err}"));
            let err = parse_err(input, *rejected);
            assert!(
                matches!(err, SyntaxError::DialectFeature { .. }),
                "{input:?} under {rejected} should be a dialect error, got {err:?}"
            );
        }
    }

    #[test]
    fn test_start_item_forms() {
        let query = parse_query(
            "start a=node(*), b=node({ids}), r=rel(0,1), c=node:people(name = 'A'), d=node:people('name:A') return a",
            CypherVersion::V2_0,
        );
        assert_eq!(query.start.len(), 5);
        assert_eq!(query.start[0], StartItem::AllNodes { name: "a".into() });
        assert_eq!(
            query.start[1],
            StartItem::NodeById {
                name: "b".into(),
                ids: IdReference::Parameter("ids".into()),
            }
        );
        assert_eq!(query.start[2], StartItem::rel_by_id("r", &[0, 1]));
        assert_eq!(
            query.start[3],
            StartItem::NodeByIndex {
                name: "c".into(),
                index: "people".into(),
                key: Expression::string("name"),
                value: Expression::string("A"),
            }
        );
        assert_eq!(
            query.start[4],
            StartItem::NodeByIndexQuery {
                name: "d".into(),
                index: "people".into(),
                query: Expression::string("name:A"),
            }
        );
    }

    #[test]
    fn test_create_node_bare_flag() {
        let query = parse_query("create (a)", CypherVersion::V2_0);
        assert_eq!(
            query.start,
            vec![StartItem::CreateNode(CreateNodeAction {
                name: "a".into(),
                properties: PropertyMap::empty(),
                labels: vec![],
                bare: false,
            })]
        );
        assert_eq!(query.returns, ReturnSpec::Empty);

        let query = parse_query("create a", CypherVersion::V1_9);
        match &query.start[0] {
            StartItem::CreateNode(node) => assert!(node.bare),
            other => panic!("expected CreateNode, got {other:?}"),
        }
    }

    #[test]
    fn test_create_relationship_with_labels_and_properties() {
        let query = parse_query(
            "create (a:Person {name: 'A'})-[r:KNOWS]->(b)",
            CypherVersion::V2_0,
        );
        match &query.start[0] {
            StartItem::CreateRelationship(rel) => {
                assert_eq!(rel.name, "r");
                assert_eq!(rel.rel_type, "KNOWS");
                assert_eq!(rel.from.name, "a");
                assert_eq!(rel.from.labels, vec!["Person".to_string()]);
                assert_eq!(
                    rel.from.properties,
                    PropertyMap::Map(vec![("name".into(), Expression::string("A"))])
                );
                assert_eq!(rel.to.name, "b");
            }
            other => panic!("expected CreateRelationship, got {other:?}"),
        }
        let err = parse_err("create (a:Person)", CypherVersion::V1_9);
        assert!(matches!(err, SyntaxError::DialectFeature { .. }));
    }

    #[test]
    fn test_create_unique_anonymous_offsets_differ_by_version() {
        let input = "start a = node(1) create unique a-[:X]->(b {name: {param}}) return b";
        let query = parse_query(input, CypherVersion::V2_0);
        match &query.start[1] {
            StartItem::CreateUnique(links) => {
                // the relationship pattern starts at byte 33
                assert_eq!(links[0].relationship.name, "  UNNAMED33");
                assert_eq!(links[0].rel_type, "X");
                assert_eq!(
                    links[0].right.properties,
                    PropertyMap::Map(vec![(
                        "name".into(),
                        Expression::Parameter("param".into())
                    )])
                );
            }
            other => panic!("expected CreateUnique, got {other:?}"),
        }
        let query = parse_query(input, CypherVersion::V1_9);
        match &query.start[1] {
            StartItem::CreateUnique(links) => {
                assert_eq!(links[0].relationship.name, "  UNNAMED3");
            }
            other => panic!("expected CreateUnique, got {other:?}"),
        }
    }

    #[test]
    fn test_incoming_relationship_is_normalized_to_outgoing() {
        let query = parse_query(
            "start a=node(1) match b<-[r:T]-a return b",
            CypherVersion::V2_0,
        );
        assert_eq!(
            query.matches,
            vec![Pattern::RelatedTo {
                left: PatternNode::single("a"),
                right: PatternNode::single("b"),
                relationship: "r".into(),
                types: vec!["T".into()],
                direction: Direction::Outgoing,
                optional: false,
            }]
        );
    }

    #[test]
    fn test_named_path_is_recorded_and_flattened() {
        let query = parse_query(
            "start a=node(1) match p = a-->(b) return p",
            CypherVersion::V2_0,
        );
        assert_eq!(query.named_paths.len(), 1);
        assert_eq!(query.named_paths[0].name, "p");
        assert_eq!(query.named_paths[0].segments, query.matches);
    }

    #[test]
    fn test_set_clause_forms() {
        let query = parse_query(
            "start a=node(1) set a.name = 'A', a = {props}, a:Admin return a",
            CypherVersion::V2_0,
        );
        assert_eq!(
            query.updates,
            vec![
                UpdateAction::PropertySet {
                    property: Expression::property(Expression::ident("a"), "name"),
                    value: Expression::string("A"),
                },
                UpdateAction::MapPropertySet {
                    entity: Expression::ident("a"),
                    map: Expression::Parameter("props".into()),
                },
                UpdateAction::Labels {
                    entity: Expression::ident("a"),
                    op: LabelOp::Set,
                    labels: vec!["Admin".into()],
                },
            ]
        );
    }

    #[test]
    fn test_remove_and_delete_lowering() {
        let query = parse_query(
            "start a=node(1) remove a.name, a:Person delete a",
            CypherVersion::V2_0,
        );
        assert_eq!(
            query.updates,
            vec![
                UpdateAction::DeleteProperty {
                    entity: Expression::ident("a"),
                    property: "name".into(),
                },
                UpdateAction::Labels {
                    entity: Expression::ident("a"),
                    op: LabelOp::Remove,
                    labels: vec!["Person".into()],
                },
                UpdateAction::DeleteEntity(Expression::ident("a")),
            ]
        );

        let query = parse_query("start a=node(1) delete a.name", CypherVersion::V1_9);
        assert_eq!(
            query.updates,
            vec![UpdateAction::DeleteProperty {
                entity: Expression::ident("a"),
                property: "name".into(),
            }]
        );
    }

    #[test]
    fn test_foreach_body_actions() {
        let query = parse_query(
            "start a=node(1) foreach(x IN [1, 2] | set a.cnt = x)",
            CypherVersion::V2_0,
        );
        match &query.updates[0] {
            UpdateAction::Foreach {
                variable, actions, ..
            } => {
                assert_eq!(variable, "x");
                assert_eq!(actions.len(), 1);
                assert!(matches!(actions[0], UpdateAction::PropertySet { .. }));
            }
            other => panic!("expected Foreach, got {other:?}"),
        }
    }

    #[test]
    fn test_using_hints_attach_to_segment() {
        let query = parse_query(
            "match (n)-->(m) using index n:Person(name) using scan m:Company where n.name = 'x' return n",
            CypherVersion::V2_0,
        );
        assert_eq!(
            query.hints,
            vec![
                Hint::SchemaIndex {
                    identifier: "n".into(),
                    label: "Person".into(),
                    property: "name".into(),
                    value: None,
                },
                Hint::NodeByLabel {
                    identifier: "m".into(),
                    label: "Company".into(),
                },
            ]
        );
    }

    #[test]
    fn test_schema_statements() {
        match parse_as("create index on :Person(name)", CypherVersion::V2_0).unwrap() {
            Statement::CreateIndex(index) => {
                assert_eq!(index.label, "Person");
                assert_eq!(index.properties, vec!["name".to_string()]);
            }
            other => panic!("expected CreateIndex, got {other:?}"),
        }
        match parse_as("drop index on :Person(name)", CypherVersion::V2_0).unwrap() {
            Statement::DropIndex(index) => assert_eq!(index.label, "Person"),
            other => panic!("expected DropIndex, got {other:?}"),
        }
        match parse_as(
            "create constraint on (n:Person) assert n.name is unique",
            CypherVersion::V2_0,
        )
        .unwrap()
        {
            Statement::CreateUniqueConstraint(constraint) => {
                assert_eq!(constraint.identifier, "n");
                assert_eq!(constraint.label, "Person");
                assert_eq!(constraint.property_identifier, "n");
                assert_eq!(constraint.property, "name");
            }
            other => panic!("expected CreateUniqueConstraint, got {other:?}"),
        }
    }

    #[test]
    fn test_index_arity_errors() {
        let err = parse_err("create index on :Person(a, b)", CypherVersion::V2_0);
        assert!(matches!(err, SyntaxError::SemanticArity { .. }));
        let err = parse_err("create index on :Person", CypherVersion::V2_0);
        assert!(matches!(err, SyntaxError::SemanticArity { .. }));
    }

    #[test]
    fn test_distinct_and_aggregates_set_the_aggregation_spec() {
        let query = parse_query("start a=node(1) return distinct a", CypherVersion::V2_0);
        assert_eq!(query.aggregation, Some(vec![]));

        let query = parse_query(
            "start a=node(1) return a, count(*)",
            CypherVersion::V2_0,
        );
        assert_eq!(query.aggregation, Some(vec![Expression::CountStar]));
    }

    #[test]
    fn test_order_skip_limit_modifiers() {
        let query = parse_query(
            "start a=node(1) return a order by a.name desc, a.age skip 5 limit {l}",
            CypherVersion::V2_0,
        );
        assert_eq!(
            query.order_by,
            vec![
                SortItem {
                    expression: Expression::property(Expression::ident("a"), "name"),
                    ascending: false,
                },
                SortItem {
                    expression: Expression::property(Expression::ident("a"), "age"),
                    ascending: true,
                },
            ]
        );
        assert_eq!(query.skip, Some(Expression::int(5)));
        assert_eq!(query.limit, Some(Expression::Parameter("l".into())));
    }

    #[test]
    fn test_with_star_projects_everything() {
        let query = parse_query("start a=node(1) with * return a", CypherVersion::V2_0);
        assert_eq!(query.returns, ReturnSpec::All);
        let tail = query.tail.expect("tail");
        assert_eq!(
            tail.returns,
            ReturnSpec::Items(vec![ReturnItem::new(Expression::ident("a"), "a")])
        );
    }

    #[test]
    fn test_pipeline_with_aggregation_and_alias() {
        let query = parse_query(
            indoc! {"
                start n = node(1)
                match n -[:KNOWS]-> (friend)
                with friend, count(*) as cnt
                where cnt > 1
                return friend
            "},
            CypherVersion::V2_0,
        );
        match &query.returns {
            ReturnSpec::Items(items) => {
                assert_eq!(items[0].name, "friend");
                assert_eq!(items[1].name, "cnt");
            }
            other => panic!("expected items, got {other:?}"),
        }
        assert_eq!(query.aggregation, Some(vec![Expression::CountStar]));
        let tail = query.tail.expect("tail");
        assert_eq!(
            tail.where_clause,
            Some(Expression::binary(
                Expression::ident("cnt"),
                BinaryOperator::Gt,
                Expression::int(1)
            ))
        );
    }

    #[test]
    fn test_version_directive_overrides_default() {
        let query = "cypher 1.9 start a = node(1) return true";
        match parse(query).unwrap() {
            Statement::Query(query) => match query.returns {
                ReturnSpec::Items(items) => {
                    assert_eq!(
                        items[0].expression,
                        Expression::Literal(Literal::Boolean(true))
                    );
                }
                other => panic!("expected items, got {other:?}"),
            },
            other => panic!("expected query, got {other:?}"),
        }
        let query = "CYPHER 2.0 start a = node(1) return true";
        match parse(query).unwrap() {
            Statement::Query(query) => match query.returns {
                ReturnSpec::Items(items) => {
                    assert_eq!(items[0].expression, Expression::True);
                }
                other => panic!("expected items, got {other:?}"),
            },
            other => panic!("expected query, got {other:?}"),
        }
        let err = parse("cypher 9.9 start a = node(1) return a").unwrap_err();
        assert!(matches!(err, SyntaxError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_backtick_identifiers_survive_to_the_tree() {
        let query = parse_query(
            "start `my node` = node(1) return `my node`",
            CypherVersion::V2_0,
        );
        assert_eq!(
            query.start,
            vec![StartItem::node_by_id("my node", &[1])]
        );
        match &query.returns {
            ReturnSpec::Items(items) => {
                assert_eq!(items[0].expression, Expression::ident("my node"));
                assert_eq!(items[0].name, "`my node`");
            }
            other => panic!("expected items, got {other:?}"),
        }
    }

    #[test]
    fn test_line_comments_are_insignificant() {
        let query = parse_query(
            "start a=node(1) // the anchor\nreturn a",
            CypherVersion::V2_0,
        );
        assert_eq!(query.start.len(), 1);
    }

    #[test]
    fn test_error_offsets_and_positions() {
        let input = "start a=node(1)\nreturn @";
        let err = parse_err(input, CypherVersion::V2_0);
        assert_eq!(err.offset(), 23);
        assert_eq!(err.position(input), (2, 8));

        let err = parse_err("start a=node(1) return 'oops", CypherVersion::V2_0);
        assert!(matches!(err, SyntaxError::Lexical { .. }));

        let err = parse_err("start a=node(1 return a", CypherVersion::V2_0);
        assert!(matches!(err, SyntaxError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        let err = parse_err("start a=node(1) return a )", CypherVersion::V2_0);
        match err {
            SyntaxError::UnexpectedToken { expected, .. } => {
                assert_eq!(expected, vec!["end of query".to_string()]);
            }
            other => panic!("expected UnexpectedToken, got {other:?}"),
        }
    }

    #[test]
    fn test_query_without_projection_must_update() {
        let err = parse_err("start a=node(1)", CypherVersion::V2_0);
        assert!(matches!(err, SyntaxError::UnexpectedToken { .. }));
        // updating queries may end without RETURN
        let query = parse_query("start a=node(1) delete a", CypherVersion::V2_0);
        assert_eq!(query.returns, ReturnSpec::Empty);
    }

    #[test]
    fn test_statement_serialization_round_trip() {
        let statement = parse_as(
            "start a=node(1) match p = a-[r:KNOWS*1..3]->(b) where a.age > 30 return p, count(*)",
            CypherVersion::V2_0,
        )
        .unwrap();
        let json = serde_json::to_string(&statement).unwrap();
        let back: Statement = serde_json::from_str(&json).unwrap();
        assert_eq!(statement, back);
    }
}

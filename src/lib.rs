//! aqtparse - query-language front end for a property-graph database
//!
//! Parses a Cypher-family query string into an immutable abstract query
//! tree for a downstream planner. Supports two grammar generations behind
//! one entry point:
//! - version selection per query (`cypher 1.9 ..` / `cypher 2.0 ..`)
//! - pattern desugaring into flat relation records with deterministic,
//!   offset-anchored anonymous names
//! - pipeline splitting at `WITH` into nested tail queries
//! - structured syntax errors with byte offsets
//!
//! Planning, optimization and execution live elsewhere; this crate stops at
//! the tree.

pub mod ast;
pub mod dialect;
pub mod error;
pub mod parser;

pub use ast::{
    BinaryOperator, CreateIndex, CreateNodeAction, CreateRelationshipAction,
    CreateUniqueConstraint, Direction, DropIndex, Expression, Hint, IdReference, LabelOp, Literal,
    NamedExpectation, NamedPath, Pattern, PatternNode, PropertyMap, Quantifier, Query, ReturnItem,
    ReturnSpec, SortItem, StartItem, Statement, UnaryOperator, Union, UniqueLink, UpdateAction,
    ANONYMOUS_PREFIX, INNER_VARIABLE,
};
pub use dialect::CypherVersion;
pub use error::{Result, SyntaxError};
pub use parser::{parse, parse_as, CypherParser};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Abstract query tree
//!
//! The immutable parsed representation handed off to planning. All values
//! are created during the parse, own their data, and compare structurally.

mod expr;
mod pattern;
mod query;
mod update;

pub use expr::{
    is_aggregate_name, BinaryOperator, Expression, Literal, Quantifier, UnaryOperator,
    INNER_VARIABLE,
};
pub use pattern::{Direction, NamedPath, Pattern, PatternNode, ANONYMOUS_PREFIX};
pub use query::{
    CreateIndex, CreateUniqueConstraint, DropIndex, Hint, IdReference, Query, ReturnItem,
    ReturnSpec, SortItem, StartItem, Statement, Union,
};
pub use update::{
    CreateNodeAction, CreateRelationshipAction, LabelOp, NamedExpectation, PropertyMap,
    UniqueLink, UpdateAction,
};

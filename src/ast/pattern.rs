//! Pattern records
//!
//! Textual path patterns desugar into flat, normalized relation records.
//! Records reference nodes by name string, never by back-pointer; resolving
//! names to anything denser is the planner's job. Anonymous nodes,
//! relationships and paths receive synthetic names starting with
//! [`ANONYMOUS_PREFIX`].

use serde::{Deserialize, Serialize};

/// Prefix of every auto-generated name. The two leading spaces keep the
/// name out of the space of identifiers the surface syntax can produce.
pub const ANONYMOUS_PREFIX: &str = "  UNNAMED";

/// Relationship direction as written in the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// `-[..]->`
    Outgoing,
    /// `<-[..]-`
    Incoming,
    /// `-[..]-`
    Both,
}

impl Direction {
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
            Direction::Both => Direction::Both,
        }
    }
}

/// A node endpoint of a pattern record.
///
/// `SingleOptional` is produced only under 2.0 semantics, for endpoints
/// reached through an optional relationship that are not already bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternNode {
    Single { name: String, labels: Vec<String> },
    SingleOptional { name: String, labels: Vec<String> },
}

impl PatternNode {
    pub fn single(name: impl Into<String>) -> PatternNode {
        PatternNode::Single {
            name: name.into(),
            labels: Vec::new(),
        }
    }

    pub fn single_optional(name: impl Into<String>) -> PatternNode {
        PatternNode::SingleOptional {
            name: name.into(),
            labels: Vec::new(),
        }
    }

    pub fn with_labels(self, labels: Vec<String>) -> PatternNode {
        match self {
            PatternNode::Single { name, .. } => PatternNode::Single { name, labels },
            PatternNode::SingleOptional { name, .. } => {
                PatternNode::SingleOptional { name, labels }
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PatternNode::Single { name, .. } | PatternNode::SingleOptional { name, .. } => name,
        }
    }

    pub fn labels(&self) -> &[String] {
        match self {
            PatternNode::Single { labels, .. } | PatternNode::SingleOptional { labels, .. } => {
                labels
            }
        }
    }

    /// Re-tags this endpoint as optional, keeping name and labels.
    pub fn into_optional(self) -> PatternNode {
        match self {
            PatternNode::Single { name, labels } => PatternNode::SingleOptional { name, labels },
            other => other,
        }
    }
}

/// A single desugared pattern record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// A node pattern standing alone in a path.
    SingleNode(PatternNode),
    /// A fixed-length relationship between two nodes.
    RelatedTo {
        left: PatternNode,
        right: PatternNode,
        relationship: String,
        types: Vec<String>,
        direction: Direction,
        optional: bool,
    },
    /// A variable-length relationship. The record itself is named (it spans
    /// a sub-path); the per-step relationship binding is `iterator`.
    VarLengthRelatedTo {
        path: String,
        left: PatternNode,
        right: PatternNode,
        min_hops: Option<u32>,
        max_hops: Option<u32>,
        types: Vec<String>,
        direction: Direction,
        iterator: Option<String>,
        optional: bool,
    },
    /// `shortestPath(..)` / `allShortestPaths(..)`; `single` distinguishes
    /// the two.
    ShortestPath {
        path: String,
        left: PatternNode,
        right: PatternNode,
        types: Vec<String>,
        direction: Direction,
        max_hops: Option<u32>,
        optional: bool,
        single: bool,
        iterator: Option<String>,
    },
}

impl Pattern {
    /// All identifiers this record binds: endpoint names, the relationship
    /// or path name, and the iterator binding if any.
    pub fn identifiers(&self) -> Vec<&str> {
        match self {
            Pattern::SingleNode(node) => vec![node.name()],
            Pattern::RelatedTo {
                left,
                right,
                relationship,
                ..
            } => vec![left.name(), right.name(), relationship.as_str()],
            Pattern::VarLengthRelatedTo {
                path,
                left,
                right,
                iterator,
                ..
            }
            | Pattern::ShortestPath {
                path,
                left,
                right,
                iterator,
                ..
            } => {
                let mut names = vec![path.as_str(), left.name(), right.name()];
                if let Some(it) = iterator {
                    names.push(it.as_str());
                }
                names
            }
        }
    }

    /// Rewrites the endpoints whose names appear in `optional_names` to
    /// `SingleOptional`.
    pub fn mark_optional_nodes(self, optional_names: &[String]) -> Pattern {
        let retag = |node: PatternNode| {
            if optional_names.iter().any(|n| n == node.name()) {
                node.into_optional()
            } else {
                node
            }
        };
        match self {
            Pattern::SingleNode(node) => Pattern::SingleNode(retag(node)),
            Pattern::RelatedTo {
                left,
                right,
                relationship,
                types,
                direction,
                optional,
            } => Pattern::RelatedTo {
                left: retag(left),
                right: retag(right),
                relationship,
                types,
                direction,
                optional,
            },
            Pattern::VarLengthRelatedTo {
                path,
                left,
                right,
                min_hops,
                max_hops,
                types,
                direction,
                iterator,
                optional,
            } => Pattern::VarLengthRelatedTo {
                path,
                left: retag(left),
                right: retag(right),
                min_hops,
                max_hops,
                types,
                direction,
                iterator,
                optional,
            },
            Pattern::ShortestPath {
                path,
                left,
                right,
                types,
                direction,
                max_hops,
                optional,
                single,
                iterator,
            } => Pattern::ShortestPath {
                path,
                left: retag(left),
                right: retag(right),
                types,
                direction,
                max_hops,
                optional,
                single,
                iterator,
            },
        }
    }
}

/// A path pattern bound to a name via `p = ..`. The flattened records are
/// recorded in the query's match list as well; the named path additionally
/// preserves the written segment order and directions so `nodes(p)` and
/// `rels(p)` can reproduce the author's view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPath {
    pub name: String,
    pub segments: Vec<Pattern>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_reverse() {
        assert_eq!(Direction::Outgoing.reverse(), Direction::Incoming);
        assert_eq!(Direction::Incoming.reverse(), Direction::Outgoing);
        assert_eq!(Direction::Both.reverse(), Direction::Both);
    }

    #[test]
    fn test_mark_optional_nodes() {
        let pattern = Pattern::RelatedTo {
            left: PatternNode::single("a"),
            right: PatternNode::single("b"),
            relationship: "r".into(),
            types: vec![],
            direction: Direction::Outgoing,
            optional: true,
        };
        let marked = pattern.mark_optional_nodes(&["b".to_string()]);
        match marked {
            Pattern::RelatedTo { left, right, .. } => {
                assert_eq!(left, PatternNode::single("a"));
                assert_eq!(right, PatternNode::single_optional("b"));
            }
            _ => panic!("expected RelatedTo"),
        }
    }

    #[test]
    fn test_identifiers() {
        let pattern = Pattern::VarLengthRelatedTo {
            path: "  UNNAMED7".into(),
            left: PatternNode::single("a"),
            right: PatternNode::single("b"),
            min_hops: Some(1),
            max_hops: None,
            types: vec![],
            direction: Direction::Both,
            iterator: Some("r".into()),
            optional: false,
        };
        assert_eq!(pattern.identifiers(), vec!["  UNNAMED7", "a", "b", "r"]);
    }
}

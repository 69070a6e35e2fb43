//! Composed node model
//!
//! A [`Node`] is the intermediate representation produced by composition:
//! it carries the tag the engine assigned, the source position, and the raw
//! (not yet constructed) content. `!include` directives never survive into
//! a composed tree; the including handler replaces them with the root node
//! of the target file before construction runs.

use libyaml_safer::{Mark, ScalarStyle};

/// The three kinds of YAML node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

/// One composed YAML node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Tag assigned by the engine, e.g. `!include` or `tag:yaml.org,2002:int`
    pub tag: Option<String>,
    /// Where the node started in its source
    pub mark: Mark,
    /// Raw content, by kind
    pub content: NodeContent,
}

/// Raw node content prior to construction.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Scalar { value: String, style: ScalarStyle },
    Sequence(Vec<Node>),
    /// Ordered key/value pairs; duplicate keys are resolved at construction
    Mapping(Vec<(Node, Node)>),
}

impl Node {
    /// The kind of this node
    pub fn kind(&self) -> NodeKind {
        match self.content {
            NodeContent::Scalar { .. } => NodeKind::Scalar,
            NodeContent::Sequence(_) => NodeKind::Sequence,
            NodeContent::Mapping(_) => NodeKind::Mapping,
        }
    }

    /// Whether the node carries exactly this tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }

    /// The scalar text, if this is a scalar node
    pub fn as_scalar(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// An untagged empty plain scalar, which constructs to null
    pub(crate) fn null(mark: Mark) -> Self {
        Node {
            tag: None,
            mark,
            content: NodeContent::Scalar {
                value: String::new(),
                style: ScalarStyle::Plain,
            },
        }
    }
}

//! Tag dialect: registered compositors and exclusion predicates
//!
//! A [`Dialect`] bundles every extension to the YAML dialect in one explicit
//! value. It is built once at startup, wrapped in an `Arc`, and shared by
//! reference across all loaders; tag semantics are an extension of the
//! dialect itself, not a per-document setting. Registration happens before
//! any load runs, and the dialect is immutable afterwards.

use crate::composer::Composer;
use crate::error::LoadResult;
use crate::node::{Node, NodeKind};
use crate::tags::{exclude_tagged, include_compositor, INCLUDE_TAG};
use std::collections::HashMap;
use std::sync::Arc;

/// A composition handler for one tag.
///
/// Invoked instead of the default composition when the next event carries a
/// registered tag. The handler is responsible for consuming the current
/// event and may consume arbitrarily many further events (the including
/// handler composes a whole other file). Whatever node it returns replaces
/// the tagged node in the tree, and is bound to the node's anchor if one
/// was present.
pub trait Compositor: Send + Sync {
    fn compose(&self, composer: &mut Composer<'_>, anchor: Option<&str>) -> LoadResult<Node>;
}

impl<F> Compositor for F
where
    F: Fn(&mut Composer<'_>, Option<&str>) -> LoadResult<Node> + Send + Sync,
{
    fn compose(&self, composer: &mut Composer<'_>, anchor: Option<&str>) -> LoadResult<Node> {
        self(composer, anchor)
    }
}

/// Decides whether a mapping entry or sequence element is dropped during
/// construction.
///
/// For mapping entries the predicate receives the key node and
/// `Some(value)`; for sequence elements it receives the element and `None`.
/// Predicates see raw composed nodes, so decisions are made on tags and
/// structure, never on already-constructed values.
pub trait ExclusionPredicate: Send + Sync {
    fn excludes(&self, node: &Node, value: Option<&Node>) -> bool;
}

impl<F> ExclusionPredicate for F
where
    F: Fn(&Node, Option<&Node>) -> bool + Send + Sync,
{
    fn excludes(&self, node: &Node, value: Option<&Node>) -> bool {
        self(node, value)
    }
}

/// The set of tag extensions active for a load.
pub struct Dialect {
    compositors: HashMap<NodeKind, HashMap<String, Arc<dyn Compositor>>>,
    exclusions: HashMap<NodeKind, Vec<Arc<dyn ExclusionPredicate>>>,
}

impl Dialect {
    /// A dialect with no extensions: loading behaves exactly like the
    /// underlying engine.
    pub fn empty() -> Self {
        Dialect {
            compositors: HashMap::new(),
            exclusions: HashMap::new(),
        }
    }

    /// The standard dialect: `!include` on scalars, `!exclude` on mapping
    /// entries and sequence elements.
    pub fn standard() -> Self {
        let mut dialect = Dialect::empty();
        dialect.register_compositor(
            INCLUDE_TAG,
            &[NodeKind::Scalar],
            Arc::new(include_compositor),
        );
        dialect.register_exclusion(
            &[NodeKind::Mapping, NodeKind::Sequence],
            Arc::new(exclude_tagged),
        );
        dialect
    }

    /// Register `compositor` for `tag` on each of `kinds`.
    ///
    /// The tag string is not validated; the last registration for a given
    /// (kind, tag) wins.
    pub fn register_compositor(
        &mut self,
        tag: impl Into<String>,
        kinds: &[NodeKind],
        compositor: Arc<dyn Compositor>,
    ) {
        let tag = tag.into();
        for kind in kinds {
            self.compositors
                .entry(*kind)
                .or_default()
                .insert(tag.clone(), Arc::clone(&compositor));
        }
    }

    /// Look up the handler registered for (kind, tag), by exact string
    /// match.
    pub fn compositor(&self, kind: NodeKind, tag: &str) -> Option<&Arc<dyn Compositor>> {
        self.compositors.get(&kind)?.get(tag)
    }

    /// Append `predicate` to the exclusion list of each of `kinds`.
    ///
    /// An entry is dropped if any registered predicate matches it;
    /// predicates run in registration order.
    pub fn register_exclusion(
        &mut self,
        kinds: &[NodeKind],
        predicate: Arc<dyn ExclusionPredicate>,
    ) {
        for kind in kinds {
            self.exclusions
                .entry(*kind)
                .or_default()
                .push(Arc::clone(&predicate));
        }
    }

    /// The exclusion predicates registered for `kind`, in registration
    /// order.
    pub fn exclusions(&self, kind: NodeKind) -> &[Arc<dyn ExclusionPredicate>] {
        self.exclusions.get(&kind).map_or(&[], Vec::as_slice)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::standard()
    }
}

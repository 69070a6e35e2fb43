//! Compositing composer
//!
//! Wraps the engine's event stream and builds the composed node tree,
//! dispatching tagged nodes to registered compositors. Composition for each
//! node kind peeks the next event, looks the tag up in the dialect, and
//! either hands control to the registered handler or performs the default
//! composition, which consumes exactly one node's worth of events.
//!
//! Anchor resolution happens here, against the loader's anchor table. A
//! forked loader shares that table by reference, which is what lets an
//! alias in one file resolve to an anchor defined in an included file (and
//! vice versa) within the same composition pass.

use crate::error::{LoadError, LoadResult};
use crate::events::EventSource;
use crate::loader::Loader;
use crate::node::{Node, NodeContent, NodeKind};
use libyaml_safer::{Event, EventData, Mark};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Per-document composition state: the loader context plus the document's
/// event stream.
pub struct Composer<'src> {
    loader: Loader,
    events: EventSource<'src>,
}

/// What the next node-producing event turned out to be.
enum NextNode {
    Alias(String),
    Start(NodeKind, Option<String>, Option<String>),
    Unexpected,
}

impl<'src> Composer<'src> {
    pub(crate) fn new(loader: Loader, reader: Box<dyn BufRead + 'src>, origin: String) -> Self {
        Composer {
            loader,
            events: EventSource::new(reader, origin),
        }
    }

    /// The loader this composition runs under.
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Read the next event without consuming it.
    pub fn peek_event(&mut self) -> LoadResult<&Event> {
        self.events.peek()
    }

    /// Consume and return the next event.
    pub fn next_event(&mut self) -> LoadResult<Event> {
        self.events.next()
    }

    /// A composition error at `mark`, labelled with this document's origin.
    pub fn compose_error(&self, problem: impl Into<String>, mark: Mark) -> LoadError {
        LoadError::Compose {
            origin: self.events.origin().to_string(),
            problem: problem.into(),
            mark,
        }
    }

    /// Resolve an include target against the directory of the file
    /// currently being composed, never against the process working
    /// directory. Absolute paths pass through unchanged.
    pub fn resolve_path(&self, target: &str) -> PathBuf {
        let target = Path::new(target);
        if target.is_absolute() {
            return target.to_path_buf();
        }
        match self.loader.source().and_then(Path::parent) {
            Some(dir) => dir.join(target),
            None => target.to_path_buf(),
        }
    }

    /// Compose the stream's single document and return its root node.
    ///
    /// An empty stream composes to a null scalar. A stream containing more
    /// than one document is rejected.
    pub fn compose_document(&mut self) -> LoadResult<Node> {
        let event = self.events.next()?;
        if !matches!(event.data, EventData::StreamStart { .. }) {
            return Err(self.compose_error("expected the start of the stream", event.start_mark));
        }

        if matches!(self.events.peek()?.data, EventData::StreamEnd) {
            let mark = self.events.next()?.start_mark;
            return Ok(Node::null(mark));
        }

        let event = self.events.next()?;
        if !matches!(event.data, EventData::DocumentStart { .. }) {
            return Err(self.compose_error("expected the start of a document", event.start_mark));
        }

        let root = self.compose_node()?;

        let event = self.events.next()?;
        if !matches!(event.data, EventData::DocumentEnd { .. }) {
            return Err(self.compose_error("expected the end of the document", event.start_mark));
        }

        let next = self.events.peek()?;
        if !matches!(next.data, EventData::StreamEnd) {
            let mark = next.start_mark;
            return Err(self.compose_error("expected a single document in the stream", mark));
        }

        Ok(root)
    }

    /// Compose one node, resolving aliases and dispatching registered tags.
    pub fn compose_node(&mut self) -> LoadResult<Node> {
        let (mark, next) = {
            let event = self.events.peek()?;
            let next = match &event.data {
                EventData::Alias { anchor } => NextNode::Alias(anchor.clone()),
                EventData::Scalar { tag, anchor, .. } => {
                    NextNode::Start(NodeKind::Scalar, tag.clone(), anchor.clone())
                }
                EventData::SequenceStart { tag, anchor, .. } => {
                    NextNode::Start(NodeKind::Sequence, tag.clone(), anchor.clone())
                }
                EventData::MappingStart { tag, anchor, .. } => {
                    NextNode::Start(NodeKind::Mapping, tag.clone(), anchor.clone())
                }
                _ => NextNode::Unexpected,
            };
            (event.start_mark, next)
        };

        match next {
            NextNode::Alias(name) => {
                self.events.next()?;
                self.resolve_alias(&name, mark)
            }
            NextNode::Start(kind, tag, anchor) => self.dispatch(kind, tag, anchor, mark),
            NextNode::Unexpected => {
                Err(self.compose_error("unexpected event while composing a node", mark))
            }
        }
    }

    fn resolve_alias(&self, name: &str, mark: Mark) -> LoadResult<Node> {
        let anchors = self.loader.anchors().borrow();
        match anchors.get(name) {
            Some(node) => Ok(node.clone()),
            None => Err(self.compose_error(format!("found undefined alias `{name}`"), mark)),
        }
    }

    fn dispatch(
        &mut self,
        kind: NodeKind,
        tag: Option<String>,
        anchor: Option<String>,
        mark: Mark,
    ) -> LoadResult<Node> {
        if let Some(name) = &anchor {
            if self.loader.anchors().borrow().contains_key(name) {
                return Err(self.compose_error(format!("found duplicate anchor `{name}`"), mark));
            }
        }

        let handler = tag
            .as_deref()
            .and_then(|tag| self.loader.dialect().compositor(kind, tag))
            .cloned();

        let node = match handler {
            Some(handler) => {
                trace!("dispatching tag {:?} to a registered compositor", tag);
                handler.compose(self, anchor.as_deref())?
            }
            None => match kind {
                NodeKind::Scalar => self.compose_scalar()?,
                NodeKind::Sequence => self.compose_sequence()?,
                NodeKind::Mapping => self.compose_mapping()?,
            },
        };

        // Bind the anchor to whatever node came back. For a handler-composed
        // node that means the replacement: an anchor on an `!include`
        // directive refers to the included document's root.
        if let Some(name) = anchor {
            self.loader.anchors().borrow_mut().insert(name, node.clone());
        }

        Ok(node)
    }

    fn compose_scalar(&mut self) -> LoadResult<Node> {
        let event = self.events.next()?;
        match event.data {
            EventData::Scalar {
                tag, value, style, ..
            } => Ok(Node {
                tag,
                mark: event.start_mark,
                content: NodeContent::Scalar { value, style },
            }),
            _ => Err(self.compose_error("expected a scalar event", event.start_mark)),
        }
    }

    fn compose_sequence(&mut self) -> LoadResult<Node> {
        let event = self.events.next()?;
        let tag = match event.data {
            EventData::SequenceStart { tag, .. } => tag,
            _ => {
                return Err(self.compose_error("expected a sequence start event", event.start_mark));
            }
        };

        let mut items = Vec::new();
        while !matches!(self.events.peek()?.data, EventData::SequenceEnd) {
            items.push(self.compose_node()?);
        }
        self.events.next()?;

        Ok(Node {
            tag,
            mark: event.start_mark,
            content: NodeContent::Sequence(items),
        })
    }

    fn compose_mapping(&mut self) -> LoadResult<Node> {
        let event = self.events.next()?;
        let tag = match event.data {
            EventData::MappingStart { tag, .. } => tag,
            _ => {
                return Err(self.compose_error("expected a mapping start event", event.start_mark));
            }
        };

        let mut pairs = Vec::new();
        while !matches!(self.events.peek()?.data, EventData::MappingEnd) {
            let key = self.compose_node()?;
            let value = self.compose_node()?;
            pairs.push((key, value));
        }
        self.events.next()?;

        Ok(Node {
            tag,
            mark: event.start_mark,
            content: NodeContent::Mapping(pairs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Loader, LoaderOptions};

    fn compose(text: &str) -> LoadResult<Node> {
        let loader = Loader::new(LoaderOptions::default()).unwrap();
        loader.compose_str(text)
    }

    #[test]
    fn test_compose_plain_mapping() {
        let node = compose("a: 1\nb: two\n").unwrap();
        assert_eq!(node.kind(), NodeKind::Mapping);
        match &node.content {
            NodeContent::Mapping(pairs) => {
                assert_eq!(pairs.len(), 2);
                assert_eq!(pairs[0].0.as_scalar(), Some("a"));
                assert_eq!(pairs[0].1.as_scalar(), Some("1"));
                assert_eq!(pairs[1].1.as_scalar(), Some("two"));
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_compose_empty_stream_is_null() {
        let node = compose("").unwrap();
        assert_eq!(node.as_scalar(), Some(""));
        assert_eq!(node.tag, None);
    }

    #[test]
    fn test_tags_survive_composition() {
        let node = compose("[1, !exclude 2]\n").unwrap();
        match &node.content {
            NodeContent::Sequence(items) => {
                assert!(!items[0].has_tag("!exclude"));
                assert!(items[1].has_tag("!exclude"));
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_alias_resolves_to_anchored_node() {
        let node = compose("base: &b [1, 2]\ncopy: *b\n").unwrap();
        match &node.content {
            NodeContent::Mapping(pairs) => {
                assert_eq!(pairs[0].1, pairs[1].1);
                assert_eq!(pairs[1].1.kind(), NodeKind::Sequence);
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_undefined_alias_is_an_error() {
        let err = compose("a: *missing\n").unwrap_err();
        match err {
            LoadError::Compose { problem, .. } => {
                assert!(problem.contains("undefined alias"), "{problem}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_anchor_is_an_error() {
        let err = compose("a: &x 1\nb: &x 2\n").unwrap_err();
        match err {
            LoadError::Compose { problem, .. } => {
                assert!(problem.contains("duplicate anchor"), "{problem}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_second_document_is_an_error() {
        let err = compose("---\na: 1\n---\nb: 2\n").unwrap_err();
        match err {
            LoadError::Compose { problem, .. } => {
                assert!(problem.contains("single document"), "{problem}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_yaml_is_a_parse_error() {
        let err = compose("a: [1, 2\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}

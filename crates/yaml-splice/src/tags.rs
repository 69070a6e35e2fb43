//! Built-in tag handlers: `!include` and `!exclude`

use crate::composer::Composer;
use crate::error::LoadResult;
use crate::node::Node;
use libyaml_safer::EventData;
use tracing::debug;

/// Tag that splices another file's document in place of the tagged scalar
pub const INCLUDE_TAG: &str = "!include";

/// Tag that removes the carrying mapping entry or sequence element
pub const EXCLUDE_TAG: &str = "!exclude";

/// The `!include` compositor.
///
/// Consumes the tagged scalar, interprets its value as a path relative to
/// the file currently being composed, and composes the target file's single
/// document through a forked loader. The fork shares the outer document's
/// anchor table, so anchors and aliases resolve across the include
/// boundary. The returned node replaces the directive in the tree; if the
/// directive carried an anchor, the anchor ends up referring to the
/// included document's root.
///
/// A file that cannot be opened or parsed aborts the entire load. Includes
/// may nest arbitrarily; nothing detects cycles unless the loader was given
/// an include depth limit.
pub fn include_compositor(
    composer: &mut Composer<'_>,
    _anchor: Option<&str>,
) -> LoadResult<Node> {
    let event = composer.next_event()?;
    let mark = event.start_mark;
    let target = match event.data {
        EventData::Scalar { value, .. } => value,
        _ => {
            return Err(composer.compose_error("expected a scalar path after !include", mark));
        }
    };

    let path = composer.resolve_path(&target);
    debug!("including {}", path.display());

    let fork = composer.loader().fork();
    // The included file's handle lives inside the fork's parser and is
    // dropped when this call returns, on success and failure alike.
    fork.compose_file(&path)
}

/// The `!exclude` predicate: a mapping entry is dropped when either its key
/// or its value carries the tag; a sequence element when it carries the tag
/// itself.
pub fn exclude_tagged(node: &Node, value: Option<&Node>) -> bool {
    let value = value.unwrap_or(node);
    node.has_tag(EXCLUDE_TAG) || value.has_tag(EXCLUDE_TAG)
}

//! Composition-time `!include` and `!exclude` tags for YAML loading
//!
//! This crate extends a YAML engine with two document-composition-time
//! directives:
//!
//! - `!include path` - Splice another file's document in place of the tag,
//!   with paths resolved relative to the including file
//! - `!exclude` - Remove the tagged mapping entry or sequence element from
//!   the constructed value
//!
//! Both run during composition and construction, not as a post-processing
//! pass: anchors and aliases resolve across included files because a forked
//! loader shares its parent's anchor table, and excluded nodes are dropped
//! before type construction ever sees them.
//!
//! Further tags can be registered on a [`Dialect`]: a compositor takes over
//! node composition for its tag, and exclusion predicates decide which raw
//! entries construction drops.
//!
//! # Example
//!
//! ```ignore
//! use yaml_splice::{load_path, Loader, LoaderOptions};
//!
//! // Load a file with the standard dialect
//! let value = load_path("config/root.yaml")?;
//!
//! // Or configure a loader explicitly
//! let loader = Loader::new(LoaderOptions::default())?;
//! let value = loader.load_file("config/root.yaml")?;
//! ```

mod composer;
mod constructor;
mod dialect;
mod error;
mod events;
mod loader;
mod node;
mod tags;

pub use composer::Composer;
pub use constructor::Constructor;
pub use dialect::{Compositor, Dialect, ExclusionPredicate};
pub use error::{LoadError, LoadResult};
pub use loader::{load_path, load_str, Loader, LoaderOptions, ParserMode, SafetyMode};
pub use node::{Node, NodeContent, NodeKind};
pub use tags::{exclude_tagged, include_compositor, EXCLUDE_TAG, INCLUDE_TAG};

// Re-export the engine types custom compositors work with, and the native
// value type, for convenience
pub use libyaml_safer::{Event, EventData, Mark, ScalarStyle};
pub use serde_yaml::Value;

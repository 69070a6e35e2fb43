//! Loader facade
//!
//! The user-facing entry point. A [`Loader`] carries the dialect, the
//! validated configuration, the document's anchor table, and the identity
//! of the source currently being composed (which is what include paths
//! resolve against).
//!
//! One loader composes one document. [`Loader::fork`] produces the child
//! used for each recursive include: same configuration and dialect, its own
//! stream, and the *same* anchor table by reference — that sharing is what
//! lets aliases span an include tree. The table is never cleared mid-load.

use crate::composer::Composer;
use crate::constructor::Constructor;
use crate::dialect::Dialect;
use crate::error::{LoadError, LoadResult};
use crate::node::Node;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// How constructed values are restricted.
///
/// Only [`SafetyMode::Safe`] is accepted: composition-time directives
/// perform file-system side effects and must not be combined with
/// unrestricted object construction. `Unsafe` exists to reject the request
/// with a descriptive error rather than a missing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafetyMode {
    #[default]
    Safe,
    Unsafe,
}

/// Which parser implementation backs composition.
///
/// Only [`ParserMode::Pure`] is accepted: an accelerated native parser
/// does not expose the hookable composer this crate relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserMode {
    #[default]
    Pure,
    Native,
}

/// Loader configuration, validated at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderOptions {
    pub safety: SafetyMode,
    pub parser: ParserMode,
    /// Opt-in guard against runaway include recursion. `None` (the
    /// default) preserves the historical behavior: a self-including file
    /// recurses until a resource limit is hit.
    pub include_depth_limit: Option<NonZeroUsize>,
}

impl LoaderOptions {
    fn validate(self) -> LoadResult<()> {
        if self.safety != SafetyMode::Safe {
            return Err(LoadError::Configuration(
                "composition-time directives require safe loading".to_string(),
            ));
        }
        if self.parser != ParserMode::Pure {
            return Err(LoadError::Configuration(
                "the native parser does not expose composer hooks; pure parsing is required"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

type AnchorTable = Rc<RefCell<HashMap<String, Node>>>;

/// A single-document YAML loader with `!include`/`!exclude` support.
#[derive(Clone)]
pub struct Loader {
    options: LoaderOptions,
    dialect: Arc<Dialect>,
    anchors: AnchorTable,
    source: Option<PathBuf>,
    depth: usize,
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("options", &self.options)
            .field("source", &self.source)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl Loader {
    /// Create a loader with the standard dialect.
    ///
    /// Fails with a configuration error, before any I/O, if the options
    /// request anything other than safe, pure loading.
    pub fn new(options: LoaderOptions) -> LoadResult<Self> {
        Self::with_dialect(options, Arc::new(Dialect::standard()))
    }

    /// Create a loader with a caller-assembled dialect.
    pub fn with_dialect(
        options: LoaderOptions,
        dialect: Arc<Dialect>,
    ) -> LoadResult<Self> {
        options.validate()?;
        Ok(Loader {
            options,
            dialect,
            anchors: Rc::new(RefCell::new(HashMap::new())),
            source: None,
            depth: 0,
        })
    }

    /// A child loader for composing an included file.
    ///
    /// Shares this loader's anchor table by reference — not a copy — so an
    /// alias in the parent can resolve to an anchor defined in the child
    /// and vice versa within the same composition pass. Configuration and
    /// dialect carry over; stream state does not.
    pub fn fork(&self) -> Loader {
        Loader {
            options: self.options,
            dialect: Arc::clone(&self.dialect),
            anchors: Rc::clone(&self.anchors),
            source: None,
            depth: self.depth + 1,
        }
    }

    /// The active configuration.
    pub fn options(&self) -> LoaderOptions {
        self.options
    }

    /// The dialect this loader composes with.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// The file currently being composed, if composition started from a
    /// path.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub(crate) fn anchors(&self) -> &RefCell<HashMap<String, Node>> {
        &self.anchors
    }

    /// Compose the single document in `path` and return its root node.
    pub fn compose_file(&self, path: impl AsRef<Path>) -> LoadResult<Node> {
        let path = path.as_ref();
        if let Some(limit) = self.options.include_depth_limit {
            if self.depth > limit.get() {
                return Err(LoadError::IncludeDepth {
                    path: path.to_path_buf(),
                    limit: limit.get(),
                });
            }
        }

        debug!("loading YAML file: {}", path.display());
        let file = File::open(path).map_err(|source| LoadError::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;

        let mut scoped = self.clone();
        scoped.source = Some(path.to_path_buf());
        let origin = path.display().to_string();
        let mut composer = Composer::new(scoped, Box::new(BufReader::new(file)), origin);
        // The file handle is owned by the composer's parser and released
        // here on every exit path.
        composer.compose_document()
    }

    /// Compose the single document read from `reader`.
    ///
    /// `origin` labels the stream in error messages. Relative include
    /// paths inside the stream resolve against the process working
    /// directory, since the stream has no file identity.
    pub fn compose_reader<'src>(
        &self,
        reader: impl BufRead + 'src,
        origin: &str,
    ) -> LoadResult<Node> {
        let mut composer = Composer::new(self.clone(), Box::new(reader), origin.to_string());
        composer.compose_document()
    }

    /// Compose the single document in `text`.
    pub fn compose_str(&self, text: &str) -> LoadResult<Node> {
        self.compose_reader(text.as_bytes(), "<string>")
    }

    /// Compose and construct the document in `path`.
    pub fn load_file(&self, path: impl AsRef<Path>) -> LoadResult<Value> {
        let node = self.compose_file(path)?;
        self.construct(&node)
    }

    /// Compose and construct the document read from `reader`.
    pub fn load_reader<'src>(
        &self,
        reader: impl BufRead + 'src,
        origin: &str,
    ) -> LoadResult<Value> {
        let node = self.compose_reader(reader, origin)?;
        self.construct(&node)
    }

    /// Compose and construct the document in `text`.
    pub fn load_str(&self, text: &str) -> LoadResult<Value> {
        let node = self.compose_str(text)?;
        self.construct(&node)
    }

    /// Load `path` and deserialize the resulting value into `T`.
    pub fn load_file_as<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> LoadResult<T> {
        let value = self.load_file(path)?;
        serde_yaml::from_value(value).map_err(|source| LoadError::Deserialize { source })
    }

    fn construct(&self, node: &Node) -> LoadResult<Value> {
        Constructor::new(Arc::clone(&self.dialect)).construct(node)
    }
}

/// Load one YAML file with the standard dialect and default options.
pub fn load_path(path: impl AsRef<Path>) -> LoadResult<Value> {
    Loader::new(LoaderOptions::default())?.load_file(path)
}

/// Load one YAML document from a string with the standard dialect.
pub fn load_str(text: &str) -> LoadResult<Value> {
    Loader::new(LoaderOptions::default())?.load_str(text)
}

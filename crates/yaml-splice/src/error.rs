//! Error types for YAML loading

use libyaml_safer::Mark;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loading operations
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while composing and constructing a document.
///
/// No variant is recovered from internally: every failure aborts the whole
/// load and surfaces to the caller, so a load either returns a complete,
/// fully spliced and filtered value or nothing at all.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Rejected loader configuration
    #[error("unsupported loader configuration: {0}")]
    Configuration(String),

    /// A document or included file could not be opened
    #[error("failed to open {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML engine rejected the input
    #[error("failed to parse YAML in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: libyaml_safer::Error,
    },

    /// Composition failure: alias resolution or event sequencing
    #[error("{problem} in {origin} at {mark}")]
    Compose {
        origin: String,
        problem: String,
        mark: Mark,
    },

    /// A node could not be turned into a native value in safe mode
    #[error("{problem} at {mark}")]
    Construct { problem: String, mark: Mark },

    /// The opt-in include nesting guard tripped
    #[error("include depth limit ({limit}) exceeded while including {}", .path.display())]
    IncludeDepth { path: PathBuf, limit: usize },

    /// The loaded value did not match the requested type
    #[error("failed to deserialize loaded value: {source}")]
    Deserialize {
        #[source]
        source: serde_yaml::Error,
    },
}

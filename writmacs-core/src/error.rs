use std::path::PathBuf;

pub use crate::config::ConfigError;

/// Errors that can occur while expanding a document
#[derive(Debug, thiserror::Error)]
pub enum WritError {
    #[error("Keymap not found: {name}")]
    UnknownKeymap { name: String },

    #[error("Unknown macro: %{name}")]
    UnknownMacro { name: String },

    #[error("Snippet not found: {name}")]
    UnknownSnippet { name: String },

    #[error("Nesting deeper than {limit} bracket groups at byte {offset}")]
    DepthExceeded { limit: usize, offset: usize },

    #[error("Invalid escape on line {line}: {message}")]
    InvalidEscape { line: usize, message: String },

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, WritError>;

impl WritError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WritError::Io {
            path: path.into(),
            source,
        }
    }
}

use std::path::PathBuf;

use search::LinkError;

use crate::model::ImportDescriptor;

/// Failure to produce a [`crate::model::Source`] from one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("cannot open source {}: {message}", path.display())]
    Open { path: PathBuf, message: String },

    #[error("{}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("source type '{mime_type}' is not supported for {}", path.display())]
    UnsupportedType { path: PathBuf, mime_type: String },

    #[error("import cycle: {} is already imported by {}", path.display(), chain_display(chain))]
    Cycle { path: PathBuf, chain: Vec<PathBuf> },

    #[error("cannot write source: {0}")]
    Write(String),
}

impl SourceError {
    /// Cycles are structural; retrying them can never succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SourceError::Cycle { .. })
    }
}

fn chain_display(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Unified error type for the launcher crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("import of {} failed: {source}", descriptor.path.display())]
    Import {
        descriptor: ImportDescriptor,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("cannot open link '{link}': {message}")]
    LinkOpen { link: String, message: String },

    #[error("row {index} is out of range (catalog has {count} rows)")]
    RowOutOfRange { index: usize, count: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

use std::path::PathBuf;

use thiserror::Error;

/// Errors callers may want to tell apart
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read profile {path:?}: {source}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile {path:?}: {message}")]
    ProfileParse { path: PathBuf, message: String },

    #[error("invalid pattern {name:?}: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("profile lists no {0}")]
    EmptyList(&'static str),

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CorpusError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

//! Error types for loading, indexing and searching decision records

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons a single record fails to parse
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("record is not valid UTF-8")]
    InvalidUtf8,

    #[error("record does not start with a front matter header")]
    MissingHeader,

    #[error("front matter header opened with '{delimiter}' is never closed")]
    UnterminatedHeader { delimiter: &'static str },

    #[error("invalid front matter header: {0}")]
    InvalidHeader(String),
}

/// Main error type for corpus and search operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to parse record {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to index record {identifier}: {source}")]
    IndexBuild {
        identifier: String,
        #[source]
        source: tantivy::TantivyError,
    },

    #[error("search hit is missing or has a malformed '{field}' field")]
    Projection { field: &'static str },

    #[error("invalid query: {0}")]
    Query(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("duplicate record identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("search index error: {0}")]
    Index(#[from] tantivy::TantivyError),
}

/// Result type alias for corpus and search operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Error::Parse {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means the requested record does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

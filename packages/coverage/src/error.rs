//! Pipeline error kinds.

use gdb_coverage_archive::{ArchiveError, DownloadError};
use gdb_coverage_catalogue::CatalogueError;
use gdb_coverage_engine::EngineError;

/// A failure that aborts a coverage run.
///
/// Unsupported geometry kinds are not errors; they are recorded in the
/// run summary as skipped feature classes.
#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    /// The archive could not be downloaded.
    #[error("Network failure: {0}")]
    Network(#[source] DownloadError),

    /// The archive is missing or cannot be decoded.
    #[error("Archive corruption: {0}")]
    ArchiveCorruption(#[source] ArchiveError),

    /// The container could not be located, listed or read.
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    /// A geometry engine operation failed.
    #[error("Geometry engine failed on {class}: {source}")]
    GeometryEngine {
        /// Feature class (or `accumulator`) being processed.
        class: String,
        /// Engine error.
        source: EngineError,
    },

    /// Filesystem error outside of the archive and engine steps.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Invalid or unreadable configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CoverageError {
    pub(crate) fn engine(class: &str) -> impl Fn(EngineError) -> Self + '_ {
        move |source| Self::GeometryEngine {
            class: class.to_string(),
            source,
        }
    }
}

impl From<DownloadError> for CoverageError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::Io { path, source } => Self::Io { path, source },
            other => Self::Network(other),
        }
    }
}

impl From<ArchiveError> for CoverageError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::Io { path, source } => Self::Io { path, source },
            other => Self::ArchiveCorruption(other),
        }
    }
}

//! Error types for Jsontape

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for Jsontape operations
pub type Result<T> = std::result::Result<T, JsontapeError>;

/// Errors that can occur outside of a single recording session
#[derive(Debug, Error)]
pub enum JsontapeError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A recording session failed
    #[error(transparent)]
    Recording(#[from] RecordingError),

    /// Transport failure outside of a recording session
    #[error(transparent)]
    Transport(#[from] crate::transport::TransportError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Kind of a recording failure, without its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The transport could not build the request
    UnableToStartLoadingRequest,
    /// Connection or transmission failure
    FailedToConnect,
    /// Response body is not valid UTF-8 text
    UnableToParseAsJson,
    /// Documents directory unavailable
    NoDocumentsDirectory,
    /// Request URL has no last path segment
    NoLastPathSegment,
    /// Fixture file could not be written
    UnableToSaveFile,
    /// Transport reported an error status
    UnableToGetSuccessfulResponse,
}

/// Terminal failure of one recording session
///
/// Every variant carries the request URI or path that produced it. Values
/// are cloned to the listener and the session waiter, so sources are kept
/// as rendered strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    /// The transport could not build the request
    #[error("Unable to start loading {uri}: {reason}")]
    UnableToStartLoadingRequest {
        /// Request URI
        uri: String,
        /// Rendered transport error
        reason: String,
    },

    /// Connection or transmission failure
    #[error("Failed to connect to {uri}: {reason}")]
    FailedToConnect {
        /// Request URI
        uri: String,
        /// Rendered transport error
        reason: String,
    },

    /// Response body is not valid UTF-8 text
    #[error("Unable to parse response from {uri} as JSON: body is not valid UTF-8")]
    UnableToParseAsJson {
        /// Request URI
        uri: String,
    },

    /// Documents directory unavailable
    #[error("No documents directory: {reason}")]
    NoDocumentsDirectory {
        /// Why the directory could not be located
        reason: String,
    },

    /// Request URL has no last path segment
    #[error("No last path segment in {uri}")]
    NoLastPathSegment {
        /// Request URI
        uri: String,
    },

    /// Fixture file could not be written
    #[error("Unable to save fixture {}: {reason}", path.display())]
    UnableToSaveFile {
        /// Destination path
        path: PathBuf,
        /// Rendered I/O error
        reason: String,
    },

    /// Transport reported an error status
    #[error("Unable to get a successful response from {uri}: status {status}")]
    UnableToGetSuccessfulResponse {
        /// Request URI
        uri: String,
        /// HTTP status code
        status: u16,
    },
}

impl RecordingError {
    /// Get the failure kind
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnableToStartLoadingRequest { .. } => FailureKind::UnableToStartLoadingRequest,
            Self::FailedToConnect { .. } => FailureKind::FailedToConnect,
            Self::UnableToParseAsJson { .. } => FailureKind::UnableToParseAsJson,
            Self::NoDocumentsDirectory { .. } => FailureKind::NoDocumentsDirectory,
            Self::NoLastPathSegment { .. } => FailureKind::NoLastPathSegment,
            Self::UnableToSaveFile { .. } => FailureKind::UnableToSaveFile,
            Self::UnableToGetSuccessfulResponse { .. } => {
                FailureKind::UnableToGetSuccessfulResponse
            }
        }
    }
}

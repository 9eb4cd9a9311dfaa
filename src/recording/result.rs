//! Recording results delivered to listeners

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::RecordingError;

/// Unique identity of one recording session
///
/// Ids come from a per-registry monotonic counter, so two concurrent
/// requests to the same URL never share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Numeric value of the id
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Fixture written
    Success {
        /// Human readable confirmation
        message: String,
        /// Fixture file path
        path: PathBuf,
    },
    /// Session failed; nothing was written
    Failure(RecordingError),
}

/// Result of one recording session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingResult {
    /// Session that produced this result
    pub session: SessionId,
    /// URI of the recorded request
    pub uri: String,
    /// Outcome
    pub outcome: Outcome,
}

impl RecordingResult {
    /// Successful recording to `path`
    #[must_use]
    pub fn success(session: SessionId, uri: impl Into<String>, path: PathBuf) -> Self {
        Self {
            session,
            uri: uri.into(),
            outcome: Outcome::Success {
                message: format!("Saved fixture to {}", path.display()),
                path,
            },
        }
    }

    /// Failed recording
    #[must_use]
    pub fn failure(session: SessionId, uri: impl Into<String>, error: RecordingError) -> Self {
        Self {
            session,
            uri: uri.into(),
            outcome: Outcome::Failure(error),
        }
    }

    /// Whether a fixture was written
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    /// Fixture path on success
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.outcome {
            Outcome::Success { path, .. } => Some(path),
            Outcome::Failure(_) => None,
        }
    }

    /// Error on failure
    #[must_use]
    pub fn error(&self) -> Option<&RecordingError> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Failure(error) => Some(error),
        }
    }
}

impl fmt::Display for RecordingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Success { message, .. } => write!(f, "{}: {message}", self.session),
            Outcome::Failure(error) => write!(f, "{}: {error}", self.session),
        }
    }
}

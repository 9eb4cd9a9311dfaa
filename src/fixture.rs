//! Fixture path resolution and atomic fixture writes

use std::io::Write;
use std::path::{Path, PathBuf};

use hyper::Uri;
use tempfile::NamedTempFile;

use crate::error::RecordingError;

/// Extension appended to every fixture file name
pub const FIXTURE_EXTENSION: &str = "json";

/// Where the documents directory comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentsDir {
    /// An explicit directory, usually from configuration
    Fixed(PathBuf),
    /// The current user's platform documents directory
    UserDocuments,
}

impl DocumentsDir {
    /// Locate the directory
    ///
    /// # Errors
    ///
    /// Returns `NoDocumentsDirectory` if the directory is unknown or missing
    pub fn locate(&self) -> Result<PathBuf, RecordingError> {
        let dir = match self {
            Self::Fixed(dir) => dir.clone(),
            Self::UserDocuments => {
                dirs::document_dir().ok_or_else(|| RecordingError::NoDocumentsDirectory {
                    reason: "platform has no user documents directory".to_string(),
                })?
            }
        };

        if !dir.is_dir() {
            return Err(RecordingError::NoDocumentsDirectory {
                reason: format!("{} is not a directory", dir.display()),
            });
        }

        Ok(dir)
    }
}

impl Default for DocumentsDir {
    fn default() -> Self {
        Self::UserDocuments
    }
}

/// Maps request URIs to fixture file paths
#[derive(Debug, Clone, Default)]
pub struct FixtureResolver {
    documents: DocumentsDir,
}

impl FixtureResolver {
    /// Create a resolver rooted at the given documents directory
    #[must_use]
    pub fn new(documents: DocumentsDir) -> Self {
        Self { documents }
    }

    /// Documents directory source
    #[must_use]
    pub fn documents(&self) -> &DocumentsDir {
        &self.documents
    }

    /// Resolve `<documents>/<last-path-segment>.json` for a request URI
    ///
    /// Requests sharing a last path segment share a fixture; the segment is
    /// used as it appears in the URI, without decoding or escaping.
    ///
    /// # Errors
    ///
    /// Returns `NoDocumentsDirectory` or `NoLastPathSegment`
    pub fn resolve(&self, uri: &Uri) -> Result<PathBuf, RecordingError> {
        let dir = self.documents.locate()?;

        let segment = last_path_segment(uri).ok_or_else(|| RecordingError::NoLastPathSegment {
            uri: uri.to_string(),
        })?;

        Ok(dir.join(format!("{segment}.{FIXTURE_EXTENSION}")))
    }
}

/// Last non-empty segment of a URI path
///
/// A trailing slash is ignored, so `/users/posts/` yields `posts`. The root
/// path has no segment.
#[must_use]
pub fn last_path_segment(uri: &Uri) -> Option<&str> {
    uri.path().rsplit('/').find(|s| !s.is_empty())
}

/// Write fixture text atomically
///
/// The text goes to a temporary file in the destination directory which is
/// then renamed over `path`, so readers never observe a partial fixture.
///
/// # Errors
///
/// Returns `UnableToSaveFile` if any step fails
pub fn write_fixture(path: &Path, text: &str) -> Result<(), RecordingError> {
    let save_error = |reason: String| RecordingError::UnableToSaveFile {
        path: path.to_path_buf(),
        reason,
    };

    let dir = path
        .parent()
        .ok_or_else(|| save_error("path has no parent directory".to_string()))?;

    let mut file = NamedTempFile::new_in(dir).map_err(|e| save_error(e.to_string()))?;
    file.write_all(text.as_bytes())
        .map_err(|e| save_error(e.to_string()))?;
    file.as_file()
        .sync_all()
        .map_err(|e| save_error(e.to_string()))?;
    file.persist(path)
        .map_err(|e| save_error(e.error.to_string()))?;

    Ok(())
}

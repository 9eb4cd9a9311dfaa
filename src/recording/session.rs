//! Recording session lifecycle

use std::mem;
use std::path::PathBuf;
use std::sync::Arc;

use hyper::Uri;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::RecordingError;
use crate::fixture::{write_fixture, FixtureResolver};

use super::registry::Registry;
use super::result::{RecordingResult, SessionId};

/// One claimed request, from start to result delivery
///
/// The body buffer has a single writer: whoever owns the session. Settling
/// the session consumes it; dropping an unsettled session cancels it in the
/// registry, so a cancelled request never reaches the listener.
pub struct RecordingSession {
    id: SessionId,
    uri: Uri,
    buffer: Vec<u8>,
    registry: Arc<Registry>,
    resolver: Arc<FixtureResolver>,
    settled: bool,
}

impl RecordingSession {
    /// Register a new pending session for `uri`
    #[must_use]
    pub fn start(registry: Arc<Registry>, resolver: Arc<FixtureResolver>, uri: Uri) -> Self {
        let id = registry.begin(&uri);

        Self {
            id,
            uri,
            buffer: Vec::new(),
            registry,
            resolver,
            settled: false,
        }
    }

    /// Session id
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// URI of the recorded request
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Append a chunk of response body
    pub fn append(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of body bytes buffered so far
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Settle the session with a failure
    pub fn fail(mut self, error: RecordingError) {
        self.settled = true;
        debug!("{} failed: {}", self.id, error);

        let result = RecordingResult::failure(self.id, self.uri.to_string(), error);
        self.registry.deliver(result);
    }

    /// Settle the session by persisting the buffered body
    ///
    /// Persistence runs on tokio's blocking pool when called inside a
    /// runtime, inline otherwise. The result is delivered once it finishes.
    pub fn complete(mut self) {
        self.settled = true;

        let persist = Persist {
            id: self.id,
            uri: self.uri.clone(),
            body: mem::take(&mut self.buffer),
            registry: Arc::clone(&self.registry),
            resolver: Arc::clone(&self.resolver),
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || persist.run());
            }
            Err(_) => persist.run(),
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if !self.settled {
            debug!("{} dropped before completion", self.id);
            self.registry.cancel(self.id);
        }
    }
}

/// Buffered body on its way to disk
struct Persist {
    id: SessionId,
    uri: Uri,
    body: Vec<u8>,
    registry: Arc<Registry>,
    resolver: Arc<FixtureResolver>,
}

impl Persist {
    fn run(self) {
        let result = match self.write() {
            Ok(path) => RecordingResult::success(self.id, self.uri.to_string(), path),
            Err(error) => {
                warn!("{} not recorded: {}", self.id, error);
                RecordingResult::failure(self.id, self.uri.to_string(), error)
            }
        };

        self.registry.deliver(result);
    }

    fn write(&self) -> Result<PathBuf, RecordingError> {
        let path = self.resolver.resolve(&self.uri)?;

        let text =
            std::str::from_utf8(&self.body).map_err(|_| RecordingError::UnableToParseAsJson {
                uri: self.uri.to_string(),
            })?;

        write_fixture(&path, text)?;

        debug!("{} wrote {} bytes to {}", self.id, self.body.len(), path.display());
        Ok(path)
    }
}

//! Client configuration variants

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use hyper::Request;
use tracing::debug;

use super::ProtocolHandler;

/// Client configuration variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// Long lived default configuration
    Persistent,
    /// Throwaway configuration for private sessions
    Ephemeral,
}

/// Configuration an intercepting client is built from
#[derive(Clone)]
pub struct ClientConfig {
    kind: ConfigKind,
    protocol_handlers: Vec<Arc<dyn ProtocolHandler>>,
}

impl ClientConfig {
    /// Create an empty configuration of the given kind
    #[must_use]
    pub fn new(kind: ConfigKind) -> Self {
        Self {
            kind,
            protocol_handlers: Vec::new(),
        }
    }

    /// Empty persistent configuration
    #[must_use]
    pub fn persistent() -> Self {
        Self::new(ConfigKind::Persistent)
    }

    /// Empty ephemeral configuration
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::new(ConfigKind::Ephemeral)
    }

    /// Configuration kind
    #[must_use]
    pub fn kind(&self) -> ConfigKind {
        self.kind
    }

    /// Install a handler ahead of all others
    ///
    /// Returns `false` and leaves the configuration untouched if a handler
    /// with the same id is already installed.
    pub fn install(&mut self, handler: Arc<dyn ProtocolHandler>) -> bool {
        if self.contains(handler.id()) {
            debug!("Handler {} already installed", handler.id());
            return false;
        }

        debug!("Installing handler {} into {:?} config", handler.id(), self.kind);
        self.protocol_handlers.insert(0, handler);
        true
    }

    /// Whether a handler with this id is installed
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.protocol_handlers.iter().any(|h| h.id() == id)
    }

    /// Installed handlers, in the order they are consulted
    #[must_use]
    pub fn handlers(&self) -> &[Arc<dyn ProtocolHandler>] {
        &self.protocol_handlers
    }

    /// First handler willing to take the request
    #[must_use]
    pub fn handler_for(&self, request: &Request<Bytes>) -> Option<&Arc<dyn ProtocolHandler>> {
        self.protocol_handlers
            .iter()
            .find(|handler| handler.can_handle(request))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.protocol_handlers.iter().map(|h| h.id()).collect();
        f.debug_struct("ClientConfig")
            .field("kind", &self.kind)
            .field("protocol_handlers", &ids)
            .finish()
    }
}

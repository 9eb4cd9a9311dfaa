//! Client configurations and the intercepting client
//!
//! A [`ClientConfig`] holds an ordered list of protocol handlers. An
//! [`InterceptingClient`] offers every request to those handlers before
//! falling back to its transport.

mod config;
mod intercepting;

pub use config::{ClientConfig, ConfigKind};
pub use intercepting::InterceptingClient;

use std::sync::Arc;

use bytes::Bytes;
use hyper::Request;

use crate::transport::{Transport, TransportFuture};

/// A candidate handler for requests issued through an intercepting client
pub trait ProtocolHandler: Send + Sync + 'static {
    /// Stable identity; a configuration holds at most one handler per id
    fn id(&self) -> &str;

    /// Whether this handler takes ownership of the request
    fn can_handle(&self, request: &Request<Bytes>) -> bool;

    /// Canonical form of a claimed request
    fn canonical_request(&self, request: Request<Bytes>) -> Request<Bytes> {
        request
    }

    /// Execute a claimed request through `transport`
    ///
    /// Dropping the returned future cancels the request.
    fn start(&self, request: Request<Bytes>, transport: Arc<dyn Transport>) -> TransportFuture;
}

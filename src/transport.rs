//! HTTP transport the recorder forwards requests through

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientSettings;

/// Boxed error carried by response bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response body produced by every transport
pub type TransportBody = UnsyncBoxBody<Bytes, BoxError>;

/// Future returned by [`Transport::send`]
pub type TransportFuture = BoxFuture<'static, Result<Response<TransportBody>, TransportError>>;

/// Transport failure before a response head arrived
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be turned into a network call
    #[error("Failed to build request: {0}")]
    Build(String),

    /// Connecting or sending failed
    #[error("Request failed: {0}")]
    Connect(String),
}

/// Something that can execute an HTTP request
///
/// Dropping the returned future cancels the request.
pub trait Transport: Send + Sync + 'static {
    /// Send a request and resolve once the response head is available
    fn send(&self, request: Request<Bytes>) -> TransportFuture;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request<Bytes>) -> TransportFuture {
        (**self).send(request)
    }
}

/// Wrap bytes into a transport body
pub fn full_body(bytes: impl Into<Bytes>) -> TransportBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// HTTP and HTTPS transport over hyper's pooled client
///
/// TLS uses rustls with the bundled webpki root certificates.
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HyperTransport {
    /// Create a new transport
    #[must_use]
    pub fn new(settings: &ClientSettings) -> Self {
        let mut http = HttpConnector::new();
        // The TLS layer decides the scheme
        http.enforce_http(false);

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(settings.pool_idle_timeout_secs))
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .build(connector);

        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(&ClientSettings::default())
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request<Bytes>) -> TransportFuture {
        let client = self.client.clone();

        Box::pin(async move {
            validate_request(&request)?;

            debug!("Sending {} {}", request.method(), request.uri());

            let response = client.request(request.map(Full::new)).await.map_err(|e| {
                warn!("Request failed: {e:?}");
                TransportError::Connect(e.to_string())
            })?;

            Ok(response.map(|body| body.map_err(BoxError::from).boxed_unsync()))
        })
    }
}

/// Check that the connector can carry a request
fn validate_request(request: &Request<Bytes>) -> Result<(), TransportError> {
    let uri = request.uri();

    match uri.scheme_str() {
        Some("http" | "https") => {}
        Some(other) => {
            return Err(TransportError::Build(format!(
                "Unsupported scheme '{other}' in {uri}"
            )))
        }
        None => return Err(TransportError::Build(format!("Missing scheme in {uri}"))),
    }

    if uri.authority().is_none() {
        return Err(TransportError::Build(format!("Missing host in {uri}")));
    }

    Ok(())
}

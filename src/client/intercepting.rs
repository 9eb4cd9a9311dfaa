//! Client that routes requests through installed protocol handlers

use std::sync::Arc;

use bytes::Bytes;
use hyper::Request;
use tracing::debug;

use super::ClientConfig;
use crate::transport::{Transport, TransportFuture};

/// Wraps a transport and offers every request to the configured handlers
///
/// Handlers re-issue claimed requests through the wrapped transport, not
/// through this client. The client is itself a [`Transport`], so it can be
/// nested or handed to code expecting one.
///
/// A recorded response's fixture is written only once its body has been
/// read to the end. Dropping the response, or its body, before that
/// cancels the recording and no result is delivered.
pub struct InterceptingClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl InterceptingClient {
    /// Build a client from a configuration and the transport to wrap
    pub fn new<T: Transport>(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    /// Configuration this client was built from
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Transport for InterceptingClient {
    fn send(&self, request: Request<Bytes>) -> TransportFuture {
        match self.config.handler_for(&request) {
            Some(handler) => {
                debug!("{} claimed {} {}", handler.id(), request.method(), request.uri());
                let request = handler.canonical_request(request);
                handler.start(request, Arc::clone(&self.transport))
            }
            None => self.transport.send(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ProtocolHandler;
    use crate::transport::full_body;
    use http_body_util::BodyExt;
    use hyper::Response;

    struct Echo(&'static str);

    impl Transport for Echo {
        fn send(&self, _request: Request<Bytes>) -> TransportFuture {
            let body = self.0;
            Box::pin(async move { Ok(Response::new(full_body(body))) })
        }
    }

    /// Claims `/claimed` and answers without touching the transport
    struct Shortcut;

    impl ProtocolHandler for Shortcut {
        fn id(&self) -> &str {
            "shortcut"
        }

        fn can_handle(&self, request: &Request<Bytes>) -> bool {
            request.uri().path() == "/claimed"
        }

        fn start(&self, _request: Request<Bytes>, _transport: Arc<dyn Transport>) -> TransportFuture {
            Box::pin(async { Ok(Response::new(full_body("handled"))) })
        }
    }

    async fn body_of(client: &InterceptingClient, uri: &str) -> Bytes {
        let request = Request::builder().uri(uri).body(Bytes::new()).unwrap();
        let response = client.send(request).await.unwrap();
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_routes_to_handler_or_transport() {
        let mut config = ClientConfig::persistent();
        config.install(Arc::new(Shortcut));
        let client = InterceptingClient::new(config, Echo("network"));

        assert_eq!(&body_of(&client, "http://h/claimed").await[..], b"handled");
        assert_eq!(&body_of(&client, "http://h/other").await[..], b"network");
    }

    #[tokio::test]
    async fn test_without_handlers_passes_through() {
        let client = InterceptingClient::new(ClientConfig::ephemeral(), Echo("network"));
        assert_eq!(&body_of(&client, "http://h/claimed").await[..], b"network");
    }
}

//! Fixture recorder protocol handler
//!
//! Claims eligible requests, re-issues them through the wrapped transport
//! with the re-entry marker attached, hands the response head back right
//! away and records the body as the caller reads it.

mod body;

pub use body::RecordingBody;

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::header::HeaderValue;
use hyper::{Request, Response, Uri};
use tracing::{debug, warn};

use crate::client::ProtocolHandler;
use crate::config::Config;
use crate::eligibility::Eligibility;
use crate::error::RecordingError;
use crate::fixture::{DocumentsDir, FixtureResolver};
use crate::recording::{RecordingSession, Registry};
use crate::transport::{Transport, TransportError, TransportFuture};
use crate::Result;

/// Handler id used to keep installation idempotent
pub const RECORDER_ID: &str = "jsontape.fixture-recorder";

/// Records JSON responses as fixture files
pub struct FixtureRecorder {
    eligibility: Eligibility,
    resolver: Arc<FixtureResolver>,
    registry: Arc<Registry>,
}

impl FixtureRecorder {
    /// Create a recorder with the default eligibility rules
    #[must_use]
    pub fn new(registry: Arc<Registry>, resolver: FixtureResolver) -> Self {
        Self {
            eligibility: Eligibility::default(),
            resolver: Arc::new(resolver),
            registry,
        }
    }

    /// Create a recorder from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configured marker header or accept value is invalid
    pub fn from_config(config: &Config, registry: Arc<Registry>) -> Result<Self> {
        let documents = config
            .fixtures_dir
            .clone()
            .map_or(DocumentsDir::UserDocuments, DocumentsDir::Fixed);

        Ok(Self {
            eligibility: Eligibility::from_config(config)?,
            resolver: Arc::new(FixtureResolver::new(documents)),
            registry,
        })
    }

    /// Replace the eligibility rules
    #[must_use]
    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// Registry results are delivered through
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Eligibility rules in use
    #[must_use]
    pub fn eligibility(&self) -> &Eligibility {
        &self.eligibility
    }

    /// Record one request end to end
    ///
    /// The session is registered immediately. The returned response carries
    /// the session id in its extensions.
    ///
    /// Nothing drives the body on the caller's behalf: the fixture is
    /// written, and a result delivered, only after the caller reads the body
    /// to its end. A caller that checks `status()` and drops the response
    /// cancels the session silently.
    pub fn record(&self, mut request: Request<Bytes>, transport: &dyn Transport) -> TransportFuture {
        let uri = request.uri().clone();
        request
            .headers_mut()
            .insert(self.eligibility.marker().clone(), HeaderValue::from_static("1"));

        let session = RecordingSession::start(
            Arc::clone(&self.registry),
            Arc::clone(&self.resolver),
            uri.clone(),
        );
        debug!("{} recording {} {}", session.id(), request.method(), uri);

        let pending = transport.send(request);

        Box::pin(async move {
            // Dropping this future drops the session, which cancels it
            let session = session;

            let response = match pending.await {
                Ok(response) => response,
                Err(error) => {
                    session.fail(transport_failure(&uri, &error));
                    return Err(error);
                }
            };

            let id = session.id();
            let (mut parts, body) = response.into_parts();
            parts.extensions.insert(id);

            if !parts.status.is_success() {
                warn!("{} got status {} from {}", id, parts.status, uri);
                session.fail(RecordingError::UnableToGetSuccessfulResponse {
                    uri: uri.to_string(),
                    status: parts.status.as_u16(),
                });
                return Ok(Response::from_parts(parts, body));
            }

            let body = RecordingBody::new(body, session).boxed_unsync();
            Ok(Response::from_parts(parts, body))
        })
    }
}

impl ProtocolHandler for FixtureRecorder {
    fn id(&self) -> &str {
        RECORDER_ID
    }

    fn can_handle(&self, request: &Request<Bytes>) -> bool {
        self.eligibility.check(request)
    }

    fn start(&self, request: Request<Bytes>, transport: Arc<dyn Transport>) -> TransportFuture {
        self.record(request, transport.as_ref())
    }
}

fn transport_failure(uri: &Uri, error: &TransportError) -> RecordingError {
    match error {
        TransportError::Build(reason) => RecordingError::UnableToStartLoadingRequest {
            uri: uri.to_string(),
            reason: reason.clone(),
        },
        TransportError::Connect(reason) => RecordingError::FailedToConnect {
            uri: uri.to_string(),
            reason: reason.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::recording::SessionId;
    use crate::transport::full_body;
    use hyper::header::ACCEPT;
    use hyper::StatusCode;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replies with a fixed status and body, remembering the last request
    struct CannedTransport {
        status: StatusCode,
        body: &'static [u8],
        seen: Mutex<Option<Request<Bytes>>>,
    }

    impl CannedTransport {
        fn new(status: StatusCode, body: &'static [u8]) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(None),
            }
        }
    }

    impl Transport for CannedTransport {
        fn send(&self, request: Request<Bytes>) -> TransportFuture {
            *self.seen.lock().unwrap() = Some(request);
            let response = Response::builder()
                .status(self.status)
                .body(full_body(self.body))
                .unwrap();
            Box::pin(async move { Ok(response) })
        }
    }

    struct RefusingTransport(TransportError);

    impl Transport for RefusingTransport {
        fn send(&self, _request: Request<Bytes>) -> TransportFuture {
            let error = self.0.clone();
            Box::pin(async move { Err(error) })
        }
    }

    fn recorder(dir: &TempDir) -> FixtureRecorder {
        FixtureRecorder::new(
            Arc::new(Registry::new()),
            FixtureResolver::new(DocumentsDir::Fixed(dir.path().to_path_buf())),
        )
    }

    fn json_request(uri: &str) -> Request<Bytes> {
        Request::builder()
            .uri(uri)
            .header(ACCEPT, "application/json")
            .body(Bytes::new())
            .unwrap()
    }

    #[tokio::test]
    async fn test_marker_attached_to_reissued_request() {
        let dir = TempDir::new().unwrap();
        let recorder = recorder(&dir);
        let transport = CannedTransport::new(StatusCode::OK, b"{}");

        let response = recorder
            .record(json_request("https://host/posts"), &transport)
            .await
            .unwrap();
        response.into_body().collect().await.unwrap();

        let seen = transport.seen.lock().unwrap().take().unwrap();
        assert!(seen.headers().contains_key(recorder.eligibility().marker()));
        assert!(!recorder.can_handle(&seen));
    }

    #[tokio::test]
    async fn test_success_records_body() {
        let dir = TempDir::new().unwrap();
        let recorder = recorder(&dir);
        let transport = CannedTransport::new(StatusCode::OK, b"{\"a\":1}");

        let response = recorder
            .record(json_request("https://host/path/posts"), &transport)
            .await
            .unwrap();
        let id = *response.extensions().get::<SessionId>().unwrap();
        let waiter = recorder.registry().watch(id).unwrap();

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"{\"a\":1}");

        let result = waiter.await.unwrap();
        let path = dir.path().join("posts.json");
        assert_eq!(result.path(), Some(path.as_path()));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_error_status_not_recorded() {
        let dir = TempDir::new().unwrap();
        let recorder = recorder(&dir);
        let mut rx = recorder.registry().listen();
        let transport = CannedTransport::new(StatusCode::NOT_FOUND, b"{\"error\":1}");

        let response = recorder
            .record(json_request("https://host/posts"), &transport)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Body still reaches the caller untouched
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"{\"error\":1}");

        let result = rx.recv().await.unwrap();
        assert_eq!(
            result.error().map(RecordingError::kind),
            Some(FailureKind::UnableToGetSuccessfulResponse)
        );
        assert!(!dir.path().join("posts.json").exists());
    }

    #[tokio::test]
    async fn test_transport_errors_mapped() {
        let dir = TempDir::new().unwrap();
        let recorder = recorder(&dir);
        let mut rx = recorder.registry().listen();

        let refused = RefusingTransport(TransportError::Connect("refused".to_string()));
        let err = recorder
            .record(json_request("https://host/posts"), &refused)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::Connect(_)));
        let result = rx.recv().await.unwrap();
        assert_eq!(
            result.error().map(RecordingError::kind),
            Some(FailureKind::FailedToConnect)
        );

        let unbuildable = RefusingTransport(TransportError::Build("bad uri".to_string()));
        recorder
            .record(json_request("https://host/posts"), &unbuildable)
            .await
            .err()
            .unwrap();
        let result = rx.recv().await.unwrap();
        assert_eq!(
            result.error().map(RecordingError::kind),
            Some(FailureKind::UnableToStartLoadingRequest)
        );

        assert_eq!(recorder.registry().in_flight(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_future_cancels_session() {
        let dir = TempDir::new().unwrap();
        let recorder = recorder(&dir);
        let mut rx = recorder.registry().listen();
        let transport = CannedTransport::new(StatusCode::OK, b"{}");

        let pending = recorder.record(json_request("https://host/posts"), &transport);
        assert_eq!(recorder.registry().in_flight(), 1);
        drop(pending);

        assert_eq!(recorder.registry().in_flight(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_from_config_uses_fixtures_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            fixtures_dir: Some(dir.path().to_path_buf()),
            accept: "application/vnd.api+json".to_string(),
            ..Config::default()
        };

        let recorder = FixtureRecorder::from_config(&config, Arc::new(Registry::new())).unwrap();
        assert_eq!(
            recorder.resolver.documents(),
            &DocumentsDir::Fixed(dir.path().to_path_buf())
        );
        assert!(!recorder.can_handle(&json_request("https://host/posts")));
    }
}

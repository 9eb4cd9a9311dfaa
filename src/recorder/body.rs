//! Response body that tees data into a recording session

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use hyper::body::{Body, Frame, SizeHint};

use crate::error::RecordingError;
use crate::recording::RecordingSession;
use crate::transport::{BoxError, TransportBody};

/// Forwards every frame to the caller while buffering data frames
///
/// The session completes when the inner body ends and fails if the inner
/// body errors. Dropping the body before its end cancels the session.
pub struct RecordingBody {
    inner: TransportBody,
    session: Option<RecordingSession>,
}

impl RecordingBody {
    /// Wrap a transport body
    #[must_use]
    pub fn new(inner: TransportBody, session: RecordingSession) -> Self {
        Self {
            inner,
            session: Some(session),
        }
    }
}

impl Body for RecordingBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;

        match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let (Some(data), Some(session)) = (frame.data_ref(), this.session.as_mut()) {
                    session.append(data);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(error)) => {
                if let Some(session) = this.session.take() {
                    let uri = session.uri().to_string();
                    session.fail(RecordingError::FailedToConnect {
                        uri,
                        reason: error.to_string(),
                    });
                }
                Poll::Ready(Some(Err(error)))
            }
            None => {
                if let Some(session) = this.session.take() {
                    session.complete();
                }
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        // Keep reporting "not ended" until the session has seen the end
        self.session.is_none() && self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

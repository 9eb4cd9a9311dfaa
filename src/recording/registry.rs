//! Registry of in-flight recording sessions
//!
//! Every session moves `Pending -> Delivered` or `Pending -> Cancelled`
//! exactly once. Both transitions remove the entry from the map first, so
//! an entry present in the map has never been delivered and a removed entry
//! can never be delivered again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use dashmap::DashMap;
use hyper::Uri;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::result::{RecordingResult, SessionId};

/// Callback receiving every delivered result
pub type Listener = Arc<dyn Fn(&RecordingResult) + Send + Sync>;

struct PendingSession {
    uri: String,
    started_at: Instant,
    waiter: Option<oneshot::Sender<RecordingResult>>,
}

/// Tracks pending sessions and brokers their results
pub struct Registry {
    sessions: DashMap<SessionId, PendingSession>,
    listener: RwLock<Option<Listener>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Create an empty registry with no listener
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            listener: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register the listener, replacing any previous one
    pub fn set_listener<F>(&self, listener: F)
    where
        F: Fn(&RecordingResult) + Send + Sync + 'static,
    {
        let mut slot = self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(listener));
    }

    /// Register a listener that forwards results into a channel
    ///
    /// Replaces any previous listener. Results are dropped once the
    /// receiver is gone.
    pub fn listen(&self) -> mpsc::UnboundedReceiver<RecordingResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.set_listener(move |result| {
            tx.send(result.clone()).ok();
        });
        rx
    }

    /// Start tracking a new session
    pub fn begin(&self, uri: &Uri) -> SessionId {
        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.sessions.insert(
            id,
            PendingSession {
                uri: uri.to_string(),
                started_at: Instant::now(),
                waiter: None,
            },
        );

        debug!("Started {} for {}", id, uri);
        id
    }

    /// Wait for the result of a pending session
    ///
    /// Returns `None` if the session is not pending. A later call replaces
    /// the waiter of an earlier one.
    pub fn watch(&self, id: SessionId) -> Option<oneshot::Receiver<RecordingResult>> {
        let mut entry = self.sessions.get_mut(&id)?;
        let (tx, rx) = oneshot::channel();
        entry.waiter = Some(tx);
        Some(rx)
    }

    /// Deliver the result of a pending session
    ///
    /// Invokes the listener and the session waiter. Returns `false` without
    /// delivering if the session is not pending.
    pub fn deliver(&self, result: RecordingResult) -> bool {
        let Some((_, session)) = self.sessions.remove(&result.session) else {
            warn!("Dropping result for {}: session not pending", result.session);
            return false;
        };

        info!(
            "Delivered {} for {} after {:?}",
            result.session,
            session.uri,
            session.started_at.elapsed()
        );

        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match listener {
            Some(listener) => listener(&result),
            None => debug!("No listener registered for {}", result.session),
        }

        if let Some(waiter) = session.waiter {
            waiter.send(result).ok();
        }

        true
    }

    /// Abandon a pending session without delivering anything
    ///
    /// Returns `false` if the session is not pending.
    pub fn cancel(&self, id: SessionId) -> bool {
        match self.sessions.remove(&id) {
            Some((_, session)) => {
                debug!("Cancelled {} for {}", id, session.uri);
                true
            }
            None => false,
        }
    }

    /// Check whether a session is pending
    #[must_use]
    pub fn is_pending(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Number of pending sessions
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordingError;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    fn uri() -> Uri {
        "https://host/path/posts".parse().unwrap()
    }

    #[test]
    fn test_unique_ids_for_same_uri() {
        let registry = Registry::new();

        let first = registry.begin(&uri());
        let second = registry.begin(&uri());

        assert_ne!(first, second);
        assert_eq!(registry.in_flight(), 2);
    }

    #[test]
    fn test_deliver_once() {
        let registry = Registry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        registry.set_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let id = registry.begin(&uri());
        assert!(registry.is_pending(id));

        let result = RecordingResult::success(id, "u", PathBuf::from("/docs/posts.json"));
        assert!(registry.deliver(result.clone()));
        assert!(!registry.is_pending(id));
        assert!(!registry.deliver(result));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn test_deliver_without_listener() {
        let registry = Registry::new();
        let id = registry.begin(&uri());

        let error = RecordingError::NoLastPathSegment { uri: "u".to_string() };
        assert!(registry.deliver(RecordingResult::failure(id, "u", error)));
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn test_listener_replaced() {
        let registry = Registry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        registry.set_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&second);
        registry.set_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let id = registry.begin(&uri());
        registry.deliver(RecordingResult::success(id, "u", PathBuf::from("/p.json")));

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_skips_listener() {
        let registry = Registry::new();
        let mut rx = registry.listen();

        let id = registry.begin(&uri());
        assert!(registry.cancel(id));
        assert!(!registry.cancel(id));
        assert!(!registry.deliver(RecordingResult::success(id, "u", PathBuf::from("/p.json"))));

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_watch_and_listen() {
        let registry = Registry::new();
        let mut rx = registry.listen();

        let id = registry.begin(&uri());
        let waiter = registry.watch(id).unwrap();

        let result = RecordingResult::success(id, "u", PathBuf::from("/docs/posts.json"));
        registry.deliver(result.clone());

        assert_eq!(waiter.await.unwrap(), result);
        assert_eq!(rx.recv().await.unwrap(), result);
        assert!(registry.watch(id).is_none());
    }
}

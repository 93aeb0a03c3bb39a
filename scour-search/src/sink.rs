//! Delivery of search events to client sessions.
//!
//! [`ResultSink`] is the boundary to the transport. Delivery is
//! fire-and-forget: an unknown or closed session makes delivery a silent
//! no-op, and nothing is ever reported back into the job that produced the
//! event.

use crate::types::{SearchEvent, SessionId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

/// Receives typed events for a search and forwards them to a session.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Deliver `event` to `session`. Must not fail and must not block
    /// indefinitely.
    async fn deliver(&self, session: &SessionId, event: SearchEvent);
}

/// Channel-backed sink keyed by session.
///
/// Each registered session owns a bounded `mpsc` channel; the transport
/// drains the receiver. Many jobs may deliver to one session at once and
/// the channel serialises them. A full channel is waited on for at most
/// `delivery_timeout`, after which the event is dropped.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, mpsc::Sender<SearchEvent>>>,
    delivery_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            delivery_timeout,
        }
    }

    /// Register `session` and return the receiving end of its channel.
    ///
    /// Registering an existing session replaces its channel; the previous
    /// receiver sees the channel close.
    pub async fn register(&self, session: SessionId, capacity: usize) -> mpsc::Receiver<SearchEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let replaced = self.sessions.write().await.insert(session.clone(), tx);
        if replaced.is_some() {
            tracing::warn!(%session, "session re-registered; previous channel closed");
        }
        rx
    }

    /// Forget `session`. Later deliveries to it become no-ops.
    pub async fn unregister(&self, session: &SessionId) {
        self.sessions.write().await.remove(session);
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl ResultSink for SessionRegistry {
    async fn deliver(&self, session: &SessionId, event: SearchEvent) {
        // Clone the sender so the lock is not held while waiting on the channel.
        let sender = self.sessions.read().await.get(session).cloned();
        let Some(sender) = sender else {
            tracing::trace!(%session, "delivery to unknown session dropped");
            return;
        };

        match sender.send_timeout(event, self.delivery_timeout).await {
            Ok(()) => {}
            Err(mpsc::error::SendTimeoutError::Closed(_)) => {
                tracing::trace!(%session, "delivery to closed session dropped");
            }
            Err(mpsc::error::SendTimeoutError::Timeout(_)) => {
                tracing::warn!(
                    %session,
                    timeout_ms = self.delivery_timeout.as_millis() as u64,
                    "session channel full; event dropped"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_error(message: &str) -> SearchEvent {
        SearchEvent::SessionError {
            message: message.into(),
        }
    }

    #[tokio::test]
    async fn delivers_to_registered_session() {
        let registry = SessionRegistry::new(Duration::from_millis(100));
        let session = SessionId::new("s1");
        let mut rx = registry.register(session.clone(), 4).await;

        registry.deliver(&session, session_error("hello")).await;
        assert_eq!(rx.recv().await, Some(session_error("hello")));
    }

    #[tokio::test]
    async fn unknown_session_is_noop() {
        let registry = SessionRegistry::new(Duration::from_millis(100));
        registry
            .deliver(&SessionId::new("missing"), session_error("dropped"))
            .await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn closed_receiver_is_noop() {
        let registry = SessionRegistry::new(Duration::from_millis(100));
        let session = SessionId::new("s1");
        let rx = registry.register(session.clone(), 4).await;
        drop(rx);
        registry.deliver(&session, session_error("dropped")).await;
    }

    #[tokio::test]
    async fn unregistered_session_receives_nothing() {
        let registry = SessionRegistry::new(Duration::from_millis(100));
        let session = SessionId::new("s1");
        let mut rx = registry.register(session.clone(), 4).await;
        registry.unregister(&session).await;

        registry.deliver(&session, session_error("dropped")).await;
        // The registry held the only sender, so the channel is now closed.
        assert_eq!(rx.recv().await, None);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn full_channel_times_out_instead_of_blocking() {
        let registry = SessionRegistry::new(Duration::from_millis(20));
        let session = SessionId::new("s1");
        let mut rx = registry.register(session.clone(), 1).await;

        registry.deliver(&session, session_error("first")).await;
        registry.deliver(&session, session_error("second")).await;

        assert_eq!(rx.recv().await, Some(session_error("first")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_deliveries_all_arrive() {
        let registry = std::sync::Arc::new(SessionRegistry::new(Duration::from_secs(1)));
        let session = SessionId::new("s1");
        let mut rx = registry.register(session.clone(), 64).await;

        let mut tasks = Vec::new();
        for i in 0..20 {
            let registry = std::sync::Arc::clone(&registry);
            let session = session.clone();
            tasks.push(tokio::spawn(async move {
                registry.deliver(&session, session_error(&format!("m{i}"))).await;
            }));
        }
        for task in tasks {
            task.await.expect("task should not panic");
        }

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 20);
    }
}

//! Notification sinks
//!
//! The service reports changes through a [`NotificationSink`]. The server wires
//! in a [`ListenerHub`] that fans events out to connected websocket clients; the
//! CLI uses [`NullSink`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::types::TaskEvent;

/// Receives task events; delivery is best-effort and never blocks
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: TaskEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, event: TaskEvent) {
        debug!(event_type = event.event_type(), "NullSink::notify: dropped");
    }
}

/// Opaque handle of one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Events queued per listener before it counts as stalled
pub const DEFAULT_LISTENER_CAPACITY: usize = 256;

/// Registry of live listeners keyed by [`ListenerId`]
///
/// Each listener has a bounded queue. A listener whose queue is full or whose
/// receiving half is gone is removed on the next event.
pub struct ListenerHub {
    listeners: Mutex<HashMap<ListenerId, mpsc::Sender<TaskEvent>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Default for ListenerHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LISTENER_CAPACITY)
    }
}

impl ListenerHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Register a listener and get the stream of events it will receive
    pub fn register(&self) -> (ListenerId, mpsc::Receiver<TaskEvent>) {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, tx);
            debug!(%id, count = listeners.len(), "ListenerHub::register: registered");
        }
        (id, rx)
    }

    /// Remove a listener; unknown IDs are ignored
    pub fn unregister(&self, id: ListenerId) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.remove(&id);
            debug!(%id, count = listeners.len(), "ListenerHub::unregister: removed");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl NotificationSink for ListenerHub {
    fn notify(&self, event: TaskEvent) {
        let Ok(mut listeners) = self.listeners.lock() else {
            warn!("ListenerHub::notify: registry lock poisoned, event dropped");
            return;
        };
        debug!(
            event_type = event.event_type(),
            task_id = event.task_id(),
            count = listeners.len(),
            "ListenerHub::notify: fanning out"
        );
        listeners.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(%id, "ListenerHub::notify: listener stalled, dropping");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%id, "ListenerHub::notify: listener gone, dropping");
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(step: &str) -> TaskEvent {
        TaskEvent::StepUpdate {
            task_id: "task".to_string(),
            step_id: step.to_string(),
            done: true,
            timestamp: 1,
        }
    }

    #[tokio::test]
    async fn test_all_listeners_receive_events() {
        let hub = ListenerHub::new();
        let (_a, mut rx_a) = hub.register();
        let (_b, mut rx_b) = hub.register();

        hub.notify(event("s1"));

        assert_eq!(rx_a.recv().await, Some(event("s1")));
        assert_eq!(rx_b.recv().await, Some(event("s1")));
    }

    #[tokio::test]
    async fn test_unregistered_listener_gets_nothing() {
        let hub = ListenerHub::new();
        let (a, mut rx_a) = hub.register();
        hub.unregister(a);
        assert_eq!(hub.listener_count(), 0);

        hub.notify(event("s1"));
        // sender side was dropped with the registration
        assert_eq!(rx_a.recv().await, None);
    }

    #[test]
    fn test_failed_listener_is_dropped() {
        let hub = ListenerHub::new();
        let (_a, rx_a) = hub.register();
        let (_b, _rx_b) = hub.register();
        drop(rx_a);

        hub.notify(event("s1"));
        assert_eq!(hub.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_stalled_listener_is_dropped_at_capacity() {
        let hub = ListenerHub::with_capacity(2);
        let (_slow, mut rx_slow) = hub.register();
        let (_fast, mut rx_fast) = hub.register();

        for step in ["s1", "s2"] {
            hub.notify(event(step));
            assert_eq!(rx_fast.recv().await, Some(event(step)));
        }
        assert_eq!(hub.listener_count(), 2);

        // the slow listener never drained, so its queue is full
        hub.notify(event("s3"));
        assert_eq!(hub.listener_count(), 1);
        assert_eq!(rx_fast.recv().await, Some(event("s3")));

        // what was queued before the drop is still delivered, then the stream ends
        assert_eq!(rx_slow.recv().await, Some(event("s1")));
        assert_eq!(rx_slow.recv().await, Some(event("s2")));
        assert_eq!(rx_slow.recv().await, None);
    }

    #[test]
    fn test_ids_are_distinct() {
        let hub = ListenerHub::new();
        let (a, _ra) = hub.register();
        let (b, _rb) = hub.register();
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_null_sink_accepts_events() {
        NullSink.notify(event("s1"));
    }
}

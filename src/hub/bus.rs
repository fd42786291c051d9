use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::hub::event::{EventKind, HubEvent};
use crate::lifecycle::LifecycleStatus;

/// Opaque handle for one connected observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The receiving end handed to an observer on subscribe.
///
/// The first event is always the status current at subscribe time. The
/// stream ends when the observer is unsubscribed or evicted.
#[derive(Debug)]
pub struct Subscription {
    id: ObserverId,
    receiver: mpsc::Receiver<HubEvent>,
}

impl Subscription {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<HubEvent> {
        self.receiver.recv().await
    }

    /// Next already-queued event, without waiting.
    pub fn try_recv(&mut self) -> Option<HubEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Observer registry with non-blocking fan-out.
///
/// Each observer owns a bounded queue. Publishing never waits: an observer
/// whose queue is full is evicted (its stream ends) and one whose receiver
/// is gone is dropped, and in both cases delivery to the others continues.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
    queue_size: usize,
}

struct BusInner {
    observers: HashMap<ObserverId, mpsc::Sender<HubEvent>>,
    next_seq: u64,
    status: LifecycleStatus,
}

impl BusInner {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

impl EventBus {
    /// `queue_size` is clamped to at least 1.
    pub fn new(queue_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                observers: HashMap::new(),
                next_seq: 0,
                status: LifecycleStatus::Stopped,
            })),
            queue_size: queue_size.max(1),
        }
    }

    /// Register a new observer. The current status is queued as its first
    /// event under the same lock, so no transition can slip in between.
    pub fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::channel(self.queue_size);
        let id = ObserverId::new();

        let mut inner = self.inner.lock();
        let seq = inner.next_seq();
        let snapshot = HubEvent {
            seq,
            kind: EventKind::StatusChanged {
                status: inner.status,
                exit_code: None,
            },
        };
        // A fresh queue always has room for one event.
        let _ = tx.try_send(snapshot);
        inner.observers.insert(id, tx);
        let count = inner.observers.len();
        drop(inner);

        tracing::debug!(observer = %id, observers = count, "Observer subscribed");
        Subscription { id, receiver }
    }

    /// Deliver an event to every observer. Returns its sequence number.
    pub fn publish(&self, kind: EventKind) -> u64 {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq();
        if let EventKind::StatusChanged { status, .. } = &kind {
            inner.status = *status;
        }
        let event = HubEvent { seq, kind };

        inner.observers.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(observer = %id, "Observer queue full, disconnecting");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(observer = %id, "Observer gone, removing");
                false
            }
        });
        seq
    }

    /// Remove an observer. Unknown or already-removed ids are a no-op.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let removed = self.inner.lock().observers.remove(&id).is_some();
        if removed {
            tracing::debug!(observer = %id, "Observer unsubscribed");
        }
        removed
    }

    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    /// Last status published on this bus.
    pub fn current_status(&self) -> LifecycleStatus {
        self.inner.lock().status
    }
}

//! The event bus: the asynchronous surface by which host application code learns
//! about session lifecycle transitions and inbound messages.

use engineio_client::Batch;
use tokio::sync::broadcast;

use crate::types::ClientId;

/// Default capacity of each session's event channel. Generous enough that a host task
/// which is briefly busy won't cause `ReceivedMessage` events to be dropped under
/// normal polling cadences; a lagging subscriber still gets `RecvError::Lagged` from
/// `broadcast`, which is surfaced rather than silently swallowed.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One lifecycle or data event posted by a session.
///
/// `batch` carries the packets received in the triggering HTTP response, where
/// applicable; it is `None` for purely internal transitions like `Disconnected`.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub client_id: ClientId,
    pub kind: EventKind,
    pub batch: Option<Batch>,
}

impl SessionEvent {
    pub fn len(&self) -> usize {
        self.batch.as_ref().map_or(0, |b| b.len())
    }
}

/// Which lifecycle transition or inbound-data event occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Ready,
    Connected,
    ReceivedMessage,
    ConnectError,
    UpgradeTransportError,
    Disconnected,
}

/// A per-session broadcast bus. Subscribers receive every event posted after they
/// subscribe; a `ReceivedMessage` event's batch is cloned to each subscriber since
/// `broadcast` requires `Clone` payloads and there is no single designated owner.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Post an event. Returns the number of subscribers it was delivered to; posting
    /// with zero subscribers is not an error (the host may not be listening yet).
    pub fn post(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;
use crate::error::RelayError;

/// Frames a peer may have waiting before further broadcasts to it are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Outbound text frames queued for one connection.
pub type Outbound = mpsc::Receiver<Arc<str>>;

/// Handle to a single live connection.
///
/// Each handle gets a fresh id when the connection is accepted; equality and
/// hashing use that id only, so two clones of one handle are the same peer and
/// two different connections never are. Sending fails once the receiving half
/// has been dropped by the transport, or while the queue is full.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    id: Uuid,
    tx: mpsc::Sender<Arc<str>>,
}

impl PeerHandle {
    pub fn new() -> (Self, Outbound) {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, Outbound) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id: Uuid::new_v4(), tx }, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queues `text` without waiting. A slow reader loses the frame rather
    /// than stalling the sender.
    pub fn send_text(&self, text: Arc<str>) -> Result<(), RelayError> {
        self.tx.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => RelayError::QueueFull(self.id),
            TrySendError::Closed(_) => RelayError::PeerGone(self.id),
        })
    }
}

impl PartialEq for PeerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PeerHandle {}

impl Hash for PeerHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

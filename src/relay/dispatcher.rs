use std::sync::Arc;
use tracing::{debug, error};
use crate::error::RelayError;
use super::peer::PeerHandle;
use super::protocol::ServerMessage;
use super::registry::RoomRegistry;

/// Fans a message out to every member of a room except its sender.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<RoomRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Serializes `message` once and queues it for each recipient. Peers
    /// whose transport is already gone, or whose queue is full, are skipped. Returns how many peers
    /// the message was handed to.
    pub fn broadcast(&self, room_id: &str, message: &ServerMessage, sender: &PeerHandle) -> usize {
        let text = match encode(message) {
            Ok(text) => text,
            Err(e) => {
                error!("Dropping broadcast to room {}: {}", room_id, e);
                return 0;
            }
        };

        let mut delivered = 0;
        for peer in self.registry.members_except(room_id, sender) {
            match peer.send_text(text.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Skipping peer in room {}: {}", room_id, e),
            }
        }
        delivered
    }
}

fn encode(message: &ServerMessage) -> Result<Arc<str>, RelayError> {
    Ok(serde_json::to_string(message)?.into())
}

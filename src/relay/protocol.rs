use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_ROOM_ID_LEN: usize = 64;

/// Messages a browser peer sends to the relay.
///
/// `payload` is never inspected; a missing payload decodes as `null` and is
/// forwarded that way.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Join {
        #[serde(rename = "roomId", default)]
        room_id: Option<String>,
    },
    Offer {
        #[serde(default)]
        payload: Value,
    },
    Answer {
        #[serde(default)]
        payload: Value,
    },
    Ice {
        #[serde(default)]
        payload: Value,
    },
}

/// Messages the relay delivers to peers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    PeerJoined,
    PeerLeft,
    Offer { payload: Value },
    Answer { payload: Value },
    Ice { payload: Value },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::Offer { .. } => "offer",
            ClientMessage::Answer { .. } => "answer",
            ClientMessage::Ice { .. } => "ice",
        }
    }

    /// The message to forward to the rest of the room, if this is a signal.
    pub fn into_signal(self) -> Option<ServerMessage> {
        match self {
            ClientMessage::Join { .. } => None,
            ClientMessage::Offer { payload } => Some(ServerMessage::Offer { payload }),
            ClientMessage::Answer { payload } => Some(ServerMessage::Answer { payload }),
            ClientMessage::Ice { payload } => Some(ServerMessage::Ice { payload }),
        }
    }
}

/// A room id is 1 to 64 characters drawn from `[A-Za-z0-9_-]`.
pub fn is_valid_room_id(room_id: &str) -> bool {
    (1..=MAX_ROOM_ID_LEN).contains(&room_id.len())
        && room_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

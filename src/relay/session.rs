use tokio::task::JoinHandle;
use tracing::{debug, info};
use super::dispatcher::Dispatcher;
use super::peer::PeerHandle;
use super::protocol::{is_valid_room_id, ClientMessage, ServerMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unjoined,
    Joined(String),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    Malformed,
    InvalidRoomId,
    NotJoined,
    AlreadyJoined,
    Closed,
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Joined { room_id: String, notified: usize },
    Relayed { kind: &'static str, delivered: usize },
    Discarded(DiscardReason),
}

/// Protocol state for one connection.
///
/// A session joins at most one room for its whole life. Only `offer`,
/// `answer` and `ice` are relayed, and only once joined; everything else is
/// dropped without a reply.
pub struct Session {
    peer: PeerHandle,
    dispatcher: Dispatcher,
    state: SessionState,
}

impl Session {
    pub fn new(peer: PeerHandle, dispatcher: Dispatcher) -> Self {
        Self {
            peer,
            dispatcher,
            state: SessionState::Unjoined,
        }
    }

    pub fn peer(&self) -> &PeerHandle {
        &self.peer
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn handle_text(&mut self, text: &str) -> Outcome {
        if self.state == SessionState::Closed {
            return Outcome::Discarded(DiscardReason::Closed);
        }

        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                debug!("Dropping malformed message from {}: {}", self.peer.id(), e);
                Outcome::Discarded(DiscardReason::Malformed)
            }
        }
    }

    pub fn handle_message(&mut self, message: ClientMessage) -> Outcome {
        let room_id = match self.state {
            SessionState::Closed => return Outcome::Discarded(DiscardReason::Closed),
            SessionState::Unjoined => {
                return match message {
                    ClientMessage::Join { room_id: Some(room_id) } if is_valid_room_id(&room_id) => {
                        self.join(room_id)
                    }
                    ClientMessage::Join { .. } => Outcome::Discarded(DiscardReason::InvalidRoomId),
                    _ => Outcome::Discarded(DiscardReason::NotJoined),
                };
            }
            SessionState::Joined(ref room_id) => room_id,
        };

        let kind = message.kind();
        match message.into_signal() {
            Some(signal) => {
                let delivered = self.dispatcher.broadcast(room_id, &signal, &self.peer);
                Outcome::Relayed { kind, delivered }
            }
            None => Outcome::Discarded(DiscardReason::AlreadyJoined),
        }
    }

    fn join(&mut self, room_id: String) -> Outcome {
        self.dispatcher.registry().join(&room_id, &self.peer);
        let notified = self
            .dispatcher
            .broadcast(&room_id, &ServerMessage::PeerJoined, &self.peer);
        info!("Peer {} joined room {} ({} notified)", self.peer.id(), room_id, notified);

        self.state = SessionState::Joined(room_id.clone());
        Outcome::Joined { room_id, notified }
    }

    /// Leaves the current room and spawns the `peer-left` notice. The
    /// returned task is detached by callers; teardown never waits on it.
    /// Calling this more than once is a no-op.
    pub fn close(&mut self) -> Option<JoinHandle<usize>> {
        let previous = std::mem::replace(&mut self.state, SessionState::Closed);
        let SessionState::Joined(room_id) = previous else {
            return None;
        };

        self.dispatcher.registry().leave(&room_id, &self.peer);
        info!("Peer {} left room {}", self.peer.id(), room_id);

        let dispatcher = self.dispatcher.clone();
        let peer = self.peer.clone();
        Some(tokio::spawn(async move {
            dispatcher.broadcast(&room_id, &ServerMessage::PeerLeft, &peer)
        }))
    }
}

//! Room signalling relay for LiteShare
//!
//! Peers join a named room over a WebSocket and the relay fans their
//! offers, answers and ICE candidates out to everyone else in that room.

mod dispatcher;
mod peer;
pub mod protocol;
mod registry;
mod session;
mod transport;

pub use dispatcher::Dispatcher;
pub use peer::{Outbound, PeerHandle, DEFAULT_QUEUE_CAPACITY};
pub use protocol::{is_valid_room_id, ClientMessage, ServerMessage};
pub use registry::RoomRegistry;
pub use session::{DiscardReason, Outcome, Session, SessionState};
pub use transport::{websocket_route, ConnectQuery, WsConnection, MAX_MESSAGE_BYTES};

//! Access control for the relay endpoint
//!
//! A single process-wide token, passed as `?token=` on the WebSocket URL.

mod gate;

pub use gate::AccessGate;

use tracing::warn;
use crate::error::AuthError;

/// Shared-secret check applied to `/ws` before the WebSocket handshake.
#[derive(Debug, Clone)]
pub struct AccessGate {
    token: Option<String>,
}

impl AccessGate {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Value substituted into the index page, empty when the gate is off.
    pub fn client_token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }

    pub fn authorize(&self, presented: Option<&str>, peer_addr: &str) -> Result<(), AuthError> {
        let Some(expected) = self.token.as_deref() else {
            return Ok(());
        };

        match presented {
            Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
            Some(_) => {
                warn!("Rejected connection from {}: token mismatch", peer_addr);
                Err(AuthError::AccessDenied)
            }
            None => {
                warn!("Rejected connection from {}: no token", peer_addr);
                Err(AuthError::AccessDenied)
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

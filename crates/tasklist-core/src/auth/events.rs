//! Notifications from the request path to whoever presents the session.
//!
//! The gateway may drop credentials on its own (bad token, refused refresh).
//! It reports that here instead of navigating anywhere; a front end
//! subscribes and sends the user back to its login entry point.

use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the event channel. Slow subscribers skip to the latest events.
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// The stored access token could not be decoded.
    MalformedToken,
    /// The refresh endpoint refused the refresh token.
    RefreshFailed,
    /// The server rejected a call and there was no refresh token to recover with.
    MissingRefreshToken,
}

impl std::fmt::Display for SignOutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignOutReason::MalformedToken => write!(f, "stored credentials were unreadable"),
            SignOutReason::RefreshFailed => write!(f, "session could not be renewed"),
            SignOutReason::MissingRefreshToken => write!(f, "session expired"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedOut { reason: SignOutReason },
}

#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    pub fn signed_out(&self, reason: SignOutReason) {
        // No subscribers is fine: nothing is presenting the session
        let delivered = self.tx.send(AuthEvent::SignedOut { reason }).unwrap_or(0);
        debug!(%reason, delivered, "Signed-out event emitted");
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

//! Connection lifecycle state machine.

use std::fmt;

/// The lifecycle state of a client's link to the backend.
///
/// ```text
///                connect()             open
/// Disconnected ───────────→ Connecting ─────→ Connected
///      ↑                        │                 │
///      │   dial failed          │                 │ peer closed / read error
///      ├────────────────────────┘                 │
///      ├──────────────────────────────────────────┘
///      │
///      └──── Closing ←──── close() (from any state)
/// ```
///
/// Reconnection is never automatic. Only `Connected` permits sends; every
/// other state fails calls with
/// [`ClientError::NotConnected`](crate::ClientError::NotConnected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

impl ConnectionState {
    /// The boolean view of the state that UI code usually wants.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if moving from `self` to `target` is a legal edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
                | (Closing, Disconnected)
                | (Disconnected | Connecting | Connected, Closing)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Closing => write!(f, "Closing"),
        }
    }
}

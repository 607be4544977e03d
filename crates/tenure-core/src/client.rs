//! Chat-client contract.
//!
//! The messaging platform itself is an external collaborator; the engine only
//! needs the small surface below. The server implements it against the
//! gateway sidecar, tests implement it with an in-memory mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Connection lifecycle of the chat client.
///
/// `Pairing` means a QR code is waiting to be scanned. The engine only reads
/// this to gate removal attempts and chat-channel notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Pairing,
    Authenticated,
    AuthFailure,
    Ready,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Pairing => "pairing",
            ConnectionState::Authenticated => "authenticated",
            ConnectionState::AuthFailure => "auth_failure",
            ConnectionState::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// Connection state plus the current pairing QR, published through a
/// `tokio::sync::watch` channel so the admin surface and the engine observe
/// the same value without ambient globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientStatus {
    pub status: ConnectionState,
    /// Pairing QR code as a data URL, present only while pairing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr: Option<String>,
}

impl ClientStatus {
    pub fn disconnected() -> Self {
        Self {
            status: ConnectionState::Disconnected,
            qr: None,
        }
    }
}

/// A member-joined event as reported by the platform, identities unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEvent {
    pub group_id: String,
    pub member_id: String,
}

/// Operations the engine needs from the messaging platform.
///
/// All calls are expected to be bounded by a timeout on the implementor's
/// side; a timeout surfaces as an ordinary error.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Resolve a raw platform id to the canonical member id.
    async fn resolve_identity(&self, raw_id: &str) -> Result<String>;

    /// Remove a member from a group.
    async fn remove_member(&self, group_id: &str, member_id: &str) -> Result<()>;

    /// Send a text message to a member or group.
    async fn send_message(&self, recipient: &str, text: &str) -> Result<()>;

    /// Current raw member ids of a group, for participant sync.
    async fn group_participants(&self, group_id: &str) -> Result<Vec<String>>;

    /// Current connection state.
    fn connection_state(&self) -> ConnectionState;
}

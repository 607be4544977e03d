//! Error types for tenure-core.

use thiserror::Error;

use crate::client::ConnectionState;
use crate::types::MemberStatus;

/// Result type alias using tenure-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for tenure operations
#[derive(Error, Debug)]
pub enum Error {
    // Store errors
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("No member record at index {0}")]
    NotFound(usize),

    #[error("No record for {member_id} in {group_id}")]
    UnknownMember {
        group_id: String,
        member_id: String,
    },

    #[error("Record for {member_id} in {group_id} is {status}, expected expired")]
    InvalidTransition {
        group_id: String,
        member_id: String,
        status: MemberStatus,
    },

    // Chat client errors
    #[error("Identity resolution failed: {0}")]
    Resolution(String),

    #[error("Removal failed: {0}")]
    Removal(String),

    #[error("Chat client not ready ({0})")]
    NotReady(ConnectionState),

    #[error("Gateway error: {0}")]
    Gateway(String),

    // Notification errors
    #[error("Notification failed: {0}")]
    Notification(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error means the store itself could not commit. These are
    /// fatal for the operation in flight; everything else is a per-record
    /// condition.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Serialization(_) | Error::LockPoisoned
        )
    }
}

//! tenure-core - Core library for Tenure
//!
//! This crate provides the membership lifecycle machinery shared between the
//! admin CLI and the server:
//!
//! - **store**: Durable membership record store
//! - **engine**: Join handling, expiry sweep, removal orchestration
//! - **client**: Chat-client trait implemented by the gateway
//! - **notify**: Best-effort notification fan-out
//! - **identity**: Platform-id parsing and display formatting

pub mod client;
pub mod engine;
pub mod error;
pub mod identity;
pub mod notify;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use client::{ChatClient, ClientStatus, ConnectionState, JoinEvent};
pub use engine::{EngineConfig, LifecycleEngine};
pub use error::{Error, Result};
pub use store::MemberStore;
pub use types::{ExpiryPolicy, MemberRecord, MemberStatus};

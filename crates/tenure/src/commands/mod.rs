//! CLI command implementations.

pub mod members;
pub mod policy;
pub mod remove;
pub mod status;
pub mod sync;

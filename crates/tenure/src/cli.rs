//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};

/// Tenure admin CLI
///
/// Inspect and manage tracked group members through the tenure-server API.
#[derive(Parser, Debug)]
#[command(name = "tenure")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Admin API base URL
    #[arg(long, global = true, env = "TENURE_URL", default_value = "http://127.0.0.1:3000")]
    pub url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tracked members
    Members {
        /// Filter by phone number substring
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a member's expiry policy
    Policy {
        /// Record id (from `tenure members`)
        id: usize,
        /// Policy: 1month, 2months, 3months, never or default
        policy: String,
    },

    /// Mark a member manually removed (removal already handled out-of-band)
    Remove {
        /// Record id (from `tenure members`)
        id: usize,
    },

    /// Enroll current participants of all target groups
    Sync,

    /// Show gateway connection status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

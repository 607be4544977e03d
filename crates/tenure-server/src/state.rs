//! Application state.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use tenure_core::client::ClientStatus;
use tenure_core::store::MemberStore;

use crate::config::Config;
use crate::gateway::GatewayClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Membership record store
    pub store: Arc<MemberStore>,
    /// Chat gateway client
    pub client: Arc<GatewayClient>,
    /// Gateway connection status feed
    pub status: watch::Receiver<ClientStatus>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, store: Arc<MemberStore>, client: Arc<GatewayClient>) -> Arc<Self> {
        let status = client.subscribe();
        Arc::new(Self {
            config: Arc::new(config),
            store,
            client,
            status,
            start_time: Instant::now(),
        })
    }
}

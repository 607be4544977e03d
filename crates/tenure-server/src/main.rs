//! tenure-server - membership retention backend
//!
//! Wires the membership store, the lifecycle engine, the gateway chat client
//! and the notification channels together, and serves the admin REST API.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tenure_core::engine::LifecycleEngine;
use tenure_core::notify::NotifierSet;
use tenure_core::store::MemberStore;

mod config;
mod gateway;
mod notify;
mod routes;
mod state;

use config::Config;
use gateway::GatewayClient;
use notify::{ChatNotifier, TelegramNotifier};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("tenure_server=info".parse()?)
                .add_directive("tenure_core=info".parse()?),
        )
        .init();

    info!("tenure-server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!(dir = %config.base_dir.display(), "config loaded");

    let store = Arc::new(MemberStore::open(config.data_path())?);
    let client = GatewayClient::connect(&config)?;

    // Gateway event feed -> engine queue.
    let (join_tx, join_rx) = mpsc::channel(64);
    tokio::spawn(Arc::clone(&client).run_event_loop(join_tx));

    let mut notifiers = NotifierSet::new();
    if let (Some(token), chat_ids) = (
        config.notify.telegram_bot_token.clone(),
        config.notify.telegram_chat_ids.clone(),
    ) {
        if !chat_ids.is_empty() {
            let http = reqwest::Client::builder()
                .timeout(config.request_timeout())
                .build()?;
            notifiers.push(Arc::new(TelegramNotifier::new(http, token, chat_ids)));
        }
    }
    if let Some(recipient) = config.notify.chat_recipient.clone() {
        notifiers.push(Arc::new(ChatNotifier::new(Arc::clone(&client), recipient)));
    }

    let engine = LifecycleEngine::new(
        Arc::clone(&store),
        Arc::clone(&client),
        notifiers,
        config.engine_config(),
    );
    tokio::spawn(engine.run(join_rx));

    let admin_port = config.admin_port;
    let app_state = AppState::new(config, store, client);
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", admin_port)).await?;
    info!("admin api listening on port {admin_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down...");
        })
        .await?;

    Ok(())
}

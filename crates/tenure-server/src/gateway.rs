//! Chat gateway client.
//!
//! The messaging platform is reached through a sidecar gateway process that
//! owns the browser session, QR pairing and reconnection policy. This module
//! implements [`ChatClient`] against the gateway's HTTP API and long-polls
//! its event feed, publishing connection status through a watch channel and
//! forwarding join events into the engine's queue.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use tenure_core::client::{ChatClient, ClientStatus, ConnectionState, JoinEvent};
use tenure_core::error::{Error, Result};

use crate::config::Config;

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    status_tx: watch::Sender<ClientStatus>,
}

/// One long-poll response from the gateway.
#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(flatten)]
    status: ClientStatus,
    #[serde(default)]
    events: Vec<GatewayEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum GatewayEvent {
    /// Member joined or was added to a group.
    Join {
        #[serde(flatten)]
        event: JoinEvent,
    },
}

#[derive(Debug, Deserialize)]
struct ContactResponse {
    number: Option<String>,
}

impl GatewayClient {
    pub fn connect(config: &Config) -> Result<Arc<Self>> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Gateway(e.to_string()))?;
        let (status_tx, _) = watch::channel(ClientStatus::disconnected());

        Ok(Arc::new(Self {
            http,
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
            status_tx,
        }))
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientStatus> {
        self.status_tx.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Poll the gateway's event feed until the join channel closes.
    ///
    /// A poll failure marks the client disconnected and retries after a
    /// pause; the gateway owns actual reconnection.
    pub async fn run_event_loop(self: Arc<Self>, joins: mpsc::Sender<JoinEvent>) {
        info!(gateway = %self.base_url, "gateway event loop running");
        loop {
            match self.poll_events().await {
                Ok(response) => {
                    self.publish_status(response.status);
                    for event in response.events {
                        let GatewayEvent::Join { event } = event;
                        debug!(group_id = %event.group_id, member_id = %event.member_id, "join event");
                        if joins.send(event).await.is_err() {
                            info!("engine gone, gateway event loop stopping");
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "gateway poll failed");
                    self.publish_status(ClientStatus::disconnected());
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                }
            }
        }
    }

    async fn poll_events(&self) -> Result<EventsResponse> {
        let response = self
            .http
            .get(self.url("/events"))
            .send()
            .await
            .map_err(|e| Error::Gateway(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Gateway(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| Error::Gateway(e.to_string()))
    }

    fn publish_status(&self, status: ClientStatus) {
        self.status_tx.send_if_modified(|current| {
            let changed = current.status != status.status || current.qr != status.qr;
            if changed {
                info!(state = %status.status, "gateway connection state");
                *current = status;
            }
            changed
        });
    }
}

#[async_trait]
impl ChatClient for GatewayClient {
    async fn resolve_identity(&self, raw_id: &str) -> Result<String> {
        let response = self
            .http
            .get(self.url(&format!("/contacts/{raw_id}")))
            .send()
            .await
            .map_err(|e| Error::Resolution(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Resolution(e.to_string()))?;
        let contact: ContactResponse = response
            .json()
            .await
            .map_err(|e| Error::Resolution(e.to_string()))?;

        match contact.number {
            Some(number) => Ok(format!("{number}@c.us")),
            None => Err(Error::Resolution(format!("no number for {raw_id}"))),
        }
    }

    async fn remove_member(&self, group_id: &str, member_id: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("/groups/{group_id}/members/{member_id}/remove")))
            .send()
            .await
            .map_err(|e| Error::Removal(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(Error::Removal(format!("{status}: {body}")))
        }
    }

    async fn send_message(&self, recipient: &str, text: &str) -> Result<()> {
        self.http
            .post(self.url("/messages"))
            .json(&serde_json::json!({ "to": recipient, "text": text }))
            .send()
            .await
            .map_err(|e| Error::Notification(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Notification(e.to_string()))?;
        Ok(())
    }

    async fn group_participants(&self, group_id: &str) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.url(&format!("/groups/{group_id}/participants")))
            .send()
            .await
            .map_err(|e| Error::Gateway(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Gateway(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| Error::Gateway(e.to_string()))
    }

    fn connection_state(&self) -> ConnectionState {
        self.status_tx.borrow().status
    }
}

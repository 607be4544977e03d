//! Chat-network notification channel.
//!
//! Mirrors notifications to a fixed recipient on the chat network itself,
//! gated on connection state: while the client is not ready the notification
//! is dropped (and logged by the fan-out) rather than queued.

use async_trait::async_trait;
use std::sync::Arc;

use tenure_core::client::{ChatClient, ConnectionState};
use tenure_core::error::{Error, Result};
use tenure_core::notify::{Notification, Notifier};

pub struct ChatNotifier<C> {
    client: Arc<C>,
    recipient: String,
}

impl<C: ChatClient> ChatNotifier<C> {
    pub fn new(client: Arc<C>, recipient: String) -> Self {
        Self { client, recipient }
    }
}

#[async_trait]
impl<C: ChatClient + 'static> Notifier for ChatNotifier<C> {
    fn name(&self) -> &str {
        "chat"
    }

    async fn notify(&self, notification: &Notification) -> Result<()> {
        let state = self.client.connection_state();
        if state != ConnectionState::Ready {
            return Err(Error::NotReady(state));
        }
        self.client
            .send_message(&self.recipient, &notification.text)
            .await
    }
}

//! Best-effort notification fan-out.
//!
//! Lifecycle notifications are dispatched to every registered channel as
//! detached tasks: a slow or failing channel never blocks lifecycle progress,
//! and delivery failures are logged and dropped.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::error::Result;
use crate::identity;
use crate::types::MemberRecord;

/// Deep link attached to a notification ("message this member").
#[derive(Debug, Clone)]
pub struct ContactLink {
    pub label: String,
    pub url: String,
}

/// One outbound lifecycle notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub text: String,
    pub contact: Option<ContactLink>,
}

impl Notification {
    pub fn member_joined(record: &MemberRecord) -> Self {
        Self {
            text: format!(
                "New member tracked\n{}\nGroup: {}",
                identity::display_id(&record.member_id),
                identity::short_group(&record.group_id)
            ),
            contact: None,
        }
    }

    pub fn member_removed(record: &MemberRecord) -> Self {
        Self {
            text: format!(
                "Member removed (retention expired)\n{}\nGroup: {}",
                identity::display_id(&record.member_id),
                identity::short_group(&record.group_id)
            ),
            contact: identity::direct_message_link(&record.member_id).map(|url| ContactLink {
                label: "Message on WhatsApp".to_string(),
                url,
            }),
        }
    }
}

/// A single outbound channel (Telegram, the chat network itself, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Fan-out over all configured channels.
#[derive(Clone, Default)]
pub struct NotifierSet {
    channels: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, channel: Arc<dyn Notifier>) {
        self.channels.push(channel);
    }

    /// Fire-and-forget dispatch to every channel. Failures are isolated per
    /// channel and only logged.
    pub fn dispatch(&self, notification: Notification) {
        for channel in &self.channels {
            let channel = Arc::clone(channel);
            let notification = notification.clone();
            tokio::spawn(async move {
                if let Err(err) = channel.notify(&notification).await {
                    warn!(channel = channel.name(), error = %err, "notification dropped");
                }
            });
        }
    }
}

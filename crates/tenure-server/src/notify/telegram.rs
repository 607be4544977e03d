//! Telegram notification channel.
//!
//! Sends each notification to every configured chat via the Bot API. A
//! contact link becomes an inline keyboard button under the message.

use async_trait::async_trait;

use tenure_core::error::{Error, Result};
use tenure_core::notify::{Notification, Notifier};

pub struct TelegramNotifier {
    http: reqwest::Client,
    bot_token: String,
    chat_ids: Vec<String>,
}

impl TelegramNotifier {
    pub fn new(http: reqwest::Client, bot_token: String, chat_ids: Vec<String>) -> Self {
        Self {
            http,
            bot_token,
            chat_ids,
        }
    }

    fn payload(&self, chat_id: &str, notification: &Notification) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "chat_id": chat_id,
            "text": notification.text,
        });
        if let Some(contact) = &notification.contact {
            payload["reply_markup"] = serde_json::json!({
                "inline_keyboard": [[{ "text": contact.label, "url": contact.url }]]
            });
        }
        payload
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, notification: &Notification) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let mut first_error = None;

        for chat_id in &self.chat_ids {
            let result = self
                .http
                .post(&url)
                .json(&self.payload(chat_id, notification))
                .send()
                .await
                .and_then(|r| r.error_for_status());
            if let Err(err) = result {
                first_error.get_or_insert_with(|| {
                    Error::Notification(format!("telegram chat {chat_id}: {err}"))
                });
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenure_core::notify::ContactLink;

    fn notifier() -> TelegramNotifier {
        TelegramNotifier::new(
            reqwest::Client::new(),
            "token".to_string(),
            vec!["42".to_string()],
        )
    }

    #[test]
    fn plain_payload_has_no_keyboard() {
        let n = Notification {
            text: "hello".to_string(),
            contact: None,
        };
        let payload = notifier().payload("42", &n);
        assert_eq!(payload["chat_id"], "42");
        assert!(payload.get("reply_markup").is_none());
    }

    #[test]
    fn contact_link_becomes_inline_keyboard() {
        let n = Notification {
            text: "removed".to_string(),
            contact: Some(ContactLink {
                label: "Message on WhatsApp".to_string(),
                url: "https://api.whatsapp.com/send?phone=77011234567".to_string(),
            }),
        };
        let payload = notifier().payload("42", &n);
        assert_eq!(
            payload["reply_markup"]["inline_keyboard"][0][0]["text"],
            "Message on WhatsApp"
        );
    }
}

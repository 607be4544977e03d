//! Outbound notification channels.

mod chat;
mod telegram;

pub use chat::ChatNotifier;
pub use telegram::TelegramNotifier;

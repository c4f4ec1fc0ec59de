//! Messaging transport: inbound events, rendered views and the Telegram connector.
//!
//! The dialog engine and the gate only see [`InboundEvent`] and [`View`]; the
//! [`Transport`] trait is the outbound seam (Telegram in production, fakes in tests).

mod inbound;
mod telegram;
mod view;

use async_trait::async_trait;

pub use inbound::{ButtonPress, ForwardedChat, InboundEvent, InboundKind, IncomingMessage};
pub use telegram::{telegram_api_base, TelegramChannel, TelegramUpdate};
pub use view::{escape_html, Button, ButtonKind, View};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("telegram request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("telegram api error: {0}")]
    Api(String),
    #[error("telegram bot token not configured")]
    NotConfigured,
}

/// Outbound side of a chat connector.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new message with the view's keyboard.
    async fn send_view(&self, chat_id: i64, view: &View) -> Result<(), TransportError>;
    /// Replace the text and keyboard of an existing message.
    async fn edit_view(&self, chat_id: i64, message_id: i64, view: &View) -> Result<(), TransportError>;
    /// Acknowledge a button press, optionally with a toast.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), TransportError>;
}

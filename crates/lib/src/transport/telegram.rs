//! Telegram channel: long-poll getUpdates, inline keyboards and getChatMember via Bot API.

use crate::gate::{GateError, MemberRole, MembershipQuery};
use crate::transport::inbound::{
    ButtonPress, ForwardedChat, InboundEvent, InboundKind, IncomingMessage,
};
use crate::transport::view::View;
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const LONG_POLL_TIMEOUT: u64 = 30;

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram update payload (getUpdates result item or webhook POST body).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub callback_query: Option<TelegramCallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
    /// Bot API 7.0+ origin of a forwarded message.
    #[serde(default)]
    pub forward_origin: Option<MessageOrigin>,
    /// Pre-7.0 field, still sent by some servers.
    #[serde(default)]
    pub forward_from_chat: Option<TelegramChat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl TelegramChat {
    /// Title for groups and channels, "first last" for private chats.
    pub fn full_name(&self) -> Option<String> {
        if let Some(ref t) = self.title {
            return Some(t.clone());
        }
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
            (Some(f), None) => Some(f.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOrigin {
    Channel { chat: TelegramChat },
    Chat { sender_chat: TelegramChat },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramCallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
}

impl TelegramMessage {
    fn forwarded_chat(&self) -> Option<&TelegramChat> {
        match &self.forward_origin {
            Some(MessageOrigin::Channel { chat }) => Some(chat),
            Some(MessageOrigin::Chat { sender_chat }) => Some(sender_chat),
            _ => self.forward_from_chat.as_ref(),
        }
    }
}

impl TelegramUpdate {
    /// Convert to a platform-neutral event. Updates without a sender are dropped.
    pub fn into_inbound(self) -> Option<InboundEvent> {
        if let Some(q) = self.callback_query {
            let chat_id = q.message.as_ref().map(|m| m.chat.id).unwrap_or(q.from.id);
            return Some(InboundEvent {
                chat_id,
                user_id: q.from.id,
                kind: InboundKind::Button(ButtonPress {
                    callback_id: q.id,
                    message_id: q.message.as_ref().map(|m| m.message_id),
                    data: q.data.unwrap_or_default(),
                }),
            });
        }
        let msg = self.message?;
        let user_id = msg.from.as_ref()?.id;
        let forwarded_from = msg.forwarded_chat().map(|c| ForwardedChat {
            id: c.id,
            name: c.full_name(),
            username: c.username.clone(),
        });
        Some(InboundEvent {
            chat_id: msg.chat.id,
            user_id,
            kind: InboundKind::Message(IncomingMessage {
                text: msg.text,
                forwarded_from,
            }),
        })
    }
}

/// Telegram channel connector: long-polls for updates and talks to the Bot API.
pub struct TelegramChannel {
    token: Option<String>,
    base_url: String,
    running: AtomicBool,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            base_url: telegram_api_base(),
            running: AtomicBool::new(false),
            client: reqwest::Client::new(),
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Start the getUpdates long-poll loop and forward events to the processor. Returns a handle to await on shutdown.
    pub fn start_inbound(self: Arc<Self>, inbound_tx: mpsc::Sender<InboundEvent>) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        log::info!("telegram channel: starting getUpdates long-poll loop");
        tokio::spawn(async move {
            run_get_updates_loop(self, inbound_tx).await;
        })
    }

    fn method_url(&self, method: &str) -> Result<String, TransportError> {
        let token = self.token.as_ref().ok_or(TransportError::NotConfigured)?;
        Ok(format!("{}/bot{}/{}", self.base_url, token, method))
    }

    /// POST a Bot API method and unwrap the `{ ok, result }` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<Option<T>, TransportError> {
        let url = self.method_url(method)?;
        let res = self.client.post(&url).json(body).send().await?;
        let status = res.status();
        let data: ApiResponse<T> = res.json().await?;
        if !data.ok {
            return Err(TransportError::Api(format!(
                "{} failed: {} {}",
                method,
                status,
                data.description.unwrap_or_default()
            )));
        }
        Ok(data.result)
    }

    /// Call Telegram getUpdates (long poll). Returns (updates, next_offset).
    async fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> Result<(Vec<TelegramUpdate>, Option<i64>), TransportError> {
        let mut body = serde_json::json!({
            "timeout": LONG_POLL_TIMEOUT,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(off) = offset {
            body["offset"] = serde_json::Value::from(off);
        }
        let updates: Vec<TelegramUpdate> = self
            .call("getUpdates", &body)
            .await?
            .unwrap_or_default();
        let next_offset = updates.iter().map(|u| u.update_id).max().map(|id| id + 1);
        Ok((updates, next_offset.or(offset)))
    }

    /// Set webhook URL (and optional secret). When set, Telegram POSTs updates to the URL instead of getUpdates.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TransportError> {
        let mut body = serde_json::json!({
            "url": url,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(s) = secret {
            body["secret_token"] = serde_json::Value::String(s.to_string());
        }
        self.call::<serde_json::Value>("setWebhook", &body).await?;
        Ok(())
    }

    /// Remove webhook so the bot can use getUpdates again.
    pub async fn delete_webhook(&self) -> Result<(), TransportError> {
        self.call::<serde_json::Value>("deleteWebhook", &serde_json::json!({}))
            .await?;
        Ok(())
    }
}

async fn run_get_updates_loop(channel: Arc<TelegramChannel>, inbound_tx: mpsc::Sender<InboundEvent>) {
    let mut offset: Option<i64> = None;
    while channel.running() {
        match channel.get_updates(offset).await {
            Ok((updates, next)) => {
                offset = next;
                for u in updates {
                    let Some(event) = u.into_inbound() else {
                        continue;
                    };
                    if inbound_tx.send(event).await.is_err() {
                        log::debug!("telegram: inbound channel closed, stopping loop");
                        return;
                    }
                }
            }
            Err(e) => {
                log::debug!("telegram getUpdates error: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
            }
        }
    }
    log::info!("telegram channel: getUpdates loop stopped");
}

#[async_trait]
impl Transport for TelegramChannel {
    async fn send_view(&self, chat_id: i64, view: &View) -> Result<(), TransportError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": view.text,
            "parse_mode": "HTML",
            "reply_markup": view.reply_markup(),
        });
        self.call::<serde_json::Value>("sendMessage", &body).await?;
        Ok(())
    }

    async fn edit_view(&self, chat_id: i64, message_id: i64, view: &View) -> Result<(), TransportError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": view.text,
            "parse_mode": "HTML",
            "reply_markup": view.reply_markup(),
        });
        match self.call::<serde_json::Value>("editMessageText", &body).await {
            Err(TransportError::Api(ref e)) if e.contains("message is not modified") => Ok(()),
            other => other.map(|_| ()),
        }
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), TransportError> {
        let mut body = serde_json::json!({ "callback_query_id": callback_id });
        if let Some(t) = text {
            body["text"] = serde_json::Value::String(t.to_string());
        }
        self.call::<serde_json::Value>("answerCallbackQuery", &body)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MembershipQuery for TelegramChannel {
    async fn get_membership_role(&self, chat_id: i64, user_id: i64) -> Result<MemberRole, GateError> {
        let body = serde_json::json!({ "chat_id": chat_id, "user_id": user_id });
        let member: ChatMember = self
            .call("getChatMember", &body)
            .await
            .map_err(|e| GateError::Query(e.to_string()))?
            .ok_or_else(|| GateError::Query("getChatMember returned no result".to_string()))?;
        Ok(MemberRole::parse(&member.status))
    }
}

/// Resolve Telegram bot API base URL (for tests or custom endpoints).
pub fn telegram_api_base() -> String {
    std::env::var("TELEGRAM_API_BASE")
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| TELEGRAM_API_BASE.to_string())
}

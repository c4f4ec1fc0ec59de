//! Entity store for the forced-subscription set.
//!
//! Two record kinds (channels, bots) with the same five operations each. The
//! Postgres store is used in production; the in-memory store backs tests and
//! runs without a configured database.

mod memory;
mod models;
mod postgres;

use async_trait::async_trait;
use std::sync::Arc;

pub use memory::MemoryStore;
pub use models::{
    default_bot_url, is_valid_bot_username, Bot, Channel, NewBot, NewChannel, OpStatus,
    MAX_BOT_USERNAME_LEN,
};
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record key is already taken; nothing was written.
    #[error("already exists: {0}")]
    DuplicateKey(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }
}

#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Insert a channel. Fails with [`StoreError::DuplicateKey`] if the id exists.
    async fn add_channel(&self, channel: NewChannel) -> Result<(), StoreError>;
    async fn get_channel(&self, id: i64) -> Result<Option<Channel>, StoreError>;
    async fn get_all_channels(&self) -> Result<Vec<Channel>, StoreError>;
    /// No-op when the channel does not exist.
    async fn update_channel_status(&self, status: OpStatus, id: i64) -> Result<(), StoreError>;
    /// No-op when the channel does not exist.
    async fn delete_channel(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait BotStore: Send + Sync {
    /// Insert a bot. Fails with [`StoreError::DuplicateKey`] if the username exists.
    async fn add_bot(&self, bot: NewBot) -> Result<(), StoreError>;
    async fn get_bot(&self, username: &str) -> Result<Option<Bot>, StoreError>;
    async fn get_all_bots(&self) -> Result<Vec<Bot>, StoreError>;
    async fn update_bot_status(&self, status: OpStatus, username: &str) -> Result<(), StoreError>;
    async fn delete_bot(&self, username: &str) -> Result<(), StoreError>;
}

/// Both stores, shared by the dialog engine, the gate and the gateway.
#[derive(Clone)]
pub struct Stores {
    pub channels: Arc<dyn ChannelStore>,
    pub bots: Arc<dyn BotStore>,
}

impl Stores {
    /// Use one backend for both record kinds.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: ChannelStore + BotStore + 'static,
    {
        Self {
            channels: backend.clone(),
            bots: backend,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }
}

//! In-memory store (insertion ordered). Used when no database is configured.

use super::{Bot, BotStore, Channel, ChannelStore, NewBot, NewChannel, OpStatus, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct MemoryStore {
    channels: Arc<RwLock<Vec<Channel>>>,
    bots: Arc<RwLock<Vec<Bot>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(Vec::new())),
            bots: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ChannelStore for MemoryStore {
    async fn add_channel(&self, channel: NewChannel) -> Result<(), StoreError> {
        let mut g = self.channels.write().await;
        if g.iter().any(|c| c.id == channel.id) {
            return Err(StoreError::DuplicateKey(format!("channel {}", channel.id)));
        }
        g.push(channel.into_channel(Utc::now()));
        Ok(())
    }

    async fn get_channel(&self, id: i64) -> Result<Option<Channel>, StoreError> {
        Ok(self.channels.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn get_all_channels(&self) -> Result<Vec<Channel>, StoreError> {
        Ok(self.channels.read().await.clone())
    }

    async fn update_channel_status(&self, status: OpStatus, id: i64) -> Result<(), StoreError> {
        if let Some(c) = self.channels.write().await.iter_mut().find(|c| c.id == id) {
            c.status = status;
        }
        Ok(())
    }

    async fn delete_channel(&self, id: i64) -> Result<(), StoreError> {
        self.channels.write().await.retain(|c| c.id != id);
        Ok(())
    }
}

#[async_trait]
impl BotStore for MemoryStore {
    async fn add_bot(&self, bot: NewBot) -> Result<(), StoreError> {
        let mut g = self.bots.write().await;
        if g.iter().any(|b| b.username == bot.username) {
            return Err(StoreError::DuplicateKey(format!("bot @{}", bot.username)));
        }
        g.push(bot.into_bot(Utc::now()));
        Ok(())
    }

    async fn get_bot(&self, username: &str) -> Result<Option<Bot>, StoreError> {
        Ok(self
            .bots
            .read()
            .await
            .iter()
            .find(|b| b.username == username)
            .cloned())
    }

    async fn get_all_bots(&self) -> Result<Vec<Bot>, StoreError> {
        Ok(self.bots.read().await.clone())
    }

    async fn update_bot_status(&self, status: OpStatus, username: &str) -> Result<(), StoreError> {
        if let Some(b) = self
            .bots
            .write()
            .await
            .iter_mut()
            .find(|b| b.username == username)
        {
            b.status = status;
        }
        Ok(())
    }

    async fn delete_bot(&self, username: &str) -> Result<(), StoreError> {
        self.bots.write().await.retain(|b| b.username != username);
        Ok(())
    }
}

//! Per-conversation dialog sessions.
//!
//! A session is keyed by chat and user so two admins in the same group keep
//! separate dialogs. Sessions live in memory; a restart drops any dialog in
//! progress and the next admin command starts fresh.

use crate::dialog::DialogContext;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// (chat id, user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: i64,
    pub user_id: i64,
}

impl SessionKey {
    pub fn new(chat_id: i64, user_id: i64) -> Self {
        Self { chat_id, user_id }
    }
}

/// In-memory store for dialog contexts (get, replace, reset).
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<SessionKey, DialogContext>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Current context, or the admin menu when the conversation has none.
    pub async fn get(&self, key: SessionKey) -> DialogContext {
        self.inner.read().await.get(&key).cloned().unwrap_or_default()
    }

    /// Store the context produced by a step.
    pub async fn replace(&self, key: SessionKey, ctx: DialogContext) {
        self.inner.write().await.insert(key, ctx);
    }

    pub async fn reset(&self, key: SessionKey) {
        self.inner.write().await.remove(&key);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

//! Channel and bot records of the forced-subscription set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an entry is currently enforced by the membership gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpStatus {
    Active,
    #[default]
    Inactive,
}

impl OpStatus {
    pub fn from_active(active: bool) -> Self {
        if active {
            OpStatus::Active
        } else {
            OpStatus::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == OpStatus::Active
    }

    pub fn toggled(self) -> Self {
        match self {
            OpStatus::Active => OpStatus::Inactive,
            OpStatus::Inactive => OpStatus::Active,
        }
    }

    /// Text literal stored in the `status` column.
    pub fn as_db_literal(self) -> &'static str {
        match self {
            OpStatus::Active => "True",
            OpStatus::Inactive => "False",
        }
    }

    /// Anything other than the exact `"True"` literal reads as inactive.
    pub fn from_db_literal(s: &str) -> Self {
        Self::from_active(s == "True")
    }
}

/// A channel or group users must join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Platform chat id (e.g. `-1001234567890`).
    pub id: i64,
    pub name: String,
    /// Public handle without `@`; `None` for private chats.
    pub username: Option<String>,
    pub status: OpStatus,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Fields collected by the registration flow before the channel is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    pub id: i64,
    pub name: String,
    pub username: Option<String>,
    pub url: String,
    pub status: OpStatus,
}

impl NewChannel {
    pub fn into_channel(self, created_at: DateTime<Utc>) -> Channel {
        Channel {
            id: self.id,
            name: self.name,
            username: self.username,
            status: self.status,
            url: self.url,
            created_at,
        }
    }
}

/// A bot suggested next to the gated channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    /// Handle without the leading `@`; the record key.
    pub username: String,
    pub name: String,
    pub status: OpStatus,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBot {
    pub username: String,
    pub name: String,
    pub url: String,
    pub status: OpStatus,
}

impl NewBot {
    pub fn into_bot(self, created_at: DateTime<Utc>) -> Bot {
        Bot {
            username: self.username,
            name: self.name,
            status: self.status,
            url: self.url,
            created_at,
        }
    }
}

/// Longest handle Telegram issues.
pub const MAX_BOT_USERNAME_LEN: usize = 32;

/// A Telegram handle: ASCII letters, digits and `_`, at most 32 characters.
pub fn is_valid_bot_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_BOT_USERNAME_LEN
        && username.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Canonical deep link for a bot handle.
pub fn default_bot_url(username: &str) -> String {
    format!("https://t.me/{}", username)
}

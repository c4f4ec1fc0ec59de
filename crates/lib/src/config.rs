//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.subgate/config.json`) and environment.
//! Every section is optional; a missing file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings (health and webhook endpoint).
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel settings (e.g. Telegram).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Where channels and bots are persisted.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Who may open the admin menu.
    #[serde(default)]
    pub admins: AdminsConfig,

    /// Membership gate behaviour.
    #[serde(default)]
    pub subscription: SubscriptionConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 15152).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    15152
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-channel config (e.g. Telegram bot token).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: TelegramChannelConfig,
}

/// Telegram channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannelConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
    /// When set, use webhook mode: Telegram POSTs updates to this URL. If unset, long-poll getUpdates is used.
    pub webhook_url: Option<String>,
    /// Optional secret for webhook verification (X-Telegram-Bot-Api-Secret-Token). Used only when webhook_url is set.
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Postgres URL. Overridden by DATABASE_URL env. When neither is set an in-memory store is used.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminsConfig {
    /// Telegram user ids allowed to manage the subscription list.
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

impl AdminsConfig {
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.user_ids.contains(&user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionConfig {
    /// Status given to newly registered channels and bots.
    #[serde(default)]
    pub default_active: bool,
    /// How many membership queries may be in flight for one check (1 = sequential).
    #[serde(default = "default_check_concurrency")]
    pub check_concurrency: usize,
    /// Per-query timeout; a timed-out query counts as not subscribed.
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,
    /// Reply to the "check" button once every channel is joined.
    #[serde(default = "default_passed_text")]
    pub passed_text: String,
}

fn default_check_concurrency() -> usize {
    1
}

fn default_check_timeout_secs() -> u64 {
    10
}

fn default_passed_text() -> String {
    "✅ Rahmat! Endi botdan foydalanishingiz mumkin.".to_string()
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            default_active: false,
            check_concurrency: default_check_concurrency(),
            check_timeout_secs: default_check_timeout_secs(),
            passed_text: default_passed_text(),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the Telegram bot token: env TELEGRAM_BOT_TOKEN overrides config.
pub fn resolve_telegram_token(config: &Config) -> Option<String> {
    non_empty_env("TELEGRAM_BOT_TOKEN").or_else(|| {
        config
            .channels
            .telegram
            .bot_token
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve the database URL: env DATABASE_URL overrides config.
pub fn resolve_database_url(config: &Config) -> Option<String> {
    non_empty_env("DATABASE_URL").or_else(|| {
        config
            .database
            .url
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("SUBGATE_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".subgate").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the default path (or SUBGATE_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 15152);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert!(!config.subscription.default_active);
        assert_eq!(config.subscription.check_concurrency, 1);
        assert_eq!(config.subscription.check_timeout_secs, 10);
        assert!(config.admins.user_ids.is_empty());
    }

    #[test]
    fn camel_case_sections_parse() {
        let config: Config = serde_json::from_str(
            r#"{
                "channels": { "telegram": { "botToken": "123:abc", "webhookUrl": "https://x/hook" } },
                "database": { "url": "postgres://localhost/op", "maxConnections": 2 },
                "admins": { "userIds": [42, 43] },
                "subscription": { "defaultActive": true, "checkConcurrency": 4 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.channels.telegram.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.database.max_connections, 2);
        assert!(config.admins.is_admin(43));
        assert!(!config.admins.is_admin(44));
        assert!(config.subscription.default_active);
        assert_eq!(config.subscription.check_concurrency, 4);
    }

    #[test]
    fn blank_config_values_are_ignored() {
        let mut config = Config::default();
        config.database.url = Some("   ".to_string());
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(resolve_database_url(&config), None);
        }
    }
}

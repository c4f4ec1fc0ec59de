//! PostgreSQL store (sqlx). Status is kept as the `'True'` / `'False'` text
//! literals of the existing schema; mapping to [`OpStatus`] happens here only.

use super::{Bot, BotStore, Channel, ChannelStore, NewBot, NewChannel, OpStatus, StoreError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::time::Duration;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct ChannelRow {
    channel_id: i64,
    channel_name: String,
    channel_username: String,
    status: String,
    created_at: DateTime<Utc>,
    channel_url: String,
}

impl From<ChannelRow> for Channel {
    fn from(r: ChannelRow) -> Self {
        Channel {
            id: r.channel_id,
            name: r.channel_name,
            username: Some(r.channel_username).filter(|u| !u.is_empty()),
            status: OpStatus::from_db_literal(&r.status),
            url: r.channel_url,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct BotRow {
    bot_name: String,
    bot_username: String,
    status: String,
    bot_url: String,
    created_at: DateTime<Utc>,
}

impl From<BotRow> for Bot {
    fn from(r: BotRow) -> Self {
        Bot {
            username: r.bot_username,
            name: r.bot_name,
            status: OpStatus::from_db_literal(&r.status),
            url: r.bot_url,
            created_at: r.created_at,
        }
    }
}

/// Unique violations become [`StoreError::DuplicateKey`]; everything else is a storage error.
fn map_insert_error(e: sqlx::Error, key: String) -> StoreError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::DuplicateKey(key)
        }
        other => StoreError::Storage(other.to_string()),
    }
}

fn storage(e: sqlx::Error) -> StoreError {
    StoreError::Storage(e.to_string())
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, then apply the bundled migrations.
    pub async fn connect_and_migrate(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .context("connecting to postgres")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ChannelStore for PgStore {
    async fn add_channel(&self, channel: NewChannel) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO op_channels (channel_id, channel_name, channel_username, status, channel_url)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(channel.id)
        .bind(&channel.name)
        .bind(channel.username.as_deref().unwrap_or(""))
        .bind(channel.status.as_db_literal())
        .bind(&channel.url)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, format!("channel {}", channel.id)))?;
        Ok(())
    }

    async fn get_channel(&self, id: i64) -> Result<Option<Channel>, StoreError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT channel_id, channel_name, channel_username, status, created_at, channel_url
            FROM op_channels WHERE channel_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(Channel::from))
    }

    async fn get_all_channels(&self) -> Result<Vec<Channel>, StoreError> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT channel_id, channel_name, channel_username, status, created_at, channel_url
            FROM op_channels ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Channel::from).collect())
    }

    async fn update_channel_status(&self, status: OpStatus, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE op_channels SET status = $1 WHERE channel_id = $2")
            .bind(status.as_db_literal())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn delete_channel(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM op_channels WHERE channel_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl BotStore for PgStore {
    async fn add_bot(&self, bot: NewBot) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO op_bots (bot_name, bot_username, status, bot_url)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&bot.name)
        .bind(&bot.username)
        .bind(bot.status.as_db_literal())
        .bind(&bot.url)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, format!("bot @{}", bot.username)))?;
        Ok(())
    }

    async fn get_bot(&self, username: &str) -> Result<Option<Bot>, StoreError> {
        let row = sqlx::query_as::<_, BotRow>(
            r#"
            SELECT bot_name, bot_username, status, bot_url, created_at
            FROM op_bots WHERE bot_username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(Bot::from))
    }

    async fn get_all_bots(&self) -> Result<Vec<Bot>, StoreError> {
        let rows = sqlx::query_as::<_, BotRow>(
            r#"
            SELECT bot_name, bot_username, status, bot_url, created_at
            FROM op_bots ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Bot::from).collect())
    }

    async fn update_bot_status(&self, status: OpStatus, username: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE op_bots SET status = $1 WHERE bot_username = $2")
            .bind(status.as_db_literal())
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn delete_bot(&self, username: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM op_bots WHERE bot_username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_row(username: &str, status: &str) -> ChannelRow {
        ChannelRow {
            channel_id: -1001,
            channel_name: "News".to_string(),
            channel_username: username.to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
            channel_url: "https://t.me/+news".to_string(),
        }
    }

    #[test]
    fn empty_channel_username_column_reads_as_none() {
        let channel = Channel::from(channel_row("", "True"));
        assert_eq!(channel.username, None);
        assert_eq!(channel.status, OpStatus::Active);
        assert_eq!(channel.id, -1001);

        let channel = Channel::from(channel_row("news", "False"));
        assert_eq!(channel.username.as_deref(), Some("news"));
        assert_eq!(channel.status, OpStatus::Inactive);
    }

    #[test]
    fn unknown_status_literal_reads_as_inactive() {
        let bot = Bot::from(BotRow {
            bot_name: "Helper".to_string(),
            bot_username: "helper_bot".to_string(),
            status: "yes".to_string(),
            bot_url: "https://t.me/helper_bot".to_string(),
            created_at: Utc::now(),
        });
        assert_eq!(bot.username, "helper_bot");
        assert_eq!(bot.name, "Helper");
        assert_eq!(bot.status, OpStatus::Inactive);
        assert_eq!(Channel::from(channel_row("", "")).status, OpStatus::Inactive);
    }

    /// Constraint failure as the driver reports it; `true` means a unique violation.
    #[derive(Debug)]
    struct ConstraintError(bool);

    impl std::fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("constraint violated")
        }
    }

    impl std::error::Error for ConstraintError {}

    impl sqlx::error::DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.0 {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::ForeignKeyViolation
            }
        }
    }

    #[test]
    fn unique_violation_maps_to_duplicate_key() {
        let e = sqlx::Error::Database(Box::new(ConstraintError(true)));
        let err = map_insert_error(e, "bot helper_bot".to_string());
        assert!(err.is_duplicate());
        assert_eq!(err.to_string(), "already exists: bot helper_bot");

        let e = sqlx::Error::Database(Box::new(ConstraintError(false)));
        let err = map_insert_error(e, "bot helper_bot".to_string());
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[test]
    fn non_database_insert_failure_is_storage_error() {
        let err = map_insert_error(sqlx::Error::RowNotFound, "channel -1001".to_string());
        assert!(!err.is_duplicate());
        assert!(matches!(err, StoreError::Storage(_)));

        let err = map_insert_error(sqlx::Error::PoolTimedOut, "bot helper_bot".to_string());
        assert!(!err.is_duplicate());
    }
}

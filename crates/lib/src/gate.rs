//! Membership gate: which active channels has a user not joined yet?
//!
//! Every check re-queries every active channel; there is no cache. Inactive
//! channels are never queried. A failed or timed-out query counts as "not
//! joined" so a platform hiccup never lets a user through unchecked.

use crate::store::{Bot, Channel, StoreError, Stores};
use crate::transport::{Button, View};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::time::Duration;

pub const GATE_TEXT: &str = "Botdan foydalanish uchun ushbu kanallarga obuna bo'ling";
pub const CHECK_BUTTON_LABEL: &str = "✅ Tekshirish";

/// Membership status reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRole {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    Other(String),
}

impl MemberRole {
    pub fn parse(s: &str) -> Self {
        match s {
            "creator" => MemberRole::Creator,
            "administrator" => MemberRole::Administrator,
            "member" => MemberRole::Member,
            "restricted" => MemberRole::Restricted,
            "left" => MemberRole::Left,
            "kicked" => MemberRole::Kicked,
            other => MemberRole::Other(other.to_string()),
        }
    }

    /// Only member, administrator and creator count as joined.
    pub fn satisfies(&self) -> bool {
        matches!(
            self,
            MemberRole::Creator | MemberRole::Administrator | MemberRole::Member
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("membership query failed: {0}")]
    Query(String),
    #[error("membership query timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The platform's membership endpoint.
#[async_trait]
pub trait MembershipQuery: Send + Sync {
    async fn get_membership_role(&self, chat_id: i64, user_id: i64) -> Result<MemberRole, GateError>;
}

/// Fan-out limits for one check.
#[derive(Debug, Clone, Copy)]
pub struct GateOptions {
    /// Queries in flight at once; 1 keeps the check strictly sequential.
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&crate::config::SubscriptionConfig> for GateOptions {
    fn from(c: &crate::config::SubscriptionConfig) -> Self {
        Self {
            concurrency: c.check_concurrency.max(1),
            timeout: Duration::from_secs(c.check_timeout_secs.max(1)),
        }
    }
}

/// Result of one check for one user.
#[derive(Debug, Clone, Default)]
pub struct GateReport {
    /// Active channels the user has not joined, in store iteration order.
    pub unsatisfied: Vec<Channel>,
    /// Every registered bot, shown as "also join" suggestions.
    pub bots: Vec<Bot>,
}

impl GateReport {
    pub fn is_satisfied(&self) -> bool {
        self.unsatisfied.is_empty()
    }
}

async fn query_with_timeout(
    query: &dyn MembershipQuery,
    chat_id: i64,
    user_id: i64,
    timeout: Duration,
) -> Result<MemberRole, GateError> {
    match tokio::time::timeout(timeout, query.get_membership_role(chat_id, user_id)).await {
        Ok(r) => r,
        Err(_) => Err(GateError::Timeout(timeout)),
    }
}

/// Check `user_id` against every active channel. Store failures propagate;
/// membership query failures mark the channel unsatisfied.
pub async fn check_subscription(
    stores: &Stores,
    query: &dyn MembershipQuery,
    user_id: i64,
    options: GateOptions,
) -> Result<GateReport, GateError> {
    let channels = stores.channels.get_all_channels().await?;
    let bots = stores.bots.get_all_bots().await?;

    let active: Vec<Channel> = channels
        .into_iter()
        .filter(|c| c.status.is_active())
        .collect();

    let verdicts: Vec<(Channel, bool)> = stream::iter(active)
        .map(|channel| async move {
            let joined = match query_with_timeout(query, channel.id, user_id, options.timeout).await {
                Ok(role) => role.satisfies(),
                Err(e) => {
                    log::warn!(
                        "gate: membership of user {} in {} unknown, treating as not joined: {}",
                        user_id,
                        channel.id,
                        e
                    );
                    false
                }
            };
            (channel, joined)
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let unsatisfied: Vec<Channel> = verdicts
        .into_iter()
        .filter_map(|(c, joined)| if joined { None } else { Some(c) })
        .collect();
    log::debug!(
        "gate: user {} missing {} channel(s)",
        user_id,
        unsatisfied.len()
    );
    Ok(GateReport { unsatisfied, bots })
}

/// "Please join" reply: one link per missing channel, one per bot, then a re-check button.
pub fn gate_view(report: &GateReport) -> View {
    let mut view = View::new(GATE_TEXT);
    for c in &report.unsatisfied {
        view = view.button(Button::url(&c.name, &c.url));
    }
    for b in &report.bots {
        view = view.button(Button::url(&b.name, &b.url));
    }
    view.button(Button::callback(
        CHECK_BUTTON_LABEL,
        crate::dialog::Action::CheckSubscription.encode(),
    ))
}

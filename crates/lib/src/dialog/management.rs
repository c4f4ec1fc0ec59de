//! Detail view actions: delete (after confirmation) and active/inactive toggle.
//!
//! The toggle reads the current status and writes the flipped one as two
//! separate store calls. Two admins toggling the same entry at once race;
//! the last write wins.

use super::state::{DialogContext, DialogState, ItemStep};
use super::DialogDeps;

pub async fn delete_channel(id: i64, deps: &DialogDeps) -> DialogContext {
    match deps.stores.channels.delete_channel(id).await {
        Ok(()) => log::info!("channel {} deleted", id),
        Err(e) => log::error!("deleting channel {} failed: {}", id, e),
    }
    DialogContext::start(DialogState::OpMenu)
}

pub async fn toggle_channel(ctx: DialogContext, id: i64, deps: &DialogDeps) -> DialogContext {
    match deps.stores.channels.get_channel(id).await {
        Ok(Some(channel)) => {
            let new_status = channel.status.toggled();
            match deps.stores.channels.update_channel_status(new_status, id).await {
                Ok(()) => log::info!(
                    "channel {} status changed: {} -> {}",
                    id,
                    channel.status.as_db_literal(),
                    new_status.as_db_literal()
                ),
                Err(e) => log::error!("toggling channel {} status failed: {}", id, e),
            }
        }
        Ok(None) => {
            log::error!("channel {} not found for status toggle", id);
            return ctx;
        }
        Err(e) => log::error!("toggling channel {} status failed: {}", id, e),
    }
    ctx.switch_to(DialogState::ChannelMenu {
        id,
        step: ItemStep::Detail,
    })
}

pub async fn delete_bot(username: &str, deps: &DialogDeps) -> DialogContext {
    match deps.stores.bots.delete_bot(username).await {
        Ok(()) => log::info!("bot @{} deleted", username),
        Err(e) => log::error!("deleting bot @{} failed: {}", username, e),
    }
    DialogContext::start(DialogState::OpMenu)
}

pub async fn toggle_bot(ctx: DialogContext, username: String, deps: &DialogDeps) -> DialogContext {
    match deps.stores.bots.get_bot(&username).await {
        Ok(Some(bot)) => {
            let new_status = bot.status.toggled();
            match deps.stores.bots.update_bot_status(new_status, &username).await {
                Ok(()) => log::info!(
                    "bot @{} status changed: {} -> {}",
                    username,
                    bot.status.as_db_literal(),
                    new_status.as_db_literal()
                ),
                Err(e) => log::error!("toggling bot @{} status failed: {}", username, e),
            }
        }
        Ok(None) => {
            log::error!("bot @{} not found for status toggle", username);
            return ctx;
        }
        Err(e) => log::error!("toggling bot @{} status failed: {}", username, e),
    }
    ctx.switch_to(DialogState::BotMenu {
        username,
        step: ItemStep::Detail,
    })
}

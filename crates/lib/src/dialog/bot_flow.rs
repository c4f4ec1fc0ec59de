//! Bot registration: username, link (or the default deep link), display name.

use super::state::{AddBotStep, BotDraft, DialogContext, DialogState, MsgType, Notice};
use super::DialogDeps;
use crate::store::{default_bot_url, is_valid_bot_username, NewBot};
use crate::transport::IncomingMessage;

fn text_input(msg: &IncomingMessage) -> Option<&str> {
    msg.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

pub async fn on_username(ctx: DialogContext, msg: &IncomingMessage, deps: &DialogDeps) -> DialogContext {
    let Some(text) = text_input(msg) else {
        log::warn!("add bot: username was not sent as text");
        return ctx.with_msg(MsgType::ErrorFormat);
    };
    let username = text.trim_start_matches('@');
    if !is_valid_bot_username(username) {
        log::warn!("add bot: {:?} is not a valid bot username", username);
        return ctx.with_msg(MsgType::ErrorFormat);
    }

    match deps.stores.bots.get_bot(username).await {
        Ok(Some(_)) => {
            log::info!("add bot: @{} already exists", username);
            return ctx.with_msg(MsgType::AlreadyExists);
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("add bot: checking @{} failed: {}", username, e);
            return ctx.with_msg(MsgType::Error);
        }
    }

    log::info!("add bot: username stored: @{}", username);
    DialogContext {
        bot_draft: BotDraft {
            username: Some(username.to_string()),
            url: ctx.bot_draft.url.clone(),
        },
        ..ctx
    }
    .switch_to(DialogState::AddBot(AddBotStep::AwaitUrl))
    .with_msg(MsgType::Start)
}

pub fn on_url(ctx: DialogContext, msg: &IncomingMessage) -> DialogContext {
    let Some(url) = text_input(msg) else {
        log::warn!("add bot: link was not sent as text");
        return ctx.with_msg(MsgType::ErrorFormat);
    };
    log::debug!("add bot: link stored: {}", url);
    with_url(ctx, url.to_string())
}

/// "Use the standard link" button.
pub fn on_default_url(ctx: DialogContext) -> DialogContext {
    let Some(username) = ctx.bot_draft.username.clone() else {
        log::error!("add bot: no username collected for the default link");
        return ctx;
    };
    let url = default_bot_url(&username);
    log::info!("add bot: default link set: {}", url);
    with_url(ctx, url)
}

fn with_url(ctx: DialogContext, url: String) -> DialogContext {
    DialogContext {
        bot_draft: BotDraft {
            username: ctx.bot_draft.username.clone(),
            url: Some(url),
        },
        ..ctx
    }
    .switch_to(DialogState::AddBot(AddBotStep::AwaitName))
    .with_msg(MsgType::Start)
}

/// The display name completes the record. Every attempt to store ends the flow.
pub async fn on_name(ctx: DialogContext, msg: &IncomingMessage, deps: &DialogDeps) -> DialogContext {
    let Some(name) = text_input(msg) else {
        log::warn!("add bot: name was not sent as text");
        return ctx.with_msg(MsgType::ErrorFormat);
    };

    let (Some(username), Some(url)) = (ctx.bot_draft.username, ctx.bot_draft.url) else {
        log::error!("add bot: username or link missing before the name step");
        return DialogContext::done(Some(Notice::BotFailed));
    };

    let bot = NewBot {
        username: username.clone(),
        name: name.to_string(),
        url: url.clone(),
        status: deps.defaults.status,
    };
    let notice = match deps.stores.bots.add_bot(bot).await {
        Ok(()) => {
            log::info!("bot added: {} (@{}) - {}", name, username, url);
            Notice::BotAdded
        }
        Err(e) if e.is_duplicate() => {
            log::warn!("add bot: @{} already exists (unique violation)", username);
            Notice::BotExists
        }
        Err(e) => {
            log::error!("add bot: storing @{} failed: {}", username, e);
            Notice::BotFailed
        }
    };
    DialogContext::done(Some(notice))
}

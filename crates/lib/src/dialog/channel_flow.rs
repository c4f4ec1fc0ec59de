//! Channel registration: forwarded post, then the channel link.

use super::state::{AddChannelStep, ChannelDraft, DialogContext, DialogState, MsgType, Notice};
use super::DialogDeps;
use crate::store::NewChannel;
use crate::transport::IncomingMessage;

/// A post forwarded from the channel identifies it.
///
/// A channel that is already registered still moves on to the link step, with
/// the "already exists" prompt and nothing stashed; the link step then ends the
/// flow without writing.
pub async fn on_forward(ctx: DialogContext, msg: &IncomingMessage, deps: &DialogDeps) -> DialogContext {
    let Some(chat) = msg.forwarded_from.as_ref() else {
        log::warn!("add channel: message was not forwarded from a chat");
        return ctx.with_msg(MsgType::NotForwarded);
    };

    match deps.stores.channels.get_channel(chat.id).await {
        Ok(Some(_)) => {
            log::info!("add channel: channel {} already exists", chat.id);
            return ctx
                .switch_to(DialogState::AddChannel(AddChannelStep::AwaitUrl))
                .with_msg(MsgType::AlreadyExists);
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("add channel: checking channel {} failed: {}", chat.id, e);
            return ctx.with_msg(MsgType::Error);
        }
    }

    let draft = ChannelDraft {
        id: chat.id,
        name: chat
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unnamed Channel".to_string()),
        username: chat.username.clone().unwrap_or_default(),
    };
    log::info!("add channel: extracted {} ({})", draft.name, draft.id);
    DialogContext {
        channel_draft: Some(draft),
        ..ctx
    }
    .switch_to(DialogState::AddChannel(AddChannelStep::AwaitUrl))
    .with_msg(MsgType::Start)
}

/// The link completes the record. Every attempt to store ends the flow.
pub async fn on_url(ctx: DialogContext, msg: &IncomingMessage, deps: &DialogDeps) -> DialogContext {
    let Some(url) = msg.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        log::warn!("add channel: link was not sent as text");
        return ctx.with_msg(MsgType::ErrorFormat);
    };

    let Some(draft) = ctx.channel_draft else {
        log::error!("add channel: no channel data collected before the link");
        return DialogContext::done(Some(Notice::ChannelFailed));
    };

    let channel = NewChannel {
        id: draft.id,
        name: draft.name.clone(),
        username: Some(draft.username.clone()).filter(|u| !u.is_empty()),
        url: url.to_string(),
        status: deps.defaults.status,
    };
    let notice = match deps.stores.channels.add_channel(channel).await {
        Ok(()) => {
            log::info!("channel added: {} ({}) - {}", draft.name, draft.id, url);
            Notice::ChannelAdded
        }
        Err(e) if e.is_duplicate() => {
            log::warn!("add channel: {} already exists (unique violation)", draft.id);
            Notice::ChannelExists
        }
        Err(e) => {
            log::error!("add channel: storing {} failed: {}", draft.id, e);
            Notice::ChannelFailed
        }
    };
    DialogContext::done(Some(notice))
}

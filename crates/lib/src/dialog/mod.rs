//! Admin dialogs: OP menu, channel/bot registration and the per-entry menus.
//!
//! [`step`] is the single transition function: it takes the conversation's
//! current [`DialogContext`] and one event and returns the next context.
//! [`render`] turns a context into the screen to show.

mod action;
mod bot_flow;
mod channel_flow;
mod management;
mod state;
mod views;

use crate::store::{OpStatus, Stores};
use crate::transport::IncomingMessage;

pub use action::Action;
pub use state::{
    AddBotStep, AddChannelStep, BotDraft, ChannelDraft, Defaults, DialogContext, DialogState,
    ItemStep, MsgType, Notice,
};
pub use views::{admin_menu, bot_detail_view, channel_detail_view, op_menu_view, render, ADMIN_MENU_TEXT};

/// What the dialog handlers need from the rest of the application.
#[derive(Clone)]
pub struct DialogDeps {
    pub stores: Stores,
    pub defaults: Defaults,
}

impl DialogDeps {
    pub fn new(stores: Stores) -> Self {
        Self {
            stores,
            defaults: Defaults::default(),
        }
    }

    pub fn with_default_status(mut self, status: OpStatus) -> Self {
        self.defaults.status = status;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    Message(IncomingMessage),
    Action(Action),
}

/// Apply one event. Events a state does not handle leave the context unchanged.
pub async fn step(ctx: DialogContext, event: DialogEvent, deps: &DialogDeps) -> DialogContext {
    use DialogEvent::{Action as Act, Message as Msg};

    let state = ctx.state.clone();
    match (state, event) {
        // Buttons shown on every screen.
        (_, Act(Action::Noop)) | (_, Act(Action::CheckSubscription)) => ctx,
        (DialogState::AdminMenu, Act(Action::OpenOpMenu)) => DialogContext::start(DialogState::OpMenu),
        (DialogState::AdminMenu, _) => ctx,

        (_, Act(Action::OpenOpMenu)) => DialogContext::start(DialogState::OpMenu),

        (DialogState::OpMenu, Act(Action::CloseOpMenu)) => DialogContext::start(DialogState::AdminMenu),
        (DialogState::OpMenu, Act(Action::AddChannel)) => {
            DialogContext::start(DialogState::AddChannel(AddChannelStep::AwaitForward))
        }
        (DialogState::OpMenu, Act(Action::AddBot)) => {
            DialogContext::start(DialogState::AddBot(AddBotStep::AwaitUsername))
        }
        (DialogState::OpMenu, Act(Action::OpenChannel(id))) => {
            log::debug!("opening channel info for {}", id);
            DialogContext::start(DialogState::ChannelMenu {
                id,
                step: ItemStep::Detail,
            })
        }
        (DialogState::OpMenu, Act(Action::OpenBot(username))) => {
            log::debug!("opening bot info for @{}", username);
            DialogContext::start(DialogState::BotMenu {
                username,
                step: ItemStep::Detail,
            })
        }
        (DialogState::OpMenu, _) => ctx,

        (DialogState::AddChannel(AddChannelStep::AwaitForward), Msg(m)) => {
            channel_flow::on_forward(ctx, &m, deps).await
        }
        (DialogState::AddChannel(AddChannelStep::AwaitUrl), Msg(m)) => {
            channel_flow::on_url(ctx, &m, deps).await
        }
        (DialogState::AddChannel(_), Act(_)) => ctx,

        (DialogState::AddBot(AddBotStep::AwaitUsername), Msg(m)) => {
            bot_flow::on_username(ctx, &m, deps).await
        }
        (DialogState::AddBot(AddBotStep::AwaitUrl), Msg(m)) => bot_flow::on_url(ctx, &m),
        (DialogState::AddBot(AddBotStep::AwaitUrl), Act(Action::DefaultBotUrl)) => {
            bot_flow::on_default_url(ctx)
        }
        (DialogState::AddBot(AddBotStep::AwaitName), Msg(m)) => bot_flow::on_name(ctx, &m, deps).await,
        (DialogState::AddBot(_), Act(_)) => ctx,

        (DialogState::ChannelMenu { id, step: ItemStep::Detail }, Act(Action::AskDelete)) => {
            ctx.switch_to(DialogState::ChannelMenu {
                id,
                step: ItemStep::ConfirmDelete,
            })
        }
        (DialogState::ChannelMenu { id, step: ItemStep::Detail }, Act(Action::ToggleStatus)) => {
            management::toggle_channel(ctx, id, deps).await
        }
        (DialogState::ChannelMenu { id, step: ItemStep::ConfirmDelete }, Act(Action::ConfirmDelete)) => {
            management::delete_channel(id, deps).await
        }
        (DialogState::ChannelMenu { id, step: ItemStep::ConfirmDelete }, Act(Action::CancelDelete)) => {
            ctx.switch_to(DialogState::ChannelMenu {
                id,
                step: ItemStep::Detail,
            })
        }
        (DialogState::ChannelMenu { .. }, _) => ctx,

        (DialogState::BotMenu { username, step: ItemStep::Detail }, Act(Action::AskDelete)) => {
            ctx.switch_to(DialogState::BotMenu {
                username,
                step: ItemStep::ConfirmDelete,
            })
        }
        (DialogState::BotMenu { username, step: ItemStep::Detail }, Act(Action::ToggleStatus)) => {
            management::toggle_bot(ctx, username, deps).await
        }
        (DialogState::BotMenu { username, step: ItemStep::ConfirmDelete }, Act(Action::ConfirmDelete)) => {
            management::delete_bot(&username, deps).await
        }
        (DialogState::BotMenu { username, step: ItemStep::ConfirmDelete }, Act(Action::CancelDelete)) => {
            ctx.switch_to(DialogState::BotMenu {
                username,
                step: ItemStep::Detail,
            })
        }
        (DialogState::BotMenu { .. }, _) => ctx,
    }
}

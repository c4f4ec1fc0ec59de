//! Dialog states and the per-conversation context threaded through each step.

use crate::store::OpStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddChannelStep {
    AwaitForward,
    AwaitUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddBotStep {
    AwaitUsername,
    AwaitUrl,
    AwaitName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStep {
    Detail,
    ConfirmDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    /// Parent admin menu; no dialog running.
    AdminMenu,
    OpMenu,
    AddChannel(AddChannelStep),
    AddBot(AddBotStep),
    ChannelMenu { id: i64, step: ItemStep },
    BotMenu { username: String, step: ItemStep },
}

/// Which prompt or error variant the current window shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MsgType {
    #[default]
    Start,
    NotForwarded,
    ErrorFormat,
    AlreadyExists,
    Error,
}

/// Outcome of a registration flow, shown once on the OP menu it lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ChannelAdded,
    ChannelExists,
    ChannelFailed,
    BotAdded,
    BotExists,
    BotFailed,
}

/// Channel identity taken from a forwarded post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDraft {
    pub id: i64,
    pub name: String,
    /// Empty when the channel has no public handle.
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotDraft {
    pub username: Option<String>,
    pub url: Option<String>,
}

/// Everything a conversation carries between events. Replaced, never mutated
/// in place, by each step; starting a new dialog drops the scratch fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogContext {
    pub state: DialogState,
    pub msg_type: MsgType,
    pub channel_draft: Option<ChannelDraft>,
    pub bot_draft: BotDraft,
    pub notice: Option<Notice>,
}

impl Default for DialogContext {
    fn default() -> Self {
        Self::start(DialogState::AdminMenu)
    }
}

impl DialogContext {
    /// Begin a dialog at `state` with empty scratch data.
    pub fn start(state: DialogState) -> Self {
        Self {
            state,
            msg_type: MsgType::Start,
            channel_draft: None,
            bot_draft: BotDraft::default(),
            notice: None,
        }
    }

    /// End the running flow and land on the OP menu.
    pub fn done(notice: Option<Notice>) -> Self {
        Self {
            notice,
            ..Self::start(DialogState::OpMenu)
        }
    }

    /// Move within the same dialog, keeping scratch data.
    pub fn switch_to(self, state: DialogState) -> Self {
        Self { state, ..self }
    }

    pub fn with_msg(self, msg_type: MsgType) -> Self {
        Self { msg_type, ..self }
    }

    /// True while a multi-step input flow is waiting for text or a forward.
    pub fn expects_input(&self) -> bool {
        matches!(self.state, DialogState::AddChannel(_) | DialogState::AddBot(_))
    }
}

/// Status given to fresh entries.
#[derive(Debug, Clone, Copy)]
pub struct Defaults {
    pub status: OpStatus,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            status: OpStatus::Inactive,
        }
    }
}

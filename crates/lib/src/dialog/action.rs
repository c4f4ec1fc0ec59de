//! Button payloads. Encoded into Telegram `callback_data` (max 64 bytes).

/// Everything a button in the admin UI or the gate reply can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open (or refresh) the OP menu; also every "back" button inside a sub-dialog.
    OpenOpMenu,
    /// Leave the OP menu for the admin parent menu.
    CloseOpMenu,
    AddChannel,
    AddBot,
    OpenChannel(i64),
    OpenBot(String),
    /// Use `https://t.me/<username>` as the bot link.
    DefaultBotUrl,
    AskDelete,
    ConfirmDelete,
    CancelDelete,
    ToggleStatus,
    /// Headers and disabled buttons.
    Noop,
    /// Re-run the membership gate (end users).
    CheckSubscription,
}

impl Action {
    pub fn encode(&self) -> String {
        match self {
            Action::OpenOpMenu => "op:menu".to_string(),
            Action::CloseOpMenu => "op:done".to_string(),
            Action::AddChannel => "op:add_channel".to_string(),
            Action::AddBot => "op:add_bot".to_string(),
            Action::OpenChannel(id) => format!("ch:{}", id),
            Action::OpenBot(username) => format!("bot:{}", username),
            Action::DefaultBotUrl => "add:default_url".to_string(),
            Action::AskDelete => "item:delete".to_string(),
            Action::ConfirmDelete => "item:delete_yes".to_string(),
            Action::CancelDelete => "item:delete_no".to_string(),
            Action::ToggleStatus => "item:toggle".to_string(),
            Action::Noop => "noop".to_string(),
            Action::CheckSubscription => "sub:check".to_string(),
        }
    }

    /// `None` for payloads this bot never produced.
    pub fn decode(data: &str) -> Option<Self> {
        let action = match data {
            "op:menu" => Action::OpenOpMenu,
            "op:done" => Action::CloseOpMenu,
            "op:add_channel" => Action::AddChannel,
            "op:add_bot" => Action::AddBot,
            "add:default_url" => Action::DefaultBotUrl,
            "item:delete" => Action::AskDelete,
            "item:delete_yes" => Action::ConfirmDelete,
            "item:delete_no" => Action::CancelDelete,
            "item:toggle" => Action::ToggleStatus,
            "noop" => Action::Noop,
            "sub:check" => Action::CheckSubscription,
            other => {
                if let Some(id) = other.strip_prefix("ch:") {
                    Action::OpenChannel(id.parse().ok()?)
                } else if let Some(username) = other.strip_prefix("bot:") {
                    if username.is_empty() {
                        return None;
                    }
                    Action::OpenBot(username.to_string())
                } else {
                    return None;
                }
            }
        };
        Some(action)
    }
}

//! Inbound events from the messaging platform, independent of its wire format.

/// Chat a message was forwarded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedChat {
    pub id: i64,
    /// Channel title (or full name for private chats).
    pub name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IncomingMessage {
    pub text: Option<String>,
    pub forwarded_from: Option<ForwardedChat>,
}

impl IncomingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            forwarded_from: None,
        }
    }

    pub fn forwarded(chat: ForwardedChat) -> Self {
        Self {
            text: None,
            forwarded_from: Some(chat),
        }
    }
}

/// An inline keyboard button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPress {
    pub callback_id: String,
    /// Message carrying the keyboard; edited in place when present.
    pub message_id: Option<i64>,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    Message(IncomingMessage),
    Button(ButtonPress),
}

/// One event for one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub user_id: i64,
    pub kind: InboundKind,
}

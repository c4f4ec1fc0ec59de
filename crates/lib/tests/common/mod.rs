//! Shared fakes for the integration tests: a recording transport, a scripted
//! membership source and a store that always fails.
#![allow(dead_code)]

use async_trait::async_trait;
use lib::dialog::{step, DialogContext, DialogDeps, DialogEvent};
use lib::gate::{GateError, MemberRole, MembershipQuery};
use lib::store::{
    Bot, BotStore, Channel, ChannelStore, NewBot, NewChannel, OpStatus, StoreError, Stores,
};
use lib::transport::{ForwardedChat, IncomingMessage, Transport, TransportError, View};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One outbound call seen by [`RecordingTransport`].
#[derive(Debug, Clone)]
pub enum Sent {
    New { chat_id: i64, view: View },
    Edit { chat_id: i64, message_id: i64, view: View },
    Answer { callback_id: String },
}

#[derive(Default)]
pub struct RecordingTransport {
    pub calls: Mutex<Vec<Sent>>,
    pub fail_edits: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_edits() -> Self {
        Self {
            fail_edits: true,
            ..Self::default()
        }
    }

    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Views from sends and edits, in order, without callback answers.
    pub fn views(&self) -> Vec<View> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Sent::New { view, .. } | Sent::Edit { view, .. } => Some(view.clone()),
                Sent::Answer { .. } => None,
            })
            .collect()
    }

    pub fn answers(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|s| matches!(s, Sent::Answer { .. }))
            .count()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_view(&self, chat_id: i64, view: &View) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Sent::New {
            chat_id,
            view: view.clone(),
        });
        Ok(())
    }

    async fn edit_view(&self, chat_id: i64, message_id: i64, view: &View) -> Result<(), TransportError> {
        if self.fail_edits {
            return Err(TransportError::Api("message can't be edited".to_string()));
        }
        self.calls.lock().unwrap().push(Sent::Edit {
            chat_id,
            message_id,
            view: view.clone(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, _text: Option<&str>) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Sent::Answer {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }
}

/// Membership answers per chat. Chats without an entry fail the query.
#[derive(Default)]
pub struct ScriptedMembership {
    roles: HashMap<i64, &'static str>,
    pub queried: Mutex<Vec<i64>>,
}

impl ScriptedMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, chat_id: i64, role: &'static str) -> Self {
        self.roles.insert(chat_id, role);
        self
    }

    pub fn queried(&self) -> Vec<i64> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl MembershipQuery for ScriptedMembership {
    async fn get_membership_role(&self, chat_id: i64, _user_id: i64) -> Result<MemberRole, GateError> {
        self.queried.lock().unwrap().push(chat_id);
        match self.roles.get(&chat_id) {
            Some(role) => Ok(MemberRole::parse(role)),
            None => Err(GateError::Query("Bad Request: chat not found".to_string())),
        }
    }
}

/// Every call fails with a storage error.
pub struct BrokenStore;

fn broken() -> StoreError {
    StoreError::Storage("connection refused".to_string())
}

#[async_trait]
impl ChannelStore for BrokenStore {
    async fn add_channel(&self, _channel: NewChannel) -> Result<(), StoreError> {
        Err(broken())
    }
    async fn get_channel(&self, _id: i64) -> Result<Option<Channel>, StoreError> {
        Err(broken())
    }
    async fn get_all_channels(&self) -> Result<Vec<Channel>, StoreError> {
        Err(broken())
    }
    async fn update_channel_status(&self, _status: OpStatus, _id: i64) -> Result<(), StoreError> {
        Err(broken())
    }
    async fn delete_channel(&self, _id: i64) -> Result<(), StoreError> {
        Err(broken())
    }
}

#[async_trait]
impl BotStore for BrokenStore {
    async fn add_bot(&self, _bot: NewBot) -> Result<(), StoreError> {
        Err(broken())
    }
    async fn get_bot(&self, _username: &str) -> Result<Option<Bot>, StoreError> {
        Err(broken())
    }
    async fn get_all_bots(&self) -> Result<Vec<Bot>, StoreError> {
        Err(broken())
    }
    async fn update_bot_status(&self, _status: OpStatus, _username: &str) -> Result<(), StoreError> {
        Err(broken())
    }
    async fn delete_bot(&self, _username: &str) -> Result<(), StoreError> {
        Err(broken())
    }
}

pub fn broken_stores() -> Stores {
    Stores::from_backend(Arc::new(BrokenStore))
}

pub fn new_channel(id: i64, name: &str, status: OpStatus) -> NewChannel {
    NewChannel {
        id,
        name: name.to_string(),
        username: None,
        url: format!("https://t.me/+chan{}", id.unsigned_abs()),
        status,
    }
}

pub fn new_bot(username: &str, name: &str, status: OpStatus) -> NewBot {
    NewBot {
        username: username.to_string(),
        name: name.to_string(),
        url: format!("https://t.me/{}", username),
        status,
    }
}

pub fn forward_from(id: i64, title: Option<&str>, username: Option<&str>) -> IncomingMessage {
    IncomingMessage::forwarded(ForwardedChat {
        id,
        name: title.map(str::to_string),
        username: username.map(str::to_string),
    })
}

pub fn text(t: &str) -> DialogEvent {
    DialogEvent::Message(IncomingMessage::text(t))
}

/// Apply events in order, returning the final context.
pub async fn drive(mut ctx: DialogContext, events: Vec<DialogEvent>, deps: &DialogDeps) -> DialogContext {
    for event in events {
        ctx = step(ctx, event, deps).await;
    }
    ctx
}

//! Inbound dispatch: admin events drive the dialog engine, everyone else
//! goes through the membership gate.
//!
//! Button presses are always acknowledged and edit the message that carried
//! the keyboard; text inputs are answered with a fresh message.

use crate::config::{AdminsConfig, Config, SubscriptionConfig};
use crate::dialog::{self, admin_menu, Action, DialogDeps, DialogEvent};
use crate::gate::{self, GateOptions, MembershipQuery};
use crate::session::{SessionKey, SessionStore};
use crate::store::{OpStatus, Stores};
use crate::transport::{ButtonPress, InboundEvent, InboundKind, IncomingMessage, Transport, View};

const ADMIN_COMMANDS: [&str; 2] = ["/start", "/admin"];

/// `/start@my_bot` counts as `/start`.
fn is_admin_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or("");
    let command = command.split('@').next().unwrap_or("");
    ADMIN_COMMANDS.contains(&command)
}

/// Routes each inbound event to the right handler and sends the result.
pub struct InboundRouter {
    deps: DialogDeps,
    sessions: SessionStore,
    admins: AdminsConfig,
    gate: GateOptions,
    passed_text: String,
}

impl InboundRouter {
    pub fn new(deps: DialogDeps, admins: AdminsConfig, subscription: &SubscriptionConfig) -> Self {
        Self {
            deps,
            sessions: SessionStore::new(),
            admins,
            gate: GateOptions::from(subscription),
            passed_text: subscription.passed_text.clone(),
        }
    }

    pub fn from_config(config: &Config, stores: Stores) -> Self {
        let deps = DialogDeps::new(stores)
            .with_default_status(OpStatus::from_active(config.subscription.default_active));
        Self::new(deps, config.admins.clone(), &config.subscription)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn stores(&self) -> &Stores {
        &self.deps.stores
    }

    /// Handle one event to completion. Failures are logged, never returned.
    pub async fn handle(
        &self,
        event: InboundEvent,
        transport: &dyn Transport,
        membership: &dyn MembershipQuery,
    ) {
        let key = SessionKey::new(event.chat_id, event.user_id);
        let is_admin = self.admins.is_admin(event.user_id);
        match (is_admin, event.kind) {
            (true, InboundKind::Message(msg)) => self.admin_message(key, msg, transport).await,
            (true, InboundKind::Button(press)) => self.admin_button(key, press, transport).await,
            (false, InboundKind::Message(_)) => {
                self.gate_message(event.chat_id, event.user_id, transport, membership)
                    .await
            }
            (false, InboundKind::Button(press)) => {
                self.gate_button(event.chat_id, event.user_id, press, transport, membership)
                    .await
            }
        }
    }

    async fn admin_message(&self, key: SessionKey, msg: IncomingMessage, transport: &dyn Transport) {
        if msg.forwarded_from.is_none() && msg.text.as_deref().is_some_and(is_admin_command) {
            log::debug!("routing: admin {} opened the admin menu", key.user_id);
            self.sessions.reset(key).await;
            send(transport, key.chat_id, &admin_menu()).await;
            return;
        }

        let ctx = self.sessions.get(key).await;
        if !ctx.expects_input() {
            log::debug!("routing: admin {} sent a message outside a dialog, ignoring", key.user_id);
            return;
        }
        let next = dialog::step(ctx, DialogEvent::Message(msg), &self.deps).await;
        let view = dialog::render(&next, &self.deps).await;
        self.sessions.replace(key, next).await;
        send(transport, key.chat_id, &view).await;
    }

    async fn admin_button(&self, key: SessionKey, press: ButtonPress, transport: &dyn Transport) {
        answer(transport, &press.callback_id, None).await;

        let Some(action) = Action::decode(&press.data) else {
            log::debug!("routing: unknown button payload {:?}, ignoring", press.data);
            return;
        };
        if matches!(action, Action::Noop | Action::CheckSubscription) {
            return;
        }

        let ctx = self.sessions.get(key).await;
        let next = dialog::step(ctx, DialogEvent::Action(action), &self.deps).await;
        let view = dialog::render(&next, &self.deps).await;
        self.sessions.replace(key, next).await;
        show(transport, key.chat_id, press.message_id, &view).await;
    }

    async fn gate_message(
        &self,
        chat_id: i64,
        user_id: i64,
        transport: &dyn Transport,
        membership: &dyn MembershipQuery,
    ) {
        let report = match gate::check_subscription(&self.deps.stores, membership, user_id, self.gate).await {
            Ok(r) => r,
            Err(e) => {
                log::error!("gate: check for user {} failed: {}", user_id, e);
                return;
            }
        };
        if !report.is_satisfied() {
            send(transport, chat_id, &gate::gate_view(&report)).await;
        }
    }

    async fn gate_button(
        &self,
        chat_id: i64,
        user_id: i64,
        press: ButtonPress,
        transport: &dyn Transport,
        membership: &dyn MembershipQuery,
    ) {
        answer(transport, &press.callback_id, None).await;

        let report = match gate::check_subscription(&self.deps.stores, membership, user_id, self.gate).await {
            Ok(r) => r,
            Err(e) => {
                log::error!("gate: check for user {} failed: {}", user_id, e);
                return;
            }
        };
        let is_check = Action::decode(&press.data) == Some(Action::CheckSubscription);
        if !report.is_satisfied() {
            show(transport, chat_id, press.message_id, &gate::gate_view(&report)).await;
        } else if is_check {
            log::info!("gate: user {} passed the subscription check", user_id);
            show(transport, chat_id, press.message_id, &View::new(self.passed_text.as_str())).await;
        }
    }
}

async fn answer(transport: &dyn Transport, callback_id: &str, text: Option<&str>) {
    if let Err(e) = transport.answer_callback(callback_id, text).await {
        log::warn!("routing: answering button press failed: {}", e);
    }
}

async fn send(transport: &dyn Transport, chat_id: i64, view: &View) {
    if let Err(e) = transport.send_view(chat_id, view).await {
        log::warn!("routing: sending to chat {} failed: {}", chat_id, e);
    }
}

/// Edit the message that carried the keyboard, or send a new one when it cannot be edited.
async fn show(transport: &dyn Transport, chat_id: i64, message_id: Option<i64>, view: &View) {
    if let Some(message_id) = message_id {
        match transport.edit_view(chat_id, message_id, view).await {
            Ok(()) => return,
            Err(e) => log::debug!("routing: edit of message {} failed, sending new: {}", message_id, e),
        }
    }
    send(transport, chat_id, view).await;
}

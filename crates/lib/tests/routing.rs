mod common;

use common::{forward_from, new_channel, RecordingTransport, ScriptedMembership, Sent};
use lib::config::{AdminsConfig, SubscriptionConfig};
use lib::dialog::{Action, DialogDeps, DialogState, ADMIN_MENU_TEXT};
use lib::gate::GATE_TEXT;
use lib::routing::InboundRouter;
use lib::session::SessionKey;
use lib::store::{OpStatus, Stores};
use lib::transport::{ButtonPress, InboundEvent, InboundKind, IncomingMessage};

const ADMIN: i64 = 100;
const USER: i64 = 200;
const CHAT: i64 = 300;

fn router(stores: Stores) -> InboundRouter {
    let admins = AdminsConfig {
        user_ids: vec![ADMIN],
    };
    InboundRouter::new(DialogDeps::new(stores), admins, &SubscriptionConfig::default())
}

fn message(user_id: i64, msg: IncomingMessage) -> InboundEvent {
    InboundEvent {
        chat_id: CHAT,
        user_id,
        kind: InboundKind::Message(msg),
    }
}

fn button(user_id: i64, action: Action) -> InboundEvent {
    InboundEvent {
        chat_id: CHAT,
        user_id,
        kind: InboundKind::Button(ButtonPress {
            callback_id: "cb".to_string(),
            message_id: Some(9),
            data: action.encode(),
        }),
    }
}

#[tokio::test]
async fn admin_start_opens_admin_menu() {
    let router = router(Stores::in_memory());
    let transport = RecordingTransport::new();
    let membership = ScriptedMembership::new();

    router
        .handle(message(ADMIN, IncomingMessage::text("/start")), &transport, &membership)
        .await;

    let calls = transport.take();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Sent::New { chat_id, view } => {
            assert_eq!(*chat_id, CHAT);
            assert_eq!(view.text, ADMIN_MENU_TEXT);
        }
        other => panic!("expected a new message, got {:?}", other),
    }
    assert!(membership.queried().is_empty());
}

#[tokio::test]
async fn admin_registers_channel_through_router() {
    let router = router(Stores::in_memory());
    let transport = RecordingTransport::new();
    let membership = ScriptedMembership::new();

    router.handle(button(ADMIN, Action::OpenOpMenu), &transport, &membership).await;
    router.handle(button(ADMIN, Action::AddChannel), &transport, &membership).await;
    let calls = transport.take();
    assert_eq!(calls.iter().filter(|c| matches!(c, Sent::Answer { .. })).count(), 2);
    assert!(matches!(calls.last(), Some(Sent::Edit { message_id: 9, .. })));

    router
        .handle(
            message(ADMIN, forward_from(555, Some("Example"), None)),
            &transport,
            &membership,
        )
        .await;
    router
        .handle(
            message(ADMIN, IncomingMessage::text("https://t.me/examplechan")),
            &transport,
            &membership,
        )
        .await;

    let views = transport.views();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].text, "🔗 Отправьте ссылку на канал");
    assert!(views[1].text.starts_with("✅ Канал добавлен"));
    assert!(router.stores().channels.get_channel(555).await.unwrap().is_some());

    let ctx = router.sessions().get(SessionKey::new(CHAT, ADMIN)).await;
    assert_eq!(ctx.state, DialogState::OpMenu);
}

#[tokio::test]
async fn admin_text_outside_a_dialog_is_ignored() {
    let router = router(Stores::in_memory());
    let transport = RecordingTransport::new();
    let membership = ScriptedMembership::new();
    router
        .handle(message(ADMIN, IncomingMessage::text("hi")), &transport, &membership)
        .await;
    assert!(transport.take().is_empty());
}

#[tokio::test]
async fn admin_command_resets_running_dialog() {
    let router = router(Stores::in_memory());
    let transport = RecordingTransport::new();
    let membership = ScriptedMembership::new();
    router.handle(button(ADMIN, Action::OpenOpMenu), &transport, &membership).await;
    router.handle(button(ADMIN, Action::AddBot), &transport, &membership).await;
    router
        .handle(message(ADMIN, IncomingMessage::text("/admin")), &transport, &membership)
        .await;
    let ctx = router.sessions().get(SessionKey::new(CHAT, ADMIN)).await;
    assert_eq!(ctx.state, DialogState::AdminMenu);
}

#[tokio::test]
async fn user_missing_a_channel_gets_gate_reply() {
    let stores = Stores::in_memory();
    stores.channels.add_channel(new_channel(1, "One", OpStatus::Active)).await.unwrap();
    let router = router(stores);
    let transport = RecordingTransport::new();
    let membership = ScriptedMembership::new().role(1, "left");

    router
        .handle(message(USER, IncomingMessage::text("hello")), &transport, &membership)
        .await;

    let views = transport.views();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].text, GATE_TEXT);
    assert!(views[0].find_button("One").is_some());
}

#[tokio::test]
async fn joined_user_message_gets_no_reply() {
    let stores = Stores::in_memory();
    stores.channels.add_channel(new_channel(1, "One", OpStatus::Active)).await.unwrap();
    let router = router(stores);
    let transport = RecordingTransport::new();
    let membership = ScriptedMembership::new().role(1, "member");

    router
        .handle(message(USER, IncomingMessage::text("hello")), &transport, &membership)
        .await;
    assert!(transport.take().is_empty());
    assert_eq!(membership.queried(), vec![1]);
}

#[tokio::test]
async fn check_button_confirms_when_joined() {
    let stores = Stores::in_memory();
    stores.channels.add_channel(new_channel(1, "One", OpStatus::Active)).await.unwrap();
    let router = router(stores);
    let transport = RecordingTransport::new();
    let membership = ScriptedMembership::new().role(1, "member");

    router
        .handle(button(USER, Action::CheckSubscription), &transport, &membership)
        .await;

    assert_eq!(transport.answers(), 1);
    let views = transport.views();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].text, SubscriptionConfig::default().passed_text);
}

#[tokio::test]
async fn uneditable_message_falls_back_to_new_message() {
    let stores = Stores::in_memory();
    stores.channels.add_channel(new_channel(1, "One", OpStatus::Active)).await.unwrap();
    let router = router(stores);
    let transport = RecordingTransport::failing_edits();
    let membership = ScriptedMembership::new();

    router
        .handle(button(USER, Action::CheckSubscription), &transport, &membership)
        .await;

    let calls = transport.take();
    assert!(matches!(calls.last(), Some(Sent::New { view, .. }) if view.text == GATE_TEXT));
}

#[tokio::test]
async fn unknown_button_payload_is_only_acknowledged() {
    let router = router(Stores::in_memory());
    let transport = RecordingTransport::new();
    let membership = ScriptedMembership::new();
    let event = InboundEvent {
        chat_id: CHAT,
        user_id: ADMIN,
        kind: InboundKind::Button(ButtonPress {
            callback_id: "cb".to_string(),
            message_id: Some(9),
            data: "legacy:payload".to_string(),
        }),
    };
    router.handle(event, &transport, &membership).await;
    let calls = transport.take();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], Sent::Answer { .. }));
}

mod common;

use common::{broken_stores, drive, forward_from, new_channel, text};
use lib::dialog::{
    render, step, AddChannelStep, DialogContext, DialogDeps, DialogEvent, DialogState, MsgType,
    Notice,
};
use lib::store::{OpStatus, Stores};

fn awaiting_forward() -> DialogContext {
    DialogContext::start(DialogState::AddChannel(AddChannelStep::AwaitForward))
}

#[tokio::test]
async fn forward_then_link_stores_channel_and_returns_to_op_menu() {
    let deps = DialogDeps::new(Stores::in_memory());
    let ctx = drive(
        awaiting_forward(),
        vec![
            DialogEvent::Message(forward_from(555, Some("Example"), Some("examplechan"))),
            text("https://t.me/examplechan"),
        ],
        &deps,
    )
    .await;

    assert_eq!(ctx.state, DialogState::OpMenu);
    assert_eq!(ctx.notice, Some(Notice::ChannelAdded));
    assert!(ctx.channel_draft.is_none());

    let stored = deps.stores.channels.get_channel(555).await.unwrap().unwrap();
    assert_eq!(stored.name, "Example");
    assert_eq!(stored.username.as_deref(), Some("examplechan"));
    assert_eq!(stored.url, "https://t.me/examplechan");
    assert_eq!(stored.status, OpStatus::Inactive);

    let view = render(&ctx, &deps).await;
    assert!(view.text.starts_with("✅ Канал добавлен"));
    assert!(view.find_button("Example").is_some());
}

#[tokio::test]
async fn configured_default_status_applies_to_new_channels() {
    let deps = DialogDeps::new(Stores::in_memory()).with_default_status(OpStatus::Active);
    drive(
        awaiting_forward(),
        vec![
            DialogEvent::Message(forward_from(-100777, Some("Active one"), None)),
            text("  https://t.me/+abc  "),
        ],
        &deps,
    )
    .await;
    let stored = deps.stores.channels.get_channel(-100777).await.unwrap().unwrap();
    assert_eq!(stored.status, OpStatus::Active);
    assert_eq!(stored.url, "https://t.me/+abc");
    assert_eq!(stored.username, None);
}

#[tokio::test]
async fn plain_text_instead_of_forward_keeps_waiting() {
    let deps = DialogDeps::new(Stores::in_memory());
    let ctx = step(awaiting_forward(), text("hello"), &deps).await;
    assert_eq!(ctx.state, DialogState::AddChannel(AddChannelStep::AwaitForward));
    assert_eq!(ctx.msg_type, MsgType::NotForwarded);
    assert_eq!(render(&ctx, &deps).await.text, "❌ Отправьте пост с канала!");
}

#[tokio::test]
async fn untitled_chat_gets_placeholder_name() {
    let deps = DialogDeps::new(Stores::in_memory());
    let ctx = step(
        awaiting_forward(),
        DialogEvent::Message(forward_from(42, None, None)),
        &deps,
    )
    .await;
    let draft = ctx.channel_draft.expect("draft stashed");
    assert_eq!(draft.name, "Unnamed Channel");
    assert_eq!(draft.username, "");
}

#[tokio::test]
async fn link_must_be_text() {
    let deps = DialogDeps::new(Stores::in_memory());
    let ctx = step(
        awaiting_forward(),
        DialogEvent::Message(forward_from(555, Some("Example"), None)),
        &deps,
    )
    .await;
    let ctx = step(
        ctx,
        DialogEvent::Message(forward_from(555, Some("Example"), None)),
        &deps,
    )
    .await;
    assert_eq!(ctx.state, DialogState::AddChannel(AddChannelStep::AwaitUrl));
    assert_eq!(ctx.msg_type, MsgType::ErrorFormat);

    let ctx = step(ctx, text("   "), &deps).await;
    assert_eq!(ctx.msg_type, MsgType::ErrorFormat);
    assert!(deps.stores.channels.get_channel(555).await.unwrap().is_none());
}

#[tokio::test]
async fn forwarding_a_registered_channel_does_not_duplicate_it() {
    let deps = DialogDeps::new(Stores::in_memory());
    deps.stores
        .channels
        .add_channel(new_channel(555, "Original", OpStatus::Active))
        .await
        .unwrap();

    let ctx = step(
        awaiting_forward(),
        DialogEvent::Message(forward_from(555, Some("Renamed"), None)),
        &deps,
    )
    .await;
    assert_eq!(ctx.state, DialogState::AddChannel(AddChannelStep::AwaitUrl));
    assert_eq!(ctx.msg_type, MsgType::AlreadyExists);
    assert!(ctx.channel_draft.is_none());
    assert_eq!(render(&ctx, &deps).await.text, "⚠️ Канал уже существует!");

    let ctx = step(ctx, text("https://t.me/other"), &deps).await;
    assert_eq!(ctx.state, DialogState::OpMenu);
    assert_eq!(ctx.notice, Some(Notice::ChannelFailed));

    let all = deps.stores.channels.get_all_channels().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Original");
    assert_eq!(all[0].status, OpStatus::Active);
}

#[tokio::test]
async fn lookup_failure_keeps_waiting_for_forward() {
    let deps = DialogDeps::new(broken_stores());
    let ctx = step(
        awaiting_forward(),
        DialogEvent::Message(forward_from(555, Some("Example"), None)),
        &deps,
    )
    .await;
    assert_eq!(ctx.state, DialogState::AddChannel(AddChannelStep::AwaitForward));
    assert_eq!(ctx.msg_type, MsgType::Error);
}

#[tokio::test]
async fn storage_failure_on_insert_ends_flow_with_notice() {
    let deps = DialogDeps::new(Stores::in_memory());
    let ctx = step(
        awaiting_forward(),
        DialogEvent::Message(forward_from(555, Some("Example"), None)),
        &deps,
    )
    .await;
    let broken = DialogDeps::new(broken_stores());
    let ctx = step(ctx, text("https://t.me/examplechan"), &broken).await;
    assert_eq!(ctx, DialogContext::done(Some(Notice::ChannelFailed)));
}

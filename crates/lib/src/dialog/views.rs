//! Screens for every dialog state. Pure functions of the context and store contents.

use super::action::Action;
use super::state::{AddBotStep, AddChannelStep, DialogContext, DialogState, ItemStep, MsgType, Notice};
use super::DialogDeps;
use crate::store::{Bot, Channel};
use crate::transport::{escape_html, Button, View};

pub const ADMIN_MENU_TEXT: &str = "🔧 Выберите действие";
const OP_MENU_BUTTON: &str = "📢 Обязательная подписка";
const BACK: &str = "◄ Назад";
const OP_REMOVE: &str = "🚫 Убрать из ОП";
const OP_ADD: &str = "➕ Добавить в ОП";

fn back_to_op_menu() -> Button {
    Button::callback(BACK, Action::OpenOpMenu.encode())
}

fn op_button_label(active: bool) -> &'static str {
    if active {
        OP_REMOVE
    } else {
        OP_ADD
    }
}

fn status_label(active: bool) -> &'static str {
    if active {
        "✅ Активен"
    } else {
        "❌ Неактивен"
    }
}

fn notice_text(notice: Notice) -> &'static str {
    match notice {
        Notice::ChannelAdded => "✅ Канал добавлен",
        Notice::ChannelExists => "⚠️ Канал уже существует!",
        Notice::ChannelFailed => "❌ Произошла ошибка при добавлении канала!",
        Notice::BotAdded => "✅ Бот добавлен",
        Notice::BotExists => "⚠️ Бот с таким username уже существует!",
        Notice::BotFailed => "❌ Произошла ошибка при добавлении бота!",
    }
}

pub fn admin_menu() -> View {
    View::new(ADMIN_MENU_TEXT).button(Button::callback(OP_MENU_BUTTON, Action::OpenOpMenu.encode()))
}

pub async fn render(ctx: &DialogContext, deps: &DialogDeps) -> View {
    match &ctx.state {
        DialogState::AdminMenu => admin_menu(),
        DialogState::OpMenu => op_menu(ctx.notice, deps).await,
        DialogState::AddChannel(step) => add_channel(*step, ctx.msg_type),
        DialogState::AddBot(step) => add_bot(*step, ctx.msg_type),
        DialogState::ChannelMenu { id, step: ItemStep::Detail } => channel_detail(*id, deps).await,
        DialogState::ChannelMenu { step: ItemStep::ConfirmDelete, .. } => {
            confirm_delete("⚠️ Вы уверены, что хотите удалить канал?")
        }
        DialogState::BotMenu { username, step: ItemStep::Detail } => bot_detail(username, deps).await,
        DialogState::BotMenu { step: ItemStep::ConfirmDelete, .. } => {
            confirm_delete("⚠️ Вы уверены, что хотите удалить бота?")
        }
    }
}

async fn op_menu(notice: Option<Notice>, deps: &DialogDeps) -> View {
    let channels = deps.stores.channels.get_all_channels().await;
    let bots = deps.stores.bots.get_all_bots().await;
    let (channels, bots) = match (channels, bots) {
        (Ok(c), Ok(b)) => (c, b),
        (Err(e), _) | (_, Err(e)) => {
            log::error!("op menu: loading entries failed: {}", e);
            return View::new("❌ Произошла ошибка при загрузке списка")
                .button(Button::callback(BACK, Action::CloseOpMenu.encode()));
        }
    };
    op_menu_view(notice, &channels, &bots)
}

pub fn op_menu_view(notice: Option<Notice>, channels: &[Channel], bots: &[Bot]) -> View {
    let body = if channels.is_empty() && bots.is_empty() {
        "Вы еще ничего не добавили"
    } else {
        "Выберите действие"
    };
    let text = match notice {
        Some(n) => format!("{}\n\n{}", notice_text(n), body),
        None => body.to_string(),
    };

    let mut view = View::new(text);
    if !channels.is_empty() {
        view = view.button(Button::callback("🗂 Каналы", Action::Noop.encode()));
        for c in channels {
            view = view.button(Button::callback(&c.name, Action::OpenChannel(c.id).encode()));
        }
    }
    if !bots.is_empty() {
        view = view.button(Button::callback("🤖 Боты", Action::Noop.encode()));
        for b in bots {
            view = view.button(Button::callback(
                &b.name,
                Action::OpenBot(b.username.clone()).encode(),
            ));
        }
    }
    view.row(vec![
        Button::callback("➕ Добавить канал", Action::AddChannel.encode()),
        Button::callback("➕ Добавить бота", Action::AddBot.encode()),
    ])
    .button(Button::callback(BACK, Action::CloseOpMenu.encode()))
}

fn add_channel(step: AddChannelStep, msg: MsgType) -> View {
    let text = match (step, msg) {
        (AddChannelStep::AwaitForward, MsgType::NotForwarded) => "❌ Отправьте пост с канала!",
        (_, MsgType::Error) => "❌ Произошла ошибка при добавлении канала!",
        (AddChannelStep::AwaitForward, _) => {
            "🔗 Чтобы добавить канал или группу, перешлите любой пост с канала и добавьте бота в канал."
        }
        (AddChannelStep::AwaitUrl, MsgType::AlreadyExists) => "⚠️ Канал уже существует!",
        (AddChannelStep::AwaitUrl, MsgType::ErrorFormat) => "❌ Отправьте ссылку текстовым сообщением!",
        (AddChannelStep::AwaitUrl, _) => "🔗 Отправьте ссылку на канал",
    };
    View::new(text).button(back_to_op_menu())
}

fn add_bot(step: AddBotStep, msg: MsgType) -> View {
    let text = match (step, msg) {
        (AddBotStep::AwaitUsername, MsgType::ErrorFormat) => {
            "❌ Отправьте username бота: латинские буквы, цифры и _, не длиннее 32 символов!"
        }
        (AddBotStep::AwaitUsername, MsgType::AlreadyExists) => {
            "⚠️ Бот с таким username уже существует!"
        }
        (AddBotStep::AwaitUsername, MsgType::Error) => "❌ Произошла ошибка при проверке бота!",
        (AddBotStep::AwaitUsername, _) => "👤 Отправьте username бота (без @)",
        (AddBotStep::AwaitUrl, MsgType::ErrorFormat) => "❌ Неправильный формат ссылки!",
        (AddBotStep::AwaitUrl, _) => "🔗 Отправьте ссылку на бота",
        (AddBotStep::AwaitName, MsgType::ErrorFormat) => "❌ Отправьте текстовое сообщение!",
        (AddBotStep::AwaitName, _) => "📝 Отправьте отображаемое имя бота",
    };
    let mut view = View::new(text);
    if step == AddBotStep::AwaitUrl {
        view = view.button(Button::callback(
            "🔗 Использовать стандартную ссылку",
            Action::DefaultBotUrl.encode(),
        ));
    }
    view.button(back_to_op_menu())
}

/// Missing entries get a placeholder and a disabled toggle.
fn missing_item(text: &str) -> View {
    View::new(text)
        .button(Button::callback("—", Action::Noop.encode()))
        .button(back_to_op_menu())
}

fn item_actions(view: View, delete_label: &str, active: bool) -> View {
    view.row(vec![
        Button::callback(delete_label, Action::AskDelete.encode()),
        Button::callback(op_button_label(active), Action::ToggleStatus.encode()),
    ])
    .button(back_to_op_menu())
}

async fn channel_detail(id: i64, deps: &DialogDeps) -> View {
    match deps.stores.channels.get_channel(id).await {
        Ok(Some(channel)) => channel_detail_view(&channel),
        Ok(None) => missing_item("❌ Канал не найден"),
        Err(e) => {
            log::error!("loading channel {} failed: {}", id, e);
            missing_item("❌ Канал не найден")
        }
    }
}

pub fn channel_detail_view(c: &Channel) -> View {
    let active = c.status.is_active();
    let text = format!(
        "📢 <b>Полная информация о канале</b>\n\n\
         🆔 <b>ID:</b> <code>{}</code>\n\
         📛 <b>Название:</b> {}\n\
         🔗 <b>Username:</b> {}\n\
         📶 <b>Статус в ОП:</b> {}\n\
         🔗 <b>Ссылка:</b> {}\n",
        c.id,
        escape_html(&c.name),
        c.username
            .as_deref()
            .map(|u| format!("@{}", escape_html(u)))
            .unwrap_or_else(|| "не указан".to_string()),
        status_label(active),
        escape_html(&c.url),
    );
    item_actions(View::new(text), "🗑 Удалить канал", active)
}

async fn bot_detail(username: &str, deps: &DialogDeps) -> View {
    match deps.stores.bots.get_bot(username).await {
        Ok(Some(bot)) => bot_detail_view(&bot),
        Ok(None) => missing_item("❌ Бот не найден"),
        Err(e) => {
            log::error!("loading bot @{} failed: {}", username, e);
            missing_item("❌ Бот не найден")
        }
    }
}

pub fn bot_detail_view(b: &Bot) -> View {
    let active = b.status.is_active();
    let text = format!(
        "🤖 <b>Полная информация о боте</b>\n\n\
         📛 <b>Название:</b> {}\n\
         🔗 <b>Username:</b> @{}\n\
         📶 <b>Статус в ОП:</b> {}\n\
         🔗 <b>Ссылка:</b> {}\n",
        escape_html(&b.name),
        escape_html(&b.username),
        status_label(active),
        escape_html(&b.url),
    );
    item_actions(View::new(text), "🗑 Удалить бота", active)
}

fn confirm_delete(text: &str) -> View {
    View::new(text).row(vec![
        Button::callback("❌ Нет", Action::CancelDelete.encode()),
        Button::callback("✅ Да", Action::ConfirmDelete.encode()),
    ])
}

//! Presentation model: message text plus an inline keyboard.

use serde_json::{json, Value};

/// What a button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonKind {
    /// Sends `callback_data` back to the bot.
    Callback(String),
    /// Opens a link on the client.
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub kind: ButtonKind,
}

impl Button {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ButtonKind::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ButtonKind::Url(url.into()),
        }
    }

    fn to_json(&self) -> Value {
        match &self.kind {
            ButtonKind::Callback(data) => json!({ "text": self.label, "callback_data": data }),
            ButtonKind::Url(url) => json!({ "text": self.label, "url": url }),
        }
    }
}

/// A rendered screen. Text is HTML (Telegram `parse_mode = HTML`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub text: String,
    pub rows: Vec<Vec<Button>>,
}

impl View {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, row: Vec<Button>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn button(self, button: Button) -> Self {
        self.row(vec![button])
    }

    /// All buttons, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Find a button by its label (handy in tests and logs).
    pub fn find_button(&self, label: &str) -> Option<&Button> {
        self.buttons().find(|b| b.label == label)
    }

    /// `reply_markup` payload for sendMessage / editMessageText.
    pub fn reply_markup(&self) -> Value {
        let rows: Vec<Vec<Value>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(Button::to_json).collect())
            .collect();
        json!({ "inline_keyboard": rows })
    }
}

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

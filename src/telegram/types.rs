// Serde types for the subset of the Bot API this bot uses. Inbound
// updates arrive on the webhook; keyboard types go out with messages.

use serde::{Deserialize, Serialize};

use crate::menu::{ButtonKind, Rendered};

// ── Inbound ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

impl Update {
    /// The user a private-chat update belongs to. Session state is keyed
    /// by this id.
    pub fn user_id(&self) -> Option<i64> {
        if let Some(cb) = &self.callback_query {
            return Some(cb.from.id);
        }
        if let Some(msg) = &self.message {
            return msg.from.as_ref().map(|u| u.id).or(Some(msg.chat.id));
        }
        None
    }
}

// ── Outbound ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl From<&Rendered> for InlineKeyboardMarkup {
    fn from(rendered: &Rendered) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup {
            inline_keyboard: rendered
                .buttons
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| match &b.kind {
                            ButtonKind::Callback(token) => InlineKeyboardButton {
                                text: b.label.clone(),
                                callback_data: Some(token.clone()),
                                url: None,
                            },
                            ButtonKind::Url(url) => InlineKeyboardButton {
                                text: b.label.clone(),
                                callback_data: None,
                                url: Some(url.clone()),
                            },
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    pub text: String,
    pub request_location: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
}

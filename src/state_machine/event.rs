//! Events delivered by the messaging gateway

use crate::store::UserId;
use chrono::{DateTime, Utc};

/// An event plus the envelope every gateway supplies
#[derive(Debug, Clone)]
pub struct Inbound {
    pub user_id: UserId,
    /// Where replies go
    pub chat_id: i64,
    /// When the platform says the event was sent
    pub sent_at: DateTime<Utc>,
    pub display_name: Option<String>,
    pub event: Event,
}

impl Inbound {
    pub fn new(user_id: UserId, sent_at: DateTime<Utc>, event: Event) -> Self {
        Self {
            user_id,
            chat_id: user_id,
            sent_at,
            display_name: None,
            event,
        }
    }

    pub fn in_chat(mut self, chat_id: i64) -> Self {
        self.chat_id = chat_id;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Slash command, name without the leading `/`
    Command { name: String },
    /// Token of a previously offered option
    OptionSelected { token: String },
    /// Free-form text
    Text { text: String },
}

impl Event {
    pub fn command(name: impl Into<String>) -> Self {
        Event::Command { name: name.into() }
    }

    pub fn option(token: impl Into<String>) -> Self {
        Event::OptionSelected {
            token: token.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Event::Text { text: text.into() }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Event::Command { name } if name == "start")
    }

    /// Split `/name@bot args` into a command; anything else is text
    pub fn from_message_text(text: &str) -> Self {
        match text.strip_prefix('/') {
            Some(rest) => {
                let word = rest.split_whitespace().next().unwrap_or_default();
                let name = word.split('@').next().unwrap_or_default();
                Event::command(name)
            }
            None => Event::text(text),
        }
    }
}

/// Typed form of an option token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddHabit,
    ListHabits,
    DeleteHabit,
    MarkDone,
    Stats,
    EmojiNone,
    Time(String),
    Delete(usize),
    Done(usize),
    Unknown(String),
}

impl Action {
    pub fn parse(token: &str) -> Self {
        match token {
            "add_habit" => return Action::AddHabit,
            "list_habits" => return Action::ListHabits,
            "delete_habit" => return Action::DeleteHabit,
            "mark_done" => return Action::MarkDone,
            "stats" => return Action::Stats,
            "emoji_none" => return Action::EmojiNone,
            _ => {}
        }

        if let Some(time) = token.strip_prefix("time_") {
            return Action::Time(time.to_string());
        }
        let unknown = || Action::Unknown(token.to_string());
        if let Some(index) = token.strip_prefix("del_") {
            return index.parse().map_or_else(|_| unknown(), Action::Delete);
        }
        if let Some(index) = token.strip_prefix("done_") {
            return index.parse().map_or_else(|_| unknown(), Action::Done);
        }
        unknown()
    }
}

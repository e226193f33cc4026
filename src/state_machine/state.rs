//! Conversation state types

use crate::store::Habit;
use chrono::{DateTime, NaiveDate, Utc};

/// Per-user conversation state. Lives in memory only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConvState {
    /// No flow in progress
    #[default]
    Idle,

    /// Waiting for the name of a new habit
    AddingHabit,

    /// Habit created, waiting for an emoji or "no emoji"
    ChoosingEmoji { habit_index: usize },

    /// Waiting for a reminder time for the habit
    SettingTime { habit_index: usize },
}

impl ConvState {
    /// Index of the habit the current flow is configuring
    pub fn current_habit(&self) -> Option<usize> {
        match self {
            ConvState::ChoosingEmoji { habit_index } | ConvState::SettingTime { habit_index } => {
                Some(*habit_index)
            }
            ConvState::Idle | ConvState::AddingHabit => None,
        }
    }

    /// Same state, re-pointed at `habit_index`
    fn with_habit(self, habit_index: usize) -> Self {
        match self {
            ConvState::ChoosingEmoji { .. } => ConvState::ChoosingEmoji { habit_index },
            ConvState::SettingTime { .. } => ConvState::SettingTime { habit_index },
            other => other,
        }
    }

    /// State after the habit at `removed` is deleted from the list
    pub fn after_removal(self, removed: usize) -> Self {
        match self.current_habit() {
            Some(current) if current == removed => ConvState::Idle,
            Some(current) if current > removed => self.with_habit(current - 1),
            _ => self,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::AddingHabit => "adding_habit",
            ConvState::ChoosingEmoji { .. } => "choosing_emoji",
            ConvState::SettingTime { .. } => "setting_time",
        }
    }
}

/// Read-only inputs to a transition
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub now: DateTime<Utc>,
    /// The user's habits, in the order shown to them
    pub habits: Vec<Habit>,
}

impl ConvContext {
    pub fn new(now: DateTime<Utc>, habits: Vec<Habit>) -> Self {
        Self {
            display_name: None,
            is_admin: false,
            now,
            habits,
        }
    }

    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Completion day boundary is UTC
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn habit(&self, index: usize) -> Option<&Habit> {
        self.habits.get(index)
    }
}

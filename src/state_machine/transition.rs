//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! next state and effects. All I/O happens in the runtime.

use super::{Action, ConvContext, ConvState, Effect, Event};
use crate::replies::{self, Reply};
use crate::store::{Emoji, Habit, Mutation, ReminderTime};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_reply(self, reply: Reply) -> Self {
        self.with_effect(Effect::reply(reply))
    }

    /// Mutation followed by a save
    pub fn with_mutation(self, mutation: Mutation) -> Self {
        self.with_effect(Effect::mutate(mutation))
            .with_effect(Effect::Persist)
    }

    #[allow(dead_code)] // Used in tests
    pub fn replies(&self) -> impl Iterator<Item = &Reply> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Reply(reply) => Some(reply),
            _ => None,
        })
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Unknown option token: {0}")]
    UnknownAction(String),
    #[error("Unknown command: /{0}")]
    UnknownCommand(String),
}

/// Pure transition function
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::Command { name } if name == "start" => Ok(start(context)),
        Event::Command { name } => Err(TransitionError::UnknownCommand(name)),
        Event::OptionSelected { token } => option_selected(*state, context, Action::parse(&token)),
        Event::Text { text } => text_received(*state, context, &text),
    }
}

// ============================================================
// /start
// ============================================================

fn start(context: &ConvContext) -> TransitionResult {
    let mut result = TransitionResult::new(ConvState::Idle);
    if context.is_admin {
        result = result.with_reply(replies::admin_greeting());
    }
    result.with_reply(replies::main_menu(context.display_name.as_deref()))
}

// ============================================================
// Option tokens
// ============================================================

fn option_selected(
    state: ConvState,
    context: &ConvContext,
    action: Action,
) -> Result<TransitionResult, TransitionError> {
    let habits = &context.habits;
    let unchanged = TransitionResult::new(state);

    match action {
        Action::AddHabit => {
            Ok(TransitionResult::new(ConvState::AddingHabit).with_reply(replies::ask_habit_name()))
        }

        Action::ListHabits if habits.is_empty() => Ok(unchanged.with_reply(replies::no_habits())),
        Action::ListHabits => {
            Ok(unchanged.with_reply(replies::habit_list(habits, context.today())))
        }

        Action::DeleteHabit if habits.is_empty() => Ok(unchanged.with_reply(replies::no_habits())),
        Action::DeleteHabit => Ok(unchanged.with_reply(replies::delete_picker(habits))),

        Action::MarkDone if habits.is_empty() => Ok(unchanged.with_reply(replies::no_habits())),
        Action::MarkDone => Ok(unchanged.with_reply(replies::done_picker(habits))),

        Action::Stats if habits.is_empty() => Ok(unchanged.with_reply(replies::no_stats())),
        Action::Stats => Ok(unchanged.with_reply(replies::stats(habits, context.today()))),

        Action::EmojiNone => match state {
            ConvState::ChoosingEmoji { habit_index } => {
                Ok(TransitionResult::new(ConvState::SettingTime { habit_index })
                    .with_reply(replies::ask_time_without_emoji()))
            }
            other => Err(invalid(other, "emoji_none")),
        },

        Action::Time(raw) => match state {
            ConvState::SettingTime { habit_index } => Ok(set_time(state, context, habit_index, &raw)),
            other => Err(invalid(other, &format!("time_{raw}"))),
        },

        Action::Delete(index) => match context.habit(index) {
            Some(habit) => Ok(TransitionResult::new(state.after_removal(index))
                .with_mutation(Mutation::Remove { index })
                .with_reply(replies::habit_deleted(habit))),
            // Stale or forged index: nothing to do
            None => Ok(unchanged),
        },

        Action::Done(index) => match context.habit(index) {
            Some(habit) if habit.completed_on(context.today()) => {
                Ok(unchanged.with_reply(replies::already_done(habit)))
            }
            Some(habit) => Ok(unchanged
                .with_mutation(Mutation::MarkDone {
                    index,
                    date: context.today(),
                })
                .with_reply(replies::marked_done(habit, habit.streak.saturating_add(1)))),
            None => Ok(unchanged),
        },

        Action::Unknown(token) => Err(TransitionError::UnknownAction(token)),
    }
}

// ============================================================
// Free text
// ============================================================

fn text_received(
    state: ConvState,
    context: &ConvContext,
    text: &str,
) -> Result<TransitionResult, TransitionError> {
    match state {
        ConvState::Idle => Ok(TransitionResult::new(state).with_reply(replies::start_first())),

        ConvState::AddingHabit => {
            let name = text.trim();
            if name.is_empty() {
                return Ok(TransitionResult::new(state).with_reply(replies::empty_name()));
            }
            let habit_index = context.habits.len();
            Ok(TransitionResult::new(ConvState::ChoosingEmoji { habit_index })
                .with_mutation(Mutation::Append(Habit::new(name, context.now)))
                .with_reply(replies::ask_emoji(name)))
        }

        ConvState::ChoosingEmoji { habit_index } => {
            let Ok(emoji) = Emoji::parse(text) else {
                return Ok(TransitionResult::new(state).with_reply(replies::invalid_emoji()));
            };
            if context.habit(habit_index).is_none() {
                return Ok(TransitionResult::new(ConvState::Idle));
            }
            let reply = replies::ask_time_after_emoji(emoji.as_str());
            Ok(TransitionResult::new(ConvState::SettingTime { habit_index })
                .with_mutation(Mutation::SetEmoji {
                    index: habit_index,
                    emoji,
                })
                .with_reply(reply))
        }

        ConvState::SettingTime { habit_index } => Ok(set_time(state, context, habit_index, text)),
    }
}

fn set_time(state: ConvState, context: &ConvContext, habit_index: usize, raw: &str) -> TransitionResult {
    let Ok(time) = ReminderTime::parse(raw) else {
        return TransitionResult::new(state).with_reply(replies::invalid_time());
    };
    let Some(habit) = context.habit(habit_index) else {
        // Habit vanished mid-flow; end the flow quietly
        return TransitionResult::new(ConvState::Idle);
    };
    let reply = replies::habit_configured(habit, time.as_str());
    TransitionResult::new(ConvState::Idle)
        .with_mutation(Mutation::SetReminder {
            index: habit_index,
            time,
        })
        .with_reply(reply)
}

fn invalid(state: ConvState, token: &str) -> TransitionError {
    TransitionError::InvalidTransition(format!(
        "No transition from {} with option {token}",
        state.name()
    ))
}

//! Telegram side of the bot
//!
//! Turns Telegram updates into [`Inbound`] events for the engine and renders
//! [`Reply`] values back as messages with inline keyboards.

mod telegram;
mod webhook;

pub use telegram::run_polling;
pub use webhook::{run_webhook, WebhookState};

use crate::replies::{self, Reply};
use crate::runtime::{Clock, Engine, Gateway, ProductionEngine};
use crate::state_machine::{Event, Inbound};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MaybeInaccessibleMessage, User};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Delivers replies through the Telegram Bot API
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn send(&self, chat_id: i64, reply: &Reply) -> Result<(), GatewayError> {
        let request = self.bot.send_message(ChatId(chat_id), reply.text.clone());
        if reply.options.is_empty() {
            request.await?;
        } else {
            request.reply_markup(keyboard(reply)).await?;
        }
        Ok(())
    }
}

/// One inline keyboard row per option row
fn keyboard(reply: &Reply) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(reply.options.iter().map(|row| {
        row.iter()
            .map(|option| InlineKeyboardButton::callback(option.label.clone(), option.token.clone()))
            .collect::<Vec<_>>()
    }))
}

fn user_id_of(user: &User) -> Option<i64> {
    i64::try_from(user.id.0).ok()
}

/// Text message to event. Messages without text or sender are skipped.
pub fn inbound_from_message(msg: &Message) -> Option<Inbound> {
    let user = msg.from.as_ref()?;
    let text = msg.text()?;
    let user_id = user_id_of(user)?;
    Some(
        Inbound::new(user_id, msg.date, Event::from_message_text(text))
            .in_chat(msg.chat.id.0)
            .with_display_name(user.first_name.clone()),
    )
}

/// Button press to event
///
/// A press is dated by the message carrying the keyboard. Only when that
/// message is inaccessible does the receive time stand in.
pub fn inbound_from_callback(q: &CallbackQuery, received_at: DateTime<Utc>) -> Option<Inbound> {
    let token = q.data.clone()?;
    let user_id = user_id_of(&q.from)?;
    let (chat_id, sent_at) = match &q.message {
        Some(MaybeInaccessibleMessage::Regular(m)) => (m.chat.id.0, m.date),
        _ => (user_id, received_at),
    };
    Some(
        Inbound::new(user_id, sent_at, Event::option(token))
            .in_chat(chat_id)
            .with_display_name(q.from.first_name.clone()),
    )
}

/// What happens to a button press before the engine sees it
#[derive(Debug, PartialEq, Eq)]
enum CallbackRoute {
    /// Pressed before startup: no answer, no side effects
    Drop,
    /// No `/start` yet: answer with a toast, keep the message
    PromptStart,
    Dispatch,
}

async fn route_callback<G, C>(engine: &Engine<G, C>, inbound: &Inbound) -> CallbackRoute
where
    G: Gateway + 'static,
    C: Clock + 'static,
{
    if engine.is_stale(inbound.sent_at) {
        CallbackRoute::Drop
    } else if engine.has_started(inbound.user_id).await {
        CallbackRoute::Dispatch
    } else {
        CallbackRoute::PromptStart
    }
}

/// Feed a message update to the engine
pub async fn handle_message(engine: &ProductionEngine, msg: &Message) {
    match inbound_from_message(msg) {
        Some(inbound) => engine.dispatch(inbound).await,
        None => tracing::debug!(chat_id = msg.chat.id.0, "Skipping message without text"),
    }
}

/// Acknowledge a button press, remove its keyboard, then feed it to the engine
pub async fn handle_callback(engine: &ProductionEngine, bot: &Bot, q: CallbackQuery) {
    let Some(inbound) = inbound_from_callback(&q, Utc::now()) else {
        tracing::debug!(user_id = q.from.id.0, "Skipping callback without data");
        return;
    };

    match route_callback(engine, &inbound).await {
        CallbackRoute::Drop => {
            tracing::info!(user_id = inbound.user_id, sent_at = %inbound.sent_at, "Ignoring button press sent before startup");
        }
        CallbackRoute::PromptStart => {
            let prompt = replies::start_first();
            if let Err(e) = bot.answer_callback_query(q.id.clone()).text(prompt.text).await {
                tracing::warn!(error = %e, "Failed to answer callback query");
            }
        }
        CallbackRoute::Dispatch => {
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                tracing::warn!(error = %e, "Failed to answer callback query");
            }
            if let Some(MaybeInaccessibleMessage::Regular(m)) = &q.message {
                if let Err(e) = bot.delete_message(m.chat.id, m.id).await {
                    tracing::debug!(error = %e, "Could not delete keyboard message");
                }
            }
            engine.dispatch(inbound).await;
        }
    }
}

//! Habit bot - conversational habit tracker for Telegram
//!
//! A per-user conversation state machine over a JSON-backed habit store.

mod config;
mod gateway;
mod replies;
mod runtime;
mod state_machine;
mod store;

use config::{Config, DeliveryMode};
use gateway::{TelegramGateway, WebhookState};
use runtime::{Engine, JsonFileStorage, ProductionEngine, SystemClock};
use std::sync::Arc;
use store::{HabitStore, JsonFile};
use teloxide::Bot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habit_bot=info,teloxide=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    // Load habits
    tracing::info!(path = %config.habits_file.display(), "Loading habits");
    let storage = Arc::new(JsonFileStorage::new(JsonFile::new(&config.habits_file)));
    let store = Arc::new(HabitStore::load(storage).await);
    let (users, habits) = store.counts();
    tracing::info!(users, habits, "Habit store ready");

    let bot = Bot::new(&config.bot_token);
    let engine: Arc<ProductionEngine> = Arc::new(Engine::new(
        store,
        TelegramGateway::new(bot.clone()),
        SystemClock,
        config.admin_chat_id,
    ));
    engine.announce_startup().await;

    match config.delivery_mode {
        DeliveryMode::Polling => gateway::run_polling(bot, engine, config.poll_interval).await,
        DeliveryMode::Webhook => {
            let state = WebhookState::new(engine, bot, &config.bot_token);
            gateway::run_webhook(state, config.port).await?;
        }
    }

    Ok(())
}

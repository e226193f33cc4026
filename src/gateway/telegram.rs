//! Long-polling delivery

use super::{handle_callback, handle_message};
use crate::runtime::ProductionEngine;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

/// Poll Telegram for updates until Ctrl+C
pub async fn run_polling(bot: Bot, engine: Arc<ProductionEngine>, poll_timeout: Option<Duration>) {
    tracing::info!(timeout_secs = poll_timeout.map(|t| t.as_secs()), "Starting long polling");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let engine = Arc::clone(&engine);
            move |msg: Message| {
                let engine = Arc::clone(&engine);
                async move {
                    handle_message(&engine, &msg).await;
                    respond(())
                }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let engine = Arc::clone(&engine);
            move |q: CallbackQuery, bot: Bot| {
                let engine = Arc::clone(&engine);
                async move {
                    handle_callback(&engine, &bot, q).await;
                    respond(())
                }
            }
        }));

    let mut polling = Polling::builder(bot.clone());
    if let Some(timeout) = poll_timeout {
        polling = polling.timeout(timeout);
    }
    let listener = polling.build();

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("Error from the update listener"),
        )
        .await;

    tracing::info!("Polling stopped");
}

//! Webhook delivery: Telegram posts updates to `/<bot token>`

use super::{handle_callback, handle_message, GatewayError};
use crate::runtime::ProductionEngine;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::types::{Update, UpdateKind};
use teloxide::Bot;
use tower_http::trace::TraceLayer;

/// Shared state for webhook handlers
#[derive(Clone)]
pub struct WebhookState {
    pub engine: Arc<ProductionEngine>,
    pub bot: Bot,
    /// Secret path segment; only posts to `/<token>` are accepted
    pub token: Arc<str>,
}

impl WebhookState {
    pub fn new(engine: Arc<ProductionEngine>, bot: Bot, token: &str) -> Self {
        Self {
            engine,
            bot,
            token: Arc::from(token),
        }
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/:token", post(receive_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the webhook until the process is stopped
pub async fn run_webhook(state: WebhookState, port: u16) -> Result<(), GatewayError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Webhook server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "Bot is running!"
}

async fn receive_update(
    State(state): State<WebhookState>,
    Path(token): Path<String>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if token.as_str() != &*state.token {
        tracing::warn!("Webhook call with wrong token");
        return (StatusCode::NOT_FOUND, "error");
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::error!(error = %e, "Malformed webhook update");
            return (StatusCode::OK, "error");
        }
    };

    match update.kind {
        UpdateKind::Message(msg) => handle_message(&state.engine, &msg).await,
        UpdateKind::CallbackQuery(q) => handle_callback(&state.engine, &state.bot, q).await,
        _ => tracing::debug!(update_id = ?update.id, "Ignoring unsupported update"),
    }
    (StatusCode::OK, "ok")
}

//! Conversation engine: applies transitions and executes their effects

use super::traits::{Clock, Gateway};
use super::SessionTable;
use crate::gateway::GatewayError;
use crate::replies::{self, Reply};
use crate::state_machine::{transition, ConvContext, Effect, Inbound, TransitionError};
use crate::store::{HabitStore, StoreError, UserId};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

/// Faults while handling one event
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Generic engine that can work with any gateway and clock implementation
pub struct Engine<G, C>
where
    G: Gateway + 'static,
    C: Clock + 'static,
{
    store: Arc<HabitStore>,
    sessions: SessionTable,
    gateway: G,
    clock: C,
    /// Events sent before this instant are dropped
    started_at: DateTime<Utc>,
    admin_chat_id: i64,
}

impl<G, C> Engine<G, C>
where
    G: Gateway + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<HabitStore>, gateway: G, clock: C, admin_chat_id: i64) -> Self {
        let started_at = clock.now();
        tracing::info!(%started_at, "Engine started");
        Self {
            store,
            sessions: SessionTable::default(),
            gateway,
            clock,
            started_at,
            admin_chat_id,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[allow(dead_code)] // Used in tests
    pub fn store(&self) -> &HabitStore {
        &self.store
    }

    #[allow(dead_code)] // Used in tests
    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Whether an event sent at `sent_at` predates this process
    pub fn is_stale(&self, sent_at: DateTime<Utc>) -> bool {
        sent_at < self.started_at
    }

    /// Whether the user has sent `/start` since startup
    pub async fn has_started(&self, user_id: UserId) -> bool {
        self.sessions.is_started(user_id).await
    }

    /// Tell the administrator the bot is up
    pub async fn announce_startup(&self) {
        let notice = replies::startup_notice(self.admin_chat_id);
        match self.gateway.send(self.admin_chat_id, &notice).await {
            Ok(()) => tracing::info!(admin_chat_id = self.admin_chat_id, "Startup notice sent"),
            Err(e) => tracing::error!(error = %e, "Failed to send startup notice"),
        }
    }

    /// Handle one event. Never fails and never panics outward; faults are logged.
    pub async fn dispatch(&self, inbound: Inbound) {
        let user_id = inbound.user_id;
        match AssertUnwindSafe(self.handle(inbound)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(EngineError::Transition(e))) => {
                tracing::warn!(user_id, error = %e, "Event ignored");
            }
            Ok(Err(e)) => tracing::error!(user_id, error = %e, "Error handling event"),
            Err(_) => tracing::error!(user_id, "Event handler panicked"),
        }
    }

    async fn handle(&self, inbound: Inbound) -> Result<(), EngineError> {
        let Inbound {
            user_id,
            chat_id,
            sent_at,
            display_name,
            event,
        } = inbound;

        if self.is_stale(sent_at) {
            tracing::info!(user_id, %sent_at, "Ignoring event sent before startup");
            return Ok(());
        }

        // Events for one user are processed one at a time
        let session = self.sessions.get_or_create(user_id).await;
        let mut session = session.lock().await;

        let is_start = event.is_start();
        if !session.started && !is_start {
            tracing::info!(user_id, "Event before /start, prompting");
            self.gateway.send(chat_id, &replies::start_first()).await?;
            return Ok(());
        }

        let context = ConvContext::new(self.clock.now(), self.store.habits_of(user_id))
            .with_display_name(display_name)
            .with_admin(user_id == self.admin_chat_id);

        tracing::debug!(user_id, state = session.state.name(), event = ?event, "Handling event");
        let result = transition(&session.state, &context, event)?;

        let mut outbox: Vec<Reply> = Vec::new();
        for effect in result.effects {
            match effect {
                Effect::Mutate(mutation) => self.store.apply(user_id, mutation)?,
                Effect::Persist => self.store.save().await,
                Effect::Reply(reply) => outbox.push(reply),
            }
        }

        if session.state != result.new_state {
            tracing::info!(
                user_id,
                from = session.state.name(),
                to = result.new_state.name(),
                "State changed"
            );
        }
        session.state = result.new_state;
        if is_start {
            session.started = true;
        }

        // Still holding the session so replies keep their order per user
        for reply in outbox {
            if let Err(e) = self.gateway.send(chat_id, &reply).await {
                tracing::error!(user_id, error = %e, "Failed to deliver reply");
            }
        }

        Ok(())
    }
}

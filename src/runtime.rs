//! Runtime for executing conversations
//!
//! Holds per-user sessions and drives the state machine against the habit
//! store and the messaging gateway.

mod executor;
pub mod traits;


pub use executor::{Engine, EngineError};
pub use traits::*;

use crate::gateway::TelegramGateway;
use crate::state_machine::ConvState;
use crate::store::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Type alias for production engine with concrete implementations
pub type ProductionEngine = Engine<TelegramGateway, SystemClock>;

/// In-memory conversation session of one user
#[derive(Debug, Default)]
pub struct Session {
    /// Set by `/start`; required again after every restart
    pub started: bool,
    pub state: ConvState,
}

/// Sessions of all users seen since startup
///
/// Each session sits behind its own lock, so one user's events are handled
/// serially while different users proceed in parallel.
#[derive(Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<UserId, Arc<Mutex<Session>>>>,
}

impl SessionTable {
    /// Get or create the session for a user
    pub async fn get_or_create(&self, user_id: UserId) -> Arc<Mutex<Session>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&user_id) {
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(user_id).or_default())
    }

    /// Current state of a user, if they have a session
    #[allow(dead_code)] // Used in tests
    pub async fn state_of(&self, user_id: UserId) -> Option<ConvState> {
        let session = self.sessions.read().await.get(&user_id).cloned()?;
        let state = session.lock().await.state;
        Some(state)
    }

    /// Whether the user has a started session; never creates one
    pub async fn is_started(&self, user_id: UserId) -> bool {
        let Some(session) = self.sessions.read().await.get(&user_id).cloned() else {
            return false;
        };
        let started = session.lock().await.started;
        started
    }

    #[allow(dead_code)] // Used in tests
    pub async fn active_users(&self) -> usize {
        self.sessions.read().await.len()
    }
}

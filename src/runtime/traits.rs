//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the engine with mock implementations.

use crate::gateway::GatewayError;
use crate::replies::Reply;
use crate::store::{HabitMap, JsonFile, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Durable storage for the full habit mapping
#[async_trait]
pub trait HabitStorage: Send + Sync {
    /// Read the stored mapping; absent storage is an empty mapping
    async fn load(&self) -> StoreResult<HabitMap>;

    /// Replace the stored mapping
    async fn save(&self, habits: &HabitMap) -> StoreResult<()>;
}

/// Outbound side of the messaging gateway
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Deliver a reply to a chat
    async fn send(&self, chat_id: i64, reply: &Reply) -> Result<(), GatewayError>;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: HabitStorage + ?Sized> HabitStorage for Arc<T> {
    async fn load(&self) -> StoreResult<HabitMap> {
        (**self).load().await
    }

    async fn save(&self, habits: &HabitMap) -> StoreResult<()> {
        (**self).save(habits).await
    }
}

#[async_trait]
impl<T: Gateway + ?Sized> Gateway for Arc<T> {
    async fn send(&self, chat_id: i64, reply: &Reply) -> Result<(), GatewayError> {
        (**self).send(chat_id, reply).await
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use a JSON file as `HabitStorage`
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    file: JsonFile,
}

impl JsonFileStorage {
    pub fn new(file: JsonFile) -> Self {
        Self { file }
    }
}

#[async_trait]
impl HabitStorage for JsonFileStorage {
    async fn load(&self) -> StoreResult<HabitMap> {
        self.file.read().await
    }

    async fn save(&self, habits: &HabitMap) -> StoreResult<()> {
        tracing::debug!(path = %self.file.path().display(), users = habits.len(), "Writing habits file");
        self.file.write(habits).await
    }
}

/// Wall clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

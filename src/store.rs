//! Habit store
//!
//! Owns the user -> habits mapping. Mutations happen in memory and become
//! durable only after `save`, which rewrites the whole file.

mod schema;

pub use schema::*;

use crate::runtime::HabitStorage;
use chrono::NaiveDate;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed habits file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Habit index {index} out of range (user has {len} habits)")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// In-memory change to one user's habit list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Append(Habit),
    SetEmoji { index: usize, emoji: Emoji },
    SetReminder { index: usize, time: ReminderTime },
    MarkDone { index: usize, date: NaiveDate },
    Remove { index: usize },
}

impl Mutation {
    pub(crate) fn apply_to(self, habits: &mut Vec<Habit>) -> StoreResult<()> {
        let len = habits.len();
        let out_of_range = |index| StoreError::IndexOutOfRange { index, len };
        match self {
            Mutation::Append(habit) => habits.push(habit),
            Mutation::SetEmoji { index, emoji } => {
                habits.get_mut(index).ok_or_else(|| out_of_range(index))?.emoji = Some(emoji);
            }
            Mutation::SetReminder { index, time } => {
                habits
                    .get_mut(index)
                    .ok_or_else(|| out_of_range(index))?
                    .reminder_time = Some(time);
            }
            Mutation::MarkDone { index, date } => {
                let habit = habits.get_mut(index).ok_or_else(|| out_of_range(index))?;
                // At most one increment per calendar day
                if !habit.completed_on(date) {
                    habit.last_checked = Some(date);
                    habit.streak = habit.streak.saturating_add(1);
                }
            }
            Mutation::Remove { index } => {
                if index >= len {
                    return Err(out_of_range(index));
                }
                habits.remove(index);
            }
        }
        Ok(())
    }
}

/// Thread-safe habit store handle
pub struct HabitStore {
    habits: Mutex<HabitMap>,
    /// Serializes saves so a later save never writes an older snapshot
    write_lock: tokio::sync::Mutex<()>,
    storage: Arc<dyn HabitStorage>,
}

impl HabitStore {
    /// Load from storage. Missing or unreadable data yields an empty store.
    pub async fn load(storage: Arc<dyn HabitStorage>) -> Self {
        let habits = match storage.load().await {
            Ok(habits) => habits,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load habits, starting empty");
                HabitMap::new()
            }
        };
        Self::with_habits(storage, habits)
    }

    pub fn with_habits(storage: Arc<dyn HabitStorage>, habits: HabitMap) -> Self {
        Self {
            habits: Mutex::new(habits),
            write_lock: tokio::sync::Mutex::new(()),
            storage,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HabitMap> {
        self.habits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of one user's habits in creation order
    pub fn habits_of(&self, user_id: UserId) -> Vec<Habit> {
        self.lock().get(&user_id).cloned().unwrap_or_default()
    }

    pub fn snapshot(&self) -> HabitMap {
        self.lock().clone()
    }

    /// (users, habits) currently held
    pub fn counts(&self) -> (usize, usize) {
        let habits = self.lock();
        (habits.len(), habits.values().map(Vec::len).sum())
    }

    /// Apply a mutation in memory. Call `save` afterwards to make it durable.
    pub fn apply(&self, user_id: UserId, mutation: Mutation) -> StoreResult<()> {
        let mut habits = self.lock();
        match mutation {
            Mutation::Append(_) => mutation.apply_to(habits.entry(user_id).or_default()),
            _ => match habits.get_mut(&user_id) {
                Some(list) => mutation.apply_to(list),
                None => Err(StoreError::IndexOutOfRange {
                    index: mutation_index(&mutation),
                    len: 0,
                }),
            },
        }
    }

    /// Persist the full mapping, propagating failures
    pub async fn try_save(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.snapshot();
        self.storage.save(&snapshot).await
    }

    /// Persist the full mapping. Failures are logged; memory stays authoritative.
    pub async fn save(&self) {
        if let Err(e) = self.try_save().await {
            tracing::error!(error = %e, "Failed to save habits, continuing in memory");
        }
    }
}

fn mutation_index(mutation: &Mutation) -> usize {
    match mutation {
        Mutation::Append(_) => 0,
        Mutation::SetEmoji { index, .. }
        | Mutation::SetReminder { index, .. }
        | Mutation::MarkDone { index, .. }
        | Mutation::Remove { index } => *index,
    }
}

// ============================================================================
// JSON file backend
// ============================================================================

/// Human-readable JSON file holding the whole habit mapping
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the mapping; a missing file is an empty mapping
    pub async fn read(&self) -> StoreResult<HabitMap> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HabitMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the target
    pub async fn write(&self, habits: &HabitMap) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(habits)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

//! Habit record types and their persisted JSON shape

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Messaging-platform user identifier
pub type UserId = i64;

/// Full store snapshot: user -> habits in creation order
pub type HabitMap = BTreeMap<UserId, Vec<Habit>>;

/// Highest code point of the Basic Multilingual Plane
const BMP_MAX: u32 = 0xFFFF;

/// Rejected user input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected a single emoji, got {0:?}")]
    Emoji(String),
    #[error("expected time as HH:MM, got {0:?}")]
    Time(String),
}

// ============================================================================
// Emoji
// ============================================================================

/// A single supplementary-plane character used to decorate a habit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Emoji(String);

impl Emoji {
    /// Accepts exactly one code point above U+FFFF after trimming whitespace.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if u32::from(c) > BMP_MAX => Ok(Self(trimmed.to_string())),
            _ => Err(ValidationError::Emoji(input.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Emoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Reminder time
// ============================================================================

/// Daily reminder time in 24-hour `HH:MM` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderTime(String);

impl ReminderTime {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::Time(input.to_string());
        let trimmed = input.trim();
        let (hours, minutes) = trimmed.split_once(':').ok_or_else(invalid)?;
        let hour = two_digits(hours).ok_or_else(invalid)?;
        let minute = two_digits(minutes).ok_or_else(invalid)?;
        if hour > 23 || minute > 59 {
            return Err(invalid());
        }
        Ok(Self(format!("{hour:02}:{minute:02}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn two_digits(part: &str) -> Option<u8> {
    if part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

// ============================================================================
// Habit
// ============================================================================

/// One tracked behavior belonging to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub name: String,
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default, deserialize_with = "deserialize_last_checked")]
    pub last_checked: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Emoji>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<ReminderTime>,
}

impl Habit {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            created_at,
            streak: 0,
            last_checked: None,
            emoji: None,
            reminder_time: None,
        }
    }

    pub fn completed_on(&self, date: NaiveDate) -> bool {
        self.last_checked == Some(date)
    }

    /// Name prefixed with the emoji when one is set
    pub fn display_name(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{emoji} {}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Older files wrote naive local timestamps; those are read as UTC.
fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| parse_naive_timestamp(&raw).map(|dt| dt.and_utc()).ok_or(()))
        .map_err(|()| serde::de::Error::custom(format!("invalid created_at value: {raw}")))
}

fn parse_naive_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Older files stored full ISO timestamps here; only the date part matters.
fn deserialize_last_checked<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| {
        parse_flexible_date(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid last_checked value: {s}")))
    })
    .transpose()
}

fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    s.parse::<NaiveDate>()
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .or_else(|| parse_naive_timestamp(s).map(|dt| dt.date()))
}

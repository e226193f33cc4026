//! Process configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HABITS_FILE: &str = "data/habits.json";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// How updates reach the bot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    #[default]
    Polling,
    Webhook,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bot_token: String,
    pub admin_chat_id: i64,
    pub habits_file: PathBuf,
    /// Long-poll timeout; teloxide's default when unset
    pub poll_interval: Option<Duration>,
    pub delivery_mode: DeliveryMode,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;
        let admin_chat_id = parse(
            "ADMIN_CHAT_ID",
            &get("ADMIN_CHAT_ID").ok_or(ConfigError::Missing("ADMIN_CHAT_ID"))?,
        )?;

        let habits_file = get("HABITS_FILE").map_or_else(|| PathBuf::from(DEFAULT_HABITS_FILE), PathBuf::from);

        let poll_interval = get("POLL_INTERVAL_SECS")
            .map(|v| parse::<u64>("POLL_INTERVAL_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);

        let delivery_mode = match get("DELIVERY_MODE") {
            None => DeliveryMode::default(),
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "polling" => DeliveryMode::Polling,
                "webhook" => DeliveryMode::Webhook,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DELIVERY_MODE",
                        value: v,
                    })
                }
            },
        };

        let port = get("PORT")
            .map(|v| parse("PORT", &v))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            bot_token,
            admin_chat_id,
            habits_file,
            poll_interval,
            delivery_mode,
            port,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

//! Environment configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Flat config struct read once at startup

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Everything the bot reads from the environment, gathered once at
/// startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Registers commands into this guild when set; otherwise the
    /// first guild seen at ready is used and commands go global.
    pub guild_id: Option<u64>,
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    /// Reads configuration from the environment. `DISCORD_TOKEN` is
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let discord_token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;
        let guild_id = parse_guild_id(env::var("DISCORD_GUILD_ID").ok())?;
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            discord_token,
            guild_id,
            data_dir,
            log_level,
        })
    }
}

fn parse_guild_id(raw: Option<String>) -> Result<Option<u64>> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => {
            let id = raw
                .trim()
                .parse()
                .context("DISCORD_GUILD_ID must be a numeric guild id")?;
            Ok(Some(id))
        }
        _ => Ok(None),
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};
use crate::retry::RetryPolicy;

/// Environment variable holding the bot's base invitation link.
pub const ENV_BOT_LINK: &str = "BOT_LINK";
/// Environment variable overriding the data file location.
pub const ENV_DATA_PATH: &str = "REFBOT_DATA_PATH";

/// Process configuration for the referral core.
///
/// Loaded from TOML, then overlaid with environment variables, then
/// validated once at startup.
///
/// ```toml
/// data_path = "data/data.json"
/// bot_link = "https://t.me/example_bot"
/// lock_timeout_ms = 10000
///
/// [retry]
/// attempts = 3
/// delay_ms = 2000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub data_path: PathBuf,
    pub bot_link: Option<String>,
    pub lock_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/data.json"),
            bot_link: None,
            lock_timeout_ms: 10_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl BotConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> SdkResult<Self> {
        toml::from_str(raw).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> SdkResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`, which maps variable names to values.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(link) = lookup(ENV_BOT_LINK) {
            self.bot_link = Some(link);
        }
        if let Some(path) = lookup(ENV_DATA_PATH) {
            self.data_path = PathBuf::from(path);
        }
    }

    /// Lock acquisition bound for the store.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Check that everything required is present.
    ///
    /// Run this at startup so a missing link fails the process immediately
    /// rather than on the first profile request.
    pub fn validate(&self) -> SdkResult<()> {
        match self.bot_link.as_deref() {
            Some(link) if !link.trim().is_empty() => {}
            _ => return Err(SdkError::ConfigMissing("bot_link")),
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(SdkError::ConfigMissing("data_path"));
        }
        Ok(())
    }
}

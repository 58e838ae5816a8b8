mod defaults;


use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::BotError;
use defaults::*;

/// Top-level tgbot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub attachments: AttachmentConfig,
}

/// Bot credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot token from @BotFather. Required.
    #[serde(default)]
    pub token: String,
    /// Scheme and host of the Bot API server, without a trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_api_base(),
        }
    }
}

impl BotConfig {
    /// Reject configs that cannot possibly talk to the API.
    pub fn validate(&self) -> Result<(), BotError> {
        if self.token.trim().is_empty() {
            return Err(BotError::Config(
                "bot token is required (set bot.token or TELEGRAM_BOT_TOKEN)".into(),
            ));
        }
        Ok(())
    }

    /// Method endpoint prefix: `{api_base}/bot{token}`.
    pub fn base_url(&self) -> String {
        format!(
            "{}/bot{}",
            self.api_base.trim_end_matches('/'),
            self.token.trim()
        )
    }
}

/// Long-polling session settings. Fixed once polling starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Start polling as soon as the bot is constructed.
    #[serde(default = "default_true")]
    pub autostart: bool,
    /// `timeout` sent with every `getUpdates` (seconds the server may hold the request).
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
    /// `limit` sent with every `getUpdates`.
    #[serde(default = "default_poll_limit")]
    pub limit: u32,
    /// Fixed delay between failed `getMe` attempts.
    #[serde(default = "default_auth_retry_ms")]
    pub auth_retry_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            autostart: true,
            timeout_secs: default_poll_timeout(),
            limit: default_poll_limit(),
            auth_retry_ms: default_auth_retry_ms(),
        }
    }
}

impl PollingConfig {
    pub fn auth_retry(&self) -> Duration {
        Duration::from_millis(self.auth_retry_ms)
    }
}

/// Remote attachment download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Per-candidate download timeout.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl AttachmentConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, BotError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| BotError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    parse(&content)
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<Config, BotError> {
    toml::from_str(content).map_err(|e| BotError::Config(format!("failed to parse config: {e}")))
}

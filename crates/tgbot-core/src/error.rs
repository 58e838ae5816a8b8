use thiserror::Error;

/// Top-level error type for tgbot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Configuration error (missing token, unreadable config file).
    #[error("config error: {0}")]
    Config(String),

    /// The Bot API answered with `ok: false`.
    #[error("{method} rejected: {description}")]
    Api {
        method: String,
        error_code: Option<i64>,
        description: String,
        /// Full response body, kept for diagnostics.
        body: serde_json::Value,
    },

    /// The request never produced a decodable response.
    #[error("transport error: {0}")]
    Transport(String),

    /// One remote attachment candidate could not be downloaded.
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    /// Every attachment candidate failed; `last` is the final failure.
    #[error("all {attempts} attachment candidates failed, last: {last}")]
    Exhausted { attempts: usize, last: Box<BotError> },

    /// Malformed file parameter on an outbound call.
    #[error("attachment error: {0}")]
    Attachment(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BotError {
    /// Telegram error code, when the failure came from the API itself.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Api { error_code, .. } => *error_code,
            Self::Exhausted { last, .. } => last.error_code(),
            _ => None,
        }
    }
}

//! Classification of file-bearing parameters.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use std::path::PathBuf;
use tgbot_core::error::BotError;
use tracing::debug;

/// Where the bytes of one upload come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Existing local file, streamed from disk.
    LocalPath(PathBuf),
    /// Decoded base64 payload.
    Base64Payload(Vec<u8>),
    /// Remote URLs, tried in order.
    RemoteUrls(Vec<String>),
}

/// Classify a file parameter.
///
/// Order: existing local path, then base64 payload (when `base64` is set),
/// then remote URL list.
pub async fn resolve(value: &Value, base64: bool) -> Result<AttachmentSource, BotError> {
    if let Value::String(s) = value {
        if !s.is_empty() && tokio::fs::try_exists(s).await.unwrap_or(false) {
            debug!("local file {s} exists");
            return Ok(AttachmentSource::LocalPath(PathBuf::from(s)));
        }
    }

    if base64 {
        let Value::String(encoded) = value else {
            return Err(BotError::Attachment(
                "base64 payload must be a single string".into(),
            ));
        };
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|e| BotError::Attachment(format!("invalid base64 payload: {e}")))?;
        debug!("base64-encoded file ({} bytes)", data.len());
        return Ok(AttachmentSource::Base64Payload(data));
    }

    let urls = match value {
        Value::String(url) => vec![url.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(url) => Ok(url.clone()),
                other => Err(BotError::Attachment(format!(
                    "attachment candidates must be strings, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(BotError::Attachment(format!(
                "unsupported file value: {other}"
            )))
        }
    };
    if urls.is_empty() {
        return Err(BotError::Attachment("empty attachment candidate list".into()));
    }
    debug!("file is remote, {} candidate(s)", urls.len());
    Ok(AttachmentSource::RemoteUrls(urls))
}

/// Loose truthiness for the `base64` flag: `true`, non-zero numbers, and
/// non-empty strings other than `"false"`/`"0"` count as set.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "false" && s != "0",
        Value::Array(_) | Value::Object(_) => true,
    }
}

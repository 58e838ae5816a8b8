use crate::{error::BotError, request::ApiRequest};
use async_trait::async_trait;

/// Wire access to the Bot API.
///
/// The production implementation talks to the Bot API over reqwest; tests
/// substitute scripted fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST one API call and return the decoded JSON body, whatever its `ok` flag.
    ///
    /// Only failures to send or decode surface as `Err`.
    async fn post(&self, request: ApiRequest) -> Result<serde_json::Value, BotError>;

    /// Download the full body behind `url`. Timeouts are applied by the caller.
    async fn download(&self, url: &str) -> Result<Vec<u8>, BotError>;
}

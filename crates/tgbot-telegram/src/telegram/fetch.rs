//! Remote attachment downloads with a hard per-URL timeout.

use std::sync::Arc;
use std::time::Duration;
use tgbot_core::{error::BotError, traits::Transport};
use tracing::debug;

/// Downloads one candidate URL at a time.
#[derive(Clone)]
pub struct RemoteFetcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl RemoteFetcher {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Full body of `url`, or a [`BotError::Download`] naming the URL.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, BotError> {
        debug!("[fetch] start: {url}");
        match tokio::time::timeout(self.timeout, self.transport.download(url)).await {
            Ok(Ok(data)) => {
                debug!("[fetch] downloaded {url} ({} bytes)", data.len());
                Ok(data)
            }
            Ok(Err(e @ BotError::Download { .. })) => Err(e),
            Ok(Err(e)) => Err(BotError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(BotError::Download {
                url: url.to_string(),
                reason: format!("timed out after {}ms", self.timeout.as_millis()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::mock::ScriptedTransport;

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.serve("https://cdn/a.jpg", b"jpeg");
        let fetcher = RemoteFetcher::new(transport.clone(), Duration::from_millis(400));

        assert_eq!(fetcher.fetch("https://cdn/a.jpg").await.unwrap(), b"jpeg");
        assert_eq!(transport.fetched(), vec!["https://cdn/a.jpg"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_carries_url() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.refuse("bad://1");
        let fetcher = RemoteFetcher::new(transport, Duration::from_millis(400));

        match fetcher.fetch("bad://1").await {
            Err(BotError::Download { url, .. }) => assert_eq!(url, "bad://1"),
            other => panic!("expected download error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_download_times_out() {
        let transport = Arc::new(
            ScriptedTransport::new().with_download_delay(Duration::from_millis(200)),
        );
        transport.serve("https://slow/mirror", b"late");
        let fetcher = RemoteFetcher::new(transport, Duration::from_millis(20));

        match fetcher.fetch("https://slow/mirror").await {
            Err(BotError::Download { reason, .. }) => assert!(reason.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}

//! Scripted transport for unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tgbot_core::{error::BotError, request::ApiRequest, traits::Transport};

/// Wrap `result` in a successful Bot API envelope.
pub(crate) fn ok(result: Value) -> Value {
    json!({"ok": true, "result": result})
}

/// Replays queued responses per method and serves canned downloads.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Result<Value, String>>>>,
    downloads: Mutex<HashMap<String, Result<Vec<u8>, String>>>,
    calls: Mutex<Vec<ApiRequest>>,
    fetched: Mutex<Vec<String>>,
    download_delay: Option<Duration>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = Some(delay);
        self
    }

    /// Queue a response body for the next call to `method`.
    pub(crate) fn reply(&self, method: &str, body: Value) {
        self.push(method, Ok(body));
    }

    /// Queue a transport-level failure for the next call to `method`.
    pub(crate) fn fail(&self, method: &str, reason: &str) {
        self.push(method, Err(reason.to_string()));
    }

    pub(crate) fn serve(&self, url: &str, data: &[u8]) {
        self.downloads
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(data.to_vec()));
    }

    pub(crate) fn refuse(&self, url: &str) {
        self.downloads
            .lock()
            .unwrap()
            .insert(url.to_string(), Err("connection refused".to_string()));
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, method: &str) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    fn push(&self, method: &str, reply: Result<Value, String>) {
        self.replies
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, request: ApiRequest) -> Result<Value, BotError> {
        let method = request.method.clone();
        self.calls.lock().unwrap().push(request);
        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&method)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(body)) => Ok(body),
            Some(Err(reason)) => Err(BotError::Transport(reason)),
            None => {
                // Behave like an idle long poll so unscripted loops do not spin.
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err(BotError::Transport(format!("no scripted reply for {method}")))
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, BotError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.download_delay {
            tokio::time::sleep(delay).await;
        }
        let canned = self.downloads.lock().unwrap().get(url).cloned();
        match canned {
            Some(Ok(data)) => Ok(data),
            Some(Err(reason)) => Err(BotError::Download {
                url: url.to_string(),
                reason,
            }),
            None => Err(BotError::Download {
                url: url.to_string(),
                reason: "unknown host".to_string(),
            }),
        }
    }
}

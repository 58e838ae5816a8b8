//! Long-polling update loop.
//!
//! `getMe` first, retried forever at a fixed interval; then `getUpdates` in a
//! loop, one request in flight at a time. Failures are logged and the loop
//! carries on.

use super::dispatch::Dispatcher;
use super::methods::{BotMethod, GetMe, GetUpdates};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tgbot_core::{
    config::PollingConfig,
    error::BotError,
    events::{Listeners, MESSAGE_EVENT},
    message::{BotIdentity, Message, Update},
    request::ApiRequest,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Extra HTTP time on top of the long-poll `timeout` before giving up.
const LONG_POLL_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Unauthenticated,
    Authenticating,
    SteadyPolling,
}

/// Owns the update cursor and the bot identity for one bot instance.
pub struct Poller {
    dispatcher: Dispatcher,
    listeners: Listeners<Message>,
    config: PollingConfig,
    identity: watch::Sender<Option<BotIdentity>>,
    mention: Option<Regex>,
    /// `update_id` of the last consumed update.
    cursor: i64,
    state: PollerState,
}

impl Poller {
    pub(crate) fn new(
        dispatcher: Dispatcher,
        listeners: Listeners<Message>,
        config: PollingConfig,
        identity: watch::Sender<Option<BotIdentity>>,
    ) -> Self {
        Self {
            dispatcher,
            listeners,
            config,
            identity,
            mention: None,
            cursor: 0,
            state: PollerState::Unauthenticated,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn identity(&self) -> Option<BotIdentity> {
        self.identity.borrow().clone()
    }

    /// Authenticate, then poll forever.
    pub async fn run(mut self) {
        info!(
            "telegram polling starting (timeout={}s, limit={}, offset={})",
            self.config.timeout_secs, self.config.limit, self.cursor
        );
        self.authenticate().await;

        loop {
            match self.poll_once().await {
                Ok(count) => debug!("getUpdates delivered {count} message(s)"),
                Err(e) => warn!("telegram poll error (retrying now): {e}"),
            }
            tokio::task::yield_now().await;
        }
    }

    /// Call `getMe` until it succeeds. Returns the number of attempts made.
    pub async fn authenticate(&mut self) -> u32 {
        self.state = PollerState::Authenticating;
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.fetch_identity().await {
                Ok(identity) => {
                    info!(
                        "telegram bot authenticated as @{} ({}) after {attempts} attempt(s)",
                        identity.username, identity.id
                    );
                    self.mention = mention_pattern(&identity.username);
                    self.identity.send_replace(Some(identity));
                    self.state = PollerState::SteadyPolling;
                    return attempts;
                }
                Err(e) => {
                    warn!(
                        "getMe failed, check the bot token (retry in {}ms): {e}",
                        self.config.auth_retry_ms
                    );
                    tokio::time::sleep(self.config.auth_retry()).await;
                }
            }
        }
    }

    async fn fetch_identity(&self) -> Result<BotIdentity, BotError> {
        let result = self.dispatcher.send(ApiRequest::new(GetMe::NAME)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// One `getUpdates` call. Unset fields of `overrides` fall back to the
    /// polling config and `cursor + 1`.
    ///
    /// The cursor moves to the highest returned `update_id`, even for updates
    /// whose message cannot be decoded; failures leave it alone.
    pub async fn get_updates(&mut self, overrides: &GetUpdates) -> Result<Vec<Update>, BotError> {
        let offset = overrides.offset.unwrap_or(self.cursor + 1);
        let limit = overrides.limit.unwrap_or(self.config.limit);
        let timeout = overrides.timeout.unwrap_or(self.config.timeout_secs);

        let request = ApiRequest::new(GetUpdates::NAME)
            .text("offset", offset.to_string())
            .text("limit", limit.to_string())
            .text("timeout", timeout.to_string())
            .timeout(Duration::from_secs(timeout) + LONG_POLL_GRACE);

        let result = self.dispatcher.send(request).await?;
        let batch: Vec<Value> = serde_json::from_value(result)?;

        let mut updates = Vec::with_capacity(batch.len());
        for raw in batch {
            let Some(update_id) = raw.get("update_id").and_then(Value::as_i64) else {
                warn!("skipping update without a numeric update_id: {raw}");
                continue;
            };
            self.cursor = self.cursor.max(update_id);
            updates.push(Update {
                update_id,
                message: decode_message(update_id, &raw),
            });
        }
        Ok(updates)
    }

    /// Fetch one batch with default parameters and emit its messages.
    /// Returns the number of `message` events emitted.
    pub async fn poll_once(&mut self) -> Result<usize, BotError> {
        let updates = self.get_updates(&GetUpdates::default()).await?;
        Ok(self.process(updates))
    }

    fn process(&self, updates: Vec<Update>) -> usize {
        let mut emitted = 0;
        for update in updates {
            let Some(mut message) = update.message else {
                continue;
            };
            if let (Some(pattern), Some(text)) = (&self.mention, message.text.as_mut()) {
                *text = strip_mention(pattern, text);
            }
            self.listeners.emit(MESSAGE_EVENT, &message);
            emitted += 1;
        }
        emitted
    }
}

/// Typed view of an update's `message`. An undecodable one is logged and
/// dropped without affecting the rest of the batch.
fn decode_message(update_id: i64, raw: &Value) -> Option<Message> {
    let message = raw.get("message").filter(|m| !m.is_null())?;
    match Message::deserialize(message) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!("update {update_id}: dropping undecodable message: {e}");
            None
        }
    }
}

/// Case-insensitive `@username` token matcher.
pub(crate) fn mention_pattern(username: &str) -> Option<Regex> {
    if username.is_empty() {
        return None;
    }
    match Regex::new(&format!(r"(?i)@{}\b", regex::escape(username))) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("cannot build mention pattern for @{username}: {e}");
            None
        }
    }
}

/// Remove every mention of the bot and trim the result.
pub(crate) fn strip_mention(pattern: &Regex, text: &str) -> String {
    pattern.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::mock::{ok, ScriptedTransport};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn poller(transport: &Arc<ScriptedTransport>) -> (Poller, Arc<Mutex<Vec<Message>>>) {
        let listeners = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        listeners.on(MESSAGE_EVENT, move |m: &Message| {
            sink.lock().unwrap().push(m.clone())
        });
        let (tx, _rx) = watch::channel(None);
        let config = PollingConfig {
            auth_retry_ms: 1,
            ..Default::default()
        };
        (
            Poller::new(Dispatcher::new(transport.clone()), listeners, config, tx),
            seen,
        )
    }

    fn texts(seen: &Arc<Mutex<Vec<Message>>>) -> Vec<String> {
        seen.lock()
            .unwrap()
            .iter()
            .filter_map(|m| m.text.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_auth_retries_until_success() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail("getMe", "timeout");
        transport.reply(
            "getMe",
            json!({"ok": false, "error_code": 401, "description": "Unauthorized"}),
        );
        transport.fail("getMe", "timeout");
        transport.reply("getMe", ok(json!({"id": 77, "is_bot": true, "username": "bot"})));
        let (mut poller, _) = poller(&transport);
        assert_eq!(poller.state(), PollerState::Unauthenticated);

        let attempts = poller.authenticate().await;

        assert_eq!(attempts, 4);
        assert_eq!(poller.state(), PollerState::SteadyPolling);
        assert_eq!(transport.methods(), vec!["getMe"; 4]);
        assert_eq!(
            poller.identity(),
            Some(BotIdentity {
                id: 77,
                username: "bot".into()
            })
        );
    }

    #[tokio::test]
    async fn test_mention_stripped_and_cursor_advanced() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply("getMe", ok(json!({"id": 1, "username": "bot"})));
        transport.reply(
            "getUpdates",
            ok(json!([{"update_id": 5, "message": {"text": "@bot hello"}}])),
        );
        transport.reply("getUpdates", ok(json!([])));
        let (mut poller, seen) = poller(&transport);

        poller.authenticate().await;
        assert_eq!(poller.poll_once().await.unwrap(), 1);
        assert_eq!(texts(&seen), vec!["hello"]);
        assert_eq!(poller.cursor(), 5);

        assert_eq!(poller.poll_once().await.unwrap(), 0);
        assert_eq!(poller.cursor(), 5, "empty batch keeps the cursor");

        let polls = transport.calls_to("getUpdates");
        assert_eq!(polls[0].text_value("offset"), Some("1"));
        assert_eq!(polls[1].text_value("offset"), Some("6"));
        assert_eq!(polls[1].text_value("limit"), Some("100"));
        assert_eq!(polls[1].text_value("timeout"), Some("3"));
    }

    #[tokio::test]
    async fn test_batch_processed_in_order_and_cursor_is_last_id() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            "getUpdates",
            ok(json!([
                {"update_id": 10, "message": {"text": "one"}},
                {"update_id": 11},
                {"update_id": 12, "message": {"text": "three"}}
            ])),
        );
        let (mut poller, seen) = poller(&transport);

        assert_eq!(poller.poll_once().await.unwrap(), 2);
        assert_eq!(texts(&seen), vec!["one", "three"]);
        assert_eq!(poller.cursor(), 12);
    }

    #[tokio::test]
    async fn test_poll_failure_keeps_cursor() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply("getUpdates", ok(json!([{"update_id": 3}])));
        transport.fail("getUpdates", "timed out");
        transport.reply(
            "getUpdates",
            json!({"ok": false, "error_code": 409, "description": "Conflict"}),
        );
        transport.reply("getUpdates", ok(json!("not a list")));
        transport.reply("getUpdates", ok(json!([])));
        let (mut poller, _) = poller(&transport);

        poller.poll_once().await.unwrap();
        assert!(matches!(
            poller.poll_once().await,
            Err(BotError::Transport(_))
        ));
        assert_eq!(
            poller.poll_once().await.unwrap_err().error_code(),
            Some(409)
        );
        assert!(matches!(
            poller.poll_once().await,
            Err(BotError::Serialization(_))
        ));
        poller.poll_once().await.unwrap();

        assert_eq!(poller.cursor(), 3);
        let offsets: Vec<_> = transport
            .calls_to("getUpdates")
            .iter()
            .map(|c| c.text_value("offset").unwrap_or_default().to_string())
            .collect();
        assert_eq!(offsets, vec!["1", "4", "4", "4", "4"]);
    }

    #[tokio::test]
    async fn test_undecodable_message_skipped_not_the_batch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            "getUpdates",
            ok(json!([
                {"update_id": 1, "message": {"text": "good"}},
                {"update_id": 2, "message": {"text": "odd", "chat": {"type": "private"}}},
                {"update_id": 3, "message": {"text": "also good"}}
            ])),
        );
        transport.reply("getUpdates", ok(json!([])));
        let (mut poller, seen) = poller(&transport);

        assert_eq!(poller.poll_once().await.unwrap(), 2);
        assert_eq!(texts(&seen), vec!["good", "also good"]);
        assert_eq!(poller.cursor(), 3);

        poller.poll_once().await.unwrap();
        let polls = transport.calls_to("getUpdates");
        assert_eq!(polls[1].text_value("offset"), Some("4"));
    }

    #[tokio::test]
    async fn test_overrides_take_precedence() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply("getUpdates", ok(json!([])));
        let (mut poller, _) = poller(&transport);

        poller
            .get_updates(&GetUpdates {
                offset: Some(-1),
                limit: Some(0),
                timeout: Some(30),
            })
            .await
            .unwrap();

        let call = &transport.calls_to("getUpdates")[0];
        assert_eq!(call.text_value("offset"), Some("-1"));
        assert_eq!(call.text_value("limit"), Some("0"));
        assert_eq!(call.text_value("timeout"), Some("30"));
        assert_eq!(call.timeout, Some(Duration::from_secs(35)));
    }

    #[tokio::test]
    async fn test_cursor_never_moves_back() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply("getUpdates", ok(json!([{"update_id": 20}])));
        transport.reply("getUpdates", ok(json!([{"update_id": 15}])));
        let (mut poller, _) = poller(&transport);

        poller.poll_once().await.unwrap();
        poller
            .get_updates(&GetUpdates {
                offset: Some(15),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(poller.cursor(), 20);
    }

    #[test]
    fn test_strip_mention_case_insensitive() {
        let re = mention_pattern("MyBot").unwrap();
        assert_eq!(strip_mention(&re, "@mybot ping"), "ping");
        assert_eq!(strip_mention(&re, "hey @MYBOT, ping @MyBot"), "hey , ping");
        assert_eq!(strip_mention(&re, "/start@mybot"), "/start");
    }

    #[test]
    fn test_strip_mention_leaves_other_handles() {
        let re = mention_pattern("bot").unwrap();
        assert_eq!(strip_mention(&re, "@bottle and @bot_two"), "@bottle and @bot_two");
        assert_eq!(strip_mention(&re, "@other hi"), "@other hi");
    }

    #[test]
    fn test_strip_mention_idempotent() {
        let re = mention_pattern("bot").unwrap();
        for text in ["@bot hello", "  @BOT  ", "@@botbot", "a @bot@bot b", "plain"] {
            let once = strip_mention(&re, text);
            assert_eq!(strip_mention(&re, &once), once, "input: {text:?}");
        }
    }

    #[test]
    fn test_mention_pattern_escapes_username() {
        let re = mention_pattern("a.b").unwrap();
        assert_eq!(strip_mention(&re, "@axb hi"), "@axb hi");
        assert!(mention_pattern("").is_none());
    }
}

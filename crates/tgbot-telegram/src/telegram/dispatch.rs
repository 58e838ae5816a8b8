//! One outbound call, judged by the `ok` flag of the response body.

use super::types::TgResponse;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tgbot_core::{error::BotError, request::ApiRequest, traits::Transport};
use tracing::debug;

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Issue `request`; `Ok` carries the `result` field of the response.
    ///
    /// `ok: false` and transport failures both come back as `Err`.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, BotError> {
        let method = request.method.clone();
        debug!(
            "[{method}] sending {} field(s){}",
            request.fields.len(),
            if request.is_multipart() { " as multipart" } else { "" }
        );
        let body = self.transport.post(request).await?;
        interpret(&method, body)
    }
}

pub(crate) fn interpret(method: &str, body: Value) -> Result<Value, BotError> {
    let envelope = match TgResponse::deserialize(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return Err(BotError::Api {
                method: method.to_string(),
                error_code: None,
                description: format!("malformed response: {e}"),
                body,
            })
        }
    };

    if envelope.ok {
        debug!("[{method}] done");
        return Ok(envelope.result.unwrap_or(Value::Null));
    }

    debug!("[{method}] failed: {body}");
    Err(BotError::Api {
        method: method.to_string(),
        error_code: envelope.error_code,
        description: envelope
            .description
            .unwrap_or_else(|| "no description".to_string()),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::mock::ScriptedTransport;
    use serde_json::json;

    #[test]
    fn test_ok_yields_result() {
        let result = interpret("getMe", json!({"ok": true, "result": {"id": 1}})).unwrap();
        assert_eq!(result, json!({"id": 1}));
    }

    #[test]
    fn test_ok_without_result_is_null() {
        assert_eq!(interpret("x", json!({"ok": true})).unwrap(), Value::Null);
    }

    #[test]
    fn test_ok_false_keeps_body() {
        let body = json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        });
        match interpret("sendMessage", body.clone()) {
            Err(BotError::Api {
                method,
                error_code,
                description,
                body: kept,
            }) => {
                assert_eq!(method, "sendMessage");
                assert_eq!(error_code, Some(400));
                assert_eq!(description, "Bad Request: chat not found");
                assert_eq!(kept, body);
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_envelope_body_is_failure() {
        let err = interpret("getMe", json!("<html>502</html>")).unwrap_err();
        assert!(matches!(err, BotError::Api { error_code: None, .. }));
    }

    #[tokio::test]
    async fn test_transport_error_surfaces() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail("sendMessage", "connection reset");
        let dispatcher = Dispatcher::new(transport.clone());

        let err = dispatcher
            .send(ApiRequest::new("sendMessage").text("chat_id", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Transport(_)));
        assert_eq!(transport.methods(), vec!["sendMessage"]);
    }
}

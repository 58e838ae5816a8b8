//! Sequential fallback across remote attachment candidates.
//!
//! Each attempt downloads one candidate and makes the API call with its
//! bytes. A failed download and a rejected call both move on to the next
//! candidate; attempts never overlap.

use super::dispatch::Dispatcher;
use super::fetch::RemoteFetcher;
use serde_json::Value;
use tgbot_core::{
    error::BotError,
    request::{ApiRequest, FormField},
};
use tracing::{debug, info, warn};

/// Position in the candidate list for one outbound call.
#[derive(Debug)]
struct RetryState {
    candidates: Vec<String>,
    index: usize,
}

impl RetryState {
    fn current(&self) -> &str {
        &self.candidates[self.index]
    }

    /// Move to the next candidate; `false` when none is left.
    fn advance(&mut self) -> bool {
        if self.index + 1 < self.candidates.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn attempts(&self) -> usize {
        self.index + 1
    }
}

pub(crate) struct RetryCoordinator<'a> {
    dispatcher: &'a Dispatcher,
    fetcher: &'a RemoteFetcher,
}

impl<'a> RetryCoordinator<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher, fetcher: &'a RemoteFetcher) -> Self {
        Self {
            dispatcher,
            fetcher,
        }
    }

    /// Deliver `request` with `file_field` filled from the first candidate
    /// that both downloads and is accepted by the API.
    pub(crate) async fn deliver(
        &self,
        request: ApiRequest,
        file_field: &str,
        file_name: &str,
        candidates: Vec<String>,
    ) -> Result<Value, BotError> {
        if candidates.is_empty() {
            return Err(BotError::Attachment("no attachment candidates".into()));
        }
        let total = candidates.len();
        let mut state = RetryState {
            candidates,
            index: 0,
        };

        loop {
            let url = state.current().to_string();
            debug!(
                "[{}] attempt {}/{total}: {url}",
                request.method,
                state.attempts()
            );

            let outcome = match self.fetcher.fetch(&url).await {
                Ok(data) => {
                    let attempt = request.clone().field(
                        file_field,
                        FormField::Bytes {
                            data,
                            file_name: file_name.to_string(),
                        },
                    );
                    self.dispatcher.send(attempt).await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(result) => {
                    if state.index > 0 {
                        info!(
                            "[{}] delivered via fallback candidate {}/{total}",
                            request.method,
                            state.attempts()
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        "[{}] candidate {}/{total} failed: {e}",
                        request.method,
                        state.attempts()
                    );
                    if !state.advance() {
                        return Err(BotError::Exhausted {
                            attempts: state.attempts(),
                            last: Box::new(e),
                        });
                    }
                }
            }
        }
    }
}

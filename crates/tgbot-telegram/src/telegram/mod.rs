//! Telegram Bot API client.
//!
//! Uses long polling via `getUpdates` for inbound messages and form/multipart
//! posts for outbound calls.
//! Docs: <https://core.telegram.org/bots/api>

pub mod attachment;
pub mod dispatch;
pub mod fetch;
pub mod methods;
mod polling;
mod retry;
mod send;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use polling::{Poller, PollerState};

use crate::http::HttpTransport;
use dispatch::Dispatcher;
use fetch::RemoteFetcher;
use std::sync::{Arc, Mutex};
use tgbot_core::{
    config::{Config, PollingConfig},
    error::BotError,
    events::Listeners,
    message::{BotIdentity, Message},
    traits::Transport,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Telegram bot: outbound calls plus an optional background poller.
pub struct TelegramBot {
    config: Config,
    dispatcher: Dispatcher,
    fetcher: RemoteFetcher,
    listeners: Listeners<Message>,
    identity: watch::Receiver<Option<BotIdentity>>,
    /// Identity publisher, handed to the single poller this bot may own.
    identity_tx: Mutex<Option<watch::Sender<Option<BotIdentity>>>>,
    polling_task: Mutex<Option<JoinHandle<()>>>,
}

impl TelegramBot {
    /// Create a bot talking to the real Bot API.
    ///
    /// Fails before any network activity if the token is missing. Starts
    /// polling right away when `polling.autostart` is set.
    pub fn new(config: Config) -> Result<Self, BotError> {
        config.bot.validate()?;
        let transport = Arc::new(HttpTransport::new(&config.bot)?);
        Self::with_transport(config, transport)
    }

    /// Create a bot on top of a custom transport.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self, BotError> {
        config.bot.validate()?;

        let (identity_tx, identity) = watch::channel(None);
        let bot = Self {
            dispatcher: Dispatcher::new(Arc::clone(&transport)),
            fetcher: RemoteFetcher::new(transport, config.attachments.fetch_timeout()),
            listeners: Listeners::new(),
            identity,
            identity_tx: Mutex::new(Some(identity_tx)),
            polling_task: Mutex::new(None),
            config,
        };

        if bot.config.polling.autostart {
            debug!("starting polling at construction");
            bot.start_polling(bot.config.polling.clone())?;
        }
        Ok(bot)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a handler for `event` (e.g. [`tgbot_core::events::MESSAGE_EVENT`]).
    pub fn on<F>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.listeners.on(event, handler);
    }

    pub fn listeners(&self) -> Listeners<Message> {
        self.listeners.clone()
    }

    /// Identity from the poller's last successful `getMe`, if any.
    pub fn identity(&self) -> Option<BotIdentity> {
        self.identity.borrow().clone()
    }

    /// Wait until the poller has authenticated.
    pub async fn wait_identity(&self) -> Option<BotIdentity> {
        let mut rx = self.identity.clone();
        let identity = match rx.wait_for(Option::is_some).await {
            Ok(id) => id.clone(),
            Err(_) => None,
        };
        identity
    }

    /// Build this bot's poller without running it.
    ///
    /// A bot owns at most one poller, so the cursor is never shared.
    pub fn poller(&self, config: PollingConfig) -> Result<Poller, BotError> {
        let identity_tx = self
            .identity_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| BotError::Config("polling already started for this bot".into()))?;

        Ok(Poller::new(
            self.dispatcher.clone(),
            self.listeners.clone(),
            config,
            identity_tx,
        ))
    }

    /// Spawn the poller on the current tokio runtime.
    pub fn start_polling(&self, config: PollingConfig) -> Result<(), BotError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| BotError::Config(format!("polling needs a tokio runtime: {e}")))?;
        let poller = self.poller(config)?;
        let handle = runtime.spawn(poller.run());
        *self.polling_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        info!("Telegram polling task spawned");
        Ok(())
    }

    pub fn is_polling(&self) -> bool {
        self.polling_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TelegramBot {
    fn drop(&mut self) {
        let task = self
            .polling_task
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
            info!("Telegram polling stopped");
        }
    }
}

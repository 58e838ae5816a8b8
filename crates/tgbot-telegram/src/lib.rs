//! # tgbot-telegram
//!
//! Telegram Bot API client: long polling, outbound dispatch, and remote
//! attachment fallback.

pub mod http;
pub mod telegram;

pub use telegram::{Poller, PollerState, TelegramBot};

//! # tgbot-core
//!
//! Core types, traits, configuration, and error handling for tgbot.

pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod request;
pub mod traits;

//! Subcommand handlers.

use crate::FileKind;
use serde_json::{json, Value};
use std::sync::Arc;
use tgbot_core::{config::Config, events::MESSAGE_EVENT, message::Message};
use tgbot_telegram::telegram::{
    methods::{ChatId, SendMessage},
    types::Params,
};
use tgbot_telegram::TelegramBot;
use tokio::sync::mpsc;
use tracing::{info, warn};

impl FileKind {
    fn method(self) -> &'static str {
        match self {
            Self::Photo => "sendPhoto",
            Self::Audio => "sendAudio",
            Self::Document => "sendDocument",
            Self::Sticker => "sendSticker",
            Self::Video => "sendVideo",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Sticker => "sticker",
            Self::Video => "video",
        }
    }
}

/// Numeric ids go out as numbers, anything else as a username.
fn chat_id(chat: &str) -> ChatId {
    match chat.parse::<i64>() {
        Ok(id) => ChatId::Id(id),
        Err(_) => ChatId::Username(chat.to_string()),
    }
}

pub async fn start(cfg: Config, echo: bool) -> anyhow::Result<()> {
    let bot = Arc::new(TelegramBot::new(cfg)?);

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    bot.on(MESSAGE_EVENT, move |msg: &Message| {
        let text = msg.text.as_deref().unwrap_or("<non-text>");
        info!("message in chat {:?}: {text}", msg.chat_id());
        let _ = tx.send(msg.clone());
    });

    let replier = Arc::clone(&bot);
    let consumer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if !echo {
                continue;
            }
            let (Some(chat), Some(text)) = (msg.chat_id(), msg.text) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let mut reply = SendMessage::new(chat, text);
            reply.reply_to_message_id = Some(msg.message_id);
            if let Err(e) = replier.send_message(&reply).await {
                warn!("echo to chat {chat} failed: {e}");
            }
        }
    });

    bot.start_polling(bot.config().polling.clone())?;
    println!("tgbot: polling (Ctrl-C to stop)");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    consumer.abort();
    Ok(())
}

pub async fn whoami(cfg: Config) -> anyhow::Result<()> {
    let bot = TelegramBot::new(cfg)?;
    let me = bot.get_me().await?;
    println!("@{} ({})", me.username, me.id);
    Ok(())
}

pub async fn send(cfg: Config, chat: &str, text: &str) -> anyhow::Result<()> {
    let bot = TelegramBot::new(cfg)?;
    let sent = bot.send_message(&SendMessage::new(chat_id(chat), text)).await?;
    println!("sent message {}", sent.message_id);
    Ok(())
}

pub async fn send_file(
    cfg: Config,
    chat: &str,
    kind: FileKind,
    base64: bool,
    caption: Option<String>,
    mut sources: Vec<String>,
) -> anyhow::Result<()> {
    let bot = TelegramBot::new(cfg)?;

    let file = if sources.len() == 1 {
        Value::String(sources.remove(0))
    } else {
        json!(sources)
    };

    let mut params = Params::new();
    params.insert("chat_id".into(), serde_json::to_value(chat_id(chat))?);
    params.insert(kind.field().into(), file);
    if base64 {
        params.insert("base64".into(), Value::Bool(true));
    }
    if let Some(caption) = caption {
        params.insert("caption".into(), Value::String(caption));
    }

    let result = bot.request(kind.method(), params).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

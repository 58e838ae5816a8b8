//! Static per-method call table and typed request structs.
//!
//! Docs: <https://core.telegram.org/bots/api#available-methods>

use super::types::{form_value, Params};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tgbot_core::{
    error::BotError,
    message::{BotIdentity, Message, Update},
    request::ApiRequest,
};

/// How one method goes over the wire. Looked up by name, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundCallSpec {
    pub method: &'static str,
    /// The designated file field, for upload methods.
    pub file_field: Option<&'static str>,
    pub gzip: bool,
    pub headers: &'static [(&'static str, &'static str)],
    /// File name given to uploads that exist only as bytes.
    pub file_name: &'static str,
}

const FILE_METHODS: [OutboundCallSpec; 5] = [
    OutboundCallSpec {
        method: "sendPhoto",
        file_field: Some("photo"),
        gzip: true,
        headers: &[],
        file_name: "image.jpg",
    },
    OutboundCallSpec {
        method: "sendAudio",
        file_field: Some("audio"),
        gzip: true,
        headers: &[],
        file_name: "audio.mp3",
    },
    OutboundCallSpec {
        method: "sendDocument",
        file_field: Some("document"),
        gzip: true,
        headers: &[],
        file_name: "document.bin",
    },
    OutboundCallSpec {
        method: "sendSticker",
        file_field: Some("sticker"),
        gzip: true,
        headers: &[],
        file_name: "sticker.webp",
    },
    OutboundCallSpec {
        method: "sendVideo",
        file_field: Some("video"),
        gzip: true,
        headers: &[],
        file_name: "video.mp4",
    },
];

/// Call settings for `method`; anything not in the upload table is a plain form post.
pub fn lookup(method: &str) -> OutboundCallSpec {
    FILE_METHODS
        .iter()
        .find(|spec| spec.method == method)
        .copied()
        .unwrap_or(OutboundCallSpec {
            method: "",
            file_field: None,
            gzip: false,
            headers: &[],
            file_name: "file",
        })
}

impl OutboundCallSpec {
    /// Build the wire request for `method` from plain parameters.
    pub(crate) fn request(&self, method: &str, params: &Params) -> ApiRequest {
        let mut request = ApiRequest::new(method);
        request.gzip = self.gzip;
        request.headers = self
            .headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (name, value) in params {
            if let Some(text) = form_value(value) {
                request = request.text(name.as_str(), text);
            }
        }
        request
    }
}

/// A Bot API method with a typed request and response.
pub trait BotMethod: Serialize {
    const NAME: &'static str;
    type Output: DeserializeOwned;

    /// Flatten the request into untyped parameters.
    fn to_params(&self) -> Result<Params, BotError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Params::new()),
            other => Err(BotError::Serialization(serde::ser::Error::custom(format!(
                "{} parameters must serialize to an object, got {other}",
                Self::NAME
            )))),
        }
    }
}

/// Target chat: numeric id or `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(username: &str) -> Self {
        Self::Username(username.to_string())
    }
}

impl From<String> for ChatId {
    fn from(username: String) -> Self {
        Self::Username(username)
    }
}

/// File parameter of an upload method.
///
/// A single value may be a local path, a base64 payload (with `base64` set),
/// or a URL; a list is an ordered set of URL candidates tried in turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InputFile {
    Single(String),
    Candidates(Vec<String>),
}

impl From<&str> for InputFile {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for InputFile {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for InputFile {
    fn from(candidates: Vec<String>) -> Self {
        Self::Candidates(candidates)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// `getMe`: test the token, returns the bot's identity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetMe {}

impl BotMethod for GetMe {
    const NAME: &'static str = "getMe";
    type Output = BotIdentity;
}

/// `getUpdates`: each field left as `None` falls back to the poller's value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl BotMethod for GetUpdates {
    const NAME: &'static str = "getUpdates";
    type Output = Vec<Update>;
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    /// ReplyKeyboardMarkup, ReplyKeyboardRemove or ForceReply, sent as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
    #[serde(flatten)]
    pub extra: Params,
}

impl SendMessage {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: None,
            disable_web_page_preview: None,
            reply_to_message_id: None,
            reply_markup: None,
            extra: Params::new(),
        }
    }
}

impl BotMethod for SendMessage {
    const NAME: &'static str = "sendMessage";
    type Output = Message;
}

#[derive(Debug, Clone, Serialize)]
pub struct ForwardMessage {
    pub chat_id: ChatId,
    pub from_chat_id: ChatId,
    pub message_id: i64,
    #[serde(flatten)]
    pub extra: Params,
}

impl BotMethod for ForwardMessage {
    const NAME: &'static str = "forwardMessage";
    type Output = Message;
}

#[derive(Debug, Clone, Serialize)]
pub struct SendPhoto {
    pub chat_id: ChatId,
    pub photo: InputFile,
    /// `photo` holds base64 data rather than a path or URL.
    #[serde(skip_serializing_if = "is_false")]
    pub base64: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
    #[serde(flatten)]
    pub extra: Params,
}

impl SendPhoto {
    pub fn new(chat_id: impl Into<ChatId>, photo: impl Into<InputFile>) -> Self {
        Self {
            chat_id: chat_id.into(),
            photo: photo.into(),
            base64: false,
            caption: None,
            reply_to_message_id: None,
            reply_markup: None,
            extra: Params::new(),
        }
    }
}

impl BotMethod for SendPhoto {
    const NAME: &'static str = "sendPhoto";
    type Output = Message;
}

#[derive(Debug, Clone, Serialize)]
pub struct SendAudio {
    pub chat_id: ChatId,
    pub audio: InputFile,
    #[serde(skip_serializing_if = "is_false")]
    pub base64: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
    #[serde(flatten)]
    pub extra: Params,
}

impl BotMethod for SendAudio {
    const NAME: &'static str = "sendAudio";
    type Output = Message;
}

#[derive(Debug, Clone, Serialize)]
pub struct SendDocument {
    pub chat_id: ChatId,
    pub document: InputFile,
    #[serde(skip_serializing_if = "is_false")]
    pub base64: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
    #[serde(flatten)]
    pub extra: Params,
}

impl BotMethod for SendDocument {
    const NAME: &'static str = "sendDocument";
    type Output = Message;
}

#[derive(Debug, Clone, Serialize)]
pub struct SendSticker {
    pub chat_id: ChatId,
    pub sticker: InputFile,
    #[serde(skip_serializing_if = "is_false")]
    pub base64: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
    #[serde(flatten)]
    pub extra: Params,
}

impl BotMethod for SendSticker {
    const NAME: &'static str = "sendSticker";
    type Output = Message;
}

#[derive(Debug, Clone, Serialize)]
pub struct SendVideo {
    pub chat_id: ChatId,
    pub video: InputFile,
    #[serde(skip_serializing_if = "is_false")]
    pub base64: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
    #[serde(flatten)]
    pub extra: Params,
}

impl BotMethod for SendVideo {
    const NAME: &'static str = "sendVideo";
    type Output = Message;
}

#[derive(Debug, Clone, Serialize)]
pub struct SendLocation {
    pub chat_id: ChatId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
    #[serde(flatten)]
    pub extra: Params,
}

impl BotMethod for SendLocation {
    const NAME: &'static str = "sendLocation";
    type Output = Message;
}

/// `sendChatAction`: `typing`, `upload_photo`, `record_video`, `upload_video`,
/// `record_audio`, `upload_audio`, `upload_document`, `find_location`.
#[derive(Debug, Clone, Serialize)]
pub struct SendChatAction {
    pub chat_id: ChatId,
    pub action: String,
    #[serde(flatten)]
    pub extra: Params,
}

impl BotMethod for SendChatAction {
    const NAME: &'static str = "sendChatAction";
    type Output = bool;
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUserProfilePhotos {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(flatten)]
    pub extra: Params,
}

impl BotMethod for GetUserProfilePhotos {
    const NAME: &'static str = "getUserProfilePhotos";
    type Output = Value;
}

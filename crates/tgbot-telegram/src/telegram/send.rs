//! Outbound calls: parameter lookup, attachment resolution, and dispatch.

use super::attachment::{self, AttachmentSource};
use super::methods::{self, *};
use super::retry::RetryCoordinator;
use super::types::Params;
use super::TelegramBot;
use serde_json::Value;
use tgbot_core::{
    error::BotError,
    message::{BotIdentity, Message},
    request::FormField,
};
use tracing::debug;

impl TelegramBot {
    /// Call any Bot API method with untyped parameters.
    ///
    /// Upload methods get their file field resolved first; a remote URL (or a
    /// list of them) is tried candidate by candidate until one is accepted.
    pub async fn request(&self, method: &str, mut params: Params) -> Result<Value, BotError> {
        let spec = methods::lookup(method);
        debug!(
            "[{method}] params: {:?}",
            params.keys().collect::<Vec<_>>()
        );

        let base64 = params
            .remove("base64")
            .is_some_and(|v| attachment::is_truthy(&v));

        let Some(file_field) = spec.file_field else {
            return self.dispatcher.send(spec.request(method, &params)).await;
        };

        let file = params.remove(file_field).ok_or_else(|| {
            BotError::Attachment(format!("{method} requires a `{file_field}` field"))
        })?;
        let request = spec.request(method, &params);

        match attachment::resolve(&file, base64).await? {
            AttachmentSource::LocalPath(path) => {
                self.dispatcher
                    .send(request.field(file_field, FormField::Path(path)))
                    .await
            }
            AttachmentSource::Base64Payload(data) => {
                let field = FormField::Bytes {
                    data,
                    file_name: spec.file_name.to_string(),
                };
                self.dispatcher.send(request.field(file_field, field)).await
            }
            AttachmentSource::RemoteUrls(candidates) => {
                RetryCoordinator::new(&self.dispatcher, &self.fetcher)
                    .deliver(request, file_field, spec.file_name, candidates)
                    .await
            }
        }
    }

    /// Call a typed method and decode its result.
    pub async fn call<M: BotMethod>(&self, method: &M) -> Result<M::Output, BotError> {
        let result = self.request(M::NAME, method.to_params()?).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Test the token. Does not touch the poller's stored identity.
    pub async fn get_me(&self) -> Result<BotIdentity, BotError> {
        self.call(&GetMe::default()).await
    }

    pub async fn send_message(&self, req: &SendMessage) -> Result<Message, BotError> {
        self.call(req).await
    }

    pub async fn forward_message(&self, req: &ForwardMessage) -> Result<Message, BotError> {
        self.call(req).await
    }

    pub async fn send_photo(&self, req: &SendPhoto) -> Result<Message, BotError> {
        self.call(req).await
    }

    pub async fn send_audio(&self, req: &SendAudio) -> Result<Message, BotError> {
        self.call(req).await
    }

    pub async fn send_document(&self, req: &SendDocument) -> Result<Message, BotError> {
        self.call(req).await
    }

    pub async fn send_sticker(&self, req: &SendSticker) -> Result<Message, BotError> {
        self.call(req).await
    }

    pub async fn send_video(&self, req: &SendVideo) -> Result<Message, BotError> {
        self.call(req).await
    }

    pub async fn send_location(&self, req: &SendLocation) -> Result<Message, BotError> {
        self.call(req).await
    }

    /// Send a chat action (e.g. "typing") to a chat.
    pub async fn send_chat_action(&self, req: &SendChatAction) -> Result<bool, BotError> {
        self.call(req).await
    }

    pub async fn get_user_profile_photos(
        &self,
        req: &GetUserProfilePhotos,
    ) -> Result<Value, BotError> {
        self.call(req).await
    }
}

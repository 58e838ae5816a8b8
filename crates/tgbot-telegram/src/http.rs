//! reqwest-backed [`Transport`] for the real Bot API.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tgbot_core::{
    config::BotConfig,
    error::BotError,
    request::{ApiRequest, FormField},
    traits::Transport,
};
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Posts to `{api_base}/bot{token}/{method}`.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    gzip_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &BotConfig) -> Result<Self, BotError> {
        let client = reqwest::Client::builder()
            .no_gzip()
            .build()
            .map_err(|e| BotError::Transport(format!("http client init failed: {e}")))?;
        let gzip_client = reqwest::Client::builder()
            .gzip(true)
            .build()
            .map_err(|e| BotError::Transport(format!("http client init failed: {e}")))?;

        Ok(Self {
            base_url: config.base_url(),
            client,
            gzip_client,
        })
    }
}

/// Multipart body for calls that carry a file.
async fn multipart_form(fields: Vec<(String, FormField)>) -> Result<Form, BotError> {
    let mut form = Form::new();
    for (name, field) in fields {
        form = match field {
            FormField::Text(value) => form.text(name, value),
            FormField::Bytes { data, file_name } => {
                form.part(name, Part::bytes(data).file_name(file_name))
            }
            FormField::Path(path) => {
                let file = tokio::fs::File::open(&path).await?;
                let len = file.metadata().await?.len();
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| name.clone());
                let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
                form.part(name, Part::stream_with_length(body, len).file_name(file_name))
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: ApiRequest) -> Result<Value, BotError> {
        let method = request.method.clone();
        let url = format!("{}/{}", self.base_url, method);
        let multipart = request.is_multipart();

        let client = if request.gzip {
            &self.gzip_client
        } else {
            &self.client
        };
        let mut builder = client.post(&url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder = if multipart {
            builder.multipart(multipart_form(request.fields).await?)
        } else {
            let pairs: Vec<(String, String)> = request
                .fields
                .into_iter()
                .filter_map(|(name, field)| match field {
                    FormField::Text(value) => Some((name, value)),
                    _ => None,
                })
                .collect();
            builder.form(&pairs)
        };

        // Error URLs embed the bot token; never let them reach the logs.
        let resp = builder.send().await.map_err(|e| {
            BotError::Transport(format!("telegram {method} failed: {}", e.without_url()))
        })?;
        let status = resp.status();
        debug!("[{method}] HTTP {status}");

        resp.json::<Value>().await.map_err(|e| {
            BotError::Transport(format!(
                "telegram {method} parse failed ({status}): {}",
                e.without_url()
            ))
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, BotError> {
        let download_error = |e: reqwest::Error| BotError::Download {
            url: url.to_string(),
            reason: e.without_url().to_string(),
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(download_error)?
            .error_for_status()
            .map_err(download_error)?;

        let mut data = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk.map_err(download_error)?);
        }
        Ok(data)
    }
}

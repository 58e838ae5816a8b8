//! Wire-level description of one Bot API call.

use std::path::PathBuf;
use std::time::Duration;

/// One form field of an outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    /// Plain form value.
    Text(String),
    /// In-memory file content, sent as multipart with the given file name.
    Bytes { data: Vec<u8>, file_name: String },
    /// Local file, streamed from disk under its own file name.
    Path(PathBuf),
}

impl FormField {
    pub fn is_file(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

/// A fully resolved Bot API call, ready for a [`crate::traits::Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: String,
    pub fields: Vec<(String, FormField)>,
    pub gzip: bool,
    pub headers: Vec<(String, String)>,
    /// Overrides the transport's default request timeout.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            fields: Vec::new(),
            gzip: false,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormField::Text(value.into())));
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: FormField) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether the call has to go out as multipart form data.
    pub fn is_multipart(&self) -> bool {
        self.fields.iter().any(|(_, f)| f.is_file())
    }

    /// First field called `name`.
    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Text value of the field called `name`.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(FormField::Text(s)) => Some(s),
            _ => None,
        }
    }
}

pub mod dify;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;

use crate::consts::{DEFAULT_UPLOAD_NAME, OCTET_STREAM};
use crate::error::Result;

/// Normalized review input, whatever the transport it arrived on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPayload {
    pub id: Option<String>,
    pub text: Option<String>,
    pub photo: Option<String>,
}

impl ReviewPayload {
    /// The text worth sending, trimmed. Blank text counts as none.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// A file the caller attached to the request body.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: Option<&str>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename
                .filter(|f| !f.is_empty())
                .unwrap_or(DEFAULT_UPLOAD_NAME)
                .to_string(),
            content_type: content_type
                .filter(|c| !c.is_empty())
                .unwrap_or(OCTET_STREAM)
                .to_string(),
            bytes,
        }
    }
}

/// Submits one review item and returns the workflow outputs.
/// The server and the batch runner only know this trait.
#[async_trait]
pub trait ReviewEngine: Send + Sync {
    async fn submit(&self, payload: &ReviewPayload, upload: Option<FileUpload>) -> Result<Value>;
}

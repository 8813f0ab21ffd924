use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::config::EngineConfig;
use crate::consts::{DEFAULT_UPLOAD_NAME, format_bytes};
use crate::error::{Result, ReviewError};
use crate::photo::{FileReference, PhotoSource, extension_for, guess_mime};

use super::{FileUpload, ReviewEngine, ReviewPayload};

const UPLOAD_PATH: &str = "/files/upload";
const RUN_PATH: &str = "/workflows/run";
const RESPONSE_MODE: &str = "blocking";

/// Review engine backed by a Dify workflow app.
pub struct DifyReviewEngine {
    config: EngineConfig,
    client: reqwest::Client,
}

impl DifyReviewEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Upload raw bytes and return the upstream file id.
    async fn upload_binary(&self, filename: &str, bytes: Vec<u8>, mime: &str) -> Result<String> {
        tracing::debug!(filename, mime, size = %format_bytes(bytes.len()), "uploading file");

        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|_| ReviewError::invalid_input(format!("Invalid content type: {mime}")))?;
        let form = Form::new()
            .part("file", part)
            .text("user", self.config.user_id.clone());

        let resp = self
            .client
            .post(self.endpoint(UPLOAD_PATH))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, "file upload rejected");
            return Err(ReviewError::UploadFailed(text));
        }

        let body: Value = resp.json().await?;
        Self::parse_upload_response(&body)
    }

    async fn upload_local_path(&self, path: &Path) -> Result<String> {
        if !self.config.allow_local_paths {
            return Err(ReviewError::LocalPathsDisabled);
        }
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(ReviewError::FileNotFound(path.display().to_string())),
        }

        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
        self.upload_binary(&filename, bytes, guess_mime(path)).await
    }

    /// Resolve the photo reference. An attached file wins over `payload.photo`.
    async fn build_photo(
        &self,
        payload: &ReviewPayload,
        upload: Option<FileUpload>,
    ) -> Result<Option<FileReference>> {
        if let Some(upload) = upload {
            let id = self
                .upload_binary(&upload.filename, upload.bytes, &upload.content_type)
                .await?;
            return Ok(Some(FileReference::Uploaded(id)));
        }

        let Some(raw) = payload.photo.as_deref() else {
            return Ok(None);
        };
        let reference = match PhotoSource::classify(raw)? {
            None => return Ok(None),
            Some(PhotoSource::Remote(url)) => FileReference::RemoteUrl(url),
            Some(PhotoSource::Inline { mime, bytes }) => {
                let filename = format!("photo.{}", extension_for(&mime));
                FileReference::Uploaded(self.upload_binary(&filename, bytes, &mime).await?)
            }
            Some(PhotoSource::LocalPath(path)) => {
                FileReference::Uploaded(self.upload_local_path(&path).await?)
            }
        };
        Ok(Some(reference))
    }

    /// Assemble workflow `inputs`. Text goes under both `text` and `Content`
    /// because deployed workflows read either name.
    fn build_inputs(text: Option<&str>, photo: Option<&FileReference>) -> Result<Map<String, Value>> {
        let mut inputs = Map::new();
        if let Some(text) = text {
            inputs.insert("text".to_string(), Value::String(text.to_string()));
            inputs.insert("Content".to_string(), Value::String(text.to_string()));
        }
        if let Some(photo) = photo {
            inputs.insert("photo".to_string(), photo.to_json());
        }
        if inputs.is_empty() {
            return Err(ReviewError::invalid_input(
                "At least one input (text or photo) is required.",
            ));
        }
        Ok(inputs)
    }

    fn parse_upload_response(body: &Value) -> Result<String> {
        let id = body
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                body.get("data")
                    .and_then(|d| d.get("id"))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
            });
        id.map(str::to_string).ok_or(ReviewError::MissingFileId)
    }

    /// Pull `outputs` out of a run response, failing on `status: failed`.
    /// Fields are looked up under `data` first, then at the top level.
    fn parse_run_response(body: &Value) -> Result<Value> {
        let status = pick(body, "status")
            .and_then(Value::as_str)
            .unwrap_or("succeeded");

        if status == "failed" {
            let message = match pick(body, "error") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => "Workflow failed".to_string(),
            };
            return Err(ReviewError::WorkflowFailed(message));
        }

        Ok(pick(body, "outputs")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())))
    }
}

#[async_trait]
impl ReviewEngine for DifyReviewEngine {
    async fn submit(&self, payload: &ReviewPayload, upload: Option<FileUpload>) -> Result<Value> {
        let text = payload.trimmed_text();
        let photo = self.build_photo(payload, upload).await?;
        let inputs = Self::build_inputs(text, photo.as_ref())?;

        let body = RunRequest {
            app_id: &self.config.app_id,
            inputs: &inputs,
            response_mode: RESPONSE_MODE,
            user: &self.config.user_id,
        };

        let fields: Vec<&str> = inputs.keys().map(String::as_str).collect();
        tracing::debug!(id = ?payload.id, ?fields, "running workflow");

        let resp = self
            .client
            .post(self.endpoint(RUN_PATH))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, id = ?payload.id, "workflow run rejected");
            return Err(ReviewError::WorkflowRequestFailed(text));
        }

        let data: Value = resp.json().await?;
        Self::parse_run_response(&data)
    }
}

/// `data.<key>` if truthy, else `<key>` if truthy.
fn pick<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get("data")
        .and_then(|d| d.get(key))
        .filter(|v| truthy(v))
        .or_else(|| body.get(key).filter(|v| truthy(v)))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

// --- API types ---

#[derive(Serialize)]
struct RunRequest<'a> {
    app_id: &'a str,
    inputs: &'a Map<String, Value>,
    response_mode: &'a str,
    user: &'a str,
}

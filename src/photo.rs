//! Photo inputs and the file references the workflow app expects.
//!
//! A caller can name a photo three ways: a remote URL (passed through),
//! a local path or a `data:` URI (both uploaded first), or a multipart
//! file handled by the engine directly.

use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};

use crate::consts::OCTET_STREAM;
use crate::error::{Result, ReviewError};

/// Where a `photo` string points.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoSource {
    Remote(String),
    Inline { mime: String, bytes: Vec<u8> },
    LocalPath(PathBuf),
}

impl PhotoSource {
    /// Classify a raw `photo` value. Blank input means no photo.
    pub fn classify(raw: &str) -> Result<Option<Self>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Some(PhotoSource::Remote(raw.to_string())));
        }
        if lower.starts_with("data:") {
            let (mime, bytes) = decode_data_uri(raw)?;
            return Ok(Some(PhotoSource::Inline { mime, bytes }));
        }

        Ok(Some(PhotoSource::LocalPath(expand_home(raw))))
    }
}

/// A file reference in the shape the workflow `inputs.photo` accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum FileReference {
    RemoteUrl(String),
    Uploaded(String),
}

impl FileReference {
    pub fn to_json(&self) -> Value {
        match self {
            FileReference::RemoteUrl(url) => json!({
                "type": "image",
                "transfer_method": "remote_url",
                "url": url,
                "remote_url": url,
            }),
            FileReference::Uploaded(id) => json!({
                "type": "image",
                "transfer_method": "local_file",
                "upload_file_id": id,
            }),
        }
    }
}

/// Guess a MIME type from the file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => OCTET_STREAM,
    }
}

/// File extension to use when uploading inline bytes of the given type.
pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Expand a leading `~` to the home directory. Other paths pass through.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

/// Decode `data:<mime>;base64,<payload>`. Only base64 payloads are accepted.
fn decode_data_uri(raw: &str) -> Result<(String, Vec<u8>)> {
    let body = &raw["data:".len()..];
    let (meta, payload) = body
        .split_once(',')
        .ok_or_else(|| ReviewError::invalid_input("Malformed data URI: missing ','"))?;

    let mut parts = meta.split(';');
    let mime = parts
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or(OCTET_STREAM)
        .to_ascii_lowercase();
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(ReviewError::invalid_input(
            "Malformed data URI: only base64 payloads are supported",
        ));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ReviewError::invalid_input(format!("Malformed data URI: {e}")))?;
    Ok((mime, bytes))
}

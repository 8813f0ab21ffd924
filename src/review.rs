//! Caller-facing request/response schema and the batch runner.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{ReviewEngine, ReviewPayload};
use crate::error::{Result, ReviewError};

/// One review item as the web client sends it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SingleReviewRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl SingleReviewRequest {
    /// Empty strings are treated as absent, as form fields often are.
    pub fn into_payload(self) -> ReviewPayload {
        fn present(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.is_empty())
        }
        ReviewPayload {
            id: present(self.id),
            text: present(self.text),
            photo: present(self.photo),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchReviewRequest {
    pub items: Vec<SingleReviewRequest>,
}

impl BatchReviewRequest {
    /// Validate a raw JSON body. `items` must be present and an array.
    pub fn from_json(body: &Value) -> Result<Self> {
        let items = body
            .get("items")
            .filter(|v| v.is_array())
            .ok_or_else(|| ReviewError::invalid_input("Invalid request: items must be an array"))?;
        let items = serde_json::from_value(items.clone())
            .map_err(|e| ReviewError::invalid_input(format!("Invalid request: {e}")))?;
        Ok(Self { items })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReviewResponse {
    pub id: Option<String>,
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewResponse {
    pub fn succeeded(id: Option<String>, outputs: Value) -> Self {
        Self {
            id,
            status: ReviewStatus::Succeeded,
            outputs: Some(outputs),
            error: None,
        }
    }

    pub fn failed(id: Option<String>, error: &ReviewError) -> Self {
        Self {
            id,
            status: ReviewStatus::Failed,
            outputs: None,
            error: Some(error.to_string()),
        }
    }
}

/// Submit items one after another. A failing item is recorded and the loop
/// moves on; `delay` is slept after each success.
pub async fn run_batch(
    engine: &dyn ReviewEngine,
    items: Vec<SingleReviewRequest>,
    delay: Duration,
) -> Vec<ReviewResponse> {
    let total = items.len();
    let mut results = Vec::with_capacity(total);

    for (index, item) in items.into_iter().enumerate() {
        let payload = item.into_payload();
        match engine.submit(&payload, None).await {
            Ok(outputs) => {
                tracing::debug!(index, total, id = ?payload.id, "batch item succeeded");
                results.push(ReviewResponse::succeeded(payload.id, outputs));
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => {
                tracing::warn!(index, total, id = ?payload.id, error = %e, "batch item failed");
                results.push(ReviewResponse::failed(payload.id, &e));
            }
        }
    }

    results
}

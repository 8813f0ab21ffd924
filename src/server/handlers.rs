use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use super::AppState;
use crate::engine::FileUpload;
use crate::error::ReviewError;
use crate::review::{BatchReviewRequest, ReviewResponse, SingleReviewRequest, run_batch};

/// Health check endpoint.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /api/review/single
pub async fn review_single(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ReviewResponse>, AppError> {
    let multipart = multipart.map_err(|rejection| {
        ReviewError::rejected(
            rejection.status(),
            format!("Invalid form data: {}", rejection.body_text()),
        )
    })?;
    let mut request = SingleReviewRequest::default();
    let form = read_single_form(multipart, &mut request).await;
    let upload = form.map_err(|error| AppError {
        id: request.id.clone().filter(|id| !id.is_empty()),
        error,
    })?;
    let payload = request.into_payload();

    match state.engine.submit(&payload, upload).await {
        Ok(outputs) => Ok(Json(ReviewResponse::succeeded(payload.id, outputs))),
        Err(error) => Err(AppError {
            id: payload.id,
            error,
        }),
    }
}

/// POST /api/review/batch
pub async fn review_batch(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let Json(body) = body.map_err(|rejection| {
        ReviewError::rejected(
            rejection.status(),
            format!("Invalid request: {}", rejection.body_text()),
        )
    })?;
    let request = BatchReviewRequest::from_json(&body)?;

    tracing::info!(items = request.items.len(), "running review batch");
    let results = run_batch(state.engine.as_ref(), request.items, state.batch_delay).await;
    Ok(Json(results))
}

/// Collect the known form fields. Unknown fields are skipped and an empty
/// `photo_file` part (a form submitted without choosing a file) is ignored.
/// Fields read before a failure stay in `request`.
async fn read_single_form(
    mut multipart: Multipart,
    request: &mut SingleReviewRequest,
) -> Result<Option<FileUpload>, ReviewError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "id" => request.id = Some(field.text().await.map_err(bad_form)?),
            "text" => request.text = Some(field.text().await.map_err(bad_form)?),
            "photo" => request.photo = Some(field.text().await.map_err(bad_form)?),
            "photo_file" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_form)?;
                if !bytes.is_empty() {
                    upload = Some(FileUpload::new(
                        filename.as_deref(),
                        content_type.as_deref(),
                        bytes.to_vec(),
                    ));
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(upload)
}

fn bad_form(err: MultipartError) -> ReviewError {
    ReviewError::rejected(
        err.status(),
        format!("Invalid form data: {}", err.body_text()),
    )
}

/// A failed review rendered as `{"id", "status": "failed", "error"}`.
pub struct AppError {
    pub id: Option<String>,
    pub error: ReviewError,
}

impl From<ReviewError> for AppError {
    fn from(error: ReviewError) -> Self {
        AppError { id: None, error }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        if status.is_server_error() {
            tracing::warn!(%status, id = ?self.id, error = %self.error, "review failed");
        } else {
            tracing::debug!(%status, id = ?self.id, error = %self.error, "review rejected");
        }
        (status, Json(ReviewResponse::failed(self.id, &self.error))).into_response()
    }
}

//! Error types for review submission.

use axum::http::StatusCode;
use thiserror::Error;

/// Everything that can go wrong between accepting a review request and
/// returning the workflow outputs.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// The caller sent something we cannot forward.
    #[error("{0}")]
    InvalidInput(String),

    /// The HTTP layer refused the request body (too large, wrong
    /// content type, unreadable form). Keeps the extractor's status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error(
        "Local file paths are not supported in serverless environments. Please use remote URLs instead."
    )]
    LocalPathsDisabled,

    #[error("Dify file upload failed: {0}")]
    UploadFailed(String),

    #[error("Dify upload response missing file id")]
    MissingFileId,

    #[error("Dify workflow failed: {0}")]
    WorkflowRequestFailed(String),

    /// The workflow ran but reported `status: failed`.
    #[error("{0}")]
    WorkflowFailed(String),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReviewError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ReviewError::InvalidInput(msg.into())
    }

    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        ReviewError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// HTTP status this error maps to at the proxy boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::InvalidInput(_)
            | ReviewError::FileNotFound(_)
            | ReviewError::LocalPathsDisabled => StatusCode::BAD_REQUEST,
            ReviewError::UploadFailed(_)
            | ReviewError::MissingFileId
            | ReviewError::WorkflowRequestFailed(_)
            | ReviewError::WorkflowFailed(_)
            | ReviewError::Transport(_) => StatusCode::BAD_GATEWAY,
            ReviewError::Rejected { status, .. } => *status,
            ReviewError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_bad_request() {
        assert_eq!(
            ReviewError::invalid_input("nope").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReviewError::FileNotFound("/x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReviewError::LocalPathsDisabled.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_errors_are_bad_gateway() {
        assert_eq!(
            ReviewError::UploadFailed("boom".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ReviewError::MissingFileId.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ReviewError::WorkflowFailed("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn rejections_keep_their_status() {
        let err = ReviewError::rejected(StatusCode::PAYLOAD_TOO_LARGE, "too big");
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_string(), "too big");
    }

    #[test]
    fn io_errors_are_internal() {
        let err = ReviewError::from(std::io::Error::other("disk"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn messages_name_the_upstream() {
        assert_eq!(
            ReviewError::UploadFailed("quota".into()).to_string(),
            "Dify file upload failed: quota"
        );
        assert_eq!(
            ReviewError::WorkflowRequestFailed("503".into()).to_string(),
            "Dify workflow failed: 503"
        );
        assert_eq!(
            ReviewError::FileNotFound("/tmp/a.png".into()).to_string(),
            "File not found: /tmp/a.png"
        );
    }
}

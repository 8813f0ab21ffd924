//! Test doubles: an in-process fake of the workflow API and a proxy launcher.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use sentinel_review::config::EngineConfig;
use sentinel_review::consts::DEFAULT_MAX_BODY_BYTES;
use sentinel_review::engine::ReviewEngine;
use sentinel_review::engine::dify::DifyReviewEngine;
use sentinel_review::server::{self, AppState};

pub const API_KEY: &str = "app-test-key";
pub const APP_ID: &str = "app-under-test";

#[derive(Debug, Clone, Default)]
pub struct RecordedUpload {
    pub auth: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub user: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub auth: Option<String>,
    pub body: Value,
}

/// A canned HTTP reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
        }
    }

    pub fn error(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Clone)]
struct Shared {
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    runs: Arc<Mutex<Vec<RecordedRun>>>,
    upload_reply: Reply,
    /// `None` echoes the inputs back as outputs.
    run_reply: Option<Reply>,
}

pub struct FakeDify {
    pub base_url: String,
    shared: Shared,
}

impl FakeDify {
    /// Uploads succeed with id `file-123`; runs echo their inputs.
    pub async fn start() -> Self {
        Self::start_with(Reply::ok(json!({"id": "file-123", "name": "x"})), None).await
    }

    pub async fn start_with(upload_reply: Reply, run_reply: Option<Reply>) -> Self {
        let shared = Shared {
            uploads: Arc::default(),
            runs: Arc::default(),
            upload_reply,
            run_reply,
        };
        let app = Router::new()
            .route("/v1/files/upload", post(upload))
            .route("/v1/workflows/run", post(run))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            shared,
        }
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.shared.uploads.lock().unwrap().clone()
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.shared.runs.lock().unwrap().clone()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(&self.base_url, API_KEY, APP_ID)
    }

    pub fn engine(&self) -> Arc<DifyReviewEngine> {
        Arc::new(DifyReviewEngine::new(self.engine_config()).unwrap())
    }
}

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn upload(
    State(shared): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut record = RecordedUpload {
        auth: auth_header(&headers),
        ..Default::default()
    };
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                record.filename = field.file_name().map(str::to_string);
                record.content_type = field.content_type().map(str::to_string);
                record.bytes = field.bytes().await.unwrap().to_vec();
            }
            Some("user") => record.user = Some(field.text().await.unwrap()),
            _ => {}
        }
    }
    shared.uploads.lock().unwrap().push(record);
    (shared.upload_reply.status, shared.upload_reply.body.clone())
}

async fn run(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let inputs = body["inputs"].clone();
    shared.runs.lock().unwrap().push(RecordedRun {
        auth: auth_header(&headers),
        body,
    });
    match &shared.run_reply {
        Some(reply) => (reply.status, reply.body.clone()),
        None => (
            StatusCode::OK,
            json!({
                "workflow_run_id": "run-1",
                "data": {"status": "succeeded", "outputs": {"echo": inputs}}
            })
            .to_string(),
        ),
    }
}

/// Serve the proxy on an ephemeral port and return its base URL.
pub async fn start_proxy(engine: Arc<dyn ReviewEngine>) -> String {
    start_proxy_with_limit(engine, DEFAULT_MAX_BODY_BYTES).await
}

pub async fn start_proxy_with_limit(
    engine: Arc<dyn ReviewEngine>,
    max_body_bytes: usize,
) -> String {
    let app = server::router(AppState::new(engine, Duration::ZERO), max_body_bytes);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server::serve(listener, app, std::future::pending()).await;
    });
    format!("http://{addr}")
}

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{FileUpload, ReviewEngine, ReviewPayload};
use crate::error::{Result, ReviewError};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Scripted {
    Outputs(Value),
    /// Fails with `ReviewError::WorkflowFailed(msg)`.
    Fail(String),
    /// Fails with `ReviewError::InvalidInput(msg)`.
    Reject(String),
}

/// A scripted engine for tests. Returns pre-defined replies in order and
/// records every payload it saw.
pub struct MockEngine {
    replies: Vec<Scripted>,
    index: AtomicUsize,
    seen: Mutex<Vec<(ReviewPayload, Option<String>)>>,
}

impl MockEngine {
    pub fn new(replies: Vec<Scripted>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Payloads received so far, paired with the attached filename if any.
    pub fn seen(&self) -> Vec<(ReviewPayload, Option<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReviewEngine for MockEngine {
    async fn submit(&self, payload: &ReviewPayload, upload: Option<FileUpload>) -> Result<Value> {
        self.seen
            .lock()
            .unwrap()
            .push((payload.clone(), upload.map(|u| u.filename)));

        let i = self.index.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.get(i).cloned().ok_or_else(|| {
            ReviewError::invalid_input(format!("MockEngine: no more replies (called {} times)", i + 1))
        })?;
        match reply {
            Scripted::Outputs(v) => Ok(v),
            Scripted::Fail(msg) => Err(ReviewError::WorkflowFailed(msg)),
            Scripted::Reject(msg) => Err(ReviewError::InvalidInput(msg)),
        }
    }
}

//! Runtime configuration read from the environment.
//!
//! Every constructor takes a lookup function so tests can feed a map
//! instead of touching the process environment. [`EngineConfig::from_env`]
//! and [`ServerConfig::from_env`] are the thin wrappers the binary uses.

use std::time::Duration;

use anyhow::{Result, bail};

use crate::consts::{
    DEFAULT_BATCH_DELAY, DEFAULT_BIND_ADDR, DEFAULT_MAX_BODY_BYTES, DEFAULT_TIMEOUT,
    DEFAULT_USER_ID,
};

/// Connection details for the upstream workflow app.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// API root, e.g. `https://api.dify.ai/v1`. Never ends with `/`.
    pub base_url: String,
    pub api_key: String,
    pub app_id: String,
    pub user_id: String,
    pub timeout: Duration,
    /// Whether `photo` may name a file on this machine.
    pub allow_local_paths: bool,
}

impl EngineConfig {
    pub fn new(base_url: &str, api_key: &str, app_id: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            app_id: app_id.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            timeout: DEFAULT_TIMEOUT,
            allow_local_paths: true,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let required = ["DIFY_BASE_URL", "DIFY_API_KEY", "DIFY_APP_ID"];
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|&key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let mut config = Self::new(
            &get("DIFY_BASE_URL").unwrap_or_default(),
            &get("DIFY_API_KEY").unwrap_or_default(),
            &get("DIFY_APP_ID").unwrap_or_default(),
        );
        if let Some(user_id) = get("DIFY_USER_ID") {
            config.user_id = user_id;
        }
        if let Some(secs) = get("DIFY_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        // Serverless hosts have no useful local filesystem.
        config.allow_local_paths = get("NETLIFY").is_none() && get("VERCEL").is_none();
        Ok(config)
    }
}

/// Settings for the HTTP front.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub batch_delay: Duration,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            batch_delay: DEFAULT_BATCH_DELAY,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("SENTINEL_ADDR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.bind_addr),
            batch_delay: lookup("SENTINEL_BATCH_DELAY_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.batch_delay),
            max_body_bytes: lookup("SENTINEL_MAX_BODY_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
        }
    }
}

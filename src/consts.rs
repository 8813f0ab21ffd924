//! Project-wide constants.

use std::time::Duration;

/// User identifier reported to the workflow app when none is configured.
pub const DEFAULT_USER_ID: &str = "sentinel-review-web";

/// Address the proxy listens on by default. The web client expects port 9000.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:9000";

/// Upstream request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause after each successful batch item.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(350);

/// Request body ceiling; photos routinely exceed axum's 2 MiB default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Filename sent upstream when a multipart file arrives without one.
pub const DEFAULT_UPLOAD_NAME: &str = "upload";

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Format a byte count for log lines (e.g. 1.5 MiB).
pub fn format_bytes(n: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", n, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

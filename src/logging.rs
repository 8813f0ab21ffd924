//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "sentinel_review=info,sentinel=info,tower_http=info";
const VERBOSE_FILTER: &str = "sentinel_review=debug,sentinel=debug,tower_http=debug";

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
/// Safe to call more than once; later calls are no-ops.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

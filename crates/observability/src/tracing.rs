//! Tracing/logging initialization.
//!
//! JSON lines on stderr (stdout carries report output), filtered by
//! `RUST_LOG` when set.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LEVEL: &str = "info";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default_level(DEFAULT_LEVEL);
}

/// Like [`init`], with a caller-chosen fallback filter (e.g. `"debug"` for a
/// verbose CLI run). `RUST_LOG` still wins when set.
pub fn init_with_default_level(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

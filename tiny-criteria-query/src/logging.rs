//! Logging setup driven by environment variables.
//!
//! The crates emit events through `tracing`; nothing is printed until a
//! subscriber is installed. [`init`] installs one (with the
//! `tracing-subscriber` feature) when asked to by the environment:
//!
//! - `TINY_CRITERIA_DEBUG=true|1|yes` - enable debug logging
//! - `TINY_CRITERIA_LOG_LEVEL=trace|debug|info|warn|error` - set the level
//! - `TINY_CRITERIA_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! ```rust,no_run
//! use tiny_criteria_query::logging;
//!
//! logging::init();
//! ```
//!
//! Events to expect:
//!
//! ```rust,ignore
//! debug!(operation = "list", entity = "Customer", predicates = 2, "executing criteria");
//! trace!(relation = "orders", alias = "t1", "registered join");
//! debug!(sql = %sql, params = 2, "executing query");
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "TINY_CRITERIA_DEBUG";
const LEVEL_VAR: &str = "TINY_CRITERIA_LOG_LEVEL";
const FORMAT_VAR: &str = "TINY_CRITERIA_LOG_FORMAT";

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_level(value: Option<&str>, debug: bool) -> &'static str {
    match value.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ if debug => "debug",
        _ => "warn",
    }
}

fn parse_format(value: Option<&str>) -> &'static str {
    match value.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

/// Check if debug logging is enabled via `TINY_CRITERIA_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR).map(|v| is_truthy(&v)).unwrap_or(false)
}

/// The configured log level.
///
/// Defaults to "debug" when debug logging is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    parse_level(env::var(LEVEL_VAR).ok().as_deref(), is_debug_enabled())
}

/// The configured log format. Defaults to "json".
pub fn get_log_format() -> &'static str {
    parse_format(env::var(FORMAT_VAR).ok().as_deref())
}

/// Initialize logging.
///
/// Only the first call has any effect, and only when `TINY_CRITERIA_DEBUG`
/// or `TINY_CRITERIA_LOG_LEVEL` is set. Without the `tracing-subscriber`
/// feature this never installs a subscriber; install your own instead.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!(
                "tiny_criteria={},tiny_criteria_query={},tiny_criteria_sqlite={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            // Another subscriber may already be installed; keep it.
            let installed = match get_log_format() {
                "json" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                "compact" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                _ => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = level,
                    format = get_log_format(),
                    "tiny-criteria logging initialized"
                );
            }
        }
    });
}

/// Set the level and initialize logging.
///
/// # Safety
///
/// This modifies environment variables, which is unsafe in multi-threaded
/// programs. Call it at startup before spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as startup-only, before other threads exist.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

/// Enable debug logging and initialize.
///
/// # Safety
///
/// Same caveat as [`init_with_level`].
pub fn init_debug() {
    // SAFETY: documented as startup-only, before other threads exist.
    unsafe {
        env::set_var(DEBUG_VAR, "true");
    }
    init();
}

//! Logging facade for the unifs workspace
//!
//! Every crate logs through the macros defined here so that a single
//! environment variable controls verbosity.
//!
//! Usage:
//! - Set UNIFS_LOG=off (default) - no logs
//! - Set UNIFS_LOG=info - mounts, closes, uploads
//! - Set UNIFS_LOG=debug - cache hits/misses, paging, temp-file staging

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`]
pub const LOG_ENV_VAR: &str = "UNIFS_LOG";

static INIT: Once = Once::new();

/// Minimum level selected by a `UNIFS_LOG` value, `None` meaning logging is off.
///
/// Unknown values fall back to `info`.
fn parse_level(value: &str) -> Option<emit::Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" | "" => None,
        "debug" => Some(emit::Level::Debug),
        "warn" => Some(emit::Level::Warn),
        "error" => Some(emit::Level::Error),
        _ => Some(emit::Level::Info),
    }
}

/// Initialize diagnostics based on the UNIFS_LOG environment variable
///
/// Safe to call multiple times; only the first call installs an emitter.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "off".to_string());
        let Some(level) = parse_level(&value) else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime lives for the rest of the process.
        std::mem::forget(rt);
    });
}

/// Log basic operations (mounts, closes, uploads)
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (cache traffic, paging, staging)
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems (leaked resources force-closed, cleanup failures)
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that abort an operation
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;

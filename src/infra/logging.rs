//! Diagnostic logging setup.
//!
//! User-facing progress is printed to stdout by the reporting layer; this
//! module only configures `tracing` for diagnostics, written to stderr.
//! `ENV_MATRIX_LOG` (or `RUST_LOG`) takes a standard `EnvFilter` directive.

use tracing_subscriber::{EnvFilter, prelude::*};

/// Variable consulted first for the log filter.
pub const LOG_ENV_VAR: &str = "ENV_MATRIX_LOG";

/// Initialize tracing. Call once at process startup.
/// `verbosity` 0 logs warnings, 1 debug output of this crate, 2+ everything at trace.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "env_matrix=warn",
        1 => "env_matrix=debug",
        _ => "trace",
    };

    let filter = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init();
}

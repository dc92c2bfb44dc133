//! Logging initialization
//!
//! `tracing` subscriber setup with `RUST_LOG`-style filtering. Kept small:
//! the process entry point calls [`init`] once; library code only emits
//! events.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` when set, falling back to the supplied directive.
/// Safe to call more than once; later calls are no-ops.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

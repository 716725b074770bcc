//! Structured logging setup.
//!
//! The core emits `tracing` events tagged with session identity and the
//! failing pipeline stage; this helper installs a subscriber that surfaces
//! them. Honors `RUST_LOG` when set.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a global subscriber at the given default level.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

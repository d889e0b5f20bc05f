//! Diagnostic tracing for the scaffolder.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: operator diagnostics via `RUST_LOG`, output to
//!   stderr. Sandbox violations, rejected commands and provider failures are
//!   logged at `warn`, so they show up under the default filter.
//!
//! - **Progress lines**: printed by the CLI to stdout from the loop's progress
//!   callback. Always shown, unaffected by `RUST_LOG`.
//!
//! - **Generation summary (`io/summary`)**: the durable JSON record of a
//!   session, written into the project directory.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=scaffolder=debug scaffolder generate --name demo --type Flask --description "..."
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

//! `tracing` setup for native hosts and tests.
//!
//! Browser builds should use `weft_web::logging::init` instead, which writes
//! to the devtools console.

use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static TRACING_INSTALLED: Once = Once::new();

/// Installs a formatting subscriber filtered by `RUST_LOG` (default `info`).
///
/// Idempotent. Does nothing if another global subscriber is already set.
pub fn init() {
    TRACING_INSTALLED.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let result = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_filter(filter))
            .try_init();
        if result.is_err() {
            eprintln!("weft: tracing subscriber already installed");
        }
    });
}

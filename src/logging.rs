//! Tracing subscriber setup
//!
//! Log lines go to stderr so command output on stdout stays clean. The filter
//! comes from `RUST_LOG` when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn,shelf=info";

/// Initialize the global tracing subscriber
///
/// Must be called once at startup. `verbose` raises the crate's own level to
/// debug when no explicit `RUST_LOG` is given.
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,shelf=debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    // Ignored when a subscriber is already installed
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

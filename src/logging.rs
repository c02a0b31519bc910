//! Logging configuration for the driver binary.
//!
//! Logs go to stderr so simulation output on stdout stays clean. Set
//! `DEBUG_LOGGING=1` to enable debug output for flextimer crates, or
//! `RUST_LOG` for full control.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEBUG_DIRECTIVE: &str = "info,flextimer=debug,flextimer_core=debug";

/// Initialize stderr logging.
///
/// # Behavior
/// - `RUST_LOG` set: used verbatim
/// - `DEBUG_LOGGING` set: debug for flextimer crates, info for dependencies
/// - Otherwise: INFO+ for everything
pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug_logging { DEBUG_DIRECTIVE } else { "info" })
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();

    tracing::debug!(debug_logging, "FlexTimer logging initialized");
}

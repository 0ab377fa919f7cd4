//! Structured logging.
//!
//! `RUST_LOG` wins when set; otherwise this crate logs at the configured
//! level and dependencies at `warn`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for `log_level`.
pub fn default_directive(log_level: &str) -> String {
    format!("warn,dca_submitter={}", log_level)
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

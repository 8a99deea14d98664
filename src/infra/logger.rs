// src/infra/logger.rs — Run-loop logging

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber for one CLI invocation.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies. Events go
/// to stderr so the run summary printed on stdout stays clean, and targets
/// are dropped since the iteration/phase fields already identify the
/// emitting stage of the loop.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

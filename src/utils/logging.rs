// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the tracing subscriber. `RUST_LOG` wins when set; otherwise
/// `default_directive` applies (e.g. "info", or "edinet_extractor=debug").
/// Output goes to stderr so stdout only carries the JSON result.
pub fn setup_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Logging initialised with default directive {:?}", default_directive);
}

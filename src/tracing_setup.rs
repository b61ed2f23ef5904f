//! Structured logging setup for the ingestion service.
//!
//! Configures the `tracing` ecosystem with file/line/level metadata and span-close
//! events, same as the framework's original tracing layer, but driven by `RUST_LOG`
//! instead of a fixed level so deployments can tune verbosity without a rebuild.

use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initializes the global tracing subscriber with formatted output.
///
/// Reads `RUST_LOG` for the filter directive, defaulting to `info` when unset or
/// unparseable.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .with_filter(filter),
        )
        .init();
}

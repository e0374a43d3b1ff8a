//! Shared tracing/logging initialization.
//!
//! The server and the CLI both log to stderr (stdout belongs to the CLI's
//! user-facing output) through an env-filter, as text or as JSON lines.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset, e.g.
/// `"recipebox_server=info"`.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

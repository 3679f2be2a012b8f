//! Tracing initialization.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "SHARD_SEARCH_LOG";

static INIT: Once = Once::new();

/// Install the global subscriber once; later calls are no-ops.
///
/// Output goes to stderr so the query shell keeps stdout for results.
pub fn init() {
    INIT.call_once(|| {
        let under_test = cfg!(test) || std::env::var_os("CARGO_TARGET_TMPDIR").is_some();
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter(under_test))
            .with_ansi(false)
            .compact();

        let installed = if under_test {
            builder.with_test_writer().finish().try_init()
        } else {
            builder.with_writer(std::io::stderr).finish().try_init()
        };
        if let Err(e) = installed {
            eprintln!("tracing already initialized: {}", e);
        }
    });
}

fn filter(under_test: bool) -> EnvFilter {
    let fallback = if under_test { "shard_search=debug" } else { "shard_search=info" };
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

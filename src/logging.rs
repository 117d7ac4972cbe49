//! Logging setup for the `ctipkg` binary.
//!
//! Library code only emits `tracing` events; whoever embeds the library
//! installs the subscriber. The binary writes to stderr, filtered by
//! `RUST_LOG` (default `info`, or `debug` with `-v`).

use tracing_subscriber::EnvFilter;

/// Install the global stderr subscriber. Calling it twice is harmless.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

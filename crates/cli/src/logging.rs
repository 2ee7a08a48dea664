//! Subscriber setup. Library crates only emit events; the binary decides
//! where they go.

use tracing_subscriber::{fmt, EnvFilter};

/// Maps `-v` counts onto a default filter. `RUST_LOG` wins when set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    // A second init (tests, embedding) is harmless.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

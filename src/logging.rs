//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise `-v` flags pick the level for this
//! crate and dependencies stay at `warn`.

use tracing_subscriber::EnvFilter;

pub fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,patternscope={level}")
}

/// Installs a stderr fmt subscriber. A second call is a no-op.
pub fn init_tracing(verbosity: u8, no_color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

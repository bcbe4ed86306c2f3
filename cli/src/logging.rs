//! Diagnostic logging setup.
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.
//! `RUST_LOG` wins over `--verbose`.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count.
#[must_use]
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter: `RUST_LOG` when set and valid, else the verbosity level
/// for this crate and `warn` for everything else.
#[must_use]
pub fn filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,dockhand_cli={}", level_for(verbosity)))
    })
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .try_init();
}

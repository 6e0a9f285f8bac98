//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber filtered at `default_level`.
///
/// `RUST_LOG`, when set, takes precedence. Calling this more than once is
/// harmless; only the first subscriber is installed.
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}

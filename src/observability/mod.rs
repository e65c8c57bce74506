//! Logging levels and subscriber setup.
//!
//! All diagnostics go through `tracing`. The binary installs a
//! `tracing-subscriber` formatter on stderr so stdout carries only program
//! output.

pub mod level;

pub use level::{LogLevel, ParseLevelError};

/// Installs a stderr `fmt` subscriber filtered at `level`.
///
/// `RUST_LOG`, when set, takes precedence over `level`. Returns `false` if a
/// global subscriber was already installed.
#[cfg(feature = "cli")]
pub fn init_subscriber(level: LogLevel) -> bool {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level.to_tracing()).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

//! Shared helpers for unit and integration tests.
//!
//! Enabled under `cfg(test)` and by the `test-internals` feature so the
//! integration tests in `tests/` can use the same logging setup.

use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

/// Installs a test-writer `fmt` subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `debug` for this crate.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cancel_lines=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Writes `contents` to a file named `name` inside a fresh temporary
/// directory. The directory lives as long as the returned guard.
///
/// # Panics
///
/// Panics if the temporary directory or file cannot be created.
#[must_use]
pub fn fixture_file(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    (dir, path)
}

/// Milliseconds as a [`Duration`], for terse test timing.
#[must_use]
pub const fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Logs the start of a test phase.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        ::tracing::info!(test = $name, "=== TEST START ===");
    };
}

/// Logs successful completion of a test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        ::tracing::info!(test = $name, "=== TEST COMPLETE ===");
    };
    ($name:expr, $($field:tt)+) => {
        ::tracing::info!(test = $name, $($field)+, "=== TEST COMPLETE ===");
    };
}

/// Asserts `cond`, logging expected and actual values before failing.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        if !$cond {
            ::tracing::error!(
                message = $msg,
                expected = ?$expected,
                actual = ?$actual,
                "Assertion failed"
            );
        }
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

//! Helpers shared by the integration suites.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

pub use cancel_lines::test_utils::{fixture_file as fixture, init_test_logging, ms};

/// A path inside a fresh temporary directory that does not exist.
pub fn missing(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    (dir, path)
}

/// Logs the test name and installs logging.
macro_rules! init_test {
    ($name:expr) => {
        common::init_test_logging();
        cancel_lines::test_phase!($name);
    };
}

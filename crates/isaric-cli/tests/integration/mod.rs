//! Integration tests for the `isaric` command handlers.

mod config_and_encode;

use std::path::{Path, PathBuf};

/// The loader's synthetic project.
pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../isaric-loader/tests/fixtures/data")
}

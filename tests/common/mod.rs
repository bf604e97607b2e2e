//! Common utilities for tda CLI integration tests

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Test configuration for integration tests
pub struct TestConfig {
    pub temp_dir: TempDir,
    pub tda_binary: PathBuf,
}

impl TestConfig {
    /// Create a new test configuration with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            temp_dir,
            tda_binary: PathBuf::from(env!("CARGO_BIN_EXE_tda")),
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Command running tda inside the temporary directory, logging into it
    pub fn tda_command(&self) -> Command {
        let mut command = Command::new(&self.tda_binary);
        command
            .current_dir(self.temp_path())
            .env("TDA_LOG_FILE", self.temp_path().join("tda.log"))
            .env_remove("TDA_LOG_LEVEL")
            .env_remove("RUST_LOG");
        command
    }
}

//! TestWorld pattern for CLI integration tests.
//!
//! Owns a temporary directory, writes snapshot files into it and runs the
//! `agtimeline` binary with an isolated config path.

use anyhow::Result;
use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use agtimeline_types::Snapshot;

use crate::fixtures;

pub struct TestWorld {
    temp_dir: TempDir,
    config_path: PathBuf,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");

        Self {
            temp_dir,
            config_path,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write a raw config file.
    pub fn with_config(self, content: &str) -> Self {
        std::fs::write(&self.config_path, content).expect("Failed to write config");
        self
    }

    /// Write `snapshot` as JSON and return its path.
    pub fn write_snapshot(&self, name: &str, snapshot: &Snapshot) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(snapshot)?)?;
        Ok(path)
    }

    /// Write arbitrary text (e.g. malformed JSON) and return its path.
    pub fn write_raw(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn sample_snapshot_path(&self) -> PathBuf {
        self.write_snapshot("snapshot.json", &fixtures::sample_snapshot())
            .expect("Failed to write sample snapshot")
    }

    /// `agtimeline` command bound to this world's config file.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("agtimeline").expect("Failed to find agtimeline binary");
        cmd.arg("--config").arg(&self.config_path);
        cmd.env_remove("AGTIMELINE_PATH");
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

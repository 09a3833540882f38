//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::Config;
use tempfile::TempDir;

/// A sheet URL with a well-formed spreadsheet ID for tests.
pub(crate) const SHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1LedgerBotTestSheet0000000000000000000000000/edit";

/// Test environment that sets up a ledger-bot home directory with a Config. Holds the TempDir
/// to keep the directory alive for the duration of the test.
pub(crate) struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a freshly-initialized Config.
    pub(crate) async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("ledger-bot");
        let config = Config::create(&root, SHEET_URL).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub(crate) fn config(&self) -> Config {
        self.config.clone()
    }
}

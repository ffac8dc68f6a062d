// crates/data-delivery-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for data-delivery-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::PathBuf;

use data_delivery_config::ConfigError;
use data_delivery_config::DataDeliveryConfig;
use tempfile::TempDir;
use tempfile::tempdir;

/// Result type for config tests.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a validated `DataDeliveryConfig`.
pub fn config_from_toml(toml_str: &str) -> Result<DataDeliveryConfig, ConfigError> {
    DataDeliveryConfig::from_toml(toml_str)
}

/// Writes `content` to a config file in a fresh temp directory.
pub fn write_config(content: &[u8]) -> Result<(TempDir, PathBuf), String> {
    let dir = tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("data-delivery.toml");
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok((dir, path))
}

/// Checks that a config result is an error mentioning `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

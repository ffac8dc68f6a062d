//! Config file loading tests for data-delivery-config.
// crates/data-delivery-config/tests/config_loading.rs
// =============================================================================
// Module: Config Loading Tests
// Description: Validate file reading, size limits, and encoding checks.
// Purpose: Ensure config files are read fail-closed.
// =============================================================================

use data_delivery_config::DataDeliveryConfig;

mod common;

use common::TestResult;
use common::assert_invalid;
use common::write_config;

#[test]
fn load_reads_explicit_path() -> TestResult {
    let (_dir, path) = write_config(b"[metadata]\nfacet_timeout_ms = 1000\n")?;
    let config = DataDeliveryConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.metadata.facet_timeout_ms != 1000 {
        return Err("facet timeout not loaded from file".to_string());
    }
    Ok(())
}

#[test]
fn load_missing_file_is_io_error() -> TestResult {
    let (dir, _path) = write_config(b"")?;
    let missing = dir.path().join("absent.toml");
    assert_invalid(DataDeliveryConfig::load(Some(&missing)), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut content = b"# padding\n".to_vec();
    content.resize(1024 * 1024 + 1, b'#');
    let (_dir, path) = write_config(&content)?;
    assert_invalid(DataDeliveryConfig::load(Some(&path)), "exceeds size limit")
}

#[test]
fn load_rejects_non_utf8() -> TestResult {
    let (_dir, path) = write_config(&[0xff, 0xfe, 0x00])?;
    assert_invalid(DataDeliveryConfig::load(Some(&path)), "must be utf-8")
}

#[test]
fn load_validates_after_parsing() -> TestResult {
    let (_dir, path) = write_config(b"[notifications]\nchannel_capacity = 0\n")?;
    assert_invalid(DataDeliveryConfig::load(Some(&path)), "channel_capacity")
}

//! Config defaults and validation tests for data-delivery-config.
// crates/data-delivery-config/tests/config_validation.rs
// =============================================================================
// Module: Config Defaults and Validation Tests
// Description: Validate defaults, range limits, and conversions.
// Purpose: Ensure minimal config is valid and limits fail closed.
// =============================================================================

use std::time::Duration;

use data_delivery_config::DataDeliveryConfig;

mod common;

use common::TestResult;
use common::assert_invalid;
use common::config_from_toml;

#[test]
fn empty_config_uses_defaults() -> TestResult {
    let config = config_from_toml("").map_err(|err| err.to_string())?;
    if config.negotiation.default_maximum_latency_minutes != 1440 {
        return Err("default maximum latency should be one day".to_string());
    }
    if config.negotiation.prompt_title != "Unable to Schedule" {
        return Err("unexpected default prompt title".to_string());
    }
    if config.metadata.facet_timeout_ms != 30_000 {
        return Err("unexpected default facet timeout".to_string());
    }
    if !config.notifications.log_sink || config.notifications.dispatcher != "log" {
        return Err("log sink should be enabled with the log dispatcher".to_string());
    }
    Ok(())
}

#[test]
fn default_struct_validates() -> TestResult {
    DataDeliveryConfig::default().validate().map_err(|err| err.to_string())
}

#[test]
fn sections_override_defaults_and_convert() -> TestResult {
    let config = config_from_toml(
        r#"
[negotiation]
default_maximum_latency_minutes = 720
prompt_title = "Bandwidth Exceeded"

[metadata]
facet_timeout_ms = 2500

[notifications]
log_sink = false
channel_capacity = 16
dispatcher = "audit-log"
"#,
    )
    .map_err(|err| err.to_string())?;

    let service = config.service_config();
    if service.default_maximum_latency != 720 || service.prompt_title != "Bandwidth Exceeded" {
        return Err("service config did not carry negotiation settings".to_string());
    }
    if service.overlap_title != "Subscription Overlap" {
        return Err("overlap title should keep its default".to_string());
    }
    if config.metadata_cache_config().facet_timeout != Duration::from_millis(2500) {
        return Err("metadata cache config did not carry facet timeout".to_string());
    }
    if config.notifications.log_sink || config.notifications.channel_capacity != 16 {
        return Err("notification settings not applied".to_string());
    }
    Ok(())
}

#[test]
fn zero_maximum_latency_is_rejected() -> TestResult {
    assert_invalid(
        config_from_toml("[negotiation]\ndefault_maximum_latency_minutes = 0\n"),
        "default_maximum_latency_minutes must be between",
    )
}

#[test]
fn blank_prompt_title_is_rejected() -> TestResult {
    assert_invalid(
        config_from_toml("[negotiation]\nprompt_title = \"  \"\n"),
        "negotiation.prompt_title must be non-empty",
    )
}

#[test]
fn facet_timeout_out_of_range_is_rejected() -> TestResult {
    assert_invalid(
        config_from_toml("[metadata]\nfacet_timeout_ms = 10\n"),
        "metadata.facet_timeout_ms must be between",
    )?;
    assert_invalid(
        config_from_toml("[metadata]\nfacet_timeout_ms = 900000\n"),
        "metadata.facet_timeout_ms must be between",
    )
}

#[test]
fn channel_capacity_zero_is_rejected() -> TestResult {
    assert_invalid(
        config_from_toml("[notifications]\nchannel_capacity = 0\n"),
        "notifications.channel_capacity must be between",
    )
}

#[test]
fn dispatcher_with_spaces_is_rejected() -> TestResult {
    assert_invalid(
        config_from_toml("[notifications]\ndispatcher = \"audit log\"\n"),
        "notifications.dispatcher must use",
    )
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    assert_invalid(config_from_toml("[negotiation\n"), "config parse error")
}

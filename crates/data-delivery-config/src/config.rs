// crates/data-delivery-config/src/config.rs
// ============================================================================
// Module: Data Delivery Configuration
// Description: Configuration loading and validation for Data Delivery.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: data-delivery-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and falls back to defaults; values that are
//! present are range-checked and invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use data_delivery_core::MINUTES_PER_DAY;
use data_delivery_core::MetadataCacheConfig;
use data_delivery_core::SubscriptionServiceConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "data-delivery.toml";
/// Environment variable overriding the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "DATA_DELIVERY_CONFIG";
/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of one path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Largest default maximum latency (one week, in minutes).
pub(crate) const MAX_DEFAULT_MAXIMUM_LATENCY_MINUTES: u32 = 7 * MINUTES_PER_DAY;
/// Maximum length of a prompt title.
pub(crate) const MAX_TITLE_LENGTH: usize = 128;
/// Default force-apply prompt title.
pub(crate) const DEFAULT_PROMPT_TITLE: &str = "Unable to Schedule";
/// Default overlap message title.
pub(crate) const DEFAULT_OVERLAP_TITLE: &str = "Subscription Overlap";
/// Default metadata facet timeout in milliseconds.
pub(crate) const DEFAULT_FACET_TIMEOUT_MS: u64 = 30_000;
/// Minimum metadata facet timeout in milliseconds.
pub(crate) const MIN_FACET_TIMEOUT_MS: u64 = 100;
/// Maximum metadata facet timeout in milliseconds.
pub(crate) const MAX_FACET_TIMEOUT_MS: u64 = 300_000;
/// Default notification channel capacity.
pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 256;
/// Maximum notification channel capacity.
pub(crate) const MAX_CHANNEL_CAPACITY: usize = 65_536;
/// Default audit dispatcher name.
pub(crate) const DEFAULT_DISPATCHER: &str = "log";
/// Maximum dispatcher name length.
pub(crate) const MAX_DISPATCHER_LENGTH: usize = 64;

// ============================================================================
// SECTION: Data Delivery Config
// ============================================================================

/// Data Delivery configuration loaded from `data-delivery.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataDeliveryConfig {
    /// Schedule negotiation configuration.
    #[serde(default)]
    pub negotiation: NegotiationConfig,
    /// Metadata cache configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Notification fan-out configuration.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl DataDeliveryConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.negotiation.validate()?;
        self.metadata.validate()?;
        self.notifications.validate()?;
        Ok(())
    }

    /// Returns the subscription service configuration.
    #[must_use]
    pub fn service_config(&self) -> SubscriptionServiceConfig {
        SubscriptionServiceConfig {
            prompt_title: self.negotiation.prompt_title.clone(),
            overlap_title: self.negotiation.overlap_title.clone(),
            default_maximum_latency: self.negotiation.default_maximum_latency_minutes,
        }
    }

    /// Returns the metadata cache configuration.
    #[must_use]
    pub const fn metadata_cache_config(&self) -> MetadataCacheConfig {
        MetadataCacheConfig {
            facet_timeout: Duration::from_millis(self.metadata.facet_timeout_ms),
        }
    }
}

// ============================================================================
// SECTION: Negotiation
// ============================================================================

/// Schedule negotiation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NegotiationConfig {
    /// Maximum latency (minutes) offered for subscriptions without cycle gaps.
    #[serde(default = "default_maximum_latency_minutes")]
    pub default_maximum_latency_minutes: u32,
    /// Title of the force-apply prompt.
    #[serde(default = "default_prompt_title")]
    pub prompt_title: String,
    /// Title of the overlap advisory.
    #[serde(default = "default_overlap_title")]
    pub overlap_title: String,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            default_maximum_latency_minutes: default_maximum_latency_minutes(),
            prompt_title: default_prompt_title(),
            overlap_title: default_overlap_title(),
        }
    }
}

impl NegotiationConfig {
    /// Validates negotiation settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_maximum_latency_minutes == 0
            || self.default_maximum_latency_minutes > MAX_DEFAULT_MAXIMUM_LATENCY_MINUTES
        {
            return Err(ConfigError::Invalid(format!(
                "negotiation.default_maximum_latency_minutes must be between 1 and \
                 {MAX_DEFAULT_MAXIMUM_LATENCY_MINUTES}",
            )));
        }
        validate_title("negotiation.prompt_title", &self.prompt_title)?;
        validate_title("negotiation.overlap_title", &self.overlap_title)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Metadata cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Time a refresh waits for its facet queries, in milliseconds.
    #[serde(default = "default_facet_timeout_ms")]
    pub facet_timeout_ms: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            facet_timeout_ms: default_facet_timeout_ms(),
        }
    }
}

impl MetadataConfig {
    /// Validates metadata settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.facet_timeout_ms < MIN_FACET_TIMEOUT_MS
            || self.facet_timeout_ms > MAX_FACET_TIMEOUT_MS
        {
            return Err(ConfigError::Invalid(format!(
                "metadata.facet_timeout_ms must be between {MIN_FACET_TIMEOUT_MS} and \
                 {MAX_FACET_TIMEOUT_MS}",
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Notifications
// ============================================================================

/// Notification fan-out configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Write notification audit records as JSON lines.
    #[serde(default = "default_log_sink")]
    pub log_sink: bool,
    /// Capacity of the in-process notification channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Dispatcher name stamped on audit records.
    #[serde(default = "default_dispatcher")]
    pub dispatcher: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            log_sink: default_log_sink(),
            channel_capacity: default_channel_capacity(),
            dispatcher: default_dispatcher(),
        }
    }
}

impl NotificationsConfig {
    /// Validates notification settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "notifications.channel_capacity must be between 1 and {MAX_CHANNEL_CAPACITY}",
            )));
        }
        let dispatcher = self.dispatcher.trim();
        if dispatcher.is_empty() {
            return Err(ConfigError::Invalid(
                "notifications.dispatcher must be non-empty".to_string(),
            ));
        }
        if dispatcher.len() > MAX_DISPATCHER_LENGTH {
            return Err(ConfigError::Invalid(
                "notifications.dispatcher exceeds max length".to_string(),
            ));
        }
        if !dispatcher.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_') {
            return Err(ConfigError::Invalid(
                "notifications.dispatcher must use ascii letters, digits, '-' or '_'".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a user-visible title.
fn validate_title(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_TITLE_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Default maximum latency in minutes.
pub(crate) const fn default_maximum_latency_minutes() -> u32 {
    MINUTES_PER_DAY
}

/// Default force-apply prompt title.
pub(crate) fn default_prompt_title() -> String {
    DEFAULT_PROMPT_TITLE.to_string()
}

/// Default overlap advisory title.
pub(crate) fn default_overlap_title() -> String {
    DEFAULT_OVERLAP_TITLE.to_string()
}

/// Default metadata facet timeout in milliseconds.
pub(crate) const fn default_facet_timeout_ms() -> u64 {
    DEFAULT_FACET_TIMEOUT_MS
}

/// Default log sink toggle.
pub(crate) const fn default_log_sink() -> bool {
    true
}

/// Default notification channel capacity.
pub(crate) const fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

/// Default audit dispatcher name.
pub(crate) fn default_dispatcher() -> String {
    DEFAULT_DISPATCHER.to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

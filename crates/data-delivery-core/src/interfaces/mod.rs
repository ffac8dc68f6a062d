// crates/data-delivery-core/src/interfaces/mod.rs
// ============================================================================
// Module: Data Delivery Interfaces
// Description: Backend-agnostic interfaces for the registry, bandwidth manager,
//              overlap detection, notifications, user prompts, and metadata.
// Purpose: Define the contract surfaces consumed by the Data Delivery runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The runtime never talks to a remote system directly. Every collaborator is a
//! trait here so hosts can plug in their transport and tests can plug in fakes.
//! All calls are synchronous and may block; hosts run the runtime on a worker
//! thread rather than on a UI thread.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::DataSetName;
use crate::core::DataType;
use crate::core::Envelope;
use crate::core::ForceApplyPromptConfiguration;
use crate::core::ForceApplyPromptResponse;
use crate::core::LevelName;
use crate::core::OverlapReport;
use crate::core::ParameterName;
use crate::core::PromptOption;
use crate::core::ProposeScheduleResponse;
use crate::core::ProviderName;
use crate::core::Subscription;
use crate::core::SubscriptionName;
use crate::core::SubscriptionNotification;
use crate::core::SubscriptionStatusSummary;
use crate::core::UserId;
use crate::core::standard_option_display_text;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Remote registry failure. Every registry problem surfaces as this single kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Registry handler reported an error.
    #[error("registry handler error: {0}")]
    Handler(String),
}

/// Subscription CRUD against the remote registry.
pub trait RegistryGateway {
    /// Stores a new subscription.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the registry rejects or fails the write.
    fn store(&self, user: &UserId, subscription: &Subscription) -> Result<(), RegistryError>;

    /// Updates an existing subscription.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the registry rejects or fails the write.
    fn update(&self, user: &UserId, subscription: &Subscription) -> Result<(), RegistryError>;

    /// Updates several subscriptions.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when any write fails.
    fn update_all(&self, user: &UserId, subscriptions: &[Subscription])
    -> Result<(), RegistryError>;

    /// Removes subscriptions from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when removal fails.
    fn delete(&self, user: &UserId, subscriptions: &[Subscription]) -> Result<(), RegistryError>;

    /// Loads a subscription by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the lookup fails.
    fn get_by_name(&self, name: &SubscriptionName) -> Result<Option<Subscription>, RegistryError>;
}

/// Detects subscriptions that duplicate or overlap a candidate batch.
pub trait OverlapDetector {
    /// Classifies how the candidates relate to existing active subscriptions.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the request/response round trip fails.
    fn check_overlap(&self, subscriptions: &[Subscription]) -> Result<OverlapReport, RegistryError>;
}

// ============================================================================
// SECTION: Bandwidth Manager
// ============================================================================

/// Bandwidth manager failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BandwidthError {
    /// Bandwidth service reported an error.
    #[error("bandwidth service error: {0}")]
    Service(String),
}

/// Remote scheduler that decides which subscriptions fit the available bandwidth.
pub trait BandwidthService {
    /// Asks what would not fit if the subscriptions were applied as given.
    ///
    /// # Errors
    ///
    /// Returns [`BandwidthError`] when the proposal cannot be evaluated.
    fn propose_schedule(
        &self,
        subscriptions: &[Subscription],
    ) -> Result<ProposeScheduleResponse, BandwidthError>;

    /// Schedules the subscriptions and returns the names left unscheduled.
    ///
    /// # Errors
    ///
    /// Returns [`BandwidthError`] when scheduling fails.
    fn schedule(
        &self,
        subscriptions: &[Subscription],
    ) -> Result<BTreeSet<SubscriptionName>, BandwidthError>;

    /// Discards the scheduler's in-memory model and rebuilds it from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`BandwidthError`] when the rebuild fails.
    fn reinitialize(&self) -> Result<(), BandwidthError>;

    /// Returns scheduling status for a subscription.
    ///
    /// # Errors
    ///
    /// Returns [`BandwidthError`] when the status cannot be read.
    fn subscription_status_summary(
        &self,
        subscription: &Subscription,
    ) -> Result<SubscriptionStatusSummary, BandwidthError>;

    /// Returns the estimated completion time (unix millis) of an adhoc query.
    ///
    /// # Errors
    ///
    /// Returns [`BandwidthError`] when the estimate cannot be computed.
    fn estimated_completion_time(
        &self,
        subscription: &Subscription,
    ) -> Result<Option<i64>, BandwidthError>;
}

// ============================================================================
// SECTION: Notifications
// ============================================================================

/// Notification delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// Notification could not be sent.
    #[error("notification send failed: {0}")]
    SendFailed(String),
}

/// Fire-and-forget emitter of subscription lifecycle events.
pub trait NotificationSender {
    /// Sends a notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when delivery fails; callers log and continue.
    fn send(&self, notification: &SubscriptionNotification) -> Result<(), NotificationError>;
}

// ============================================================================
// SECTION: Force Apply Prompt
// ============================================================================

/// User-decision boundary.
///
/// Implementations block until the user answers and marshal onto their UI thread
/// themselves when the host toolkit requires it.
pub trait ForceApplyPrompt {
    /// Returns the text for an option, or `None` to withhold the option.
    fn option_display_text(
        &self,
        option: ForceApplyPromptResponse,
        required_latency: u32,
        subscription: Option<&Subscription>,
        would_be_unscheduled: &BTreeSet<SubscriptionName>,
    ) -> Option<String> {
        standard_option_display_text(option, required_latency, subscription, would_be_unscheduled)
    }

    /// Shows the force-apply prompt and returns the chosen option.
    ///
    /// The answer must be one of `options`. Any other answer is still applied;
    /// the negotiator logs it and records a warning.
    fn display_force_apply_prompt(
        &self,
        configuration: &ForceApplyPromptConfiguration,
        options: &[PromptOption],
    ) -> ForceApplyPromptResponse;

    /// Shows an advisory message and returns once it has been displayed.
    fn display_message(&self, title: &str, message: &str);

    /// Opens the subscription manager filtered to the given subscriptions.
    fn open_subscription_manager(&self, names: &BTreeSet<SubscriptionName>);
}

// ============================================================================
// SECTION: Metadata Source
// ============================================================================

/// Metadata query failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// Metadata handler reported an error.
    #[error("metadata query failed: {0}")]
    Query(String),
}

/// Remote catalog of providers, data sets, parameters, and levels.
///
/// Each query is filtered to a data type and, when present, an area of interest.
pub trait MetadataSource: Send + Sync {
    /// Lists providers serving the data type.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] when the query fails.
    fn providers(
        &self,
        data_type: &DataType,
        area: Option<&Envelope>,
    ) -> Result<Vec<ProviderName>, MetadataError>;

    /// Lists data set names.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] when the query fails.
    fn data_sets(
        &self,
        data_type: &DataType,
        area: Option<&Envelope>,
    ) -> Result<Vec<DataSetName>, MetadataError>;

    /// Lists parameter names.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] when the query fails.
    fn parameters(
        &self,
        data_type: &DataType,
        area: Option<&Envelope>,
    ) -> Result<Vec<ParameterName>, MetadataError>;

    /// Lists level names.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] when the query fails.
    fn levels(
        &self,
        data_type: &DataType,
        area: Option<&Envelope>,
    ) -> Result<Vec<LevelName>, MetadataError>;
}

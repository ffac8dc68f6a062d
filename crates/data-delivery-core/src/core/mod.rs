// crates/data-delivery-core/src/core/mod.rs
// ============================================================================
// Module: Data Delivery Core Types
// Description: Canonical subscription, negotiation, and notification structures.
// Purpose: Provide stable, serializable types shared by the runtime and its hosts.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types model subscriptions and the values exchanged while negotiating their
//! schedule. They carry no behavior that touches remote systems.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod negotiation;
pub mod notification;
pub mod subscription;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::DataSetName;
pub use identifiers::DataType;
pub use identifiers::LevelName;
pub use identifiers::OfficeId;
pub use identifiers::ParameterName;
pub use identifiers::ProviderName;
pub use identifiers::SubscriptionName;
pub use identifiers::UserId;
pub use negotiation::ForceApplyPromptConfiguration;
pub use negotiation::ForceApplyPromptResponse;
pub use negotiation::NegotiationOutcome;
pub use negotiation::NegotiationRecord;
pub use negotiation::NegotiationStep;
pub use negotiation::OverlapKind;
pub use negotiation::OverlapReport;
pub use negotiation::PromptOption;
pub use negotiation::ProposeScheduleResponse;
pub use negotiation::SubscriptionChange;
pub use negotiation::SubscriptionServiceResult;
pub use negotiation::SubscriptionStatusSummary;
pub use negotiation::standard_option_display_text;
pub use notification::NotificationKind;
pub use notification::SubscriptionNotification;
pub use subscription::Envelope;
pub use subscription::MINUTES_PER_DAY;
pub use subscription::Period;
pub use subscription::Priority;
pub use subscription::Subscription;
pub use subscription::SubscriptionError;
pub use subscription::SubscriptionKind;
pub use subscription::SubscriptionState;
pub use subscription::TimeSpec;

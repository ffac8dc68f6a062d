// crates/data-delivery-core/src/core/negotiation.rs
// ============================================================================
// Module: Data Delivery Negotiation Values
// Description: Value objects exchanged while negotiating a subscription schedule.
// Purpose: Carry proposals, prompt parameters, user decisions, and outcomes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A schedule negotiation proposes a subscription change to the bandwidth manager,
//! asks the user how to resolve any subscriptions that would no longer fit, and
//! reports the outcome. The types here are plain data; the state machine that
//! drives them lives in [`crate::runtime::negotiator`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SubscriptionName;
use crate::core::subscription::Subscription;

// ============================================================================
// SECTION: Proposal
// ============================================================================

/// Bandwidth manager answer to "what breaks if these changes are applied?".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeScheduleResponse {
    /// Subscriptions that would become unschedulable.
    pub unscheduled_subscriptions: BTreeSet<SubscriptionName>,
    /// Latency in minutes the subject subscription would need to fit.
    pub required_latency: u32,
    /// Largest data set size (kB) that would still fit, or zero when not size limited.
    pub required_data_set_size: u64,
}

impl ProposeScheduleResponse {
    /// Returns a response with nothing unschedulable.
    #[must_use]
    pub fn fits() -> Self {
        Self::default()
    }

    /// Returns true when at least one subscription would be unschedulable.
    #[must_use]
    pub fn has_unscheduled(&self) -> bool {
        !self.unscheduled_subscriptions.is_empty()
    }
}

// ============================================================================
// SECTION: Overlap
// ============================================================================

/// How a candidate subscription relates to subscriptions already in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapKind {
    /// No other active subscription covers the request.
    None,
    /// Other active subscriptions cover part of the request.
    Partial,
    /// Another active subscription already covers the whole request.
    Duplicate,
}

/// Result of an overlap check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapReport {
    /// Overlap classification.
    pub kind: OverlapKind,
    /// Names of the overlapping (or duplicating) subscriptions.
    pub subscription_names: BTreeSet<SubscriptionName>,
}

impl OverlapReport {
    /// Returns a report with no overlap.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: OverlapKind::None,
            subscription_names: BTreeSet::new(),
        }
    }
}

// ============================================================================
// SECTION: Force Apply Prompt
// ============================================================================

/// Resolution strategies offered when a change would leave subscriptions unscheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceApplyPromptResponse {
    /// Abandon the change.
    Cancel,
    /// Raise the subject subscription's latency to the required value.
    IncreaseLatency,
    /// Abandon the change and open the affected subscriptions for editing.
    EditSubscriptions,
    /// Apply the change, leaving the subscriptions unscheduled and turned off.
    ForceApplyDeactivated,
    /// Apply the change, leaving the subscriptions unscheduled.
    ForceApplyUnscheduled,
}

impl ForceApplyPromptResponse {
    /// All responses in presentation order.
    pub const ALL: [Self; 5] = [
        Self::Cancel,
        Self::IncreaseLatency,
        Self::EditSubscriptions,
        Self::ForceApplyDeactivated,
        Self::ForceApplyUnscheduled,
    ];

    /// Returns a stable label for logs and records.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::IncreaseLatency => "increase_latency",
            Self::EditSubscriptions => "edit_subscriptions",
            Self::ForceApplyDeactivated => "force_apply_deactivated",
            Self::ForceApplyUnscheduled => "force_apply_unscheduled",
        }
    }
}

impl fmt::Display for ForceApplyPromptResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Option offered to the user, paired with the text shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOption {
    /// Response returned when the option is chosen.
    pub response: ForceApplyPromptResponse,
    /// Display text.
    pub text: String,
}

/// Immutable snapshot handed to the force-apply prompt.
///
/// # Invariants
/// - Numeric limits are present only when a single subscription is under discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceApplyPromptConfiguration {
    /// Prompt title.
    pub title: String,
    /// Prompt body.
    pub message: String,
    /// Latency the subject subscription needs, in minutes.
    pub required_latency: Option<u32>,
    /// Largest latency the subject subscription tolerates, in minutes.
    pub maximum_latency: Option<u32>,
    /// Largest data set size (kB) that would fit.
    pub maximum_allowed_size: Option<u64>,
    /// Subscription under discussion; absent for batch operations.
    pub subscription: Option<Subscription>,
    /// Subscriptions that would be unscheduled.
    pub would_be_unscheduled: BTreeSet<SubscriptionName>,
}

impl ForceApplyPromptConfiguration {
    /// Builds the single-subscription variant.
    #[must_use]
    pub fn single(
        title: impl Into<String>,
        message: impl Into<String>,
        required_latency: u32,
        maximum_latency: u32,
        maximum_allowed_size: u64,
        subscription: Subscription,
        would_be_unscheduled: BTreeSet<SubscriptionName>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            required_latency: Some(required_latency),
            maximum_latency: Some(maximum_latency),
            maximum_allowed_size: Some(maximum_allowed_size),
            subscription: Some(subscription),
            would_be_unscheduled,
        }
    }

    /// Builds the multi-subscription variant.
    #[must_use]
    pub fn batch(
        title: impl Into<String>,
        message: impl Into<String>,
        would_be_unscheduled: BTreeSet<SubscriptionName>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            required_latency: None,
            maximum_latency: None,
            maximum_allowed_size: None,
            subscription: None,
            would_be_unscheduled,
        }
    }

    /// Returns true when the only unschedulable subscription is the one under discussion.
    #[must_use]
    pub fn is_not_able_to_schedule_only_the_subscription(&self) -> bool {
        only_subject_unscheduled(self.subscription.as_ref(), &self.would_be_unscheduled)
    }
}

/// Returns true when `unscheduled` holds exactly the subject subscription.
fn only_subject_unscheduled(
    subscription: Option<&Subscription>,
    unscheduled: &BTreeSet<SubscriptionName>,
) -> bool {
    subscription.is_some_and(|subject| {
        unscheduled.len() == 1 && unscheduled.contains(&subject.name)
    })
}

/// Standard wording for each resolution option.
///
/// Returns `None` when the option must not be offered. A latency change is only
/// offered when the subject is the sole unschedulable subscription and the
/// required latency is above its current latency. Forcing or editing is
/// meaningless when the only unschedulable subscription is the subject itself.
#[must_use]
pub fn standard_option_display_text(
    option: ForceApplyPromptResponse,
    required_latency: u32,
    subscription: Option<&Subscription>,
    would_be_unscheduled: &BTreeSet<SubscriptionName>,
) -> Option<String> {
    let only_subject = only_subject_unscheduled(subscription, would_be_unscheduled);
    let noun = if would_be_unscheduled.len() == 1 { "subscription" } else { "subscriptions" };
    match option {
        ForceApplyPromptResponse::Cancel => Some("Cancel the change".to_string()),
        ForceApplyPromptResponse::IncreaseLatency => subscription
            .filter(|subject| only_subject && required_latency > subject.latency_in_minutes)
            .map(|subject| {
                format!("Increase the latency on {} to {required_latency} minutes", subject.name)
            }),
        ForceApplyPromptResponse::EditSubscriptions if !only_subject => {
            Some(format!("Edit the unscheduled {noun}"))
        }
        ForceApplyPromptResponse::ForceApplyDeactivated if !only_subject => {
            Some(format!("Apply the change and deactivate the unscheduled {noun}"))
        }
        ForceApplyPromptResponse::ForceApplyUnscheduled if !only_subject => {
            Some(format!("Apply the change and leave the {noun} unscheduled"))
        }
        ForceApplyPromptResponse::EditSubscriptions
        | ForceApplyPromptResponse::ForceApplyDeactivated
        | ForceApplyPromptResponse::ForceApplyUnscheduled => None,
    }
}

// ============================================================================
// SECTION: Service Results
// ============================================================================

/// Bandwidth manager status for a stored subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatusSummary {
    /// Start of the scheduled retrieval window (unix millis).
    pub start_millis: Option<i64>,
    /// End of the scheduled retrieval window (unix millis).
    pub end_millis: Option<i64>,
    /// Latency granted, in minutes.
    pub latency_minutes: u32,
    /// Expected data size in kB.
    pub data_size_kb: u64,
    /// Estimated completion time for adhoc queries (unix millis).
    pub estimated_completion_millis: Option<i64>,
}

/// Outcome returned to the caller of a subscription service operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionServiceResult {
    /// User-facing message.
    pub message: Option<String>,
    /// True when the caller should keep the editor open instead of closing it.
    pub allow_further_editing: bool,
    /// Optional bandwidth status for the subject subscription.
    pub status_summary: Option<SubscriptionStatusSummary>,
}

impl SubscriptionServiceResult {
    /// Successful completion with a message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            allow_further_editing: false,
            status_summary: None,
        }
    }

    /// Rejection the user can correct by editing further.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            allow_further_editing: true,
            status_summary: None,
        }
    }

    /// Silent abort that keeps the editor open (cancel / edit).
    #[must_use]
    pub const fn abort_editing() -> Self {
        Self {
            message: None,
            allow_further_editing: true,
            status_summary: None,
        }
    }

    /// Silent failure after a remote read error.
    #[must_use]
    pub const fn failure() -> Self {
        Self {
            message: None,
            allow_further_editing: false,
            status_summary: None,
        }
    }

    /// Attaches a status summary.
    #[must_use]
    pub fn with_status_summary(mut self, summary: SubscriptionStatusSummary) -> Self {
        self.status_summary = Some(summary);
        self
    }
}

// ============================================================================
// SECTION: Negotiation Record
// ============================================================================

/// Transition taken by the negotiation state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum NegotiationStep {
    /// Input was rejected before any remote call.
    Rejected,
    /// Overlap check completed.
    OverlapChecked {
        /// Overlap classification.
        kind: OverlapKind,
    },
    /// Bandwidth manager answered a proposal.
    Proposed {
        /// Number of subscriptions that would be unscheduled.
        unscheduled: usize,
    },
    /// User chose a resolution.
    Prompted {
        /// Chosen response.
        response: ForceApplyPromptResponse,
    },
    /// Mutation callable completed.
    ActionExecuted,
    /// Authoritative schedule completed.
    Scheduled {
        /// Number of subscriptions left unscheduled.
        unscheduled: usize,
    },
    /// Bandwidth manager model was reinitialized after a failure.
    Reinitialized,
    /// Negotiation stopped without mutating anything.
    Aborted,
}

/// Change applied to the working copy of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum SubscriptionChange {
    /// Stale `unscheduled` flag cleared before proposing.
    ClearedUnscheduled {
        /// Subscription name.
        name: SubscriptionName,
    },
    /// Latency raised to the required value.
    LatencyChanged {
        /// Subscription name.
        name: SubscriptionName,
        /// Previous latency in minutes.
        from: u32,
        /// New latency in minutes.
        to: u32,
    },
    /// Subscription turned on.
    Activated {
        /// Subscription name.
        name: SubscriptionName,
    },
    /// Subscription flagged as unscheduled.
    MarkedUnscheduled {
        /// Subscription name.
        name: SubscriptionName,
    },
    /// Subscription turned off.
    Deactivated {
        /// Subscription name.
        name: SubscriptionName,
    },
}

impl SubscriptionChange {
    /// Returns the subscription the change applies to.
    #[must_use]
    pub const fn name(&self) -> &SubscriptionName {
        match self {
            Self::ClearedUnscheduled {
                name,
            }
            | Self::LatencyChanged {
                name,
                ..
            }
            | Self::Activated {
                name,
            }
            | Self::MarkedUnscheduled {
                name,
            }
            | Self::Deactivated {
                name,
            } => name,
        }
    }

    /// Applies the change to a subscription with a matching name.
    pub fn apply(&self, subscription: &mut Subscription) {
        if subscription.name != *self.name() {
            return;
        }
        match self {
            Self::ClearedUnscheduled {
                ..
            } => subscription.unscheduled = false,
            Self::LatencyChanged {
                to,
                ..
            } => subscription.latency_in_minutes = *to,
            Self::Activated {
                ..
            } => subscription.activate(),
            Self::MarkedUnscheduled {
                ..
            } => subscription.unscheduled = true,
            Self::Deactivated {
                ..
            } => subscription.deactivate(),
        }
    }
}

/// Audit trail of a single negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationRecord {
    /// Transitions in order.
    pub steps: Vec<NegotiationStep>,
    /// Changes applied to the working copy, in order.
    pub changes: Vec<SubscriptionChange>,
    /// Tolerated anomalies.
    pub warnings: Vec<String>,
    /// Subscriptions the authoritative schedule left unscheduled.
    pub unscheduled_after_schedule: BTreeSet<SubscriptionName>,
}

impl NegotiationRecord {
    /// Returns true when the mutation callable ran.
    #[must_use]
    pub fn action_executed(&self) -> bool {
        self.steps.contains(&NegotiationStep::ActionExecuted)
    }

    /// Returns true when the user was prompted.
    #[must_use]
    pub fn prompted(&self) -> bool {
        self.steps.iter().any(|step| matches!(step, NegotiationStep::Prompted { .. }))
    }

    /// Returns the response chosen by the user, if prompted.
    #[must_use]
    pub fn response(&self) -> Option<ForceApplyPromptResponse> {
        self.steps.iter().find_map(|step| match step {
            NegotiationStep::Prompted {
                response,
            } => Some(*response),
            _ => None,
        })
    }
}

/// Result, final subscription states, and audit trail of a negotiation.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiationOutcome {
    /// Caller-facing result.
    pub result: SubscriptionServiceResult,
    /// Subscriptions as handed to the mutation callable (or as submitted when aborted).
    pub subscriptions: Vec<Subscription>,
    /// Audit trail.
    pub record: NegotiationRecord,
}

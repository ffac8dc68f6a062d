// crates/data-delivery-core/src/runtime/resolution.rs
// ============================================================================
// Module: Data Delivery Force-Apply Resolution
// Description: Pure mapping from a user's force-apply decision to a mutation plan.
// Purpose: Keep decision semantics free of prompt and registry I/O.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`resolve`] turns a [`ForceApplyPromptResponse`] into either an abort or a
//! [`MutationPlan`]. The negotiator applies the plan to its working copy in one
//! step before the mutation callable runs, so no partially mutated batch is ever
//! handed to the registry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::core::ForceApplyPromptConfiguration;
use crate::core::ForceApplyPromptResponse;
use crate::core::PromptOption;
use crate::core::ProposeScheduleResponse;
use crate::core::Subscription;
use crate::core::SubscriptionChange;
use crate::core::SubscriptionName;
use crate::interfaces::ForceApplyPrompt;

// ============================================================================
// SECTION: Resolution Types
// ============================================================================

/// Subscription changes to apply before running the mutation callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationPlan {
    /// Changes in application order.
    pub changes: Vec<SubscriptionChange>,
    /// Tolerated anomalies to log and record.
    pub warnings: Vec<String>,
}

impl MutationPlan {
    /// Applies every change to the batch.
    pub fn apply(&self, subscriptions: &mut [Subscription]) {
        for change in &self.changes {
            for subscription in subscriptions.iter_mut() {
                change.apply(subscription);
            }
        }
    }

    /// Returns the latency change, if the plan raises one.
    #[must_use]
    pub fn latency_change(&self) -> Option<(&SubscriptionName, u32, u32)> {
        self.changes.iter().find_map(|change| match change {
            SubscriptionChange::LatencyChanged {
                name,
                from,
                to,
            } => Some((name, *from, *to)),
            _ => None,
        })
    }
}

/// Next state of the negotiation after the user decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Stop without mutating; optionally open the subscription manager.
    Abort {
        /// Subscriptions to open for editing.
        open_manager_for: Option<BTreeSet<SubscriptionName>>,
    },
    /// Apply the plan, run the mutation, then schedule authoritatively.
    Apply(MutationPlan),
}

/// Inputs the resolution depends on.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Batch under negotiation.
    pub subscriptions: &'a [Subscription],
    /// Bandwidth manager proposal.
    pub proposal: &'a ProposeScheduleResponse,
    /// Prompt configuration shown to the user.
    pub configuration: &'a ForceApplyPromptConfiguration,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Maps a user decision onto the next negotiation state.
#[must_use]
pub fn resolve(response: ForceApplyPromptResponse, context: &ResolutionContext<'_>) -> Resolution {
    match response {
        ForceApplyPromptResponse::Cancel => Resolution::Abort {
            open_manager_for: None,
        },
        ForceApplyPromptResponse::EditSubscriptions => {
            let configuration = context.configuration;
            let open_manager_for = if configuration.is_not_able_to_schedule_only_the_subscription()
            {
                None
            } else {
                Some(configuration.would_be_unscheduled.clone())
            };
            Resolution::Abort {
                open_manager_for,
            }
        }
        ForceApplyPromptResponse::IncreaseLatency => increase_latency_plan(context),
        ForceApplyPromptResponse::ForceApplyUnscheduled => {
            let changes = context
                .subscriptions
                .iter()
                .map(|subscription| SubscriptionChange::MarkedUnscheduled {
                    name: subscription.name.clone(),
                })
                .collect();
            Resolution::Apply(MutationPlan {
                changes,
                warnings: Vec::new(),
            })
        }
        ForceApplyPromptResponse::ForceApplyDeactivated => {
            let changes = context
                .subscriptions
                .iter()
                .flat_map(|subscription| {
                    [
                        SubscriptionChange::MarkedUnscheduled {
                            name: subscription.name.clone(),
                        },
                        SubscriptionChange::Deactivated {
                            name: subscription.name.clone(),
                        },
                    ]
                })
                .collect();
            Resolution::Apply(MutationPlan {
                changes,
                warnings: Vec::new(),
            })
        }
    }
}

/// Builds the plan for raising the first subscription's latency.
///
/// Only the first subscription is ever changed. A batch reaching this path is
/// tolerated with a warning. A required latency at or below the current one
/// cannot be an increase and aborts like a cancel.
fn increase_latency_plan(context: &ResolutionContext<'_>) -> Resolution {
    let Some(first) = context.subscriptions.first() else {
        return Resolution::Apply(MutationPlan::default());
    };
    let required =
        context.configuration.required_latency.unwrap_or(context.proposal.required_latency);
    if required <= first.latency_in_minutes {
        return Resolution::Abort {
            open_manager_for: None,
        };
    }
    let mut plan = MutationPlan::default();
    if context.subscriptions.len() > 1 {
        plan.warnings.push(format!(
            "latency increase chosen for a batch of {} subscriptions; only the first is changed",
            context.subscriptions.len()
        ));
    }
    plan.changes.push(SubscriptionChange::LatencyChanged {
        name: first.name.clone(),
        from: first.latency_in_minutes,
        to: required,
    });
    plan.changes.push(SubscriptionChange::Activated {
        name: first.name.clone(),
    });
    Resolution::Apply(plan)
}

// ============================================================================
// SECTION: Prompt Construction
// ============================================================================

/// Builds the prompt configuration for a proposal that leaves subscriptions unscheduled.
#[must_use]
pub fn prompt_configuration(
    title: &str,
    subscriptions: &[Subscription],
    proposal: &ProposeScheduleResponse,
    default_maximum_latency: u32,
) -> ForceApplyPromptConfiguration {
    let unscheduled = proposal.unscheduled_subscriptions.clone();
    match subscriptions {
        [subject] => {
            let message = single_message(subject, proposal);
            ForceApplyPromptConfiguration::single(
                title,
                message,
                proposal.required_latency,
                subject.maximum_latency(default_maximum_latency),
                proposal.required_data_set_size,
                subject.clone(),
                unscheduled,
            )
        }
        _ => ForceApplyPromptConfiguration::batch(title, batch_message(&unscheduled), unscheduled),
    }
}

/// Builds the options to offer, always including cancel.
#[must_use]
pub fn offered_options(
    prompt: &dyn ForceApplyPrompt,
    configuration: &ForceApplyPromptConfiguration,
    proposal: &ProposeScheduleResponse,
) -> Vec<PromptOption> {
    let required_latency = configuration.required_latency.unwrap_or(proposal.required_latency);
    ForceApplyPromptResponse::ALL
        .iter()
        .filter_map(|option| {
            let text = prompt.option_display_text(
                *option,
                required_latency,
                configuration.subscription.as_ref(),
                &configuration.would_be_unscheduled,
            );
            match (option, text) {
                (_, Some(text)) => Some(PromptOption {
                    response: *option,
                    text,
                }),
                (ForceApplyPromptResponse::Cancel, None) => Some(PromptOption {
                    response: ForceApplyPromptResponse::Cancel,
                    text: "Cancel".to_string(),
                }),
                (_, None) => None,
            }
        })
        .collect()
}

/// Prompt body when a single subscription is under discussion.
fn single_message(subject: &Subscription, proposal: &ProposeScheduleResponse) -> String {
    let unscheduled = &proposal.unscheduled_subscriptions;
    if unscheduled.len() == 1 && unscheduled.contains(&subject.name) {
        let mut message = format!(
            "Subscription {} cannot be fully scheduled with a latency of {} minutes.",
            subject.name, subject.latency_in_minutes
        );
        if proposal.required_latency > 0 {
            let _ = write!(
                message,
                " A latency of {} minutes is required.",
                proposal.required_latency
            );
        }
        if proposal.required_data_set_size > 0 {
            let _ = write!(
                message,
                " The data set must be reduced to {} kB or less.",
                proposal.required_data_set_size
            );
        }
        return message;
    }
    format!(
        "Applying subscription {} would leave other subscriptions unscheduled.\n{}",
        subject.name,
        batch_message(unscheduled)
    )
}

/// Prompt body listing every subscription that would be unscheduled.
fn batch_message(unscheduled: &BTreeSet<SubscriptionName>) -> String {
    let mut message = String::from("The following subscriptions would not be fully scheduled:");
    for name in unscheduled {
        let _ = write!(message, "\n  {name}");
    }
    message
}

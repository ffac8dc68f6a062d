// crates/data-delivery-core/src/runtime/negotiator.rs
// ============================================================================
// Module: Data Delivery Subscription Service
// Description: Schedule negotiation between subscription edits, the bandwidth
//              manager, the registry, and the user.
// Purpose: Apply subscription changes without leaving the scheduler and the
//          registry inconsistent.
// Dependencies: crate::{core, interfaces, runtime::resolution}, time, tracing
// ============================================================================

//! ## Overview
//! [`SubscriptionService`] is the single execution path for subscription
//! mutations. Every create/update/activate request is negotiated the same way:
//!
//! 1. reject empty input,
//! 2. check active subscriptions for duplicates and overlaps,
//! 3. propose the change to the bandwidth manager,
//! 4. when something would not fit, ask the user how to resolve it,
//! 5. after a forced change is stored, schedule authoritatively and flag what
//!    is still unscheduled.
//!
//! Ordering invariant: the registry mutation never runs before the proposal
//! completes, and the authoritative schedule never runs before the mutation is
//! stored. Any registry failure in the mutation reinitializes the bandwidth
//! manager, whose model may hold the speculative proposal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt::Write as _;

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::MINUTES_PER_DAY;
use crate::core::NegotiationOutcome;
use crate::core::NegotiationRecord;
use crate::core::NegotiationStep;
use crate::core::NotificationKind;
use crate::core::OverlapKind;
use crate::core::Subscription;
use crate::core::SubscriptionChange;
use crate::core::SubscriptionName;
use crate::core::SubscriptionNotification;
use crate::core::SubscriptionServiceResult;
use crate::core::SubscriptionStatusSummary;
use crate::core::UserId;
use crate::interfaces::BandwidthService;
use crate::interfaces::ForceApplyPrompt;
use crate::interfaces::NotificationSender;
use crate::interfaces::OverlapDetector;
use crate::interfaces::RegistryError;
use crate::interfaces::RegistryGateway;
use crate::runtime::resolution::Resolution;
use crate::runtime::resolution::ResolutionContext;
use crate::runtime::resolution::offered_options;
use crate::runtime::resolution::prompt_configuration;
use crate::runtime::resolution::resolve;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message returned when an operation receives no subscriptions.
pub const NO_SUBSCRIPTIONS_MESSAGE: &str = "No subscriptions submitted";
/// Appended when the authoritative schedule could not be confirmed.
const SCHEDULE_UNCONFIRMED_MESSAGE: &str =
    "The change was stored, but the resulting schedule could not be confirmed.";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the subscription service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionServiceConfig {
    /// Title of the force-apply prompt.
    pub prompt_title: String,
    /// Title of the advisory overlap message.
    pub overlap_title: String,
    /// Maximum latency (minutes) for subscriptions without a cycle-derived limit.
    pub default_maximum_latency: u32,
}

impl Default for SubscriptionServiceConfig {
    fn default() -> Self {
        Self {
            prompt_title: "Unable to Schedule".to_string(),
            overlap_title: "Subscription Overlap".to_string(),
            default_maximum_latency: MINUTES_PER_DAY,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures that escape a negotiation.
///
/// Everything else is reported through [`SubscriptionServiceResult`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Registry failed while applying the mutation.
    #[error("subscription registry failure: {0}")]
    Registry(#[from] RegistryError),
}

// ============================================================================
// SECTION: Subscription Service
// ============================================================================

/// Negotiates subscription changes with the bandwidth manager and the user.
pub struct SubscriptionService<R, B, O, N> {
    /// Subscription registry.
    registry: R,
    /// Bandwidth manager.
    bandwidth: B,
    /// Duplicate/overlap detector.
    overlap: O,
    /// Notification sender.
    notifier: N,
    /// Service configuration.
    config: SubscriptionServiceConfig,
}

impl<R, B, O, N> SubscriptionService<R, B, O, N>
where
    R: RegistryGateway,
    B: BandwidthService,
    O: OverlapDetector,
    N: NotificationSender,
{
    /// Creates a subscription service.
    pub const fn new(
        registry: R,
        bandwidth: B,
        overlap: O,
        notifier: N,
        config: SubscriptionServiceConfig,
    ) -> Self {
        Self {
            registry,
            bandwidth,
            overlap,
            notifier,
            config,
        }
    }

    /// Returns the registry.
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    /// Returns the bandwidth manager.
    pub const fn bandwidth(&self) -> &B {
        &self.bandwidth
    }

    /// Returns the overlap detector.
    pub const fn overlap(&self) -> &O {
        &self.overlap
    }

    /// Returns the notification sender.
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Returns the service configuration.
    pub const fn config(&self) -> &SubscriptionServiceConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Creates a new recurring subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Registry`] when storing the subscription fails.
    pub fn store(
        &self,
        user: &UserId,
        subscription: Subscription,
        prompt: &dyn ForceApplyPrompt,
    ) -> Result<NegotiationOutcome, ServiceError> {
        let subscriptions = vec![subscription];
        if let Some(outcome) = self.precheck_new(&subscriptions) {
            return Ok(outcome);
        }
        let name = subscriptions[0].name.clone();
        let mut outcome = self.perform_action(user, subscriptions, prompt, |batch| {
            for subscription in batch {
                self.registry.store(user, subscription)?;
            }
            Ok(format!("Subscription {name} has been created."))
        })?;
        if outcome.record.action_executed() {
            self.notify_all(user, NotificationKind::Created, &outcome.subscriptions);
            if let Some(summary) = outcome.subscriptions.first().and_then(|s| self.status_summary(s))
            {
                outcome.result = outcome.result.with_status_summary(summary);
            }
        }
        Ok(outcome)
    }

    /// Stores a one-shot (adhoc) query.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Registry`] when storing the query fails.
    pub fn store_adhoc(
        &self,
        user: &UserId,
        subscription: Subscription,
        prompt: &dyn ForceApplyPrompt,
    ) -> Result<NegotiationOutcome, ServiceError> {
        let subscriptions = vec![subscription.into_adhoc()];
        if let Some(outcome) = self.precheck_new(&subscriptions) {
            return Ok(outcome);
        }
        let name = subscriptions[0].name.clone();
        let mut outcome = self.perform_action(user, subscriptions, prompt, |batch| {
            for subscription in batch {
                self.registry.store(user, subscription)?;
            }
            Ok(format!("The query {name} was successfully stored."))
        })?;
        if !outcome.record.action_executed() {
            return Ok(outcome);
        }
        self.notify_all(user, NotificationKind::Created, &outcome.subscriptions);
        let Some(query) = outcome.subscriptions.first() else {
            return Ok(outcome);
        };
        let mut summary = self.status_summary(query).unwrap_or_default();
        match self.bandwidth.estimated_completion_time(query) {
            Ok(Some(millis)) => {
                summary.estimated_completion_millis = Some(millis);
                if let Some(message) = outcome.result.message.as_mut() {
                    let _ = write!(message, "\nEstimated completion time: {}", format_millis(millis));
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(subscription = %query.name, error = %err, "estimated completion unavailable");
            }
        }
        outcome.result = outcome.result.with_status_summary(summary);
        Ok(outcome)
    }

    /// Updates a single subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Registry`] when the update fails.
    pub fn update(
        &self,
        user: &UserId,
        subscription: Subscription,
        prompt: &dyn ForceApplyPrompt,
    ) -> Result<NegotiationOutcome, ServiceError> {
        self.update_all(user, vec![subscription], prompt)
    }

    /// Updates a batch of subscriptions.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Registry`] when the update fails.
    pub fn update_all(
        &self,
        user: &UserId,
        subscriptions: Vec<Subscription>,
        prompt: &dyn ForceApplyPrompt,
    ) -> Result<NegotiationOutcome, ServiceError> {
        if let Some(outcome) = Self::precheck_valid(&subscriptions) {
            return Ok(outcome);
        }
        let outcome = self.perform_action(user, subscriptions, prompt, |batch| {
            self.registry.update_all(user, batch)?;
            Ok(completion_message(batch, "updated"))
        })?;
        if outcome.record.action_executed() {
            self.notify_all(user, NotificationKind::Updated, &outcome.subscriptions);
        }
        Ok(outcome)
    }

    /// Turns subscriptions on.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Registry`] when the update fails.
    pub fn activate(
        &self,
        user: &UserId,
        mut subscriptions: Vec<Subscription>,
        prompt: &dyn ForceApplyPrompt,
    ) -> Result<NegotiationOutcome, ServiceError> {
        if let Some(outcome) = Self::precheck_valid(&subscriptions) {
            return Ok(outcome);
        }
        for subscription in &mut subscriptions {
            subscription.activate();
        }
        let outcome = self.perform_action(user, subscriptions, prompt, |batch| {
            self.registry.update_all(user, batch)?;
            Ok(completion_message(batch, "activated"))
        })?;
        if outcome.record.action_executed() {
            for subscription in &outcome.subscriptions {
                let kind = if subscription.is_active() {
                    NotificationKind::Activated
                } else {
                    NotificationKind::Deactivated
                };
                self.notify(&SubscriptionNotification::new(kind, user, &subscription.name));
            }
        }
        Ok(outcome)
    }

    /// Turns subscriptions off. Removing load cannot unschedule anything, so
    /// nothing is proposed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Registry`] when the update fails.
    pub fn deactivate(
        &self,
        user: &UserId,
        mut subscriptions: Vec<Subscription>,
    ) -> Result<NegotiationOutcome, ServiceError> {
        if subscriptions.is_empty() {
            return Ok(no_subscriptions_outcome(subscriptions));
        }
        let mut record = NegotiationRecord::default();
        for subscription in &mut subscriptions {
            subscription.deactivate();
            record.changes.push(SubscriptionChange::Deactivated {
                name: subscription.name.clone(),
            });
        }
        self.registry.update_all(user, &subscriptions)?;
        record.steps.push(NegotiationStep::ActionExecuted);
        self.notify_all(user, NotificationKind::Deactivated, &subscriptions);
        Ok(NegotiationOutcome {
            result: SubscriptionServiceResult::success(completion_message(
                &subscriptions,
                "deactivated",
            )),
            subscriptions,
            record,
        })
    }

    /// Soft-deletes subscriptions and removes them from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Registry`] when removal fails.
    pub fn delete(
        &self,
        user: &UserId,
        mut subscriptions: Vec<Subscription>,
    ) -> Result<NegotiationOutcome, ServiceError> {
        if subscriptions.is_empty() {
            return Ok(no_subscriptions_outcome(subscriptions));
        }
        for subscription in &mut subscriptions {
            subscription.mark_deleted();
        }
        self.registry.delete(user, &subscriptions)?;
        let mut record = NegotiationRecord::default();
        record.steps.push(NegotiationStep::ActionExecuted);
        self.notify_all(user, NotificationKind::Deleted, &subscriptions);
        Ok(NegotiationOutcome {
            result: SubscriptionServiceResult::success(completion_message(
                &subscriptions,
                "deleted",
            )),
            subscriptions,
            record,
        })
    }

    // ------------------------------------------------------------------------
    // Negotiation
    // ------------------------------------------------------------------------

    /// Negotiates a change and runs `action` to persist it.
    ///
    /// `action` receives the batch after any user-chosen resolution has been
    /// applied and returns the success message.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Registry`] when `action` fails. The bandwidth
    /// manager is reinitialized first.
    pub fn perform_action<A>(
        &self,
        user: &UserId,
        subscriptions: Vec<Subscription>,
        prompt: &dyn ForceApplyPrompt,
        action: A,
    ) -> Result<NegotiationOutcome, ServiceError>
    where
        A: FnOnce(&[Subscription]) -> Result<String, RegistryError>,
    {
        if subscriptions.is_empty() {
            return Ok(no_subscriptions_outcome(subscriptions));
        }
        let mut record = NegotiationRecord::default();
        let mut working = subscriptions;
        for subscription in &mut working {
            if subscription.unscheduled {
                let change = SubscriptionChange::ClearedUnscheduled {
                    name: subscription.name.clone(),
                };
                change.apply(subscription);
                record.changes.push(change);
            }
        }

        let active: Vec<Subscription> =
            working.iter().filter(|subscription| subscription.is_active()).cloned().collect();
        if !active.is_empty() {
            let report = match self.overlap.check_overlap(&active) {
                Ok(report) => report,
                Err(err) => {
                    warn!(error = %err, "overlap check failed");
                    self.reinitialize(&mut record);
                    record.steps.push(NegotiationStep::Aborted);
                    return Ok(finish(SubscriptionServiceResult::failure(), working, record));
                }
            };
            record.steps.push(NegotiationStep::OverlapChecked {
                kind: report.kind,
            });
            match report.kind {
                OverlapKind::Duplicate => {
                    record.steps.push(NegotiationStep::Aborted);
                    let message = format!(
                        "This subscription is completely fulfilled by {}",
                        join_names(&report.subscription_names)
                    );
                    return Ok(finish(SubscriptionServiceResult::rejected(message), working, record));
                }
                OverlapKind::Partial => {
                    prompt.display_message(
                        &self.config.overlap_title,
                        &overlap_message(&report.subscription_names),
                    );
                }
                OverlapKind::None => {}
            }
        }

        let proposal = match self.bandwidth.propose_schedule(&working) {
            Ok(proposal) => proposal,
            Err(err) => {
                warn!(error = %err, "schedule proposal failed");
                self.reinitialize(&mut record);
                record.steps.push(NegotiationStep::Aborted);
                return Ok(finish(SubscriptionServiceResult::failure(), working, record));
            }
        };
        record.steps.push(NegotiationStep::Proposed {
            unscheduled: proposal.unscheduled_subscriptions.len(),
        });

        if !proposal.has_unscheduled() {
            let message = self.execute(action, &working, &mut record)?;
            info!(subscriptions = working.len(), "subscription change scheduled");
            return Ok(finish(SubscriptionServiceResult::success(message), working, record));
        }

        let configuration = prompt_configuration(
            &self.config.prompt_title,
            &working,
            &proposal,
            self.config.default_maximum_latency,
        );
        let options = offered_options(prompt, &configuration, &proposal);
        let response = prompt.display_force_apply_prompt(&configuration, &options);
        debug!(response = %response, "force-apply decision");
        record.steps.push(NegotiationStep::Prompted {
            response,
        });
        if !options.iter().any(|option| option.response == response) {
            warn!(response = %response, "prompt answered with an option that was not offered");
            record.warnings.push(format!("response {response} was not offered"));
        }

        let context = ResolutionContext {
            subscriptions: &working,
            proposal: &proposal,
            configuration: &configuration,
        };
        match resolve(response, &context) {
            Resolution::Abort {
                open_manager_for,
            } => {
                if let Some(names) = open_manager_for {
                    prompt.open_subscription_manager(&names);
                }
                record.steps.push(NegotiationStep::Aborted);
                Ok(finish(SubscriptionServiceResult::abort_editing(), working, record))
            }
            Resolution::Apply(plan) => {
                for warning in &plan.warnings {
                    warn!(response = %response, "{warning}");
                }
                plan.apply(&mut working);
                record.changes.extend(plan.changes.iter().cloned());
                record.warnings.extend(plan.warnings.iter().cloned());
                if let Some((name, from, to)) = plan.latency_change() {
                    self.notify(&SubscriptionNotification::latency_changed(user, name, from, to));
                }
                let message = self.execute(action, &working, &mut record)?;
                let message = self.finalize_force_apply(user, &working, message, &mut record);
                Ok(finish(SubscriptionServiceResult::success(message), working, record))
            }
        }
    }

    /// Runs the mutation callable, reinitializing the scheduler on failure.
    fn execute<A>(
        &self,
        action: A,
        working: &[Subscription],
        record: &mut NegotiationRecord,
    ) -> Result<String, ServiceError>
    where
        A: FnOnce(&[Subscription]) -> Result<String, RegistryError>,
    {
        match action(working) {
            Ok(message) => {
                record.steps.push(NegotiationStep::ActionExecuted);
                Ok(message)
            }
            Err(err) => {
                warn!(error = %err, "subscription mutation failed");
                self.reinitialize(record);
                Err(ServiceError::Registry(err))
            }
        }
    }

    /// Schedules a forced change authoritatively and flags what did not fit.
    fn finalize_force_apply(
        &self,
        user: &UserId,
        working: &[Subscription],
        message: String,
        record: &mut NegotiationRecord,
    ) -> String {
        let unscheduled = match self.bandwidth.schedule(working) {
            Ok(unscheduled) => unscheduled,
            Err(err) => {
                warn!(error = %err, "authoritative schedule failed");
                record.warnings.push(format!("schedule not confirmed: {err}"));
                self.reinitialize(record);
                return format!("{message}\n\n{SCHEDULE_UNCONFIRMED_MESSAGE}");
            }
        };
        record.steps.push(NegotiationStep::Scheduled {
            unscheduled: unscheduled.len(),
        });
        for name in &unscheduled {
            self.mark_persisted_unscheduled(user, name, record);
            self.notify(&SubscriptionNotification::new(NotificationKind::Unscheduled, user, name));
        }
        let mut composed = message;
        if !unscheduled.is_empty() {
            composed.push_str("\n\nThe following subscriptions are not fully scheduled:");
            for name in &unscheduled {
                let _ = write!(composed, "\n  {name}");
            }
        }
        record.unscheduled_after_schedule = unscheduled;
        composed
    }

    /// Flags a persisted subscription as unscheduled. Failures are logged only.
    fn mark_persisted_unscheduled(
        &self,
        user: &UserId,
        name: &SubscriptionName,
        record: &mut NegotiationRecord,
    ) {
        let persisted = match self.registry.get_by_name(name) {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                warn!(subscription = %name, "unscheduled subscription not found in registry");
                record.warnings.push(format!("subscription {name} not found in registry"));
                return;
            }
            Err(err) => {
                warn!(subscription = %name, error = %err, "unable to load unscheduled subscription");
                record.warnings.push(format!("unable to load subscription {name}: {err}"));
                return;
            }
        };
        let mut persisted = persisted;
        persisted.unscheduled = true;
        if let Err(err) = self.registry.update(user, &persisted) {
            warn!(subscription = %name, error = %err, "unable to flag subscription unscheduled");
            record.warnings.push(format!("unable to flag subscription {name} unscheduled: {err}"));
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Validation and duplicate-name checks for new subscriptions.
    fn precheck_new(&self, subscriptions: &[Subscription]) -> Option<NegotiationOutcome> {
        if let Some(outcome) = Self::precheck_valid(subscriptions) {
            return Some(outcome);
        }
        for subscription in subscriptions {
            match self.registry.get_by_name(&subscription.name) {
                Ok(None) => {}
                Ok(Some(_)) => {
                    return Some(rejected_outcome(
                        subscriptions,
                        format!("A subscription named {} already exists.", subscription.name),
                    ));
                }
                Err(err) => {
                    warn!(subscription = %subscription.name, error = %err, "name lookup failed");
                    let mut record = NegotiationRecord::default();
                    self.reinitialize(&mut record);
                    record.steps.push(NegotiationStep::Aborted);
                    return Some(finish(
                        SubscriptionServiceResult::failure(),
                        subscriptions.to_vec(),
                        record,
                    ));
                }
            }
        }
        None
    }

    /// Field validation shared by every mutating operation.
    fn precheck_valid(subscriptions: &[Subscription]) -> Option<NegotiationOutcome> {
        subscriptions.iter().find_map(|subscription| {
            subscription.validate().err().map(|err| {
                rejected_outcome(
                    subscriptions,
                    format!("Subscription {} is invalid: {err}", subscription.name),
                )
            })
        })
    }

    /// Reinitializes the bandwidth manager's model.
    fn reinitialize(&self, record: &mut NegotiationRecord) {
        record.steps.push(NegotiationStep::Reinitialized);
        if let Err(err) = self.bandwidth.reinitialize() {
            warn!(error = %err, "bandwidth manager reinitialize failed");
            record.warnings.push(format!("reinitialize failed: {err}"));
        }
    }

    /// Reads the bandwidth status for a subscription, tolerating failure.
    fn status_summary(&self, subscription: &Subscription) -> Option<SubscriptionStatusSummary> {
        match self.bandwidth.subscription_status_summary(subscription) {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(subscription = %subscription.name, error = %err, "status summary unavailable");
                None
            }
        }
    }

    /// Sends one notification per subscription.
    fn notify_all(&self, user: &UserId, kind: NotificationKind, subscriptions: &[Subscription]) {
        for subscription in subscriptions {
            self.notify(&SubscriptionNotification::new(kind, user, &subscription.name));
        }
    }

    /// Sends a notification; failures are logged only.
    fn notify(&self, notification: &SubscriptionNotification) {
        if let Err(err) = self.notifier.send(notification) {
            warn!(
                kind = %notification.kind,
                subscription = %notification.subscription_name,
                error = %err,
                "notification not sent"
            );
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Packages a result with the batch and record.
const fn finish(
    result: SubscriptionServiceResult,
    subscriptions: Vec<Subscription>,
    record: NegotiationRecord,
) -> NegotiationOutcome {
    NegotiationOutcome {
        result,
        subscriptions,
        record,
    }
}

/// Outcome for an empty batch.
fn no_subscriptions_outcome(subscriptions: Vec<Subscription>) -> NegotiationOutcome {
    let mut record = NegotiationRecord::default();
    record.steps.push(NegotiationStep::Rejected);
    finish(
        SubscriptionServiceResult {
            message: Some(NO_SUBSCRIPTIONS_MESSAGE.to_string()),
            allow_further_editing: false,
            status_summary: None,
        },
        subscriptions,
        record,
    )
}

/// Outcome for input rejected before any remote call.
fn rejected_outcome(subscriptions: &[Subscription], message: String) -> NegotiationOutcome {
    let mut record = NegotiationRecord::default();
    record.steps.push(NegotiationStep::Rejected);
    finish(SubscriptionServiceResult::rejected(message), subscriptions.to_vec(), record)
}

/// Success message naming one subscription or counting several.
fn completion_message(subscriptions: &[Subscription], verb: &str) -> String {
    match subscriptions {
        [single] => format!("Subscription {} has been {verb}.", single.name),
        _ => format!("{} subscriptions have been {verb}.", subscriptions.len()),
    }
}

/// Advisory message listing overlapping subscriptions.
fn overlap_message(names: &BTreeSet<SubscriptionName>) -> String {
    format!(
        "The subscription overlaps with the following subscriptions: {}. \
         The overlapping data will be retrieved more than once.",
        join_names(names)
    )
}

/// Joins subscription names with commas.
fn join_names(names: &BTreeSet<SubscriptionName>) -> String {
    names.iter().map(SubscriptionName::as_str).collect::<Vec<_>>().join(", ")
}

/// Formats unix millis as RFC 3339, falling back to the raw value.
fn format_millis(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|instant| instant.format(&Rfc3339).ok())
        .unwrap_or_else(|| format!("{millis} ms since epoch"))
}

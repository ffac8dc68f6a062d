// crates/data-delivery-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Helpers
// Description: Recording fakes for every Data Delivery boundary.
// Purpose: Let negotiation tests assert exactly which remote calls happened.
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Mutex;

use data_delivery_core::BandwidthError;
use data_delivery_core::BandwidthService;
use data_delivery_core::Envelope;
use data_delivery_core::ForceApplyPrompt;
use data_delivery_core::ForceApplyPromptConfiguration;
use data_delivery_core::ForceApplyPromptResponse;
use data_delivery_core::InMemoryRegistry;
use data_delivery_core::NotificationError;
use data_delivery_core::NotificationSender;
use data_delivery_core::OverlapDetector;
use data_delivery_core::OverlapReport;
use data_delivery_core::PromptOption;
use data_delivery_core::ProposeScheduleResponse;
use data_delivery_core::RegistryError;
use data_delivery_core::RegistryGateway;
use data_delivery_core::Subscription;
use data_delivery_core::SubscriptionName;
use data_delivery_core::SubscriptionNotification;
use data_delivery_core::SubscriptionService;
use data_delivery_core::SubscriptionServiceConfig;
use data_delivery_core::SubscriptionStatusSummary;
use data_delivery_core::TimeSpec;
use data_delivery_core::UserId;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Returns the test user.
pub fn user() -> UserId {
    UserId::new("forecaster")
}

/// Returns a CONUS-sized envelope.
pub fn conus() -> Envelope {
    Envelope::new(-125.0, 24.0, -66.0, 50.0).unwrap()
}

/// Returns a recurring subscription with four synoptic cycles.
pub fn subscription(name: &str) -> Subscription {
    Subscription::new(
        name,
        "forecaster",
        "NOMADS",
        "gfs",
        "GRID",
        TimeSpec::Recurring {
            cycle_hours: [0, 6, 12, 18].into_iter().collect(),
            forecast_hours: [0, 3, 6].into_iter().collect(),
        },
        conus(),
    )
}

/// Returns a set of names.
pub fn names(values: &[&str]) -> BTreeSet<SubscriptionName> {
    values.iter().map(|value| SubscriptionName::new(*value)).collect()
}

/// Returns a proposal leaving the named subscriptions unscheduled.
pub fn proposal(unscheduled: &[&str], required_latency: u32) -> ProposeScheduleResponse {
    ProposeScheduleResponse {
        unscheduled_subscriptions: names(unscheduled),
        required_latency,
        required_data_set_size: 0,
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registry that records writes and can be told to fail them.
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    /// Backing store.
    pub inner: InMemoryRegistry,
    /// Write calls as `operation:name`.
    pub writes: Mutex<Vec<String>>,
    /// When set, every write fails.
    pub fail_writes: bool,
    /// When set, lookups fail.
    pub fail_reads: bool,
}

impl RecordingRegistry {
    /// Wraps an existing registry.
    pub fn over(inner: InMemoryRegistry) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Returns the recorded writes.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    /// Records a write and applies the failure switch.
    fn record(&self, operation: &str, subscriptions: &[Subscription]) -> Result<(), RegistryError> {
        let mut writes = self.writes.lock().unwrap();
        for subscription in subscriptions {
            writes.push(format!("{operation}:{}", subscription.name));
        }
        if self.fail_writes {
            return Err(RegistryError::Handler("registry unavailable".to_string()));
        }
        Ok(())
    }
}

impl RegistryGateway for RecordingRegistry {
    fn store(&self, user: &UserId, subscription: &Subscription) -> Result<(), RegistryError> {
        self.record("store", std::slice::from_ref(subscription))?;
        self.inner.store(user, subscription)
    }

    fn update(&self, user: &UserId, subscription: &Subscription) -> Result<(), RegistryError> {
        self.record("update", std::slice::from_ref(subscription))?;
        self.inner.update(user, subscription)
    }

    fn update_all(
        &self,
        user: &UserId,
        subscriptions: &[Subscription],
    ) -> Result<(), RegistryError> {
        self.record("update_all", subscriptions)?;
        self.inner.update_all(user, subscriptions)
    }

    fn delete(&self, user: &UserId, subscriptions: &[Subscription]) -> Result<(), RegistryError> {
        self.record("delete", subscriptions)?;
        self.inner.delete(user, subscriptions)
    }

    fn get_by_name(&self, name: &SubscriptionName) -> Result<Option<Subscription>, RegistryError> {
        if self.fail_reads {
            return Err(RegistryError::Handler("registry unavailable".to_string()));
        }
        self.inner.get_by_name(name)
    }
}

// ============================================================================
// SECTION: Overlap
// ============================================================================

/// Overlap detector returning a fixed answer.
#[derive(Debug)]
pub struct FixedOverlap {
    /// Answer returned for every check.
    pub answer: Result<OverlapReport, RegistryError>,
    /// Number of checks.
    pub checks: Mutex<usize>,
}

impl FixedOverlap {
    /// Detector that never reports overlap.
    pub fn none() -> Self {
        Self::answering(Ok(OverlapReport::none()))
    }

    /// Detector returning the given answer.
    pub fn answering(answer: Result<OverlapReport, RegistryError>) -> Self {
        Self {
            answer,
            checks: Mutex::new(0),
        }
    }

    /// Returns the number of checks.
    pub fn checks(&self) -> usize {
        *self.checks.lock().unwrap()
    }
}

impl OverlapDetector for FixedOverlap {
    fn check_overlap(&self, _subscriptions: &[Subscription]) -> Result<OverlapReport, RegistryError> {
        *self.checks.lock().unwrap() += 1;
        self.answer.clone()
    }
}

// ============================================================================
// SECTION: Bandwidth
// ============================================================================

/// Bandwidth manager that replays scripted answers and records calls.
#[derive(Debug, Default)]
pub struct RecordingBandwidth {
    /// Proposals returned in order; an empty queue means everything fits.
    pub proposals: Mutex<VecDeque<Result<ProposeScheduleResponse, BandwidthError>>>,
    /// Answer of the authoritative schedule.
    pub schedule_result: Mutex<Option<Result<BTreeSet<SubscriptionName>, BandwidthError>>>,
    /// Estimated completion time for adhoc queries.
    pub estimate: Option<i64>,
    /// Batches proposed.
    pub proposed: Mutex<Vec<Vec<Subscription>>>,
    /// Batches scheduled.
    pub scheduled: Mutex<Vec<Vec<Subscription>>>,
    /// Number of reinitialize calls.
    pub reinitialized: Mutex<usize>,
}

impl RecordingBandwidth {
    /// Bandwidth manager whose first proposal is `answer`.
    pub fn proposing(answer: ProposeScheduleResponse) -> Self {
        let bandwidth = Self::default();
        bandwidth.proposals.lock().unwrap().push_back(Ok(answer));
        bandwidth
    }

    /// Bandwidth manager whose first proposal fails.
    pub fn failing_proposal() -> Self {
        let bandwidth = Self::default();
        bandwidth
            .proposals
            .lock()
            .unwrap()
            .push_back(Err(BandwidthError::Service("scheduler offline".to_string())));
        bandwidth
    }

    /// Sets the authoritative schedule answer.
    pub fn with_schedule(self, result: Result<BTreeSet<SubscriptionName>, BandwidthError>) -> Self {
        *self.schedule_result.lock().unwrap() = Some(result);
        self
    }

    /// Returns the number of proposals.
    pub fn proposed_count(&self) -> usize {
        self.proposed.lock().unwrap().len()
    }

    /// Returns the scheduled batches.
    pub fn scheduled(&self) -> Vec<Vec<Subscription>> {
        self.scheduled.lock().unwrap().clone()
    }

    /// Returns the number of reinitialize calls.
    pub fn reinitialized(&self) -> usize {
        *self.reinitialized.lock().unwrap()
    }
}

impl BandwidthService for RecordingBandwidth {
    fn propose_schedule(
        &self,
        subscriptions: &[Subscription],
    ) -> Result<ProposeScheduleResponse, BandwidthError> {
        self.proposed.lock().unwrap().push(subscriptions.to_vec());
        self.proposals.lock().unwrap().pop_front().unwrap_or_else(|| Ok(ProposeScheduleResponse::fits()))
    }

    fn schedule(
        &self,
        subscriptions: &[Subscription],
    ) -> Result<BTreeSet<SubscriptionName>, BandwidthError> {
        self.scheduled.lock().unwrap().push(subscriptions.to_vec());
        self.schedule_result.lock().unwrap().clone().unwrap_or_else(|| Ok(BTreeSet::new()))
    }

    fn reinitialize(&self) -> Result<(), BandwidthError> {
        *self.reinitialized.lock().unwrap() += 1;
        Ok(())
    }

    fn subscription_status_summary(
        &self,
        subscription: &Subscription,
    ) -> Result<SubscriptionStatusSummary, BandwidthError> {
        Ok(SubscriptionStatusSummary {
            latency_minutes: subscription.latency_in_minutes,
            data_size_kb: 512,
            ..SubscriptionStatusSummary::default()
        })
    }

    fn estimated_completion_time(
        &self,
        _subscription: &Subscription,
    ) -> Result<Option<i64>, BandwidthError> {
        Ok(self.estimate)
    }
}

// ============================================================================
// SECTION: Prompt
// ============================================================================

/// Prompt that answers with a fixed response and records what it was shown.
#[derive(Debug)]
pub struct ScriptedPrompt {
    /// Response returned for every force-apply prompt.
    pub response: ForceApplyPromptResponse,
    /// Configurations shown.
    pub configurations: Mutex<Vec<ForceApplyPromptConfiguration>>,
    /// Options offered for each prompt.
    pub options: Mutex<Vec<Vec<PromptOption>>>,
    /// Advisory messages as `(title, message)`.
    pub messages: Mutex<Vec<(String, String)>>,
    /// Subscription manager openings.
    pub opened: Mutex<Vec<BTreeSet<SubscriptionName>>>,
}

impl ScriptedPrompt {
    /// Prompt answering with `response`.
    pub fn answering(response: ForceApplyPromptResponse) -> Self {
        Self {
            response,
            configurations: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of force-apply prompts shown.
    pub fn prompt_count(&self) -> usize {
        self.configurations.lock().unwrap().len()
    }

    /// Returns the last configuration shown.
    pub fn last_configuration(&self) -> Option<ForceApplyPromptConfiguration> {
        self.configurations.lock().unwrap().last().cloned()
    }

    /// Returns the responses offered in the last prompt.
    pub fn last_offered(&self) -> Vec<ForceApplyPromptResponse> {
        self.options
            .lock()
            .unwrap()
            .last()
            .map(|options| options.iter().map(|option| option.response).collect())
            .unwrap_or_default()
    }

    /// Returns the advisory messages shown.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }

    /// Returns the subscription manager openings.
    pub fn opened(&self) -> Vec<BTreeSet<SubscriptionName>> {
        self.opened.lock().unwrap().clone()
    }
}

impl ForceApplyPrompt for ScriptedPrompt {
    fn display_force_apply_prompt(
        &self,
        configuration: &ForceApplyPromptConfiguration,
        options: &[PromptOption],
    ) -> ForceApplyPromptResponse {
        self.configurations.lock().unwrap().push(configuration.clone());
        self.options.lock().unwrap().push(options.to_vec());
        self.response
    }

    fn display_message(&self, title: &str, message: &str) {
        self.messages.lock().unwrap().push((title.to_string(), message.to_string()));
    }

    fn open_subscription_manager(&self, names: &BTreeSet<SubscriptionName>) {
        self.opened.lock().unwrap().push(names.clone());
    }
}

// ============================================================================
// SECTION: Notifications
// ============================================================================

/// Notification sender that records every notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    /// Notifications sent.
    pub sent: Mutex<Vec<SubscriptionNotification>>,
    /// When set, every send fails after recording.
    pub fail: bool,
}

impl RecordingNotifier {
    /// Notifier whose sends fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Returns the notifications sent.
    pub fn sent(&self) -> Vec<SubscriptionNotification> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSender for RecordingNotifier {
    fn send(&self, notification: &SubscriptionNotification) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(NotificationError::SendFailed("bus offline".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Service wired with recording fakes.
pub type TestService =
    SubscriptionService<RecordingRegistry, RecordingBandwidth, FixedOverlap, RecordingNotifier>;

/// Builds a service over the given fakes with default configuration.
pub fn service(
    registry: RecordingRegistry,
    bandwidth: RecordingBandwidth,
    overlap: FixedOverlap,
) -> TestService {
    SubscriptionService::new(
        registry,
        bandwidth,
        overlap,
        RecordingNotifier::default(),
        SubscriptionServiceConfig::default(),
    )
}

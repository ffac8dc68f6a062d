// crates/data-delivery-core/src/core/subscription.rs
// ============================================================================
// Module: Data Delivery Subscriptions
// Description: Subscription records, coverage envelopes, and time specifications.
// Purpose: Provide the canonical, serializable subscription model shared by all surfaces.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Subscription`] names a recurring or one-shot (adhoc) request for a slice of a
//! provider's data set. Subscriptions are persisted in a remote registry and
//! scheduled by a remote bandwidth manager; this module only models them.
//!
//! Invariants:
//! - `unscheduled` is true only while the bandwidth manager cannot fit the subscription.
//! - `deleted` subscriptions are never re-proposed for scheduling.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::DataSetName;
use crate::core::identifiers::DataType;
use crate::core::identifiers::OfficeId;
use crate::core::identifiers::ProviderName;
use crate::core::identifiers::SubscriptionName;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of minutes in a day, used when cycle gaps wrap past midnight.
pub const MINUTES_PER_DAY: u32 = 24 * 60;
/// Number of model cycle hours in a day.
const HOURS_PER_DAY: u8 = 24;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation failures for subscription records.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// Subscription name is empty.
    #[error("subscription name must be non-empty")]
    EmptyName,
    /// Coverage envelope is invalid.
    #[error("invalid area: {0}")]
    InvalidArea(String),
    /// Time specification is invalid.
    #[error("invalid time specification: {0}")]
    InvalidTime(String),
    /// Active or subscription period is invalid.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    /// Priority label could not be parsed.
    #[error("invalid priority: {0}")]
    InvalidPriority(String),
}

// ============================================================================
// SECTION: Coverage
// ============================================================================

/// Axis-aligned spatial envelope in longitude/latitude degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Western bound.
    pub min_x: f64,
    /// Southern bound.
    pub min_y: f64,
    /// Eastern bound.
    pub max_x: f64,
    /// Northern bound.
    pub max_y: f64,
}

impl Envelope {
    /// Creates a validated envelope.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::InvalidArea`] when a bound is not finite or the
    /// envelope is inverted.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, SubscriptionError> {
        let envelope = Self {
            min_x,
            min_y,
            max_x,
            max_y,
        };
        envelope.validate()?;
        Ok(envelope)
    }

    /// Validates bounds for finiteness and ordering.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::InvalidArea`] when the envelope is unusable.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        let bounds = [self.min_x, self.min_y, self.max_x, self.max_y];
        if bounds.iter().any(|value| !value.is_finite()) {
            return Err(SubscriptionError::InvalidArea("bounds must be finite".to_string()));
        }
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(SubscriptionError::InvalidArea("envelope is inverted".to_string()));
        }
        Ok(())
    }

    /// Returns true when the two envelopes share any point (edges included).
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Returns true when `other` lies entirely within this envelope.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }
}

// ============================================================================
// SECTION: Time Specification
// ============================================================================

/// Inclusive time window in unix epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Window start.
    pub start_millis: i64,
    /// Window end.
    pub end_millis: i64,
}

impl Period {
    /// Validates that the window is not inverted.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::InvalidPeriod`] when `start_millis > end_millis`.
    pub fn validate(&self, field: &str) -> Result<(), SubscriptionError> {
        if self.start_millis > self.end_millis {
            return Err(SubscriptionError::InvalidPeriod(format!("{field} starts after it ends")));
        }
        Ok(())
    }
}

/// Which times of a data set a subscription requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeSpec {
    /// Model cycles and forecast hours retrieved every day.
    Recurring {
        /// Cycle hours (0-23).
        cycle_hours: BTreeSet<u8>,
        /// Forecast hours requested from each cycle.
        forecast_hours: BTreeSet<u16>,
    },
    /// Explicit observation range.
    Range(Period),
}

impl TimeSpec {
    /// Validates the time specification.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::InvalidTime`] when no cycles are requested or a
    /// cycle hour is out of range, or when the range is inverted.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        match self {
            Self::Recurring {
                cycle_hours,
                ..
            } => {
                if cycle_hours.is_empty() {
                    return Err(SubscriptionError::InvalidTime(
                        "at least one cycle hour is required".to_string(),
                    ));
                }
                if cycle_hours.iter().any(|hour| *hour >= HOURS_PER_DAY) {
                    return Err(SubscriptionError::InvalidTime(
                        "cycle hours must be between 0 and 23".to_string(),
                    ));
                }
                Ok(())
            }
            Self::Range(period) => period
                .validate("time range")
                .map_err(|_| SubscriptionError::InvalidTime("time range is inverted".to_string())),
        }
    }

    /// Returns true when every time requested by `other` is also requested here.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Recurring {
                    cycle_hours,
                    forecast_hours,
                },
                Self::Recurring {
                    cycle_hours: other_cycles,
                    forecast_hours: other_forecasts,
                },
            ) => cycle_hours.is_superset(other_cycles) && forecast_hours.is_superset(other_forecasts),
            (Self::Range(period), Self::Range(other_period)) => {
                period.start_millis <= other_period.start_millis
                    && period.end_millis >= other_period.end_millis
            }
            _ => false,
        }
    }
}

// ============================================================================
// SECTION: Priority / State / Kind
// ============================================================================

/// Scheduling priority; lower numbers are scheduled first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Scheduled ahead of all other subscriptions.
    High,
    /// Default priority.
    #[default]
    Normal,
    /// Scheduled only when bandwidth remains.
    Low,
}

impl Priority {
    /// Returns the numeric priority used by the bandwidth manager.
    #[must_use]
    pub const fn as_number(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Normal => 2,
            Self::Low => 3,
        }
    }

    /// Returns the priority for a numeric value.
    #[must_use]
    pub const fn from_number(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::High),
            2 => Some(Self::Normal),
            3 => Some(Self::Low),
            _ => None,
        }
    }

    /// Returns the display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Normal => "Normal",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = SubscriptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(number) = trimmed.parse::<u8>() {
            return Self::from_number(number)
                .ok_or_else(|| SubscriptionError::InvalidPriority(trimmed.to_string()));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            _ => Err(SubscriptionError::InvalidPriority(trimmed.to_string())),
        }
    }
}

/// Activation state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// Subscription is active and eligible for scheduling.
    On,
    /// Subscription is inactive.
    Off,
}

/// Whether a subscription recurs or is a one-shot query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    /// Retrieved every cycle while active.
    Recurring,
    /// One-shot (adhoc) query.
    Adhoc,
}

// ============================================================================
// SECTION: Subscription
// ============================================================================

/// Subscription request for a slice of a provider's data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique subscription name.
    pub name: SubscriptionName,
    /// Owning user.
    pub owner: UserId,
    /// Offices sharing the subscription.
    pub office_ids: BTreeSet<OfficeId>,
    /// Data provider.
    pub provider: ProviderName,
    /// Data set requested.
    pub data_set: DataSetName,
    /// Data type of the data set.
    pub data_type: DataType,
    /// Requested times.
    pub time: TimeSpec,
    /// Requested spatial coverage.
    pub coverage: Envelope,
    /// Scheduling priority.
    pub priority: Priority,
    /// Allowed retrieval latency in minutes.
    pub latency_in_minutes: u32,
    /// Optional window during which the subscription is active each year.
    pub active_period: Option<Period>,
    /// Optional overall lifetime of the subscription.
    pub subscription_period: Option<Period>,
    /// Activation state.
    pub state: SubscriptionState,
    /// True while the bandwidth manager cannot fit the subscription.
    pub unscheduled: bool,
    /// True once the subscription has been soft-deleted.
    pub deleted: bool,
    /// Recurring or adhoc.
    pub kind: SubscriptionKind,
}

impl Subscription {
    /// Creates an active, recurring, normal-priority subscription.
    #[must_use]
    pub fn new(
        name: impl Into<SubscriptionName>,
        owner: impl Into<UserId>,
        provider: impl Into<ProviderName>,
        data_set: impl Into<DataSetName>,
        data_type: impl Into<DataType>,
        time: TimeSpec,
        coverage: Envelope,
    ) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            office_ids: BTreeSet::new(),
            provider: provider.into(),
            data_set: data_set.into(),
            data_type: data_type.into(),
            time,
            coverage,
            priority: Priority::Normal,
            latency_in_minutes: 0,
            active_period: None,
            subscription_period: None,
            state: SubscriptionState::On,
            unscheduled: false,
            deleted: false,
            kind: SubscriptionKind::Recurring,
        }
    }

    /// Returns the subscription with a different priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the subscription with a different latency.
    #[must_use]
    pub const fn with_latency(mut self, latency_in_minutes: u32) -> Self {
        self.latency_in_minutes = latency_in_minutes;
        self
    }

    /// Returns the subscription as an adhoc query.
    #[must_use]
    pub const fn into_adhoc(mut self) -> Self {
        self.kind = SubscriptionKind::Adhoc;
        self
    }

    /// Turns the subscription on.
    pub const fn activate(&mut self) {
        self.state = SubscriptionState::On;
    }

    /// Turns the subscription off.
    pub const fn deactivate(&mut self) {
        self.state = SubscriptionState::Off;
    }

    /// Soft-deletes the subscription.
    pub const fn mark_deleted(&mut self) {
        self.deleted = true;
        self.state = SubscriptionState::Off;
    }

    /// Returns true when the subscription is on.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SubscriptionState::On
    }

    /// Returns true for one-shot queries.
    #[must_use]
    pub fn is_adhoc(&self) -> bool {
        self.kind == SubscriptionKind::Adhoc
    }

    /// Validates the subscription before any remote call is made.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        if self.name.as_str().trim().is_empty() {
            return Err(SubscriptionError::EmptyName);
        }
        self.coverage.validate()?;
        self.time.validate()?;
        if let Some(period) = &self.active_period {
            period.validate("active period")?;
        }
        if let Some(period) = &self.subscription_period {
            period.validate("subscription period")?;
        }
        Ok(())
    }

    /// Returns the largest latency the subscription can tolerate, in minutes.
    ///
    /// Recurring subscriptions with more than one cycle must finish retrieving a
    /// cycle before the next one starts, so the limit is the smallest gap between
    /// consecutive cycles. Everything else uses `default_minutes`.
    #[must_use]
    pub fn maximum_latency(&self, default_minutes: u32) -> u32 {
        let TimeSpec::Recurring {
            cycle_hours,
            ..
        } = &self.time
        else {
            return default_minutes;
        };
        let hours: Vec<u32> = cycle_hours
            .iter()
            .filter(|hour| **hour < HOURS_PER_DAY)
            .map(|hour| u32::from(*hour))
            .collect();
        let (Some(first), Some(last)) = (hours.first(), hours.last()) else {
            return default_minutes;
        };
        if hours.len() < 2 {
            return default_minutes;
        }
        let wrap_gap = first + u32::from(HOURS_PER_DAY) - last;
        let smallest = hours
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold(wrap_gap, u32::min);
        smallest * 60
    }
}

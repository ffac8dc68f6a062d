// crates/data-delivery-core/src/core/notification.rs
// ============================================================================
// Module: Data Delivery Notifications
// Description: Subscription lifecycle events shared with other workstations.
// Purpose: Describe what changed so other workstation instances can refresh.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Notifications are fire-and-forget. Sending them is never allowed to fail the
//! operation that produced them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SubscriptionName;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Notifications
// ============================================================================

/// Category of a subscription notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Subscription stored for the first time.
    Created,
    /// Subscription updated.
    Updated,
    /// Subscription turned on.
    Activated,
    /// Subscription turned off.
    Deactivated,
    /// Subscription removed.
    Deleted,
    /// Subscription could not be fully scheduled (or its latency was changed to fit).
    Unscheduled,
}

impl NotificationKind {
    /// Returns a stable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
            Self::Deleted => "deleted",
            Self::Unscheduled => "unscheduled",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Subscription lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionNotification {
    /// Event category.
    pub kind: NotificationKind,
    /// User whose action caused the event.
    pub user: UserId,
    /// Affected subscription.
    pub subscription_name: SubscriptionName,
    /// Human-readable description.
    pub message: String,
}

impl SubscriptionNotification {
    /// Creates a notification with the standard message for its kind.
    #[must_use]
    pub fn new(kind: NotificationKind, user: &UserId, subscription_name: &SubscriptionName) -> Self {
        let message = match kind {
            NotificationKind::Unscheduled => {
                format!("Subscription {subscription_name} is unscheduled.")
            }
            _ => format!("Subscription {subscription_name} {} by {user}.", kind.label()),
        };
        Self::with_message(kind, user, subscription_name, message)
    }

    /// Creates a notification with a custom message.
    #[must_use]
    pub fn with_message(
        kind: NotificationKind,
        user: &UserId,
        subscription_name: &SubscriptionName,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            user: user.clone(),
            subscription_name: subscription_name.clone(),
            message: message.into(),
        }
    }

    /// Documents a latency increase made to fit a subscription into the schedule.
    #[must_use]
    pub fn latency_changed(
        user: &UserId,
        subscription_name: &SubscriptionName,
        from: u32,
        to: u32,
    ) -> Self {
        Self::with_message(
            NotificationKind::Unscheduled,
            user,
            subscription_name,
            format!(
                "The latency of subscription {subscription_name} was changed from {from} to {to} \
                 minutes so that it can be scheduled."
            ),
        )
    }
}

// crates/data-delivery-broker/src/sink/mod.rs
// ============================================================================
// Module: Data Delivery Notification Sinks
// Description: Sink trait and reference implementations for notifications.
// Purpose: Deliver subscription lifecycle events to concrete targets.
// Dependencies: data-delivery-core, thiserror, std
// ============================================================================

//! ## Overview
//! Sinks deliver [`SubscriptionNotification`] values and return a
//! [`DeliveryReceipt`] for auditing.
//! Invariants:
//! - Receipts are returned only after successful delivery.
//! - Receipt sequence numbers are monotonic per sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use data_delivery_core::NotificationKind;
use data_delivery_core::SubscriptionName;
use data_delivery_core::SubscriptionNotification;
use thiserror::Error;

// ============================================================================
// SECTION: Sink Errors
// ============================================================================

/// Errors emitted by notification sinks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Sink delivery failed.
    #[error("sink delivery failed: {0}")]
    DeliveryFailed(String),
    /// Log sink failed to write.
    #[error("log write failed: {0}")]
    LogWriteFailed(String),
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Delivers subscription notifications to one target.
pub trait NotificationSink: Send + Sync {
    /// Delivers the notification.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when delivery fails.
    fn deliver(
        &self,
        notification: &SubscriptionNotification,
    ) -> Result<DeliveryReceipt, SinkError>;
}

// ============================================================================
// SECTION: Receipts
// ============================================================================

/// Record of one successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// `<dispatcher>-<sequence>` identifier.
    pub delivery_id: String,
    /// Dispatcher that produced the receipt.
    pub dispatcher: String,
    /// Per-sink sequence number, starting at 1.
    pub sequence: u64,
    /// Category of the delivered notification.
    pub kind: NotificationKind,
    /// Subscription the notification was about.
    pub subscription_name: SubscriptionName,
}

/// Notification message emitted by channel-based sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    /// Delivered notification.
    pub notification: SubscriptionNotification,
    /// Delivery receipt.
    pub receipt: DeliveryReceipt,
}

/// Builds sequential delivery receipts.
#[derive(Debug)]
pub(crate) struct ReceiptFactory {
    /// Dispatcher identifier embedded in receipts.
    dispatcher: String,
    /// Monotonic counter used for delivery IDs.
    counter: AtomicU64,
}

impl ReceiptFactory {
    /// Creates a receipt factory with the provided dispatcher name.
    pub(crate) fn new(dispatcher: impl Into<String>) -> Self {
        Self {
            dispatcher: dispatcher.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Returns the next receipt for the provided notification.
    pub(crate) fn next(&self, notification: &SubscriptionNotification) -> DeliveryReceipt {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        DeliveryReceipt {
            delivery_id: format!("{}-{sequence}", self.dispatcher),
            dispatcher: self.dispatcher.clone(),
            sequence,
            kind: notification.kind,
            subscription_name: notification.subscription_name.clone(),
        }
    }
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod callback;
pub mod channel;
pub mod log;

pub use callback::CallbackSink;
pub use channel::ChannelSink;
pub use log::LogSink;

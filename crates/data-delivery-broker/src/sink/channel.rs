// crates/data-delivery-broker/src/sink/channel.rs
// ============================================================================
// Module: Data Delivery Channel Sink
// Description: Channel-based sink for other workstation listeners.
// Purpose: Send notifications through a Tokio mpsc channel.
// Dependencies: data-delivery-core, tokio
// ============================================================================

//! ## Overview
//! [`ChannelSink`] delivers notifications by sending
//! [`crate::sink::NotificationMessage`] values into a `tokio::sync::mpsc`
//! channel. Delivery never blocks: a full or closed channel is a delivery
//! failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use data_delivery_core::SubscriptionNotification;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::Sender;

use crate::sink::DeliveryReceipt;
use crate::sink::NotificationMessage;
use crate::sink::NotificationSink;
use crate::sink::ReceiptFactory;
use crate::sink::SinkError;

// ============================================================================
// SECTION: Channel Sink
// ============================================================================

/// Default dispatcher name for channel sinks.
pub const CHANNEL_DISPATCHER: &str = "channel";

/// Channel-based notification sink.
#[derive(Debug)]
pub struct ChannelSink {
    /// Sender used to publish messages.
    sender: Sender<NotificationMessage>,
    /// Receipt factory for sequential delivery IDs.
    receipts: ReceiptFactory,
}

impl ChannelSink {
    /// Creates a channel sink with the default dispatcher name.
    #[must_use]
    pub fn new(sender: Sender<NotificationMessage>) -> Self {
        Self::with_dispatcher(sender, CHANNEL_DISPATCHER)
    }

    /// Creates a channel sink with a custom dispatcher name.
    #[must_use]
    pub fn with_dispatcher(
        sender: Sender<NotificationMessage>,
        dispatcher: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            receipts: ReceiptFactory::new(dispatcher),
        }
    }

    /// Creates a sink over a fresh bounded channel and returns its receiver.
    ///
    /// `capacity` is clamped to at least one.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<NotificationMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(
        &self,
        notification: &SubscriptionNotification,
    ) -> Result<DeliveryReceipt, SinkError> {
        let receipt = self.receipts.next(notification);
        let message = NotificationMessage {
            notification: notification.clone(),
            receipt: receipt.clone(),
        };
        self.sender.try_send(message).map_err(|err| SinkError::DeliveryFailed(err.to_string()))?;
        Ok(receipt)
    }
}

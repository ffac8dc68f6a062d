// crates/data-delivery-broker/src/sink/log.rs
// ============================================================================
// Module: Data Delivery Log Sink
// Description: JSON-lines audit trail of subscription notifications.
// Purpose: Keep a replayable record of who changed which subscription.
// Dependencies: data-delivery-core, serde, serde_json, std
// ============================================================================

//! ## Overview
//! `LogSink` appends one [`AuditRecord`] per notification as a single JSON line
//! and flushes after every record, so a crash loses at most the record being
//! written.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use data_delivery_core::NotificationKind;
use data_delivery_core::SubscriptionName;
use data_delivery_core::SubscriptionNotification;
use data_delivery_core::UserId;
use serde::Serialize;

use crate::sink::DeliveryReceipt;
use crate::sink::NotificationSink;
use crate::sink::ReceiptFactory;
use crate::sink::SinkError;

// ============================================================================
// SECTION: Audit Record
// ============================================================================

/// Default dispatcher name for log sinks.
pub const LOG_DISPATCHER: &str = "log";

/// One line of the audit trail.
#[derive(Debug, Serialize)]
pub struct AuditRecord<'a> {
    /// Receipt identifier.
    pub delivery_id: &'a str,
    /// Dispatcher that wrote the line.
    pub dispatcher: &'a str,
    /// Per-sink sequence number.
    pub sequence: u64,
    /// Notification category.
    pub kind: NotificationKind,
    /// User behind the change.
    pub user: &'a UserId,
    /// Affected subscription.
    pub subscription: &'a SubscriptionName,
    /// Notification text.
    pub message: &'a str,
}

impl<'a> AuditRecord<'a> {
    /// Pairs a notification with its receipt.
    #[must_use]
    pub fn new(notification: &'a SubscriptionNotification, receipt: &'a DeliveryReceipt) -> Self {
        Self {
            delivery_id: &receipt.delivery_id,
            dispatcher: &receipt.dispatcher,
            sequence: receipt.sequence,
            kind: notification.kind,
            user: &notification.user,
            subscription: &notification.subscription_name,
            message: &notification.message,
        }
    }
}

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// Audit-log notification sink.
pub struct LogSink<W: Write + Send> {
    /// Audit trail destination.
    writer: Mutex<W>,
    /// Receipt sequence.
    receipts: ReceiptFactory,
}

impl<W: Write + Send> LogSink<W> {
    /// Creates a log sink named [`LOG_DISPATCHER`].
    pub fn new(writer: W) -> Self {
        Self::with_dispatcher(writer, LOG_DISPATCHER)
    }

    /// Creates a log sink with a custom dispatcher name.
    pub fn with_dispatcher(writer: W, dispatcher: impl Into<String>) -> Self {
        Self {
            writer: Mutex::new(writer),
            receipts: ReceiptFactory::new(dispatcher),
        }
    }

    /// Serializes the record into one newline-terminated buffer.
    fn encode(record: &AuditRecord<'_>) -> Result<Vec<u8>, SinkError> {
        let mut line =
            serde_json::to_vec(record).map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        line.push(b'\n');
        Ok(line)
    }
}

impl<W: Write + Send> NotificationSink for LogSink<W> {
    fn deliver(
        &self,
        notification: &SubscriptionNotification,
    ) -> Result<DeliveryReceipt, SinkError> {
        let receipt = self.receipts.next(notification);
        let line = Self::encode(&AuditRecord::new(notification, &receipt))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::LogWriteFailed("log writer mutex poisoned".to_string()))?;
        writer.write_all(&line).map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        writer.flush().map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        drop(writer);
        Ok(receipt)
    }
}

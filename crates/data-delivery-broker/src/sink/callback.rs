// crates/data-delivery-broker/src/sink/callback.rs
// ============================================================================
// Module: Data Delivery Callback Sink
// Description: Closure-backed notification sink.
// Purpose: Let hosts react to notifications without writing a sink type.
// Dependencies: data-delivery-core, std
// ============================================================================

//! ## Overview
//! [`CallbackSink`] hands each notification to a host closure, for example one
//! that refreshes a subscription table on another workstation view. The closure
//! only reports success or failure; the sink stamps receipts itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use data_delivery_core::SubscriptionNotification;

use crate::sink::DeliveryReceipt;
use crate::sink::NotificationSink;
use crate::sink::ReceiptFactory;
use crate::sink::SinkError;

// ============================================================================
// SECTION: Callback Sink
// ============================================================================

/// Default dispatcher name for callback sinks.
pub const CALLBACK_DISPATCHER: &str = "callback";

/// Host closure invoked per notification.
type Listener = dyn Fn(&SubscriptionNotification) -> Result<(), SinkError> + Send + Sync;

/// Closure-backed notification sink.
///
/// Clones share the listener and the receipt sequence.
#[derive(Clone)]
pub struct CallbackSink {
    /// Host closure.
    listener: Arc<Listener>,
    /// Shared receipt sequence.
    receipts: Arc<ReceiptFactory>,
}

impl CallbackSink {
    /// Wraps `listener` under the default dispatcher name.
    pub fn new<F>(listener: F) -> Self
    where
        F: Fn(&SubscriptionNotification) -> Result<(), SinkError> + Send + Sync + 'static,
    {
        Self::with_dispatcher(listener, CALLBACK_DISPATCHER)
    }

    /// Wraps `listener` under a custom dispatcher name.
    pub fn with_dispatcher<F>(listener: F, dispatcher: impl Into<String>) -> Self
    where
        F: Fn(&SubscriptionNotification) -> Result<(), SinkError> + Send + Sync + 'static,
    {
        Self {
            listener: Arc::new(listener),
            receipts: Arc::new(ReceiptFactory::new(dispatcher)),
        }
    }
}

impl NotificationSink for CallbackSink {
    fn deliver(
        &self,
        notification: &SubscriptionNotification,
    ) -> Result<DeliveryReceipt, SinkError> {
        (self.listener)(notification)?;
        Ok(self.receipts.next(notification))
    }
}

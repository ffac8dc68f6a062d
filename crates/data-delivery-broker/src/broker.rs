// crates/data-delivery-broker/src/broker.rs
// ============================================================================
// Module: Data Delivery Notification Broker
// Description: Fan-out notification sender over configured sinks.
// Purpose: Deliver every lifecycle event to each registered sink.
// Dependencies: data-delivery-core, data-delivery-config, tokio, tracing
// ============================================================================

//! ## Overview
//! [`NotificationBroker`] implements [`NotificationSender`] by delivering each
//! notification to every registered [`NotificationSink`].
//! Invariants:
//! - Every sink sees every notification, even after an earlier sink failed.
//! - A send fails only when at least one sink failed; the error names them all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Arc;

use data_delivery_config::NotificationsConfig;
use data_delivery_core::NotificationError;
use data_delivery_core::NotificationSender;
use data_delivery_core::SubscriptionNotification;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;
use tracing::debug;
use tracing::warn;

use crate::sink::ChannelSink;
use crate::sink::LogSink;
use crate::sink::NotificationMessage;
use crate::sink::NotificationSink;

// ============================================================================
// SECTION: Broker Errors
// ============================================================================

/// Errors returned while assembling a broker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// Broker has no sink to deliver to.
    #[error("broker sink is not configured")]
    MissingSink,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for a notification broker.
///
/// # Invariants
/// - `build` succeeds only when at least one sink is registered.
/// - Sinks are delivered to in registration order.
#[derive(Default)]
pub struct NotificationBrokerBuilder {
    /// Registered sinks.
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationBrokerBuilder {
    /// Registers a sink.
    #[must_use]
    pub fn sink(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Registers a shared sink.
    #[must_use]
    pub fn shared_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Builds the broker.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::MissingSink`] when no sink is registered.
    pub fn build(self) -> Result<NotificationBroker, BrokerError> {
        if self.sinks.is_empty() {
            return Err(BrokerError::MissingSink);
        }
        Ok(NotificationBroker {
            sinks: self.sinks,
        })
    }
}

// ============================================================================
// SECTION: Broker
// ============================================================================

/// Fan-out notification sender.
pub struct NotificationBroker {
    /// Sinks receiving every notification.
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationBroker {
    /// Returns a builder for the broker.
    #[must_use]
    pub fn builder() -> NotificationBrokerBuilder {
        NotificationBrokerBuilder::default()
    }

    /// Builds the broker described by the notifications config section.
    ///
    /// A channel sink with `channel_capacity` slots is always registered and
    /// its receiver returned. When `log_sink` is set, a [`LogSink`] writing to
    /// `log_writer` under the configured dispatcher name is registered first.
    #[must_use]
    pub fn from_config<W>(
        config: &NotificationsConfig,
        log_writer: W,
    ) -> (Self, Receiver<NotificationMessage>)
    where
        W: Write + Send + 'static,
    {
        let mut sinks: Vec<Arc<dyn NotificationSink>> = Vec::new();
        if config.log_sink {
            sinks.push(Arc::new(LogSink::with_dispatcher(log_writer, config.dispatcher.clone())));
        }
        let (sender, receiver) = mpsc::channel(config.channel_capacity.max(1));
        sinks.push(Arc::new(ChannelSink::new(sender)));
        (
            Self {
                sinks,
            },
            receiver,
        )
    }

    /// Returns the number of registered sinks.
    #[must_use]
    pub const fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl NotificationSender for NotificationBroker {
    fn send(&self, notification: &SubscriptionNotification) -> Result<(), NotificationError> {
        let mut failures = Vec::new();
        for sink in &self.sinks {
            match sink.deliver(notification) {
                Ok(receipt) => {
                    debug!(
                        delivery_id = %receipt.delivery_id,
                        kind = %notification.kind,
                        subscription = %notification.subscription_name,
                        "notification delivered"
                    );
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        kind = %notification.kind,
                        subscription = %notification.subscription_name,
                        "notification sink failed"
                    );
                    failures.push(err.to_string());
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotificationError::SendFailed(failures.join("; ")))
        }
    }
}

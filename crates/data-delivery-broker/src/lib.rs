// crates/data-delivery-broker/src/lib.rs
// ============================================================================
// Module: Data Delivery Broker Library
// Description: Notification sinks and fan-out sender for Data Delivery.
// Purpose: Deliver subscription lifecycle events to audit logs and listeners.
// Dependencies: data-delivery-core, data-delivery-config, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! Data Delivery Broker provides ready-made [`NotificationSink`]
//! implementations plus the [`NotificationBroker`] sender that fans each
//! notification out to them.
//! Invariants:
//! - Sinks return receipts only on successful delivery.
//! - Broker failures are reported, never raised as panics.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod broker;
pub mod sink;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use broker::BrokerError;
pub use broker::NotificationBroker;
pub use broker::NotificationBrokerBuilder;
pub use sink::CallbackSink;
pub use sink::ChannelSink;
pub use sink::DeliveryReceipt;
pub use sink::LogSink;
pub use sink::NotificationMessage;
pub use sink::NotificationSink;
pub use sink::SinkError;
pub use sink::callback::CALLBACK_DISPATCHER;
pub use sink::channel::CHANNEL_DISPATCHER;
pub use sink::log::AuditRecord;
pub use sink::log::LOG_DISPATCHER;

// crates/data-delivery-broker/tests/broker.rs
// ============================================================================
// Module: Notification Broker Tests
// Description: Tests for fan-out delivery and config wiring.
// Purpose: Exercise NotificationBroker as a NotificationSender.
// Dependencies: data-delivery-broker, data-delivery-config, data-delivery-core
// ============================================================================

//! ## Overview
//! Validates broker assembly, fan-out, and failure reporting.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use data_delivery_broker::BrokerError;
use data_delivery_broker::CallbackSink;
use data_delivery_broker::ChannelSink;
use data_delivery_broker::LogSink;
use data_delivery_broker::NotificationBroker;
use data_delivery_broker::SinkError;
use data_delivery_config::NotificationsConfig;
use data_delivery_core::NotificationError;
use data_delivery_core::NotificationKind;
use data_delivery_core::NotificationSender;

use common::FailingWriter;
use common::SharedBuffer;
use common::sample_notification;

#[test]
fn builder_without_sinks_is_rejected() {
    assert_eq!(NotificationBroker::builder().build().err(), Some(BrokerError::MissingSink));
}

#[test]
fn broker_fans_out_to_every_sink() {
    let buffer = SharedBuffer::new();
    let (channel, mut rx) = ChannelSink::bounded(4);
    let broker = NotificationBroker::builder()
        .sink(LogSink::new(buffer.clone()))
        .sink(channel)
        .build()
        .unwrap();

    broker.send(&sample_notification(NotificationKind::Created, "Alpha")).unwrap();

    assert_eq!(broker.sink_count(), 2);
    assert_eq!(buffer.lines().len(), 1);
    assert_eq!(rx.try_recv().unwrap().notification.subscription_name.as_str(), "Alpha");
}

#[test]
fn failing_sink_does_not_starve_later_sinks() {
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let broker = NotificationBroker::builder()
        .sink(LogSink::new(FailingWriter))
        .sink(CallbackSink::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(SinkError::DeliveryFailed("listener offline".to_string()))
        }))
        .build()
        .unwrap();

    let err = broker.send(&sample_notification(NotificationKind::Deleted, "Alpha")).unwrap_err();

    assert_eq!(delivered.load(Ordering::SeqCst), 1);
    let NotificationError::SendFailed(message) = err;
    assert!(message.contains("simulated write failure"));
    assert!(message.contains("listener offline"));
}

#[test]
fn from_config_registers_log_and_channel_sinks() {
    let config = NotificationsConfig {
        dispatcher: "audit".to_string(),
        ..NotificationsConfig::default()
    };
    let buffer = SharedBuffer::new();
    let (broker, mut rx) = NotificationBroker::from_config(&config, buffer.clone());

    broker.send(&sample_notification(NotificationKind::Unscheduled, "Beta")).unwrap();

    assert_eq!(broker.sink_count(), 2);
    assert!(buffer.to_string_lossy().contains("\"delivery_id\":\"audit-1\""));
    assert_eq!(rx.try_recv().unwrap().receipt.delivery_id, "channel-1");
}

#[test]
fn from_config_without_log_sink_only_uses_channel() {
    let config = NotificationsConfig {
        log_sink: false,
        channel_capacity: 1,
        ..NotificationsConfig::default()
    };
    let buffer = SharedBuffer::new();
    let (broker, _rx) = NotificationBroker::from_config(&config, buffer.clone());

    broker.send(&sample_notification(NotificationKind::Updated, "Alpha")).unwrap();
    let overflow = broker.send(&sample_notification(NotificationKind::Updated, "Beta"));

    assert_eq!(broker.sink_count(), 1);
    assert!(buffer.is_empty());
    assert!(overflow.is_err());
}

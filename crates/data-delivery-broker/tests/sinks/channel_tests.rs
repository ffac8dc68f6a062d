// crates/data-delivery-broker/tests/sinks/channel_tests.rs
// ============================================================================
// Module: ChannelSink Tests
// Description: Tests for the channel-based notification sink.
// Purpose: Validate message delivery and back-pressure failures.
// Dependencies: data-delivery-broker, tokio
// ============================================================================

//! ## Overview
//! Exercises [`data_delivery_broker::ChannelSink`] message delivery behavior.

use data_delivery_broker::ChannelSink;
use data_delivery_broker::NotificationMessage;
use data_delivery_broker::NotificationSink;
use data_delivery_broker::SinkError;
use data_delivery_core::NotificationKind;

use super::common::sample_notification;

/// Tests channel sink sends the notification with its receipt.
#[test]
fn channel_sink_sends_message_to_channel() {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<NotificationMessage>(2);
    let sink = ChannelSink::new(tx);
    let notification = sample_notification(NotificationKind::Activated, "Alpha");

    let receipt = sink.deliver(&notification).unwrap();
    let message = rx.try_recv().unwrap();
    assert_eq!(message.notification, notification);
    assert_eq!(message.receipt, receipt);
    assert_eq!(receipt.delivery_id, "channel-1");
}

/// Tests a full channel is a delivery failure.
#[test]
fn channel_sink_full_channel_fails() {
    let (sink, _rx) = ChannelSink::bounded(1);
    sink.deliver(&sample_notification(NotificationKind::Created, "Alpha")).unwrap();
    let err = sink.deliver(&sample_notification(NotificationKind::Created, "Beta")).unwrap_err();
    assert!(matches!(err, SinkError::DeliveryFailed(_)));
}

/// Tests a closed channel is a delivery failure.
#[test]
fn channel_sink_closed_channel_fails() {
    let (sink, rx) = ChannelSink::bounded(4);
    drop(rx);
    let err = sink.deliver(&sample_notification(NotificationKind::Deleted, "Alpha")).unwrap_err();
    assert!(matches!(err, SinkError::DeliveryFailed(_)));
}

/// Tests an async listener receives notifications in order.
#[tokio::test]
async fn channel_sink_feeds_async_listener() {
    let (sink, mut rx) = ChannelSink::bounded(0);
    sink.deliver(&sample_notification(NotificationKind::Updated, "Alpha")).unwrap();
    let message = rx.recv().await.unwrap();
    assert_eq!(message.notification.subscription_name.as_str(), "Alpha");
    assert_eq!(message.receipt.sequence, 1);
}

// crates/data-delivery-broker/tests/sinks/callback_tests.rs
// ============================================================================
// Module: CallbackSink Tests
// Description: Tests for the closure-backed notification sink.
// Purpose: Validate handler invocation and error passthrough.
// Dependencies: data-delivery-broker
// ============================================================================

//! ## Overview
//! Exercises [`data_delivery_broker::CallbackSink`] delegation.

use std::sync::Arc;
use std::sync::Mutex;

use data_delivery_broker::CallbackSink;
use data_delivery_broker::NotificationSink;
use data_delivery_broker::SinkError;
use data_delivery_core::NotificationKind;

use super::common::sample_notification;

/// Tests the listener sees each notification and the sink stamps receipts.
#[test]
fn callback_sink_invokes_listener_and_stamps_receipts() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&seen);
    let sink = CallbackSink::new(move |notification| {
        captured.lock().unwrap().push(notification.subscription_name.clone());
        Ok(())
    });

    let first = sink.deliver(&sample_notification(NotificationKind::Deactivated, "Alpha")).unwrap();
    let second = sink.deliver(&sample_notification(NotificationKind::Activated, "Beta")).unwrap();

    assert_eq!(first.delivery_id, "callback-1");
    assert_eq!(first.kind, NotificationKind::Deactivated);
    assert_eq!(second.sequence, 2);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

/// Tests clones share one receipt sequence.
#[test]
fn callback_sink_clones_share_sequence() {
    let sink = CallbackSink::with_dispatcher(|_| Ok(()), "table-refresh");
    let clone = sink.clone();

    sink.deliver(&sample_notification(NotificationKind::Updated, "Alpha")).unwrap();
    let receipt = clone.deliver(&sample_notification(NotificationKind::Updated, "Alpha")).unwrap();

    assert_eq!(receipt.delivery_id, "table-refresh-2");
}

/// Tests listener errors are returned unchanged and consume no sequence number.
#[test]
fn callback_sink_propagates_errors() {
    let offline = Arc::new(Mutex::new(true));
    let flag = Arc::clone(&offline);
    let sink = CallbackSink::new(move |_| {
        if *flag.lock().unwrap() {
            Err(SinkError::DeliveryFailed("listener offline".to_string()))
        } else {
            Ok(())
        }
    });

    let err = sink.deliver(&sample_notification(NotificationKind::Created, "Alpha")).unwrap_err();
    assert_eq!(err, SinkError::DeliveryFailed("listener offline".to_string()));

    *offline.lock().unwrap() = false;
    let receipt = sink.deliver(&sample_notification(NotificationKind::Created, "Alpha")).unwrap();
    assert_eq!(receipt.sequence, 1);
}

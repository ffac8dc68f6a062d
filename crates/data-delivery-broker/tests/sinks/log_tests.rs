// crates/data-delivery-broker/tests/sinks/log_tests.rs
// ============================================================================
// Module: LogSink Tests
// Description: Tests for the JSON-lines notification audit sink.
// Purpose: Validate record contents, receipts, and write failures.
// Dependencies: data-delivery-broker, serde_json
// ============================================================================

//! ## Overview
//! Exercises [`data_delivery_broker::LogSink`] output and error handling.

use data_delivery_broker::LogSink;
use data_delivery_broker::NotificationSink;
use data_delivery_broker::SinkError;
use data_delivery_core::NotificationKind;
use serde_json::Value;

use super::common::FailingWriter;
use super::common::SharedBuffer;
use super::common::sample_notification;

// ============================================================================
// SECTION: Receipts
// ============================================================================

/// Tests log sink new uses the log dispatcher.
#[test]
fn log_sink_new_uses_log_dispatcher() {
    let sink = LogSink::new(SharedBuffer::new());
    let receipt = sink.deliver(&sample_notification(NotificationKind::Created, "Alpha")).unwrap();
    assert_eq!(receipt.delivery_id, "log-1");
    assert_eq!(receipt.dispatcher, "log");
    assert_eq!(receipt.kind, NotificationKind::Created);
    assert_eq!(receipt.subscription_name.as_str(), "Alpha");
}

/// Tests receipt sequence numbers increase per delivery.
#[test]
fn log_sink_receipts_are_sequential() {
    let sink = LogSink::with_dispatcher(SharedBuffer::new(), "audit-log");
    let first = sink.deliver(&sample_notification(NotificationKind::Updated, "Alpha")).unwrap();
    let second = sink.deliver(&sample_notification(NotificationKind::Updated, "Beta")).unwrap();
    assert_eq!(first.sequence, 1);
    assert_eq!(second.sequence, 2);
    assert_eq!(second.delivery_id, "audit-log-2");
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Tests each notification becomes one JSON line.
#[test]
fn log_sink_writes_one_json_line_per_notification() {
    let buffer = SharedBuffer::new();
    let sink = LogSink::new(buffer.clone());
    sink.deliver(&sample_notification(NotificationKind::Unscheduled, "Alpha")).unwrap();
    sink.deliver(&sample_notification(NotificationKind::Deleted, "Beta")).unwrap();

    let lines = buffer.lines();
    assert_eq!(lines.len(), 2);
    let record: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(record["delivery_id"], "log-1");
    assert_eq!(record["kind"], "unscheduled");
    assert_eq!(record["user"], "analyst");
    assert_eq!(record["subscription"], "Alpha");
    assert_eq!(record["message"], "Subscription Alpha is unscheduled.");
    let record: Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(record["kind"], "deleted");
    assert_eq!(record["sequence"], 2);
}

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Tests a failing writer surfaces a log write error.
#[test]
fn log_sink_reports_write_failure() {
    let sink = LogSink::new(FailingWriter);
    let err = sink.deliver(&sample_notification(NotificationKind::Created, "Alpha")).unwrap_err();
    assert!(matches!(err, SinkError::LogWriteFailed(_)));
    assert!(err.to_string().contains("simulated write failure"));
}

// crates/data-delivery-broker/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for data-delivery-broker tests.
// Purpose: Provide notification builders and writers for sink tests.
// Dependencies: data-delivery-core
// ============================================================================

//! ## Overview
//! Provides shared helper functions and test writers for broker sinks.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use data_delivery_core::NotificationKind;
use data_delivery_core::SubscriptionName;
use data_delivery_core::SubscriptionNotification;
use data_delivery_core::UserId;

// ============================================================================
// SECTION: Notification Helpers
// ============================================================================

/// Creates a standard notification for `name`.
pub fn sample_notification(kind: NotificationKind, name: &str) -> SubscriptionNotification {
    SubscriptionNotification::new(kind, &UserId::new("analyst"), &SubscriptionName::new(name))
}

// ============================================================================
// SECTION: Shared Buffer for Write Testing
// ============================================================================

/// A thread-safe buffer for testing Write implementations.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    /// Bytes written so far.
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates a new empty shared buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contents as a string.
    pub fn to_string_lossy(&self) -> String {
        let guard = self.inner.lock().expect("buffer lock");
        String::from_utf8_lossy(&guard).to_string()
    }

    /// Returns the buffered lines.
    pub fn lines(&self) -> Vec<String> {
        self.to_string_lossy().lines().map(str::to_string).collect()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().expect("buffer lock").is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Failing Writer for Error Testing
// ============================================================================

/// A writer that always fails, for testing error paths.
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("simulated write failure"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

//! Integration tests for the device logging system
//!
//! These tests verify the logging system functionality.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use lumen_gfx_device::lumen::log::{self, Logger, LogEntry, LogSeverity};
use lumen_gfx_device::lumen::native::mock_context::MockFactory;
use lumen_gfx_device::lumen::{ContextSource, DeviceOptions, Error, GraphicsDevice};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    log::set_logger(test_logger);

    lumen_gfx_device::log::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    lumen_gfx_device::log::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].severity, LogSeverity::Info);
        assert_eq!(captured[0].source, "test::module");
        assert_eq!(captured[1].message, "Test warning message");
        assert_eq!(captured[1].file, None);
    }

    log::reset_logger();
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let (test_logger, entries) = TestLogger::new();
    log::set_logger(test_logger);

    lumen_gfx_device::log::log_detailed(
        LogSeverity::Error,
        "test::error",
        "Critical error occurred".to_string(),
        "test_file.rs",
        42,
    );

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].file, Some("test_file.rs"));
        assert_eq!(captured[0].line, Some(42));
    }

    log::reset_logger();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    log::set_logger(test_logger);

    lumen_gfx_device::log::log(LogSeverity::Info, "test", "Message 1".to_string());
    log::reset_logger();
    lumen_gfx_device::log::log(LogSeverity::Info, "test", "Message 2".to_string());

    // Still only one message
    assert_eq!(entries.lock().unwrap().len(), 1);
}

// ============================================================================
// DEVICE DIAGNOSTICS
// ============================================================================

#[test]
#[serial]
fn test_integration_device_creation_is_logged() {
    let (test_logger, entries) = TestLogger::new();
    log::set_logger(test_logger);

    let factory = MockFactory::new(true, true);
    let device = GraphicsDevice::new(DeviceOptions::default(), ContextSource::Factory(&factory));

    log::reset_logger();
    assert!(device.is_ok());
    let captured = entries.lock().unwrap();
    assert!(captured
        .iter()
        .any(|e| e.source == "lumen::GraphicsDevice" && e.message.starts_with("Device created")));
    assert!(captured.iter().any(|e| e.source == "lumen::Capabilities"));
}

#[test]
#[serial]
fn test_integration_initialization_failure_is_logged_with_location() {
    let (test_logger, entries) = TestLogger::new();
    log::set_logger(test_logger);

    let factory = MockFactory::new(false, false);
    let device = GraphicsDevice::new(DeviceOptions::default(), ContextSource::Factory(&factory));

    log::reset_logger();
    assert!(matches!(device, Err(Error::InitializationFailed(_))));
    let captured = entries.lock().unwrap();
    let warnings = captured.iter().filter(|e| e.severity == LogSeverity::Warn).count();
    assert_eq!(warnings, 2);
    let error = captured.iter().find(|e| e.severity == LogSeverity::Error).unwrap();
    assert!(error.file.is_some());
    assert!(error.line.is_some());
}

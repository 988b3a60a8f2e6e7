//! Integration Tests for Error Handling
//!
//! How monitor-reported failures, timeouts, dropped connections and bad
//! input reach the caller, and what each one does to the session.

#[path = "../test_utils/mock_monitor.rs"]
mod mock_monitor;

use mock_monitor::{test_config, MockConnector, MockReply};
use monitor_bridge::{BridgeState, Error, ErrorKind, KeywordGateway, KeywordStatus};
use serde_json::json;
use std::time::{Duration, Instant};

fn peripherals_console() -> MockConnector {
    MockConnector::new(|line| match line {
        "" => MockReply::Empty,
        "version" => MockReply::Text("1.15.0".into()),
        "pause" => MockReply::Silent,
        "quit" => MockReply::Hangup,
        "sysbus.uart0 WriteChar" => {
            MockReply::Error("Parameters did not match the signature\n  WriteChar(byte value)".into())
        }
        other => MockReply::Error(format!(
            "No such command or device: {}",
            other.split(' ').next().unwrap_or_default()
        )),
    })
}

#[tokio::test]
async fn test_monitor_error_message_is_verbatim() {
    let gateway = KeywordGateway::from_config(&test_config(), peripherals_console()).unwrap();

    let err = gateway.invoke("sysbus.uart9", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MonitorReported);
    assert_eq!(err.to_string(), "No such command or device: sysbus.uart9");
}

#[tokio::test]
async fn test_multiline_error_keeps_details() {
    let gateway = KeywordGateway::from_config(&test_config(), peripherals_console()).unwrap();

    let err = gateway
        .invoke("sysbus.uart0", &[json!("WriteChar")])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parameters did not match the signature\n  WriteChar(byte value)"
    );
}

#[tokio::test]
async fn test_monitor_error_does_not_end_session() {
    let connector = peripherals_console();
    let gateway = KeywordGateway::from_config(&test_config(), connector.clone()).unwrap();

    assert!(gateway.invoke("bogus", &[]).await.is_err());
    assert_eq!(gateway.state(), BridgeState::Connected);

    let value = gateway.invoke("version", &[]).await.unwrap();
    assert_eq!(value.as_deref(), Some("1.15.0"));
    assert_eq!(connector.connect_count(), 1);
}

#[tokio::test]
async fn test_timeout_is_bounded_and_fatal() {
    let mut config = test_config();
    config.monitor.response_timeout_ms = 200;
    let gateway = KeywordGateway::from_config(&config, peripherals_console()).unwrap();
    gateway.start().await.unwrap();

    let started = Instant::now();
    let err = gateway.invoke("pause", &[]).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, Error::Timeout { .. }), "got {:?}", err);
    assert!(elapsed >= Duration::from_millis(200), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1_500), "returned after {:?}", elapsed);
    assert_eq!(gateway.state(), BridgeState::Closed);

    let after = gateway.invoke("version", &[]).await.unwrap_err();
    assert!(matches!(after, Error::BridgeClosed));
}

#[tokio::test]
async fn test_dropped_connection_is_fatal() {
    let connector = peripherals_console();
    let gateway = KeywordGateway::from_config(&test_config(), connector.clone()).unwrap();

    let err = gateway.invoke("quit", &[]).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed { .. }), "got {:?}", err);
    assert!(err.is_session_fatal());
    assert_eq!(gateway.state(), BridgeState::Closed);

    // No reconnection
    assert!(gateway.invoke("version", &[]).await.is_err());
    assert_eq!(connector.connect_count(), 1);
}

#[tokio::test]
async fn test_connection_refused() {
    let connector = MockConnector::refusing();
    let gateway = KeywordGateway::from_config(&test_config(), connector.clone()).unwrap();

    let err = gateway.invoke("version", &[]).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionFailed { .. }), "got {:?}", err);
    assert_eq!(gateway.state(), BridgeState::Closed);

    let again = gateway.invoke("version", &[]).await.unwrap_err();
    assert!(matches!(again, Error::BridgeClosed));
    assert_eq!(connector.connect_count(), 1);
}

#[tokio::test]
async fn test_invalid_keyword_rejected_before_io() {
    let connector = peripherals_console();
    let gateway = KeywordGateway::from_config(&test_config(), connector.clone()).unwrap();

    let err = gateway.invoke("two words", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCommand);
    assert_eq!(connector.connect_count(), 0);
    assert_eq!(gateway.state(), BridgeState::Uninitialized);
}

#[tokio::test]
async fn test_startup_command_error_only_warns() {
    let connector = peripherals_console();
    let mut config = test_config();
    config.monitor.startup_commands = vec!["include @missing.resc".to_string()];

    let gateway = KeywordGateway::from_config(&config, connector.clone()).unwrap();
    gateway.start().await.unwrap();
    assert_eq!(gateway.state(), BridgeState::Connected);
    assert_eq!(connector.commands(), vec!["include @missing.resc"]);
}

#[tokio::test]
async fn test_fatal_startup_command_fails_start() {
    let connector = peripherals_console();
    let mut config = test_config();
    config.monitor.startup_commands = vec!["quit".to_string()];

    let gateway = KeywordGateway::from_config(&config, connector).unwrap();
    let err = gateway.start().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(gateway.state(), BridgeState::Closed);
}

#[tokio::test]
async fn test_run_keyword_failure_flags() {
    let mut config = test_config();
    config.monitor.response_timeout_ms = 100;
    let gateway = KeywordGateway::from_config(&config, peripherals_console()).unwrap();

    let reported = gateway.run_keyword("bogus", &[]).await;
    assert_eq!(reported.status, KeywordStatus::Fail);
    assert_eq!(
        reported.error.as_deref(),
        Some("No such command or device: bogus")
    );
    assert!(reported.continuable);
    assert!(!reported.fatal);

    let timed_out = gateway.run_keyword("pause", &[]).await;
    assert_eq!(timed_out.status, KeywordStatus::Fail);
    assert!(timed_out.fatal);
    assert!(!timed_out.continuable);
}

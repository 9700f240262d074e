// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use sensorlog::config::{DEFAULT_DELAY_MS, DEFAULT_ENDPOINT};
use sensorlog::LoggerConfig;
use sensorlog_channel::ProtocolVersion;
use sensorlog_error::SensorLogError;
use std::time::Duration;

#[test]
fn test_minimal_toml_gets_defaults() -> anyhow::Result<()> {
    let config = LoggerConfig::from_toml_str(
        r#"
        id = "7"
        sensor_ids = ["s1"]
        "#,
    )?;

    assert_eq!(config.delay_ms, DEFAULT_DELAY_MS);
    assert_eq!(config.delay(), Duration::from_secs(1));
    assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.metadata, "AAAF");
    assert_eq!(config.value_max, 100.0);
    assert_eq!(config.protocol, ProtocolVersion::V1);
    assert_eq!(config.seed, None);
    assert_eq!(config, LoggerConfig::new("7", ["s1"]));
    Ok(())
}

#[test]
fn test_toml_overrides() -> anyhow::Result<()> {
    let config = LoggerConfig::from_toml_str(
        r#"
        id = "7"
        sensor_ids = ["s1", "s2"]
        delay_ms = 200
        endpoint = "ws://example.org/sockets/logger/websocket"
        metadata = "BBBF"
        seed = 11
        protocol = "v2"
        "#,
    )?;

    assert_eq!(config.delay(), Duration::from_millis(200));
    assert_eq!(config.metadata, "BBBF");
    assert_eq!(config.seed, Some(11));
    assert_eq!(config.protocol, ProtocolVersion::V2);
    Ok(())
}

#[test]
fn test_missing_id_is_config_error() {
    let result = LoggerConfig::from_toml_str(r#"sensor_ids = ["s1"]"#);

    assert!(matches!(result, Err(SensorLogError::Config { .. })));
}

#[test]
fn test_load_missing_file_is_config_error() {
    let result = LoggerConfig::load("/definitely/not/here/sensorlog.toml");

    match result {
        Err(SensorLogError::Config { message }) => assert!(message.contains("sensorlog.toml")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_socket_options_carry_identity() {
    let mut config = LoggerConfig::new("42", ["s1"]);
    config.heartbeat_ms = 5_000;
    config.timeout_ms = 750;

    let options = config.socket_options("hunter2");

    assert_eq!(options.params.get("id").map(String::as_str), Some("42"));
    assert_eq!(options.params.get("password").map(String::as_str), Some("hunter2"));
    assert_eq!(options.heartbeat_interval, Duration::from_secs(5));
    assert_eq!(options.timeout, Duration::from_millis(750));
}

#[test]
fn test_with_delay_and_topic() {
    let config = LoggerConfig::new("abc", ["s1"]).with_delay(Duration::from_millis(40));

    assert_eq!(config.delay_ms, 40);
    assert_eq!(config.topic(), "loggers:abc");
}

#[test]
fn test_zero_heartbeat_is_config_error() {
    let result = LoggerConfig::from_toml_str(
        r#"
        id = "7"
        sensor_ids = ["s1"]
        heartbeat_ms = 0
        "#,
    );

    match result {
        Err(SensorLogError::Config { message }) => assert!(message.contains("heartbeat_ms")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_zero_timeout_is_config_error() {
    let result = LoggerConfig::from_toml_str(
        r#"
        id = "7"
        sensor_ids = ["s1"]
        timeout_ms = 0
        "#,
    );

    assert!(matches!(result, Err(SensorLogError::Config { .. })));
}

#[test]
fn test_zero_delay_is_accepted() -> anyhow::Result<()> {
    let config = LoggerConfig::from_toml_str(
        r#"
        id = "7"
        sensor_ids = ["s1"]
        delay_ms = 0
        "#,
    )?;

    assert_eq!(config.delay(), Duration::ZERO);
    Ok(())
}

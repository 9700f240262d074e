// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use sensorlog_error::{Result, ResultExt, SensorLogError};
use std::io;
use std::time::Duration;

#[test]
fn test_error_display() {
    let err = SensorLogError::join_rejected("loggers:42", r#"{"reason":"unauthorized"}"#);
    assert_eq!(
        err.to_string(),
        r#"Join rejected on loggers:42: {"reason":"unauthorized"}"#
    );

    let err = SensorLogError::timeout("phx_join", Duration::from_secs(10));
    assert_eq!(err.to_string(), "Operation timed out after 10s: phx_join");

    let err = SensorLogError::connection("ws://localhost:4000", "refused");
    assert_eq!(
        err.to_string(),
        "Failed to connect to ws://localhost:4000: refused"
    );
}

#[test]
fn test_error_constructors() {
    let err = SensorLogError::invalid_state("not connected");
    assert!(matches!(err, SensorLogError::InvalidState { .. }));

    let err = SensorLogError::transport("socket reset");
    assert!(matches!(err, SensorLogError::Transport { .. }));

    let err = SensorLogError::config("missing id");
    assert!(matches!(err, SensorLogError::Config { .. }));
}

#[test]
fn test_is_recoverable() {
    assert!(SensorLogError::transport("reset").is_recoverable());
    assert!(SensorLogError::timeout("push", Duration::from_millis(5)).is_recoverable());
    assert!(!SensorLogError::ChannelClosed.is_recoverable());
    assert!(!SensorLogError::user_error(io::Error::other("boom")).is_recoverable());
}

#[test]
fn test_is_permanent() {
    assert!(SensorLogError::ChannelClosed.is_permanent());
    assert!(SensorLogError::join_rejected("loggers:1", "{}").is_permanent());
    assert!(!SensorLogError::connection("ws://x", "down").is_permanent());
}

#[test]
fn test_codec_error_from_serde() {
    let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
    let err: SensorLogError = parse.unwrap_err().into();
    assert!(matches!(err, SensorLogError::Codec(_)));
}

#[test]
fn test_result_context_wraps_user_errors() {
    let result: Result<()> = Err(SensorLogError::UserError("socket hung up".into()));

    let err = result.context("sending new_log").unwrap_err();
    assert!(matches!(err, SensorLogError::Transport { .. }));
    assert!(err.to_string().contains("sending new_log"));
    assert!(err.to_string().contains("socket hung up"));
}

#[test]
fn test_result_context_preserves_other_errors() {
    let result: Result<()> = Err(SensorLogError::ChannelClosed);

    let err = result.context("sending new_log").unwrap_err();
    assert!(matches!(err, SensorLogError::ChannelClosed));
}

#[test]
fn test_result_with_context_ok() {
    let result: Result<i32> = Ok(42);
    let value = result
        .with_context(|| unreachable!("context is lazy"))
        .unwrap();
    assert_eq!(value, 42);
}

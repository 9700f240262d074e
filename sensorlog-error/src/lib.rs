#![allow(clippy::multiple_crate_versions)]
//! Error types for the sensorlog reading simulator
//!
//! Every fallible operation in the workspace (connecting a socket, joining a
//! channel, pushing a batch of readings, loading configuration) reports a
//! [`SensorLogError`].
//!
//! # Examples
//!
//! ```
//! use sensorlog_error::{Result, SensorLogError};
//!
//! fn start_logging(connected: bool) -> Result<()> {
//!     if !connected {
//!         return Err(SensorLogError::invalid_state("socket is not connected"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(start_logging(false).is_err());
//! ```

use std::time::Duration;

/// Root error type for all sensorlog operations
#[derive(Debug, thiserror::Error)]
pub enum SensorLogError {
    /// The transport could not be opened
    #[error("Failed to connect to {endpoint}: {reason}")]
    Connection {
        /// Endpoint URL the socket tried to reach
        endpoint: String,
        /// Why the connection attempt failed
        reason: String,
    },

    /// An open transport failed while sending or receiving frames
    #[error("Transport error: {context}")]
    Transport {
        /// Description of the failing transport operation
        context: String,
    },

    /// The socket driver is gone, so nothing can be sent or received
    #[error("Channel closed: socket is no longer running")]
    ChannelClosed,

    /// The server answered a join with an error reply
    #[error("Join rejected on {topic}: {response}")]
    JoinRejected {
        /// Topic the client tried to join
        topic: String,
        /// Server response, rendered as JSON
        response: String,
    },

    /// No reply arrived in time
    #[error("Operation timed out after {duration:?}: {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// How long we waited
        duration: Duration,
    },

    /// An operation was attempted in the wrong lifecycle state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state
        message: String,
    },

    /// A frame could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Configuration could not be loaded or is unusable
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// Custom error from user code or a third-party library
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SensorLogError {
    /// Create a connection error for the given endpoint
    pub fn connection(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport error with the given context
    pub fn transport(context: impl Into<String>) -> Self {
        Self::Transport {
            context: context.into(),
        }
    }

    /// Create a join rejection for the given topic
    pub fn join_rejected(topic: impl Into<String>, response: impl Into<String>) -> Self {
        Self::JoinRejected {
            topic: topic.into(),
            response: response.into(),
        }
    }

    /// Create an invalid state error with the given message
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Check if this is a recoverable error
    ///
    /// Transient failures that could succeed if the operation is retried.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Transport { .. } | Self::Timeout { .. }
        )
    }

    /// Check if this error indicates a permanent failure
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        !self.is_recoverable()
    }
}

/// Specialized Result type for sensorlog operations
pub type Result<T> = std::result::Result<T, SensorLogError>;

/// Helper trait for adding context to `Result`s
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// # Errors
    /// Returns `Err(SensorLogError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// # Errors
    /// Returns `Err(SensorLogError)` if the underlying result is `Err`.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SensorLogError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.with_context(|| context.into())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            SensorLogError::UserError(inner) => SensorLogError::Transport {
                context: format!("{}: {inner}", f()),
            },
            SensorLogError::Codec(inner) => SensorLogError::Transport {
                context: format!("{}: {inner}", f()),
            },
            other => other,
        })
    }
}

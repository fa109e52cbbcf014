//! # Queue Error Types

use thiserror::Error;

/// Result type alias for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Queue error type.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Could not reach the broker.
    #[error("Queue connection failed: {0}")]
    Connection(String),

    /// The broker rejected a command.
    #[error("Queue command failed: {0}")]
    Command(String),

    /// Consumer group could not be created.
    #[error("Consumer group error: {0}")]
    ConsumerGroup(String),

    /// Envelope could not be encoded.
    #[error("Failed to encode message: {0}")]
    Encode(String),

    /// Payload is not a valid envelope.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// The client was closed.
    #[error("Queue closed")]
    Closed,
}

impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            QueueError::Connection(err.to_string())
        } else {
            QueueError::Command(err.to_string())
        }
    }
}

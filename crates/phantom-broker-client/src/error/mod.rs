//! Errors raised while driving the broker from the caller's side.
//!
//! Transport problems (spawn, timeout, framing) are kept apart from
//! [`ClientError::Operation`], which carries a failure the broker itself
//! reported for a well-formed request. I/O errors are wrapped in `Arc` to
//! keep the enum small.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use phantom_broker_protocol::CodecError;
use thiserror::Error;

/// Errors arising from a broker round trip.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be encoded.
    #[error("failed to encode broker request: {0}")]
    Encode(#[source] CodecError),

    /// The broker process could not be started.
    #[error("failed to start broker '{}': {source}", program.display())]
    Spawn {
        /// Program that was launched.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Communicating with the broker process failed.
    #[error("I/O error communicating with the broker: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The broker did not exit within the configured timeout.
    #[error("broker timed out after {}ms", timeout.as_millis())]
    Timeout {
        /// Configured timeout.
        timeout: Duration,
    },

    /// The broker rejected the invocation itself (exit status 1).
    #[error("broker rejected the invocation: {message}")]
    Rejected {
        /// Error string from the response, or stderr when none was decoded.
        message: String,
    },

    /// The broker exited with a status outside the protocol.
    #[error("broker exited with status {status}: {stderr}")]
    NonZeroExit {
        /// Exit status, or -1 when terminated by a signal.
        status: i32,
        /// Captured diagnostics.
        stderr: String,
    },

    /// The response line could not be decoded.
    #[error("failed to decode broker response: {0}")]
    Decode(#[source] CodecError),

    /// The output violated the one-line response framing or schema.
    #[error("broker produced malformed output: {message}")]
    Malformed {
        /// Description of the violation.
        message: String,
    },

    /// The broker reported that the operation failed.
    #[error("{kind}: {message}")]
    Operation {
        /// Wire error kind such as `NotFound`.
        kind: String,
        /// Remainder of the error string.
        message: String,
    },

    /// A successful response carried a result of the wrong shape.
    #[error("operation '{op}' returned an unexpected result; expected {expected}")]
    UnexpectedResult {
        /// Operation that was called.
        op: String,
        /// Description of the expected result.
        expected: &'static str,
    },
}

impl ClientError {
    /// Splits a `"<Kind>: <message>"` error string into an operation error.
    #[must_use]
    pub fn from_wire(error: &str) -> Self {
        let (kind, message) = error.split_once(": ").unwrap_or((error, ""));
        Self::Operation {
            kind: kind.to_owned(),
            message: message.to_owned(),
        }
    }

    /// Returns the wire kind for broker-reported failures.
    #[must_use]
    pub fn operation_kind(&self) -> Option<&str> {
        match self {
            Self::Operation { kind, .. } => Some(kind.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;

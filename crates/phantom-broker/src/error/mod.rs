//! Handler failures and their wire classification.
//!
//! Every failure the broker reports to its caller is a [`BrokerError`]. The
//! wire form is `"<ErrorKind>: <message>"`, where the kind is drawn from the
//! closed [`ErrorKind`] set and the message is the error's display text.
//! Malformed invocations never reach this type; they are a codec concern
//! and carry the fixed `"Invalid arguments"` string instead.

use std::io;

use camino::Utf8Path;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Closed set of error categories reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum ErrorKind {
    /// The operation is not on the allowlist for the request kind.
    UnknownOperation,
    /// Handler arguments did not fit the operation's signature.
    BadArgument,
    /// The path (or an ancestor) does not exist.
    NotFound,
    /// The target already exists.
    AlreadyExists,
    /// The caller's process identity lacks access.
    PermissionDenied,
    /// A path component that must be a directory is not one.
    NotADirectory,
    /// A file operation was attempted on a directory.
    IsADirectory,
    /// A directory could not be removed because it has entries.
    DirectoryNotEmpty,
    /// A rename would cross filesystems.
    CrossDevice,
    /// Any other I/O failure.
    #[strum(to_string = "IOError")]
    Io,
    /// A handler produced a value the wire format cannot carry.
    InvalidResult,
    /// A handler panicked.
    InternalError,
}

impl ErrorKind {
    /// Classifies an I/O error kind.
    #[must_use]
    pub fn from_io(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::NotADirectory => Self::NotADirectory,
            io::ErrorKind::IsADirectory => Self::IsADirectory,
            io::ErrorKind::DirectoryNotEmpty => Self::DirectoryNotEmpty,
            io::ErrorKind::CrossesDevices => Self::CrossDevice,
            _ => Self::Io,
        }
    }
}

/// Failures raised while executing a decoded request.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The operation name is not allowlisted for the request kind.
    #[error("{op}")]
    UnknownOperation {
        /// Rejected operation name.
        op: String,
    },

    /// Arguments did not bind to the operation's signature.
    #[error("{message}")]
    BadArgument {
        /// Description of the mismatch.
        message: String,
    },

    /// A filesystem call failed.
    #[error("{source}: {subject}")]
    Io {
        /// Quoted path (or `'from' -> 'to'` pair) the call acted on.
        subject: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The handler result cannot be represented on the wire.
    #[error("{message}")]
    InvalidResult {
        /// Description of the offending value.
        message: String,
    },

    /// The handler panicked before producing a result.
    #[error("handler panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl BrokerError {
    /// Builds an error for an operation outside the allowlist.
    #[must_use]
    pub fn unknown_operation(op: &str) -> Self {
        Self::UnknownOperation { op: op.to_owned() }
    }

    /// Builds an argument-binding error.
    #[must_use]
    pub fn bad_argument(message: impl Into<String>) -> Self {
        Self::BadArgument {
            message: message.into(),
        }
    }

    /// Wraps an I/O error raised while acting on `path`.
    #[must_use]
    pub fn io(path: &Utf8Path, source: io::Error) -> Self {
        Self::Io {
            subject: format!("'{path}'"),
            source,
        }
    }

    /// Wraps an I/O error raised by a two-path call such as rename.
    #[must_use]
    pub fn io_pair(from: &Utf8Path, to: &Utf8Path, source: io::Error) -> Self {
        Self::Io {
            subject: format!("'{from}' -> '{to}'"),
            source,
        }
    }

    /// Builds an error for a result the wire cannot carry.
    #[must_use]
    pub fn invalid_result(message: impl Into<String>) -> Self {
        Self::InvalidResult {
            message: message.into(),
        }
    }

    /// Returns the wire category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownOperation { .. } => ErrorKind::UnknownOperation,
            Self::BadArgument { .. } => ErrorKind::BadArgument,
            Self::Io { source, .. } => ErrorKind::from_io(source.kind()),
            Self::InvalidResult { .. } => ErrorKind::InvalidResult,
            Self::Panicked { .. } => ErrorKind::InternalError,
        }
    }

    /// Renders the `"<ErrorKind>: <message>"` string sent to the caller.
    #[must_use]
    pub fn wire_message(&self) -> String {
        format!("{}: {self}", self.kind())
    }
}

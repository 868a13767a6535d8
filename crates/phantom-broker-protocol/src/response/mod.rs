//! Response records written by the broker.
//!
//! Exactly one of `result` and `error` is meaningful, selected by `ok`.
//! A successful `result` may itself be JSON `null`, so presence is tracked
//! separately from the value: `Some(ResultValue::Null)` serialises as
//! `"result": null`, whereas `None` omits the key entirely.

use serde::{Deserialize, Deserializer, Serialize};

/// Error string emitted when the invocation itself is malformed.
pub const INVALID_ARGUMENTS: &str = "Invalid arguments";

/// Transport encoding applied to a `result` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// The result string is standard base64 of raw bytes.
    Base64,
}

/// File metadata returned by the `stat` and `lstat` operations.
///
/// `size`, `mode`, and `mtime` are always present. The remaining fields are
/// filled on Unix hosts and omitted elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatRecord {
    /// Size in bytes.
    pub size: u64,
    /// File type and permission bits.
    pub mode: u32,
    /// Last modification time, whole seconds since the Unix epoch.
    pub mtime: i64,
    /// Nanosecond part of the modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime_ns: Option<i64>,
    /// Last access time, whole seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atime: Option<i64>,
    /// Last status change time, whole seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctime: Option<i64>,
    /// Owner user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    /// Owner group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    /// Hard link count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlink: Option<u64>,
    /// Inode number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ino: Option<u64>,
    /// Device id of the containing filesystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev: Option<u64>,
}

/// A normalised handler result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    /// JSON `null`; operations that return nothing.
    Null,
    /// Predicate outcome.
    Bool(bool),
    /// Counts and other integers.
    Integer(i64),
    /// Text content, stringified paths, or base64 bytes.
    Text(String),
    /// Materialised listings and path parts.
    List(Vec<String>),
    /// File metadata.
    Stat(StatRecord),
}

impl ResultValue {
    /// Returns the text value, if any.
    #[must_use]
    pub const fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the boolean value, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer value, if any.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the list value, if any.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the stat record, if any.
    #[must_use]
    pub const fn as_stat(&self) -> Option<&StatRecord> {
        match self {
            Self::Stat(record) => Some(record),
            _ => None,
        }
    }
}

/// Response written by the broker as one stdout line.
///
/// # Example
///
/// ```
/// use phantom_broker_protocol::{Response, ResultValue};
///
/// let response = Response::success("exists", ResultValue::Bool(false));
/// assert!(response.is_ok());
/// assert!(response.is_well_formed());
///
/// let refused = Response::failure(Some("chmod"), "UnknownOperation: chmod");
/// assert_eq!(refused.error(), Some("UnknownOperation: chmod"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_result"
    )]
    result: Option<ResultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoding: Option<PayloadEncoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Response {
    /// Creates a successful response carrying a plain result.
    #[must_use]
    pub fn success(op: impl Into<String>, result: ResultValue) -> Self {
        Self {
            ok: true,
            op: Some(op.into()),
            result: Some(result),
            encoding: None,
            error: None,
        }
    }

    /// Creates a successful response whose text result is transport-encoded.
    #[must_use]
    pub fn success_encoded(
        op: impl Into<String>,
        encoded: impl Into<String>,
        encoding: PayloadEncoding,
    ) -> Self {
        Self {
            ok: true,
            op: Some(op.into()),
            result: Some(ResultValue::Text(encoded.into())),
            encoding: Some(encoding),
            error: None,
        }
    }

    /// Creates a failure response.
    ///
    /// `op` is echoed when the request decoded far enough to know it.
    #[must_use]
    pub fn failure(op: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            op: op.map(str::to_owned),
            result: None,
            encoding: None,
            error: Some(error.into()),
        }
    }

    /// Creates the response for a malformed invocation.
    #[must_use]
    pub fn invalid_arguments() -> Self {
        Self::failure(None, INVALID_ARGUMENTS)
    }

    /// Returns whether the handler completed without error.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.ok
    }

    /// Returns the echoed operation name.
    #[must_use]
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Returns the normalised result.
    #[must_use]
    pub const fn result(&self) -> Option<&ResultValue> {
        self.result.as_ref()
    }

    /// Returns the transport encoding of the result, if any.
    #[must_use]
    pub const fn encoding(&self) -> Option<PayloadEncoding> {
        self.encoding
    }

    /// Returns the diagnostic string.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Checks `ok ⇔ result present ⇔ error absent`, and that an encoding
    /// only accompanies a text result.
    #[must_use]
    pub const fn is_well_formed(&self) -> bool {
        let encoding_consistent = match (self.encoding, &self.result) {
            (None, _) => true,
            (Some(_), Some(ResultValue::Text(_))) => true,
            (Some(_), _) => false,
        };
        self.ok == self.result.is_some() && self.ok == self.error.is_none() && encoding_consistent
    }
}

fn present_result<'de, D>(deserializer: D) -> Result<Option<ResultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    ResultValue::deserialize(deserializer).map(Some)
}

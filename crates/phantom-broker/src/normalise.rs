//! Coerces raw handler outcomes into wire values.
//!
//! Paths become strings, listings are materialised lists of strings, byte
//! strings travel as base64 with an `encoding` tag, and scalars pass
//! through. Anything the wire cannot carry is an `InvalidResult` failure.

use std::path::PathBuf;

use camino::Utf8PathBuf;
use phantom_broker_protocol::{PayloadEncoding, Response, ResultValue, StatRecord, codec};

use crate::error::BrokerError;

/// Raw value produced by a handler before normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation returns nothing.
    Unit,
    /// Predicate outcome.
    Bool(bool),
    /// Characters or bytes written.
    Count(usize),
    /// Text content or a string-valued path property.
    Text(String),
    /// A host path.
    Path(PathBuf),
    /// An enumerated sequence of host paths.
    Paths(Vec<PathBuf>),
    /// An ordered sequence of strings.
    Texts(Vec<String>),
    /// Raw file content.
    Bytes(Vec<u8>),
    /// File metadata.
    Stat(StatRecord),
}

/// Converts `outcome` into the success response for `op`.
///
/// # Errors
///
/// Returns [`BrokerError::InvalidResult`] for a path that is not valid
/// UTF-8 or a count beyond the integer range of the wire format.
pub fn into_response(op: &str, outcome: Outcome) -> Result<Response, BrokerError> {
    let value = match outcome {
        Outcome::Bytes(bytes) => {
            return Ok(Response::success_encoded(
                op,
                codec::encode_bytes(&bytes),
                PayloadEncoding::Base64,
            ));
        }
        Outcome::Unit => ResultValue::Null,
        Outcome::Bool(flag) => ResultValue::Bool(flag),
        Outcome::Count(count) => ResultValue::Integer(i64::try_from(count).map_err(|_| {
            BrokerError::invalid_result(format!("count {count} exceeds the integer range"))
        })?),
        Outcome::Text(text) => ResultValue::Text(text),
        Outcome::Path(path) => ResultValue::Text(path_string(path)?),
        Outcome::Paths(paths) => ResultValue::List(
            paths
                .into_iter()
                .map(path_string)
                .collect::<Result<_, _>>()?,
        ),
        Outcome::Texts(texts) => ResultValue::List(texts),
        Outcome::Stat(record) => ResultValue::Stat(record),
    };
    Ok(Response::success(op, value))
}

fn path_string(path: PathBuf) -> Result<String, BrokerError> {
    Utf8PathBuf::from_path_buf(path)
        .map(Utf8PathBuf::into_string)
        .map_err(|raw| {
            BrokerError::invalid_result(format!(
                "path is not valid UTF-8: {}",
                raw.to_string_lossy()
            ))
        })
}

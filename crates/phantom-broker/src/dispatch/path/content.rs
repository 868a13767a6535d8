//! Whole-file reads and writes on a path.

use std::fs;

use phantom_broker_protocol::{Request, codec};

use crate::dispatch::arguments::Bound;
use crate::error::BrokerError;
use crate::normalise::Outcome;

pub(super) fn read_text(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["encoding"])?;
    args.require_utf8("encoding")?;
    let path = request.path();
    fs::read_to_string(path)
        .map(Outcome::Text)
        .map_err(|error| BrokerError::io(path, error))
}

pub(super) fn read_bytes(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    let path = request.path();
    fs::read(path)
        .map(Outcome::Bytes)
        .map_err(|error| BrokerError::io(path, error))
}

/// Writes text and reports the number of characters written.
pub(super) fn write_text(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["data", "encoding"])?;
    let data = args.required_text("data")?;
    args.require_utf8("encoding")?;
    let path = request.path();
    fs::write(path, data).map_err(|error| BrokerError::io(path, error))?;
    Ok(Outcome::Count(data.chars().count()))
}

/// Writes base64-supplied bytes and reports the number of bytes written.
pub(super) fn write_bytes(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["data"])?;
    let encoded = args.required_text("data")?;
    let bytes = codec::decode_bytes(encoded).map_err(|error| {
        BrokerError::bad_argument(format!("write_bytes() argument 'data': {error}"))
    })?;
    let path = request.path();
    fs::write(path, &bytes).map_err(|error| BrokerError::io(path, error))?;
    Ok(Outcome::Count(bytes.len()))
}

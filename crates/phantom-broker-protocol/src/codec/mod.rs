//! Transport codec: `base64(utf8(json))` in both directions.
//!
//! The base64 layer exists only so the payload survives argv quoting and
//! occupies a single stdout line. JSON is compact, so an encoded record
//! never contains whitespace.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::request::Request;
use crate::response::Response;

/// Failures while encoding or decoding a transport payload.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload was empty after trimming.
    #[error("payload is empty")]
    Empty,
    /// The payload was not valid standard base64.
    #[error("payload is not valid base64: {0}")]
    Base64(#[source] base64::DecodeError),
    /// The decoded bytes were not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[source] std::string::FromUtf8Error),
    /// The JSON did not parse or did not match the schema.
    #[error("payload does not match the schema: {0}")]
    Json(#[source] serde_json::Error),
}

/// Encodes a request into an argv-safe payload.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialisation fails.
pub fn encode_request(request: &Request) -> Result<String, CodecError> {
    encode(request)
}

/// Decodes a request from the broker's argv payload.
///
/// # Errors
///
/// Returns a [`CodecError`] describing the first layer that failed.
pub fn decode_request(payload: &str) -> Result<Request, CodecError> {
    decode(payload)
}

/// Encodes a response into a single transport line (without the newline).
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialisation fails.
pub fn encode_response(response: &Response) -> Result<String, CodecError> {
    encode(response)
}

/// Decodes a response line read from the broker's stdout.
///
/// # Errors
///
/// Returns a [`CodecError`] describing the first layer that failed.
pub fn decode_response(line: &str) -> Result<Response, CodecError> {
    decode(line)
}

/// Encodes raw bytes for a `result` tagged `encoding: "base64"`.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes a base64 byte payload.
///
/// # Errors
///
/// Returns [`CodecError::Base64`] if the text is not valid base64.
pub fn decode_bytes(text: &str) -> Result<Vec<u8>, CodecError> {
    STANDARD.decode(text.trim()).map_err(CodecError::Base64)
}

fn encode<T: Serialize>(value: &T) -> Result<String, CodecError> {
    let json = serde_json::to_vec(value).map_err(CodecError::Json)?;
    Ok(STANDARD.encode(json))
}

fn decode<T: DeserializeOwned>(payload: &str) -> Result<T, CodecError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(CodecError::Empty);
    }
    let bytes = STANDARD.decode(trimmed).map_err(CodecError::Base64)?;
    let text = String::from_utf8(bytes).map_err(CodecError::Utf8)?;
    serde_json::from_str(&text).map_err(CodecError::Json)
}

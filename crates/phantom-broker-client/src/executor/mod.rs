//! Seam between request construction and broker execution.
//!
//! [`BrokerExecutor`] abstracts "send one request, get one response". The
//! production implementation is [`ProcessExecutor`], which spawns the broker
//! binary; tests substitute doubles that return canned responses.

mod process;

use phantom_broker_protocol::{Request, Response};

pub use self::process::{DEFAULT_TIMEOUT, ProcessExecutor};
use crate::error::ClientError;

/// Executes a single broker request.
///
/// # Example
///
/// ```
/// use phantom_broker_client::{BrokerExecutor, ClientError};
/// use phantom_broker_protocol::{Request, Response, ResultValue};
///
/// struct AlwaysTrue;
///
/// impl BrokerExecutor for AlwaysTrue {
///     fn execute(&self, request: &Request) -> Result<Response, ClientError> {
///         Ok(Response::success(request.op(), ResultValue::Bool(true)))
///     }
/// }
/// ```
pub trait BrokerExecutor {
    /// Sends `request` to a broker and returns its decoded response.
    ///
    /// A response with `ok: false` is still `Ok` here; only transport
    /// failures are errors.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the broker cannot be run, times out,
    /// rejects the invocation, or produces undecodable output.
    fn execute(&self, request: &Request) -> Result<Response, ClientError>;
}

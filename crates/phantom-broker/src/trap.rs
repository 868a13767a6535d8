//! Converts every handler failure into a structured response.
//!
//! Nothing past a successful decode can change the exit status: I/O
//! errors, refused operations, unrepresentable results, and even handler
//! panics all become `ok: false` responses with a diagnostic on stderr.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use phantom_broker_protocol::{Request, Response};
use tracing::warn;

use crate::dispatch::dispatch;
use crate::error::BrokerError;
use crate::normalise::{Outcome, into_response};

const TRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::trap");

/// Dispatches `request` and always returns a response.
#[must_use]
pub fn execute(request: &Request) -> Response {
    run_guarded(request, dispatch)
}

/// Runs `handler` for `request`, trapping errors and panics.
pub(crate) fn run_guarded<F>(request: &Request, handler: F) -> Response
where
    F: FnOnce(&Request) -> Result<Outcome, BrokerError>,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| handler(request)))
        .unwrap_or_else(|payload| {
            Err(BrokerError::Panicked {
                message: panic_message(payload.as_ref()),
            })
        })
        .and_then(|outcome| into_response(request.op(), outcome));

    result.unwrap_or_else(|error| {
        warn!(
            target: TRAP_TARGET,
            kind = %error.kind(),
            op = request.op(),
            path = %request.path(),
            error = %error,
            "request failed"
        );
        Response::failure(Some(request.op()), error.wire_message())
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}

#[cfg(test)]
mod tests {
    use std::io;

    use phantom_broker_protocol::{RequestKind, ResultValue};

    use super::*;

    fn request(op: &str) -> Request {
        Request::new(RequestKind::Path, "/srv/x", op)
    }

    #[test]
    fn success_is_normalised() {
        let response = run_guarded(&request("exists"), |_| Ok(Outcome::Bool(true)));
        assert!(response.is_ok());
        assert_eq!(response.op(), Some("exists"));
        assert_eq!(response.result(), Some(&ResultValue::Bool(true)));
    }

    #[test]
    fn errors_become_failure_responses_that_echo_the_op() {
        let response = run_guarded(&request("stat"), |req| {
            Err(BrokerError::io(req.path(), io::Error::from(io::ErrorKind::PermissionDenied)))
        });
        assert!(!response.is_ok());
        assert_eq!(response.op(), Some("stat"));
        let error = response.error().unwrap_or_default();
        assert!(error.starts_with("PermissionDenied: "), "got: {error}");
        assert!(response.is_well_formed());
    }

    #[test]
    fn panics_become_internal_errors() {
        let response = run_guarded(&request("touch"), |_| panic!("disk on fire"));
        assert_eq!(
            response.error(),
            Some("InternalError: handler panicked: disk on fire")
        );
    }

    #[test]
    fn formatted_panics_keep_their_message() {
        let code = 7;
        let response = run_guarded(&request("touch"), |_| panic!("code {code}"));
        assert_eq!(response.error(), Some("InternalError: handler panicked: code 7"));
    }

    #[test]
    fn unknown_operations_surface_through_dispatch() {
        let response = execute(&request("chmod"));
        assert_eq!(response.error(), Some("UnknownOperation: chmod"));
        assert_eq!(response.op(), Some("chmod"));
    }
}

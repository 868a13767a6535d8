//! Routes decoded requests to the file or path handler.
//!
//! Each handler owns a closed operation enum parsed from the request's `op`
//! string. Names outside those enums are refused with `UnknownOperation`
//! before any filesystem access; there is no name-based method lookup.

mod arguments;
mod file;
mod path;

use phantom_broker_protocol::{Request, RequestKind};
use tracing::debug;

pub use self::file::FileOp;
pub use self::path::PathOp;
use crate::error::BrokerError;
use crate::normalise::Outcome;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Runs `request` against the handler for its kind.
///
/// # Errors
///
/// Returns [`BrokerError::UnknownOperation`] for an operation outside the
/// allowlist, [`BrokerError::BadArgument`] when the arguments do not bind,
/// and [`BrokerError::Io`] when the filesystem call fails.
pub fn dispatch(request: &Request) -> Result<Outcome, BrokerError> {
    debug!(
        target: DISPATCH_TARGET,
        kind = %request.kind(),
        op = request.op(),
        path = %request.path(),
        "dispatching request"
    );

    match request.kind() {
        RequestKind::File => file::handle(request),
        RequestKind::Path => path::handle(request),
    }
}

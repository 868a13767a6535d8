//! One-shot path broker for the Phantom test harness.
//!
//! The broker runs in a separate process, possibly under a different
//! privilege domain from its caller. It accepts exactly one argv payload
//! holding a base64-encoded JSON [`Request`], executes a single allowlisted
//! file or path operation, writes exactly one base64-encoded JSON
//! [`Response`] line to stdout, and exits.
//!
//! Exit status 1 is reserved for malformed invocations. Every request that
//! decodes exits 0, whether or not the operation succeeded; the caller
//! inspects `ok` to tell them apart. Diagnostics go to stderr through
//! [`tracing`] and never alter stdout.
//!
//! [`Request`]: phantom_broker_protocol::Request
//! [`Response`]: phantom_broker_protocol::Response

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use phantom_broker_protocol::{Response, codec};
use tracing::warn;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod normalise;
pub mod telemetry;
pub mod trap;

pub use config::{BrokerConfig, LogFormat};
pub use error::{BrokerError, ErrorKind};

const ENTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::entry");

/// Encoded stand-in used if a response cannot be serialised.
const UNENCODABLE_RESPONSE: &[u8] =
    br#"{"ok":false,"error":"InvalidResult: response could not be encoded"}"#;

/// Command-line surface: a single opaque payload and nothing else.
#[derive(Debug, Parser)]
#[command(
    name = "phantom-path-broker",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    #[arg(value_name = "PAYLOAD", allow_hyphen_values = true)]
    payload: String,
}

/// Runs the broker with configuration read from the environment.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_config(args, &BrokerConfig::from_env(), stdout, stderr)
}

/// Runs the broker with explicit diagnostic settings.
#[must_use]
pub fn run_with_config<I, W, E>(
    args: I,
    config: &BrokerConfig,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    if let Err(error) = telemetry::initialise(config) {
        let _ = writeln!(stderr, "phantom-path-broker: {error}");
    }

    let (response, status) = respond(args);
    let line = codec::encode_response(&response).unwrap_or_else(|error| {
        warn!(target: ENTRY_TARGET, %error, "response could not be encoded");
        codec::encode_bytes(UNENCODABLE_RESPONSE)
    });

    if let Err(error) = writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
        let _ = writeln!(stderr, "phantom-path-broker: failed to write response: {error}");
        return ExitCode::FAILURE;
    }
    status
}

fn respond<I>(args: I) -> (Response, ExitCode)
where
    I: IntoIterator<Item = OsString>,
{
    let decoded = Cli::try_parse_from(args)
        .map_err(|error| format!("{:?}", error.kind()))
        .and_then(|cli| codec::decode_request(&cli.payload).map_err(|error| error.to_string()));

    match decoded {
        Ok(request) => (trap::execute(&request), ExitCode::SUCCESS),
        Err(reason) => {
            warn!(target: ENTRY_TARGET, %reason, "rejecting malformed invocation");
            (Response::invalid_arguments(), ExitCode::from(1))
        }
    }
}

#[cfg(test)]
mod tests;

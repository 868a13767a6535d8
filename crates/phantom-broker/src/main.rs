//! Entrypoint for the `phantom-path-broker` binary.
//!
//! Delegates to [`phantom_broker::run`] with the process argv and locked
//! standard streams.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    phantom_broker::run(std::env::args_os(), &mut stdout, &mut stderr)
}

//! Runs the broker as a one-shot child process.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use phantom_broker_protocol::{Request, Response, codec};
use tracing::{debug, warn};

use super::BrokerExecutor;
use crate::error::ClientError;

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Default time a broker may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Executes requests by spawning `<program> <payload>`.
///
/// Stdout and stderr are drained on background threads while the exit is
/// polled, so a broker that floods stderr cannot stall on a full pipe.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use phantom_broker_client::{BrokerExecutor, ProcessExecutor};
/// use phantom_broker_protocol::{Request, RequestKind};
///
/// let executor = ProcessExecutor::new("/usr/libexec/phantom-path-broker")
///     .with_timeout(Duration::from_secs(5));
/// let request = Request::new(RequestKind::Path, "/etc/hosts", "exists");
/// let response = executor.execute(&request).expect("broker runs");
/// assert!(response.is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
    timeout: Duration,
}

impl ProcessExecutor {
    /// Creates an executor for the broker binary at `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the time limit for each invocation.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the broker program path.
    #[must_use]
    pub fn program(&self) -> &Path {
        self.program.as_path()
    }

    /// Returns the per-invocation time limit.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn spawn(&self, payload: &str) -> Result<Child, ClientError> {
        debug!(
            target: PROCESS_TARGET,
            program = %self.program.display(),
            payload_bytes = payload.len(),
            "spawning broker"
        );
        Command::new(&self.program)
            .arg(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ClientError::Spawn {
                program: self.program.clone(),
                source: Arc::new(source),
            })
    }
}

impl BrokerExecutor for ProcessExecutor {
    fn execute(&self, request: &Request) -> Result<Response, ClientError> {
        let payload = codec::encode_request(request).map_err(ClientError::Encode)?;
        let mut child = self.spawn(&payload)?;
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let status = wait_for_exit(&mut child, self.timeout)?;
        let stdout = collect(stdout_reader)?;
        let stderr = collect(stderr_reader)?;
        if !stderr.is_empty() {
            debug!(target: PROCESS_TARGET, stderr = %stderr.trim(), "broker stderr output");
        }

        interpret(status, &stdout, &stderr)
    }
}

fn drain(pipe: Option<impl Read + Send + 'static>) -> Option<JoinHandle<io::Result<String>>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = String::new();
            reader.read_to_string(&mut buffer).map(|_| buffer)
        })
    })
}

fn collect(handle: Option<JoinHandle<io::Result<String>>>) -> Result<String, ClientError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("pipe reader thread panicked")))
        .map_err(|source| ClientError::Io {
            source: Arc::new(source),
        })
}

/// Polls for exit, killing the child once `timeout` has elapsed.
fn wait_for_exit(child: &mut Child, timeout: Duration) -> Result<ExitStatus, ClientError> {
    let start = Instant::now();
    loop {
        let polled = child.try_wait().map_err(|source| ClientError::Io {
            source: Arc::new(source),
        })?;
        if let Some(status) = polled {
            debug!(target: PROCESS_TARGET, ?status, "broker exited");
            return Ok(status);
        }
        if start.elapsed() > timeout {
            warn!(
                target: PROCESS_TARGET,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "broker timed out, killing process"
            );
            drop(child.kill());
            drop(child.wait());
            return Err(ClientError::Timeout { timeout });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Applies the exit-status contract to the captured output.
fn interpret(status: ExitStatus, stdout: &str, stderr: &str) -> Result<Response, ClientError> {
    match status.code() {
        Some(0) => {
            let response = parse_line(stdout)?;
            if response.is_well_formed() {
                Ok(response)
            } else {
                Err(ClientError::Malformed {
                    message: String::from("response violates ok/result/error exclusivity"),
                })
            }
        }
        Some(1) => {
            let message = parse_line(stdout)
                .ok()
                .and_then(|response| response.error().map(str::to_owned))
                .unwrap_or_else(|| stderr.trim().to_owned());
            Err(ClientError::Rejected { message })
        }
        code => Err(ClientError::NonZeroExit {
            status: code.unwrap_or(-1),
            stderr: stderr.trim().to_owned(),
        }),
    }
}

/// Decodes exactly one stdout line.
fn parse_line(stdout: &str) -> Result<Response, ClientError> {
    let mut lines = stdout.lines();
    let Some(line) = lines.next() else {
        return Err(ClientError::Malformed {
            message: String::from("broker produced no output on stdout"),
        });
    };
    if lines.next().is_some() {
        return Err(ClientError::Malformed {
            message: String::from("broker produced more than one stdout line"),
        });
    }
    codec::decode_response(line).map_err(ClientError::Decode)
}

//! In-process tests of the broker entry point and BDD scenarios.

use std::ffi::OsString;
use std::process::ExitCode;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use camino::Utf8PathBuf;
use phantom_broker_protocol::{Request, RequestKind, Response, ResultValue, Scalar, codec};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::{BrokerConfig, run_with_config};


/// Captured result of one in-process invocation.
pub(crate) struct Invocation {
    pub(crate) status: ExitCode,
    pub(crate) stdout: String,
    pub(crate) response: Response,
}

/// Runs the broker in-process with raw argv elements after the program name.
pub(crate) fn invoke_raw(arguments: &[&str]) -> Invocation {
    let args = std::iter::once("phantom-path-broker")
        .chain(arguments.iter().copied())
        .map(OsString::from);
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let status = run_with_config(args, &BrokerConfig::default(), &mut stdout, &mut stderr);
    let text = String::from_utf8(stdout).expect("stdout is UTF-8");
    let response = codec::decode_response(&text).expect("stdout decodes");
    Invocation {
        status,
        stdout: text,
        response,
    }
}

/// Encodes `request` and runs the broker on it.
pub(crate) fn invoke(request: &Request) -> Invocation {
    let payload = codec::encode_request(request).expect("encode request");
    invoke_raw(&[payload.as_str()])
}

#[fixture]
fn workspace() -> TempDir {
    TempDir::new().expect("temp dir")
}

fn path_in(dir: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 temp path")
}

#[rstest]
fn read_after_write_returns_the_content(workspace: TempDir) {
    let target = path_in(&workspace, "x");
    let write = invoke(
        &Request::new(RequestKind::File, target.clone(), "write")
            .with_args(vec![Scalar::from("hello")]),
    );
    assert_eq!(write.status, ExitCode::SUCCESS);
    assert_eq!(write.response, Response::success("write", ResultValue::Null));

    let read = invoke(&Request::new(RequestKind::File, target, "read"));
    assert_eq!(
        read.response,
        Response::success("read", ResultValue::Text(String::from("hello")))
    );
}

#[rstest]
fn missing_path_is_a_semantic_failure(workspace: TempDir) {
    let request = Request::new(RequestKind::Path, path_in(&workspace, "nope"), "stat");
    let outcome = invoke(&request);
    assert_eq!(outcome.status, ExitCode::SUCCESS);
    assert!(!outcome.response.is_ok());
    let error = outcome.response.error().unwrap_or_default();
    assert!(error.starts_with("NotFound"), "got: {error}");
}

#[rstest]
#[case(&[])]
#[case(&["a", "b"])]
#[case(&["!!!not base64!!!"])]
#[case(&[""])]
#[case(&["--help"])]
#[case(&["--version"])]
fn malformed_invocations_exit_one(#[case] arguments: &[&str]) {
    let outcome = invoke_raw(arguments);
    assert_eq!(outcome.status, ExitCode::from(1));
    assert_eq!(outcome.response, Response::invalid_arguments());
}

#[test]
fn schema_violations_are_invalid_arguments() {
    let payload = STANDARD.encode(r#"{"kind":"socket","path":"/","op":"exists"}"#);
    let outcome = invoke_raw(&[payload.as_str()]);
    assert_eq!(outcome.status, ExitCode::from(1));
    assert!(outcome.response.op().is_none());
}

#[rstest]
fn repeated_keyword_names_are_refused_before_dispatch(workspace: TempDir) {
    let target = path_in(&workspace, "kept");
    std::fs::write(&target, "x").expect("seed");
    let raw = format!(
        r#"{{"kind":"path","path":"{target}","op":"unlink","kwargs":{{"missing_ok":false,"missing_ok":true}}}}"#
    );
    let outcome = invoke_raw(&[STANDARD.encode(raw).as_str()]);
    assert_eq!(outcome.status, ExitCode::from(1));
    assert_eq!(outcome.response, Response::invalid_arguments());
    assert!(target.is_file(), "nothing may be dispatched");
}

#[test]
fn surrounding_whitespace_in_the_payload_is_tolerated() {
    let request = Request::new(RequestKind::Path, "/", "is_absolute");
    let payload = format!(" {}\n", codec::encode_request(&request).expect("encode"));
    let outcome = invoke_raw(&[payload.as_str()]);
    assert_eq!(outcome.status, ExitCode::SUCCESS);
    assert_eq!(outcome.response.result(), Some(&ResultValue::Bool(true)));
}

#[test]
fn stdout_is_exactly_one_line() {
    let outcome = invoke(&Request::new(RequestKind::Path, "/etc", "chmod"));
    assert!(outcome.stdout.ends_with('\n'));
    assert_eq!(outcome.stdout.lines().count(), 1);
    assert!(!outcome.stdout.trim_end().contains(char::is_whitespace));
}

#[test]
fn failed_stdout_write_reports_failure() {
    struct Closed;

    impl std::io::Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let mut stderr = Vec::new();
    let status = run_with_config(
        [OsString::from("phantom-path-broker")],
        &BrokerConfig::default(),
        &mut Closed,
        &mut stderr,
    );
    assert_eq!(status, ExitCode::FAILURE);
    let message = String::from_utf8(stderr).expect("stderr is UTF-8");
    assert!(message.contains("failed to write response"), "got: {message}");
}

//! Integration tests for the `phantom-path-broker` binary entry point.
//!
//! Drives the compiled binary through the end-to-end request scenarios and
//! checks the stdout framing and exit status contract.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use camino::Utf8PathBuf;
use phantom_broker_protocol::{Request, RequestKind, Response, ResultValue, Scalar, codec};
use predicates::prelude::*;
use tempfile::TempDir;

fn utf8(dir: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 temp path")
}

/// Runs the binary on `request`, asserting exit 0 and one stdout line.
fn broker(request: &Request) -> Response {
    let payload = codec::encode_request(request).expect("encode request");
    let mut command = cargo_bin_cmd!("phantom-path-broker");
    command.arg(payload);
    let assert = command
        .assert()
        .success()
        .stdout(predicate::str::ends_with("\n"));
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8 stdout");
    assert_eq!(stdout.lines().count(), 1, "stdout: {stdout:?}");
    codec::decode_response(&stdout).expect("decodable response")
}

#[test]
fn read_after_write() {
    let dir = TempDir::new().expect("temp dir");
    let target = utf8(&dir, "x");

    let written = broker(
        &Request::new(RequestKind::File, target.clone(), "write")
            .with_args(vec![Scalar::from("hello")]),
    );
    assert_eq!(written, Response::success("write", ResultValue::Null));

    let read = broker(&Request::new(RequestKind::File, target, "read"));
    assert_eq!(
        read,
        Response::success("read", ResultValue::Text(String::from("hello")))
    );
}

#[test]
fn existence_probe_on_missing_path() {
    let dir = TempDir::new().expect("temp dir");
    let response = broker(&Request::new(RequestKind::Path, utf8(&dir, "nope"), "exists"));
    assert_eq!(response, Response::success("exists", ResultValue::Bool(false)));
}

#[test]
fn mkdir_is_idempotent() {
    let dir = TempDir::new().expect("temp dir");
    let request = Request::new(RequestKind::Path, utf8(&dir, "d/e"), "mkdir")
        .with_kwarg("parents", true)
        .with_kwarg("exist_ok", true);
    for _ in 0..2 {
        assert_eq!(broker(&request), Response::success("mkdir", ResultValue::Null));
    }
}

#[test]
fn refused_operation_exits_zero() {
    let request =
        Request::new(RequestKind::Path, "/etc", "chmod").with_args(vec![Scalar::Integer(0)]);
    let response = broker(&request);
    assert!(!response.is_ok());
    assert_eq!(response.error(), Some("UnknownOperation: chmod"));
}

#[test]
fn missing_payload_exits_one() {
    let mut command = cargo_bin_cmd!("phantom-path-broker");
    let assert = command.assert().code(1);
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8 stdout");
    let response = codec::decode_response(&stdout).expect("decodable response");
    assert_eq!(response, Response::invalid_arguments());
}

#[test]
fn extra_arguments_exit_one() {
    let mut command = cargo_bin_cmd!("phantom-path-broker");
    command.args(["one", "two"]);
    command.assert().code(1).stdout(predicate::str::is_empty().not());
}

#[test]
fn directory_listing() {
    let dir = TempDir::new().expect("temp dir");
    let listing_dir = utf8(&dir, "e");
    fs::create_dir(&listing_dir).expect("create directory");
    fs::write(listing_dir.join("a"), "a").expect("seed a");
    fs::write(listing_dir.join("b"), "b").expect("seed b");

    let response = broker(&Request::new(RequestKind::Path, listing_dir.clone(), "iterdir"));
    let mut entries = response
        .result()
        .and_then(ResultValue::as_list)
        .expect("list result")
        .to_vec();
    entries.sort();
    assert_eq!(
        entries,
        vec![
            listing_dir.join("a").into_string(),
            listing_dir.join("b").into_string()
        ]
    );
}

#[test]
fn failures_are_traced_to_stderr_only() {
    let dir = TempDir::new().expect("temp dir");
    let request = Request::new(RequestKind::Path, utf8(&dir, "nope"), "stat");
    let payload = codec::encode_request(&request).expect("encode request");
    let mut command = cargo_bin_cmd!("phantom-path-broker");
    command
        .env("PHANTOM_BROKER_LOG", "warn")
        .env("PHANTOM_BROKER_LOG_FORMAT", "json")
        .arg(payload);
    command
        .assert()
        .success()
        .stderr(predicate::str::contains("request failed"))
        .stdout(predicate::str::contains("request failed").not());
}

#[test]
fn compact_traces_carry_no_colour_codes() {
    let dir = TempDir::new().expect("temp dir");
    let request = Request::new(RequestKind::Path, utf8(&dir, "nope"), "rmdir");
    let payload = codec::encode_request(&request).expect("encode request");
    let mut command = cargo_bin_cmd!("phantom-path-broker");
    command
        .env("PHANTOM_BROKER_LOG", "warn")
        .env("PHANTOM_BROKER_LOG_FORMAT", "compact")
        .arg(payload);
    command
        .assert()
        .success()
        .stderr(predicate::str::contains("request failed"))
        .stderr(predicate::str::contains("\u{1b}[").not());
}

#[test]
fn diagnostic_settings_never_change_the_response() {
    let dir = TempDir::new().expect("temp dir");
    let request = Request::new(RequestKind::Path, utf8(&dir, "nope"), "exists");
    let payload = codec::encode_request(&request).expect("encode request");

    let mut bare = cargo_bin_cmd!("phantom-path-broker");
    bare.env_clear().arg(&payload);
    let baseline = bare.assert().success().get_output().stdout.clone();

    let mut tuned = cargo_bin_cmd!("phantom-path-broker");
    tuned
        .env("PHANTOM_BROKER_LOG", "trace")
        .env("PHANTOM_BROKER_LOG_FORMAT", "not-a-format")
        .arg(&payload);
    tuned.assert().success().stdout(baseline);
}

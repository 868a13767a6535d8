//! Unit tests for client error classification.

use rstest::rstest;

use super::*;

#[rstest]
#[case("NotFound: [Errno 2] '/tmp/nope'", "NotFound", "[Errno 2] '/tmp/nope'")]
#[case("UnknownOperation: chmod", "UnknownOperation", "chmod")]
#[case("InternalError: handler panicked: a: b", "InternalError", "handler panicked: a: b")]
#[case("Invalid arguments", "Invalid arguments", "")]
fn wire_errors_split_on_the_first_separator(
    #[case] wire: &str,
    #[case] expected_kind: &str,
    #[case] expected_message: &str,
) {
    let error = ClientError::from_wire(wire);
    assert_eq!(error.operation_kind(), Some(expected_kind));
    let ClientError::Operation { message, .. } = &error else {
        panic!("expected an operation error");
    };
    assert_eq!(message, expected_message);
}

#[test]
fn operation_errors_render_like_the_wire() {
    let error = ClientError::from_wire("PermissionDenied: '/root'");
    assert_eq!(error.to_string(), "PermissionDenied: '/root'");
}

#[test]
fn transport_errors_have_no_operation_kind() {
    let error = ClientError::Timeout {
        timeout: Duration::from_millis(250),
    };
    assert!(error.operation_kind().is_none());
    assert_eq!(error.to_string(), "broker timed out after 250ms");
}

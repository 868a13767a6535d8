//! Unit tests for the typed client over a mocked executor.

use camino::{Utf8Path, Utf8PathBuf};
use mockall::mock;
use mockall::predicate::function;
use phantom_broker_protocol::{
    PayloadEncoding, Request, RequestKind, Response, ResultValue, Scalar, StatRecord,
};
use rstest::rstest;

use super::*;

mock! {
    Executor {}
    impl BrokerExecutor for Executor {
        fn execute(&self, request: &Request) -> Result<Response, ClientError>;
    }
}

/// Builds a client whose executor expects one request matching `check`.
fn client_expecting(
    check: impl Fn(&Request) -> bool + Send + 'static,
    response: Response,
) -> BrokerClient<MockExecutor> {
    let mut executor = MockExecutor::new();
    executor
        .expect_execute()
        .with(function(check))
        .once()
        .return_once(move |_| Ok(response));
    BrokerClient::new(executor)
}

fn target() -> &'static Utf8Path {
    Utf8Path::new("/srv/data")
}

#[test]
fn file_write_sends_content_as_the_first_argument() {
    let client = client_expecting(
        |request| {
            request.kind() == RequestKind::File
                && request.op() == "write"
                && request.args() == [Scalar::from("hello")]
        },
        Response::success("write", ResultValue::Null),
    );
    client.file(target()).write("hello").expect("write");
}

#[test]
fn file_read_returns_the_text() {
    let client = client_expecting(
        |request| request.op() == "read" && request.args().is_empty(),
        Response::success("read", ResultValue::Text(String::from("hello"))),
    );
    assert_eq!(client.file(target()).read().expect("read"), "hello");
}

#[test]
fn mkdir_sends_both_flags_as_keywords() {
    let client = client_expecting(
        |request| {
            request.kwargs().get("parents") == Some(&Scalar::Bool(true))
                && request.kwargs().get("exist_ok") == Some(&Scalar::Bool(false))
        },
        Response::success("mkdir", ResultValue::Null),
    );
    client.path(target()).mkdir(true, false).expect("mkdir");
}

#[rstest]
#[case("NotFound: [Errno 2] No such file or directory: '/srv/data'", "NotFound")]
#[case("UnknownOperation: exists", "UnknownOperation")]
fn failure_responses_become_operation_errors(#[case] wire: &'static str, #[case] kind: &str) {
    let client = client_expecting(
        |request| request.op() == "exists",
        Response::failure(Some("exists"), wire),
    );
    let error = client.path(target()).exists().expect_err("failure");
    assert_eq!(error.operation_kind(), Some(kind));
}

#[test]
fn mismatched_result_shapes_are_reported() {
    let client = client_expecting(
        |request| request.op() == "is_dir",
        Response::success("is_dir", ResultValue::Text(String::from("yes"))),
    );
    let error = client.path(target()).is_dir().expect_err("wrong shape");
    assert!(matches!(error, ClientError::UnexpectedResult { expected: "a boolean", .. }));
}

#[test]
fn iterdir_returns_paths_in_broker_order() {
    let listing = vec![String::from("/srv/data/b"), String::from("/srv/data/a")];
    let client = client_expecting(
        |request| request.op() == "iterdir",
        Response::success("iterdir", ResultValue::List(listing)),
    );
    let entries = client.path(target()).iterdir().expect("iterdir");
    assert_eq!(
        entries,
        vec![
            Utf8PathBuf::from("/srv/data/b"),
            Utf8PathBuf::from("/srv/data/a")
        ]
    );
}

#[test]
fn read_bytes_requires_the_base64_tag() {
    let client = client_expecting(
        |request| request.op() == "read_bytes",
        Response::success("read_bytes", ResultValue::Text(String::from("AP8="))),
    );
    assert!(client.path(target()).read_bytes().is_err());

    let tagged = client_expecting(
        |request| request.op() == "read_bytes",
        Response::success_encoded("read_bytes", "AP8=", PayloadEncoding::Base64),
    );
    assert_eq!(tagged.path(target()).read_bytes().expect("bytes"), vec![0x00, 0xff]);
}

#[test]
fn write_text_returns_the_character_count() {
    let client = client_expecting(
        |request| request.op() == "write_text",
        Response::success("write_text", ResultValue::Integer(3)),
    );
    assert_eq!(client.path(target()).write_text("\u{e9}t\u{e9}").expect("write"), 3);
}

#[test]
fn stat_unwraps_the_record() {
    let record = StatRecord {
        size: 12,
        mode: 0o100_644,
        mtime: 1_700_000_000,
        ..StatRecord::default()
    };
    let client = client_expecting(
        |request| request.op() == "stat",
        Response::success("stat", ResultValue::Stat(record.clone())),
    );
    assert_eq!(client.path(target()).stat().expect("stat"), record);
}

#[test]
fn rename_sends_the_target_and_returns_it() {
    let client = client_expecting(
        |request| request.op() == "rename" && request.args() == [Scalar::from("/srv/new")],
        Response::success("rename", ResultValue::Text(String::from("/srv/new"))),
    );
    let moved = client
        .path(target())
        .rename(Utf8Path::new("/srv/new"))
        .expect("rename");
    assert_eq!(moved, Utf8PathBuf::from("/srv/new"));
}

#[test]
fn transport_errors_pass_through_call() {
    let mut executor = MockExecutor::new();
    executor.expect_execute().once().return_once(|_| {
        Err(ClientError::Rejected {
            message: String::from("Invalid arguments"),
        })
    });
    let client = BrokerClient::new(executor);
    let request = Request::new(RequestKind::Path, "/", "exists");
    assert!(matches!(
        client.call(&request),
        Err(ClientError::Rejected { .. })
    ));
}

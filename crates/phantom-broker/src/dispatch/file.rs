//! Whole-file text operations.
//!
//! Text is UTF-8 with no newline translation. Every handle is scoped to the
//! operation and closed on all exit paths.

use std::fs::{self, OpenOptions};
use std::io::Write;

use phantom_broker_protocol::Request;
use strum::{Display, EnumString};

use super::arguments::Bound;
use crate::error::BrokerError;
use crate::normalise::Outcome;

/// Operations accepted for `kind: "file"` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FileOp {
    /// Returns the full contents as text.
    Read,
    /// Truncates and writes the given text.
    Write,
    /// Appends the given text, creating the file if needed.
    Append,
}

const CONTENT: &[&str] = &["data"];

pub(super) fn handle(request: &Request) -> Result<Outcome, BrokerError> {
    let op: FileOp = request
        .op()
        .parse()
        .map_err(|_| BrokerError::unknown_operation(request.op()))?;
    let path = request.path();

    match op {
        FileOp::Read => {
            Bound::bind(request, &[])?;
            fs::read_to_string(path)
                .map(Outcome::Text)
                .map_err(|error| BrokerError::io(path, error))
        }
        FileOp::Write | FileOp::Append => {
            let args = Bound::bind(request, CONTENT)?;
            let content = args.text("data")?.unwrap_or_default();
            let mut options = OpenOptions::new();
            if op == FileOp::Write {
                options.write(true).truncate(true);
            } else {
                options.append(true);
            }
            let mut file = options
                .create(true)
                .open(path)
                .map_err(|error| BrokerError::io(path, error))?;
            file.write_all(content.as_bytes())
                .map_err(|error| BrokerError::io(path, error))?;
            Ok(Outcome::Unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use phantom_broker_protocol::{RequestKind, Scalar};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn workspace() -> TempDir {
        TempDir::new().expect("temp dir")
    }

    fn target(dir: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 temp path")
    }

    fn file_request(path: &Utf8PathBuf, op: &str) -> Request {
        Request::new(RequestKind::File, path.clone(), op)
    }

    #[rstest]
    fn write_truncates_existing_content(workspace: TempDir) {
        let path = target(&workspace, "x");
        fs::write(&path, "a much longer original").expect("seed");
        let request = file_request(&path, "write").with_args(vec![Scalar::from("short")]);
        assert_eq!(handle(&request).expect("write"), Outcome::Unit);
        assert_eq!(fs::read_to_string(&path).expect("read back"), "short");
    }

    #[rstest]
    fn append_accepts_the_data_keyword(workspace: TempDir) {
        let path = target(&workspace, "log");
        fs::write(&path, "one\n").expect("seed");
        let request = file_request(&path, "append").with_kwarg("data", "two\r\n");
        handle(&request).expect("append");
        assert_eq!(fs::read_to_string(&path).expect("read back"), "one\ntwo\r\n");
    }

    #[rstest]
    fn write_without_content_empties_the_file(workspace: TempDir) {
        let path = target(&workspace, "empty");
        fs::write(&path, "data").expect("seed");
        handle(&file_request(&path, "write")).expect("write");
        assert_eq!(fs::metadata(&path).expect("stat").len(), 0);
    }

    #[rstest]
    fn read_returns_exact_text(workspace: TempDir) {
        let path = target(&workspace, "text");
        fs::write(&path, "héllo\r\nworld").expect("seed");
        let outcome = handle(&file_request(&path, "read")).expect("read");
        assert_eq!(outcome, Outcome::Text(String::from("héllo\r\nworld")));
    }

    #[rstest]
    fn read_of_a_missing_file_is_not_found(workspace: TempDir) {
        let path = target(&workspace, "absent");
        let error = handle(&file_request(&path, "read")).expect_err("missing");
        assert!(error.wire_message().starts_with("NotFound: "));
    }

    #[rstest]
    fn read_rejects_arguments(workspace: TempDir) {
        let path = target(&workspace, "x");
        let request = file_request(&path, "read").with_args(vec![Scalar::Integer(10)]);
        let error = handle(&request).expect_err("surplus");
        assert!(error.wire_message().starts_with("BadArgument: "));
    }

    #[rstest]
    #[case("readline")]
    #[case("truncate")]
    #[case("Read")]
    fn other_names_are_unknown(workspace: TempDir, #[case] op: &str) {
        let path = target(&workspace, "x");
        let error = handle(&file_request(&path, op)).expect_err("refused");
        assert_eq!(error.wire_message(), format!("UnknownOperation: {op}"));
    }
}

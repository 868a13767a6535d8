//! Handles bound to one remote path.

use camino::{Utf8Path, Utf8PathBuf};
use phantom_broker_protocol::{
    PayloadEncoding, Request, RequestKind, ResultValue, Scalar, StatRecord, codec,
};

use super::BrokerClient;
use crate::error::ClientError;
use crate::executor::BrokerExecutor;

fn unexpected(op: &str, expected: &'static str) -> ClientError {
    ClientError::UnexpectedResult {
        op: op.to_owned(),
        expected,
    }
}

fn expect_null(op: &str, value: &ResultValue) -> Result<(), ClientError> {
    if *value == ResultValue::Null {
        Ok(())
    } else {
        Err(unexpected(op, "null"))
    }
}

fn expect_text(op: &str, value: ResultValue) -> Result<String, ClientError> {
    match value {
        ResultValue::Text(text) => Ok(text),
        _ => Err(unexpected(op, "a string")),
    }
}

/// `kind: "file"` operations.
#[derive(Debug)]
pub struct RemoteFile<'a, E> {
    client: &'a BrokerClient<E>,
    path: &'a Utf8Path,
}

impl<'a, E: BrokerExecutor> RemoteFile<'a, E> {
    pub(super) const fn new(client: &'a BrokerClient<E>, path: &'a Utf8Path) -> Self {
        Self { client, path }
    }

    fn request(&self, op: &str) -> Request {
        Request::new(RequestKind::File, self.path, op)
    }

    /// Reads the whole file as text.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn read(&self) -> Result<String, ClientError> {
        expect_text("read", self.client.value(&self.request("read"))?)
    }

    /// Replaces the file's contents.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn write(&self, content: &str) -> Result<(), ClientError> {
        let request = self.request("write").with_args(vec![Scalar::from(content)]);
        expect_null("write", &self.client.value(&request)?)
    }

    /// Appends to the file, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn append(&self, content: &str) -> Result<(), ClientError> {
        let request = self.request("append").with_args(vec![Scalar::from(content)]);
        expect_null("append", &self.client.value(&request)?)
    }
}

/// `kind: "path"` operations.
#[derive(Debug)]
pub struct RemotePath<'a, E> {
    client: &'a BrokerClient<E>,
    path: &'a Utf8Path,
}

impl<'a, E: BrokerExecutor> RemotePath<'a, E> {
    pub(super) const fn new(client: &'a BrokerClient<E>, path: &'a Utf8Path) -> Self {
        Self { client, path }
    }

    fn request(&self, op: &str) -> Request {
        Request::new(RequestKind::Path, self.path, op)
    }

    fn flag(&self, op: &str) -> Result<bool, ClientError> {
        self.client
            .value(&self.request(op))?
            .as_bool()
            .ok_or_else(|| unexpected(op, "a boolean"))
    }

    /// Whether the path exists.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn exists(&self) -> Result<bool, ClientError> {
        self.flag("exists")
    }

    /// Whether the path is a regular file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn is_file(&self) -> Result<bool, ClientError> {
        self.flag("is_file")
    }

    /// Whether the path is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn is_dir(&self) -> Result<bool, ClientError> {
        self.flag("is_dir")
    }

    /// Creates the directory.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn mkdir(&self, parents: bool, exist_ok: bool) -> Result<(), ClientError> {
        let request = self
            .request("mkdir")
            .with_kwarg("parents", parents)
            .with_kwarg("exist_ok", exist_ok);
        expect_null("mkdir", &self.client.value(&request)?)
    }

    /// Lists the directory in host enumeration order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn iterdir(&self) -> Result<Vec<Utf8PathBuf>, ClientError> {
        let value = self.client.value(&self.request("iterdir"))?;
        let entries = value
            .as_list()
            .ok_or_else(|| unexpected("iterdir", "a list"))?;
        Ok(entries.iter().map(Utf8PathBuf::from).collect())
    }

    /// Reads the file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn read_text(&self) -> Result<String, ClientError> {
        expect_text("read_text", self.client.value(&self.request("read_text"))?)
    }

    /// Writes UTF-8 text and returns the number of characters written.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn write_text(&self, content: &str) -> Result<usize, ClientError> {
        let request = self
            .request("write_text")
            .with_args(vec![Scalar::from(content)]);
        self.client
            .value(&request)?
            .as_integer()
            .and_then(|count| usize::try_from(count).ok())
            .ok_or_else(|| unexpected("write_text", "a character count"))
    }

    /// Reads the file as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure, or when the
    /// result is not tagged as base64.
    pub fn read_bytes(&self) -> Result<Vec<u8>, ClientError> {
        let response = self.client.call(&self.request("read_bytes"))?;
        if response.encoding() != Some(PayloadEncoding::Base64) {
            return Err(unexpected("read_bytes", "base64-encoded bytes"));
        }
        let encoded = response
            .result()
            .and_then(ResultValue::as_str)
            .ok_or_else(|| unexpected("read_bytes", "base64-encoded bytes"))?;
        codec::decode_bytes(encoded).map_err(ClientError::Decode)
    }

    /// Removes the file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn unlink(&self, missing_ok: bool) -> Result<(), ClientError> {
        let request = self.request("unlink").with_kwarg("missing_ok", missing_ok);
        expect_null("unlink", &self.client.value(&request)?)
    }

    /// Renames the path and returns the new location.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn rename(&self, target: &Utf8Path) -> Result<Utf8PathBuf, ClientError> {
        let request = self
            .request("rename")
            .with_args(vec![Scalar::from(target.as_str())]);
        expect_text("rename", self.client.value(&request)?).map(Utf8PathBuf::from)
    }

    /// Resolves the path to its canonical absolute form.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn resolve(&self, strict: bool) -> Result<Utf8PathBuf, ClientError> {
        let request = self.request("resolve").with_kwarg("strict", strict);
        expect_text("resolve", self.client.value(&request)?).map(Utf8PathBuf::from)
    }

    /// Returns file metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or operation failure.
    pub fn stat(&self) -> Result<StatRecord, ClientError> {
        match self.client.value(&self.request("stat"))? {
            ResultValue::Stat(record) => Ok(record),
            _ => Err(unexpected("stat", "a stat record")),
        }
    }
}

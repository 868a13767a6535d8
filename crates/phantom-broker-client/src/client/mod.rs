//! Typed access to the broker's file and path operations.

mod remote;

use camino::Utf8Path;
use phantom_broker_protocol::{Request, Response, ResultValue};

pub use self::remote::{RemoteFile, RemotePath};
use crate::error::ClientError;
use crate::executor::BrokerExecutor;

/// Builds requests and turns failure responses into errors.
#[derive(Debug, Clone)]
pub struct BrokerClient<E> {
    executor: E,
}

impl<E: BrokerExecutor> BrokerClient<E> {
    /// Wraps `executor`.
    #[must_use]
    pub const fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Returns the underlying executor.
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Sends any request and returns the successful response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Operation`] when the broker reports `ok: false`
    /// and the executor's transport errors otherwise.
    pub fn call(&self, request: &Request) -> Result<Response, ClientError> {
        let response = self.executor.execute(request)?;
        if response.is_ok() {
            return Ok(response);
        }
        Err(response.error().map_or_else(
            || ClientError::Malformed {
                message: String::from("failure response without an error string"),
            },
            ClientError::from_wire,
        ))
    }

    /// Returns a handle for `kind: "file"` operations on `path`.
    #[must_use]
    pub fn file<'a>(&'a self, path: &'a Utf8Path) -> RemoteFile<'a, E> {
        RemoteFile::new(self, path)
    }

    /// Returns a handle for `kind: "path"` operations on `path`.
    #[must_use]
    pub fn path<'a>(&'a self, path: &'a Utf8Path) -> RemotePath<'a, E> {
        RemotePath::new(self, path)
    }

    fn value(&self, request: &Request) -> Result<ResultValue, ClientError> {
        self.call(request)?
            .result()
            .cloned()
            .ok_or_else(|| ClientError::Malformed {
                message: String::from("success response without a result"),
            })
    }
}

#[cfg(test)]
mod tests;

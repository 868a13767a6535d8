//! Caller-side helper for the Phantom path broker.
//!
//! The broker is a one-shot process that performs a single allowlisted
//! filesystem operation, possibly under a different privilege domain from
//! the caller. This crate spawns it, enforces a timeout, decodes the single
//! response line, and exposes the common operations as typed methods.
//!
//! # Example
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use phantom_broker_client::{BrokerClient, ProcessExecutor};
//!
//! let client = BrokerClient::new(ProcessExecutor::new("phantom-path-broker"));
//! let config = client.path(Utf8Path::new("/etc/phantom/wg0.conf"));
//! if config.exists().expect("broker runs") {
//!     let text = config.read_text().expect("readable");
//!     println!("{text}");
//! }
//! ```

pub mod client;
pub mod error;
pub mod executor;

pub use self::client::{BrokerClient, RemoteFile, RemotePath};
pub use self::error::ClientError;
pub use self::executor::{BrokerExecutor, DEFAULT_TIMEOUT, ProcessExecutor};

//! Wire protocol shared by the Phantom path broker and its callers.
//!
//! The broker is a one-shot process: the caller passes a single argv element
//! holding `base64(utf8(json(Request)))` and reads back exactly one stdout
//! line holding `base64(utf8(json(Response)))`. Both records are inert JSON;
//! decoding never constructs anything beyond the plain data types declared
//! here.
//!
//! # Example
//!
//! ```
//! use phantom_broker_protocol::{Request, RequestKind, Scalar, codec};
//!
//! let request = Request::new(RequestKind::File, "/tmp/x", "write")
//!     .with_args(vec![Scalar::from("hello")]);
//! let payload = codec::encode_request(&request).expect("encode");
//! let back = codec::decode_request(&payload).expect("decode");
//! assert_eq!(back, request);
//! ```

pub mod codec;
pub mod request;
pub mod response;

pub use self::codec::CodecError;
pub use self::request::{Request, RequestKind, Scalar};
pub use self::response::{PayloadEncoding, Response, ResultValue, StatRecord};

//! Signed JSON RPC client core.
//!
//! # Overview
//! POSTs a JSON body to `<base path>?do=<method>`, optionally compressed
//! (gzip / deflate) and authenticated with either a digest signature or
//! cleartext credentials, then checks, decompresses and parses the reply.
//!
//! # Design
//! - `RpcClient` is stateless: it holds the parsed `Endpoint` and an
//!   immutable `ClientConfig`.
//! - A call is split into `build_call` (pure), `call` (I/O through a
//!   `Transport`), `decode` and `parse`, so every stage is testable alone.
//! - `UreqTransport` opens a fresh connection per call; there is no pooling,
//!   retry or timeout.

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod transport;

pub use client::{parse, RpcClient};
pub use config::{AuthMode, ClientConfig, Compression, Credentials, DigestAlgorithm};
pub use endpoint::{Endpoint, Scheme};
pub use error::RpcError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};

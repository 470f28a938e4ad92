//! Error types for the signed RPC client.
//!
//! # Design
//! Every failure mode of construct / call / decode / parse gets its own
//! variant so callers can match on the stage that failed. Variants that come
//! from the server (`Status`, `Parse`) keep the raw bytes for diagnostics.
//! Nothing in this crate retries; errors go straight back to the caller.

use thiserror::Error;

/// Errors returned by `RpcClient` and its helpers.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Bad URL, unsupported scheme or unknown compression name.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The server answered with something other than 200.
    #[error("invalid response status {code}")]
    Status { code: u16, data: Vec<u8> },

    /// The response `Content-Encoding` is neither gzip nor deflate.
    #[error("unsupported encoding {0}")]
    UnsupportedEncoding(String),

    /// The decoded body is not UTF-8 JSON.
    #[error("invalid response data: {reason}")]
    Parse { data: Vec<u8>, reason: String },

    /// The request parameters could not be serialized or compressed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A compressed response body could not be inflated.
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// Connecting, sending or reading the response failed.
    #[error("transport error: {0}")]
    Transport(String),
}

impl RpcError {
    /// Raw response bytes carried by `Status` and `Parse`, if any.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            RpcError::Status { data, .. } | RpcError::Parse { data, .. } => Some(data),
            _ => None,
        }
    }
}

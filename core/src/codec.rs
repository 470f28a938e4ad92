//! gzip / deflate body codec.
//!
//! "deflate" on the wire is the zlib-wrapped stream (RFC 1950), which is what
//! PHP's `gzcompress` and Python's `zlib.compress` produce.

use std::io::{Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

use crate::config::Compression;
use crate::error::RpcError;

pub fn compress(algorithm: Compression, data: &[u8]) -> Result<Vec<u8>, RpcError> {
    let level = flate2::Compression::default();
    let result = match algorithm {
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), level);
            encoder.write_all(data).and_then(|_| encoder.finish())
        }
        Compression::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), level);
            encoder.write_all(data).and_then(|_| encoder.finish())
        }
    };
    result.map_err(|e| RpcError::Serialization(format!("{algorithm} compression: {e}")))
}

pub fn decompress(algorithm: Compression, data: &[u8]) -> Result<Vec<u8>, RpcError> {
    let mut out = Vec::new();
    let result = match algorithm {
        Compression::Gzip => GzDecoder::new(data).read_to_end(&mut out),
        Compression::Deflate => ZlibDecoder::new(data).read_to_end(&mut out),
    };
    result
        .map(|_| out)
        .map_err(|e| RpcError::Decompression(format!("{algorithm}: {e}")))
}

/// Decode a body according to its `Content-Encoding` header value.
///
/// `None` or an empty value means identity.
pub fn decode_content(encoding: Option<&str>, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
    match encoding.map(str::trim) {
        None | Some("") => Ok(data),
        Some(name) => {
            let algorithm = match name.to_ascii_lowercase().as_str() {
                "gzip" => Compression::Gzip,
                "deflate" => Compression::Deflate,
                _ => return Err(RpcError::UnsupportedEncoding(name.to_string())),
            };
            decompress(algorithm, &data)
        }
    }
}

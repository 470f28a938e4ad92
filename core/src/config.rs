//! Client configuration captured once at construction.
//!
//! # Design
//! Every knob the client honours lives in `ClientConfig`; nothing is read
//! from globals at call time. Choices that arrive as strings (CLI flags) go
//! through `FromStr`, which is where unknown names are rejected with
//! `RpcError::Configuration`.

use std::fmt;
use std::str::FromStr;

use crate::error::RpcError;

/// How credentials are presented to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// `X-Auth-User` plus a digest over user, password and body.
    #[default]
    Sign,
    /// `X-Auth-User` and `X-Auth-Pass` in cleartext. Only safe over TLS.
    Plain,
}

impl FromStr for AuthMode {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sign" => Ok(AuthMode::Sign),
            "plain" => Ok(AuthMode::Plain),
            other => Err(RpcError::Configuration(format!("unknown auth type {other}"))),
        }
    }
}

/// Body compression algorithm, used for `Content-Encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    /// zlib-wrapped deflate stream.
    Deflate,
}

impl Compression {
    /// Token used in `Content-Encoding` / `Accept-Encoding`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Deflate => "deflate",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gzip" => Ok(Compression::Gzip),
            "deflate" => Ok(Compression::Deflate),
            other => Err(RpcError::Configuration(format!("unknown compression {other}"))),
        }
    }
}

/// Hash used for `AuthMode::Sign`.
///
/// DoPhp servers verify SHA-1; SHA-512 is available for servers that were
/// configured for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    #[default]
    Sha1,
    Sha512,
}

impl FromStr for DigestAlgorithm {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            other => Err(RpcError::Configuration(format!("unknown digest {other}"))),
        }
    }
}

/// Username / password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of debug logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything an `RpcClient` needs besides the URL.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub credentials: Option<Credentials>,
    /// Sent before the generated headers, in this order.
    pub extra_headers: Vec<(String, String)>,
    pub auth_mode: AuthMode,
    pub digest: DigestAlgorithm,
    /// Advertise `gzip` in `Accept-Encoding`.
    pub accept_gzip: bool,
    /// Advertise `deflate` in `Accept-Encoding`.
    pub accept_deflate: bool,
    /// Compress the request body with this algorithm.
    pub compression: Option<Compression>,
}

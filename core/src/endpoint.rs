//! Parsed target of an `RpcClient`.

use std::fmt;

use url::Url;

use crate::error::RpcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Scheme, host, port and base path, parsed once from a URL string.
///
/// Query and fragment of the input are dropped: the query string belongs to
/// the call (`?do=<method>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: u16,
    base_path: String,
}

impl Endpoint {
    pub fn parse(input: &str) -> Result<Self, RpcError> {
        let url = Url::parse(input)
            .map_err(|e| RpcError::Configuration(format!("invalid url {input}: {e}")))?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(RpcError::Configuration(format!("unknown scheme {other}"))),
        };
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RpcError::Configuration(format!("missing host in {input}")))?
            .to_string();
        let port = url.port().unwrap_or_else(|| scheme.default_port());

        Ok(Self {
            scheme,
            host,
            port,
            base_path: url.path().to_string(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// `host:port`, always with an explicit port.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Path and query selecting the remote `method`.
    pub fn method_path(&self, method: &str) -> String {
        format!("{}?do={method}", self.base_path)
    }

    /// Absolute URL selecting the remote `method`.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}://{}{}", self.scheme.as_str(), self.authority(), self.method_path(method))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme.as_str(), self.authority(), self.base_path)
    }
}

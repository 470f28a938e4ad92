//! Command line surface of `rpctest`.

use std::str::FromStr;

use clap::Parser;
use rpcsign_core::{AuthMode, ClientConfig, Compression, Credentials, DigestAlgorithm};
use serde_json::{Map, Value};
use thiserror::Error;

/// Call an RPC method on server.
#[derive(Parser, Debug)]
#[command(name = "rpctest", version, about)]
pub struct Cli {
    /// Base server URL
    pub url: String,

    /// Name of the method to call
    pub method: String,

    /// Username and password for authentication
    #[arg(short = 'a', long = "auth", num_args = 2, value_names = ["USER", "PASS"])]
    pub auth: Option<Vec<String>>,

    /// Authentication type: sign or plain. WARNING: "plain" auth is NOT safe without SSL!
    #[arg(
        short = 't',
        long = "auth-type",
        value_name = "TYPE",
        value_parser = AuthMode::from_str,
        default_value = "sign"
    )]
    pub auth_type: AuthMode,

    /// Digest used by "sign" authentication: sha1 or sha512
    #[arg(
        long,
        value_name = "ALGORITHM",
        value_parser = DigestAlgorithm::from_str,
        default_value = "sha1"
    )]
    pub digest: DigestAlgorithm,

    /// Adds a header <name>=<value>; repeat for more headers
    #[arg(short = 'e', long = "header", value_name = "NAME=VALUE")]
    pub headers: Vec<String>,

    /// Send accept gzip header
    #[arg(short = 'g', long)]
    pub gzip: bool,

    /// Send accept deflate header
    #[arg(short = 'd', long)]
    pub deflate: bool,

    /// Compress the request body: gzip or deflate
    #[arg(short = 'c', long, value_name = "ENCODING", value_parser = Compression::from_str)]
    pub compress: Option<Compression>,

    /// Log request and response headers and bodies
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Adds a parameter <name>=<value> (use [] to specify a list)
    #[arg(value_name = "NAME=VALUE")]
    pub params: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("Parameters must be in the form <name>=<value>")]
    Malformed(String),

    #[error("invalid list for parameter {name}: {reason}")]
    InvalidList { name: String, reason: String },
}

/// Split `name=value` at the first `=`. The name must not be empty.
pub fn split_pair(arg: &str) -> Result<(String, String), ParamError> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(ParamError::Malformed(arg.to_string())),
    }
}

/// Turn `name=value` arguments into the JSON parameter object.
///
/// A value starting with `[` is parsed as a JSON array, anything else is
/// taken as a literal string. Later duplicates win.
pub fn parse_params(args: &[String]) -> Result<Map<String, Value>, ParamError> {
    let mut params = Map::new();
    for arg in args {
        let (name, value) = split_pair(arg)?;
        let value = if value.starts_with('[') {
            match serde_json::from_str::<Value>(&value) {
                Ok(list @ Value::Array(_)) => list,
                Ok(other) => {
                    return Err(ParamError::InvalidList {
                        name,
                        reason: format!("expected a list, got {other}"),
                    })
                }
                Err(e) => {
                    return Err(ParamError::InvalidList {
                        name,
                        reason: e.to_string(),
                    })
                }
            }
        } else {
            Value::String(value)
        };
        params.insert(name, value);
    }
    Ok(params)
}

pub fn parse_headers(args: &[String]) -> Result<Vec<(String, String)>, ParamError> {
    args.iter().map(|arg| split_pair(arg)).collect()
}

impl Cli {
    /// Client configuration for these flags and already-validated headers.
    pub fn client_config(&self, extra_headers: Vec<(String, String)>) -> ClientConfig {
        let credentials = match self.auth.as_deref() {
            Some([user, pass]) => Some(Credentials::new(user.as_str(), pass.as_str())),
            _ => None,
        };
        ClientConfig {
            credentials,
            extra_headers,
            auth_mode: self.auth_type,
            digest: self.digest,
            accept_gzip: self.gzip,
            accept_deflate: self.deflate,
            compression: self.compress,
        }
    }
}

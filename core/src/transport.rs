//! Blocking I/O for `HttpRequest` values.
//!
//! # Design
//! `Transport` is the only seam where the client touches the network.
//! `UreqTransport` builds a fresh agent per request, so every call opens its
//! own connection and drops it when the response has been read. Status codes
//! are returned as data (`http_status_as_error(false)`), redirects are not
//! followed, and ureq's own gzip handling is compiled out, so the response
//! arrives exactly as the server sent it and `RpcClient::decode` stays in
//! charge of status and encoding.
//!
//! ureq does not expose the reason phrase from the status line, so
//! `HttpResponse::reason` is the canonical phrase for the status code.

use std::io::Read;

use crate::error::RpcError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one request and returns the raw response.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, RpcError>;
}

/// `Transport` backed by a blocking ureq agent. No timeout is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, RpcError> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .build()
            .new_agent();

        let mut builder = match request.method {
            HttpMethod::Post => agent.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .send(&request.body[..])
            .map_err(|e| RpcError::Transport(format!("{} {}: {e}", request.method.as_str(), request.url)))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let mut body = Vec::new();
        response
            .body_mut()
            .as_reader()
            .read_to_end(&mut body)
            .map_err(|e| RpcError::Transport(format!("reading response body: {e}")))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}

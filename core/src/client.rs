//! Signed JSON RPC client.
//!
//! # Design
//! `RpcClient` holds an immutable `Endpoint` and `ClientConfig` and carries
//! no state between calls. A call is split the same way as the rest of the
//! crate: `build_call` produces an `HttpRequest` without I/O, `call` hands it
//! to the `Transport`, then `decode` and `parse` turn the raw response into a
//! JSON value. `invoke` chains all of them.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{self, HEADER_PASS};
use crate::codec;
use crate::config::{AuthMode, ClientConfig, Compression};
use crate::endpoint::{Endpoint, Scheme};
use crate::error::RpcError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

const CONTENT_TYPE: &str = "Content-Type";
const ACCEPT_ENCODING: &str = "Accept-Encoding";
const CONTENT_ENCODING: &str = "Content-Encoding";
const JSON_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct RpcClient<T = UreqTransport> {
    endpoint: Endpoint,
    config: ClientConfig,
    transport: T,
}

impl RpcClient<UreqTransport> {
    /// Client talking to `url` over ureq.
    pub fn new(url: &str, config: ClientConfig) -> Result<Self, RpcError> {
        Self::with_transport(url, config, UreqTransport)
    }
}

impl<T: Transport> RpcClient<T> {
    pub fn with_transport(url: &str, config: ClientConfig, transport: T) -> Result<Self, RpcError> {
        let endpoint = Endpoint::parse(url)?;
        if config.credentials.is_some()
            && config.auth_mode == AuthMode::Plain
            && endpoint.scheme() == Scheme::Http
        {
            warn!(%endpoint, "plain authentication over http sends the password in cleartext");
        }
        Ok(Self {
            endpoint,
            config,
            transport,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the POST for `method` without sending it.
    pub fn build_call<P>(&self, method: &str, params: &P) -> Result<HttpRequest, RpcError>
    where
        P: Serialize + ?Sized,
    {
        let json = serde_json::to_vec(params).map_err(|e| RpcError::Serialization(e.to_string()))?;
        debug!(body = %String::from_utf8_lossy(&json), "request body");

        let (encoding, body) = match self.config.compression {
            Some(algorithm) => (Some(algorithm), codec::compress(algorithm, &json)?),
            None => (None, json),
        };

        let mut headers = self.config.extra_headers.clone();
        if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE)) {
            headers.push((CONTENT_TYPE.to_string(), JSON_MEDIA_TYPE.to_string()));
        }
        if let Some(accept) = self.accept_encoding() {
            headers.push((ACCEPT_ENCODING.to_string(), accept));
        }
        if let Some(encoding) = encoding {
            headers.push((CONTENT_ENCODING.to_string(), encoding.as_str().to_string()));
        }
        if let Some(credentials) = &self.config.credentials {
            headers.extend(auth::auth_headers(
                self.config.auth_mode,
                self.config.digest,
                credentials,
                &body,
            ));
        }

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint.method_url(method),
            path: self.endpoint.method_path(method),
            headers,
            body,
        })
    }

    /// Send `method` with `params` over a fresh connection and return the
    /// response as received.
    pub fn call<P>(&self, method: &str, params: &P) -> Result<HttpResponse, RpcError>
    where
        P: Serialize + ?Sized,
    {
        let request = self.build_call(method, params)?;
        info!("Sending request to {}", request.url);
        debug!(headers = ?redacted(&request.headers), "request headers");
        self.transport.execute(&request)
    }

    /// Check the status and undo any `Content-Encoding`.
    pub fn decode(&self, response: HttpResponse) -> Result<Vec<u8>, RpcError> {
        let encoding = response.header(CONTENT_ENCODING).map(str::to_string);
        info!(
            "Parsing response {} - {}, {} bytes of {} encoded data",
            response.status,
            response.reason,
            response.body.len(),
            encoding.as_deref().unwrap_or("None"),
        );
        debug!(headers = ?response.headers, "response headers");

        if response.status != 200 {
            return Err(RpcError::Status {
                code: response.status,
                data: response.body,
            });
        }
        codec::decode_content(encoding.as_deref(), response.body)
    }

    /// UTF-8 decode and JSON parse a decoded body.
    pub fn parse(&self, decoded: &[u8]) -> Result<Value, RpcError> {
        parse(decoded)
    }

    /// `call`, `decode` and `parse` in one go.
    pub fn invoke<P>(&self, method: &str, params: &P) -> Result<Value, RpcError>
    where
        P: Serialize + ?Sized,
    {
        let response = self.call(method, params)?;
        let decoded = self.decode(response)?;
        self.parse(&decoded)
    }

    fn accept_encoding(&self) -> Option<String> {
        let mut accept = Vec::new();
        if self.config.accept_gzip {
            accept.push(Compression::Gzip.as_str());
        }
        if self.config.accept_deflate {
            accept.push(Compression::Deflate.as_str());
        }
        (!accept.is_empty()).then(|| accept.join(", "))
    }
}

/// UTF-8 decode and JSON parse `decoded`, keeping the raw bytes on failure.
pub fn parse(decoded: &[u8]) -> Result<Value, RpcError> {
    let text = std::str::from_utf8(decoded).map_err(|e| RpcError::Parse {
        data: decoded.to_vec(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(text).map_err(|e| RpcError::Parse {
        data: decoded.to_vec(),
        reason: e.to_string(),
    })
}

fn redacted(headers: &[(String, String)]) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(k, v)| {
            if k.eq_ignore_ascii_case(HEADER_PASS) {
                (k.as_str(), "***")
            } else {
                (k.as_str(), v.as_str())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::config::{Credentials, DigestAlgorithm};

    /// Replays a canned response and remembers the last request.
    struct Canned {
        response: HttpResponse,
        seen: RefCell<Option<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, headers: &[(&str, &str)], body: &[u8]) -> Self {
            Self {
                response: HttpResponse {
                    status,
                    reason: String::new(),
                    headers: headers
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    body: body.to_vec(),
                },
                seen: RefCell::new(None),
            }
        }
    }

    impl Transport for &Canned {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, RpcError> {
            *self.seen.borrow_mut() = Some(request.clone());
            Ok(self.response.clone())
        }
    }

    fn client(config: ClientConfig) -> RpcClient {
        RpcClient::new("http://localhost:3000/rpc.php", config).unwrap()
    }

    fn ok(body: &[u8]) -> HttpResponse {
        HttpResponse {
            status: 200,
            reason: "OK".to_string(),
            headers: Vec::new(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = RpcClient::new("gopher://localhost/", ClientConfig::default()).unwrap_err();
        assert!(matches!(err, RpcError::Configuration(_)));
    }

    #[test]
    fn build_call_produces_json_post() {
        let req = client(ClientConfig::default())
            .build_call("list", &json!({"page": 2}))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/rpc.php?do=list");
        assert_eq!(req.path, "/rpc.php?do=list");
        assert_eq!(
            req.headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
        assert_eq!(req.body, br#"{"page":2}"#);
    }

    #[test]
    fn caller_content_type_is_kept() {
        let config = ClientConfig {
            extra_headers: vec![("content-type".to_string(), "text/plain".to_string())],
            ..ClientConfig::default()
        };
        let req = client(config).build_call("x", &json!({})).unwrap();
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn accept_encoding_lists_opted_in_algorithms() {
        let config = ClientConfig {
            accept_gzip: true,
            accept_deflate: true,
            ..ClientConfig::default()
        };
        let req = client(config).build_call("x", &json!({})).unwrap();
        assert_eq!(req.header("Accept-Encoding"), Some("gzip, deflate"));

        let config = ClientConfig {
            accept_deflate: true,
            ..ClientConfig::default()
        };
        let req = client(config).build_call("x", &json!({})).unwrap();
        assert_eq!(req.header("Accept-Encoding"), Some("deflate"));
    }

    #[test]
    fn compressed_request_is_signed_over_compressed_bytes() {
        let config = ClientConfig {
            credentials: Some(Credentials::new("alice", "secret")),
            compression: Some(Compression::Gzip),
            ..ClientConfig::default()
        };
        let req = client(config).build_call("x", &json!({"a": 1})).unwrap();
        assert_eq!(req.header("Content-Encoding"), Some("gzip"));
        assert_eq!(
            codec::decompress(Compression::Gzip, &req.body).unwrap(),
            br#"{"a":1}"#
        );
        let expected = auth::sign(DigestAlgorithm::Sha1, "alice", "secret", &req.body);
        assert_eq!(req.header("X-Auth-Sign"), Some(expected.as_str()));
        assert_eq!(req.header("X-Auth-User"), Some("alice"));
    }

    #[test]
    fn signed_request_uses_configured_digest() {
        let config = ClientConfig {
            credentials: Some(Credentials::new("alice", "secret")),
            digest: DigestAlgorithm::Sha512,
            ..ClientConfig::default()
        };
        let req = client(config).build_call("x", &json!({})).unwrap();
        assert_eq!(req.header("X-Auth-Sign").map(str::len), Some(128));
        assert!(req.header("X-Auth-Pass").is_none());
    }

    #[test]
    fn plain_auth_sends_password_header() {
        let config = ClientConfig {
            credentials: Some(Credentials::new("alice", "secret")),
            auth_mode: AuthMode::Plain,
            ..ClientConfig::default()
        };
        let req = client(config).build_call("x", &json!({})).unwrap();
        assert_eq!(req.header("X-Auth-Pass"), Some("secret"));
        assert!(req.header("X-Auth-Sign").is_none());
    }

    #[test]
    fn no_credentials_no_auth_headers() {
        let req = client(ClientConfig::default()).build_call("x", &json!({})).unwrap();
        assert!(req.header("X-Auth-User").is_none());
    }

    #[test]
    fn decode_non_200_is_status_error() {
        let response = HttpResponse {
            status: 404,
            reason: "Not Found".to_string(),
            headers: Vec::new(),
            body: b"missing".to_vec(),
        };
        let err = client(ClientConfig::default()).decode(response).unwrap_err();
        match err {
            RpcError::Status { code, data } => {
                assert_eq!(code, 404);
                assert_eq!(data, b"missing");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn decode_unknown_encoding() {
        let mut response = ok(b"{}");
        response
            .headers
            .push(("Content-Encoding".to_string(), "identity-unknown".to_string()));
        let err = client(ClientConfig::default()).decode(response).unwrap_err();
        assert!(matches!(err, RpcError::UnsupportedEncoding(e) if e == "identity-unknown"));
    }

    #[test]
    fn decode_deflate_body() {
        let mut response = ok(&codec::compress(Compression::Deflate, b"[1]").unwrap());
        response
            .headers
            .push(("content-encoding".to_string(), "deflate".to_string()));
        let decoded = client(ClientConfig::default()).decode(response).unwrap();
        assert_eq!(decoded, b"[1]");
    }

    #[test]
    fn parse_invalid_json_keeps_raw_data() {
        let err = parse(b"not json").unwrap_err();
        assert!(matches!(err, RpcError::Parse { ref data, .. } if data == b"not json"));
    }

    #[test]
    fn parse_invalid_utf8() {
        let err = parse(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.data(), Some(&[0xff, 0xfe][..]));
    }

    #[test]
    fn invoke_goes_through_transport() {
        let canned = Canned::new(200, &[], br#"{"ok":true}"#);
        let client =
            RpcClient::with_transport("https://rpc.example.com/api", ClientConfig::default(), &canned)
                .unwrap();
        let value = client.invoke("status", &json!({"verbose": "1"})).unwrap();
        assert_eq!(value, json!({"ok": true}));

        let seen = canned.seen.borrow().clone().unwrap();
        assert_eq!(seen.url, "https://rpc.example.com:443/api?do=status");
        assert_eq!(seen.body, br#"{"verbose":"1"}"#);
    }

    #[test]
    fn invoke_surfaces_gzip_response() {
        let body = codec::compress(Compression::Gzip, br#"{"n":5}"#).unwrap();
        let canned = Canned::new(200, &[("Content-Encoding", "gzip")], &body);
        let client =
            RpcClient::with_transport("http://h/", ClientConfig::default(), &canned).unwrap();
        assert_eq!(client.invoke("n", &json!({})).unwrap(), json!({"n": 5}));
    }

    #[test]
    fn redacted_hides_plain_password() {
        let headers = vec![
            ("X-Auth-User".to_string(), "alice".to_string()),
            ("X-Auth-Pass".to_string(), "secret".to_string()),
        ];
        assert_eq!(
            redacted(&headers),
            vec![("X-Auth-User", "alice"), ("X-Auth-Pass", "***")]
        );
    }
}

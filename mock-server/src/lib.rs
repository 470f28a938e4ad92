use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use flate2::{
    read::{GzDecoder, ZlibDecoder},
    write::{GzEncoder, ZlibEncoder},
    Compression,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sha1::{Digest, Sha1};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Separator used by signed authentication.
pub const SEP: &str = "~";

/// Users known to `app()`.
pub const DEFAULT_USERS: &[(&str, &str)] = &[("alice", "secret"), ("bob", "hunter2")];

/// Username to password.
pub type Users = Arc<HashMap<String, String>>;

#[derive(Deserialize)]
pub struct RpcQuery {
    #[serde(rename = "do")]
    pub method: Option<String>,
}

pub fn app() -> Router {
    app_with_users(
        DEFAULT_USERS
            .iter()
            .map(|(u, p)| (u.to_string(), p.to_string())),
    )
}

pub fn app_with_users(users: impl IntoIterator<Item = (String, String)>) -> Router {
    let users: Users = Arc::new(users.into_iter().collect());
    Router::new()
        .route("/", post(dispatch))
        .route("/rpc", post(dispatch))
        .route("/landing", get(landing))
        .with_state(users)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Hex SHA-1 of `user ~ password ~ body`, as the DoPhp server computes it.
pub fn countersign(user: &str, password: &str, body: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(user.as_bytes());
    hasher.update(SEP.as_bytes());
    hasher.update(password.as_bytes());
    hasher.update(SEP.as_bytes());
    hasher.update(body);
    hex::encode(hasher.finalize())
}

async fn dispatch(
    State(users): State<Users>,
    Query(query): Query<RpcQuery>,
    headers: HeaderMap,
    raw: Bytes,
) -> Response {
    let method = query.method.unwrap_or_default();
    info!(%method, bytes = raw.len(), "rpc request");

    let user = match authenticate(&users, &headers, &raw) {
        Ok(user) => user,
        Err(status) => return (status, "unauthorized").into_response(),
    };

    let body = match header_str(&headers, header::CONTENT_ENCODING.as_str()) {
        None => raw.to_vec(),
        Some("gzip") => match inflate(GzDecoder::new(&raw[..])) {
            Some(body) => body,
            None => return (StatusCode::BAD_REQUEST, "corrupt gzip body").into_response(),
        },
        Some("deflate") => match inflate(ZlibDecoder::new(&raw[..])) {
            Some(body) => body,
            None => return (StatusCode::BAD_REQUEST, "corrupt deflate body").into_response(),
        },
        Some(_) => return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response(),
    };
    debug!(body = %String::from_utf8_lossy(&body), "decoded request");

    let reply = match method.as_str() {
        "echo" => match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(_) => return (StatusCode::BAD_REQUEST, "invalid json").into_response(),
        },
        "whoami" => json!({ "user": user }),
        "headers" => {
            let seen: Map<String, Value> = headers
                .iter()
                .filter_map(|(k, v)| {
                    v.to_str()
                        .ok()
                        .map(|v| (k.as_str().to_string(), Value::from(v)))
                })
                .collect();
            Value::Object(seen)
        }
        "garbage" => return (StatusCode::OK, "not json").into_response(),
        "weird" => {
            return (
                StatusCode::OK,
                [(header::CONTENT_ENCODING, "identity-unknown")],
                "{}",
            )
                .into_response()
        }
        "moved" => {
            return (StatusCode::FOUND, [(header::LOCATION, "/landing")], "moved").into_response()
        }
        _ => return (StatusCode::NOT_FOUND, "missing").into_response(),
    };

    compressed_reply(&headers, reply.to_string().into_bytes())
}

/// Target of the `moved` redirect. A client that follows it ends up here.
async fn landing() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"landed":true}"#,
    )
        .into_response()
}

/// `Ok(None)` for anonymous requests, `Ok(Some(user))` once verified.
fn authenticate(users: &Users, headers: &HeaderMap, raw: &[u8]) -> Result<Option<String>, StatusCode> {
    let Some(user) = header_str(headers, "x-auth-user") else {
        return Ok(None);
    };
    let password = users.get(user).ok_or(StatusCode::UNAUTHORIZED)?;

    let verified = if let Some(sign) = header_str(headers, "x-auth-sign") {
        sign == countersign(user, password, raw)
    } else if let Some(pass) = header_str(headers, "x-auth-pass") {
        pass == password.as_str()
    } else {
        false
    };

    if verified {
        Ok(Some(user.to_string()))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn compressed_reply(headers: &HeaderMap, body: Vec<u8>) -> Response {
    let accept = header_str(headers, header::ACCEPT_ENCODING.as_str()).unwrap_or("");
    let wants = |name: &str| accept.split(',').any(|t| t.trim() == name);

    let (encoding, body) = if wants("gzip") {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        match encoder.write_all(&body).and_then(|_| encoder.finish()) {
            Ok(packed) => (Some("gzip"), packed),
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    } else if wants("deflate") {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        match encoder.write_all(&body).and_then(|_| encoder.finish()) {
            Ok(packed) => (Some("deflate"), packed),
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    } else {
        (None, body)
    };

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response();
    if let Some(encoding) = encoding {
        response
            .headers_mut()
            .insert(header::CONTENT_ENCODING, HeaderValue::from_static(encoding));
    }
    response
}

fn inflate(mut reader: impl Read) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out).ok().map(|_| out)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

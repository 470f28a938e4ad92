//! Authentication headers for signed and plain modes.
//!
//! Signed mode sends `X-Auth-User` and `X-Auth-Sign`, where the signature is
//! the hex digest of `username ~ password ~ body`. The body is hashed exactly
//! as sent, so a compressed request is signed over its compressed bytes.

use sha1::Sha1;
use sha2::{Digest, Sha512};

use crate::config::{AuthMode, Credentials, DigestAlgorithm};

/// Separator joined between username, password and body before hashing.
pub const SEP: char = '~';

pub const HEADER_USER: &str = "X-Auth-User";
pub const HEADER_SIGN: &str = "X-Auth-Sign";
pub const HEADER_PASS: &str = "X-Auth-Pass";

/// Hex digest of `username SEP password SEP body`.
pub fn sign(algorithm: DigestAlgorithm, username: &str, password: &str, body: &[u8]) -> String {
    match algorithm {
        DigestAlgorithm::Sha1 => hex::encode(digest::<Sha1>(username, password, body)),
        DigestAlgorithm::Sha512 => hex::encode(digest::<Sha512>(username, password, body)),
    }
}

fn digest<D: Digest>(username: &str, password: &str, body: &[u8]) -> Vec<u8> {
    let mut sep = [0u8; 4];
    let sep = SEP.encode_utf8(&mut sep).as_bytes();

    let mut hasher = D::new();
    hasher.update(username.as_bytes());
    hasher.update(sep);
    hasher.update(password.as_bytes());
    hasher.update(sep);
    hasher.update(body);
    hasher.finalize().to_vec()
}

/// Headers authenticating `body` with `credentials` under `mode`.
pub fn auth_headers(
    mode: AuthMode,
    algorithm: DigestAlgorithm,
    credentials: &Credentials,
    body: &[u8],
) -> Vec<(String, String)> {
    let user = (HEADER_USER.to_string(), credentials.username.clone());
    match mode {
        AuthMode::Sign => {
            let signature = sign(algorithm, &credentials.username, &credentials.password, body);
            vec![user, (HEADER_SIGN.to_string(), signature)]
        }
        AuthMode::Plain => vec![user, (HEADER_PASS.to_string(), credentials.password.clone())],
    }
}

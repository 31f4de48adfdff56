//! Digest response calculation (RFC 7616, MD5 family only).

use std::fmt::Write as _;

use md5::{Digest as _, Md5};

use crate::challenge::DigestParams;
use crate::error::{AuthError, Result};

/// Source of client nonce values mixed into the digest hash.
///
/// The production source draws from the thread-local RNG; tests substitute
/// a fixed value so the computed response is deterministic.
pub trait CnonceSource: Send + Sync {
    fn cnonce(&self) -> String;
}

/// Default cnonce source: 8 random bytes, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCnonce;

impl CnonceSource for RandomCnonce {
    fn cnonce(&self) -> String {
        format!("{:016x}", fastrand::u64(..))
    }
}

/// Deterministic cnonce source for tests and replay verification.
#[derive(Debug, Clone)]
pub struct FixedCnonce(pub String);

impl CnonceSource for FixedCnonce {
    fn cnonce(&self) -> String {
        self.0.clone()
    }
}

fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Compute a complete `Digest ...` authorization header value.
///
/// Field order and quoting are fixed: `username, realm, uri, algorithm`,
/// then `nonce, nc, cnonce, response`, then `qop` when non-empty, then
/// `opaque` when present. `algorithm`, `nc` and `qop` are unquoted.
pub(crate) fn authorization_value(
    user: &str,
    password: &str,
    params: &DigestParams,
    method: &str,
    uri_path: &str,
    cnonce: &str,
    nonce_count: u32,
) -> Result<String> {
    let algorithm = params.algorithm();
    let realm = params.realm.as_deref().unwrap_or("");
    let nonce = params.nonce.as_deref().unwrap_or("");
    let nc = format!("{nonce_count:08x}");

    let ha1 = match algorithm {
        "MD5" => md5_hex(&format!("{user}:{realm}:{password}")),
        "MD5-sess" => {
            let inner = md5_hex(&format!("{user}:{realm}:{password}"));
            md5_hex(&format!("{inner}:{nonce}:{cnonce}"))
        }
        other => return Err(AuthError::UnsupportedAlgorithm(other.to_string())),
    };

    // The effective qop is the first comma-separated token of the directive,
    // or empty when the directive is absent altogether.
    let (ha2, chosen_qop) = match params.qop.as_deref() {
        None => (md5_hex(&format!("{method}:{uri_path}")), None),
        Some(qop) => match qop.split(',').next().unwrap_or("").trim() {
            "auth" | "" => (md5_hex(&format!("{method}:{uri_path}")), Some("auth")),
            "auth-int" => {
                let entity = params.entity_body.as_deref().unwrap_or("");
                let body_hash = md5_hex(entity);
                (md5_hex(&format!("{method}:{uri_path}:{body_hash}")), Some("auth-int"))
            }
            other => return Err(AuthError::UnsupportedQop(other.to_string())),
        },
    };

    let response = match chosen_qop {
        None => md5_hex(&format!("{ha1}:{nonce}:{ha2}")),
        Some(qop) => md5_hex(&format!("{ha1}:{nonce}:{nc}:{cnonce}:{qop}:{ha2}")),
    };

    let mut value = format!(
        r#"Digest username="{user}", realm="{realm}", uri="{uri_path}", algorithm={algorithm}"#
    );
    let _ = write!(value, r#", nonce="{nonce}", nc={nc}, cnonce="{cnonce}", response="{response}""#);
    if let Some(qop) = chosen_qop {
        let _ = write!(value, ", qop={qop}");
    }
    match params.opaque.as_deref() {
        Some(opaque) if !opaque.is_empty() => {
            let _ = write!(value, r#", opaque="{opaque}""#);
        }
        _ => {}
    }

    Ok(value)
}

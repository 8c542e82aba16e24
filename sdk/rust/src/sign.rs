//! Request signing shared by callers and the gateway.
//!
//! The signature is HMAC-SHA256 keyed with the caller's secret key over a
//! canonical encoding of the signed parameters, rendered as lowercase hex.
//! The gateway recomputes it with the same function, so any change here is a
//! wire-breaking change for every deployed client.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the caller's access key.
pub const ACCESS_KEY: &str = "accessKey";
/// Header carrying the request time in unix seconds.
pub const TIMESTAMP: &str = "timestamp";
/// Header carrying the single-use nonce.
pub const NONCE: &str = "nonceStr";
/// Header carrying the base64-encoded request body.
pub const BODY: &str = "body";
/// Header carrying the hex signature.
pub const SIGNATURE: &str = "signature";

/// The ordered set of parameters that go into a signature.
///
/// Keys are kept sorted so that two parties building the payload from the
/// same values always produce the same bytes, regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalPayload {
    params: BTreeMap<String, String>,
}

impl CanonicalPayload {
    /// Build the payload from the signed request fields.
    ///
    /// `extra` parameters are merged first; the named fields always win so an
    /// extra `accessKey` can never shadow the real one. An absent body is
    /// omitted rather than signed as an empty string.
    pub fn new(
        timestamp: &str,
        access_key: &str,
        nonce: &str,
        raw_body: Option<&str>,
        extra: &BTreeMap<String, String>,
    ) -> Self {
        let mut params = extra.clone();
        params.insert(ACCESS_KEY.to_string(), access_key.to_string());
        params.insert(TIMESTAMP.to_string(), timestamp.to_string());
        params.insert(NONCE.to_string(), nonce.to_string());
        match raw_body {
            Some(body) => {
                params.insert(BODY.to_string(), body.to_string());
            }
            None => {
                params.remove(BODY);
            }
        }
        Self { params }
    }

    /// Iterate parameters in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode the payload into the exact bytes that are MAC'd.
    ///
    /// Each key and value is length-prefixed so that no two distinct payloads
    /// share an encoding (`a=b&c` vs `a=b` + `c`).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, value) in self.iter() {
            out.extend_from_slice(format!("{}:", key.len()).as_bytes());
            out.extend_from_slice(key.as_bytes());
            out.extend_from_slice(format!("{}:", value.len()).as_bytes());
            out.extend_from_slice(value.as_bytes());
            out.push(b'\n');
        }
        out
    }
}

/// Sign a request.
///
/// Deterministic: identical inputs always yield the identical signature.
pub fn sign(
    timestamp: &str,
    access_key: &str,
    secret_key: &str,
    nonce: &str,
    raw_body: Option<&str>,
    extra: &BTreeMap<String, String>,
) -> String {
    let payload = CanonicalPayload::new(timestamp, access_key, nonce, raw_body, extra);
    sign_payload(&payload, secret_key)
}

/// Sign an already-built payload.
pub fn sign_payload(payload: &CanonicalPayload, secret_key: &str) -> String {
    // infallible: HMAC pads or hashes keys of any length
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(&payload.to_bytes());
    hex::encode(mac.finalize().into_bytes())
}

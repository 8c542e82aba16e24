//! Extraction of the signed header set.

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gatekeeper_sdk::sign::{ACCESS_KEY, BODY, NONCE, SIGNATURE, TIMESTAMP};

use crate::auth::error::AdmissionError;

/// The authentication headers of one request.
///
/// `timestamp` stays a string: it is signed exactly as sent and only parsed
/// by the freshness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub access_key: String,
    pub timestamp: String,
    pub nonce: String,
    pub signature: String,
    /// Decoded `body` header, if one was sent.
    pub raw_body: Option<String>,
}

impl SignedHeaders {
    pub fn extract(headers: &HeaderMap) -> Result<Self, AdmissionError> {
        let raw_body = match optional(headers, BODY)? {
            Some(encoded) => Some(decode_body(encoded)?),
            None => None,
        };
        Ok(Self {
            access_key: required(headers, ACCESS_KEY)?.to_string(),
            timestamp: required(headers, TIMESTAMP)?.to_string(),
            nonce: required(headers, NONCE)?.to_string(),
            signature: required(headers, SIGNATURE)?.to_string(),
            raw_body,
        })
    }
}

fn optional<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<Option<&'a str>, AdmissionError> {
    headers
        .get(name)
        .map(|value| {
            value.to_str().map_err(|_| AdmissionError::MalformedHeader {
                header: name,
                reason: "not visible ASCII".to_string(),
            })
        })
        .transpose()
}

fn required<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, AdmissionError> {
    optional(headers, name)?.ok_or(AdmissionError::MissingHeader(name))
}

fn decode_body(encoded: &str) -> Result<String, AdmissionError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| AdmissionError::MalformedHeader {
            header: BODY,
            reason: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| AdmissionError::MalformedHeader {
        header: BODY,
        reason: e.to_string(),
    })
}

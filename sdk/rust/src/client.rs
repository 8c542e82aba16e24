use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};

use crate::sign::{self, ACCESS_KEY, BODY, NONCE, SIGNATURE, TIMESTAMP};

/// Structured error body returned by the gateway when metering fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayError {
    pub code: i32,
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl GatewayError {
    /// Parse a gateway error body. Upstream bodies that do not have the
    /// error shape yield `None`.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }
}

/// Credential pair issued to a caller.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

/// Builds the signed header set for one request.
///
/// A fresh 16-character alphanumeric nonce and the current unix time are used
/// unless overridden.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub access_key: String,
    pub timestamp: String,
    pub nonce: String,
    pub encoded_body: Option<String>,
    pub signature: String,
}

impl SignedHeaders {
    pub fn new(credentials: &Credentials, raw_body: Option<&str>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string();
        Self::with_parts(credentials, raw_body, &timestamp, &random_nonce())
    }

    pub fn with_parts(
        credentials: &Credentials,
        raw_body: Option<&str>,
        timestamp: &str,
        nonce: &str,
    ) -> Self {
        let signature = sign::sign(
            timestamp,
            &credentials.access_key,
            &credentials.secret_key,
            nonce,
            raw_body,
            &BTreeMap::new(),
        );
        Self {
            access_key: credentials.access_key.clone(),
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
            encoded_body: raw_body.map(|b| STANDARD.encode(b.as_bytes())),
            signature,
        }
    }

    /// Render as HTTP headers.
    pub fn to_header_map(&self) -> Result<HeaderMap, Box<dyn std::error::Error>> {
        let mut fields = vec![
            (ACCESS_KEY, &self.access_key),
            (TIMESTAMP, &self.timestamp),
            (NONCE, &self.nonce),
            (SIGNATURE, &self.signature),
        ];
        if let Some(body) = &self.encoded_body {
            fields.push((BODY, body));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in fields {
            headers.insert(HeaderName::from_bytes(name.as_bytes())?, HeaderValue::from_str(value)?);
        }
        Ok(headers)
    }
}

fn random_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// HTTP client that signs every request it sends through the gateway.
pub struct GatekeeperClient {
    client: Client,
    gateway_url: String,
    credentials: Credentials,
}

impl GatekeeperClient {
    pub fn new(gateway_url: &str, credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Send a signed request. The body, if any, is both sent as the request
    /// payload and signed via the `body` header.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let headers = SignedHeaders::new(&self.credentials, body).to_header_map()?;
        let mut req = self
            .client
            .request(method, format!("{}{}", self.gateway_url, path))
            .headers(headers);
        if let Some(body) = body {
            req = req
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }
        Ok(req.send().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            access_key: "testAccessKey".into(),
            secret_key: "testSecretKey".into(),
        }
    }

    #[test]
    fn test_headers_round_trip_signature() {
        let h = SignedHeaders::with_parts(&creds(), Some("{\"a\":1}"), "1700000000", "abc");
        let expected = sign::sign("1700000000", "testAccessKey", "testSecretKey", "abc", Some("{\"a\":1}"), &BTreeMap::new());
        assert_eq!(h.signature, expected);
        assert_eq!(h.encoded_body.as_deref(), Some("eyJhIjoxfQ=="));
    }

    #[test]
    fn test_header_map_contains_wire_names() {
        let h = SignedHeaders::with_parts(&creds(), None, "1700000000", "abc");
        let map = h.to_header_map().unwrap();
        assert_eq!(map.get("accessKey").unwrap(), "testAccessKey");
        assert_eq!(map.get("nonceStr").unwrap(), "abc");
        assert!(map.get("body").is_none());
    }

    #[test]
    fn test_gateway_error_parsing() {
        let body = br#"{"code":500,"message":"quota exhausted","timestamp":1700000000123}"#;
        let err = GatewayError::from_body(body).unwrap();
        assert_eq!(err.code, 500);
        assert_eq!(err.message, "quota exhausted");
        assert_eq!(err.timestamp, 1_700_000_000_123);

        assert!(GatewayError::from_body(b"GET your name is yupi").is_none());
    }

    #[test]
    fn test_nonces_are_random() {
        let a = SignedHeaders::new(&creds(), None);
        let b = SignedHeaders::new(&creds(), None);
        assert_eq!(a.nonce.len(), 16);
        assert_ne!(a.nonce, b.nonce);
    }
}

//! Signature verification.

use std::collections::BTreeMap;

use gatekeeper_sdk::sign;
use subtle::ConstantTimeEq;

use crate::auth::error::AdmissionError;
use crate::auth::headers::SignedHeaders;

/// Recompute the signature with `secret_key` and compare it to the one sent.
///
/// The comparison runs in constant time over the hex strings.
pub fn verify_signature(headers: &SignedHeaders, secret_key: &str) -> Result<(), AdmissionError> {
    let expected = sign::sign(
        &headers.timestamp,
        &headers.access_key,
        secret_key,
        &headers.nonce,
        headers.raw_body.as_deref(),
        &BTreeMap::new(),
    );
    if bool::from(expected.as_bytes().ct_eq(headers.signature.as_bytes())) {
        Ok(())
    } else {
        Err(AdmissionError::SignatureMismatch)
    }
}

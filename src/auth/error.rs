//! Admission failures.
//!
//! Every variant surfaces to the client as a bare 403. The detail is for logs
//! and metrics only, so a caller probing the signing scheme learns nothing
//! about which check it tripped.

use std::net::IpAddr;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::services::ServiceError;

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("source {0} is not in the allowlist")]
    SourceNotAllowed(IpAddr),

    #[error("missing header '{0}'")]
    MissingHeader(&'static str),

    #[error("malformed header '{header}': {reason}")]
    MalformedHeader { header: &'static str, reason: String },

    #[error("unknown access key")]
    UnknownAccessKey,

    #[error("account {0} is banned")]
    AccountBanned(u64),

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("timestamp is {age_secs}s old, limit is {max_age_secs}s")]
    Expired { age_secs: u64, max_age_secs: u64 },

    #[error("timestamp is {ahead_secs}s in the future, limit is {max_skew_secs}s")]
    FromTheFuture { ahead_secs: u64, max_skew_secs: u64 },

    #[error("duplicate request")]
    Replayed,

    #[error("no interface registered for {method} {path}")]
    UnknownInterface { method: Method, path: String },

    #[error("interface {0} is offline")]
    InterfaceDisabled(u64),

    /// A collaborator failed or timed out. Fails closed like any denial.
    #[error("{collaborator} lookup failed: {source}")]
    UpstreamUnavailable {
        collaborator: &'static str,
        #[source]
        source: ServiceError,
    },
}

impl AdmissionError {
    /// Static label used in logs and the rejection counter.
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionError::SourceNotAllowed(_) => "ip_not_allowed",
            AdmissionError::MissingHeader(_) => "missing_header",
            AdmissionError::MalformedHeader { .. } => "malformed_header",
            AdmissionError::UnknownAccessKey => "unknown_access_key",
            AdmissionError::AccountBanned(_) => "account_banned",
            AdmissionError::SignatureMismatch => "signature_mismatch",
            AdmissionError::Expired { .. } => "expired",
            AdmissionError::FromTheFuture { .. } => "future_timestamp",
            AdmissionError::Replayed => "replayed",
            AdmissionError::UnknownInterface { .. } => "unknown_interface",
            AdmissionError::InterfaceDisabled(_) => "interface_disabled",
            AdmissionError::UpstreamUnavailable { .. } => "upstream_unavailable",
        }
    }

    pub(crate) fn unavailable(collaborator: &'static str) -> impl FnOnce(ServiceError) -> Self {
        move |source| AdmissionError::UpstreamUnavailable { collaborator, source }
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        StatusCode::FORBIDDEN.into_response()
    }
}

// src/error.rs
//! Error taxonomy for ct-explorer
//!
//! Every error here is local to one unit of work (one domain/source pair,
//! one certificate blob, one AIA/CDP reference). None of them is allowed to
//! abort a run; callers record or log them and move on.

use thiserror::Error;

/// Failure of one Log Source Adapter query for one domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Transport failure or non-2xx HTTP status
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The provider answered, but had nothing for this domain
    #[error("no certificates found")]
    NoCertificatesFound,

    /// Response body could not be parsed, or a certificate in it could not be decoded
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl SourceError {
    /// Empty results are a normal outcome, not a failure
    pub fn is_failure(&self) -> bool {
        !matches!(self, SourceError::NoCertificatesFound)
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::SourceUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::MalformedResponse(format!("invalid JSON: {}", err))
    }
}

impl From<DecodeError> for SourceError {
    fn from(err: DecodeError) -> Self {
        SourceError::MalformedResponse(err.to_string())
    }
}

/// Failure while following a single AIA or CDP reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("fetching {url} failed: {detail}")]
    ReferenceFetchFailed { url: String, detail: String },

    #[error("decoding CA certificate from {url} failed: {detail}")]
    ReferenceDecodeFailed { url: String, detail: String },
}

/// Certificate decoding failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid DER certificate: {0}")]
    InvalidDer(String),

    #[error("invalid PEM certificate: {0}")]
    InvalidPem(String),

    #[error("invalid base64 certificate: {0}")]
    InvalidBase64(String),

    #[error("validity timestamp out of range: {0}")]
    InvalidValidity(i64),
}

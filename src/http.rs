// src/http.rs
//! Shared HTTP plumbing for provider queries and AIA/CDP downloads

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::SourceError;

/// Failure of a single GET request
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status, carrying the status line (e.g. "503 Service Unavailable")
    #[error("{0}")]
    Status(String),
}

impl From<HttpError> for SourceError {
    fn from(err: HttpError) -> Self {
        SourceError::SourceUnavailable(err.to_string())
    }
}

/// Build the client used for every outbound request, with identifying headers
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_str(&config.accept).context("Invalid Accept header value")?,
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language)
            .context("Invalid Accept-Language header value")?,
    );

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .gzip(true)
        .build()
        .context("Failed to build HTTP client")
}

/// GET `url` and return the body, failing on transport errors and non-2xx statuses
pub async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, HttpError> {
    debug!("GET {}", url);

    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(HttpError::Status(status.to_string()));
    }

    let body = response.bytes().await?;
    debug!("Received {} bytes from {}", body.len(), url);

    Ok(body.to_vec())
}

// src/chain/fetcher.rs
use async_trait::async_trait;

use crate::http::{self, HttpError};

/// Transport used to download AIA and CDP references
#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// Plain HTTP(S) GET, no authentication
pub struct HttpFetcher {
    http_client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ReferenceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        http::get_bytes(&self.http_client, url).await
    }
}

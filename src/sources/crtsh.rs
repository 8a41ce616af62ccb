// src/sources/crtsh.rs
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

use super::types::CrtShEntry;
use super::{LogSource, ResponseDump};
use crate::cert_parser::CertificateParser;
use crate::error::SourceError;
use crate::http;
use crate::types::CertificateRecord;

/// crt.sh search: a JSON listing of certificate ids, each downloaded separately as PEM
pub struct CrtShSource {
    base_url: String,
    http_client: reqwest::Client,
    dump: ResponseDump,
}

impl CrtShSource {
    pub fn new(base_url: String, http_client: reqwest::Client, dump: ResponseDump) -> Self {
        Self {
            base_url,
            http_client,
            dump,
        }
    }

    /// Search URL: `{base}?q=%.{domain}&output=json[&exclude=expired]`
    fn search_url(&self, domain: &str, include_expired: bool) -> Result<Url, SourceError> {
        let mut params = vec![("q", format!("%.{}", domain)), ("output", "json".to_string())];
        if !include_expired {
            params.push(("exclude", "expired".to_string()));
        }
        Url::parse_with_params(&self.base_url, &params).map_err(|e| {
            SourceError::SourceUnavailable(format!("invalid crt.sh URL {}: {}", self.base_url, e))
        })
    }

    /// Download URL for one certificate: `{base}?d={id}`
    fn download_url(&self, id: u64) -> Result<Url, SourceError> {
        Url::parse_with_params(&self.base_url, &[("d", id.to_string())]).map_err(|e| {
            SourceError::SourceUnavailable(format!("invalid crt.sh URL {}: {}", self.base_url, e))
        })
    }
}

#[async_trait]
impl LogSource for CrtShSource {
    fn name(&self) -> &str {
        "crt.sh"
    }

    async fn query(
        &self,
        domain: &str,
        include_expired: bool,
    ) -> Result<Vec<CertificateRecord>, SourceError> {
        let url = self.search_url(domain, include_expired)?;
        info!("crt.sh: searching {}", url);

        let body = http::get_bytes(&self.http_client, url.as_str()).await?;
        self.dump.save(self.name(), domain, &body).await;

        // crt.sh answers an empty body instead of [] on some misses
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(SourceError::NoCertificatesFound);
        }

        let entries: Vec<CrtShEntry> = serde_json::from_slice(&body)?;
        if entries.is_empty() {
            return Err(SourceError::NoCertificatesFound);
        }

        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for entry in entries.iter().filter(|e| seen.insert(e.id)) {
            let download_url = self.download_url(entry.id)?;
            debug!("crt.sh: downloading certificate {} ({})", entry.id, entry.name_value);

            let blob = http::get_bytes(&self.http_client, download_url.as_str()).await?;
            let record = CertificateParser::from_pem_or_der(&blob).map_err(|e| {
                SourceError::MalformedResponse(format!("certificate {}: {}", entry.id, e))
            })?;

            records.push(record);
        }

        debug!(
            "crt.sh: {} rows, {} distinct certificates for {}",
            entries.len(),
            records.len(),
            domain
        );

        Ok(records)
    }
}

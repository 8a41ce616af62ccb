// src/sources/entrust.rs
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use super::types::EntrustEntry;
use super::{LogSource, ResponseDump};
use crate::cert_parser::CertificateParser;
use crate::error::SourceError;
use crate::http;
use crate::types::CertificateRecord;

const FIELDS: &str = "issuerDN,subjectDN,san,sn,cert,validFrom,validTo";

/// Entrust CT search: one JSON document with every certificate inlined as base64 DER
pub struct EntrustSource {
    base_url: String,
    limit: u32,
    http_client: reqwest::Client,
    dump: ResponseDump,
}

impl EntrustSource {
    pub fn new(base_url: String, limit: u32, http_client: reqwest::Client, dump: ResponseDump) -> Self {
        Self {
            base_url,
            limit,
            http_client,
            dump,
        }
    }

    fn search_url(&self, domain: &str, include_expired: bool) -> Result<Url, SourceError> {
        let params = [
            ("fields", FIELDS.to_string()),
            ("domain", domain.to_string()),
            ("includeExpired", include_expired.to_string()),
            ("exactMatch", "false".to_string()),
            ("limit", self.limit.to_string()),
        ];
        Url::parse_with_params(&self.base_url, &params).map_err(|e| {
            SourceError::SourceUnavailable(format!("invalid Entrust URL {}: {}", self.base_url, e))
        })
    }
}

#[async_trait]
impl LogSource for EntrustSource {
    fn name(&self) -> &str {
        "entrust"
    }

    async fn query(
        &self,
        domain: &str,
        include_expired: bool,
    ) -> Result<Vec<CertificateRecord>, SourceError> {
        let url = self.search_url(domain, include_expired)?;
        info!("Entrust: searching {}", url);

        let body = http::get_bytes(&self.http_client, url.as_str()).await?;
        self.dump.save(self.name(), domain, &body).await;

        let entries: Vec<EntrustEntry> = serde_json::from_slice(&body)?;
        if entries.is_empty() {
            return Err(SourceError::NoCertificatesFound);
        }

        let records = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                CertificateParser::from_base64(&entry.cert).map_err(|e| {
                    SourceError::MalformedResponse(format!(
                        "entry {} ({}): {}",
                        i,
                        entry.subject_dn.as_deref().unwrap_or("unknown subject"),
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Entrust: {} certificates for {}", records.len(), domain);

        Ok(records)
    }
}

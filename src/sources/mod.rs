// src/sources/mod.rs
//! CT log search providers
//!
//! Every provider is a [`LogSource`]: one `query` per domain, returning the
//! decoded certificates in provider order. Provider-specific response shapes
//! stay inside the adapter; the aggregator only ever sees records.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::SourcesConfig;
use crate::error::SourceError;
use crate::output::sanitize_file_name;
use crate::types::CertificateRecord;

pub mod crtsh;
pub mod entrust;
pub mod types;

pub use crtsh::CrtShSource;
pub use entrust::EntrustSource;

/// A CT log search provider
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Short provider name used in logs and the per-domain report
    fn name(&self) -> &str;

    /// Query all certificates logged for `domain`.
    ///
    /// An empty result is reported as [`SourceError::NoCertificatesFound`].
    async fn query(
        &self,
        domain: &str,
        include_expired: bool,
    ) -> Result<Vec<CertificateRecord>, SourceError>;
}

/// Optional on-disk copy of raw provider responses, for replaying odd answers
#[derive(Debug, Clone, Default)]
pub struct ResponseDump {
    dir: Option<PathBuf>,
}

impl ResponseDump {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Write `body` to `{dir}/{source}_{domain}.json`. Failures are only logged.
    pub async fn save(&self, source: &str, domain: &str, body: &[u8]) {
        let Some(dir) = &self.dir else {
            return;
        };

        let file_name = sanitize_file_name(&format!("{}_{}.json", source, domain));
        let path = dir.join(file_name);

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            debug!("Could not create response dump directory {:?}: {}", dir, e);
            return;
        }
        match tokio::fs::write(&path, body).await {
            Ok(()) => debug!("Saved raw {} response for {} to {:?}", source, domain, path),
            Err(e) => debug!("Could not save raw {} response to {:?}: {}", source, path, e),
        }
    }
}

/// Instantiate every provider enabled in the configuration, in a fixed order
pub fn from_config(config: &SourcesConfig, client: &reqwest::Client) -> Vec<Arc<dyn LogSource>> {
    let dump = ResponseDump::new(config.dump_responses_dir.as_ref().map(PathBuf::from));
    let mut sources: Vec<Arc<dyn LogSource>> = Vec::new();

    if config.crtsh.enabled {
        sources.push(Arc::new(CrtShSource::new(
            config.crtsh.base_url.clone(),
            client.clone(),
            dump.clone(),
        )));
    }

    if config.entrust.enabled {
        sources.push(Arc::new(EntrustSource::new(
            config.entrust.base_url.clone(),
            config.entrust.limit,
            client.clone(),
            dump,
        )));
    }

    info!(
        "Enabled CT log sources: {}",
        sources.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
    );

    sources
}

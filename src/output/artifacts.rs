// src/output/artifacts.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{sanitize_file_name, ArtifactSink};

/// Writes CRLs to `{crl_dir}/{issuer}.crl` and CA certificates to
/// `{ca_dir}/{issuer}_{subject}.cer`
#[derive(Debug, Clone)]
pub struct DirectorySink {
    ca_dir: PathBuf,
    crl_dir: PathBuf,
}

impl DirectorySink {
    pub fn new(ca_dir: impl Into<PathBuf>, crl_dir: impl Into<PathBuf>) -> Self {
        Self {
            ca_dir: ca_dir.into(),
            crl_dir: crl_dir.into(),
        }
    }

    /// Create both target directories if missing
    pub async fn prepare(&self) -> Result<()> {
        for dir in [&self.ca_dir, &self.crl_dir] {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory {:?}", dir))?;
        }
        Ok(())
    }

    pub fn crl_path(&self, issuer_cn: &str) -> PathBuf {
        self.crl_dir
            .join(format!("{}.crl", sanitize_file_name(issuer_cn)))
    }

    pub fn ca_certificate_path(&self, name: &str) -> PathBuf {
        self.ca_dir.join(format!("{}.cer", sanitize_file_name(name)))
    }
}

/// Write to a temporary sibling first, then rename over the target
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, bytes)
        .await
        .with_context(|| format!("Failed to write temporary file {:?}", temp_path))?;

    fs::rename(&temp_path, path)
        .await
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn store_crl(&self, issuer_cn: &str, bytes: &[u8]) -> Result<()> {
        write_atomic(&self.crl_path(issuer_cn), bytes).await
    }

    async fn store_ca_certificate(&self, name: &str, bytes: &[u8]) -> Result<()> {
        write_atomic(&self.ca_certificate_path(name), bytes).await
    }
}

// src/output/mod.rs
//! Everything the run leaves on disk
//!
//! Two report files derived from the finalized certificate set, plus the
//! artifact sink the chain resolver hands CRLs and CA certificates to.

use async_trait::async_trait;

pub mod artifacts;
pub mod csv;
pub mod dns_list;

pub use artifacts::DirectorySink;

/// Persistence for resolved chain artifacts
///
/// Names are the logical artifact names (issuer CN for CRLs,
/// `{issuer}_{subject}` for CA certificates). Storing the same name twice
/// overwrites the first copy.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn store_crl(&self, issuer_cn: &str, bytes: &[u8]) -> anyhow::Result<()>;

    async fn store_ca_certificate(&self, name: &str, bytes: &[u8]) -> anyhow::Result<()>;
}

/// Make a certificate-derived name safe to use as a single path component
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" => "_".to_string(),
        "." | ".." => cleaned.replace('.', "_"),
        _ => cleaned,
    }
}

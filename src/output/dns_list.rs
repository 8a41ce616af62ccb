// src/output/dns_list.rs
//! `certificate_domains_found.txt`: every name the certificates cover

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::types::CertificateRecord;

/// Subject CNs and SAN DNS names in certificate order, first occurrence wins.
/// Empty names are left out.
pub fn collect_names(certificates: &[CertificateRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for cert in certificates {
        let candidates = std::iter::once(cert.subject_cn()).chain(cert.dns_names().iter().map(String::as_str));
        for name in candidates {
            if !name.is_empty() && seen.insert(name) {
                names.push(name.to_string());
            }
        }
    }

    names
}

/// Write one name per line to `path`
pub fn write_names_file(path: &Path, certificates: &[CertificateRecord]) -> Result<usize> {
    let names = collect_names(certificates);
    let mut contents = names.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }

    std::fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;

    info!("Wrote {} distinct names to {:?}", names.len(), path);
    Ok(names.len())
}

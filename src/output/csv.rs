// src/output/csv.rs
//! `certificates.csv`: one `;`-separated row per certificate

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::types::CertificateRecord;

const HEADER: [&str; 7] = [
    "Serial Number",
    "Precertificate",
    "Issuer Common Name",
    "Subject Common Name",
    "DNS Names",
    "Valid from",
    "Valid till",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Write the header and one row per certificate, in the given order
pub fn write_certificates<W: Write>(writer: W, certificates: &[CertificateRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);

    writer.write_record(HEADER)?;
    for cert in certificates {
        writer.write_record(row(cert))?;
    }
    writer.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write the listing to it
pub fn write_certificates_file(path: &Path, certificates: &[CertificateRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_certificates(file, certificates).with_context(|| format!("Failed to write {:?}", path))?;

    info!("Wrote {} certificates to {:?}", certificates.len(), path);
    Ok(())
}

fn row(cert: &CertificateRecord) -> [String; 7] {
    [
        cert.serial().to_string(),
        cert.is_precertificate().to_string(),
        cert.issuer_cn().to_string(),
        cert.subject_cn().to_string(),
        cert.dns_names().join(","),
        cert.not_before().format(TIME_FORMAT).to_string(),
        cert.not_after().format(TIME_FORMAT).to_string(),
    ]
}

// src/types.rs
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use x509_parser::num_bigint::BigUint;

/// OID of the CT poison extension that marks a precertificate
pub const CT_POISON_OID: &str = "1.3.6.1.4.1.11129.2.4.3";

/// A decoded certificate as discovered in a CT log (or fetched from an AIA URL).
///
/// Records only come out of [`crate::cert_parser::CertificateParser`], so every
/// field is derived from `raw` and the record is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    pub(crate) serial: BigUint,
    pub(crate) issuer_cn: String,
    pub(crate) subject_cn: String,
    pub(crate) dns_names: Vec<String>,
    pub(crate) not_before: DateTime<Utc>,
    pub(crate) not_after: DateTime<Utc>,
    pub(crate) raw: Vec<u8>,
    pub(crate) unhandled_critical_extensions: BTreeSet<String>,
    pub(crate) aia_issuer_urls: Vec<String>,
    pub(crate) crl_urls: Vec<String>,
}

impl CertificateRecord {
    pub fn serial(&self) -> &BigUint {
        &self.serial
    }

    /// Issuer common name, empty if the issuer DN carries none
    pub fn issuer_cn(&self) -> &str {
        &self.issuer_cn
    }

    /// Subject common name, empty if the subject DN carries none
    pub fn subject_cn(&self) -> &str {
        &self.subject_cn
    }

    /// DNS names from the Subject Alternative Name extension, in certificate order
    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// The DER bytes this record was decoded from
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Critical extensions the decoder does not interpret, as dotted OIDs
    pub fn unhandled_critical_extensions(&self) -> &BTreeSet<String> {
        &self.unhandled_critical_extensions
    }

    /// CA Issuers URLs from the Authority Information Access extension
    pub fn aia_issuer_urls(&self) -> &[String] {
        &self.aia_issuer_urls
    }

    /// URIs from the CRL Distribution Points extension
    pub fn crl_urls(&self) -> &[String] {
        &self.crl_urls
    }

    /// True iff the CT poison extension is among the unhandled critical extensions
    pub fn is_precertificate(&self) -> bool {
        self.unhandled_critical_extensions.contains(CT_POISON_OID)
    }

    /// Issuer CN equals subject CN; the chain walk stops here
    pub fn is_self_issued(&self) -> bool {
        self.issuer_cn == self.subject_cn
    }

    /// SHA-256 over the DER encoding, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.raw);
        hex::encode(hasher.finalize())
    }

    /// Artifact name for this certificate when stored as a CA certificate
    pub fn ca_artifact_name(&self) -> String {
        format!("{}_{}", self.issuer_cn, self.subject_cn)
    }
}

impl fmt::Display for CertificateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (serial {}, issued by {}, valid from {})",
            self.subject_cn,
            self.serial,
            self.issuer_cn,
            self.not_before.format("%Y-%m-%d")
        )?;
        if self.is_precertificate() {
            write!(f, " [precert]")?;
        }
        Ok(())
    }
}

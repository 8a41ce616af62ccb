// src/cert_parser.rs
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use x509_parser::extensions::{DistributionPointName, ParsedExtension};
use x509_parser::prelude::*;

use crate::error::DecodeError;
use crate::types::CertificateRecord;

/// AIA access method pointing at the issuing CA certificate
const OID_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

/// Critical extensions the record interprets. Anything else marked critical
/// ends up in `unhandled_critical_extensions`.
const HANDLED_CRITICAL_EXTENSIONS: &[&str] = &[
    "2.5.29.14",         // Subject Key Identifier
    "2.5.29.15",         // Key Usage
    "2.5.29.17",         // Subject Alternative Name
    "2.5.29.19",         // Basic Constraints
    "2.5.29.30",         // Name Constraints
    "2.5.29.31",         // CRL Distribution Points
    "2.5.29.32",         // Certificate Policies
    "2.5.29.33",         // Policy Mappings
    "2.5.29.35",         // Authority Key Identifier
    "2.5.29.36",         // Policy Constraints
    "2.5.29.37",         // Extended Key Usage
    "2.5.29.54",         // Inhibit Any Policy
    "1.3.6.1.5.5.7.1.1", // Authority Info Access
];

/// Decodes certificate blobs into [`CertificateRecord`]s
pub struct CertificateParser;

impl CertificateParser {
    /// Decode a DER-encoded certificate
    pub fn from_der(der_bytes: &[u8]) -> Result<CertificateRecord, DecodeError> {
        let (rest, cert) = X509Certificate::from_der(der_bytes)
            .map_err(|e| DecodeError::InvalidDer(format!("{:?}", e)))?;
        if !rest.is_empty() {
            return Err(DecodeError::InvalidDer(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }

        let mut dns_names = Vec::new();
        let mut aia_issuer_urls = Vec::new();
        let mut crl_urls = Vec::new();
        let mut unhandled_critical_extensions = BTreeSet::new();

        for ext in cert.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::SubjectAlternativeName(san) => {
                    for name in &san.general_names {
                        if let GeneralName::DNSName(dns_name) = name {
                            dns_names.push(dns_name.to_string());
                        }
                    }
                }
                ParsedExtension::AuthorityInfoAccess(aia) => {
                    for access_desc in &aia.accessdescs {
                        if access_desc.access_method.to_id_string() == OID_CA_ISSUERS {
                            if let GeneralName::URI(uri) = &access_desc.access_location {
                                aia_issuer_urls.push(uri.to_string());
                            }
                        }
                    }
                }
                ParsedExtension::CRLDistributionPoints(crl_dp) => {
                    for point in &crl_dp.points {
                        if let Some(DistributionPointName::FullName(names)) =
                            &point.distribution_point
                        {
                            for name in names {
                                if let GeneralName::URI(uri) = name {
                                    crl_urls.push(uri.to_string());
                                }
                            }
                        }
                    }
                }
                _ => {}
            }

            if ext.critical {
                let oid = ext.oid.to_id_string();
                if !HANDLED_CRITICAL_EXTENSIONS.contains(&oid.as_str()) {
                    unhandled_critical_extensions.insert(oid);
                }
            }
        }

        let not_before = Self::to_datetime(cert.validity().not_before.timestamp())?;
        let not_after = Self::to_datetime(cert.validity().not_after.timestamp())?;

        Ok(CertificateRecord {
            serial: cert.tbs_certificate.serial.clone(),
            issuer_cn: Self::common_name(cert.issuer()),
            subject_cn: Self::common_name(cert.subject()),
            dns_names,
            not_before,
            not_after,
            raw: der_bytes.to_vec(),
            unhandled_critical_extensions,
            aia_issuer_urls,
            crl_urls,
        })
    }

    /// Decode the first PEM block in `pem_bytes`
    pub fn from_pem(pem_bytes: &[u8]) -> Result<CertificateRecord, DecodeError> {
        let (_, pem) = x509_parser::pem::parse_x509_pem(Self::skip_whitespace(pem_bytes))
            .map_err(|e| DecodeError::InvalidPem(format!("{:?}", e)))?;
        Self::from_der(&pem.contents)
    }

    /// Decode a standard base64 DER blob, as embedded in JSON provider responses
    pub fn from_base64(encoded: &str) -> Result<CertificateRecord, DecodeError> {
        use base64::Engine;
        let der_bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
        Self::from_der(&der_bytes)
    }

    /// Accept either PEM or DER, whichever the server chose to send
    pub fn from_pem_or_der(bytes: &[u8]) -> Result<CertificateRecord, DecodeError> {
        if Self::looks_like_pem(bytes) {
            Self::from_pem(bytes)
        } else {
            Self::from_der(bytes)
        }
    }

    fn looks_like_pem(bytes: &[u8]) -> bool {
        Self::skip_whitespace(bytes).starts_with(b"-----BEGIN")
    }

    fn skip_whitespace(bytes: &[u8]) -> &[u8] {
        let start = bytes
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(bytes.len());
        &bytes[start..]
    }

    /// First CN attribute of a distinguished name, empty when absent
    fn common_name(name: &X509Name) -> String {
        for rdn in name.iter() {
            for attr in rdn.iter() {
                if attr.attr_type() == &x509_parser::oid_registry::OID_X509_COMMON_NAME {
                    if let Ok(cn) = attr.attr_value().as_str() {
                        return cn.to_string();
                    }
                }
            }
        }
        String::new()
    }

    fn to_datetime(timestamp: i64) -> Result<DateTime<Utc>, DecodeError> {
        DateTime::from_timestamp(timestamp, 0).ok_or(DecodeError::InvalidValidity(timestamp))
    }
}

// src/sources/types.rs
use serde::{Deserialize, Serialize};

/// One row of crt.sh's `output=json` search response.
///
/// crt.sh returns one row per (certificate, matching name) pair, so the same
/// certificate id can appear several times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrtShEntry {
    /// Certificate id, used for `?d={id}` downloads
    #[serde(alias = "min_cert_id")]
    pub id: u64,
    #[serde(default)]
    pub issuer_ca_id: Option<u64>,
    #[serde(default)]
    pub issuer_name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub name_value: String,
    #[serde(default)]
    pub not_before: Option<String>,
    #[serde(default)]
    pub not_after: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
}

/// Subject alternative name as reported by the Entrust CT search API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrustSan {
    #[serde(rename = "type", default)]
    pub san_type: i32,
    #[serde(rename = "valueReversed", default)]
    pub value_reversed: String,
}

/// One certificate of the Entrust CT search response; `cert` is base64 DER
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrustEntry {
    pub cert: String,
    #[serde(default)]
    pub thumbprint: Option<String>,
    #[serde(rename = "issuerDN", default)]
    pub issuer_dn: Option<String>,
    #[serde(default)]
    pub sn: Option<String>,
    #[serde(rename = "subjectDN", default)]
    pub subject_dn: Option<String>,
    #[serde(rename = "signAlg", default)]
    pub sign_alg: Option<String>,
    #[serde(default)]
    pub san: Vec<EntrustSan>,
    #[serde(rename = "validFrom", default)]
    pub valid_from: Option<String>,
    #[serde(rename = "validTo", default)]
    pub valid_to: Option<String>,
}

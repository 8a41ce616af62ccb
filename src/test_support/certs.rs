// src/test_support/certs.rs
//! rcgen certificate builder shared by unit and integration tests

use rcgen::{
    BasicConstraints, CertificateParams, CrlDistributionPoint, CustomExtension,
    DistinguishedName, DnType, IsCa, KeyPair, SerialNumber,
};

/// Private-arc OID carried by every fixture. rcgen leaves the extensions
/// block out entirely when only CDP is set, so this keeps CDP-only
/// certificates intact.
const FIXTURE_MARKER_OID: &[u64] = &[1, 3, 6, 1, 4, 1, 32473, 1];

/// Builder for throwaway test certificates
#[derive(Debug, Clone)]
pub struct TestCert {
    subject: String,
    issuer: Option<String>,
    sans: Vec<String>,
    aia: Vec<String>,
    cdp: Vec<String>,
    critical: Vec<Vec<u64>>,
    not_before: (i32, u8, u8),
    serial: Option<Vec<u8>>,
    ca: bool,
}

impl TestCert {
    /// Self-issued certificate with the given subject CN
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            issuer: None,
            sans: Vec::new(),
            aia: Vec::new(),
            cdp: Vec::new(),
            critical: Vec::new(),
            not_before: (2020, 1, 1),
            serial: None,
            ca: false,
        }
    }

    pub fn issued_by(mut self, issuer: &str) -> Self {
        self.issuer = Some(issuer.to_string());
        self
    }

    pub fn sans(mut self, names: &[&str]) -> Self {
        self.sans = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn aia(mut self, url: &str) -> Self {
        self.aia.push(url.to_string());
        self
    }

    pub fn cdp(mut self, url: &str) -> Self {
        self.cdp.push(url.to_string());
        self
    }

    pub fn precert(self) -> Self {
        self.critical_extension(&[1, 3, 6, 1, 4, 1, 11129, 2, 4, 3])
    }

    pub fn critical_extension(mut self, oid: &[u64]) -> Self {
        self.critical.push(oid.to_vec());
        self
    }

    pub fn not_before(mut self, year: i32, month: u8, day: u8) -> Self {
        self.not_before = (year, month, day);
        self
    }

    pub fn serial(mut self, bytes: &[u8]) -> Self {
        self.serial = Some(bytes.to_vec());
        self
    }

    pub fn ca(mut self) -> Self {
        self.ca = true;
        self
    }

    pub fn der(&self) -> Vec<u8> {
        self.build().der().to_vec()
    }

    pub fn pem(&self) -> String {
        self.build().pem()
    }

    fn build(&self) -> rcgen::Certificate {
        let mut params = CertificateParams::new(self.sans.clone()).unwrap();
        params.distinguished_name = named(&self.subject);

        let (year, month, day) = self.not_before;
        params.not_before = rcgen::date_time_ymd(year, month, day);
        params.not_after = rcgen::date_time_ymd(year + 1, month, day);

        if self.ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        }
        if let Some(serial) = &self.serial {
            params.serial_number = Some(SerialNumber::from_slice(serial));
        }
        if !self.cdp.is_empty() {
            params.crl_distribution_points = vec![CrlDistributionPoint {
                uris: self.cdp.clone(),
            }];
        }
        if !self.aia.is_empty() {
            params.custom_extensions.push(aia_extension(&self.aia));
        }
        params
            .custom_extensions
            .push(CustomExtension::from_oid_content(FIXTURE_MARKER_OID, vec![0x05, 0x00]));
        for oid in &self.critical {
            // ASN.1 NULL body, as the CT poison extension carries
            let mut ext = CustomExtension::from_oid_content(oid, vec![0x05, 0x00]);
            ext.set_criticality(true);
            params.custom_extensions.push(ext);
        }

        let key = KeyPair::generate().unwrap();
        match &self.issuer {
            None => params.self_signed(&key).unwrap(),
            Some(issuer) => {
                let mut issuer_params = CertificateParams::new(Vec::<String>::new()).unwrap();
                issuer_params.distinguished_name = named(issuer);
                issuer_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
                let issuer_key = KeyPair::generate().unwrap();
                let issuer_cert = issuer_params.self_signed(&issuer_key).unwrap();
                params.signed_by(&key, &issuer_cert, &issuer_key).unwrap()
            }
        }
    }
}

fn named(cn: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    dn
}

/// AuthorityInfoAccess with one caIssuers URI per url
fn aia_extension(urls: &[String]) -> CustomExtension {
    // OID 1.3.6.1.5.5.7.48.2 (caIssuers)
    const CA_ISSUERS: [u8; 10] = [0x06, 0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x02];

    let mut descriptions = Vec::new();
    for url in urls {
        let mut description = CA_ISSUERS.to_vec();
        description.extend(der_tlv(0x86, url.as_bytes()));
        descriptions.extend(der_tlv(0x30, &description));
    }

    CustomExtension::from_oid_content(&[1, 3, 6, 1, 5, 5, 7, 1, 1], der_tlv(0x30, &descriptions))
}

fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.extend([0x81, len as u8]);
    } else {
        out.extend([0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(content);
    out
}

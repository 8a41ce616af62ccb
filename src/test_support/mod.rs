// src/test_support/mod.rs
//! Fixtures for unit tests: rcgen certificates, an in-memory fetcher and sink

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::chain::ReferenceFetcher;
use crate::http::HttpError;
use crate::output::ArtifactSink;

mod certs;

pub use certs::TestCert;

/// Serves canned bodies by URL and records every request
#[derive(Debug, Default)]
pub struct MapFetcher {
    bodies: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl ReferenceFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| HttpError::Status("404 Not Found".to_string()))
    }
}

/// Keeps stored artifacts in memory, or rejects them all
#[derive(Debug, Default)]
pub struct MemorySink {
    crls: Mutex<BTreeMap<String, Vec<u8>>>,
    ca_certificates: Mutex<BTreeMap<String, Vec<u8>>>,
    fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn crls(&self) -> BTreeMap<String, Vec<u8>> {
        self.crls.lock().unwrap().clone()
    }

    pub fn ca_certificates(&self) -> BTreeMap<String, Vec<u8>> {
        self.ca_certificates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn store_crl(&self, issuer_cn: &str, bytes: &[u8]) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("disk full");
        }
        self.crls
            .lock()
            .unwrap()
            .insert(issuer_cn.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn store_ca_certificate(&self, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("disk full");
        }
        self.ca_certificates
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

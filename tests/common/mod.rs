// Shared certificate fixtures for integration tests
#![allow(dead_code)]

#[path = "../../src/test_support/certs.rs"]
mod certs;

pub use certs::TestCert;

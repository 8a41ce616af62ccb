// src/chain/mod.rs
//! Recursive download of CA certificates (AIA) and CRLs (CDP)

pub mod fetcher;
pub mod ledger;
pub mod resolver;

pub use fetcher::{HttpFetcher, ReferenceFetcher};
pub use ledger::FetchLedger;
pub use resolver::{ChainResolver, ResolveSummary};

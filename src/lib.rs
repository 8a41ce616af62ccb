// src/lib.rs
// Library interface for ct-explorer
pub mod aggregator;
pub mod cert_parser;
pub mod chain;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domains;
pub mod error;
pub mod http;
pub mod output;
pub mod progress;
pub mod sources;
pub mod stats;
pub mod types;

#[cfg(test)]
mod test_support;

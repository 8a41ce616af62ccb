// src/stats.rs
//! Final tally of a run

use colored::Colorize;
use std::time::Duration;
use tracing::info;

use crate::aggregator::AggregatedSet;
use crate::chain::ResolveSummary;

/// Everything the run reports at the end, whether or not anything worked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub domains: usize,
    pub certificates: usize,
    pub precertificates: usize,
    pub distinct_names: usize,
    pub failed_domains: usize,
    pub source_failures: usize,
    /// `None` when chain resolution was disabled
    pub chain: Option<ChainTally>,
    pub cancelled: bool,
    pub elapsed_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainTally {
    pub fetches: usize,
    pub crls_written: usize,
    pub ca_certificates_written: usize,
    pub roots_reached: usize,
    pub reference_failures: usize,
    pub store_failures: usize,
    pub fetch_limit_reached: bool,
}

impl From<&ResolveSummary> for ChainTally {
    fn from(summary: &ResolveSummary) -> Self {
        Self {
            fetches: summary.fetches,
            crls_written: summary.crls_written,
            ca_certificates_written: summary.ca_certificates_written,
            roots_reached: summary.roots_reached,
            reference_failures: summary.errors.len(),
            store_failures: summary.store_failures,
            fetch_limit_reached: summary.fetch_limit_reached,
        }
    }
}

impl RunSummary {
    pub fn new(domains: usize, set: &AggregatedSet, distinct_names: usize) -> Self {
        Self {
            domains,
            certificates: set.certificates.len(),
            precertificates: set.precertificate_count,
            distinct_names,
            failed_domains: set.failed_domains().len(),
            source_failures: set.failure_count(),
            ..Self::default()
        }
    }

    pub fn with_chain(mut self, summary: &ResolveSummary) -> Self {
        self.cancelled |= summary.cancelled;
        self.chain = Some(ChainTally::from(summary));
        self
    }

    pub fn finish(mut self, elapsed: Duration, cancelled: bool) -> Self {
        self.elapsed_secs = elapsed.as_secs();
        self.cancelled |= cancelled;
        self
    }

    pub fn log(&self) {
        info!(
            domains = self.domains,
            certificates = self.certificates,
            precertificates = self.precertificates,
            failed_domains = self.failed_domains,
            crls = self.chain.as_ref().map_or(0, |c| c.crls_written),
            ca_certificates = self.chain.as_ref().map_or(0, |c| c.ca_certificates_written),
            reference_failures = self.chain.as_ref().map_or(0, |c| c.reference_failures),
            cancelled = self.cancelled,
            "Run finished in {}",
            format_elapsed(self.elapsed_secs)
        );
    }

    /// Multi-line report for stdout
    pub fn render(&self, use_colors: bool) -> String {
        let title = if self.cancelled {
            "Run cancelled"
        } else {
            "Run complete"
        };

        let mut lines = Vec::new();
        lines.push(if use_colors {
            if self.cancelled {
                title.yellow().bold().to_string()
            } else {
                title.green().bold().to_string()
            }
        } else {
            title.to_string()
        });

        let mut row = |label: &str, value: String, bad: bool| {
            let value = if use_colors && bad {
                value.red().to_string()
            } else {
                value
            };
            let label = format!("{:<24}", format!("{}:", label));
            if use_colors {
                lines.push(format!("  {} {}", label.dimmed(), value));
            } else {
                lines.push(format!("  {} {}", label, value));
            }
        };

        row("Domains", self.domains.to_string(), false);
        row("Certificates", self.certificates.to_string(), false);
        row("Precertificates", self.precertificates.to_string(), false);
        row("Distinct names", self.distinct_names.to_string(), false);
        row(
            "Domains with failures",
            format!("{} ({} failed queries)", self.failed_domains, self.source_failures),
            self.failed_domains > 0,
        );

        match &self.chain {
            Some(chain) => {
                row("Reference fetches", chain.fetches.to_string(), false);
                row("CRLs written", chain.crls_written.to_string(), false);
                row("CA certificates written", chain.ca_certificates_written.to_string(), false);
                row("Roots reached", chain.roots_reached.to_string(), false);
                row(
                    "Reference failures",
                    chain.reference_failures.to_string(),
                    chain.reference_failures > 0,
                );
                if chain.store_failures > 0 {
                    row("Write failures", chain.store_failures.to_string(), true);
                }
                if chain.fetch_limit_reached {
                    row("Fetch limit", "reached".to_string(), true);
                }
            }
            None => row("Chain resolution", "skipped".to_string(), false),
        }

        row("Elapsed", format_elapsed(self.elapsed_secs), false);

        lines.join("\n")
    }
}

/// Format a duration in seconds as `1h 2m 3s`
pub fn format_elapsed(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

// src/aggregator.rs
//! Merges per-domain, per-source query results into one ordered certificate set

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::types::CertificateRecord;

/// What one source answered for one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Number of records ingested
    Found(usize),
    /// The provider had nothing for this domain
    Empty,
    Failed(SourceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    pub outcome: QueryOutcome,
}

/// Per-domain outcomes, keyed by domain
pub type DomainReport = BTreeMap<String, Vec<SourceReport>>;

/// Working collection of every record returned by every source
#[derive(Debug, Default)]
pub struct Aggregator {
    records: Vec<CertificateRecord>,
    outcomes: DomainReport,
}

/// Result of [`Aggregator::finalize`]
#[derive(Debug, Clone)]
pub struct AggregatedSet {
    /// All ingested records, ascending by not-before
    pub certificates: Vec<CertificateRecord>,
    pub precertificate_count: usize,
    pub outcomes: DomainReport,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one source's output for one domain. No deduplication happens here.
    pub fn ingest(&mut self, records: Vec<CertificateRecord>) {
        self.records.extend(records);
    }

    /// Ingest a query result and remember its outcome for the domain report.
    ///
    /// Failures are recorded, never propagated.
    pub fn record(
        &mut self,
        domain: &str,
        source: &str,
        result: Result<Vec<CertificateRecord>, SourceError>,
    ) {
        let outcome = match result {
            Ok(records) if records.is_empty() => QueryOutcome::Empty,
            Ok(records) => {
                let count = records.len();
                debug!(domain, source, count, "Ingesting certificates");
                self.ingest(records);
                QueryOutcome::Found(count)
            }
            Err(e) if e.is_failure() => {
                warn!(domain, source, error = %e, "Source query failed");
                QueryOutcome::Failed(e)
            }
            Err(_) => {
                info!(domain, source, "No certificates found");
                QueryOutcome::Empty
            }
        };

        self.outcomes
            .entry(domain.to_string())
            .or_default()
            .push(SourceReport {
                source: source.to_string(),
                outcome,
            });
    }

    /// Number of records ingested so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sort the working collection by not-before and count precertificates.
    ///
    /// Records with equal not-before are ordered by their DER bytes, so the
    /// result does not depend on ingestion order. The sort is stable, which
    /// only matters for byte-identical records.
    pub fn finalize(self) -> AggregatedSet {
        let mut certificates = self.records;
        certificates.sort_by(|a, b| {
            a.not_before()
                .cmp(&b.not_before())
                .then_with(|| a.raw().cmp(b.raw()))
        });

        let precertificate_count = certificates.iter().filter(|c| c.is_precertificate()).count();

        info!(
            "Aggregated {} certificates ({} precertificates)",
            certificates.len(),
            precertificate_count
        );

        AggregatedSet {
            certificates,
            precertificate_count,
            outcomes: self.outcomes,
        }
    }
}

impl AggregatedSet {
    /// Domains where at least one source failed (empty results do not count)
    pub fn failed_domains(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, reports)| {
                reports
                    .iter()
                    .any(|r| matches!(r.outcome, QueryOutcome::Failed(_)))
            })
            .map(|(domain, _)| domain.as_str())
            .collect()
    }

    /// Total number of failed source queries across all domains
    pub fn failure_count(&self) -> usize {
        self.outcomes
            .values()
            .flatten()
            .filter(|r| matches!(r.outcome, QueryOutcome::Failed(_)))
            .count()
    }
}

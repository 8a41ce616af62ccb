// src/coordinator.rs
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::aggregator::{AggregatedSet, Aggregator};
use crate::error::SourceError;
use crate::progress::ProgressIndicator;
use crate::sources::LogSource;
use crate::types::CertificateRecord;

type SourceResult = (String, Result<Vec<CertificateRecord>, SourceError>);

/// Queries every source for every domain and aggregates the answers
pub struct Explorer {
    sources: Vec<Arc<dyn LogSource>>,
    include_expired: bool,
    concurrency: usize,
    progress: ProgressIndicator,
}

impl Explorer {
    pub fn new(sources: Vec<Arc<dyn LogSource>>, include_expired: bool, concurrency: usize) -> Self {
        Self {
            sources,
            include_expired,
            concurrency: concurrency.max(1),
            progress: ProgressIndicator::new(false),
        }
    }

    pub fn with_progress(mut self, progress: ProgressIndicator) -> Self {
        self.progress = progress;
        self
    }

    /// Collect the certificates of all `domains`.
    ///
    /// Up to `concurrency` domains are in flight at once; the sources for one
    /// domain are queried one after the other. Results are ingested in domain
    /// order. Once `shutdown` is raised no further domain is started.
    pub async fn collect(&self, domains: &[String], shutdown: &watch::Receiver<bool>) -> AggregatedSet {
        info!(
            "Querying {} sources for {} domains ({} in parallel)",
            self.sources.len(),
            domains.len(),
            self.concurrency
        );

        let mut results = stream::iter(domains)
            .map(|domain| self.query_domain(domain, shutdown))
            .buffered(self.concurrency);

        let mut aggregator = Aggregator::new();
        let mut done = 0;
        let mut skipped = 0;

        while let Some((domain, answers)) = results.next().await {
            let Some(answers) = answers else {
                skipped += 1;
                continue;
            };

            for (source, result) in answers {
                aggregator.record(domain, &source, result);
            }

            done += 1;
            self.progress
                .domain_finished(domain, done, domains.len(), aggregator.len());
        }

        if skipped > 0 {
            warn!("Shutdown requested, {} domains were not queried", skipped);
        }

        aggregator.finalize()
    }

    /// `None` when the domain was skipped because of shutdown
    async fn query_domain<'a>(
        &self,
        domain: &'a String,
        shutdown: &watch::Receiver<bool>,
    ) -> (&'a String, Option<Vec<SourceResult>>) {
        if *shutdown.borrow() {
            return (domain, None);
        }

        let mut answers = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            debug!(domain = %domain, source = source.name(), "Querying");
            let result = source.query(domain, self.include_expired).await;
            answers.push((source.name().to_string(), result));
        }

        (domain, Some(answers))
    }
}

// src/chain/resolver.rs
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::fetcher::ReferenceFetcher;
use super::ledger::FetchLedger;
use crate::cert_parser::CertificateParser;
use crate::error::ResolveError;
use crate::output::ArtifactSink;
use crate::types::CertificateRecord;

/// Counters and errors of one [`ChainResolver::resolve`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Network fetches performed
    pub fetches: usize,
    pub crls_written: usize,
    pub ca_certificates_written: usize,
    /// Self-issued CA certificates where the walk stopped
    pub roots_reached: usize,
    pub ldap_skipped: usize,
    /// References skipped because the ledger already had them
    pub already_visited: usize,
    /// Artifacts fetched but rejected by the sink
    pub store_failures: usize,
    pub errors: Vec<ResolveError>,
    pub cancelled: bool,
    pub fetch_limit_reached: bool,
}

impl ResolveSummary {
    pub fn artifacts_written(&self) -> usize {
        self.crls_written + self.ca_certificates_written
    }
}

enum Admission {
    Fetch,
    Skip,
    Stop,
}

/// Follows CDP and AIA references outward from a set of certificates,
/// storing every CRL and CA certificate it can reach.
///
/// The walk is depth-first over an explicit stack. A fetched CA certificate
/// whose issuer CN equals its subject CN is treated as a root and not
/// expanded further; every other one becomes part of the frontier.
/// Termination on cyclic references relies on the [`FetchLedger`].
pub struct ChainResolver {
    fetcher: Arc<dyn ReferenceFetcher>,
    sink: Arc<dyn ArtifactSink>,
    max_fetches: Option<usize>,
}

impl ChainResolver {
    pub fn new(fetcher: Arc<dyn ReferenceFetcher>, sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            fetcher,
            sink,
            max_fetches: None,
        }
    }

    /// Cap the number of fetches recorded in the ledger, across every
    /// `resolve` call that shares it
    pub fn with_max_fetches(mut self, max_fetches: Option<usize>) -> Self {
        self.max_fetches = max_fetches;
        self
    }

    /// Resolve the chains of every certificate in `frontier`.
    ///
    /// Never fails: fetch and decode problems are collected in the summary.
    /// The shutdown flag is checked before every fetch.
    pub async fn resolve(
        &self,
        frontier: &[CertificateRecord],
        ledger: &mut FetchLedger,
        shutdown: &watch::Receiver<bool>,
    ) -> ResolveSummary {
        let mut summary = ResolveSummary::default();
        let mut pending: Vec<CertificateRecord> = Vec::new();

        'frontier: for cert in frontier {
            if !self.visit(cert, ledger, shutdown, &mut summary, &mut pending).await {
                break;
            }
            while let Some(ca) = pending.pop() {
                if !self.visit(&ca, ledger, shutdown, &mut summary, &mut pending).await {
                    break 'frontier;
                }
            }
        }

        info!(
            "Chain resolution: {} fetches, {} CRLs, {} CA certificates, {} roots, {} errors{}",
            summary.fetches,
            summary.crls_written,
            summary.ca_certificates_written,
            summary.roots_reached,
            summary.errors.len(),
            if summary.cancelled { " (cancelled)" } else { "" }
        );

        summary
    }

    /// Process the CDP and AIA references of one certificate.
    /// Returns false when the run has to stop.
    async fn visit(
        &self,
        cert: &CertificateRecord,
        ledger: &mut FetchLedger,
        shutdown: &watch::Receiver<bool>,
        summary: &mut ResolveSummary,
        pending: &mut Vec<CertificateRecord>,
    ) -> bool {
        for url in cert.crl_urls() {
            match self.admit(url, ledger, shutdown, summary) {
                Admission::Stop => return false,
                Admission::Skip => continue,
                Admission::Fetch => {}
            }

            info!("Fetching CRL: {}", url);
            match self.fetcher.fetch(url).await {
                Ok(body) => {
                    match self.sink.store_crl(cert.issuer_cn(), &body).await {
                        Ok(()) => summary.crls_written += 1,
                        Err(e) => {
                            warn!(url = %url, "Storing CRL for {} failed: {:#}", cert.issuer_cn(), e);
                            summary.store_failures += 1;
                        }
                    }
                }
                Err(e) => record_error(
                    summary,
                    ResolveError::ReferenceFetchFailed {
                        url: url.clone(),
                        detail: e.to_string(),
                    },
                ),
            }
        }

        for url in cert.aia_issuer_urls() {
            match self.admit(url, ledger, shutdown, summary) {
                Admission::Stop => return false,
                Admission::Skip => continue,
                Admission::Fetch => {}
            }

            info!("Fetching CA cert: {}", url);
            let body = match self.fetcher.fetch(url).await {
                Ok(body) => body,
                Err(e) => {
                    record_error(
                        summary,
                        ResolveError::ReferenceFetchFailed {
                            url: url.clone(),
                            detail: e.to_string(),
                        },
                    );
                    continue;
                }
            };

            let ca = match CertificateParser::from_pem_or_der(&body) {
                Ok(ca) => ca,
                Err(e) => {
                    record_error(
                        summary,
                        ResolveError::ReferenceDecodeFailed {
                            url: url.clone(),
                            detail: e.to_string(),
                        },
                    );
                    continue;
                }
            };

            let name = ca.ca_artifact_name();
            match self.sink.store_ca_certificate(&name, &body).await {
                Ok(()) => summary.ca_certificates_written += 1,
                Err(e) => {
                    warn!(url = %url, "Storing CA certificate {} failed: {:#}", name, e);
                    summary.store_failures += 1;
                }
            }

            if ca.is_self_issued() {
                debug!("Reached root: {}", ca.subject_cn());
                summary.roots_reached += 1;
            } else {
                debug!("{} is issued by {}, following its references", ca.subject_cn(), ca.issuer_cn());
                pending.push(ca);
            }
        }

        true
    }

    /// Decide whether `url` gets fetched, recording it in the ledger if so
    fn admit(
        &self,
        url: &str,
        ledger: &mut FetchLedger,
        shutdown: &watch::Receiver<bool>,
        summary: &mut ResolveSummary,
    ) -> Admission {
        if is_ldap(url) {
            debug!(url, "Ignoring LDAP reference");
            summary.ldap_skipped += 1;
            return Admission::Skip;
        }
        if ledger.contains(url) {
            summary.already_visited += 1;
            return Admission::Skip;
        }
        if *shutdown.borrow() {
            info!("Shutdown requested, stopping chain resolution");
            summary.cancelled = true;
            return Admission::Stop;
        }
        if let Some(max) = self.max_fetches {
            if ledger.fetched() >= max {
                warn!("Fetch limit of {} reached, stopping chain resolution", max);
                summary.fetch_limit_reached = true;
                return Admission::Stop;
            }
        }

        ledger.mark_visited(url);
        summary.fetches += 1;
        Admission::Fetch
    }
}

fn is_ldap(url: &str) -> bool {
    url.get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("ldap://"))
}

fn record_error(summary: &mut ResolveSummary, error: ResolveError) {
    warn!("{}", error);
    summary.errors.push(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MapFetcher, MemorySink, TestCert};

    fn leaf(cert: TestCert) -> CertificateRecord {
        CertificateParser::from_der(&cert.der()).unwrap()
    }

    fn resolver(fetcher: &Arc<MapFetcher>, sink: &Arc<MemorySink>) -> ChainResolver {
        ChainResolver::new(fetcher.clone(), sink.clone())
    }

    #[test]
    fn test_is_ldap() {
        assert!(is_ldap("ldap://directory.example.com/cn=CA"));
        assert!(is_ldap("LDAP://directory.example.com/cn=CA"));
        assert!(!is_ldap("ldaps-but-not-really"));
        assert!(!is_ldap("http://ca.example.com/ldap://"));
        assert!(!is_ldap("ldap"));
    }

    #[tokio::test]
    async fn test_walks_to_root_and_stores_artifacts() {
        let root = TestCert::new("Root CA")
            .ca()
            .aia("http://never.example.com/root.cer")
            .cdp("http://crl.example.com/root.crl");
        let intermediate = TestCert::new("Issuing CA")
            .issued_by("Root CA")
            .ca()
            .aia("http://ca.example.com/root.cer")
            .cdp("http://crl.example.com/root.crl");

        let fetcher = Arc::new(
            MapFetcher::new()
                .with("http://ca.example.com/issuing.cer", intermediate.der())
                .with("http://ca.example.com/root.cer", root.der())
                .with("http://crl.example.com/issuing.crl", b"issuing-crl".to_vec())
                .with("http://crl.example.com/root.crl", b"root-crl".to_vec()),
        );
        let sink = Arc::new(MemorySink::default());

        let leaf = leaf(
            TestCert::new("www.example.com")
                .issued_by("Issuing CA")
                .aia("http://ca.example.com/issuing.cer")
                .cdp("http://crl.example.com/issuing.crl"),
        );

        let (_tx, shutdown) = watch::channel(false);
        let mut ledger = FetchLedger::new();
        let summary = resolver(&fetcher, &sink).resolve(&[leaf], &mut ledger, &shutdown).await;

        assert_eq!(summary.fetches, 4);
        assert_eq!(summary.crls_written, 2);
        assert_eq!(summary.ca_certificates_written, 2);
        assert_eq!(summary.roots_reached, 1);
        assert!(summary.errors.is_empty());

        // The root's own AIA is never followed
        assert_eq!(fetcher.call_count("http://never.example.com/root.cer"), 0);

        let crls = sink.crls();
        assert_eq!(crls["Issuing CA"], b"issuing-crl");
        assert_eq!(crls["Root CA"], b"root-crl");

        let cas = sink.ca_certificates();
        assert!(cas.contains_key("Root CA_Issuing CA"));
        assert!(cas.contains_key("Root CA_Root CA"));
    }

    #[tokio::test]
    async fn test_root_terminates_recursion() {
        let root = TestCert::new("Self Signed Root")
            .ca()
            .aia("http://loop.example.com/root.cer")
            .cdp("http://crl.example.com/self.crl");
        let fetcher = Arc::new(MapFetcher::new().with("http://ca.example.com/root.cer", root.der()));
        let sink = Arc::new(MemorySink::default());

        let leaf = leaf(
            TestCert::new("www.example.com")
                .issued_by("Self Signed Root")
                .aia("http://ca.example.com/root.cer"),
        );

        let (_tx, shutdown) = watch::channel(false);
        let summary = resolver(&fetcher, &sink)
            .resolve(&[leaf], &mut FetchLedger::new(), &shutdown)
            .await;

        assert_eq!(summary.roots_reached, 1);
        assert_eq!(fetcher.calls(), vec!["http://ca.example.com/root.cer"]);
        assert!(sink.ca_certificates().contains_key("Self Signed Root_Self Signed Root"));
    }

    #[tokio::test]
    async fn test_reference_cycle_terminates() {
        // A issued by B, B by C, C by A; nobody is self-issued
        let a = TestCert::new("A").issued_by("B").ca().aia("http://pki.example.com/b.cer");
        let b = TestCert::new("B").issued_by("C").ca().aia("http://pki.example.com/c.cer");
        let c = TestCert::new("C").issued_by("A").ca().aia("http://pki.example.com/a.cer");

        let fetcher = Arc::new(
            MapFetcher::new()
                .with("http://pki.example.com/a.cer", a.der())
                .with("http://pki.example.com/b.cer", b.der())
                .with("http://pki.example.com/c.cer", c.der()),
        );
        let sink = Arc::new(MemorySink::default());

        let (_tx, shutdown) = watch::channel(false);
        let summary = resolver(&fetcher, &sink)
            .resolve(&[leaf(a)], &mut FetchLedger::new(), &shutdown)
            .await;

        assert_eq!(summary.fetches, 3);
        assert_eq!(summary.roots_reached, 0);
        for url in [
            "http://pki.example.com/a.cer",
            "http://pki.example.com/b.cer",
            "http://pki.example.com/c.cer",
        ] {
            assert_eq!(fetcher.call_count(url), 1, "{} fetched more than once", url);
        }
        assert_eq!(sink.ca_certificates().len(), 3);
    }

    #[tokio::test]
    async fn test_second_run_with_same_ledger_fetches_nothing() {
        let root = TestCert::new("Root CA").ca();
        let fetcher = Arc::new(
            MapFetcher::new()
                .with("http://ca.example.com/root.cer", root.der())
                .with("http://crl.example.com/root.crl", b"crl".to_vec()),
        );
        let sink = Arc::new(MemorySink::default());
        let resolver = resolver(&fetcher, &sink);

        let leaves = vec![leaf(
            TestCert::new("www.example.com")
                .issued_by("Root CA")
                .aia("http://ca.example.com/root.cer")
                .cdp("http://crl.example.com/root.crl"),
        )];

        let (_tx, shutdown) = watch::channel(false);
        let mut ledger = FetchLedger::new();

        let first = resolver.resolve(&leaves, &mut ledger, &shutdown).await;
        assert_eq!(first.fetches, 2);

        let second = resolver.resolve(&leaves, &mut ledger, &shutdown).await;
        assert_eq!(second.fetches, 0);
        assert_eq!(second.already_visited, 2);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_shared_intermediate_fetched_once_across_leaves() {
        let root = TestCert::new("Root CA").ca();
        let fetcher = Arc::new(MapFetcher::new().with("http://ca.example.com/root.cer", root.der()));
        let sink = Arc::new(MemorySink::default());
        let resolver = resolver(&fetcher, &sink);

        let leaves: Vec<CertificateRecord> = ["a.example.com", "b.example.com", "c.example.com"]
            .iter()
            .map(|cn| {
                leaf(
                    TestCert::new(cn)
                        .issued_by("Root CA")
                        .aia("http://ca.example.com/root.cer"),
                )
            })
            .collect();

        let (_tx, shutdown) = watch::channel(false);
        let mut ledger = FetchLedger::new();
        // One call per leaf, sharing the ledger
        for leaf in &leaves {
            resolver.resolve(std::slice::from_ref(leaf), &mut ledger, &shutdown).await;
        }

        assert_eq!(fetcher.call_count("http://ca.example.com/root.cer"), 1);
    }

    #[tokio::test]
    async fn test_ldap_references_are_skipped_silently() {
        let fetcher = Arc::new(MapFetcher::new());
        let sink = Arc::new(MemorySink::default());

        let leaf = leaf(
            TestCert::new("www.example.com")
                .issued_by("Directory CA")
                .aia("ldap://directory.example.com/cn=Directory%20CA?cACertificate")
                .cdp("ldap://directory.example.com/cn=Directory%20CA?certificateRevocationList"),
        );

        let (_tx, shutdown) = watch::channel(false);
        let mut ledger = FetchLedger::new();
        let summary = resolver(&fetcher, &sink).resolve(&[leaf], &mut ledger, &shutdown).await;

        assert!(fetcher.calls().is_empty());
        assert_eq!(summary.ldap_skipped, 2);
        assert!(summary.errors.is_empty());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_stop_siblings() {
        let fetcher = Arc::new(
            MapFetcher::new().with("http://crl.example.com/second.crl", b"second".to_vec()),
        );
        let sink = Arc::new(MemorySink::default());

        let leaf = leaf(
            TestCert::new("www.example.com")
                .issued_by("Issuing CA")
                .cdp("http://crl.example.com/first.crl")
                .cdp("http://crl.example.com/second.crl")
                .aia("http://ca.example.com/gone.cer"),
        );

        let (_tx, shutdown) = watch::channel(false);
        let mut ledger = FetchLedger::new();
        let summary = resolver(&fetcher, &sink).resolve(&[leaf], &mut ledger, &shutdown).await;

        assert_eq!(summary.fetches, 3);
        assert_eq!(summary.crls_written, 1);
        assert_eq!(summary.errors.len(), 2);
        assert!(summary.errors.iter().all(|e| matches!(e, ResolveError::ReferenceFetchFailed { .. })));
        // Failed URLs stay in the ledger
        assert!(ledger.contains("http://crl.example.com/first.crl"));
    }

    #[tokio::test]
    async fn test_undecodable_ca_is_abandoned() {
        let root = TestCert::new("Root CA").ca();
        let fetcher = Arc::new(
            MapFetcher::new()
                .with("http://ca.example.com/broken.cer", b"<html>moved</html>".to_vec())
                .with("http://ca.example.com/root.cer", root.der()),
        );
        let sink = Arc::new(MemorySink::default());

        let leaf = leaf(
            TestCert::new("www.example.com")
                .issued_by("Root CA")
                .aia("http://ca.example.com/broken.cer")
                .aia("http://ca.example.com/root.cer"),
        );

        let (_tx, shutdown) = watch::channel(false);
        let summary = resolver(&fetcher, &sink)
            .resolve(&[leaf], &mut FetchLedger::new(), &shutdown)
            .await;

        assert_eq!(summary.errors.len(), 1);
        assert!(matches!(
            &summary.errors[0],
            ResolveError::ReferenceDecodeFailed { url, .. } if url == "http://ca.example.com/broken.cer"
        ));
        assert_eq!(summary.ca_certificates_written, 1);
        assert_eq!(summary.roots_reached, 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_before_fetching() {
        let fetcher = Arc::new(MapFetcher::new());
        let sink = Arc::new(MemorySink::default());

        let leaf = leaf(
            TestCert::new("www.example.com")
                .issued_by("Issuing CA")
                .cdp("http://crl.example.com/issuing.crl"),
        );

        let (tx, shutdown) = watch::channel(false);
        tx.send(true).unwrap();

        let mut ledger = FetchLedger::new();
        let summary = resolver(&fetcher, &sink).resolve(&[leaf], &mut ledger, &shutdown).await;

        assert!(summary.cancelled);
        assert_eq!(summary.fetches, 0);
        assert!(fetcher.calls().is_empty());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_limit() {
        let fetcher = Arc::new(MapFetcher::new());
        let sink = Arc::new(MemorySink::default());

        let leaf = leaf(
            TestCert::new("www.example.com")
                .issued_by("Issuing CA")
                .cdp("http://crl.example.com/1.crl")
                .cdp("http://crl.example.com/2.crl")
                .cdp("http://crl.example.com/3.crl"),
        );

        let (_tx, shutdown) = watch::channel(false);
        let summary = resolver(&fetcher, &sink)
            .with_max_fetches(Some(2))
            .resolve(&[leaf], &mut FetchLedger::new(), &shutdown)
            .await;

        assert!(summary.fetch_limit_reached);
        assert_eq!(summary.fetches, 2);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_limit_spans_calls_sharing_a_ledger() {
        let fetcher = Arc::new(MapFetcher::new());
        let sink = Arc::new(MemorySink::default());
        let resolver = resolver(&fetcher, &sink).with_max_fetches(Some(3));

        let leaves: Vec<CertificateRecord> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                leaf(
                    TestCert::new(&format!("{}.example.com", name))
                        .issued_by("Issuing CA")
                        .cdp(&format!("http://crl.example.com/{}-1.crl", name))
                        .cdp(&format!("http://crl.example.com/{}-2.crl", name)),
                )
            })
            .collect();

        let (_tx, shutdown) = watch::channel(false);
        let mut ledger = FetchLedger::new();

        let first = resolver.resolve(&leaves[0..1], &mut ledger, &shutdown).await;
        assert_eq!(first.fetches, 2);
        assert!(!first.fetch_limit_reached);

        let second = resolver.resolve(&leaves[1..2], &mut ledger, &shutdown).await;
        assert_eq!(second.fetches, 1);
        assert!(second.fetch_limit_reached);

        let third = resolver.resolve(&leaves[2..3], &mut ledger, &shutdown).await;
        assert_eq!(third.fetches, 0);
        assert!(third.fetch_limit_reached);

        assert_eq!(fetcher.calls().len(), 3);
        assert_eq!(ledger.fetched(), 3);
    }

    #[tokio::test]
    async fn test_sink_failure_is_counted_not_fatal() {
        let root = TestCert::new("Root CA").ca();
        let fetcher = Arc::new(
            MapFetcher::new()
                .with("http://ca.example.com/root.cer", root.der())
                .with("http://crl.example.com/root.crl", b"crl".to_vec()),
        );
        let sink = Arc::new(MemorySink::failing());

        let leaf = leaf(
            TestCert::new("www.example.com")
                .issued_by("Root CA")
                .cdp("http://crl.example.com/root.crl")
                .aia("http://ca.example.com/root.cer"),
        );

        let (_tx, shutdown) = watch::channel(false);
        let summary = resolver(&fetcher, &sink)
            .resolve(&[leaf], &mut FetchLedger::new(), &shutdown)
            .await;

        assert_eq!(summary.store_failures, 2);
        assert_eq!(summary.artifacts_written(), 0);
        assert_eq!(summary.roots_reached, 1);
    }

    #[tokio::test]
    async fn test_empty_frontier() {
        let fetcher = Arc::new(MapFetcher::new());
        let sink = Arc::new(MemorySink::default());
        let (_tx, shutdown) = watch::channel(false);

        let summary = resolver(&fetcher, &sink)
            .resolve(&[], &mut FetchLedger::new(), &shutdown)
            .await;

        assert_eq!(summary, ResolveSummary::default());
    }
}

// src/chain/ledger.rs
use std::collections::HashSet;

/// Set of AIA/CDP URLs already fetched during one resolution run.
///
/// Membership only grows. Besides the URLs it counts how many were marked
/// through [`mark_visited`](Self::mark_visited), which is what the resolver's
/// fetch ceiling is measured against. Passing the same ledger to several
/// [`ChainResolver::resolve`](super::ChainResolver::resolve) calls shares it
/// across them, so intermediates common to many leaves are fetched once.
#[derive(Debug, Clone, Default)]
pub struct FetchLedger {
    visited: HashSet<String>,
    fetched: usize,
}

impl FetchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-populated with URLs that must not be fetched again
    pub fn with_visited<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            visited: urls.into_iter().map(Into::into).collect(),
            fetched: 0,
        }
    }

    /// Returns true if `url` had not been seen before (and records it)
    pub fn mark_visited(&mut self, url: &str) -> bool {
        if self.visited.contains(url) {
            false
        } else {
            self.visited.insert(url.to_string());
            self.fetched += 1;
            true
        }
    }

    /// URLs marked since the ledger was created, pre-populated ones excluded
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    pub fn contains(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

use crate::types::{CandidateRecord, Result, SourceKind};
use async_trait::async_trait;

/// Trait for producing candidate records from one external origin
/// (a domain email search, a profile scraping service, a synthetic generator).
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Kind stamped on every record this source produces
    fn kind(&self) -> SourceKind;

    /// Human-readable name used as the key in usage reports
    fn source_name(&self) -> String;

    /// Fetch at most `limit` records for `query` (an institution name or a
    /// direct profile locator).
    ///
    /// A malformed entry is skipped and counted, never returned as an error.
    /// Errors mean the whole call produced nothing usable: a missing credential,
    /// a transport failure or an exhausted rate-limit budget.
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<CandidateRecord>>;

    /// Cumulative counters since the source was created
    fn usage(&self) -> AdapterUsage;
}

/// Per-source counters read by the aggregator around each `fetch`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterUsage {
    pub requests_issued: u32,
    pub records_dropped: u32,
}

impl AdapterUsage {
    pub fn since(&self, earlier: &AdapterUsage) -> AdapterUsage {
        AdapterUsage {
            requests_issued: self.requests_issued.saturating_sub(earlier.requests_issued),
            records_dropped: self.records_dropped.saturating_sub(earlier.records_dropped),
        }
    }
}

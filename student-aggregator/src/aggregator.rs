use crate::dedup::Deduplicator;
use crate::enrich::enrich;
use crate::pacing::Pacer;
use crate::sources::ProfileScrapeSource;
use crate::traits::SourceAdapter;
use crate::types::{AggregatorConfig, CandidateRecord, CanonicalProfile, Field, ProfileSink, SourceKind, UsageStats};
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationRun {
    pub run_id: Uuid,
    pub institution: String,
    pub profiles: Vec<CanonicalProfile>,
    pub usage: UsageStats,
}

impl AggregationRun {
    pub fn persist(&self, sink: &dyn ProfileSink) -> anyhow::Result<()> {
        sink.persist(&self.institution, &self.profiles, &self.usage)
    }
}

/// Split a record budget equally across sources, the remainder going to the first.
pub fn allocate(total: usize, sources: usize) -> Vec<usize> {
    if sources == 0 {
        return Vec::new();
    }
    let share = total / sources;
    let mut quotas = vec![share; sources];
    quotas[0] += total % sources;
    quotas
}

/// Profile URLs carried by domain-email records, in arrival order.
fn follow_up_urls(records: &[CandidateRecord]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for record in records.iter().filter(|r| r.source == SourceKind::DomainEmail) {
        if let Some(url) = record.field_text(Field::ProfileUrl).map(str::trim).filter(|u| !u.is_empty()) {
            if !urls.iter().any(|known| known == url) {
                urls.push(url.to_string());
            }
        }
    }
    urls
}

/// Queries each source in turn, then deduplicates, enriches and bounds the result.
pub struct StudentAggregator {
    config: AggregatorConfig,
    pacer: Arc<dyn Pacer>,
    follow_up: Option<ProfileScrapeSource>,
}

impl StudentAggregator {
    pub fn new(config: AggregatorConfig, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            config,
            pacer,
            follow_up: None,
        }
    }

    /// Scrape the profile pages behind domain-email records after all sources
    /// have run. The scraped records merge into those profiles at `high` quality.
    pub fn with_profile_follow_up(mut self, scraper: ProfileScrapeSource) -> Self {
        self.follow_up = Some(scraper);
        self
    }

    async fn scrape_follow_ups(
        &self,
        scraper: &ProfileScrapeSource,
        urls: &[String],
        institution: &str,
        records: &mut Vec<CandidateRecord>,
        usage: &mut UsageStats,
    ) {
        let name = scraper.source_name();
        info!("Scraping {} profile page(s) found by domain search", urls.len());

        let before = scraper.usage();
        let outcome = scraper.scrape_urls(urls, Some(institution.trim())).await;
        let delta = scraper.usage().since(&before);
        usage.record_requests(&name, delta.requests_issued);
        usage.records_failed += delta.records_dropped as usize;

        match outcome {
            Ok(scraped) => {
                info!("Follow-up scraping produced {} records", scraped.len());
                usage.records_collected += scraped.len();
                records.extend(scraped);
            }
            Err(e) => {
                error!("Follow-up scraping with {} failed: {}", name, e);
                usage.sources_failed.push(name);
            }
        }
    }

    fn current_year(&self) -> i32 {
        self.config.current_year.unwrap_or_else(|| Utc::now().year())
    }

    /// Runs the whole pipeline. Source failures degrade the result, they never
    /// fail the run.
    pub async fn run(
        &self,
        institution: &str,
        total_limit: usize,
        sources: &[Box<dyn SourceAdapter>],
    ) -> AggregationRun {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let mut usage = UsageStats::default();
        let mut records: Vec<CandidateRecord> = Vec::new();

        info!(
            "Run {}: collecting up to {} profiles for {} from {} source(s)",
            run_id,
            total_limit,
            institution,
            sources.len()
        );

        let quotas = allocate(total_limit, sources.len());
        let mut queried = 0usize;

        for (source, quota) in sources.iter().zip(quotas) {
            let name = source.source_name();
            if quota == 0 {
                info!("Skipping {}: no records allotted", name);
                continue;
            }
            if queried > 0 {
                self.pacer
                    .pause(Duration::from_millis(self.config.inter_source_delay_ms))
                    .await;
            }
            queried += 1;

            let before = source.usage();
            let outcome = source.fetch(institution, quota).await;
            let delta = source.usage().since(&before);

            usage.record_requests(&name, delta.requests_issued);
            usage.records_failed += delta.records_dropped as usize;

            match outcome {
                Ok(mut fetched) => {
                    if fetched.len() > quota {
                        warn!("{} returned {} records for a quota of {}", name, fetched.len(), quota);
                        fetched.truncate(quota);
                    }
                    info!("{} produced {} records", name, fetched.len());
                    usage.records_collected += fetched.len();
                    records.extend(fetched);
                }
                Err(e) => {
                    error!("Source {} failed: {}", name, e);
                    usage.sources_failed.push(name);
                }
            }
        }

        if let Some(scraper) = &self.follow_up {
            let urls = follow_up_urls(&records);
            if !urls.is_empty() {
                self.pacer
                    .pause(Duration::from_millis(self.config.inter_source_delay_ms))
                    .await;
                self.scrape_follow_ups(scraper, &urls, institution, &mut records, &mut usage)
                    .await;
            }
        }

        let outcome = Deduplicator::merge_with_stats(records);
        usage.records_failed += outcome.discarded;
        usage.duplicates_merged = outcome.merged;

        let current_year = self.current_year();
        let mut profiles: Vec<CanonicalProfile> = outcome
            .profiles
            .iter()
            .map(|profile| enrich(profile, institution, current_year))
            .collect();
        profiles.sort_by_key(|profile| profile.first_arrival);
        profiles.truncate(total_limit);
        usage.records_enriched = profiles.len();

        info!(
            "Run {} finished in {}ms: {} profiles, {} requests, {} failed source(s)",
            run_id,
            started.elapsed().as_millis(),
            profiles.len(),
            usage.total_requests(),
            usage.sources_failed.len()
        );

        AggregationRun {
            run_id,
            institution: institution.trim().to_string(),
            profiles,
            usage,
        }
    }
}

use crate::executor::RequestExecutor;
use crate::fetcher::HttpTransport;
use crate::parser::ProfileParser;
use crate::traits::{AdapterUsage, SourceAdapter};
use crate::types::{
    AggregatorError, CandidateRecord, Field, FieldValue, ProfileScrapeConfig, Quality, Result, SourceKind,
    SCRAPE_API_KEY_ENV,
};
use crate::utils::{text::fill_template, url};
use async_trait::async_trait;
use interfaces::defs::normalize_url_identifier;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
struct ScrapflyEnvelope {
    result: Option<ScrapflyResult>,
}

#[derive(Debug, Deserialize)]
struct ScrapflyResult {
    content: Option<String>,
}

/// A profile page to scrape and the confidence its origin carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLocator {
    pub url: String,
    pub quality: Quality,
}

/// Profile pages fetched through a scraping service (ScrapingBee, ScrapeOwl or
/// Scrapfly) and parsed with selector fallback chains.
///
/// `query` may be a direct profile URL, which is scraped as-is, or an
/// institution name, in which case configured seed locators are scraped first
/// and the rest of the budget is filled from search result pages.
pub struct ProfileScrapeSource {
    config: ProfileScrapeConfig,
    transport: Arc<dyn HttpTransport>,
    executor: RequestExecutor,
    parser: ProfileParser,
    records_dropped: AtomicU32,
}

impl ProfileScrapeSource {
    pub fn new(config: ProfileScrapeConfig, transport: Arc<dyn HttpTransport>, executor: RequestExecutor) -> Self {
        Self {
            config,
            transport,
            executor,
            parser: ProfileParser::new(),
            records_dropped: AtomicU32::new(0),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AggregatorError::Configuration(format!(
                    "Profile scraping requires an API key for {:?} (set {})",
                    self.config.service, SCRAPE_API_KEY_ENV
                ))
            })
    }

    fn pause_between_pages(&self) -> Duration {
        Duration::from_millis(self.config.per_profile_delay_ms)
    }

    async fn fetch_page(&self, api_key: &str, target: &str, render_js: bool) -> Result<String> {
        let service = self.config.service;
        let mut params = vec![(service.api_param(), api_key.to_string()), ("url", target.to_string())];
        if render_js {
            params.extend(service.render_params());
        } else {
            params.push(("render_js", "false".to_string()));
        }

        let transport = self.transport.as_ref();
        let (endpoint, params) = (service.base_url(), params.as_slice());
        let response = self.executor.execute(move || transport.get(endpoint, params)).await?;

        if !service.returns_json() {
            return Ok(response.body);
        }
        let envelope: ScrapflyEnvelope = serde_json::from_str(&response.body)
            .map_err(|e| AggregatorError::Parsing(format!("Invalid scraping service response: {}", e)))?;
        Ok(envelope.result.and_then(|r| r.content).unwrap_or_default())
    }

    /// Search result pages for the institution, reduced to profile URLs.
    async fn discover(&self, api_key: &str, institution: &str, wanted: usize) -> Result<Vec<String>> {
        let templates = &self.config.search_templates;
        if templates.is_empty() || wanted == 0 {
            return Ok(Vec::new());
        }
        let per_query = wanted.div_ceil(templates.len()).max(1);
        let mut found: Vec<String> = Vec::new();

        for (index, template) in templates.iter().enumerate() {
            if found.len() >= wanted {
                break;
            }
            if index > 0 {
                self.executor.pacer().pause(self.pause_between_pages()).await;
            }

            let search_query = fill_template(template, institution);
            let Some(search_url) = url::search_url(&search_query) else {
                warn!("Cannot build search URL for {:?}", search_query);
                continue;
            };
            info!("Searching for profiles: {}", search_query);

            let html = self.fetch_page(api_key, &search_url, false).await?;
            let links = self.parser.extract_profile_links(&html, per_query);
            debug!("Search {:?} yielded {} profile links", search_query, links.len());

            for link in links {
                if found.len() < wanted && !found.contains(&link) {
                    found.push(link);
                }
            }
        }

        info!("Found {} unique profile URLs for {}", found.len(), institution);
        Ok(found)
    }

    async fn collect_locators(&self, api_key: &str, query: &str, limit: usize) -> Result<Vec<ProfileLocator>> {
        let mut locators: Vec<ProfileLocator> = Vec::new();
        let push = |target: &str, quality: Quality, locators: &mut Vec<ProfileLocator>| {
            let key = normalize_url_identifier(target);
            if locators.len() < limit && !locators.iter().any(|l| normalize_url_identifier(&l.url) == key) {
                locators.push(ProfileLocator { url: target.trim().to_string(), quality });
            }
        };

        if url::is_profile_url(query) {
            push(query, Quality::High, &mut locators);
            return Ok(locators);
        }

        for seed in &self.config.seed_locators {
            if url::is_profile_url(seed) {
                push(seed, Quality::High, &mut locators);
            } else {
                warn!("Ignoring seed locator that is not a profile URL: {}", seed);
            }
        }

        if locators.len() < limit {
            let discovered = self.discover(api_key, query, limit - locators.len()).await?;
            for link in discovered {
                push(&link, Quality::Medium, &mut locators);
            }
        }

        Ok(locators)
    }

    async fn scrape_profile(&self, api_key: &str, locator: &ProfileLocator, college: Option<&str>) -> Result<CandidateRecord> {
        info!("Scraping profile: {}", locator.url);
        let html = self.fetch_page(api_key, &locator.url, true).await?;
        if html.trim().is_empty() {
            return Err(AggregatorError::Parsing(format!("No HTML content received for {}", locator.url)));
        }

        let mut fields = self.parser.parse_profile(&html);
        fields.insert(Field::ProfileUrl, FieldValue::text(locator.url.as_str()));
        if let Some(college) = college {
            fields.insert(Field::College, FieldValue::text(college));
        }

        CandidateRecord::from_fields(SourceKind::ProfileScrape, locator.quality, fields)
            .ok_or_else(|| AggregatorError::Parsing(format!("No identifiers for {}", locator.url)))
    }

    /// Scrapes each locator in turn. A page that fails is dropped; an exhausted
    /// rate limit or a configuration error ends the call.
    async fn scrape_locators(
        &self,
        api_key: &str,
        locators: &[ProfileLocator],
        college: Option<&str>,
    ) -> Result<Vec<CandidateRecord>> {
        let mut records = Vec::new();

        for (index, locator) in locators.iter().enumerate() {
            if index > 0 {
                self.executor.pacer().pause(self.pause_between_pages()).await;
            }

            match self.scrape_profile(api_key, locator, college).await {
                Ok(record) => records.push(record),
                Err(e @ (AggregatorError::Configuration(_) | AggregatorError::RateLimitExceeded { .. })) => {
                    error!("Stopping profile scraping at {}: {}", locator.url, e);
                    return Err(e);
                }
                Err(e) => {
                    self.records_dropped.fetch_add(1, Ordering::Relaxed);
                    error!("Failed to scrape profile {}: {}", locator.url, e);
                }
            }
        }

        info!("Successfully scraped {} out of {} profiles", records.len(), locators.len());
        Ok(records)
    }

    /// Scrapes profile URLs already known from another source. Every page is
    /// treated as `high` quality; duplicate and non-profile URLs are skipped.
    pub async fn scrape_urls(&self, urls: &[String], college: Option<&str>) -> Result<Vec<CandidateRecord>> {
        let api_key = self.api_key()?;
        let mut locators: Vec<ProfileLocator> = Vec::new();
        for target in urls {
            if !url::is_profile_url(target) {
                warn!("Not scraping {}: not a profile URL", target);
                continue;
            }
            let key = normalize_url_identifier(target);
            if !locators.iter().any(|l| normalize_url_identifier(&l.url) == key) {
                locators.push(ProfileLocator {
                    url: target.trim().to_string(),
                    quality: Quality::High,
                });
            }
        }

        self.scrape_locators(api_key, &locators, college).await
    }
}

#[async_trait]
impl SourceAdapter for ProfileScrapeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ProfileScrape
    }

    fn source_name(&self) -> String {
        format!("Scraping API ({:?})", self.config.service)
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<CandidateRecord>> {
        let api_key = self.api_key()?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let locators = self.collect_locators(api_key, query, limit).await?;
        let college = (!url::is_profile_url(query) && !query.trim().is_empty()).then(|| query.trim());
        self.scrape_locators(api_key, &locators, college).await
    }

    fn usage(&self) -> AdapterUsage {
        AdapterUsage {
            requests_issued: self.executor.requests_issued(),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
        }
    }
}

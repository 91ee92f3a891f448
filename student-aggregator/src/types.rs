use std::time::Duration;
// Use the interfaces crate for the shared data model
pub use interfaces::defs::{CandidateRecord, CanonicalProfile, EducationEntry, ExperienceEntry, Field, FieldMap, FieldValue};
pub use interfaces::defs::{Quality, SourceKind, StudentStatus, UsageStats};
pub use interfaces::ProfileSink;

pub const HUNTER_API_KEY_ENV: &str = "HUNTER_API_KEY";
pub const SCRAPE_API_KEY_ENV: &str = "SCRAPE_API_KEY";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Total attempts for a rate-limited call, including the first one.
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Student-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 1,
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

#[derive(Debug, Clone)]
pub struct DomainEmailConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub inter_domain_delay_ms: u64,
}

impl Default for DomainEmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.hunter.io/v2".to_string(),
            inter_domain_delay_ms: 1_000,
        }
    }
}

impl DomainEmailConfig {
    /// Takes the key from the environment unless one was set explicitly.
    pub fn with_env_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(HUNTER_API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        }
        self
    }
}

/// Scraping services the profile source knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeService {
    ScrapingBee,
    ScrapeOwl,
    Scrapfly,
}

impl ScrapeService {
    pub fn base_url(&self) -> &'static str {
        match self {
            ScrapeService::ScrapingBee => "https://app.scrapingbee.com/api/v1",
            ScrapeService::ScrapeOwl => "https://api.scrapeowl.com/v1/scrape",
            ScrapeService::Scrapfly => "https://api.scrapfly.io/scrape",
        }
    }

    pub fn api_param(&self) -> &'static str {
        match self {
            ScrapeService::Scrapfly => "key",
            _ => "api_key",
        }
    }

    /// Extra parameters for a page that needs JavaScript rendering.
    pub fn render_params(&self) -> Vec<(&'static str, String)> {
        match self {
            ScrapeService::ScrapingBee => vec![
                ("render_js", "true".to_string()),
                ("premium_proxy", "true".to_string()),
                ("country_code", "us".to_string()),
            ],
            ScrapeService::ScrapeOwl => vec![
                ("render_js", "true".to_string()),
                ("proxy_country", "US".to_string()),
            ],
            ScrapeService::Scrapfly => vec![
                ("render_js", "true".to_string()),
                ("country", "US".to_string()),
            ],
        }
    }

    /// Scrapfly wraps the page in JSON; the others return raw HTML.
    pub fn returns_json(&self) -> bool {
        matches!(self, ScrapeService::Scrapfly)
    }
}

impl std::str::FromStr for ScrapeService {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "scrapingbee" => Ok(ScrapeService::ScrapingBee),
            "scrapeowl" => Ok(ScrapeService::ScrapeOwl),
            "scrapfly" => Ok(ScrapeService::Scrapfly),
            other => Err(AggregatorError::Configuration(format!("Unknown scraping service: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileScrapeConfig {
    pub api_key: Option<String>,
    pub service: ScrapeService,
    /// Locators known to point at real profiles; scraped before any search.
    pub seed_locators: Vec<String>,
    pub search_templates: Vec<String>,
    pub per_profile_delay_ms: u64,
}

impl Default for ProfileScrapeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            service: ScrapeService::ScrapingBee,
            seed_locators: Vec::new(),
            search_templates: vec![
                "{institution} students".to_string(),
                "{institution} alumni".to_string(),
                "students {institution} engineering".to_string(),
                "{institution} graduates".to_string(),
            ],
            per_profile_delay_ms: 2_000,
        }
    }
}

impl ProfileScrapeConfig {
    pub fn with_env_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(SCRAPE_API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub inter_source_delay_ms: u64,
    /// Fixed year for status classification; the wall clock is used when unset.
    pub current_year: Option<i32>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            inter_source_delay_ms: 2_000,
            current_year: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    #[error("Parsing error: {0}")]
    Parsing(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for AggregatorError {
    fn from(err: reqwest::Error) -> Self {
        AggregatorError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;

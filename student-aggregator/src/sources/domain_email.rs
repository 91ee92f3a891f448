use crate::executor::RequestExecutor;
use crate::fetcher::HttpTransport;
use crate::sources::domains::resolve_domains;
use crate::traits::{AdapterUsage, SourceAdapter};
use crate::types::{
    AggregatorError, CandidateRecord, DomainEmailConfig, Field, FieldMap, FieldValue, Quality, Result,
    SourceKind, HUNTER_API_KEY_ENV,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct DomainSearchResponse {
    #[serde(default)]
    data: Option<DomainSearchData>,
}

#[derive(Debug, Deserialize)]
struct DomainSearchData {
    // Kept as raw values so one malformed entry cannot sink the page
    #[serde(default)]
    emails: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EmailEntry {
    value: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    position: Option<String>,
    department: Option<String>,
    #[serde(alias = "linkedin")]
    linkedin_url: Option<String>,
    confidence: Option<u64>,
    #[serde(default)]
    sources: Vec<EmailSourceRef>,
    verification: Option<Verification>,
}

#[derive(Debug, Deserialize)]
struct EmailSourceRef {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Verification {
    result: Option<String>,
}

fn is_http_url(candidate: &str) -> bool {
    url::Url::parse(candidate.trim())
        .map(|u| u.scheme() == "http" || u.scheme() == "https")
        .unwrap_or(false)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Email-domain search source (Hunter.io `domain-search` API).
///
/// Resolves the institution's email domains, queries each one and turns the
/// people it knows about into candidate records. An entry that links a social
/// profile URL is `medium` quality, anything else is `low`.
pub struct DomainEmailSource {
    config: DomainEmailConfig,
    transport: Arc<dyn HttpTransport>,
    executor: RequestExecutor,
    records_dropped: AtomicU32,
}

impl DomainEmailSource {
    pub fn new(config: DomainEmailConfig, transport: Arc<dyn HttpTransport>, executor: RequestExecutor) -> Self {
        Self {
            config,
            transport,
            executor,
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
                    "Domain email search requires an API key (set {})",
                    HUNTER_API_KEY_ENV
                ))
            })
    }

    async fn search_domain(&self, api_key: &str, domain: &str, limit: usize) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}/domain-search", self.config.base_url.trim_end_matches('/'));
        let params = vec![
            ("domain", domain.to_string()),
            ("api_key", api_key.to_string()),
            ("limit", limit.to_string()),
        ];

        info!("Searching emails for domain: {}", domain);
        let transport = self.transport.as_ref();
        let (url, params) = (url.as_str(), params.as_slice());
        let response = self.executor.execute(move || transport.get(url, params)).await?;

        let parsed: DomainSearchResponse = serde_json::from_str(&response.body)
            .map_err(|e| AggregatorError::Parsing(format!("Invalid domain search response for {}: {}", domain, e)))?;

        Ok(parsed.data.map(|d| d.emails).unwrap_or_default())
    }

    fn convert_entry(&self, entry: serde_json::Value, domain: &str, institution: &str) -> Result<CandidateRecord> {
        let entry: EmailEntry = serde_json::from_value(entry)
            .map_err(|e| AggregatorError::Parsing(format!("Malformed person entry: {}", e)))?;

        let first_name = non_empty(entry.first_name);
        let last_name = non_empty(entry.last_name);
        if first_name.is_none() && last_name.is_none() {
            return Err(AggregatorError::Parsing("Person entry has no name".to_string()));
        }

        let profile_url = entry
            .sources
            .iter()
            .filter_map(|s| s.uri.as_deref())
            .find(|uri| uri.to_lowercase().contains("linkedin.com") && is_http_url(uri))
            .map(str::to_string)
            .or_else(|| non_empty(entry.linkedin_url).filter(|u| is_http_url(u)));

        let quality = if profile_url.is_some() { Quality::Medium } else { Quality::Low };

        let full_name = [first_name.as_deref(), last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        let mut fields = FieldMap::new();
        fields.insert(Field::Name, FieldValue::Text(full_name));
        let optional_text = [
            (Field::FirstName, first_name),
            (Field::LastName, last_name),
            (Field::Email, non_empty(entry.value)),
            (Field::Position, non_empty(entry.position)),
            (Field::Department, non_empty(entry.department)),
            (Field::ProfileUrl, profile_url),
        ];
        for (field, value) in optional_text {
            if let Some(value) = value {
                fields.insert(field, FieldValue::Text(value));
            }
        }
        fields.insert(Field::College, FieldValue::text(institution.trim()));
        fields.insert(Field::Domain, FieldValue::text(domain));
        fields.insert(Field::Confidence, FieldValue::Count(entry.confidence.unwrap_or(0)));
        fields.insert(
            Field::VerificationStatus,
            FieldValue::Text(
                entry
                    .verification
                    .and_then(|v| non_empty(v.result))
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
        );

        CandidateRecord::from_fields(SourceKind::DomainEmail, quality, fields)
            .ok_or_else(|| AggregatorError::Parsing("Person entry has no identifiers".to_string()))
    }
}

#[async_trait]
impl SourceAdapter for DomainEmailSource {
    fn kind(&self) -> SourceKind {
        SourceKind::DomainEmail
    }

    fn source_name(&self) -> String {
        "Hunter.io".to_string()
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<CandidateRecord>> {
        let api_key = self.api_key()?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let resolution = resolve_domains(query);
        if resolution.domains.is_empty() {
            warn!("No email domains to search for {:?}", query);
            return Ok(Vec::new());
        }
        info!("Searching {} domain(s) for {}: {:?}", resolution.domains.len(), query, resolution.domains);

        let mut records = Vec::new();
        let pacer = self.executor.pacer();

        for (index, domain) in resolution.domains.iter().enumerate() {
            if records.len() >= limit {
                break;
            }
            if index > 0 {
                pacer.pause(Duration::from_millis(self.config.inter_domain_delay_ms)).await;
            }

            let entries = match self.search_domain(api_key, domain, limit - records.len()).await {
                Ok(entries) => entries,
                Err(AggregatorError::Parsing(reason)) => {
                    warn!("Skipping domain {}: {}", domain, reason);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if entries.is_empty() {
                warn!("No emails found for domain: {}", domain);
                continue;
            }
            debug!("Domain {} returned {} entries", domain, entries.len());

            for entry in entries {
                if records.len() >= limit {
                    break;
                }
                match self.convert_entry(entry, domain, query) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        self.records_dropped.fetch_add(1, Ordering::Relaxed);
                        warn!("Skipping entry from {}: {}", domain, e);
                    }
                }
            }
        }

        info!("Extracted {} profiles from domain search for {}", records.len(), query);
        Ok(records)
    }

    fn usage(&self) -> AdapterUsage {
        AdapterUsage {
            requests_issued: self.executor.requests_issued(),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
        }
    }
}

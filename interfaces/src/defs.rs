use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Origin of a candidate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    DomainEmail,
    ProfileScrape,
    Mock,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::DomainEmail => "domain_email",
            SourceKind::ProfileScrape => "profile_scrape",
            SourceKind::Mock => "mock",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-declared confidence. Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    CurrentStudent,
    RecentGraduate,
    Alumni,
    #[default]
    Unknown,
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StudentStatus::CurrentStudent => "current_student",
            StudentStatus::RecentGraduate => "recent_graduate",
            StudentStatus::Alumni => "alumni",
            StudentStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Attribute names a source may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    FirstName,
    LastName,
    College,
    Degree,
    GraduationYear,
    Location,
    Headline,
    About,
    Skills,
    Experience,
    Education,
    CollegeEducation,
    Email,
    ProfileUrl,
    Position,
    Department,
    Connections,
    Domain,
    Confidence,
    VerificationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub field_of_study: String,
    pub dates: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Count(u64),
    List(Vec<String>),
    Education(Vec<EducationEntry>),
    Experience(Vec<ExperienceEntry>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Empty values never overwrite populated ones during a merge.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Count(_) => false,
            FieldValue::List(items) => items.iter().all(|item| item.trim().is_empty()),
            FieldValue::Education(entries) => entries.is_empty(),
            FieldValue::Experience(entries) => entries.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_education(&self) -> Option<&[EducationEntry]> {
        match self {
            FieldValue::Education(entries) => Some(entries.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Count(count) => write!(f, "{}", count),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
            FieldValue::Education(entries) => {
                let schools: Vec<&str> = entries.iter().map(|e| e.school.as_str()).collect();
                f.write_str(&schools.join("; "))
            }
            FieldValue::Experience(entries) => {
                let titles: Vec<String> = entries
                    .iter()
                    .map(|e| format!("{} @ {}", e.title, e.company))
                    .collect();
                f.write_str(&titles.join("; "))
            }
        }
    }
}

pub type FieldMap = BTreeMap<Field, FieldValue>;

/// Lower-cased, trimmed profile URL without a trailing slash.
pub fn normalize_url_identifier(url: &str) -> String {
    url.trim().to_lowercase().trim_end_matches('/').to_string()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trimmed, lower-cased identifier as supplied by a caller.
pub fn normalize_identifier(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Lower-cased full name with all whitespace removed.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect()
}

/// Identifiers a record is matched on: profile URL, email and full name.
/// The name falls back to `first_name last_name` when no full name is present.
pub fn identifiers_from_fields(fields: &FieldMap) -> BTreeSet<String> {
    let text = |field: Field| fields.get(&field).and_then(FieldValue::as_text).unwrap_or("");

    let mut identifiers = BTreeSet::new();
    let candidates = [
        normalize_url_identifier(text(Field::ProfileUrl)),
        normalize_email(text(Field::Email)),
    ];
    identifiers.extend(candidates.into_iter().filter(|id| !id.is_empty()));

    let full_name = if !text(Field::Name).trim().is_empty() {
        text(Field::Name).to_string()
    } else {
        format!("{} {}", text(Field::FirstName), text(Field::LastName))
    };
    let name = normalize_name(&full_name);
    if !name.is_empty() {
        identifiers.insert(name);
    }

    identifiers
}

/// One unverified observation of a person from a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub identifiers: BTreeSet<String>,
    pub fields: FieldMap,
    pub source: SourceKind,
    pub quality: Quality,
}

impl CandidateRecord {
    pub fn new(
        source: SourceKind,
        quality: Quality,
        identifiers: impl IntoIterator<Item = String>,
        fields: FieldMap,
    ) -> Self {
        Self {
            identifiers: identifiers
                .into_iter()
                .map(|id| normalize_identifier(&id))
                .filter(|id| !id.is_empty())
                .collect(),
            fields,
            source,
            quality,
        }
    }

    /// Builds a record whose identifiers are derived from its fields.
    /// Returns `None` when no identifier can be derived.
    pub fn from_fields(source: SourceKind, quality: Quality, fields: FieldMap) -> Option<Self> {
        let identifiers = identifiers_from_fields(&fields);
        if identifiers.is_empty() {
            return None;
        }
        Some(Self {
            identifiers,
            fields,
            source,
            quality,
        })
    }

    pub fn field_text(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).and_then(FieldValue::as_text)
    }
}

/// The deduplicated, merged representation of one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProfile {
    pub identifiers: BTreeSet<String>,
    pub fields: FieldMap,
    pub contributing_sources: Vec<SourceKind>,
    pub status: StudentStatus,
    pub quality: Quality,
    /// Quality of the record each surviving field value came from.
    #[serde(skip)]
    pub field_quality: BTreeMap<Field, Quality>,
    /// Arrival index of the record each surviving field value came from.
    #[serde(skip)]
    pub field_arrival: BTreeMap<Field, usize>,
    /// Arrival index of the first record that contributed to this profile.
    #[serde(skip)]
    pub first_arrival: usize,
}

impl CanonicalProfile {
    pub fn field_text(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).and_then(FieldValue::as_text)
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = self.field_text(Field::Name).filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let first = self.field_text(Field::FirstName).unwrap_or("");
        let last = self.field_text(Field::LastName).unwrap_or("");
        let joined = format!("{} {}", first, last).trim().to_string();
        if joined.is_empty() {
            "N/A".to_string()
        } else {
            joined
        }
    }
}

/// Counters collected over one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub requests_by_source: BTreeMap<String, u32>,
    pub records_collected: usize,
    pub records_enriched: usize,
    pub records_failed: usize,
    pub duplicates_merged: usize,
    pub sources_failed: Vec<String>,
}

impl UsageStats {
    pub fn total_requests(&self) -> u32 {
        self.requests_by_source.values().sum()
    }

    pub fn record_requests(&mut self, source_name: &str, requests: u32) {
        *self.requests_by_source.entry(source_name.to_string()).or_insert(0) += requests;
    }
}

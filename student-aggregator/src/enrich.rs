use crate::types::{CanonicalProfile, EducationEntry, Field, FieldValue, StudentStatus};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn year_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"20\d{2}").ok()).as_ref()
}

/// True when any token of the institution name longer than two characters
/// appears in the school text. Comparison is case-insensitive.
pub fn matches_institution(school: &str, institution: &str) -> bool {
    let school = school.to_lowercase();
    institution
        .to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .any(|token| school.contains(token))
}

/// Every `20xx` year in a date range, in order of appearance.
pub fn extract_years(dates: &str) -> Vec<i32> {
    let Some(pattern) = year_pattern() else {
        return Vec::new();
    };
    pattern
        .find_iter(dates)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

pub fn classify_status(graduation_year: Option<&str>, current_year: i32) -> StudentStatus {
    let Some(year) = graduation_year.and_then(|g| g.trim().parse::<i32>().ok()) else {
        return StudentStatus::Unknown;
    };
    if year >= current_year {
        StudentStatus::CurrentStudent
    } else if year >= current_year - 2 {
        StudentStatus::RecentGraduate
    } else {
        StudentStatus::Alumni
    }
}

/// Derives graduation year, degree, the institution's education entries and
/// the student status from a merged profile. Returns a new profile.
pub fn enrich(profile: &CanonicalProfile, institution: &str, current_year: i32) -> CanonicalProfile {
    let mut enriched = profile.clone();

    let matching: Vec<EducationEntry> = profile
        .fields
        .get(&Field::Education)
        .and_then(FieldValue::as_education)
        .unwrap_or_default()
        .iter()
        .filter(|entry| matches_institution(&entry.school, institution))
        .cloned()
        .collect();

    let latest_year = matching.iter().flat_map(|entry| extract_years(&entry.dates)).max();
    if let Some(year) = latest_year {
        enriched
            .fields
            .insert(Field::GraduationYear, FieldValue::Text(year.to_string()));
    }

    if !matching.is_empty() {
        let degree = matching.iter().find_map(|entry| {
            [entry.degree.trim(), entry.field_of_study.trim()]
                .into_iter()
                .find(|text| !text.is_empty())
                .map(str::to_string)
        });
        if let Some(degree) = degree {
            enriched.fields.insert(Field::Degree, FieldValue::Text(degree));
        }
        enriched
            .fields
            .insert(Field::CollegeEducation, FieldValue::Education(matching));
    }

    enriched.status = classify_status(enriched.field_text(Field::GraduationYear), current_year);
    debug!(
        "Enriched {}: graduation year {:?}, status {}",
        enriched.display_name(),
        enriched.field_text(Field::GraduationYear),
        enriched.status
    );
    enriched
}

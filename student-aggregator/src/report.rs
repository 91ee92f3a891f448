use crate::aggregator::AggregationRun;
use crate::types::{CanonicalProfile, Field};
use std::collections::BTreeMap;
use std::fmt::Write;

const SAMPLE_SIZE: usize = 5;

fn breakdown<K: Ord + ToString>(counts: &BTreeMap<K, usize>, out: &mut String) {
    if counts.is_empty() {
        out.push_str("- none\n");
    }
    for (key, count) in counts {
        let _ = writeln!(out, "- {}: {} profiles", key.to_string(), count);
    }
}

fn field_or_na(profile: &CanonicalProfile, field: Field) -> String {
    profile
        .fields
        .get(&field)
        .map(|value| value.to_string())
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Human-readable summary of a run: request counts, record counters,
/// breakdowns by quality, source and status, and the first few profiles.
pub fn render_usage_report(run: &AggregationRun) -> String {
    let usage = &run.usage;
    let mut out = String::new();

    let _ = writeln!(out, "Student Profile Aggregation Report");
    let _ = writeln!(out, "==================================\n");
    let _ = writeln!(out, "Institution: {}", run.institution);
    let _ = writeln!(out, "Run: {}", run.run_id);
    let _ = writeln!(out, "Total Profiles: {}\n", run.profiles.len());

    let _ = writeln!(out, "Requests:");
    for (source, requests) in &usage.requests_by_source {
        let _ = writeln!(out, "- {}: {}", source, requests);
    }
    let _ = writeln!(out, "- Total: {}\n", usage.total_requests());

    let _ = writeln!(out, "Records:");
    let _ = writeln!(out, "- Collected: {}", usage.records_collected);
    let _ = writeln!(out, "- Enriched: {}", usage.records_enriched);
    let _ = writeln!(out, "- Failed: {}", usage.records_failed);
    let _ = writeln!(out, "- Duplicates merged: {}", usage.duplicates_merged);
    if !usage.sources_failed.is_empty() {
        let _ = writeln!(out, "- Sources failed: {}", usage.sources_failed.join(", "));
    }

    let mut by_quality = BTreeMap::new();
    let mut by_source = BTreeMap::new();
    let mut by_status = BTreeMap::new();
    for profile in &run.profiles {
        *by_quality.entry(profile.quality).or_insert(0) += 1;
        *by_status.entry(profile.status).or_insert(0) += 1;
        for source in &profile.contributing_sources {
            *by_source.entry(*source).or_insert(0) += 1;
        }
    }

    out.push_str("\nData Quality Breakdown:\n");
    breakdown(&by_quality, &mut out);
    out.push_str("\nData Source Breakdown:\n");
    breakdown(&by_source, &mut out);
    out.push_str("\nStudent Status Breakdown:\n");
    breakdown(&by_status, &mut out);

    out.push_str("\nSample Profiles:\n");
    for (i, profile) in run.profiles.iter().take(SAMPLE_SIZE).enumerate() {
        let sources: Vec<&str> = profile.contributing_sources.iter().map(|s| s.as_str()).collect();
        let _ = writeln!(out, "\n{}. {}", i + 1, profile.display_name());
        let _ = writeln!(out, "   College: {}", field_or_na(profile, Field::College));
        let _ = writeln!(out, "   Degree: {}", field_or_na(profile, Field::Degree));
        let _ = writeln!(out, "   Year: {}", field_or_na(profile, Field::GraduationYear));
        let _ = writeln!(out, "   Status: {}", profile.status);
        let _ = writeln!(out, "   Sources: {}", sources.join(", "));
        let _ = writeln!(out, "   Quality: {}", profile.quality);
    }

    out
}

mod common;

use common::{init_tracing, record};
use std::collections::BTreeSet;
use student_aggregator::{CandidateRecord, CanonicalProfile, Deduplicator, Field, FieldValue, Quality, SourceKind};

fn partition(profiles: &[CanonicalProfile]) -> BTreeSet<BTreeSet<String>> {
    profiles.iter().map(|p| p.identifiers.clone()).collect()
}

fn assert_disjoint(profiles: &[CanonicalProfile]) {
    let mut seen = BTreeSet::new();
    for profile in profiles {
        for id in &profile.identifiers {
            assert!(seen.insert(id.clone()), "identifier {} appears in two profiles", id);
        }
    }
}

fn sample_records() -> Vec<CandidateRecord> {
    vec![
        record(
            SourceKind::ProfileScrape,
            Quality::High,
            &["https://site/in/a", "asharma"],
            &[(Field::Name, "A Sharma"), (Field::Headline, "CSE student")],
        ),
        record(
            SourceKind::DomainEmail,
            Quality::Low,
            &["b@x.com", "bkumar"],
            &[(Field::Name, "B Kumar"), (Field::Email, "b@x.com")],
        ),
        record(
            SourceKind::DomainEmail,
            Quality::Medium,
            &["a@x.com", "https://site/in/a"],
            &[(Field::Email, "a@x.com"), (Field::Position, "Intern")],
        ),
        record(
            SourceKind::Mock,
            Quality::Medium,
            &["https://site/in/c", "ctest"],
            &[(Field::Name, "C Test")],
        ),
        record(
            SourceKind::Mock,
            Quality::Medium,
            &["bkumar", "https://site/in/b"],
            &[(Field::Location, "Pune, India")],
        ),
    ]
}

#[test]
fn test_union_scenario() {
    init_tracing();

    let records = vec![
        record(SourceKind::ProfileScrape, Quality::High, &["https://site/in/a"], &[]),
        record(SourceKind::DomainEmail, Quality::Low, &["https://site/in/a", "a@x.com"], &[]),
    ];
    let profiles = Deduplicator::merge(records);

    assert_eq!(profiles.len(), 1);
    let expected: BTreeSet<String> = ["https://site/in/a", "a@x.com"].iter().map(|s| s.to_string()).collect();
    assert_eq!(profiles[0].identifiers, expected);
    assert_eq!(
        profiles[0].contributing_sources,
        vec![SourceKind::ProfileScrape, SourceKind::DomainEmail]
    );
}

#[test]
fn test_partition_invariant_and_order() {
    init_tracing();

    let profiles = Deduplicator::merge(sample_records());

    assert_disjoint(&profiles);
    assert_eq!(profiles.len(), 3);
    // Ordered by the arrival of each profile's first record
    assert_eq!(profiles[0].field_text(Field::Name), Some("A Sharma"));
    assert_eq!(profiles[1].field_text(Field::Name), Some("B Kumar"));
    assert_eq!(profiles[2].field_text(Field::Name), Some("C Test"));
    assert_eq!(profiles[0].field_text(Field::Email), Some("a@x.com"));
    assert_eq!(profiles[1].field_text(Field::Location), Some("Pune, India"));
}

#[test]
fn test_idempotent_on_duplicated_input() {
    init_tracing();

    let once = Deduplicator::merge(sample_records());
    let mut doubled = sample_records();
    doubled.extend(sample_records());
    let twice = Deduplicator::merge(doubled);

    assert_eq!(partition(&once), partition(&twice));
    for (a, b) in once.iter().zip(twice.iter()) {
        assert_eq!(a.fields, b.fields);
    }
}

#[test]
fn test_partition_independent_of_order() {
    init_tracing();

    let forward = Deduplicator::merge(sample_records());
    let mut reversed_input = sample_records();
    reversed_input.reverse();
    let reversed = Deduplicator::merge(reversed_input);

    assert_eq!(partition(&forward), partition(&reversed));

    let mut rotated_input = sample_records();
    rotated_input.rotate_left(2);
    assert_eq!(partition(&forward), partition(&Deduplicator::merge(rotated_input)));
}

#[test]
fn test_transitive_link_joins_profiles() {
    init_tracing();

    let records = vec![
        record(SourceKind::Mock, Quality::Medium, &["x1"], &[(Field::Name, "First")]),
        record(SourceKind::Mock, Quality::Medium, &["x2"], &[(Field::Location, "Delhi")]),
        record(SourceKind::DomainEmail, Quality::Low, &["x3"], &[]),
        record(SourceKind::ProfileScrape, Quality::High, &["x2", "x1"], &[]),
    ];
    let outcome = Deduplicator::merge_with_stats(records);

    assert_eq!(outcome.profiles.len(), 2);
    assert_eq!(outcome.merged, 2);
    assert_disjoint(&outcome.profiles);

    let joined = &outcome.profiles[0];
    assert!(joined.identifiers.contains("x1") && joined.identifiers.contains("x2"));
    assert_eq!(joined.field_text(Field::Name), Some("First"));
    assert_eq!(joined.field_text(Field::Location), Some("Delhi"));
    assert_eq!(joined.quality, Quality::High);
    assert_eq!(joined.contributing_sources, vec![SourceKind::Mock, SourceKind::ProfileScrape]);
    assert!(outcome.profiles[1].identifiers.contains("x3"));
}

#[test]
fn test_link_keeps_most_recent_value_on_tie() {
    init_tracing();

    let records = vec![
        record(SourceKind::Mock, Quality::Medium, &["a"], &[]),
        record(SourceKind::Mock, Quality::Medium, &["b"], &[(Field::Location, "old")]),
        record(SourceKind::Mock, Quality::Medium, &["a"], &[(Field::Location, "new")]),
        record(SourceKind::Mock, Quality::Medium, &["a", "b"], &[]),
    ];
    let profiles = Deduplicator::merge(records);

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].field_text(Field::Location), Some("new"));
}

#[test]
fn test_link_still_prefers_higher_quality() {
    init_tracing();

    let records = vec![
        record(SourceKind::DomainEmail, Quality::Low, &["a"], &[(Field::Headline, "later low")]),
        record(SourceKind::ProfileScrape, Quality::High, &["b"], &[(Field::Headline, "earlier high")]),
        record(SourceKind::DomainEmail, Quality::Low, &["a"], &[(Field::Headline, "latest low")]),
        record(SourceKind::Mock, Quality::Medium, &["b", "a"], &[]),
    ];
    let profiles = Deduplicator::merge(records);

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].field_text(Field::Headline), Some("earlier high"));
}

#[test]
fn test_identifiers_match_case_insensitively() {
    init_tracing();

    let mut direct = record(SourceKind::Mock, Quality::Medium, &[], &[(Field::Location, "Pune")]);
    direct.identifiers.insert(" HTTPS://Site/in/A ".to_string());
    let records = vec![
        record(SourceKind::DomainEmail, Quality::Low, &["A@X.com"], &[]),
        record(SourceKind::Mock, Quality::Medium, &["a@x.com", "https://site/in/a"], &[]),
        direct,
    ];
    let outcome = Deduplicator::merge_with_stats(records);

    assert_eq!(outcome.profiles.len(), 1);
    assert_eq!(outcome.merged, 2);
    let expected: BTreeSet<String> = ["a@x.com", "https://site/in/a"].iter().map(|s| s.to_string()).collect();
    assert_eq!(outcome.profiles[0].identifiers, expected);
}

#[test]
fn test_field_merge_prefers_quality_then_recency() {
    init_tracing();

    let records = vec![
        record(SourceKind::ProfileScrape, Quality::High, &["id"], &[(Field::Headline, "from high")]),
        record(SourceKind::DomainEmail, Quality::Low, &["id"], &[(Field::Headline, "from low")]),
        record(SourceKind::Mock, Quality::Medium, &["id"], &[(Field::Location, "first")]),
        record(SourceKind::Mock, Quality::Medium, &["id"], &[(Field::Location, "second")]),
        record(SourceKind::ProfileScrape, Quality::High, &["id"], &[(Field::Location, "   ")]),
    ];
    let profiles = Deduplicator::merge(records);

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].field_text(Field::Headline), Some("from high"));
    assert_eq!(profiles[0].field_text(Field::Location), Some("second"));
}

#[test]
fn test_empty_value_never_overwrites() {
    init_tracing();

    let mut skills = record(SourceKind::ProfileScrape, Quality::High, &["id"], &[]);
    skills.fields.insert(Field::Skills, FieldValue::List(vec![]));
    let records = vec![
        record(SourceKind::Mock, Quality::Low, &["id"], &[(Field::Degree, "B.E.")]),
        record(SourceKind::ProfileScrape, Quality::High, &["id"], &[(Field::Degree, "")]),
        skills,
    ];
    let profiles = Deduplicator::merge(records);

    assert_eq!(profiles[0].field_text(Field::Degree), Some("B.E."));
    assert!(!profiles[0].fields.contains_key(&Field::Skills));
}

#[test]
fn test_identifierless_records_are_discarded() {
    init_tracing();

    let mut blank = record(SourceKind::Mock, Quality::Medium, &[], &[(Field::Headline, "nobody")]);
    blank.identifiers.insert("  ".to_string());
    let records = vec![
        blank,
        record(SourceKind::Mock, Quality::Medium, &["someone"], &[]),
    ];
    let outcome = Deduplicator::merge_with_stats(records);

    assert_eq!(outcome.discarded, 1);
    assert_eq!(outcome.merged, 0);
    assert_eq!(outcome.profiles.len(), 1);
    assert_eq!(outcome.profiles[0].first_arrival, 1);
}

#[test]
fn test_empty_input() {
    let outcome = Deduplicator::merge_with_stats(Vec::new());
    assert!(outcome.profiles.is_empty());
    assert_eq!(outcome.discarded, 0);
}

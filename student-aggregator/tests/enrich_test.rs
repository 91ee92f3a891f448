mod common;

use common::{init_tracing, record};
use student_aggregator::enrich::{classify_status, extract_years, matches_institution};
use student_aggregator::{
    enrich, CanonicalProfile, Deduplicator, EducationEntry, Field, FieldValue, Quality, SourceKind, StudentStatus,
};

const INSTITUTION: &str = "HKB College of Engineering";

fn education(school: &str, degree: &str, field_of_study: &str, dates: &str) -> EducationEntry {
    EducationEntry {
        school: school.to_string(),
        degree: degree.to_string(),
        field_of_study: field_of_study.to_string(),
        dates: dates.to_string(),
    }
}

fn profile_with(entries: Vec<EducationEntry>, extra: &[(Field, &str)]) -> CanonicalProfile {
    let mut candidate = record(SourceKind::ProfileScrape, Quality::High, &["https://site/in/p"], extra);
    candidate.fields.insert(Field::Education, FieldValue::Education(entries));
    Deduplicator::merge(vec![candidate]).remove(0)
}

#[test]
fn test_year_extraction() {
    assert_eq!(extract_years("2018 - 2022"), vec![2018, 2022]);
    assert_eq!(extract_years("Aug 2019 – May 2023"), vec![2019, 2023]);
    assert!(extract_years("Present").is_empty());
    assert!(extract_years("1999 - 1995").is_empty());
}

#[test]
fn test_graduation_year_is_latest_matching_year() {
    init_tracing();

    let profile = profile_with(vec![education(INSTITUTION, "B.E.", "Computer Science", "2018 - 2022")], &[]);
    let enriched = enrich(&profile, INSTITUTION, 2025);

    assert_eq!(enriched.field_text(Field::GraduationYear), Some("2022"));
    assert_eq!(enriched.field_text(Field::Degree), Some("B.E."));
    assert_eq!(enriched.status, StudentStatus::Alumni);
    assert!(matches!(
        enriched.fields.get(&Field::CollegeEducation),
        Some(FieldValue::Education(entries)) if entries.len() == 1
    ));
}

#[test]
fn test_no_year_leaves_status_unknown() {
    init_tracing();

    let profile = profile_with(vec![education(INSTITUTION, "", "Mechanical", "Present")], &[]);
    let enriched = enrich(&profile, INSTITUTION, 2025);

    assert_eq!(enriched.field_text(Field::GraduationYear), None);
    assert_eq!(enriched.field_text(Field::Degree), Some("Mechanical"));
    assert_eq!(enriched.status, StudentStatus::Unknown);
}

#[test]
fn test_only_matching_schools_count() {
    init_tracing();

    let profile = profile_with(
        vec![
            education("Delhi Public School", "High School", "", "2014 - 2018"),
            education("hkb college of engg", "", "", "2019 - 2023"),
            education("IIM Bangalore", "MBA", "", "2024 - 2026"),
        ],
        &[],
    );
    let enriched = enrich(&profile, INSTITUTION, 2025);

    assert_eq!(enriched.field_text(Field::GraduationYear), Some("2023"));
    assert_eq!(enriched.status, StudentStatus::RecentGraduate);
    assert_eq!(enriched.field_text(Field::Degree), None);
}

#[test]
fn test_existing_year_kept_without_match() {
    init_tracing();

    let profile = profile_with(Vec::new(), &[(Field::GraduationYear, "2026")]);
    let enriched = enrich(&profile, INSTITUTION, 2025);

    assert_eq!(enriched.field_text(Field::GraduationYear), Some("2026"));
    assert_eq!(enriched.status, StudentStatus::CurrentStudent);
    assert!(!enriched.fields.contains_key(&Field::CollegeEducation));
}

#[test]
fn test_enrich_is_pure() {
    let profile = profile_with(vec![education(INSTITUTION, "B.E.", "", "2020 - 2024")], &[]);
    let before = profile.clone();
    let _ = enrich(&profile, INSTITUTION, 2025);
    assert_eq!(profile, before);
}

#[test]
fn test_status_boundaries() {
    assert_eq!(classify_status(Some("2026"), 2025), StudentStatus::CurrentStudent);
    assert_eq!(classify_status(Some("2025"), 2025), StudentStatus::CurrentStudent);
    assert_eq!(classify_status(Some("2024"), 2025), StudentStatus::RecentGraduate);
    assert_eq!(classify_status(Some("2023"), 2025), StudentStatus::RecentGraduate);
    assert_eq!(classify_status(Some("2022"), 2025), StudentStatus::Alumni);
    assert_eq!(classify_status(None, 2025), StudentStatus::Unknown);
    assert_eq!(classify_status(Some("twenty"), 2025), StudentStatus::Unknown);
}

#[test]
fn test_institution_token_matching() {
    assert!(matches_institution("HKBK College of Engineering, Bangalore", INSTITUTION));
    assert!(matches_institution("Some College", INSTITUTION));
    assert!(!matches_institution("IIT Delhi", INSTITUTION));
    // "of" is too short to count
    assert!(!matches_institution("University of Mysore", "HKB of"));
}

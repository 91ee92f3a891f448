use crate::traits::{AdapterUsage, SourceAdapter};
use crate::types::{
    CandidateRecord, EducationEntry, ExperienceEntry, Field, FieldMap, FieldValue, Quality, Result, SourceKind,
};
use crate::utils::slugify;
use async_trait::async_trait;
use tracing::info;

const DEPARTMENTS: [&str; 6] = [
    "Computer Science",
    "Mechanical Engineering",
    "Electronics",
    "Civil Engineering",
    "Information Technology",
    "Electrical Engineering",
];

const LOCATIONS: [&str; 6] = [
    "Bangalore, India",
    "Mumbai, India",
    "Delhi, India",
    "Chennai, India",
    "Hyderabad, India",
    "Pune, India",
];

const SKILLS: [[&str; 6]; 6] = [
    ["Python", "Java", "Data Science", "Machine Learning", "SQL", "Git"],
    ["AutoCAD", "SolidWorks", "Manufacturing", "ANSYS", "CATIA", "Thermodynamics"],
    ["Circuit Design", "Embedded Systems", "IoT", "VLSI", "MATLAB", "PCB Design"],
    ["Structural Analysis", "Project Management", "Construction", "STAAD Pro", "Surveying", "Revit"],
    ["JavaScript", "React", "Node.js", "Cloud Computing", "Linux", "Networking"],
    ["Power Systems", "Control Systems", "PLC", "MATLAB", "Renewable Energy", "SCADA"],
];

const ROLES: [&str; 3] = ["Intern", "Trainee", "Project Assistant"];

/// Deterministic synthetic source for offline runs and tests.
///
/// Same inputs give the same records. No requests are issued. `offset` shifts
/// the generated sequence so two mock sources can feed one run without
/// colliding.
#[derive(Debug, Default)]
pub struct MockSource {
    offset: usize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(offset: usize) -> Self {
        Self { offset }
    }

    fn record(&self, institution: &str, n: usize) -> Option<CandidateRecord> {
        let department = DEPARTMENTS[n % DEPARTMENTS.len()];
        let graduation_year = 2023 + (n % 3) as i32;
        let short_name = institution.split_whitespace().next().unwrap_or("College");
        let slug = slugify(short_name);
        let ordinal = n + 1;

        let skills: Vec<String> = SKILLS[n % SKILLS.len()]
            .iter()
            .take(3 + n % 4)
            .map(|s| s.to_string())
            .collect();

        let experience = vec![ExperienceEntry {
            title: format!("{} {}", department, ROLES[n % ROLES.len()]),
            company: format!("Tech Company {}", ordinal),
            duration: "3 months".to_string(),
            description: String::new(),
        }];

        let education = vec![EducationEntry {
            school: institution.trim().to_string(),
            degree: "Bachelor of Engineering".to_string(),
            field_of_study: department.to_string(),
            dates: format!("{} - {}", graduation_year - 4, graduation_year),
        }];

        let mut fields = FieldMap::new();
        fields.insert(Field::Name, FieldValue::Text(format!("Student {} {}", ordinal, short_name)));
        fields.insert(Field::College, FieldValue::text(institution.trim()));
        fields.insert(Field::Degree, FieldValue::text(department));
        fields.insert(Field::GraduationYear, FieldValue::Text(graduation_year.to_string()));
        fields.insert(Field::Location, FieldValue::text(LOCATIONS[n % LOCATIONS.len()]));
        fields.insert(
            Field::Headline,
            FieldValue::Text(format!("{} student at {} | Aspiring Engineer", department, institution.trim())),
        );
        fields.insert(
            Field::ProfileUrl,
            FieldValue::Text(format!("https://linkedin.com/in/student-{}-{}", slug, ordinal)),
        );
        fields.insert(Field::Connections, FieldValue::Count(100 + (n as u64) * 25));
        fields.insert(Field::Skills, FieldValue::List(skills));
        fields.insert(Field::Experience, FieldValue::Experience(experience));
        fields.insert(Field::Education, FieldValue::Education(education));

        CandidateRecord::from_fields(SourceKind::Mock, Quality::Medium, fields)
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Mock
    }

    fn source_name(&self) -> String {
        "Mock".to_string()
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<CandidateRecord>> {
        let records: Vec<CandidateRecord> = (self.offset..self.offset + limit)
            .filter_map(|n| self.record(query, n))
            .collect();
        info!("Generated {} mock records for {}", records.len(), query);
        Ok(records)
    }

    fn usage(&self) -> AdapterUsage {
        AdapterUsage::default()
    }
}

use crate::types::{EducationEntry, ExperienceEntry, Field, FieldMap, FieldValue};
use crate::utils::{text::normalize_whitespace, url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

const NAME_SELECTORS: &[&str] = &[
    r#"h1[class*="text-heading-xlarge"]"#,
    ".pv-text-details__left-panel h1",
    "h1.text-heading-xlarge",
    ".top-card-layout__title",
    ".pv-top-card--list li:first-child h1",
];

const HEADLINE_SELECTORS: &[&str] = &[
    r#"div[class*="text-body-medium break-words"]"#,
    ".pv-text-details__left-panel .text-body-medium",
    ".top-card-layout__headline",
    ".pv-top-card--list-bullet .text-body-medium",
];

const LOCATION_SELECTORS: &[&str] = &[
    r#"span[class*="text-body-small inline t-black--light break-words"]"#,
    ".pv-text-details__left-panel .text-body-small",
    ".top-card-layout__first-subline",
    ".pv-top-card__location",
];

const ABOUT_SELECTORS: &[&str] = &[
    "#about + * .pv-shared-text-with-see-more",
    ".pv-about__summary-text",
    r#"section[data-section="summary"] .pv-shared-text-with-see-more"#,
];

const MAX_EXPERIENCE: usize = 5;
const MAX_SKILLS: usize = 10;

/// Ordered selectors; the first one that matches wins.
struct SelectorChain(Vec<Selector>);

impl SelectorChain {
    fn new(selectors: &[&str]) -> Self {
        let parsed = selectors
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    warn!("Skipping invalid selector {:?}: {:?}", s, e);
                    None
                }
            })
            .collect();
        Self(parsed)
    }

    fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.0
            .iter()
            .filter_map(|selector| scope.select(selector).next())
            .map(element_text)
            .find(|text| !text.is_empty())
    }

    /// First match whose text passes `accept`; later selectors are tried when
    /// an earlier match is rejected.
    fn first_text_where(&self, scope: ElementRef<'_>, accept: impl Fn(&str) -> bool) -> Option<String> {
        self.0
            .iter()
            .filter_map(|selector| scope.select(selector).next())
            .map(element_text)
            .find(|text| !text.is_empty() && accept(text))
    }

    fn all<'a>(&'a self, scope: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.0.iter().flat_map(move |selector| scope.select(selector))
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn has_ancestor_class(element: ElementRef<'_>, class: &str) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().classes().any(|c| c == class))
}

/// Best-effort extraction of profile fields from a rendered profile page.
/// Every field is optional; a page with none of them still parses.
pub struct ProfileParser {
    name: SelectorChain,
    headline: SelectorChain,
    location: SelectorChain,
    about: SelectorChain,
    experience_items: SelectorChain,
    experience_title: SelectorChain,
    experience_company: SelectorChain,
    experience_duration: SelectorChain,
    education_items: SelectorChain,
    education_school: SelectorChain,
    education_degree: SelectorChain,
    education_field: SelectorChain,
    education_dates: SelectorChain,
    skills: SelectorChain,
    connections: SelectorChain,
    profile_links: SelectorChain,
}

impl Default for ProfileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileParser {
    pub fn new() -> Self {
        Self {
            name: SelectorChain::new(NAME_SELECTORS),
            headline: SelectorChain::new(HEADLINE_SELECTORS),
            location: SelectorChain::new(LOCATION_SELECTORS),
            about: SelectorChain::new(ABOUT_SELECTORS),
            experience_items: SelectorChain::new(&[".pv-entity__summary-info, .pv-profile-section__list-item"]),
            experience_title: SelectorChain::new(&["h3", ".pv-entity__summary-info-v2 h3"]),
            experience_company: SelectorChain::new(&[
                ".pv-entity__secondary-title",
                ".pv-entity__summary-info-v2 .text-body-small",
            ]),
            experience_duration: SelectorChain::new(&[".pv-entity__bullet-item", ".pv-entity__date-range"]),
            education_items: SelectorChain::new(&[".pv-profile-section.education .pv-entity__summary-info"]),
            education_school: SelectorChain::new(&["h3"]),
            education_degree: SelectorChain::new(&[".pv-entity__degree-name .pv-entity__comma-item"]),
            education_field: SelectorChain::new(&[".pv-entity__fos .pv-entity__comma-item"]),
            education_dates: SelectorChain::new(&[".pv-entity__dates .pv-entity__comma-item", ".pv-entity__dates time"]),
            skills: SelectorChain::new(&[".pv-skill-category-entity__name-text, .pv-skill-entity__skill-name"]),
            connections: SelectorChain::new(&[".t-bold .t-black", ".pv-top-card--list-bullet .t-bold"]),
            profile_links: SelectorChain::new(&[r#"a[href*="linkedin.com/in/"]"#]),
        }
    }

    pub fn parse_profile(&self, html: &str) -> FieldMap {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let mut fields = FieldMap::new();

        let mut put_text = |field: Field, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                fields.insert(field, FieldValue::Text(value));
            }
        };

        put_text(Field::Name, self.name.first_text(root));
        put_text(Field::Headline, self.headline.first_text(root));
        put_text(
            Field::Location,
            self.location
                .first_text_where(root, |text| !text.to_lowercase().contains("connections")),
        );
        put_text(Field::About, self.about.first_text(root));
        put_text(
            Field::Connections,
            self.connections
                .first_text_where(root, |text| text.to_lowercase().contains("connection")),
        );

        let experience = self.parse_experience(root);
        if !experience.is_empty() {
            fields.insert(Field::Experience, FieldValue::Experience(experience));
        }

        let education = self.parse_education(root);
        if !education.is_empty() {
            fields.insert(Field::Education, FieldValue::Education(education));
        }

        let skills = self.parse_skills(root);
        if !skills.is_empty() {
            fields.insert(Field::Skills, FieldValue::List(skills));
        }

        debug!("Parsed {} profile fields", fields.len());
        fields
    }

    fn parse_experience(&self, root: ElementRef<'_>) -> Vec<ExperienceEntry> {
        self.experience_items
            .all(root)
            .filter(|item| !has_ancestor_class(*item, "education"))
            .filter_map(|item| {
                let title = self.experience_title.first_text(item)?;
                Some(ExperienceEntry {
                    title,
                    company: self.experience_company.first_text(item).unwrap_or_default(),
                    duration: self.experience_duration.first_text(item).unwrap_or_default(),
                    description: String::new(),
                })
            })
            .take(MAX_EXPERIENCE)
            .collect()
    }

    fn parse_education(&self, root: ElementRef<'_>) -> Vec<EducationEntry> {
        self.education_items
            .all(root)
            .filter_map(|item| {
                let school = self.education_school.first_text(item)?;
                Some(EducationEntry {
                    school,
                    degree: self.education_degree.first_text(item).unwrap_or_default(),
                    field_of_study: self.education_field.first_text(item).unwrap_or_default(),
                    dates: self.education_dates.first_text(item).unwrap_or_default(),
                })
            })
            .collect()
    }

    fn parse_skills(&self, root: ElementRef<'_>) -> Vec<String> {
        let mut seen = HashSet::new();
        self.skills
            .all(root)
            .map(element_text)
            .filter(|skill| !skill.is_empty() && seen.insert(skill.clone()))
            .take(MAX_SKILLS)
            .collect()
    }

    /// Profile URLs linked from a search results page, redirects unwrapped,
    /// query strings stripped, first occurrence kept.
    pub fn extract_profile_links(&self, html: &str, limit: usize) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut links: Vec<String> = Vec::new();

        for anchor in self.profile_links.all(document.root_element()) {
            if links.len() >= limit {
                break;
            }
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let target = url::strip_query(&url::unwrap_search_redirect(href));
            if url::is_profile_url(&target) && !links.contains(&target) {
                links.push(target);
            }
        }

        links
    }
}

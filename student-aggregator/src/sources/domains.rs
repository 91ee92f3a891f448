use crate::utils::is_stop_word;
use tracing::warn;

/// Suffix appended to a guessed domain
pub const GENERIC_DOMAIN_SUFFIX: &str = ".edu.in";

/// Known institutions and the email domains their people use
const INSTITUTION_DOMAINS: &[(&str, &[&str])] = &[
    ("HKB College of Engineering", &["hkbk.edu.in", "hkbkce.ac.in"]),
    ("RV College of Engineering", &["rvce.edu.in"]),
    ("BMS College of Engineering", &["bmsce.ac.in"]),
    ("VTU", &["vtu.ac.in"]),
    ("Anna University", &["annauniv.edu"]),
    ("IIT Bangalore", &["iisc.ac.in"]),
    ("NIT Karnataka", &["nitk.edu.in"]),
    ("Manipal Institute of Technology", &["manipal.edu"]),
    ("PES University", &["pes.edu"]),
    ("Dayananda Sagar College of Engineering", &["dayanandasagar.edu"]),
    ("Sir M Visvesvaraya Institute of Technology", &["sirmvit.edu"]),
    ("Bangalore Institute of Technology", &["bit-bangalore.edu.in"]),
    ("MS Ramaiah Institute of Technology", &["msrit.edu"]),
    ("New Horizon College of Engineering", &["newhorizonindia.edu"]),
    ("REVA University", &["reva.edu.in"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainMatch {
    Exact,
    Fuzzy,
    /// Built from the name itself; may not exist
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainResolution {
    pub domains: Vec<String>,
    pub matched: DomainMatch,
}

impl DomainResolution {
    fn from_table(domains: &[&str], matched: DomainMatch) -> Self {
        Self {
            domains: domains.iter().map(|d| d.to_string()).collect(),
            matched,
        }
    }

    pub fn is_generic(&self) -> bool {
        self.matched == DomainMatch::Generic
    }
}

/// Resolve the email domains for an institution: exact name match, then a
/// case-insensitive substring match in either direction, then a guessed domain.
pub fn resolve_domains(institution: &str) -> DomainResolution {
    let query = institution.trim();

    if let Some((_, domains)) = INSTITUTION_DOMAINS.iter().find(|(name, _)| *name == query) {
        return DomainResolution::from_table(domains, DomainMatch::Exact);
    }

    let query_lower = query.to_lowercase();
    if !query_lower.is_empty() {
        let fuzzy = INSTITUTION_DOMAINS.iter().find(|(name, _)| {
            let name_lower = name.to_lowercase();
            name_lower.contains(&query_lower) || query_lower.contains(&name_lower)
        });
        if let Some((_, domains)) = fuzzy {
            return DomainResolution::from_table(domains, DomainMatch::Fuzzy);
        }
    }

    let stem: String = query_lower
        .split_whitespace()
        .filter(|word| !is_stop_word(word))
        .flat_map(|word| word.chars().filter(|c| c.is_ascii_alphanumeric()))
        .collect();

    if stem.is_empty() {
        warn!("Cannot build a domain for institution {:?}", institution);
        return DomainResolution {
            domains: Vec::new(),
            matched: DomainMatch::Generic,
        };
    }

    let generic_domain = format!("{}{}", stem, GENERIC_DOMAIN_SUFFIX);
    warn!(
        "No specific domain found for {}, using generic: {}",
        institution, generic_domain
    );
    DomainResolution {
        domains: vec![generic_domain],
        matched: DomainMatch::Generic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let resolution = resolve_domains("HKB College of Engineering");
        assert_eq!(resolution.matched, DomainMatch::Exact);
        assert_eq!(resolution.domains, vec!["hkbk.edu.in", "hkbkce.ac.in"]);
    }

    #[test]
    fn test_fuzzy_match_both_directions() {
        let shorter = resolve_domains("pes university");
        assert_eq!(shorter.matched, DomainMatch::Fuzzy);
        assert_eq!(shorter.domains, vec!["pes.edu"]);

        let longer = resolve_domains("Students of RV College of Engineering, Bangalore");
        assert_eq!(longer.matched, DomainMatch::Fuzzy);
        assert_eq!(longer.domains, vec!["rvce.edu.in"]);
    }

    #[test]
    fn test_generic_fallback_strips_stop_words() {
        let resolution = resolve_domains("Acme College of Engineering");
        assert!(resolution.is_generic());
        assert_eq!(resolution.domains, vec!["acme.edu.in"]);
    }

    #[test]
    fn test_empty_name_has_no_domain() {
        let resolution = resolve_domains("   ");
        assert!(resolution.is_generic());
        assert!(resolution.domains.is_empty());
    }
}

pub mod domain_email;
pub mod domains;
pub mod mock;
pub mod profile_scrape;

pub use domain_email::DomainEmailSource;
pub use domains::{resolve_domains, DomainMatch, DomainResolution};
pub use mock::MockSource;
pub use profile_scrape::{ProfileLocator, ProfileScrapeSource};

/// Words dropped from an institution name when a domain has to be guessed
pub fn is_stop_word(word: &str) -> bool {
    matches!(word, "college" | "engineering" | "of")
}

/// Lower-case, hyphen-separated form of a name, e.g. for synthetic profile URLs
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Text processing utilities
pub mod text {
    /// Collapse runs of whitespace and trim the ends
    pub fn normalize_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Template substitution for search queries
    pub fn fill_template(template: &str, institution: &str) -> String {
        template.replace("{institution}", institution.trim())
    }
}

/// URL utilities
pub mod url {
    use url::Url;

    /// An http(s) URL whose host is a LinkedIn domain and whose path is a
    /// member profile (`/in/<handle>`)
    pub fn is_profile_url(url_str: &str) -> bool {
        let Ok(url) = Url::parse(url_str.trim()) else {
            return false;
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }
        let host_ok = url
            .host_str()
            .map(|h| h.to_lowercase())
            .map(|h| h == "linkedin.com" || h.ends_with(".linkedin.com"))
            .unwrap_or(false);
        let mut segments = url.path_segments().into_iter().flatten();
        let path_ok = segments.next() == Some("in") && segments.next().map(|s| !s.is_empty()).unwrap_or(false);
        host_ok && path_ok
    }

    /// Drop query string and fragment
    pub fn strip_query(url_str: &str) -> String {
        url_str
            .split(['?', '#'])
            .next()
            .unwrap_or(url_str)
            .to_string()
    }

    /// Unwrap a search-engine redirect (`/url?q=<target>&...`) to its target.
    /// Links that are not redirects come back unchanged.
    pub fn unwrap_search_redirect(href: &str) -> String {
        if !href.contains("/url?") {
            return href.to_string();
        }
        let Ok(base) = Url::parse("https://www.google.com/") else {
            return href.to_string();
        };
        base.join(href)
            .ok()
            .and_then(|resolved| {
                resolved
                    .query_pairs()
                    .find(|(key, _)| key == "q")
                    .map(|(_, value)| value.into_owned())
            })
            .unwrap_or_else(|| href.to_string())
    }

    /// Search page URL for a query
    pub fn search_url(query: &str) -> Option<String> {
        Url::parse_with_params("https://www.google.com/search", &[("q", query)])
            .ok()
            .map(|u| u.to_string())
    }
}

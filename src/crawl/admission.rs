//! Frontier admission rules.

use crate::config::CrawlTarget;
use crate::url_info::{URLInfo, UrlType};

/// Whether `candidate` (discovered relative to `seed`, the crawl's original
/// target URL) may be admitted to the frontier, independent of content-type
/// (checked separately once a response is in hand).
#[must_use]
pub fn is_admitted(candidate: &URLInfo, seed: &URLInfo, target: &CrawlTarget) -> bool {
    if !candidate.is_valid() {
        return false;
    }
    if !matches!(candidate.scheme(), "http" | "https" | "file") {
        return false;
    }
    if !target.follow_external && candidate.url_type(Some(seed)) == UrlType::External {
        return false;
    }
    if target.exclude_patterns.iter().any(|p| p.is_match(candidate.normalized())) {
        return false;
    }
    if !target.required_patterns.is_empty() && !target.required_patterns.iter().any(|p| p.is_match(candidate.normalized())) {
        return false;
    }
    if !target.allowed_paths.is_empty() && !target.allowed_paths.iter().any(|prefix| candidate.path().starts_with(prefix.as_str())) {
        return false;
    }
    if target.excluded_paths.iter().any(|prefix| candidate.path().starts_with(prefix.as_str())) {
        return false;
    }
    true
}

/// Whether `content_type` (from the fetched response) is one of the
/// target's allowed content types. A response outside this list is counted
/// visited-but-not-fetched rather than processed.
#[must_use]
pub fn content_type_allowed(content_type: Option<&str>, target: &CrawlTarget) -> bool {
    if target.content_types.is_empty() {
        return true;
    }
    let Some(content_type) = content_type else {
        return false;
    };
    let base = content_type.split(';').next().unwrap_or(content_type).trim();
    target.content_types.iter().any(|allowed| allowed.eq_ignore_ascii_case(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlTarget;

    fn target() -> CrawlTarget {
        CrawlTarget::builder("https://example.com/").build().unwrap()
    }

    #[test]
    fn rejects_invalid_urls() {
        let seed = URLInfo::parse_standalone("https://example.com/");
        let candidate = URLInfo::parse_standalone("javascript:alert(1)");
        assert!(!is_admitted(&candidate, &seed, &target()));
    }

    #[test]
    fn rejects_external_domains_by_default() {
        let seed = URLInfo::parse_standalone("https://example.com/");
        let candidate = URLInfo::parse_standalone("https://other.org/");
        assert!(!is_admitted(&candidate, &seed, &target()));
    }

    #[test]
    fn allows_external_when_follow_external_is_set() {
        let seed = URLInfo::parse_standalone("https://example.com/");
        let candidate = URLInfo::parse_standalone("https://other.org/");
        let target = CrawlTarget::builder("https://example.com/").follow_external(true).build().unwrap();
        assert!(is_admitted(&candidate, &seed, &target));
    }

    #[test]
    fn required_pattern_must_match() {
        let seed = URLInfo::parse_standalone("https://example.com/");
        let target = CrawlTarget::builder("https://example.com/").required_pattern("/docs/").build().unwrap();
        let matching = URLInfo::parse_standalone("https://example.com/docs/guide");
        let non_matching = URLInfo::parse_standalone("https://example.com/blog/post");
        assert!(is_admitted(&matching, &seed, &target));
        assert!(!is_admitted(&non_matching, &seed, &target));
    }

    #[test]
    fn excluded_path_prefix_is_rejected() {
        let seed = URLInfo::parse_standalone("https://example.com/");
        let target = CrawlTarget::builder("https://example.com/").excluded_path("/changelog").build().unwrap();
        let candidate = URLInfo::parse_standalone("https://example.com/changelog/v2");
        assert!(!is_admitted(&candidate, &seed, &target));
    }

    #[test]
    fn content_type_match_is_case_insensitive_and_ignores_parameters() {
        let target = CrawlTarget::builder("https://example.com/").content_types(vec!["text/html".to_string()]).build().unwrap();
        assert!(content_type_allowed(Some("Text/HTML; charset=utf-8"), &target));
        assert!(!content_type_allowed(Some("application/json"), &target));
    }
}

//! User-registered URL filters applied while rewriting links during HTML
//! extraction (spec.md §4.6 step 7: "apply user-registered URL filters").
//!
//! Distinct from `crawl::admission::is_admitted` (spec.md §4.9.1), which
//! decides whether a *discovered* link is enqueued onto the frontier. This
//! filter runs earlier, inside content extraction itself, and decides
//! whether a link rewritten into `ProcessedContent.links` and the markdown
//! body keeps its resolved href or is replaced with `#`, the same
//! treatment already given to dangerous schemes.

use regex::Regex;

/// Compiled exclude/require patterns, built once per crawl target and
/// shared by every page processed for that target.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    exclude: Vec<Regex>,
    required: Vec<Regex>,
}

impl LinkFilter {
    #[must_use]
    pub fn new(exclude: Vec<Regex>, required: Vec<Regex>) -> Self {
        Self { exclude, required }
    }

    /// No patterns registered: every link passes through untouched. Used by
    /// standalone format-handler tests and any caller with no per-target
    /// patterns to enforce.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_allowed(&self, resolved_url: &str) -> bool {
        if self.exclude.iter().any(|p| p.is_match(resolved_url)) {
            return false;
        }
        if !self.required.is_empty() && !self.required.iter().any(|p| p.is_match(resolved_url)) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_all_passes_everything() {
        let filter = LinkFilter::allow_all();
        assert!(filter.is_allowed("https://example.com/anything"));
    }

    #[test]
    fn exclude_pattern_rejects_matching_links() {
        let filter = LinkFilter::new(vec![Regex::new("/changelog").unwrap()], vec![]);
        assert!(!filter.is_allowed("https://example.com/changelog/v2"));
        assert!(filter.is_allowed("https://example.com/guide"));
    }

    #[test]
    fn required_pattern_rejects_non_matching_links() {
        let filter = LinkFilter::new(vec![], vec![Regex::new("/docs/").unwrap()]);
        assert!(filter.is_allowed("https://example.com/docs/guide"));
        assert!(!filter.is_allowed("https://example.com/blog/post"));
    }
}

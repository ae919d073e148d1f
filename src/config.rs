//! Plain-record configuration with fluent builders: fields are fixed ahead
//! of time (unknown keys are a compile error, not a runtime one), and
//! construction goes through a builder that validates as it goes rather
//! than accepting a free-form map.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;

/// The user-supplied crawl specification: one seed, how far and wide to
/// follow it, and what to keep.
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    pub seed: String,
    pub depth: u32,
    pub follow_external: bool,
    pub content_types: Vec<String>,
    pub exclude_patterns: Vec<Regex>,
    pub required_patterns: Vec<Regex>,
    pub max_pages: Option<usize>,
    pub allowed_paths: Vec<String>,
    pub excluded_paths: Vec<String>,
}

impl CrawlTarget {
    #[must_use]
    pub fn builder(seed: impl Into<String>) -> CrawlTargetBuilder {
        CrawlTargetBuilder::new(seed)
    }
}

/// Builder for [`CrawlTarget`]; regex patterns are compiled eagerly so a
/// malformed pattern fails at construction rather than mid-crawl.
pub struct CrawlTargetBuilder {
    seed: String,
    depth: u32,
    follow_external: bool,
    content_types: Vec<String>,
    exclude_patterns: Vec<String>,
    required_patterns: Vec<String>,
    max_pages: Option<usize>,
    allowed_paths: Vec<String>,
    excluded_paths: Vec<String>,
}

impl CrawlTargetBuilder {
    #[must_use]
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            depth: 1,
            follow_external: false,
            content_types: vec!["text/html".to_string()],
            exclude_patterns: Vec::new(),
            required_patterns: Vec::new(),
            max_pages: None,
            allowed_paths: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }

    #[must_use]
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn follow_external(mut self, follow: bool) -> Self {
        self.follow_external = follow;
        self
    }

    #[must_use]
    pub fn content_types(mut self, types: Vec<String>) -> Self {
        self.content_types = types;
        self
    }

    #[must_use]
    pub fn exclude_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    #[must_use]
    pub fn required_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.required_patterns.push(pattern.into());
        self
    }

    #[must_use]
    pub fn max_pages(mut self, max: usize) -> Self {
        self.max_pages = Some(max);
        self
    }

    #[must_use]
    pub fn allowed_path(mut self, prefix: impl Into<String>) -> Self {
        self.allowed_paths.push(prefix.into());
        self
    }

    #[must_use]
    pub fn excluded_path(mut self, prefix: impl Into<String>) -> Self {
        self.excluded_paths.push(prefix.into());
        self
    }

    pub fn build(self) -> Result<CrawlTarget, regex::Error> {
        let exclude_patterns = self
            .exclude_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let required_patterns = self
            .required_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CrawlTarget {
            seed: self.seed,
            depth: self.depth,
            follow_external: self.follow_external,
            content_types: self.content_types,
            exclude_patterns,
            required_patterns,
            max_pages: self.max_pages,
            allowed_paths: self.allowed_paths,
            excluded_paths: self.excluded_paths,
        })
    }
}

/// Operational parameters for the crawl engine: concurrency, rate
/// limiting, retries, and the fetch client's own settings.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub concurrent_requests: usize,
    pub requests_per_second: f64,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub respect_robots: bool,
    pub user_agent: String,
    pub default_headers: HashMap<String, String>,
    pub seed_search_enabled: bool,
    pub seed_search_result_cap: usize,
    pub quality: QualityConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CrawlerConfig {
    #[must_use]
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::default()
    }
}

pub struct CrawlerConfigBuilder {
    concurrent_requests: usize,
    requests_per_second: f64,
    max_retries: u32,
    request_timeout: Duration,
    respect_robots: bool,
    user_agent: String,
    default_headers: HashMap<String, String>,
    seed_search_enabled: bool,
    seed_search_result_cap: usize,
    quality: QualityConfig,
}

impl Default for CrawlerConfigBuilder {
    fn default() -> Self {
        Self {
            concurrent_requests: 8,
            requests_per_second: 2.0,
            max_retries: 2,
            request_timeout: Duration::from_secs(30),
            respect_robots: true,
            user_agent: "docscrawl/0.1".to_string(),
            default_headers: HashMap::new(),
            seed_search_enabled: false,
            seed_search_result_cap: 10,
            quality: QualityConfig::default(),
        }
    }
}

impl CrawlerConfigBuilder {
    #[must_use]
    pub fn concurrent_requests(mut self, n: usize) -> Self {
        self.concurrent_requests = n;
        self
    }

    #[must_use]
    pub fn requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn respect_robots(mut self, respect: bool) -> Self {
        self.respect_robots = respect;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    #[must_use]
    pub fn default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn seed_search(mut self, enabled: bool, result_cap: usize) -> Self {
        self.seed_search_enabled = enabled;
        self.seed_search_result_cap = result_cap;
        self
    }

    #[must_use]
    pub fn quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    #[must_use]
    pub fn build(self) -> CrawlerConfig {
        CrawlerConfig {
            concurrent_requests: self.concurrent_requests,
            requests_per_second: self.requests_per_second,
            max_retries: self.max_retries,
            request_timeout: self.request_timeout,
            respect_robots: self.respect_robots,
            user_agent: self.user_agent,
            default_headers: self.default_headers,
            seed_search_enabled: self.seed_search_enabled,
            seed_search_result_cap: self.seed_search_result_cap,
            quality: self.quality,
        }
    }
}

/// Thresholds consulted by the Quality Checker.
#[derive(Debug, Clone)]
pub struct QualityConfig {
    pub min_content_length: usize,
    pub max_content_length: usize,
    pub min_headings: usize,
    pub max_heading_level: u8,
    pub min_internal_links: usize,
    pub min_code_block_length: usize,
    pub max_code_block_length: usize,
    pub required_metadata: Vec<String>,
    pub allowed_code_languages: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_content_length: 0,
            max_content_length: usize::MAX,
            min_headings: 0,
            max_heading_level: 6,
            min_internal_links: 0,
            min_code_block_length: 0,
            max_code_block_length: usize::MAX,
            required_metadata: Vec::new(),
            allowed_code_languages: Vec::new(),
        }
    }
}

/// Thresholds consulted by the Document Organizer's relation discovery:
/// the similarity floor for linking two documents, category rules keyed
/// by keyword, and the stop-word list used when tokenizing for search.
#[derive(Debug, Clone)]
pub struct OrganizationConfig {
    pub min_similarity_score: f64,
    pub category_rules: HashMap<String, Vec<String>>,
    pub stop_words: Vec<String>,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            min_similarity_score: 0.3,
            category_rules: HashMap::new(),
            stop_words: default_stop_words(),
        }
    }
}

fn default_stop_words() -> Vec<String> {
    [
        "a", "an", "the", "and", "or", "but", "is", "are", "was", "were", "be", "been", "being",
        "to", "of", "in", "on", "at", "by", "for", "with", "about", "as", "into", "through",
        "this", "that", "these", "those", "it", "its", "from", "can", "will", "not",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_builder_compiles_patterns() {
        let target = CrawlTarget::builder("https://example.com")
            .depth(2)
            .exclude_pattern(r"/changelog/")
            .build()
            .unwrap();
        assert_eq!(target.depth, 2);
        assert_eq!(target.exclude_patterns.len(), 1);
    }

    #[test]
    fn target_builder_rejects_bad_regex() {
        let result = CrawlTarget::builder("https://example.com")
            .exclude_pattern("(unclosed")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn config_defaults_are_sane() {
        let config = CrawlerConfig::default();
        assert!(config.concurrent_requests > 0);
        assert!(config.requests_per_second > 0.0);
    }
}

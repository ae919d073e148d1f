//! The Crawl Engine: frontier management, scheduling, and orchestration of
//! every other component. A shared frontier behind a lock, a
//! concurrency-limiting semaphore, tasks tracked in a join set, one task
//! per dequeued URL, with per-domain circuit breaking and retries layered
//! on top.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tracing::{debug, instrument, warn};

use crate::backend::{Backend, BackendResult, DirectBackend, FileBackend, HttpBackend};
use crate::backend_selector::{BackendSelector, Criteria};
use crate::config::{CrawlTarget, CrawlerConfig, OrganizationConfig};
use crate::content::format::ContentProcessor;
use crate::content::link_filter::LinkFilter;
use crate::crawl::admission::{content_type_allowed, is_admitted};
use crate::crawl::circuit_breaker::CircuitBreaker;
use crate::crawl::external::{ProjectIdentifierService, SeedSearchService};
use crate::crawl::progress::{ProgressEvent, ProgressSink, ProgressStatus};
use crate::crawl::stats::{CrawlResult, FailedUrl, StatsCounters};
use crate::organizer::{DocumentId, DocumentOrganizer};
use crate::quality::{check_quality, QualityIssue};
use crate::rate_limiter::RateLimiter;
use crate::retry::RetryStrategy;
use crate::url_info::URLInfo;

/// Owns every other component and runs one crawl at a time per instance.
///
/// `crawl` takes `self: Arc<Self>` because each dequeued URL is processed
/// as an independent `tokio::spawn`ed task that shares the frontier,
/// visited set, stats, and organizer — the engine and its components must
/// outlive the call across every spawned task, which an `&self` borrow
/// cannot express.
pub struct CrawlEngine {
    config: CrawlerConfig,
    selector: BackendSelector,
    rate_limiter: RateLimiter,
    retry: RetryStrategy,
    circuit_breaker: CircuitBreaker,
    processor: ContentProcessor,
    organizer: Arc<DocumentOrganizer>,
    project_identifier: Option<Arc<dyn ProjectIdentifierService>>,
    seed_search: Option<Arc<dyn SeedSearchService>>,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl CrawlEngine {
    /// Build an engine with the default backend set: an `HttpBackend` for
    /// http/https and a `FileBackend` for `file://`.
    pub fn new(config: CrawlerConfig, organization: OrganizationConfig) -> anyhow::Result<Self> {
        let mut selector = BackendSelector::new();
        let http = HttpBackend::new(&config.user_agent, config.request_timeout, true)?;
        selector.register(
            "http",
            Arc::new(http),
            Criteria {
                priority: 0,
                schemes: vec!["http".to_string(), "https".to_string()],
                ..Criteria::default()
            },
        );
        selector.register(
            "file",
            Arc::new(FileBackend::new()),
            Criteria {
                priority: 0,
                schemes: vec!["file".to_string()],
                ..Criteria::default()
            },
        );

        Ok(Self {
            rate_limiter: RateLimiter::new(config.requests_per_second),
            retry: RetryStrategy::default(),
            circuit_breaker: CircuitBreaker::new(5, 2, Duration::from_secs(60)),
            processor: ContentProcessor::new(),
            organizer: Arc::new(DocumentOrganizer::new(organization)),
            config,
            selector,
            project_identifier: None,
            seed_search: None,
            progress: None,
        })
    }

    /// Register a backend that bypasses normal selection by outranking
    /// every other registered backend. Used for deterministic,
    /// networkless tests.
    #[must_use]
    pub fn with_direct_backend(mut self, backend: Arc<DirectBackend>) -> Self {
        self.selector.register(
            "direct",
            backend,
            Criteria {
                priority: i32::MAX,
                schemes: vec!["http".to_string(), "https".to_string(), "file".to_string()],
                ..Criteria::default()
            },
        );
        self
    }

    #[must_use]
    pub fn with_project_identifier(mut self, service: Arc<dyn ProjectIdentifierService>) -> Self {
        self.project_identifier = Some(service);
        self
    }

    #[must_use]
    pub fn with_seed_search(mut self, service: Arc<dyn SeedSearchService>) -> Self {
        self.seed_search = Some(service);
        self
    }

    #[must_use]
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    #[must_use]
    pub fn organizer(&self) -> &Arc<DocumentOrganizer> {
        &self.organizer
    }

    /// Run one crawl to completion.
    ///
    /// Always returns successfully — per-URL failures are recorded in the
    /// returned [`CrawlResult`] rather than propagated.
    #[instrument(skip(self, target), fields(seed = %target.seed))]
    pub async fn crawl(self: Arc<Self>, target: CrawlTarget) -> CrawlResult {
        let start_time = Utc::now();
        let stats = Arc::new(StatsCounters::default());
        let issues: Arc<AsyncMutex<Vec<QualityIssue>>> = Arc::new(AsyncMutex::new(Vec::new()));
        let documents: Arc<AsyncMutex<Vec<DocumentId>>> = Arc::new(AsyncMutex::new(Vec::new()));
        let failed_urls: Arc<AsyncMutex<Vec<FailedUrl>>> = Arc::new(AsyncMutex::new(Vec::new()));
        let metrics: Arc<AsyncMutex<HashMap<String, u64>>> = Arc::new(AsyncMutex::new(HashMap::new()));

        let seed_url = match self.resolve_seed(&target).await {
            Ok(url) => url,
            Err(reason) => {
                return CrawlResult {
                    target,
                    stats: stats.snapshot(start_time, Utc::now()),
                    documents: Vec::new(),
                    issues: vec![fatal_issue(&reason)],
                    metrics: HashMap::new(),
                    visited_urls: Vec::new(),
                    failed_urls: vec![FailedUrl { url: String::new(), error: reason }],
                };
            }
        };

        let frontier: Arc<AsyncMutex<VecDeque<(URLInfo, u32)>>> = Arc::new(AsyncMutex::new(VecDeque::new()));
        let visited: Arc<AsyncMutex<HashSet<String>>> = Arc::new(AsyncMutex::new(HashSet::new()));

        frontier.lock().await.push_back((seed_url.clone(), 0));

        if self.config.seed_search_enabled {
            if let Some(search) = &self.seed_search {
                let identity = crate::project_identifier::identify_from_url(seed_url.normalized());
                let query = format!("{} {} documentation", target.seed, identity.language.as_deref().unwrap_or(""));
                let results = search.search(query.trim()).await;
                let mut front = frontier.lock().await;
                for raw in results.into_iter().take(self.config.seed_search_result_cap) {
                    let candidate = URLInfo::parse_standalone(&raw);
                    if candidate.is_valid() && matches!(candidate.scheme(), "http" | "https") {
                        front.push_back((candidate, 0));
                    }
                }
            }
        }

        let target = Arc::new(target);
        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_requests.max(1)));
        let mut tasks = tokio::task::JoinSet::new();

        loop {
            loop {
                if let Some(max_pages) = target.max_pages {
                    if visited.lock().await.len() >= max_pages {
                        break;
                    }
                }
                if tasks.len() >= self.config.concurrent_requests {
                    break;
                }

                let next = frontier.lock().await.pop_front();
                let Some((url, depth)) = next else { break };

                let normalized = url.normalized().to_string();
                {
                    let mut v = visited.lock().await;
                    if v.contains(&normalized) {
                        continue;
                    }
                    if let Some(max_pages) = target.max_pages {
                        if v.len() >= max_pages {
                            break;
                        }
                    }
                    v.insert(normalized.clone());
                }

                if !is_admitted(&url, &seed_url, &target) {
                    stats.pages_skipped_by_policy.fetch_add(1, Ordering::Relaxed);
                    continue;
                }

                let domain = domain_key(&url);
                if !self.circuit_breaker.should_attempt(&domain) {
                    stats.pages_skipped_by_policy.fetch_add(1, Ordering::Relaxed);
                    continue;
                }

                let engine = Arc::clone(&self);
                let seed_for_task = seed_url.clone();
                let target_for_task = Arc::clone(&target);
                let visited_for_task = Arc::clone(&visited);
                let permit = Arc::clone(&semaphore)
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed while the engine holds its Arc");

                tasks.spawn(async move {
                    let _permit = permit;
                    engine.process_one(seed_for_task, target_for_task, visited_for_task, url, depth).await
                });
            }

            if tasks.is_empty() {
                break;
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    warn!(error = %join_err, "crawl task panicked");
                    continue;
                }
            };

            self.apply_outcome(
                outcome,
                &stats,
                &issues,
                &documents,
                &failed_urls,
                &metrics,
                &frontier,
                &visited,
                &target,
            )
            .await;
        }

        let visited_urls: Vec<String> = visited.lock().await.iter().cloned().collect();
        let end_time = Utc::now();
        let target = Arc::try_unwrap(target).unwrap_or_else(|arc| (*arc).clone());

        CrawlResult {
            target,
            stats: stats.snapshot(start_time, end_time),
            documents: Arc::try_unwrap(documents).map(AsyncMutex::into_inner).unwrap_or_default(),
            issues: Arc::try_unwrap(issues).map(AsyncMutex::into_inner).unwrap_or_default(),
            metrics: Arc::try_unwrap(metrics).map(AsyncMutex::into_inner).unwrap_or_default(),
            visited_urls,
            failed_urls: Arc::try_unwrap(failed_urls).map(AsyncMutex::into_inner).unwrap_or_default(),
        }
    }

    /// If the target resembles a URL, seed with it directly; else resolve
    /// it as a package name through the external Project Identifier.
    async fn resolve_seed(&self, target: &CrawlTarget) -> Result<URLInfo, String> {
        let raw = if looks_like_url(&target.seed) {
            target.seed.clone()
        } else {
            match &self.project_identifier {
                Some(identifier) => identifier
                    .discover_doc_url(&target.seed)
                    .await
                    .ok_or_else(|| format!("could not resolve target: {}", target.seed))?,
                None => return Err(format!("could not resolve target: {}", target.seed)),
            }
        };

        let url = URLInfo::parse_standalone(&raw);
        if !url.is_valid() {
            return Err(format!("could not resolve target: {} ({})", target.seed, url.error().unwrap_or("invalid URL")));
        }
        Ok(url)
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_outcome(
        &self,
        outcome: TaskOutcome,
        stats: &Arc<StatsCounters>,
        issues: &Arc<AsyncMutex<Vec<QualityIssue>>>,
        documents: &Arc<AsyncMutex<Vec<DocumentId>>>,
        failed_urls: &Arc<AsyncMutex<Vec<FailedUrl>>>,
        metrics: &Arc<AsyncMutex<HashMap<String, u64>>>,
        frontier: &Arc<AsyncMutex<VecDeque<(URLInfo, u32)>>>,
        visited: &Arc<AsyncMutex<HashSet<String>>>,
        target: &Arc<CrawlTarget>,
    ) {
        match outcome {
            TaskOutcome::Success {
                url,
                depth,
                bytes,
                quality_issues,
                page_metrics,
                doc_id,
                discovered_links,
            } => {
                stats.pages_attempted.fetch_add(1, Ordering::Relaxed);
                stats.pages_succeeded.fetch_add(1, Ordering::Relaxed);
                stats.bytes_processed.fetch_add(bytes as u64, Ordering::Relaxed);
                stats.quality_issues.fetch_add(quality_issues.len() as u64, Ordering::Relaxed);

                documents.lock().await.push(doc_id);
                let issues_found = quality_issues.len();
                issues.lock().await.extend(quality_issues);
                {
                    let mut m = metrics.lock().await;
                    for (k, v) in page_metrics {
                        *m.entry(k).or_insert(0) += v;
                    }
                }

                if depth < target.depth {
                    let mut front = frontier.lock().await;
                    let v = visited.lock().await;
                    for link in discovered_links {
                        if !v.contains(link.normalized()) {
                            front.push_back((link, depth + 1));
                        }
                    }
                }

                self.emit_progress(ProgressStatus::Success, &url, depth, documents, issues_found).await;
            }
            TaskOutcome::Discarded { url, depth, reason } => {
                stats.pages_attempted.fetch_add(1, Ordering::Relaxed);
                debug!(url, reason, "page discarded after fetch");
                self.emit_progress(ProgressStatus::Error, &url, depth, documents, 0).await;
            }
            TaskOutcome::Failed { url, depth, error } => {
                stats.pages_attempted.fetch_add(1, Ordering::Relaxed);
                stats.pages_failed.fetch_add(1, Ordering::Relaxed);
                failed_urls.lock().await.push(FailedUrl { url: url.clone(), error: error.clone() });
                issues.lock().await.push(QualityIssue::general_error(&error));
                stats.quality_issues.fetch_add(1, Ordering::Relaxed);
                self.emit_progress(ProgressStatus::Error, &url, depth, documents, 1).await;
            }
        }
    }

    async fn emit_progress(
        &self,
        status: ProgressStatus,
        url: &str,
        depth: u32,
        documents: &Arc<AsyncMutex<Vec<DocumentId>>>,
        issues_found: usize,
    ) {
        if let Some(sink) = &self.progress {
            let documents_found = documents.lock().await.len();
            sink.on_progress(ProgressEvent {
                url: url.to_string(),
                status,
                depth,
                pages_processed: documents_found,
                queue_size: 0,
                issues_found,
                documents_found,
            });
        }
    }

    /// Process one admitted URL end to end: backend select, rate limit,
    /// retry loop, content processing, quality check, organizer add, link
    /// discovery. Runs inside a spawned task, so every shared resource it
    /// touches arrives behind an `Arc`.
    async fn process_one(
        &self,
        seed: URLInfo,
        target: Arc<CrawlTarget>,
        visited: Arc<AsyncMutex<HashSet<String>>>,
        url: URLInfo,
        depth: u32,
    ) -> TaskOutcome {
        let normalized = url.normalized().to_string();
        let domain = domain_key(&url);

        let Some(backend) = self.selector.select(&url) else {
            return TaskOutcome::Failed {
                url: normalized,
                depth,
                error: "no backend available".to_string(),
            };
        };

        self.rate_limiter.acquire_and_wait(&domain).await;

        let max_attempts = self.config.max_retries + 1;
        self.selector.record_start(backend.as_ref());
        let mut result: Option<BackendResult> = None;
        for attempt in 1..=max_attempts {
            let attempted = backend.crawl(&url).await;
            let status = attempted.status;
            let transient = RetryStrategy::should_retry(status);
            result = Some(attempted);
            if status == 200 || !transient || attempt == max_attempts {
                break;
            }
            tokio::time::sleep(self.retry.get_delay(attempt)).await;
        }

        let Some(result) = result else {
            self.selector.record_completion(backend.as_ref(), false);
            return TaskOutcome::Failed { url: normalized, depth, error: "no response from backend".to_string() };
        };

        if result.status != 200 {
            self.selector.record_completion(backend.as_ref(), false);
            self.circuit_breaker.record_failure(&domain, result.error.as_deref().unwrap_or("fetch failed"));
            return TaskOutcome::Failed {
                url: normalized,
                depth,
                error: result.error.clone().unwrap_or_else(|| format!("status {}", result.status)),
            };
        }

        self.selector.record_completion(backend.as_ref(), true);
        self.circuit_breaker.record_success(&domain);

        if !content_type_allowed(result.content_type(), &target) {
            return TaskOutcome::Discarded {
                url: normalized,
                depth,
                reason: format!("content type {:?} not in allowed list", result.content_type()),
            };
        }

        // Redirect-aware dedup against the shared visited set before any
        // processing happens.
        let final_normalized = URLInfo::parse_standalone(&result.final_url).normalized().to_string();
        if final_normalized != normalized {
            let mut v = visited.lock().await;
            if v.contains(&final_normalized) {
                return TaskOutcome::Discarded {
                    url: normalized,
                    depth,
                    reason: "redirected to an already-visited URL".to_string(),
                };
            }
            v.insert(final_normalized);
        }

        let content_type = result.content_type().map(str::to_string);
        let text = result.text();
        let bytes = text.len();
        let link_filter = LinkFilter::new(target.exclude_patterns.clone(), target.required_patterns.clone());
        let processed = self.processor.process(
            &text,
            &result.final_url,
            content_type.as_deref(),
            content_type.as_deref(),
            None,
            &self.config.quality,
            &link_filter,
        );
        let (quality_issues, page_metrics) = check_quality(&processed, &self.config.quality);

        let mut discovered_links = Vec::new();
        if depth < target.depth {
            for link in &processed.links {
                let candidate = URLInfo::parse_standalone(&link.href);
                if is_admitted(&candidate, &seed, &target) {
                    discovered_links.push(candidate);
                }
            }
        }

        let doc_id = self.organizer.add_document(processed);

        TaskOutcome::Success {
            url: normalized,
            depth,
            bytes,
            quality_issues,
            page_metrics,
            doc_id,
            discovered_links,
        }
    }
}

/// One admitted URL's end-to-end result, produced inside a spawned task and
/// folded into shared stats/frontier/organizer state by `apply_outcome` on
/// the orchestrating task — the only writer of that state.
enum TaskOutcome {
    Success {
        url: String,
        depth: u32,
        bytes: usize,
        quality_issues: Vec<QualityIssue>,
        page_metrics: HashMap<String, u64>,
        doc_id: DocumentId,
        discovered_links: Vec<URLInfo>,
    },
    Discarded {
        url: String,
        depth: u32,
        reason: String,
    },
    Failed {
        url: String,
        depth: u32,
        error: String,
    },
}

/// A crude URL-shape heuristic: contains a scheme separator.
fn looks_like_url(seed: &str) -> bool {
    seed.contains("://")
}

fn domain_key(url: &URLInfo) -> String {
    url.registered_domain().or_else(|| url.host()).unwrap_or(url.scheme()).to_string()
}

fn fatal_issue(message: &str) -> QualityIssue {
    QualityIssue::general_error(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendResult, DirectBackend, Headers};
    use crate::config::{CrawlTarget, CrawlerConfig};

    fn html_response(body: &str) -> BackendResult {
        let mut headers = Headers::new();
        headers.insert("content-type", "text/html");
        BackendResult::success("placeholder", 200, headers, body.as_bytes().to_vec())
    }

    fn register(direct: &DirectBackend, url: &str, body: &str) {
        let mut response = html_response(body);
        response.final_url = url.to_string();
        let normalized = URLInfo::parse_standalone(url).normalized().to_string();
        direct.register(normalized, response);
    }

    #[tokio::test]
    async fn simple_site_depth_one_crawls_every_linked_page() {
        let direct = Arc::new(DirectBackend::new());
        register(
            &direct,
            "file:///docs/index.html",
            r#"<html><body><h1>Index</h1>
               <a href="api.html">API</a>
               <a href="guide.html">Guide</a>
               <a href="examples.html">Examples</a></body></html>"#,
        );
        register(&direct, "file:///docs/api.html", "<html><body><h1>API</h1><p>endpoint reference</p></body></html>");
        register(&direct, "file:///docs/guide.html", "<html><body><h1>Guide</h1><p>tutorial walkthrough</p></body></html>");
        register(&direct, "file:///docs/examples.html", "<html><body><h1>Examples</h1><p>sample code</p></body></html>");

        let config = CrawlerConfig::builder().concurrent_requests(4).requests_per_second(1000.0).build();
        let engine = Arc::new(CrawlEngine::new(config, OrganizationConfig::default()).unwrap().with_direct_backend(direct));

        let target = CrawlTarget::builder("file:///docs/index.html")
            .depth(2)
            .max_pages(10)
            .content_types(vec!["text/html".to_string()])
            .build()
            .unwrap();

        let result = engine.crawl(target).await;
        assert_eq!(result.stats.pages_succeeded, 4);
        assert_eq!(result.documents.len(), 4);
        assert!(result.failed_urls.is_empty());
    }

    #[tokio::test]
    async fn two_links_redirecting_to_the_same_page_are_crawled_once() {
        let direct = Arc::new(DirectBackend::new());
        register(
            &direct,
            "https://example.com/",
            r#"<html><body><a href="/alias1">one</a><a href="/alias2">two</a></body></html>"#,
        );

        // Both aliases resolve (through whatever redirect chain a real HTTP
        // backend would have already followed) to the same canonical page.
        let mut alias1 = html_response("<html><body><h1>Canonical</h1></body></html>");
        alias1.final_url = "https://example.com/canonical".to_string();
        direct.register(URLInfo::parse_standalone("https://example.com/alias1").normalized().to_string(), alias1);

        let mut alias2 = html_response("<html><body><h1>Canonical</h1></body></html>");
        alias2.final_url = "https://example.com/canonical".to_string();
        direct.register(URLInfo::parse_standalone("https://example.com/alias2").normalized().to_string(), alias2);

        let config = CrawlerConfig::builder().requests_per_second(1000.0).build();
        let engine = Arc::new(CrawlEngine::new(config, OrganizationConfig::default()).unwrap().with_direct_backend(direct));

        let target = CrawlTarget::builder("https://example.com/")
            .depth(1)
            .content_types(vec!["text/html".to_string()])
            .build()
            .unwrap();

        let result = engine.crawl(target).await;
        // The index page plus exactly one of the two redirect-aliased pages.
        assert_eq!(result.documents.len(), 2);
    }

    #[tokio::test]
    async fn retries_on_server_error_then_succeeds() {
        use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

        struct FlakyBackend {
            attempts: AtomicUsize,
        }

        #[async_trait::async_trait]
        impl Backend for FlakyBackend {
            fn name(&self) -> &str {
                "flaky"
            }
            async fn crawl(&self, url: &URLInfo) -> BackendResult {
                let n = self.attempts.fetch_add(1, AtomicOrdering::Relaxed);
                if n < 2 {
                    return BackendResult::synthetic_error(url.normalized(), 500, "boom");
                }
                let mut headers = Headers::new();
                headers.insert("content-type", "text/html");
                BackendResult::success(url.normalized(), 200, headers, b"<html><body><h1>ok</h1></body></html>".to_vec())
            }
        }

        let mut selector_config = CrawlerConfig::builder().max_retries(2).requests_per_second(1000.0).build();
        selector_config.quality.min_content_length = 0;

        let mut engine = CrawlEngine::new(selector_config, OrganizationConfig::default()).unwrap();
        engine.selector.register(
            "flaky",
            Arc::new(FlakyBackend { attempts: AtomicUsize::new(0) }),
            Criteria {
                priority: 100,
                schemes: vec!["https".to_string()],
                ..Criteria::default()
            },
        );
        let engine = Arc::new(engine);

        let target = CrawlTarget::builder("https://example.com/flaky")
            .depth(0)
            .content_types(vec!["text/html".to_string()])
            .build()
            .unwrap();

        let result = engine.crawl(target).await;
        assert_eq!(result.stats.pages_succeeded, 1);
        assert!(result.failed_urls.is_empty());
    }

    #[tokio::test]
    async fn max_pages_zero_crawls_nothing() {
        let direct = Arc::new(DirectBackend::new());
        register(&direct, "https://example.com/", "<html><body><h1>hi</h1></body></html>");
        let config = CrawlerConfig::default();
        let engine = Arc::new(CrawlEngine::new(config, OrganizationConfig::default()).unwrap().with_direct_backend(direct));
        let target = CrawlTarget::builder("https://example.com/").max_pages(0).build().unwrap();
        let result = engine.crawl(target).await;
        assert_eq!(result.stats.pages_attempted, 0);
        assert!(result.documents.is_empty());
    }

    #[tokio::test]
    async fn unresolvable_package_target_is_a_fatal_error() {
        let config = CrawlerConfig::default();
        let engine = Arc::new(CrawlEngine::new(config, OrganizationConfig::default()).unwrap());
        let target = CrawlTarget::builder("some-package-name").build().unwrap();
        let result = engine.crawl(target).await;
        assert_eq!(result.stats.pages_attempted, 0);
        assert_eq!(result.failed_urls.len(), 1);
    }
}

//! Black-box end-to-end scenarios run against the public `docscrawl` API,
//! covering the cases the in-module `crawl::engine` unit tests don't:
//! rate-limit timing and the depth/redirect-to-self boundary behaviors.

use std::sync::Arc;
use std::time::Instant;

use docscrawl::backend::{BackendResult, DirectBackend, Headers};
use docscrawl::config::{CrawlTarget, CrawlerConfig, OrganizationConfig};
use docscrawl::crawl::CrawlEngine;
use docscrawl::url_info::URLInfo;

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
async fn rate_limiting_spaces_out_requests_to_the_same_domain() {
    let direct = Arc::new(DirectBackend::new());
    register(
        &direct,
        "https://example.com/",
        r#"<html><body><a href="/one">one</a><a href="/two">two</a></body></html>"#,
    );
    register(&direct, "https://example.com/one", "<html><body><h1>One</h1></body></html>");
    register(&direct, "https://example.com/two", "<html><body><h1>Two</h1></body></html>");

    let config = CrawlerConfig::builder()
        .requests_per_second(2.0)
        .concurrent_requests(8)
        .build();
    let engine = Arc::new(CrawlEngine::new(config, OrganizationConfig::default()).unwrap().with_direct_backend(direct));

    let target = CrawlTarget::builder("https://example.com/")
        .depth(1)
        .content_types(vec!["text/html".to_string()])
        .build()
        .unwrap();

    let start = Instant::now();
    let result = engine.crawl(target).await;
    let elapsed = start.elapsed();

    assert_eq!(result.stats.pages_succeeded, 3);
    // Three requests to the same domain at 2 req/s burn at least one full
    // token-refill cycle (0.5s) beyond the two that start with a full bucket.
    assert!(elapsed.as_secs_f64() >= 0.4, "expected rate limiting to introduce a delay, took {elapsed:?}");
}

#[tokio::test]
async fn depth_zero_crawls_only_the_seed() {
    let direct = Arc::new(DirectBackend::new());
    register(
        &direct,
        "https://example.com/",
        r#"<html><body><a href="/other">other</a></body></html>"#,
    );
    register(&direct, "https://example.com/other", "<html><body><h1>Other</h1></body></html>");

    let config = CrawlerConfig::builder().requests_per_second(1000.0).build();
    let engine = Arc::new(CrawlEngine::new(config, OrganizationConfig::default()).unwrap().with_direct_backend(direct));

    let target = CrawlTarget::builder("https://example.com/")
        .depth(0)
        .content_types(vec!["text/html".to_string()])
        .build()
        .unwrap();

    let result = engine.crawl(target).await;
    assert_eq!(result.stats.pages_succeeded, 1);
    assert_eq!(result.documents.len(), 1);
}

#[tokio::test]
async fn url_redirecting_to_itself_is_crawled_once() {
    let direct = Arc::new(DirectBackend::new());
    let mut self_redirect = html_response("<html><body><h1>Self</h1></body></html>");
    self_redirect.final_url = "https://example.com/self".to_string();
    direct.register(URLInfo::parse_standalone("https://example.com/self").normalized().to_string(), self_redirect);

    let config = CrawlerConfig::builder().requests_per_second(1000.0).build();
    let engine = Arc::new(CrawlEngine::new(config, OrganizationConfig::default()).unwrap().with_direct_backend(direct));

    let target = CrawlTarget::builder("https://example.com/self")
        .depth(0)
        .content_types(vec!["text/html".to_string()])
        .build()
        .unwrap();

    let result = engine.crawl(target).await;
    assert_eq!(result.stats.pages_succeeded, 1);
    assert_eq!(result.documents.len(), 1);
}

#[tokio::test]
async fn excluded_path_pages_are_never_fetched() {
    let direct = Arc::new(DirectBackend::new());
    register(
        &direct,
        "https://example.com/",
        r#"<html><body><a href="/docs/guide">guide</a><a href="/changelog/v2">changelog</a></body></html>"#,
    );
    register(&direct, "https://example.com/docs/guide", "<html><body><h1>Guide</h1></body></html>");
    register(&direct, "https://example.com/changelog/v2", "<html><body><h1>Changelog</h1></body></html>");

    let config = CrawlerConfig::builder().requests_per_second(1000.0).build();
    let engine = Arc::new(CrawlEngine::new(config, OrganizationConfig::default()).unwrap().with_direct_backend(direct));

    let target = CrawlTarget::builder("https://example.com/")
        .depth(1)
        .excluded_path("/changelog")
        .content_types(vec!["text/html".to_string()])
        .build()
        .unwrap();

    let result = engine.crawl(target).await;
    assert_eq!(result.documents.len(), 2);
    assert!(!result.visited_urls.iter().any(|u| u.contains("changelog")));
}

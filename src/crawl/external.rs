//! Two external collaborators specified only at their interface:
//! package-name resolution and seed search. Neither is implemented
//! in-core beyond a convenience default; a production deployment is
//! expected to supply its own, e.g. one backed by a package registry.

use async_trait::async_trait;

/// `discover_doc_url(package_name) -> url?`
///
/// A default implementation built on [`crate::project_identifier::discover_doc_url`]
/// is provided as [`DefaultProjectIdentifier`] for convenience, but callers
/// may substitute their own (e.g. one that first consults a package
/// registry's metadata, which is explicitly out of scope here).
#[async_trait]
pub trait ProjectIdentifierService: Send + Sync {
    async fn discover_doc_url(&self, package_name: &str) -> Option<String>;
}

/// Probes the common documentation URL patterns via HEAD request, reusing
/// [`crate::project_identifier::discover_doc_url`].
pub struct DefaultProjectIdentifier {
    client: reqwest::Client,
}

impl DefaultProjectIdentifier {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProjectIdentifierService for DefaultProjectIdentifier {
    async fn discover_doc_url(&self, package_name: &str) -> Option<String> {
        crate::project_identifier::discover_doc_url(&self.client, package_name).await
    }
}

/// `search(query) -> list<url>`: never implemented in-core, consulted only
/// when `CrawlerConfig.seed_search_enabled` is set and a service has been
/// supplied via [`crate::crawl::CrawlEngine::with_seed_search`].
#[async_trait]
pub trait SeedSearchService: Send + Sync {
    async fn search(&self, query: &str) -> Vec<String>;
}

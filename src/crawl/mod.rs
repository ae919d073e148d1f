//! The Crawl Engine and its supporting machinery: frontier admission,
//! per-domain circuit breaking, progress reporting, the external
//! collaborator interfaces, and statistics/result types.

pub mod admission;
pub mod circuit_breaker;
mod engine;
pub mod external;
pub mod progress;
pub mod stats;

pub use circuit_breaker::{CircuitBreaker, CircuitState, DomainHealth};
pub use engine::CrawlEngine;
pub use external::{DefaultProjectIdentifier, ProjectIdentifierService, SeedSearchService};
pub use progress::{ProgressEvent, ProgressSink, ProgressStatus};
pub use stats::{CrawlResult, CrawlStats, FailedUrl, StatsCounters};

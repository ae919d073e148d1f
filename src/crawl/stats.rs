//! Per-crawl counters and the final return value.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::CrawlTarget;
use crate::organizer::DocumentId;
use crate::quality::QualityIssue;

/// Atomic counters updated by in-flight crawl tasks.
#[derive(Default)]
pub struct StatsCounters {
    pub pages_attempted: AtomicU64,
    pub pages_succeeded: AtomicU64,
    pub pages_failed: AtomicU64,
    pub bytes_processed: AtomicU64,
    pub quality_issues: AtomicU64,
    /// A page discarded for policy reasons (disallowed content type,
    /// excluded path, duplicate redirect target) rather than fetch failure.
    pub pages_skipped_by_policy: AtomicU64,
}

impl StatsCounters {
    #[must_use]
    pub fn snapshot(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> CrawlStats {
        CrawlStats {
            start_time: start,
            end_time: end,
            pages_attempted: self.pages_attempted.load(Ordering::Relaxed),
            pages_succeeded: self.pages_succeeded.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            bytes_processed: self.bytes_processed.load(Ordering::Relaxed),
            quality_issues: self.quality_issues.load(Ordering::Relaxed),
            pages_skipped_by_policy: self.pages_skipped_by_policy.load(Ordering::Relaxed),
        }
    }
}

/// A snapshot of [`StatsCounters`] taken at crawl completion.
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub pages_attempted: u64,
    pub pages_succeeded: u64,
    pub pages_failed: u64,
    pub bytes_processed: u64,
    pub quality_issues: u64,
    pub pages_skipped_by_policy: u64,
}

impl CrawlStats {
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    #[must_use]
    pub fn average_per_page(&self) -> Option<chrono::Duration> {
        if self.pages_attempted == 0 {
            return None;
        }
        Some(self.elapsed() / self.pages_attempted as i32)
    }
}

/// One URL the engine gave up on, with the reason.
#[derive(Debug, Clone)]
pub struct FailedUrl {
    pub url: String,
    pub error: String,
}

/// The return value of one crawl. Always returned successfully from
/// `crawl()` even when individual pages failed.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub target: CrawlTarget,
    pub stats: CrawlStats,
    pub documents: Vec<DocumentId>,
    pub issues: Vec<QualityIssue>,
    pub metrics: HashMap<String, u64>,
    pub visited_urls: Vec<String>,
    pub failed_urls: Vec<FailedUrl>,
}

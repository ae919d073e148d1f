//! Crate-wide error types.
//!
//! Each component defines the error cases it can produce; [`CrawlError`]
//! composes them at the public boundary, wrapping `anyhow::Error` for
//! catch-all internal failures while staying a concrete, matchable enum
//! for the cases callers actually want to branch on.

use thiserror::Error;

/// Errors surfaced by the content processing pipeline.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content length {0} exceeds configured maximum")]
    TooLarge(usize),
    #[error("content length {0} is below configured minimum")]
    TooSmall(usize),
    #[error("no handler registered for format {0}")]
    UnsupportedFormat(String),
    #[error("failed to parse {format}: {message}")]
    ParseFailed { format: String, message: String },
}

/// Errors surfaced by the document organizer.
#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("document {0} not found")]
    NotFound(String),
    #[error("collection {0} not found")]
    CollectionNotFound(String),
}

pub type OrganizerResult<T> = Result<T, OrganizerError>;

/// Errors surfaced by the crawl engine.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("could not resolve target: {0}")]
    UnresolvedTarget(String),
    #[error("no backend available for {0}")]
    NoBackend(String),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("organizer error: {0}")]
    Organizer(#[from] OrganizerError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

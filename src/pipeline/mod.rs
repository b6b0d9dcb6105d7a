//! Batch pipeline stages and the collaborator contracts they consume.
//!
//! Each stage scans the store for articles in its precondition status,
//! invokes one external collaborator per article, and commits a single state
//! transition on success. Collaborator failures are caught per item, so one
//! bad article never aborts a batch, and an interrupted run loses nothing:
//! the next invocation picks up the same pending set.

mod annotate;
mod fetch;
mod sync;

pub use annotate::run_annotate;
pub use fetch::run_fetch;
pub use sync::run_sync;

use thiserror::Error;

use crate::models::{Annotation, FetchedContent, Reference};

/// Failure from an external collaborator (listing page, article page, LLM).
/// Always recoverable: the article stays in place and is retried on a later
/// stage run.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CollaboratorError::Timeout
        } else {
            CollaboratorError::Network(e.to_string())
        }
    }
}

pub type CollabResult<T> = std::result::Result<T, CollaboratorError>;

/// Produces candidate article references from numbered listing pages.
pub trait ListingSource {
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl std::future::Future<Output = CollabResult<Vec<Reference>>> + Send;
}

/// Produces the full body (and whatever metadata the page exposes) for one
/// article url.
pub trait ContentSource {
    fn fetch_content(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = CollabResult<FetchedContent>> + Send;
}

/// Classifies an article into the taxonomy and writes a short summary.
pub trait Annotator {
    fn classify_and_summarize(
        &self,
        title: &str,
        content: &str,
    ) -> impl std::future::Future<Output = CollabResult<Annotation>> + Send;

    /// Model identifier recorded as annotation provenance.
    fn model(&self) -> &str;
}

/// Per-stage batch summary surfaced to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    pub processed: usize,
    pub failed: usize,
}

impl std::fmt::Display for StageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} processed, {} failed", self.processed, self.failed)
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an article in the pipeline.
///
/// State only advances on a confirmed stage success; failed collaborator
/// calls leave the article where it is so a later run can retry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    /// Discovered by sync, body not yet fetched.
    New,
    /// Body fetched, not yet classified/summarized.
    ContentReady,
    /// Has category + summary, awaiting a human decision.
    AnnotatedPendingReview,
    ReviewedApproved,
    ReviewedRejected,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::New => "new",
            ArticleStatus::ContentReady => "content_ready",
            ArticleStatus::AnnotatedPendingReview => "annotated_pending_review",
            ArticleStatus::ReviewedApproved => "reviewed_approved",
            ArticleStatus::ReviewedRejected => "reviewed_rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ArticleStatus::New),
            "content_ready" => Some(ArticleStatus::ContentReady),
            "annotated_pending_review" => Some(ArticleStatus::AnnotatedPendingReview),
            "reviewed_approved" => Some(ArticleStatus::ReviewedApproved),
            "reviewed_rejected" => Some(ArticleStatus::ReviewedRejected),
            _ => None,
        }
    }

    pub const ALL: [ArticleStatus; 5] = [
        ArticleStatus::New,
        ArticleStatus::ContentReady,
        ArticleStatus::AnnotatedPendingReview,
        ArticleStatus::ReviewedApproved,
        ArticleStatus::ReviewedRejected,
    ];
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked article. `url` is the unique external identifier; everything
/// else fills in as the pipeline stages run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub source: String,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub date_raw: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub annotation_model: Option<String>,
    pub annotation_timestamp: Option<DateTime<Utc>>,
    pub status: ArticleStatus,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
}

/// Minimal (url, title, date?) tuple produced by a listing source before
/// any content is fetched.
#[derive(Debug, Clone)]
pub struct Reference {
    pub url: String,
    pub title: String,
    pub date: Option<String>,
    pub source: String,
}

/// Result of fetching one article body.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub content: String,
    pub author: Option<String>,
    pub date: Option<String>,
}

/// Result of one successful classify-and-summarize call.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub category: String,
    pub summary: String,
}

/// Reviewer decision applied to an annotated article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
    /// Apply edits (if any) without changing status.
    Skip,
}

/// Per-field edit sentinel. `Clear` is distinct from `Keep`: a reviewer can
/// blank a field without it being read as "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldEdit {
    #[default]
    Keep,
    Set(String),
    Clear,
}

/// Field edits carried by a review command. Defaults leave every field alone.
#[derive(Debug, Clone, Default)]
pub struct ReviewEdits {
    pub title: FieldEdit,
    pub category: FieldEdit,
    pub summary: FieldEdit,
    pub review_note: FieldEdit,
}

impl ReviewEdits {
    pub fn is_noop(&self) -> bool {
        self.title == FieldEdit::Keep
            && self.category == FieldEdit::Keep
            && self.summary == FieldEdit::Keep
            && self.review_note == FieldEdit::Keep
    }
}

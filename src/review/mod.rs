//! Human review as an explicit command interface over the store.
//!
//! Presentation layers (the console loop here, or anything else) build
//! commands and render results; they hold no state of their own.

mod console;

pub use console::run_review_console;

use crate::db::ArticleStore;
use crate::error::Result;
use crate::models::{ReviewDecision, ReviewEdits};

/// One reviewer action against one article.
#[derive(Debug, Clone)]
pub enum ReviewCommand {
    Approve { url: String },
    EditAndApprove { url: String, edits: ReviewEdits },
    Edit { url: String, edits: ReviewEdits },
    Reject { url: String },
    Skip { url: String },
    Delete { url: String },
}

impl ReviewCommand {
    pub async fn apply(self, store: &ArticleStore) -> Result<()> {
        match self {
            ReviewCommand::Approve { url } => {
                store
                    .apply_review(&url, ReviewDecision::Approve, ReviewEdits::default())
                    .await
            }
            ReviewCommand::EditAndApprove { url, edits } => {
                store.apply_review(&url, ReviewDecision::Approve, edits).await
            }
            ReviewCommand::Edit { url, edits } => {
                store.apply_review(&url, ReviewDecision::Skip, edits).await
            }
            ReviewCommand::Reject { url } => {
                store
                    .apply_review(&url, ReviewDecision::Reject, ReviewEdits::default())
                    .await
            }
            // Explicitly decide nothing; the article stays pending.
            ReviewCommand::Skip { url } => {
                store
                    .apply_review(&url, ReviewDecision::Skip, ReviewEdits::default())
                    .await
            }
            ReviewCommand::Delete { url } => store.delete(&url).await,
        }
    }
}

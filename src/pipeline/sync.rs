use crate::db::ArticleStore;
use crate::error::Result;

use super::{ListingSource, StageReport};

/// Discover new articles from up to `pages` listing pages.
///
/// References for urls already in the store are silently ignored. A page
/// that fails to load is counted and skipped; the remaining pages still run,
/// and inserts committed so far are never rolled back. `processed` counts
/// newly created articles, `failed` counts failed pages. Zero pages means
/// zero fetches.
pub async fn run_sync<L: ListingSource>(
    store: &ArticleStore,
    listing: &L,
    pages: u32,
) -> Result<StageReport> {
    let mut report = StageReport::default();

    for page in 1..=pages {
        match listing.fetch_page(page).await {
            Ok(references) => {
                let mut created = 0usize;
                let total = references.len();
                for reference in references {
                    if store.upsert_discovered(reference).await? {
                        created += 1;
                    }
                }
                tracing::debug!("listing page {page}: {created} new of {total} references");
                report.processed += created;
            }
            Err(e) => {
                tracing::warn!("listing page {page} failed: {e}");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

use futures::stream::{self, StreamExt};

use crate::db::ArticleStore;
use crate::error::Result;
use crate::models::ArticleStatus;

use super::{ContentSource, StageReport};

// Max overlapping page loads; commits still happen one article at a time.
const FETCH_CONCURRENCY: usize = 4;

/// Fetch bodies for up to `limit` articles still in `new`.
///
/// Page loads overlap, but each article's result is committed as a single
/// store transaction, so interrupting the batch between commits is safe. A
/// failed or empty fetch leaves the article in `new` for the next run.
pub async fn run_fetch<C: ContentSource>(
    store: &ArticleStore,
    source: &C,
    limit: usize,
) -> Result<StageReport> {
    let batch = store.list_by_status(ArticleStatus::New, limit).await?;
    let mut report = StageReport::default();

    let results: Vec<_> = stream::iter(batch)
        .map(|article| async move {
            let result = source.fetch_content(&article.url).await;
            (article.url, result)
        })
        .buffered(FETCH_CONCURRENCY)
        .collect()
        .await;

    for (url, result) in results {
        match result {
            Ok(fetched) if fetched.content.trim().is_empty() => {
                tracing::warn!("fetched empty body for {url}");
                report.failed += 1;
            }
            Ok(fetched) => {
                store.apply_content(&url, fetched).await?;
                tracing::debug!("fetched content for {url}");
                report.processed += 1;
            }
            Err(e) => {
                tracing::warn!("content fetch failed for {url}: {e}");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

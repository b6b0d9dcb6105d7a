use crate::db::ArticleStore;
use crate::error::Result;
use crate::models::{is_valid_category, Annotation, ArticleStatus};

use super::{Annotator, CollabResult, CollaboratorError, StageReport};

/// Annotate up to `limit` articles in `content_ready`, retrying each up to
/// `retries` times.
///
/// A category outside the taxonomy is a failed attempt, never a stored
/// result. After all attempts fail the article stays in `content_ready` and
/// adds exactly one to the failure count; the next run starts it over from
/// scratch.
pub async fn run_annotate<A: Annotator>(
    store: &ArticleStore,
    annotator: &A,
    limit: usize,
    retries: u32,
) -> Result<StageReport> {
    let batch = store
        .list_by_status(ArticleStatus::ContentReady, limit)
        .await?;
    let mut report = StageReport::default();

    for article in batch {
        let title = article.title.as_deref().unwrap_or("");
        let content = article.content.as_deref().unwrap_or("");

        match annotate_with_retry(annotator, title, content, retries).await {
            Ok(annotation) => {
                store
                    .apply_annotation(
                        &article.url,
                        &annotation.category,
                        &annotation.summary,
                        annotator.model(),
                    )
                    .await?;
                tracing::debug!("annotated {} as {}", article.url, annotation.category);
                report.processed += 1;
            }
            Err(e) => {
                tracing::warn!("annotation failed for {}: {e}", article.url);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Immediate bounded retry around one classify-and-summarize call.
async fn annotate_with_retry<A: Annotator>(
    annotator: &A,
    title: &str,
    content: &str,
    retries: u32,
) -> CollabResult<Annotation> {
    let attempts = retries.max(1);
    let mut last_error = CollaboratorError::Api("no attempts made".into());

    for attempt in 1..=attempts {
        match annotator.classify_and_summarize(title, content).await {
            Ok(annotation) if is_valid_category(&annotation.category) => return Ok(annotation),
            Ok(annotation) => {
                tracing::debug!(
                    "attempt {attempt}/{attempts}: category outside taxonomy: {}",
                    annotation.category
                );
                last_error = CollaboratorError::InvalidResponse(format!(
                    "category outside taxonomy: {}",
                    annotation.category
                ));
            }
            Err(e) => {
                tracing::debug!("attempt {attempt}/{attempts} failed: {e}");
                last_error = e;
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::models::{FetchedContent, Reference};

    /// Fails the first `fail_first` calls, then returns `result`.
    struct FlakyAnnotator {
        calls: AtomicU32,
        fail_first: u32,
        result: Annotation,
    }

    impl FlakyAnnotator {
        fn new(fail_first: u32, category: &str, summary: &str) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first,
                result: Annotation {
                    category: category.to_string(),
                    summary: summary.to_string(),
                },
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Annotator for FlakyAnnotator {
        async fn classify_and_summarize(&self, _: &str, _: &str) -> CollabResult<Annotation> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(CollaboratorError::Api("overloaded".into()))
            } else {
                Ok(self.result.clone())
            }
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    async fn content_ready_store(url: &str) -> ArticleStore {
        let store = ArticleStore::open_in_memory().await.unwrap();
        store
            .upsert_discovered(Reference {
                url: url.to_string(),
                title: "芯片厂扩产".to_string(),
                date: Some("2026-01-05".to_string()),
                source: "EET-China".to_string(),
            })
            .await
            .unwrap();
        store
            .apply_content(
                url,
                FetchedContent {
                    content: "正文内容".to_string(),
                    author: None,
                    date: None,
                },
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_within_retry_bound() {
        let store = content_ready_store("https://e.com/a").await;
        let annotator = FlakyAnnotator::new(2, "设备", "一句话摘要。");

        let report = run_annotate(&store, &annotator, 10, 3).await.unwrap();
        assert_eq!(report, StageReport { processed: 1, failed: 0 });
        assert_eq!(annotator.calls(), 3);

        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::AnnotatedPendingReview);
        assert_eq!(article.category.as_deref(), Some("设备"));
        assert_eq!(article.summary.as_deref(), Some("一句话摘要。"));
        assert_eq!(article.annotation_model.as_deref(), Some("mock-model"));
    }

    #[tokio::test]
    async fn exhausted_retries_count_as_one_failure() {
        let store = content_ready_store("https://e.com/a").await;
        let annotator = FlakyAnnotator::new(u32::MAX, "设备", "unused");

        let report = run_annotate(&store, &annotator, 10, 3).await.unwrap();
        // One stage failure, not one per attempt.
        assert_eq!(report, StageReport { processed: 0, failed: 1 });
        assert_eq!(annotator.calls(), 3);

        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::ContentReady);
        assert!(article.category.is_none());
        assert!(article.summary.is_none());
    }

    #[tokio::test]
    async fn out_of_taxonomy_category_is_a_failed_attempt() {
        let store = content_ready_store("https://e.com/a").await;
        let annotator = FlakyAnnotator::new(0, "quantum", "摘要。");

        let report = run_annotate(&store, &annotator, 10, 2).await.unwrap();
        assert_eq!(report, StageReport { processed: 0, failed: 1 });
        // The invalid category was retried, not stored.
        assert_eq!(annotator.calls(), 2);

        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::ContentReady);
        assert!(article.category.is_none());
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{
    is_valid_category, Article, ArticleStatus, FetchedContent, FieldEdit, Reference,
    ReviewDecision, ReviewEdits,
};

use super::schema::SCHEMA;

const ARTICLE_COLUMNS: &str = "url, source, title, date, date_raw, author, content, category, \
     summary, annotation_model, annotation_timestamp, status, review_note, reviewed_at, \
     first_seen_at";

/// Outcome of a guarded read-modify-write, reported out of the `conn.call`
/// closure so precondition failures can become typed errors.
enum Applied {
    Ok,
    NotFound,
    WrongState(String),
}

/// Durable store of articles keyed by url. All state transitions run as a
/// single transaction per article, so an interrupted batch never leaves a
/// half-written row behind.
pub struct ArticleStore {
    conn: Connection,
}

impl ArticleStore {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    /// Insert a newly discovered reference. Returns `true` if a row was
    /// created; a url that is already present is left untouched (no field
    /// overwrite, no state reset).
    pub async fn upsert_discovered(&self, reference: Reference) -> Result<bool> {
        let created = self
            .conn
            .call(move |conn| {
                let date = reference.date.as_deref().and_then(parse_article_date);
                let changed = conn.execute(
                    "INSERT OR IGNORE INTO articles (url, source, title, date, date_raw)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        reference.url,
                        reference.source,
                        reference.title,
                        date.map(|d| d.to_string()),
                        reference.date,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(created)
    }

    pub async fn get(&self, url: &str) -> Result<Option<Article>> {
        let url = url.to_string();
        let article = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = ?1"
                ))?;
                let article = stmt.query_row(params![url], article_from_row).optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    /// Work-unit selection for the pipeline stages: oldest first, url as a
    /// stable tiebreak.
    pub async fn list_by_status(
        &self,
        status: ArticleStatus,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles
                     WHERE status = ?1
                     ORDER BY first_seen_at, url
                     LIMIT ?2"
                ))?;
                let articles = stmt
                    .query_map(params![status.as_str(), limit as i64], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Commit a fetched body and advance `new` -> `content_ready`.
    ///
    /// Fetch never overwrites: a row whose content is already present fails
    /// with `InvalidState` rather than being clobbered.
    pub async fn apply_content(&self, url: &str, fetched: FetchedContent) -> Result<()> {
        if fetched.content.trim().is_empty() {
            return Err(AppError::InvalidState(format!("empty content for {url}")));
        }

        let url_owned = url.to_string();
        let applied = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let row: Option<(String, Option<String>)> = tx
                    .query_row(
                        "SELECT status, content FROM articles WHERE url = ?1",
                        params![url_owned],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                let applied = match row {
                    None => Applied::NotFound,
                    Some((_, Some(content))) if !content.is_empty() => {
                        Applied::WrongState("content already present".into())
                    }
                    Some((status, _)) if status != "new" => {
                        Applied::WrongState(format!("expected status new, found {status}"))
                    }
                    Some(_) => {
                        let date = fetched.date.as_deref().and_then(parse_article_date);
                        tx.execute(
                            "UPDATE articles
                             SET content = ?2,
                                 author = COALESCE(?3, author),
                                 date = COALESCE(?4, date),
                                 date_raw = COALESCE(?5, date_raw),
                                 status = 'content_ready'
                             WHERE url = ?1",
                            params![
                                url_owned,
                                fetched.content,
                                fetched.author,
                                date.map(|d| d.to_string()),
                                fetched.date,
                            ],
                        )?;
                        Applied::Ok
                    }
                };
                tx.commit()?;
                Ok(applied)
            })
            .await?;

        applied.into_result(url)
    }

    /// Commit an annotation atomically (category and summary together) and
    /// advance `content_ready` -> `annotated_pending_review`.
    pub async fn apply_annotation(
        &self,
        url: &str,
        category: &str,
        summary: &str,
        model: &str,
    ) -> Result<()> {
        if !is_valid_category(category) {
            return Err(AppError::InvalidCategory(category.to_string()));
        }

        let url_owned = url.to_string();
        let category = category.to_string();
        let summary = summary.to_string();
        let model = model.to_string();
        let applied = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let status: Option<String> = tx
                    .query_row(
                        "SELECT status FROM articles WHERE url = ?1",
                        params![url_owned],
                        |row| row.get(0),
                    )
                    .optional()?;

                let applied = match status.as_deref() {
                    None => Applied::NotFound,
                    Some("content_ready") => {
                        tx.execute(
                            "UPDATE articles
                             SET category = ?2,
                                 summary = ?3,
                                 annotation_model = ?4,
                                 annotation_timestamp = datetime('now'),
                                 status = 'annotated_pending_review'
                             WHERE url = ?1",
                            params![url_owned, category, summary, model],
                        )?;
                        Applied::Ok
                    }
                    Some(status) => Applied::WrongState(format!(
                        "expected status content_ready, found {status}"
                    )),
                };
                tx.commit()?;
                Ok(applied)
            })
            .await?;

        applied.into_result(url)
    }

    /// Apply a reviewer decision and field edits in one transaction.
    ///
    /// Approve/Reject from a terminal state is the explicit re-review path
    /// and is idempotent; Skip saves edits without touching status.
    pub async fn apply_review(
        &self,
        url: &str,
        decision: ReviewDecision,
        edits: ReviewEdits,
    ) -> Result<()> {
        if let FieldEdit::Set(category) = &edits.category {
            if !is_valid_category(category) {
                return Err(AppError::InvalidCategory(category.clone()));
            }
        }

        let url_owned = url.to_string();
        let applied = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let status: Option<String> = tx
                    .query_row(
                        "SELECT status FROM articles WHERE url = ?1",
                        params![url_owned],
                        |row| row.get(0),
                    )
                    .optional()?;

                let applied = match status.as_deref() {
                    None => Applied::NotFound,
                    Some("new") | Some("content_ready") => Applied::WrongState(
                        "article has not been annotated yet".into(),
                    ),
                    Some(_) => {
                        apply_field_edit(&tx, &url_owned, "title", &edits.title)?;
                        apply_field_edit(&tx, &url_owned, "category", &edits.category)?;
                        apply_field_edit(&tx, &url_owned, "summary", &edits.summary)?;
                        apply_field_edit(&tx, &url_owned, "review_note", &edits.review_note)?;

                        match decision {
                            ReviewDecision::Approve => {
                                tx.execute(
                                    "UPDATE articles
                                     SET status = 'reviewed_approved',
                                         reviewed_at = COALESCE(reviewed_at, datetime('now'))
                                     WHERE url = ?1",
                                    params![url_owned],
                                )?;
                            }
                            ReviewDecision::Reject => {
                                tx.execute(
                                    "UPDATE articles
                                     SET status = 'reviewed_rejected',
                                         reviewed_at = COALESCE(reviewed_at, datetime('now'))
                                     WHERE url = ?1",
                                    params![url_owned],
                                )?;
                            }
                            ReviewDecision::Skip => {}
                        }
                        Applied::Ok
                    }
                };
                tx.commit()?;
                Ok(applied)
            })
            .await?;

        applied.into_result(url)
    }

    /// Hard delete. Idempotent; a later sync of the same url starts a brand
    /// new lifecycle with no residual fields.
    pub async fn delete(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM articles WHERE url = ?1", params![url])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// All approved articles dated within `year`, ordered by date then url.
    pub async fn select_for_report(&self, year: i32) -> Result<Vec<Article>> {
        let start = format!("{year:04}-01-01");
        let end = format!("{:04}-01-01", year + 1);
        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles
                     WHERE status = 'reviewed_approved'
                       AND date IS NOT NULL
                       AND date >= ?1 AND date < ?2
                     ORDER BY date, url"
                ))?;
                let articles = stmt
                    .query_map(params![start, end], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Per-status row counts, in lifecycle order, for the status summary.
    pub async fn status_counts(&self) -> Result<Vec<(ArticleStatus, i64)>> {
        let raw = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT status, COUNT(*) FROM articles GROUP BY status")?;
                let counts = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(counts)
            })
            .await?;

        let counts = ArticleStatus::ALL
            .iter()
            .map(|status| {
                let count = raw
                    .iter()
                    .find(|(s, _)| s == status.as_str())
                    .map(|(_, n)| *n)
                    .unwrap_or(0);
                (*status, count)
            })
            .collect();
        Ok(counts)
    }
}

impl Applied {
    fn into_result(self, url: &str) -> Result<()> {
        match self {
            Applied::Ok => Ok(()),
            Applied::NotFound => Err(AppError::NotFound(url.to_string())),
            Applied::WrongState(detail) => {
                Err(AppError::InvalidState(format!("{url}: {detail}")))
            }
        }
    }
}

fn apply_field_edit(
    tx: &rusqlite::Transaction<'_>,
    url: &str,
    column: &str,
    edit: &FieldEdit,
) -> rusqlite::Result<()> {
    match edit {
        FieldEdit::Keep => {}
        FieldEdit::Set(value) => {
            tx.execute(
                &format!("UPDATE articles SET {column} = ?2 WHERE url = ?1"),
                params![url, value],
            )?;
        }
        FieldEdit::Clear => {
            tx.execute(
                &format!("UPDATE articles SET {column} = NULL WHERE url = ?1"),
                params![url],
            )?;
        }
    }
    Ok(())
}

/// Parse a scraped date string into a calendar date. Accepts plain ISO dates
/// and anything that starts with one (e.g. "2026-01-02 10:33").
pub fn parse_article_date(s: &str) -> Option<NaiveDate> {
    let text = s.trim();
    if text.is_empty() {
        return None;
    }
    let bytes = text.as_bytes();
    let head = if bytes.len() >= 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && text.is_char_boundary(10)
    {
        &text[..10]
    } else {
        text
    };
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    let status: String = row.get(11)?;
    let status = ArticleStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            11,
            rusqlite::types::Type::Text,
            format!("unknown article status: {status}").into(),
        )
    })?;

    Ok(Article {
        url: row.get(0)?,
        source: row.get(1)?,
        title: row.get(2)?,
        date: row
            .get::<_, Option<String>>(3)?
            .as_deref()
            .and_then(parse_article_date),
        date_raw: row.get(4)?,
        author: row.get(5)?,
        content: row.get(6)?,
        category: row.get(7)?,
        summary: row.get(8)?,
        annotation_model: row.get(9)?,
        annotation_timestamp: row
            .get::<_, Option<String>>(10)?
            .as_deref()
            .and_then(parse_datetime),
        status,
        review_note: row.get(12)?,
        reviewed_at: row
            .get::<_, Option<String>>(13)?
            .as_deref()
            .and_then(parse_datetime),
        first_seen_at: {
            let raw: String = row.get(14)?;
            parse_datetime(&raw).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    14,
                    rusqlite::types::Type::Text,
                    format!("unreadable first_seen_at: {raw}").into(),
                )
            })?
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(url: &str) -> Reference {
        Reference {
            url: url.to_string(),
            title: format!("title for {url}"),
            date: None,
            source: "EET-China".to_string(),
        }
    }

    fn dated_reference(url: &str, date: &str) -> Reference {
        Reference {
            date: Some(date.to_string()),
            ..reference(url)
        }
    }

    fn body(content: &str) -> FetchedContent {
        FetchedContent {
            content: content.to_string(),
            author: None,
            date: None,
        }
    }

    async fn store() -> ArticleStore {
        ArticleStore::open_in_memory().await.unwrap()
    }

    /// Drive an article to annotated_pending_review.
    async fn annotated(store: &ArticleStore, url: &str, date: &str) {
        store
            .upsert_discovered(dated_reference(url, date))
            .await
            .unwrap();
        store.apply_content(url, body("full body text")).await.unwrap();
        store
            .apply_annotation(url, "设备", "一句话摘要。", "test-model")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_discovery_is_a_noop() {
        let store = store().await;

        assert!(store.upsert_discovered(reference("https://e.com/a")).await.unwrap());
        store
            .apply_content("https://e.com/a", body("some body"))
            .await
            .unwrap();

        let before = store.get("https://e.com/a").await.unwrap().unwrap();

        // Re-discovering the same url must not reset state or fields.
        let mut dup = reference("https://e.com/a");
        dup.title = "a different title".to_string();
        assert!(!store.upsert_discovered(dup).await.unwrap());

        let after = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(after.status, ArticleStatus::ContentReady);
        assert_eq!(after.title, before.title);
        assert_eq!(after.first_seen_at, before.first_seen_at);
    }

    #[tokio::test]
    async fn fetch_never_overwrites_content() {
        let store = store().await;
        store.upsert_discovered(reference("https://e.com/a")).await.unwrap();
        store.apply_content("https://e.com/a", body("original")).await.unwrap();

        let err = store
            .apply_content("https://e.com/a", body("replacement"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.content.as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn apply_content_rejects_unknown_url_and_empty_body() {
        let store = store().await;

        let err = store.apply_content("https://e.com/nope", body("x")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        store.upsert_discovered(reference("https://e.com/a")).await.unwrap();
        let err = store.apply_content("https://e.com/a", body("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn annotation_requires_taxonomy_category_and_fetched_content() {
        let store = store().await;
        store.upsert_discovered(reference("https://e.com/a")).await.unwrap();

        // Not yet fetched.
        let err = store
            .apply_annotation("https://e.com/a", "设备", "摘要。", "m")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        store.apply_content("https://e.com/a", body("body")).await.unwrap();

        let err = store
            .apply_annotation("https://e.com/a", "not-a-category", "摘要。", "m")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCategory(_)));

        // A rejected category leaves the article eligible for retry.
        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::ContentReady);
        assert!(article.category.is_none());
        assert!(article.summary.is_none());

        store
            .apply_annotation("https://e.com/a", "设备", "摘要。", "m")
            .await
            .unwrap();
        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::AnnotatedPendingReview);
        assert_eq!(article.category.as_deref(), Some("设备"));
        assert_eq!(article.summary.as_deref(), Some("摘要。"));
        assert!(article.annotation_timestamp.is_some());
    }

    #[tokio::test]
    async fn review_edit_and_clear_sentinel() {
        let store = store().await;
        annotated(&store, "https://e.com/a", "2026-03-02").await;

        let edits = ReviewEdits {
            summary: FieldEdit::Set("edited summary".to_string()),
            review_note: FieldEdit::Set("double check numbers".to_string()),
            ..Default::default()
        };
        store
            .apply_review("https://e.com/a", ReviewDecision::Approve, edits)
            .await
            .unwrap();

        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::ReviewedApproved);
        assert_eq!(article.summary.as_deref(), Some("edited summary"));
        assert_eq!(article.review_note.as_deref(), Some("double check numbers"));
        assert!(article.reviewed_at.is_some());

        // Re-edit with an explicit clear: note ends up empty, not unchanged.
        let edits = ReviewEdits {
            review_note: FieldEdit::Clear,
            ..Default::default()
        };
        store
            .apply_review("https://e.com/a", ReviewDecision::Approve, edits)
            .await
            .unwrap();

        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::ReviewedApproved);
        assert!(article.review_note.is_none());
        assert_eq!(article.summary.as_deref(), Some("edited summary"));
    }

    #[tokio::test]
    async fn review_rejects_unannotated_and_invalid_category() {
        let store = store().await;
        store.upsert_discovered(reference("https://e.com/a")).await.unwrap();

        let err = store
            .apply_review("https://e.com/a", ReviewDecision::Approve, ReviewEdits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        annotated(&store, "https://e.com/b", "2026-03-02").await;
        let edits = ReviewEdits {
            category: FieldEdit::Set("bogus".to_string()),
            ..Default::default()
        };
        let err = store
            .apply_review("https://e.com/b", ReviewDecision::Approve, edits)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCategory(_)));

        // The failed edit left nothing behind.
        let article = store.get("https://e.com/b").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::AnnotatedPendingReview);
        assert_eq!(article.category.as_deref(), Some("设备"));
    }

    #[tokio::test]
    async fn skip_saves_edits_without_transition() {
        let store = store().await;
        annotated(&store, "https://e.com/a", "2026-03-02").await;

        let edits = ReviewEdits {
            title: FieldEdit::Set("tightened title".to_string()),
            ..Default::default()
        };
        store
            .apply_review("https://e.com/a", ReviewDecision::Skip, edits)
            .await
            .unwrap();

        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::AnnotatedPendingReview);
        assert_eq!(article.title.as_deref(), Some("tightened title"));
        assert!(article.reviewed_at.is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_allows_rediscovery() {
        let store = store().await;
        annotated(&store, "https://e.com/a", "2026-03-02").await;
        store
            .apply_review("https://e.com/a", ReviewDecision::Approve, ReviewEdits::default())
            .await
            .unwrap();

        store.delete("https://e.com/a").await.unwrap();
        store.delete("https://e.com/a").await.unwrap();
        assert!(store.get("https://e.com/a").await.unwrap().is_none());

        // Rediscovery starts a brand new lifecycle.
        assert!(store.upsert_discovered(reference("https://e.com/a")).await.unwrap());
        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::New);
        assert!(article.content.is_none());
        assert!(article.category.is_none());
        assert!(article.summary.is_none());
        assert!(article.review_note.is_none());
        assert!(article.reviewed_at.is_none());
    }

    #[tokio::test]
    async fn select_for_report_filters_status_and_year() {
        let store = store().await;

        // Approved, in-year: kept.
        annotated(&store, "https://e.com/b", "2026-02-10").await;
        store
            .apply_review("https://e.com/b", ReviewDecision::Approve, ReviewEdits::default())
            .await
            .unwrap();
        annotated(&store, "https://e.com/a", "2026-02-10").await;
        store
            .apply_review("https://e.com/a", ReviewDecision::Approve, ReviewEdits::default())
            .await
            .unwrap();

        // Approved but out of year: dropped.
        annotated(&store, "https://e.com/old", "2025-12-31").await;
        store
            .apply_review("https://e.com/old", ReviewDecision::Approve, ReviewEdits::default())
            .await
            .unwrap();

        // In-year but rejected / still pending: dropped.
        annotated(&store, "https://e.com/rejected", "2026-02-11").await;
        store
            .apply_review("https://e.com/rejected", ReviewDecision::Reject, ReviewEdits::default())
            .await
            .unwrap();
        annotated(&store, "https://e.com/pending", "2026-02-12").await;

        let selected = store.select_for_report(2026).await.unwrap();
        let urls: Vec<_> = selected.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://e.com/a", "https://e.com/b"]);
    }

    #[tokio::test]
    async fn list_by_status_respects_limit_and_order() {
        let store = store().await;
        for url in ["https://e.com/c", "https://e.com/a", "https://e.com/b"] {
            store.upsert_discovered(reference(url)).await.unwrap();
        }

        let batch = store.list_by_status(ArticleStatus::New, 2).await.unwrap();
        assert_eq!(batch.len(), 2);
        // Same first_seen_at second, so the url tiebreak decides.
        assert_eq!(batch[0].url, "https://e.com/a");
        assert_eq!(batch[1].url, "https://e.com/b");

        assert!(store
            .list_by_status(ArticleStatus::ContentReady, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn status_counts_cover_all_states() {
        let store = store().await;
        store.upsert_discovered(reference("https://e.com/a")).await.unwrap();
        annotated(&store, "https://e.com/b", "2026-01-05").await;

        let counts = store.status_counts().await.unwrap();
        assert_eq!(counts.len(), ArticleStatus::ALL.len());
        assert!(counts.contains(&(ArticleStatus::New, 1)));
        assert!(counts.contains(&(ArticleStatus::AnnotatedPendingReview, 1)));
        assert!(counts.contains(&(ArticleStatus::ReviewedApproved, 0)));
    }

    #[tokio::test]
    async fn survives_close_and_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.db").to_string_lossy().to_string();

        let store = ArticleStore::open(&path).await.unwrap();
        annotated(&store, "https://e.com/a", "2026-01-05").await;
        store.close().await.unwrap();

        let store = ArticleStore::open(&path).await.unwrap();
        let article = store.get("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(article.status, ArticleStatus::AnnotatedPendingReview);
        assert_eq!(article.category.as_deref(), Some("设备"));
        assert!(article.first_seen_at <= chrono::Utc::now());
    }

    #[tokio::test]
    async fn unreadable_first_seen_at_is_an_error() {
        let store = store().await;
        store
            .conn
            .call(|conn| {
                conn.execute(
                    "INSERT INTO articles (url, source, first_seen_at)
                     VALUES ('https://e.com/a', 'EET-China', 'not a datetime')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        // A row we cannot date faithfully is surfaced, not papered over.
        let err = store.get("https://e.com/a").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn date_parsing_tolerates_trailing_time() {
        assert_eq!(
            parse_article_date("2026-01-02"),
            NaiveDate::from_ymd_opt(2026, 1, 2)
        );
        assert_eq!(
            parse_article_date(" 2026-01-02 10:33 "),
            NaiveDate::from_ymd_opt(2026, 1, 2)
        );
        assert_eq!(parse_article_date("01/02/2026"), None);
        assert_eq!(parse_article_date(""), None);
        assert_eq!(parse_article_date("昨天 12:00"), None);
    }
}

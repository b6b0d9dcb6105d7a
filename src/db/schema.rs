pub const SCHEMA: &str = r#"
-- articles table: one row per discovered url, mutated in place as the
-- pipeline advances it through its lifecycle
CREATE TABLE IF NOT EXISTS articles (
    url TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    title TEXT,
    date TEXT,
    date_raw TEXT,
    author TEXT,
    content TEXT,
    category TEXT,
    summary TEXT,
    annotation_model TEXT,
    annotation_timestamp TEXT,
    status TEXT NOT NULL DEFAULT 'new',
    review_note TEXT,
    reviewed_at TEXT,
    first_seen_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status, first_seen_at);
CREATE INDEX IF NOT EXISTS idx_articles_date ON articles(date);
"#;

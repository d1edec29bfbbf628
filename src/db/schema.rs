/// Warehouse DDL. Applied idempotently every time a warehouse handle
/// is opened; table names are substituted from the active profile.
///
/// Timestamps are stored as RFC3339 text, date parts as plain integers
/// so analysts can filter by year/month/day without date functions.
pub const WAREHOUSE_SCHEMA: &str = r#"
-- {articles} table
CREATE TABLE IF NOT EXISTS {articles} (
    id INTEGER PRIMARY KEY,
    title TEXT,
    content TEXT,
    published_at TEXT,
    author_id INTEGER,
    created_at TEXT,
    updated_at TEXT,
    deleted_at TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    word_count INTEGER NOT NULL DEFAULT 0,
    title_length INTEGER NOT NULL DEFAULT 0,
    created_year INTEGER,
    created_month INTEGER,
    created_day INTEGER,
    updated_year INTEGER,
    updated_month INTEGER,
    updated_day INTEGER,
    published_year INTEGER,
    published_month INTEGER,
    published_day INTEGER
);

CREATE INDEX IF NOT EXISTS idx_{articles}_updated_at ON {articles}(updated_at);

-- {word_counts} table
CREATE TABLE IF NOT EXISTS {word_counts} (
    article_id INTEGER NOT NULL,
    word TEXT NOT NULL,
    count INTEGER NOT NULL,
    UNIQUE(article_id, word)
);

CREATE INDEX IF NOT EXISTS idx_{word_counts}_article_id ON {word_counts}(article_id);
"#;

/// Render the DDL against the profile's table names.
pub fn warehouse_schema(articles_table: &str, word_counts_table: &str) -> String {
    WAREHOUSE_SCHEMA
        .replace("{articles}", articles_table)
        .replace("{word_counts}", word_counts_table)
}

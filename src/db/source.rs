use std::str::FromStr;

use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::SourceArticle;

/// How soft deletes are surfaced by the source schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStrategy {
    /// Active rows updated in-window, UNION ALL with a separate
    /// deletion log table; deletion rows are padded with null content.
    Union,
    /// Single predicate over the primary table: updated in-window OR
    /// carrying a non-null `deleted_at` flag column.
    DeletedFlag,
}

impl FromStr for ExtractStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "union" => Ok(Self::Union),
            "flag" => Ok(Self::DeletedFlag),
            other => Err(AppError::Config(format!(
                "unknown extract strategy '{other}' (expected 'union' or 'flag')"
            ))),
        }
    }
}

const UNION_QUERY: &str = r#"
    SELECT id, title, content, published_at, author_id, created_at, updated_at,
           NULL AS deleted_at
    FROM articles
    WHERE updated_at > ?1
    UNION ALL
    SELECT id, NULL AS title, NULL AS content, NULL AS published_at,
           NULL AS author_id, NULL AS created_at, NULL AS updated_at, deleted_at
    FROM deleted_articles_log
    WHERE deleted_at > ?1
"#;

const FLAG_QUERY: &str = r#"
    SELECT id, title, content, published_at, author_id, created_at, updated_at,
           deleted_at
    FROM articles
    WHERE updated_at > ?1 OR deleted_at IS NOT NULL
"#;

const FULL_QUERY: &str = r#"
    SELECT id, title, content, published_at, author_id, created_at, updated_at,
           deleted_at
    FROM articles
"#;

/// Raw column values before timestamp parsing.
type RawRow = (
    i64,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Handle on the relational source store, scoped to one extract stage.
/// Dropping it releases the connection on every exit path.
pub struct SourceDb {
    conn: Connection,
}

impl SourceDb {
    pub async fn connect(source_db: &str) -> Result<Self> {
        let conn = Connection::open(source_db).await.map_err(|e| {
            AppError::Connectivity(format!("cannot open source {source_db}: {e}"))
        })?;
        Ok(Self { conn })
    }

    /// New, updated, and soft-deleted articles since `since`.
    /// An empty window is a valid, empty result.
    pub async fn fetch_window(
        &self,
        strategy: ExtractStrategy,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourceArticle>> {
        let query = match strategy {
            ExtractStrategy::Union => UNION_QUERY,
            ExtractStrategy::DeletedFlag => FLAG_QUERY,
        };
        let cutoff = since.to_rfc3339();

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(query)?;
                let rows = stmt
                    .query_map([cutoff], raw_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        tracing::debug!("Extracted {} source rows", rows.len());
        rows.into_iter().map(article_from_raw).collect()
    }

    /// Every article in the source, for the historical backfill mode.
    pub async fn fetch_all(&self) -> Result<Vec<SourceArticle>> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(FULL_QUERY)?;
                let rows = stmt
                    .query_map([], raw_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        tracing::debug!("Extracted {} source rows (full table)", rows.len());
        rows.into_iter().map(article_from_raw).collect()
    }
}

fn raw_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn article_from_raw(raw: RawRow) -> Result<SourceArticle> {
    let (id, title, content, published_at, author_id, created_at, updated_at, deleted_at) = raw;
    Ok(SourceArticle {
        id,
        title,
        content,
        published_at: parse_ts("published_at", published_at)?,
        author_id,
        created_at: parse_ts("created_at", created_at)?,
        updated_at: parse_ts("updated_at", updated_at)?,
        deleted_at: parse_ts("deleted_at", deleted_at)?,
    })
}

/// Null stays null; non-null text must parse or the row is malformed.
fn parse_ts(field: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    match value {
        None => Ok(None),
        Some(s) => parse_datetime(&s).map(Some).ok_or_else(|| {
            AppError::DataShape(format!("unparseable {field} timestamp: {s:?}"))
        }),
    }
}

pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
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

#[cfg(test)]
pub(crate) mod testutil {
    use tokio_rusqlite::Connection;

    /// Source-side schema used by tests: a primary table carrying the
    /// soft-delete flag column plus the deletion log the union
    /// strategy reads.
    pub const SOURCE_SCHEMA: &str = r#"
        CREATE TABLE articles (
            id INTEGER PRIMARY KEY,
            title TEXT,
            content TEXT,
            published_at TEXT,
            author_id INTEGER,
            created_at TEXT,
            updated_at TEXT,
            deleted_at TEXT
        );

        CREATE TABLE deleted_articles_log (
            id INTEGER NOT NULL,
            deleted_at TEXT NOT NULL
        );
    "#;

    pub async fn init_source(path: &str) {
        let conn = Connection::open(path).await.unwrap();
        conn.call(|conn| {
            conn.execute_batch(SOURCE_SCHEMA)?;
            Ok(())
        })
        .await
        .unwrap();
    }

    pub async fn insert_article(
        path: &str,
        id: i64,
        content: Option<&str>,
        updated_at: &str,
        deleted_at: Option<&str>,
    ) {
        let content = content.map(str::to_string);
        let updated_at = updated_at.to_string();
        let deleted_at = deleted_at.map(str::to_string);
        let conn = Connection::open(path).await.unwrap();
        conn.call(move |conn| {
            conn.execute(
                r#"INSERT INTO articles
                   (id, title, content, published_at, author_id, created_at, updated_at, deleted_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                rusqlite::params![
                    id,
                    format!("Article {id}"),
                    content,
                    "2024-03-15T10:00:00+00:00",
                    7,
                    "2024-03-15T10:00:00+00:00",
                    updated_at,
                    deleted_at,
                ],
            )?;
            Ok(())
        })
        .await
        .unwrap();
    }

    pub async fn log_deletion(path: &str, id: i64, deleted_at: &str) {
        let deleted_at = deleted_at.to_string();
        let conn = Connection::open(path).await.unwrap();
        conn.call(move |conn| {
            conn.execute(
                "INSERT INTO deleted_articles_log (id, deleted_at) VALUES (?1, ?2)",
                rusqlite::params![id, deleted_at],
            )?;
            Ok(())
        })
        .await
        .unwrap();
    }
}

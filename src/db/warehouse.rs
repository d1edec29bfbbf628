use tokio_rusqlite::Connection;

use crate::config::Profile;
use crate::error::{AppError, Result};
use crate::models::{ArticleRecord, DateParts, WordCountRecord};

use super::schema::warehouse_schema;

/// Handle on the analytical warehouse, scoped to one load stage.
pub struct Warehouse {
    conn: Connection,
    articles_table: String,
    word_counts_table: String,
}

impl Warehouse {
    pub async fn connect(profile: &Profile) -> Result<Self> {
        let conn = Connection::open(&profile.warehouse_db).await.map_err(|e| {
            AppError::Connectivity(format!(
                "cannot open warehouse {}: {e}",
                profile.warehouse_db
            ))
        })?;

        let ddl = warehouse_schema(&profile.articles_table, &profile.word_counts_table);
        conn.call(move |conn| {
            conn.execute_batch(&ddl)?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            articles_table: profile.articles_table.clone(),
            word_counts_table: profile.word_counts_table.clone(),
        })
    }

    /// Insert-or-replace by `id`.
    pub async fn export_articles(&self, articles: &[ArticleRecord]) -> Result<()> {
        let sql = upsert_articles_sql(&self.articles_table);
        let rows = articles.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(&sql)?;
                    for article in &rows {
                        stmt.execute(rusqlite::params_from_iter(article_params(article)))?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        tracing::debug!("Exported {} article rows", articles.len());
        Ok(())
    }

    /// Insert-or-replace by `(article_id, word)`.
    pub async fn export_word_counts(&self, word_counts: &[WordCountRecord]) -> Result<()> {
        let sql = format!(
            r#"INSERT INTO {} (article_id, word, count) VALUES (?1, ?2, ?3)
               ON CONFLICT(article_id, word) DO UPDATE SET count = excluded.count"#,
            self.word_counts_table
        );
        let rows = word_counts.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(&sql)?;
                    for wc in &rows {
                        stmt.execute(rusqlite::params![wc.article_id, wc.word, wc.count])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        tracing::debug!("Exported {} word-count rows", word_counts.len());
        Ok(())
    }

    /// Purge the given article ids from both warehouse tables.
    /// Issued after the exports; a no-op for an empty id list.
    pub async fn delete_articles(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let delete_articles = format!(
            "DELETE FROM {} WHERE id IN ({placeholders})",
            self.articles_table
        );
        let delete_word_counts = format!(
            "DELETE FROM {} WHERE article_id IN ({placeholders})",
            self.word_counts_table
        );
        let id_count = ids.len();
        let ids = ids.to_vec();
        self.conn
            .call(move |conn| {
                conn.execute(&delete_articles, rusqlite::params_from_iter(ids.iter()))?;
                conn.execute(&delete_word_counts, rusqlite::params_from_iter(ids.iter()))?;
                Ok(())
            })
            .await?;
        tracing::debug!("Deleted {id_count} article ids from warehouse");
        Ok(())
    }

    /// Full-refresh mode: wipe the articles table and load the given
    /// dataset wholesale, in one transaction.
    pub async fn replace_articles(&self, articles: &[ArticleRecord]) -> Result<()> {
        let article_sql = upsert_articles_sql(&self.articles_table);
        let articles_table = self.articles_table.clone();
        let article_rows = articles.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(&format!("DELETE FROM {articles_table}"), [])?;
                {
                    let mut stmt = tx.prepare(&article_sql)?;
                    for article in &article_rows {
                        stmt.execute(rusqlite::params_from_iter(article_params(article)))?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        tracing::debug!("Replaced articles table with {} rows", articles.len());
        Ok(())
    }

    /// Full-refresh counterpart for the word-counts table.
    pub async fn replace_word_counts(&self, word_counts: &[WordCountRecord]) -> Result<()> {
        let word_counts_table = self.word_counts_table.clone();
        let wc_sql = format!(
            "INSERT INTO {word_counts_table} (article_id, word, count) VALUES (?1, ?2, ?3)"
        );
        let wc_rows = word_counts.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(&format!("DELETE FROM {word_counts_table}"), [])?;
                {
                    let mut stmt = tx.prepare(&wc_sql)?;
                    for wc in &wc_rows {
                        stmt.execute(rusqlite::params![wc.article_id, wc.word, wc.count])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        tracing::debug!(
            "Replaced word-counts table with {} rows",
            word_counts.len()
        );
        Ok(())
    }
}

fn upsert_articles_sql(table: &str) -> String {
    format!(
        r#"INSERT INTO {table}
           (id, title, content, published_at, author_id, created_at, updated_at, deleted_at,
            is_deleted, word_count, title_length,
            created_year, created_month, created_day,
            updated_year, updated_month, updated_day,
            published_year, published_month, published_day)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                   ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
           ON CONFLICT(id) DO UPDATE SET
               title = excluded.title,
               content = excluded.content,
               published_at = excluded.published_at,
               author_id = excluded.author_id,
               created_at = excluded.created_at,
               updated_at = excluded.updated_at,
               deleted_at = excluded.deleted_at,
               is_deleted = excluded.is_deleted,
               word_count = excluded.word_count,
               title_length = excluded.title_length,
               created_year = excluded.created_year,
               created_month = excluded.created_month,
               created_day = excluded.created_day,
               updated_year = excluded.updated_year,
               updated_month = excluded.updated_month,
               updated_day = excluded.updated_day,
               published_year = excluded.published_year,
               published_month = excluded.published_month,
               published_day = excluded.published_day"#
    )
}

fn article_params(article: &ArticleRecord) -> Vec<Box<dyn rusqlite::ToSql>> {
    fn year(parts: Option<DateParts>) -> Option<i64> {
        parts.map(|p| p.year as i64)
    }
    fn month(parts: Option<DateParts>) -> Option<i64> {
        parts.map(|p| p.month as i64)
    }
    fn day(parts: Option<DateParts>) -> Option<i64> {
        parts.map(|p| p.day as i64)
    }

    vec![
        Box::new(article.id),
        Box::new(article.title.clone()),
        Box::new(article.content.clone()),
        Box::new(article.published_at.map(|dt| dt.to_rfc3339())),
        Box::new(article.author_id),
        Box::new(article.created_at.map(|dt| dt.to_rfc3339())),
        Box::new(article.updated_at.map(|dt| dt.to_rfc3339())),
        Box::new(article.deleted_at.map(|dt| dt.to_rfc3339())),
        Box::new(article.is_deleted),
        Box::new(article.word_count),
        Box::new(article.title_length),
        Box::new(year(article.created)),
        Box::new(month(article.created)),
        Box::new(day(article.created)),
        Box::new(year(article.updated)),
        Box::new(month(article.updated)),
        Box::new(day(article.updated)),
        Box::new(year(article.published)),
        Box::new(month(article.published)),
        Box::new(day(article.published)),
    ]
}

#[cfg(test)]
pub(crate) mod testutil {
    use tokio_rusqlite::Connection;

    pub async fn count_rows(path: &str, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let conn = Connection::open(path).await.unwrap();
        conn.call(move |conn| {
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count)
        })
        .await
        .unwrap()
    }

    pub async fn article_ids(path: &str, table: &str) -> Vec<i64> {
        let sql = format!("SELECT id FROM {table} ORDER BY id");
        let conn = Connection::open(path).await.unwrap();
        conn.call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
        .await
        .unwrap()
    }

    /// (word_count, is_deleted, created_year) for one warehouse row.
    pub async fn article_facts(path: &str, table: &str, id: i64) -> (i64, bool, Option<i64>) {
        let sql = format!(
            "SELECT word_count, is_deleted, created_year FROM {table} WHERE id = ?1"
        );
        let conn = Connection::open(path).await.unwrap();
        conn.call(move |conn| {
            let facts = conn.query_row(&sql, [id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            Ok(facts)
        })
        .await
        .unwrap()
    }

    pub async fn word_count_pairs(path: &str, table: &str) -> Vec<(i64, String, i64)> {
        let sql = format!(
            "SELECT article_id, word, count FROM {table} ORDER BY article_id, word"
        );
        let conn = Connection::open(path).await.unwrap();
        conn.call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .unwrap()
    }
}
